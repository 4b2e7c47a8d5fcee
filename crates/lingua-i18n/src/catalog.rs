//! Message catalog for storing translations

use std::collections::HashMap;

/// A message catalog containing translations for a specific locale
///
/// URL patterns are ordinary catalog entries: the raw pattern is the message
/// id and the translated pattern is the message string.
///
/// # Example
/// ```
/// use lingua_i18n::MessageCatalog;
///
/// let mut catalog = MessageCatalog::new("fr");
/// catalog.add_translation("^about-us/$", "^a-propos-de-nous/$");
/// catalog.add_context("menu", "File", "Fichier");
///
/// assert_eq!(catalog.get("^about-us/$"), Some("^a-propos-de-nous/$"));
/// assert_eq!(catalog.get_context("menu", "File"), Some("Fichier"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
	locale: String,
	messages: HashMap<String, String>,
	contexts: HashMap<(String, String), String>,
}

impl MessageCatalog {
	/// Create a new message catalog for the given locale
	pub fn new(locale: &str) -> Self {
		Self {
			locale: locale.to_string(),
			messages: HashMap::new(),
			contexts: HashMap::new(),
		}
	}

	/// Get the locale for this catalog
	pub fn locale(&self) -> &str {
		&self.locale
	}

	/// Add a simple translation
	pub fn add_translation(&mut self, message: impl Into<String>, translation: impl Into<String>) {
		self.messages.insert(message.into(), translation.into());
	}

	/// Add a contextual translation
	pub fn add_context(
		&mut self,
		context: impl Into<String>,
		message: impl Into<String>,
		translation: impl Into<String>,
	) {
		self.contexts
			.insert((context.into(), message.into()), translation.into());
	}

	/// Get a translation
	pub fn get(&self, message: &str) -> Option<&str> {
		self.messages.get(message).map(String::as_str)
	}

	/// Get a contextual translation
	pub fn get_context(&self, context: &str, message: &str) -> Option<&str> {
		self.contexts
			.get(&(context.to_string(), message.to_string()))
			.map(String::as_str)
	}

	/// Copy every entry of `other` into this catalog, overwriting duplicates
	pub fn merge(&mut self, other: MessageCatalog) {
		self.messages.extend(other.messages);
		self.contexts.extend(other.contexts);
	}

	/// Number of plain and contextual entries
	pub fn len(&self) -> usize {
		self.messages.len() + self.contexts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty() && self.contexts.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_message_catalog_basic() {
		// Arrange
		let mut catalog = MessageCatalog::new("es");
		catalog.add_translation("^about-us/$", "^sobre-nosotros/$");

		// Act
		let result = catalog.get("^about-us/$");
		let missing = catalog.get("^contact/$");

		// Assert
		assert_eq!(result, Some("^sobre-nosotros/$"));
		assert_eq!(missing, None);
		assert_eq!(catalog.locale(), "es");
	}

	#[rstest]
	fn test_message_catalog_context() {
		// Arrange
		let mut catalog = MessageCatalog::new("de");
		catalog.add_context("menu", "File", "Datei");
		catalog.add_context("verb", "File", "Ablegen");

		// Act
		let menu = catalog.get_context("menu", "File");
		let verb = catalog.get_context("verb", "File");

		// Assert
		assert_eq!(menu, Some("Datei"));
		assert_eq!(verb, Some("Ablegen"));
		assert_eq!(catalog.get("File"), None);
	}

	#[rstest]
	fn test_merge_overwrites_existing_entries() {
		// Arrange
		let mut base = MessageCatalog::new("fr");
		base.add_translation("French", "Français");
		base.add_translation("^the-cat/$", "^le-chien/$");
		let mut patch = MessageCatalog::new("fr");
		patch.add_translation("^the-cat/$", "^le-chat/$");

		// Act
		base.merge(patch);

		// Assert
		assert_eq!(base.get("^the-cat/$"), Some("^le-chat/$"));
		assert_eq!(base.get("French"), Some("Français"));
		assert_eq!(base.len(), 2);
		assert!(!base.is_empty());
	}
}
