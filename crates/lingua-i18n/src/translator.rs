//! Catalog lookup capability
//!
//! Routing never reads an ambient "current language". Every lookup names the
//! language explicitly through [`Translator::translate`], which is what lets
//! one process resolve French and English URLs side by side.

use crate::{I18nSettings, MessageCatalog};
use std::collections::HashMap;
use std::fmt;

/// Message lookup for an explicit language
///
/// Implementations must return `text` unchanged when no translation exists.
pub trait Translator: Send + Sync {
	fn translate(&self, text: &str, language: &str) -> String;
}

impl<F> Translator for F
where
	F: Fn(&str, &str) -> String + Send + Sync,
{
	fn translate(&self, text: &str, language: &str) -> String {
		self(text, language)
	}
}

/// Translator that never translates anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranslator;

impl Translator for NullTranslator {
	fn translate(&self, text: &str, _language: &str) -> String {
		text.to_string()
	}
}

/// A set of message catalogs keyed by locale
///
/// Lookup tries the exact locale first (`fr-ca`), then its base language
/// (`fr`). The empty message id is reserved for catalog metadata and is
/// always returned unchanged.
///
/// # Example
/// ```
/// use lingua_i18n::{CatalogSet, MessageCatalog, Translator};
///
/// let mut fr = MessageCatalog::new("fr");
/// fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
///
/// let mut catalogs = CatalogSet::new();
/// catalogs.insert(fr);
///
/// assert_eq!(catalogs.translate("^about-us/$", "fr"), "^a-propos-de-nous/$");
/// assert_eq!(catalogs.translate("^about-us/$", "fr-ca"), "^a-propos-de-nous/$");
/// assert_eq!(catalogs.translate("^about-us/$", "de"), "^about-us/$");
/// ```
#[derive(Clone, Default)]
pub struct CatalogSet {
	catalogs: HashMap<String, MessageCatalog>,
}

impl CatalogSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a catalog, merging into any catalog already present for its locale
	pub fn insert(&mut self, catalog: MessageCatalog) {
		let locale = normalize_locale(catalog.locale());
		match self.catalogs.get_mut(&locale) {
			Some(existing) => existing.merge(catalog),
			None => {
				self.catalogs.insert(locale, catalog);
			}
		}
	}

	pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
		self.insert(catalog);
		self
	}

	pub fn catalog(&self, locale: &str) -> Option<&MessageCatalog> {
		self.catalogs.get(&normalize_locale(locale))
	}

	pub fn locales(&self) -> impl Iterator<Item = &str> {
		self.catalogs.keys().map(String::as_str)
	}

	fn lookup(&self, text: &str, language: &str) -> Option<&str> {
		let locale = normalize_locale(language);
		if let Some(found) = self.catalogs.get(&locale).and_then(|c| c.get(text)) {
			return Some(found);
		}
		let base = locale.split('-').next().unwrap_or(&locale);
		if base != locale {
			return self.catalogs.get(base).and_then(|c| c.get(text));
		}
		None
	}
}

impl Translator for CatalogSet {
	fn translate(&self, text: &str, language: &str) -> String {
		if text.is_empty() {
			return String::new();
		}
		self.lookup(text, language)
			.map(str::to_string)
			.unwrap_or_else(|| text.to_string())
	}
}

impl fmt::Debug for CatalogSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut locales: Vec<_> = self.catalogs.keys().collect();
		locales.sort();
		f.debug_struct("CatalogSet").field("locales", &locales).finish()
	}
}

/// Lowercase and use `-` as the region separator (`pt_BR` → `pt-br`)
pub fn normalize_locale(locale: &str) -> String {
	locale.replace('_', "-").to_lowercase()
}

/// Translate `text` into a specific language without changing any active one
///
/// Languages outside the configured list return `text` unchanged.
///
/// # Example
/// ```
/// use lingua_i18n::{CatalogSet, I18nSettings, Language, MessageCatalog, trans_in_lang};
///
/// let settings = I18nSettings::new("en", vec![Language::new("en", "English"), Language::new("fr", "French")]);
/// let mut fr = MessageCatalog::new("fr");
/// fr.add_translation("French", "Français");
/// let catalogs = CatalogSet::new().with_catalog(fr);
///
/// assert_eq!(trans_in_lang("French", "fr", &catalogs, &settings), "Français");
/// assert_eq!(trans_in_lang("French", "xx", &catalogs, &settings), "French");
/// ```
pub fn trans_in_lang(
	text: &str,
	language: &str,
	translator: &dyn Translator,
	settings: &I18nSettings,
) -> String {
	if settings.is_known_language(language) {
		translator.translate(text, language)
	} else {
		text.to_string()
	}
}
