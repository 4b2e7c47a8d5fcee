//! Language settings
//!
//! The process-wide language configuration consumed by routing: the ordered
//! language list, the default language, optional per-language domains and
//! languages blocked for non-staff users.
//!
//! ```toml
//! language_code = "en"
//! url_scheme = "https"
//!
//! [[languages]]
//! code = "en"
//! name = "English"
//!
//! [[languages]]
//! code = "fr"
//! name = "French"
//!
//! [language_domains.fr]
//! host = "www.example.fr"
//! label = "French Site"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Errors raised while loading or validating settings
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SettingsError {
	#[error("failed to read settings file: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("default language '{0}' is not listed in languages")]
	UnknownDefaultLanguage(String),
	#[error("language domain configured for unlisted language '{0}'")]
	UnknownDomainLanguage(String),
	#[error("duplicate language code '{0}'")]
	DuplicateLanguage(String),
	#[error("url_scheme must not be empty")]
	EmptyUrlScheme,
}

/// A configured language
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
	pub code: String,
	pub name: String,
}

impl Language {
	pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			name: name.into(),
		}
	}
}

/// Hostname override for a language
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageDomain {
	pub host: String,
	#[serde(default)]
	pub label: String,
}

impl LanguageDomain {
	pub fn new(host: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			label: label.into(),
		}
	}
}

/// Language configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct I18nSettings {
	/// Default language code
	pub language_code: String,
	/// Ordered list of available languages
	pub languages: Vec<Language>,
	/// Per-language domain overrides, applied only to reversed URLs
	pub language_domains: BTreeMap<String, LanguageDomain>,
	/// Languages only staff may browse
	pub blocked_languages: Vec<String>,
	/// Scheme used when a domain override makes a URL absolute
	pub url_scheme: String,
	/// Prefix prepended to every reversed path
	pub script_prefix: String,
}

impl Default for I18nSettings {
	fn default() -> Self {
		Self {
			language_code: "en".to_string(),
			languages: vec![Language::new("en", "English")],
			language_domains: BTreeMap::new(),
			blocked_languages: Vec::new(),
			url_scheme: "http".to_string(),
			script_prefix: "/".to_string(),
		}
	}
}

impl I18nSettings {
	/// Settings with the given default language and language list
	pub fn new(language_code: impl Into<String>, languages: Vec<Language>) -> Self {
		Self {
			language_code: language_code.into(),
			languages,
			..Self::default()
		}
	}

	/// Add a domain override for a language
	pub fn with_domain(
		mut self,
		language: impl Into<String>,
		host: impl Into<String>,
		label: impl Into<String>,
	) -> Self {
		self.language_domains
			.insert(language.into(), LanguageDomain::new(host, label));
		self
	}

	pub fn with_blocked_languages<I, S>(mut self, languages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.blocked_languages = languages.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_script_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.script_prefix = prefix.into();
		self
	}

	pub fn with_url_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.url_scheme = scheme.into();
		self
	}

	/// Parse and validate settings from TOML
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Read, parse and validate a TOML settings file
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let source = std::fs::read_to_string(path.as_ref())?;
		Self::from_toml_str(&source)
	}

	pub fn validate(&self) -> Result<(), SettingsError> {
		let mut seen = std::collections::HashSet::new();
		for language in &self.languages {
			if !seen.insert(language.code.as_str()) {
				return Err(SettingsError::DuplicateLanguage(language.code.clone()));
			}
		}
		if !self.is_known_language(&self.language_code) {
			return Err(SettingsError::UnknownDefaultLanguage(
				self.language_code.clone(),
			));
		}
		if let Some(code) = self
			.language_domains
			.keys()
			.find(|code| !self.is_known_language(code))
		{
			return Err(SettingsError::UnknownDomainLanguage(code.clone()));
		}
		if self.url_scheme.is_empty() {
			return Err(SettingsError::EmptyUrlScheme);
		}
		Ok(())
	}

	/// Configured language codes, in declaration order
	pub fn language_list(&self) -> impl Iterator<Item = &str> {
		self.languages.iter().map(|l| l.code.as_str())
	}

	pub fn default_language(&self) -> &str {
		&self.language_code
	}

	pub fn language_domains(&self) -> &BTreeMap<String, LanguageDomain> {
		&self.language_domains
	}

	pub fn domain_for(&self, language: &str) -> Option<&LanguageDomain> {
		self.language_domains.get(language)
	}

	pub fn is_known_language(&self, code: &str) -> bool {
		self.languages.iter().any(|l| l.code == code)
	}

	pub fn is_blocked(&self, code: &str) -> bool {
		self.blocked_languages.iter().any(|l| l == code)
	}
}
