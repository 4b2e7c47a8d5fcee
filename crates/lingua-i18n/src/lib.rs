//! # Lingua i18n
//!
//! Internationalization support for translated URL routing:
//!
//! - [`MessageCatalog`] and [`CatalogSet`]: per-locale message catalogs,
//!   loadable from gettext `.po` files via [`po_parser`]
//! - [`Translator`]: the explicit-language lookup capability consumed by the
//!   URL resolver (`translate(text, language) -> text`)
//! - [`I18nSettings`]: language list, default language, language domains and
//!   blocked languages, loadable from TOML
//! - Language detection helpers for request classification
//!
//! ## Example
//!
//! ```
//! use lingua_i18n::{CatalogSet, I18nSettings, Language, MessageCatalog, Translator};
//!
//! let settings = I18nSettings::new(
//!     "en",
//!     vec![Language::new("en", "English"), Language::new("fr", "French")],
//! );
//!
//! let mut fr = MessageCatalog::new("fr");
//! fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
//! let catalogs = CatalogSet::new().with_catalog(fr);
//!
//! assert!(settings.is_known_language("fr"));
//! assert_eq!(catalogs.translate("^about-us/$", "fr"), "^a-propos-de-nous/$");
//! ```

pub mod catalog;
pub mod detection;
pub mod po_parser;
pub mod settings;
pub mod translator;

pub use catalog::MessageCatalog;
pub use detection::{
	apply_blocked_languages, detect_language, language_from_host, language_from_path,
	language_redirect_path,
};
pub use po_parser::{PoParseError, load_po_file, parse_po_file};
pub use settings::{I18nSettings, Language, LanguageDomain, SettingsError};
pub use translator::{CatalogSet, NullTranslator, Translator, normalize_locale, trans_in_lang};
