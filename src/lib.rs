//! # Lingua
//!
//! Language-aware URL routing and reverse resolution, inspired by Django's
//! translated URL patterns.
//!
//! One logical page can live at a different URL in every language. Route
//! patterns are ordinary catalog messages, looked up per language when a
//! route is first matched or reversed, and cached until the catalogs change.
//!
//! ## Feature Flags
//!
//! - `urls` (default) - Route tables, resolution, reverse lookup and
//!   translation schemes
//! - `full` - All features enabled
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "urls")]
//! # {
//! use lingua::prelude::*;
//! use std::sync::Arc;
//!
//! let settings = I18nSettings::new(
//!     "en",
//!     vec![Language::new("en", "English"), Language::new("fr", "French")],
//! );
//! let mut fr = MessageCatalog::new("fr");
//! fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
//!
//! let routes = RouteTable::new().route(lang_prefixed(
//!     RouteTable::new()
//!         .route(re_path("^$", "home").with_name("home"))
//!         .route(trans_re_path("^about-us/$", "about").with_name("about")),
//! ));
//! let resolver = UrlResolver::new(routes, settings, Arc::new(CatalogSet::new().with_catalog(fr)));
//!
//! let found = resolver.resolve("/fr/a-propos-de-nous/", "fr").unwrap().unwrap();
//! assert_eq!(found.view.as_str(), "about");
//! assert_eq!(
//!     resolver.reverse("about", "en", &ReverseArgs::new(), None).unwrap(),
//!     "/en/about-us/"
//! );
//! # }
//! ```

pub use lingua_i18n as i18n;
#[cfg(feature = "urls")]
pub use lingua_urls as urls;

// Re-export settings and catalogs
pub use lingua_i18n::{
	CatalogSet, I18nSettings, Language, LanguageDomain, MessageCatalog, NullTranslator,
	SettingsError, Translator, detect_language,
};

// Re-export routing
#[cfg(feature = "urls")]
pub use lingua_urls::{
	ResolverMatch, ReverseArgs, RouteTable, TranslationScheme, UrlError, UrlResolver, UrlResult,
	UrlTranslator, ViewId, complete_url, include, lang_prefixed, path, re_path, this_page_in_lang,
	trans_include, trans_path, trans_re_path,
};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::{
		CatalogSet, I18nSettings, Language, MessageCatalog, NullTranslator, Translator,
		detect_language,
	};

	#[cfg(feature = "urls")]
	pub use crate::{
		ResolverMatch, ReverseArgs, RouteTable, TranslationScheme, UrlError, UrlResolver,
		UrlTranslator, ViewId, complete_url, include, lang_prefixed, path, re_path,
		this_page_in_lang, trans_include, trans_path, trans_re_path,
	};
	#[cfg(feature = "urls")]
	pub use lingua_urls::RenderContext;
}
