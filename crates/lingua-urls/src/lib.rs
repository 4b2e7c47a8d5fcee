//! # Lingua URLs
//!
//! Language-aware URL routing and reverse resolution.
//!
//! A single logical route can present a different URL in every language:
//! route patterns are translatable text, resolved lazily per language
//! through a [`lingua_i18n::Translator`].
//!
//! ## Pieces
//!
//! - [`RouteTemplate`] and the route builders ([`re_path`], [`path`],
//!   [`trans_re_path`], [`trans_path`], [`include`], [`trans_include`],
//!   [`lang_prefixed`]) declare a [`RouteTable`]
//! - [`MatcherCache`] compiles each template once per language
//! - [`UrlResolver::resolve`] walks the table for a path and a language
//! - [`UrlResolver::reverse_index`] and [`UrlResolver::reverse`] build URLs
//!   for a view or (namespaced) route name in a language, applying the
//!   language's domain when one is configured
//! - [`TranslationScheme`] and [`UrlTranslator`] compute "this page in
//!   another language"
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use lingua_i18n::{CatalogSet, I18nSettings, Language, MessageCatalog};
//! use lingua_urls::{lang_prefixed, re_path, trans_re_path, ReverseArgs, RouteTable, UrlResolver};
//!
//! let settings = I18nSettings::new(
//!     "en",
//!     vec![Language::new("en", "English"), Language::new("fr", "French")],
//! )
//! .with_domain("fr", "www.example.fr", "French Site");
//!
//! let mut fr = MessageCatalog::new("fr");
//! fr.add_translation("^the-president/$", "^le-president/$");
//!
//! let table = RouteTable::new().route(lang_prefixed(
//!     RouteTable::new()
//!         .route(re_path("^$", "home").with_name("home"))
//!         .route(trans_re_path("^the-president/$", "president").with_name("president")),
//! ));
//! let resolver = UrlResolver::new(table, settings, Arc::new(CatalogSet::new().with_catalog(fr)));
//!
//! assert_eq!(
//!     resolver.reverse("president", "en", &ReverseArgs::new(), None).unwrap(),
//!     "/en/the-president/"
//! );
//! assert_eq!(
//!     resolver.reverse("president", "fr", &ReverseArgs::new(), None).unwrap(),
//!     "http://www.example.fr/fr/le-president/"
//! );
//! ```

pub mod domains;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod reverse;
pub mod table;
pub mod template;
pub mod translators;

pub use domains::complete_url;
pub use error::{UrlError, UrlResult};
pub use matcher::{Anchoring, CompiledMatcher, MatcherCache, PatternMatch};
pub use resolver::{ResolverMatch, UrlResolver};
pub use reverse::{
	NamespaceEntry, ReverseArgs, ReverseCandidate, ReverseIndex, ReverseKey, ReverseTarget,
};
pub use table::{
	Group, Leaf, RouteEntry, RouteTable, ViewId, include, lang_prefixed, path, re_path,
	trans_include, trans_path, trans_re_path,
};
pub use template::{RouteTemplate, TemplateId, TemplateSyntax};
pub use translators::{
	CanonicalRoute, NoTranslation, RenderContext, Translatable, TranslationScheme, UrlScheme,
	UrlTranslator, ViewInfo, this_page_in_lang, translation_scheme_for,
};
