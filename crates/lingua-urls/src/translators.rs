//! "This page in another language".
//!
//! A [`TranslationScheme`] computes the URL of the page being rendered in a
//! different language. Which scheme applies is decided late: a
//! [`UrlTranslator`] is created for every request with the identity scheme,
//! switched to the matched route's scheme (or [`TranslationScheme::Autodetect`])
//! once the view is known, and a handler may still override it while it runs.

use crate::error::UrlError;
use crate::resolver::{ResolverMatch, UrlResolver};
use crate::reverse::{ReverseArgs, ReverseTarget};
use crate::table::ViewId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Context object name looked up by the object-based scheme by default.
pub const DEFAULT_OBJECT_NAME: &str = "object";

/// A scheme could not produce a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no translation: {0}")]
pub struct NoTranslation(pub String);

/// The view being rendered, captured when the request is dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewInfo {
	pub current_url: String,
	pub view: Option<ViewId>,
	pub args: Vec<String>,
	pub kwargs: HashMap<String, String>,
}

impl ViewInfo {
	pub fn new(current_url: impl Into<String>) -> Self {
		Self {
			current_url: current_url.into(),
			..Self::default()
		}
	}

	fn reverse_args(&self) -> ReverseArgs {
		// Positional matches may still carry the route's default kwargs
		if self.args.is_empty() {
			ReverseArgs::keyword(self.kwargs.clone())
		} else {
			ReverseArgs::positional(self.args.clone())
		}
	}
}

impl fmt::Display for ViewInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.view {
			Some(view) => write!(
				f,
				"URL: {}, handled by {}({:?}, {:?})",
				self.current_url, view, self.args, self.kwargs
			),
			None => write!(f, "URL: {}", self.current_url),
		}
	}
}

/// Where a translatable object lives, as a reverse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRoute {
	pub target: ReverseTarget,
	pub args: ReverseArgs,
}

impl CanonicalRoute {
	pub fn new(target: impl Into<ReverseTarget>, args: ReverseArgs) -> Self {
		Self {
			target: target.into(),
			args,
		}
	}
}

/// Content that exists in several languages.
pub trait Translatable: Send + Sync {
	/// This object's counterpart in `language`, if there is one
	fn translation(&self, language: &str) -> Option<Arc<dyn Translatable>>;

	/// The route that displays this object
	fn canonical_route(&self) -> CanonicalRoute;
}

/// Named objects available to the page being rendered.
#[derive(Clone, Default)]
pub struct RenderContext {
	objects: HashMap<String, Arc<dyn Translatable>>,
}

impl RenderContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: impl Into<String>, object: Arc<dyn Translatable>) {
		self.objects.insert(name.into(), object);
	}

	pub fn with(mut self, name: impl Into<String>, object: Arc<dyn Translatable>) -> Self {
		self.insert(name, object);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Translatable>> {
		self.objects.get(name)
	}
}

impl fmt::Debug for RenderContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.objects.keys().collect();
		names.sort();
		f.debug_struct("RenderContext").field("objects", &names).finish()
	}
}

/// A user-supplied way of translating the current page.
pub trait UrlScheme: Send + Sync + fmt::Debug {
	fn get_url(
		&self,
		language: &str,
		view_info: &ViewInfo,
		context: &RenderContext,
		resolver: &UrlResolver,
	) -> Result<String, NoTranslation>;
}

/// How the URL of the current page is computed for another language.
#[derive(Debug, Clone, Default)]
pub enum TranslationScheme {
	/// The current URL, unchanged
	#[default]
	Identity,
	/// Reverse the canonical route of the context object's translation
	ObjectBased { object_name: String },
	/// Reverse the named route, or the current view, with the current arguments
	DirectReverse { url_name: Option<String> },
	/// Object-based, then direct reverse, then identity
	Autodetect { object_name: String },
	Custom(Arc<dyn UrlScheme>),
}

impl TranslationScheme {
	pub fn object_based(object_name: impl Into<String>) -> Self {
		Self::ObjectBased {
			object_name: object_name.into(),
		}
	}

	pub fn direct(url_name: impl Into<String>) -> Self {
		Self::DirectReverse {
			url_name: Some(url_name.into()),
		}
	}

	pub fn autodetect() -> Self {
		Self::Autodetect {
			object_name: DEFAULT_OBJECT_NAME.to_string(),
		}
	}

	pub fn custom(scheme: impl UrlScheme + 'static) -> Self {
		Self::Custom(Arc::new(scheme))
	}

	/// The URL of the current page in `language`
	pub fn get_url(
		&self,
		language: &str,
		view_info: &ViewInfo,
		context: &RenderContext,
		resolver: &UrlResolver,
	) -> Result<String, NoTranslation> {
		match self {
			Self::Identity => Ok(view_info.current_url.clone()),
			Self::ObjectBased { object_name } => {
				object_url(object_name, language, context, resolver)
			}
			Self::DirectReverse { url_name } => {
				direct_url(url_name.as_deref(), language, view_info, resolver)
			}
			Self::Autodetect { object_name } => {
				let url = object_url(object_name, language, context, resolver)
					.or_else(|err| {
						tracing::debug!(reason = %err, "object-based translation failed");
						direct_url(None, language, view_info, resolver)
					})
					.unwrap_or_else(|err| {
						tracing::debug!(reason = %err, "direct translation failed");
						view_info.current_url.clone()
					});
				Ok(url)
			}
			Self::Custom(scheme) => scheme.get_url(language, view_info, context, resolver),
		}
	}
}

impl PartialEq for TranslationScheme {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Identity, Self::Identity) => true,
			(Self::ObjectBased { object_name: a }, Self::ObjectBased { object_name: b }) => a == b,
			(Self::DirectReverse { url_name: a }, Self::DirectReverse { url_name: b }) => a == b,
			(Self::Autodetect { object_name: a }, Self::Autodetect { object_name: b }) => a == b,
			(Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

fn object_url(
	object_name: &str,
	language: &str,
	context: &RenderContext,
	resolver: &UrlResolver,
) -> Result<String, NoTranslation> {
	let object = context.get(object_name).ok_or_else(|| {
		NoTranslation(format!("could not find object named '{}' in context", object_name))
	})?;
	let translated = object.translation(language).ok_or_else(|| {
		NoTranslation(format!(
			"object '{}' has no translation in language '{}'",
			object_name, language
		))
	})?;
	let route = translated.canonical_route();
	resolver
		.reverse(route.target.clone(), language, &route.args, None)
		.map_err(|err| reverse_failed(&route.target, err))
}

fn direct_url(
	url_name: Option<&str>,
	language: &str,
	view_info: &ViewInfo,
	resolver: &UrlResolver,
) -> Result<String, NoTranslation> {
	let target = match (url_name, &view_info.view) {
		(Some(name), _) => ReverseTarget::from(name),
		(None, Some(view)) => ReverseTarget::from(view),
		(None, None) => return Err(NoTranslation("no view to reverse".to_string())),
	};
	resolver
		.reverse(target.clone(), language, &view_info.reverse_args(), None)
		.map_err(|err| reverse_failed(&target, err))
}

fn reverse_failed(target: &ReverseTarget, err: UrlError) -> NoTranslation {
	if !matches!(err, UrlError::NoReverseMatch { .. }) {
		tracing::warn!(target = %target, error = %err, "reverse failed while translating a URL");
	}
	NoTranslation(format!("unable to find URL for '{}': {}", target, err))
}

/// Per-request holder of the current view and the scheme that applies to it.
#[derive(Debug, Clone)]
pub struct UrlTranslator {
	scheme: TranslationScheme,
	view_info: ViewInfo,
}

impl UrlTranslator {
	/// A translator for `current_url` using the identity scheme
	pub fn new(current_url: impl Into<String>) -> Self {
		Self {
			scheme: TranslationScheme::Identity,
			view_info: ViewInfo::new(current_url),
		}
	}

	/// Record the dispatched view and adopt the scheme its route selects
	pub fn set_view_info(&mut self, matched: &ResolverMatch) {
		self.view_info.view = Some(matched.view.clone());
		self.view_info.args = matched.args.clone();
		self.view_info.kwargs = matched.kwargs.clone();
		self.scheme = translation_scheme_for(matched);
	}

	/// Override the scheme for the rest of this request
	pub fn set_scheme(&mut self, scheme: TranslationScheme) {
		self.scheme = scheme;
	}

	pub fn scheme(&self) -> &TranslationScheme {
		&self.scheme
	}

	pub fn view_info(&self) -> &ViewInfo {
		&self.view_info
	}

	pub fn get_url(
		&self,
		language: &str,
		context: &RenderContext,
		resolver: &UrlResolver,
	) -> Result<String, NoTranslation> {
		self.scheme
			.get_url(language, &self.view_info, context, resolver)
	}
}

impl fmt::Display for UrlTranslator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"URL translator for {}, using scheme {:?}",
			self.view_info, self.scheme
		)
	}
}

/// The scheme a matched route selects: its declared scheme, else autodetect
pub fn translation_scheme_for(matched: &ResolverMatch) -> TranslationScheme {
	matched
		.translation_scheme
		.clone()
		.unwrap_or_else(TranslationScheme::autodetect)
}

/// The current page in `language`, or `fallback`, or the empty string
///
/// Never fails: a scheme that cannot produce a URL (or produces an empty
/// one) yields the fallback.
pub fn this_page_in_lang(
	translator: &UrlTranslator,
	language: &str,
	context: &RenderContext,
	resolver: &UrlResolver,
	fallback: Option<&str>,
) -> String {
	let url = match translator.get_url(language, context, resolver) {
		Ok(url) => url,
		Err(err) => {
			tracing::debug!(language, reason = %err, "no URL for this page in language");
			String::new()
		}
	};
	match fallback {
		Some(fallback) if url.is_empty() => fallback.to_string(),
		_ => url,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::table::{RouteTable, re_path, trans_re_path};
	use lingua_i18n::{CatalogSet, I18nSettings, Language, MessageCatalog};
	use rstest::{fixture, rstest};

	#[derive(Debug)]
	struct Article {
		slug: &'static str,
		translations: HashMap<&'static str, &'static str>,
	}

	impl Translatable for Article {
		fn translation(&self, language: &str) -> Option<Arc<dyn Translatable>> {
			let slug = *self.translations.get(language)?;
			Some(Arc::new(Article {
				slug,
				translations: self.translations.clone(),
			}))
		}

		fn canonical_route(&self) -> CanonicalRoute {
			CanonicalRoute::new("article", ReverseArgs::new().kwarg("slug", self.slug))
		}
	}

	#[derive(Debug)]
	struct Fixed;

	impl UrlScheme for Fixed {
		fn get_url(
			&self,
			language: &str,
			_view_info: &ViewInfo,
			_context: &RenderContext,
			_resolver: &UrlResolver,
		) -> Result<String, NoTranslation> {
			Ok(format!("/fixed/{}/", language))
		}
	}

	#[fixture]
	fn resolver() -> UrlResolver {
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
		fr.add_translation("^articles/(?P<slug>[-\\w]+)/$", "^articles-fr/(?P<slug>[-\\w]+)/$");
		let table = RouteTable::new()
			.route(trans_re_path("^about-us/$", "about").with_name("about"))
			.route(trans_re_path(r"^articles/(?P<slug>[-\w]+)/$", "article").with_name("article"))
			.route(re_path("^search/$", "search").do_not_translate());
		let settings = I18nSettings::new(
			"en",
			vec![Language::new("en", "English"), Language::new("fr", "French")],
		);
		UrlResolver::new(table, settings, Arc::new(CatalogSet::new().with_catalog(fr)))
	}

	fn article() -> Arc<dyn Translatable> {
		Arc::new(Article {
			slug: "hello",
			translations: HashMap::from([("en", "hello"), ("fr", "bonjour")]),
		})
	}

	fn translator_for(resolver: &UrlResolver, path: &str) -> UrlTranslator {
		let matched = resolver.resolve(path, "en").unwrap().unwrap();
		let mut translator = UrlTranslator::new(format!("http://testserver{}", path));
		translator.set_view_info(&matched);
		translator
	}

	#[rstest]
	fn test_identity_returns_current_url(resolver: UrlResolver) {
		let translator = UrlTranslator::new("http://testserver/about-us/");
		let url = translator.get_url("fr", &RenderContext::new(), &resolver);
		assert_eq!(url.unwrap(), "http://testserver/about-us/");
	}

	#[rstest]
	fn test_object_based(resolver: UrlResolver) {
		// Arrange
		let scheme = TranslationScheme::object_based("object");
		let context = RenderContext::new().with("object", article());
		let view_info = ViewInfo::new("/articles/hello/");

		// Act
		let url = scheme.get_url("fr", &view_info, &context, &resolver);

		// Assert
		assert_eq!(url.unwrap(), "/articles-fr/bonjour/");
	}

	#[rstest]
	#[case("missing", "fr")]
	#[case("object", "de")]
	fn test_object_based_failures(
		resolver: UrlResolver,
		#[case] object_name: &str,
		#[case] language: &str,
	) {
		let scheme = TranslationScheme::object_based(object_name);
		let context = RenderContext::new().with("object", article());

		let result = scheme.get_url(language, &ViewInfo::new("/x/"), &context, &resolver);
		assert!(result.is_err());
	}

	#[rstest]
	fn test_direct_reverse_uses_current_view(resolver: UrlResolver) {
		// Arrange
		let translator = translator_for(&resolver, "/articles/hello/");

		// Act
		let direct = TranslationScheme::DirectReverse { url_name: None }.get_url(
			"fr",
			translator.view_info(),
			&RenderContext::new(),
			&resolver,
		);
		let named = TranslationScheme::direct("about").get_url(
			"fr",
			translator.view_info(),
			&RenderContext::new(),
			&resolver,
		);

		// Assert
		assert_eq!(direct.unwrap(), "/articles-fr/hello/");
		assert_eq!(named.unwrap(), "/a-propos-de-nous/");
	}

	#[rstest]
	fn test_direct_reverse_without_view_fails(resolver: UrlResolver) {
		let result = TranslationScheme::DirectReverse { url_name: None }.get_url(
			"fr",
			&ViewInfo::new("/x/"),
			&RenderContext::new(),
			&resolver,
		);
		assert_eq!(result, Err(NoTranslation("no view to reverse".to_string())));
	}

	#[rstest]
	fn test_autodetect_prefers_object_then_view(resolver: UrlResolver) {
		// Arrange
		let translator = translator_for(&resolver, "/articles/hello/");
		let context = RenderContext::new().with("object", article());

		// Act
		let with_object = translator.get_url("fr", &context, &resolver);
		let without_object = translator.get_url("fr", &RenderContext::new(), &resolver);

		// Assert
		assert_eq!(translator.scheme(), &TranslationScheme::autodetect());
		assert_eq!(with_object.unwrap(), "/articles-fr/bonjour/");
		assert_eq!(without_object.unwrap(), "/articles-fr/hello/");
	}

	#[rstest]
	fn test_autodetect_falls_back_to_identity(resolver: UrlResolver) {
		// Arrange
		let mut view_info = ViewInfo::new("http://testserver/somewhere/");
		view_info.view = Some(ViewId::from("unrouted"));

		// Act
		let url = TranslationScheme::autodetect().get_url(
			"fr",
			&view_info,
			&RenderContext::new(),
			&resolver,
		);

		// Assert
		assert_eq!(url.unwrap(), "http://testserver/somewhere/");
	}

	#[rstest]
	fn test_route_scheme_is_adopted_and_can_be_overridden(resolver: UrlResolver) {
		// Arrange
		let mut translator = translator_for(&resolver, "/search/");
		assert_eq!(translator.scheme(), &TranslationScheme::Identity);

		// Act
		translator.set_scheme(TranslationScheme::custom(Fixed));
		let url = translator.get_url("fr", &RenderContext::new(), &resolver);

		// Assert
		assert_eq!(url.unwrap(), "/fixed/fr/");
	}

	#[rstest]
	fn test_this_page_in_lang_fallback(resolver: UrlResolver) {
		// Arrange
		let mut translator = UrlTranslator::new("/x/");
		translator.set_scheme(TranslationScheme::object_based("object"));

		// Act
		let with_fallback =
			this_page_in_lang(&translator, "fr", &RenderContext::new(), &resolver, Some("/fr/"));
		let without_fallback =
			this_page_in_lang(&translator, "fr", &RenderContext::new(), &resolver, None);

		// Assert
		assert_eq!(with_fallback, "/fr/");
		assert_eq!(without_fallback, "");
	}

	#[rstest]
	fn test_translation_scheme_for_defaults_to_autodetect(resolver: UrlResolver) {
		let about = resolver.resolve("/about-us/", "en").unwrap().unwrap();
		let search = resolver.resolve("/search/", "en").unwrap().unwrap();

		assert_eq!(translation_scheme_for(&about), TranslationScheme::autodetect());
		assert_eq!(translation_scheme_for(&search), TranslationScheme::Identity);
	}
}
