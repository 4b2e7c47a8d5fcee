//! Per-language URL resolution.
//!
//! [`UrlResolver`] owns the route table, the language settings, the catalog
//! lookup and both caches (compiled matchers and reverse indices). It is
//! `Send + Sync` and meant to be shared behind an `Arc` by every request
//! handler of the process.
//!
//! Every `resolve`, `reverse` and `reverse_index` call holds the read side of
//! the resolver's gate for its whole pass. Invalidation and translator reload
//! take the write side, so a pass never sees a mix of old and new translated
//! patterns.

use crate::error::UrlResult;
use crate::matcher::{Anchoring, MatcherCache, PatternMatch};
use crate::reverse::{ReverseArgs, ReverseIndex, ReverseTarget, finish_url, reverse_path};
use crate::table::{Group, RouteEntry, RouteTable, ViewId};
use crate::translators::TranslationScheme;
use lingua_i18n::{I18nSettings, Translator};
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The outcome of a successful resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverMatch {
	pub view: ViewId,
	/// Unnamed captures of the matched leaf, preceded by those of its groups
	/// when the match has no keyword arguments
	pub args: Vec<String>,
	/// Named captures merged with the default kwargs of the route and its groups
	pub kwargs: HashMap<String, String>,
	pub url_name: Option<String>,
	/// Instance namespaces from the outermost group inwards
	pub namespaces: Vec<String>,
	pub app_names: Vec<String>,
	pub language: String,
	/// Scheme declared on the matched route, if any
	pub translation_scheme: Option<TranslationScheme>,
}

impl ResolverMatch {
	/// Instance namespaces joined with `:`
	pub fn namespace(&self) -> String {
		self.namespaces.join(":")
	}

	/// `namespace:name`, usable as a reverse target
	pub fn view_name(&self) -> Option<String> {
		let name = self.url_name.as_deref()?;
		if self.namespaces.is_empty() {
			Some(name.to_string())
		} else {
			Some(format!("{}:{}", self.namespace(), name))
		}
	}

	fn nested_in(mut self, prefix: PatternMatch, group: &Group) -> Self {
		let mut kwargs = prefix.kwargs;
		kwargs.extend(group.default_kwargs().clone());
		kwargs.extend(self.kwargs);
		self.kwargs = kwargs;
		if self.kwargs.is_empty() {
			let mut args = prefix.args;
			args.append(&mut self.args);
			self.args = args;
		}
		if let Some(namespace) = group.namespace() {
			self.namespaces.insert(0, namespace.to_string());
		}
		if let Some(app_name) = group.app_name() {
			self.app_names.insert(0, app_name.to_string());
		}
		self
	}
}

/// Language-aware resolver over one route table.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use lingua_i18n::{CatalogSet, I18nSettings, Language, MessageCatalog};
/// use lingua_urls::{lang_prefixed, re_path, trans_re_path, ReverseArgs, RouteTable, UrlResolver};
///
/// let settings = I18nSettings::new(
///     "en",
///     vec![Language::new("en", "English"), Language::new("fr", "French")],
/// );
/// let mut fr = MessageCatalog::new("fr");
/// fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
///
/// let table = RouteTable::new().route(lang_prefixed(
///     RouteTable::new()
///         .route(re_path("^$", "home").with_name("home"))
///         .route(trans_re_path("^about-us/$", "about").with_name("about")),
/// ));
/// let resolver = UrlResolver::new(table, settings, Arc::new(CatalogSet::new().with_catalog(fr)));
///
/// let found = resolver.resolve("/fr/a-propos-de-nous/", "fr").unwrap().unwrap();
/// assert_eq!(found.view.as_str(), "about");
/// assert!(resolver.resolve("/fr/about-us/", "fr").unwrap().is_none());
/// assert_eq!(
///     resolver.reverse("about", "fr", &ReverseArgs::new(), None).unwrap(),
///     "/fr/a-propos-de-nous/"
/// );
/// ```
pub struct UrlResolver {
	table: RouteTable,
	settings: Arc<I18nSettings>,
	translator: RwLock<Arc<dyn Translator>>,
	matchers: MatcherCache,
	indices: RwLock<HashMap<String, Arc<ReverseIndex>>>,
	generation: AtomicU64,
}

impl UrlResolver {
	pub fn new(
		table: RouteTable,
		settings: impl Into<Arc<I18nSettings>>,
		translator: Arc<dyn Translator>,
	) -> Self {
		Self {
			table,
			settings: settings.into(),
			translator: RwLock::new(translator),
			matchers: MatcherCache::new(),
			indices: RwLock::new(HashMap::new()),
			generation: AtomicU64::new(0),
		}
	}

	pub fn table(&self) -> &RouteTable {
		&self.table
	}

	pub fn settings(&self) -> &I18nSettings {
		&self.settings
	}

	/// Number of compiled matchers currently cached across all languages
	pub fn cached_matchers(&self) -> usize {
		self.matchers.len()
	}

	/// Incremented by every invalidation and translator reload
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Resolve `path` for `language`
	///
	/// `path` must start with `/`; percent-encoded input is decoded first.
	/// `Ok(None)` means no route matched. An error means a route pattern is
	/// invalid in this language.
	pub fn resolve(&self, path: &str, language: &str) -> UrlResult<Option<ResolverMatch>> {
		let translator = self.translator.read();
		let decoded = percent_decode_str(path)
			.decode_utf8()
			.unwrap_or(Cow::Borrowed(path));
		let Some(rest) = decoded.strip_prefix('/') else {
			tracing::debug!(path, "path does not start with '/'");
			return Ok(None);
		};

		let found = self.resolve_in(&self.table, rest, language, &**translator)?;
		match &found {
			Some(found) => tracing::trace!(path, language, view = %found.view, "resolved"),
			None => tracing::debug!(path, language, "no route matched"),
		}
		Ok(found)
	}

	fn resolve_in(
		&self,
		table: &RouteTable,
		path: &str,
		language: &str,
		translator: &dyn Translator,
	) -> UrlResult<Option<ResolverMatch>> {
		for entry in table.entries() {
			match entry {
				RouteEntry::Leaf(leaf) => {
					let matcher = self.matchers.get_or_compile(
						leaf.template(),
						language,
						Anchoring::Full,
						translator,
					)?;
					let Some(found) = matcher.matches(path) else {
						continue;
					};
					let mut kwargs = found.kwargs;
					kwargs.extend(leaf.default_kwargs().clone());
					return Ok(Some(ResolverMatch {
						view: leaf.view().clone(),
						args: found.args,
						kwargs,
						url_name: leaf.name().map(str::to_string),
						namespaces: Vec::new(),
						app_names: Vec::new(),
						language: language.to_string(),
						translation_scheme: leaf.translation_scheme().cloned(),
					}));
				}
				RouteEntry::Group(group) => {
					let matcher = self.matchers.get_or_compile(
						group.template(),
						language,
						Anchoring::Prefix,
						translator,
					)?;
					let Some(prefix) = matcher.matches(path) else {
						continue;
					};
					let rest = &path[prefix.end..];
					if let Some(sub) = self.resolve_in(group.table(), rest, language, translator)? {
						return Ok(Some(sub.nested_in(prefix, group)));
					}
				}
				RouteEntry::LangPrefixed(table) => {
					if !self.settings.is_known_language(language) {
						continue;
					}
					let Some(rest) = path
						.strip_prefix(language)
						.and_then(|rest| rest.strip_prefix('/'))
					else {
						continue;
					};
					if let Some(sub) = self.resolve_in(table, rest, language, translator)? {
						return Ok(Some(sub));
					}
				}
			}
		}
		Ok(None)
	}

	/// The reverse index for `language`, built on first use
	///
	/// Two calls without an intervening invalidation return the same index.
	pub fn reverse_index(&self, language: &str) -> Arc<ReverseIndex> {
		let translator = self.translator.read();
		self.index_for(language, &**translator)
	}

	fn index_for(&self, language: &str, translator: &dyn Translator) -> Arc<ReverseIndex> {
		if let Some(hit) = self.indices.read().get(language) {
			return Arc::clone(hit);
		}

		let generation = self.generation();
		let index = Arc::new(ReverseIndex::build(&self.table, language, translator));
		tracing::debug!(language, keys = index.len(), "built reverse index");

		let mut indices = self.indices.write();
		if self.generation() == generation {
			indices.insert(language.to_string(), Arc::clone(&index));
		}
		index
	}

	/// Build the URL of a view or route name in `language`
	///
	/// Names may be qualified with namespaces (`blog:detail`). `current_app`
	/// picks among several instances of the same application namespace.
	/// When the language has a configured domain the result is absolute.
	pub fn reverse(
		&self,
		target: impl Into<ReverseTarget>,
		language: &str,
		args: &ReverseArgs,
		current_app: Option<&str>,
	) -> UrlResult<String> {
		let target = target.into();
		let translator = self.translator.read();
		let index = self.index_for(language, &**translator);
		let path = reverse_path(&index, &target, args, current_app, &self.matchers)?;
		Ok(finish_url(&path, language, &self.settings))
	}

	/// Discard every cached matcher and reverse index
	pub fn invalidate_all(&self) {
		let _gate = self.translator.write();
		self.matchers.invalidate_all();
		self.indices.write().clear();
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(generation, "invalidated URL caches");
	}

	/// Discard the cached matchers and reverse index of one language
	pub fn invalidate_language(&self, language: &str) {
		let _gate = self.translator.write();
		self.matchers.invalidate_language(language);
		self.indices.write().remove(language);
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(language, generation, "invalidated URL caches for language");
	}

	/// Swap the catalog lookup and discard everything compiled from the old one
	pub fn reload_translator(&self, translator: Arc<dyn Translator>) {
		let mut current = self.translator.write();
		*current = translator;
		self.matchers.invalidate_all();
		self.indices.write().clear();
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(generation, "reloaded URL translator");
	}
}

impl fmt::Debug for UrlResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UrlResolver")
			.field("routes", &self.table.len())
			.field("languages", &self.settings.language_list().collect::<Vec<_>>())
			.field("cached_matchers", &self.matchers.len())
			.field("generation", &self.generation())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::table::{include, lang_prefixed, path, re_path, trans_include, trans_re_path};
	use lingua_i18n::{CatalogSet, Language, MessageCatalog};
	use rstest::{fixture, rstest};

	#[fixture]
	fn settings() -> I18nSettings {
		I18nSettings::new(
			"en",
			vec![Language::new("en", "English"), Language::new("fr", "French")],
		)
	}

	fn catalogs() -> Arc<dyn Translator> {
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^about-us/$", "^a-propos-de-nous/$");
		fr.add_translation("^news/", "^nouvelles/");
		Arc::new(CatalogSet::new().with_catalog(fr))
	}

	#[fixture]
	fn resolver(settings: I18nSettings) -> UrlResolver {
		let news = RouteTable::new()
			.route(re_path(r"^(?P<slug>[-\w]+)/$", "news.detail").with_name("detail"))
			.route(re_path(r"^archive/(\d{4})/$", "news.archive").with_name("archive"));
		let sections = RouteTable::new().route(
			include(r"^(?P<section>\w+)/", RouteTable::new().route(path("{page}/", "section.page")))
				.with_kwargs([("kind", "section")]),
		);
		let table = RouteTable::new()
			.route(lang_prefixed(
				RouteTable::new()
					.route(re_path("^$", "home").with_name("home"))
					.route(trans_re_path("^about-us/$", "about").with_name("about"))
					.route(
						trans_include("^news/", news)
							.with_namespace("news")
							.with_app_name("news-app"),
					),
			))
			.route(include("^sections/", sections))
			.route(re_path(r"^year/(\d{4})/$", "year").with_kwargs([("format", "html")]));
		UrlResolver::new(table, settings, catalogs())
	}

	#[rstest]
	#[case("/en/", "en", Some("home"))]
	#[case("/fr/", "fr", Some("home"))]
	#[case("/en/about-us/", "en", Some("about"))]
	#[case("/fr/a-propos-de-nous/", "fr", Some("about"))]
	#[case("/fr/about-us/", "fr", None)]
	#[case("/en/a-propos-de-nous/", "en", None)]
	#[case("/fr/nouvelles/hello/", "fr", Some("news.detail"))]
	#[case("/de/", "de", None)]
	#[case("/en/", "fr", None)]
	#[case("en/", "en", None)]
	fn test_resolve_by_language(
		resolver: UrlResolver,
		#[case] path: &str,
		#[case] language: &str,
		#[case] expected: Option<&str>,
	) {
		let found = resolver.resolve(path, language).unwrap();
		assert_eq!(found.as_ref().map(|m| m.view.as_str()), expected);
	}

	#[rstest]
	fn test_match_carries_namespaces_and_kwargs(resolver: UrlResolver) {
		// Act
		let found = resolver.resolve("/fr/nouvelles/hello/", "fr").unwrap().unwrap();

		// Assert
		assert_eq!(found.kwargs.get("slug").map(String::as_str), Some("hello"));
		assert!(found.args.is_empty());
		assert_eq!(found.namespaces, vec!["news"]);
		assert_eq!(found.app_names, vec!["news-app"]);
		assert_eq!(found.view_name().as_deref(), Some("news:detail"));
		assert_eq!(found.language, "fr");
	}

	#[rstest]
	fn test_group_kwargs_merge_into_leaf(resolver: UrlResolver) {
		let found = resolver.resolve("/sections/sports/3/", "en").unwrap().unwrap();

		assert_eq!(found.view.as_str(), "section.page");
		assert_eq!(found.kwargs.get("section").map(String::as_str), Some("sports"));
		assert_eq!(found.kwargs.get("page").map(String::as_str), Some("3"));
		assert_eq!(found.kwargs.get("kind").map(String::as_str), Some("section"));
	}

	#[rstest]
	fn test_positional_captures(resolver: UrlResolver) {
		let found = resolver.resolve("/en/news/archive/2024/", "en").unwrap().unwrap();
		assert_eq!(found.args, vec!["2024"]);
		assert!(found.kwargs.is_empty());

		let with_defaults = resolver.resolve("/year/1999/", "en").unwrap().unwrap();
		assert_eq!(with_defaults.args, vec!["1999"]);
		assert_eq!(
			with_defaults.kwargs.get("format").map(String::as_str),
			Some("html")
		);
	}

	#[rstest]
	fn test_positional_leaf_under_named_group(settings: I18nSettings) {
		// Arrange
		let table = RouteTable::new().route(include(
			r"^shop/(?P<shop>\w+)/",
			RouteTable::new().route(re_path(r"^(\d+)/$", "item").with_name("item")),
		));
		let resolver = UrlResolver::new(table, settings, catalogs());

		// Act
		let found = resolver.resolve("/shop/acme/5/", "en").unwrap().unwrap();

		// Assert
		assert_eq!(found.args, vec!["5"]);
		assert_eq!(found.kwargs.len(), 1);
		assert_eq!(found.kwargs.get("shop").map(String::as_str), Some("acme"));
	}

	#[rstest]
	fn test_positional_captures_round_trip_through_group(settings: I18nSettings) {
		// Arrange
		let table = RouteTable::new().route(include(
			r"^blog/(\d{4})/",
			RouteTable::new().route(re_path(r"^(\d+)/$", "entry").with_name("entry")),
		));
		let resolver = UrlResolver::new(table, settings, catalogs());

		// Act
		let found = resolver.resolve("/blog/2024/7/", "en").unwrap().unwrap();
		let url = resolver
			.reverse("entry", "en", &ReverseArgs::positional(found.args.clone()), None)
			.unwrap();

		// Assert
		assert_eq!(found.args, vec!["2024", "7"]);
		assert_eq!(url, "/blog/2024/7/");
	}

	#[rstest]
	fn test_percent_encoded_path_is_decoded(settings: I18nSettings) {
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^the-president/$", "^le-président/$");
		let table = RouteTable::new()
			.route(trans_re_path("^the-president/$", "president").with_name("president"));
		let resolver = UrlResolver::new(table, settings, Arc::new(CatalogSet::new().with_catalog(fr)));

		let url = resolver
			.reverse("president", "fr", &ReverseArgs::new(), None)
			.unwrap();
		assert_eq!(url, "/le-pr%C3%A9sident/");
		let found = resolver.resolve(&url, "fr").unwrap().unwrap();
		assert_eq!(found.view.as_str(), "president");
	}

	#[rstest]
	fn test_reverse_through_namespace(resolver: UrlResolver) {
		let args = ReverseArgs::new().kwarg("slug", "hello");

		assert_eq!(
			resolver.reverse("news:detail", "fr", &args, None).unwrap(),
			"/fr/nouvelles/hello/"
		);
		assert_eq!(
			resolver.reverse("news-app:detail", "en", &args, None).unwrap(),
			"/en/news/hello/"
		);
	}

	#[rstest]
	fn test_reverse_by_view(resolver: UrlResolver) {
		assert_eq!(
			resolver
				.reverse(ViewId::from("about"), "fr", &ReverseArgs::new(), None)
				.unwrap(),
			"/fr/a-propos-de-nous/"
		);
	}

	#[rstest]
	fn test_reverse_index_is_cached_until_invalidated(resolver: UrlResolver) {
		// Arrange
		let first = resolver.reverse_index("fr");

		// Act
		let second = resolver.reverse_index("fr");
		resolver.invalidate_language("fr");
		let third = resolver.reverse_index("fr");

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert!(!Arc::ptr_eq(&first, &third));
		assert_eq!(*first, *third);
	}

	#[rstest]
	fn test_invalidate_all_clears_matchers_and_indices(resolver: UrlResolver) {
		// Arrange
		assert!(resolver.resolve("/fr/a-propos-de-nous/", "fr").unwrap().is_some());
		let index = resolver.reverse_index("fr");
		let before = resolver.generation();
		assert!(resolver.cached_matchers() > 0);

		// Act
		resolver.invalidate_all();

		// Assert
		assert_eq!(resolver.cached_matchers(), 0);
		assert!(resolver.generation() > before);
		assert!(!Arc::ptr_eq(&index, &resolver.reverse_index("fr")));
	}

	#[rstest]
	fn test_invalid_translated_pattern_fails_at_first_use(settings: I18nSettings) {
		// Arrange
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^about-us/$", "^a-propos(/$");
		let table = RouteTable::new().route(trans_re_path("^about-us/$", "about"));
		let resolver = UrlResolver::new(table, settings, Arc::new(CatalogSet::new().with_catalog(fr)));

		// Act & Assert
		assert!(resolver.resolve("/about-us/", "en").unwrap().is_some());
		assert!(matches!(
			resolver.resolve("/about-us/", "fr"),
			Err(crate::UrlError::PatternCompilation { .. })
		));
	}

	#[rstest]
	fn test_reload_translator_replaces_patterns(resolver: UrlResolver) {
		// Arrange
		assert!(resolver.resolve("/fr/a-propos-de-nous/", "fr").unwrap().is_some());
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^about-us/$", "^qui-sommes-nous/$");
		let before = resolver.generation();

		// Act
		resolver.reload_translator(Arc::new(CatalogSet::new().with_catalog(fr)));

		// Assert
		assert!(resolver.generation() > before);
		assert!(resolver.resolve("/fr/a-propos-de-nous/", "fr").unwrap().is_none());
		assert!(resolver.resolve("/fr/qui-sommes-nous/", "fr").unwrap().is_some());
	}

	#[rstest]
	fn test_resolver_is_send_and_sync() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<UrlResolver>();
	}
}
