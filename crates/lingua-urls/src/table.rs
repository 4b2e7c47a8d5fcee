//! Route tables.
//!
//! A [`RouteTable`] is an ordered list of entries: leaves bound to a view,
//! groups that delegate to a nested table under a prefix, and
//! language-selection groups that consume a language code segment.
//! Declaration order is match priority.
//!
//! # Examples
//!
//! ```
//! use lingua_urls::{include, lang_prefixed, re_path, trans_re_path, RouteTable};
//!
//! let articles = RouteTable::new()
//!     .route(trans_re_path(r"^(?P<slug>[-\w]+)/$", "articles.detail").with_name("detail"));
//!
//! let table = RouteTable::new().route(lang_prefixed(
//!     RouteTable::new()
//!         .route(re_path("^$", "home").with_name("home"))
//!         .route(trans_re_path("^about-us/$", "about").with_name("about"))
//!         .route(include("^articles/", articles).with_namespace("articles")),
//! ));
//! assert_eq!(table.len(), 1);
//! ```

use crate::template::RouteTemplate;
use crate::translators::TranslationScheme;
use std::collections::HashMap;
use std::fmt;

/// Identity of the handler a leaf route dispatches to.
///
/// The application maps view ids to its own handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ViewId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ViewId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl fmt::Display for ViewId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

fn collect_kwargs<I, K, V>(kwargs: I) -> impl Iterator<Item = (String, String)>
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	kwargs.into_iter().map(|(k, v)| (k.into(), v.into()))
}

/// A terminal route bound to a view.
#[derive(Debug, Clone)]
pub struct Leaf {
	template: RouteTemplate,
	view: ViewId,
	name: Option<String>,
	default_kwargs: HashMap<String, String>,
	translation_scheme: Option<TranslationScheme>,
}

impl Leaf {
	pub fn new(template: RouteTemplate, view: impl Into<ViewId>) -> Self {
		Self {
			template,
			view: view.into(),
			name: None,
			default_kwargs: HashMap::new(),
			translation_scheme: None,
		}
	}

	/// Name the route for reverse lookups
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Extra keyword arguments passed to the view on every match
	pub fn with_kwargs<I, K, V>(mut self, kwargs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.default_kwargs.extend(collect_kwargs(kwargs));
		self
	}

	/// How "this page in another language" is computed for this route
	pub fn translate_using(mut self, scheme: TranslationScheme) -> Self {
		self.translation_scheme = Some(scheme);
		self
	}

	/// The route's content is the same in every language
	pub fn do_not_translate(self) -> Self {
		self.translate_using(TranslationScheme::Identity)
	}

	pub fn template(&self) -> &RouteTemplate {
		&self.template
	}

	pub fn view(&self) -> &ViewId {
		&self.view
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn default_kwargs(&self) -> &HashMap<String, String> {
		&self.default_kwargs
	}

	pub fn translation_scheme(&self) -> Option<&TranslationScheme> {
		self.translation_scheme.as_ref()
	}
}

/// A prefix delegating to a nested table.
#[derive(Debug, Clone)]
pub struct Group {
	template: RouteTemplate,
	table: RouteTable,
	namespace: Option<String>,
	app_name: Option<String>,
	default_kwargs: HashMap<String, String>,
}

impl Group {
	pub fn new(template: RouteTemplate, table: RouteTable) -> Self {
		Self {
			template,
			table,
			namespace: None,
			app_name: None,
			default_kwargs: HashMap::new(),
		}
	}

	/// Instance namespace used in `namespace:name` lookups
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	/// Application namespace shared by every instance of the same app
	///
	/// A group with an app name and no explicit namespace uses the app name
	/// as its instance namespace.
	pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
		self.app_name = Some(app_name.into());
		self
	}

	pub fn with_kwargs<I, K, V>(mut self, kwargs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.default_kwargs.extend(collect_kwargs(kwargs));
		self
	}

	pub fn template(&self) -> &RouteTemplate {
		&self.template
	}

	pub fn table(&self) -> &RouteTable {
		&self.table
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref().or(self.app_name.as_deref())
	}

	pub fn app_name(&self) -> Option<&str> {
		self.app_name.as_deref()
	}

	pub fn default_kwargs(&self) -> &HashMap<String, String> {
		&self.default_kwargs
	}
}

/// One entry of a route table.
#[derive(Debug, Clone)]
pub enum RouteEntry {
	Leaf(Leaf),
	Group(Group),
	/// Consumes a `<language>/` segment, then delegates
	LangPrefixed(RouteTable),
}

impl From<Leaf> for RouteEntry {
	fn from(leaf: Leaf) -> Self {
		Self::Leaf(leaf)
	}
}

impl From<Group> for RouteEntry {
	fn from(group: Group) -> Self {
		Self::Group(group)
	}
}

/// Ordered list of route entries.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	entries: Vec<RouteEntry>,
	duplicate_names: Vec<String>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append an entry
	///
	/// Reusing a leaf name already declared in this table is reported with a
	/// warning and recorded in [`RouteTable::duplicate_names`]. Both entries
	/// stay reachable: forward matching follows declaration order and reverse
	/// lookups try the candidates in declaration order.
	pub fn route(mut self, entry: impl Into<RouteEntry>) -> Self {
		let entry = entry.into();
		if let RouteEntry::Leaf(leaf) = &entry {
			if let Some(name) = leaf.name() {
				if self.leaf_names().any(|existing| existing == name) {
					tracing::warn!(
						name,
						view = %leaf.view(),
						"route name is declared more than once in the same table"
					);
					self.duplicate_names.push(name.to_string());
				}
			}
		}
		self.entries.push(entry);
		self
	}

	fn leaf_names(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().filter_map(|entry| match entry {
			RouteEntry::Leaf(leaf) => leaf.name(),
			_ => None,
		})
	}

	pub fn entries(&self) -> &[RouteEntry] {
		&self.entries
	}

	/// Names declared by more than one leaf of this table
	pub fn duplicate_names(&self) -> &[String] {
		&self.duplicate_names
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FromIterator<RouteEntry> for RouteTable {
	fn from_iter<I: IntoIterator<Item = RouteEntry>>(iter: I) -> Self {
		iter.into_iter().fold(Self::new(), Self::route)
	}
}

/// A leaf with a regular-expression pattern matched verbatim in every language
pub fn re_path(pattern: impl Into<String>, view: impl Into<ViewId>) -> Leaf {
	Leaf::new(RouteTemplate::regex(pattern), view)
}

/// A leaf with a brace-placeholder pattern matched verbatim in every language
pub fn path(pattern: impl Into<String>, view: impl Into<ViewId>) -> Leaf {
	Leaf::new(RouteTemplate::path(pattern), view)
}

/// A leaf whose regular-expression pattern is translated per language
pub fn trans_re_path(pattern: impl Into<String>, view: impl Into<ViewId>) -> Leaf {
	Leaf::new(RouteTemplate::regex(pattern).translatable(), view)
}

/// A leaf whose brace-placeholder pattern is translated per language
pub fn trans_path(pattern: impl Into<String>, view: impl Into<ViewId>) -> Leaf {
	Leaf::new(RouteTemplate::path(pattern).translatable(), view)
}

/// A group under a regular-expression prefix
pub fn include(prefix: impl Into<String>, table: RouteTable) -> Group {
	Group::new(RouteTemplate::regex(prefix), table)
}

/// A group under a translatable regular-expression prefix
pub fn trans_include(prefix: impl Into<String>, table: RouteTable) -> Group {
	Group::new(RouteTemplate::regex(prefix).translatable(), table)
}

/// A language-selection group: `<language>/` followed by `table`
pub fn lang_prefixed(table: RouteTable) -> RouteEntry {
	RouteEntry::LangPrefixed(table)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builders_set_fields() {
		// Arrange & Act
		let leaf = trans_path("news/{slug}/", "news.detail")
			.with_name("news-detail")
			.with_kwargs([("section", "news")])
			.do_not_translate();
		let group = include("^admin/", RouteTable::new()).with_app_name("admin");

		// Assert
		assert!(leaf.template().is_translatable());
		assert_eq!(leaf.view().as_str(), "news.detail");
		assert_eq!(leaf.name(), Some("news-detail"));
		assert_eq!(
			leaf.default_kwargs().get("section").map(String::as_str),
			Some("news")
		);
		assert_eq!(leaf.translation_scheme(), Some(&TranslationScheme::Identity));
		assert_eq!(group.namespace(), Some("admin"));
		assert_eq!(group.app_name(), Some("admin"));
		assert!(!group.template().is_translatable());
	}

	#[rstest]
	fn test_duplicate_names_are_recorded() {
		// Act
		let table = RouteTable::new()
			.route(re_path("^a/$", "a").with_name("page"))
			.route(re_path("^b/$", "b").with_name("other"))
			.route(re_path("^c/$", "c").with_name("page"));

		// Assert
		assert_eq!(table.duplicate_names(), ["page".to_string()]);
		assert_eq!(table.len(), 3);
	}

	#[rstest]
	fn test_same_name_in_nested_tables_is_not_a_duplicate() {
		let inner = RouteTable::new().route(re_path("^a/$", "inner").with_name("page"));
		let table = RouteTable::new()
			.route(re_path("^a/$", "outer").with_name("page"))
			.route(include("^inner/", inner));

		assert!(table.duplicate_names().is_empty());
	}

	#[rstest]
	fn test_from_iterator_preserves_order() {
		let table: RouteTable = vec![
			RouteEntry::from(re_path("^first/$", "first")),
			RouteEntry::from(re_path("^second/$", "second")),
		]
		.into_iter()
		.collect();

		let views: Vec<&str> = table
			.entries()
			.iter()
			.filter_map(|entry| match entry {
				RouteEntry::Leaf(leaf) => Some(leaf.view().as_str()),
				_ => None,
			})
			.collect();
		assert_eq!(views, vec!["first", "second"]);
	}
}
