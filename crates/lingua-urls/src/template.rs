//! Route pattern templates.
//!
//! A [`RouteTemplate`] is the raw pattern a route was declared with. When it is
//! translatable the raw pattern doubles as a message id: the pattern actually
//! matched for a language is whatever the catalog returns for that id.

use lingua_i18n::Translator;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEMPLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a template, used as the matcher cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u64);

impl TemplateId {
	fn next() -> Self {
		Self(NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed))
	}
}

/// Pattern syntax of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateSyntax {
	/// Regular expression, e.g. `^news/(?P<slug>[-\w]+)/$`
	Regex,
	/// Brace placeholders, e.g. `news/{slug}/` or `static/{path:*}`
	Path,
}

/// A route fragment, possibly translatable.
///
/// Clones share the same [`TemplateId`].
///
/// # Examples
///
/// ```
/// use lingua_i18n::NullTranslator;
/// use lingua_urls::RouteTemplate;
///
/// let template = RouteTemplate::path("users/{id}/").translatable();
/// assert!(template.is_translatable());
/// assert_eq!(
///     template.regex_source("fr", &NullTranslator),
///     "users/(?P<id>[^/]+)/"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RouteTemplate {
	id: TemplateId,
	raw: String,
	translatable: bool,
	syntax: TemplateSyntax,
}

impl RouteTemplate {
	/// A regular-expression template that is matched verbatim in every language
	pub fn regex(raw: impl Into<String>) -> Self {
		Self::new(raw, TemplateSyntax::Regex)
	}

	/// A brace-placeholder template that is matched verbatim in every language
	pub fn path(raw: impl Into<String>) -> Self {
		Self::new(raw, TemplateSyntax::Path)
	}

	fn new(raw: impl Into<String>, syntax: TemplateSyntax) -> Self {
		Self {
			id: TemplateId::next(),
			raw: raw.into(),
			translatable: false,
			syntax,
		}
	}

	/// Mark the raw pattern as a message id to look up per language
	pub fn translatable(mut self) -> Self {
		self.translatable = true;
		self
	}

	pub fn id(&self) -> TemplateId {
		self.id
	}

	pub fn raw(&self) -> &str {
		&self.raw
	}

	pub fn is_translatable(&self) -> bool {
		self.translatable
	}

	pub fn syntax(&self) -> TemplateSyntax {
		self.syntax
	}

	/// The pattern text for `language`, in the template's own syntax
	///
	/// The empty pattern is never looked up: catalogs keep their metadata
	/// under the empty message id.
	pub fn translated(&self, language: &str, translator: &dyn Translator) -> String {
		if self.translatable && !self.raw.is_empty() {
			translator.translate(&self.raw, language)
		} else {
			self.raw.clone()
		}
	}

	/// The regular expression source for `language`
	pub fn regex_source(&self, language: &str, translator: &dyn Translator) -> String {
		let translated = self.translated(language, translator);
		match self.syntax {
			TemplateSyntax::Regex => translated,
			TemplateSyntax::Path => path_to_regex(&translated),
		}
	}
}

/// Convert a brace-placeholder pattern into an unanchored regex source
///
/// - `{name}` captures one path segment (excludes `/`)
/// - `{name:*}` captures the rest of the path (includes `/`)
/// - Literal text is escaped
///
/// # Examples
///
/// ```
/// use lingua_urls::template::path_to_regex;
///
/// assert_eq!(path_to_regex("users/{id}/"), "users/(?P<id>[^/]+)/");
/// assert_eq!(path_to_regex("static/{path:*}"), "static/(?P<path>.*)");
/// assert_eq!(path_to_regex("a.b/"), r"a\.b/");
/// ```
pub fn path_to_regex(pattern: &str) -> String {
	let mut regex_str = String::with_capacity(pattern.len() + 16);
	let mut chars = pattern.chars().peekable();

	while let Some(c) = chars.next() {
		if c != '{' {
			regex_str.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
			continue;
		}

		let mut param = String::new();
		let mut is_wildcard = false;
		let mut in_converter = false;
		for next in chars.by_ref() {
			match next {
				'}' => break,
				':' => in_converter = true,
				'*' if in_converter => is_wildcard = true,
				_ if in_converter => {}
				_ => param.push(next),
			}
		}

		if is_wildcard {
			regex_str.push_str(&format!("(?P<{}>.*)", param));
		} else {
			regex_str.push_str(&format!("(?P<{}>[^/]+)", param));
		}
	}

	regex_str
}
