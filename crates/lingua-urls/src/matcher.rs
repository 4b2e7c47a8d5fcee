//! Language-scoped matcher cache.
//!
//! Compiled matchers are keyed by `(language, template identity, anchoring)`.
//! Fills are lazy and racing fills are harmless: two threads compiling the
//! same key produce equal matchers and either may be stored. Every fill is
//! tagged with the cache generation it started under, and a fill that
//! finishes after an invalidation is returned to its caller but never stored.

use crate::error::{UrlError, UrlResult};
use crate::template::{RouteTemplate, TemplateId};
use lingua_i18n::Translator;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum compiled size of a single route regex (in bytes).
const MAX_ROUTE_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// How much of the path a matcher must consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchoring {
	/// The whole remaining path (leaf routes)
	Full,
	/// A prefix of the remaining path (groups)
	Prefix,
}

impl Anchoring {
	fn anchor(self, source: &str) -> String {
		match (self, source.is_empty()) {
			(Self::Full, true) => "^$".to_string(),
			(Self::Prefix, true) => "^".to_string(),
			(Self::Full, false) => format!("^(?:{})$", source),
			(Self::Prefix, false) => format!("^(?:{})", source),
		}
	}
}

/// Arguments captured by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatch {
	/// Byte offset just past the consumed text
	pub end: usize,
	/// Unnamed captures, only populated when the pattern has no named groups
	pub args: Vec<String>,
	/// Named captures that participated in the match
	pub kwargs: HashMap<String, String>,
}

/// A template compiled for one language.
#[derive(Debug)]
pub struct CompiledMatcher {
	language: String,
	source: String,
	regex: Regex,
	has_named_groups: bool,
}

impl CompiledMatcher {
	/// Compile `source` with the given anchoring
	pub fn compile(language: &str, source: &str, anchoring: Anchoring) -> UrlResult<Self> {
		let regex = build_regex(&anchoring.anchor(source), language)?;
		let has_named_groups = regex.capture_names().flatten().next().is_some();
		Ok(Self {
			language: language.to_string(),
			source: source.to_string(),
			regex,
			has_named_groups,
		})
	}

	pub fn language(&self) -> &str {
		&self.language
	}

	/// The translated pattern this matcher was compiled from
	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn regex(&self) -> &Regex {
		&self.regex
	}

	/// Match `path`, returning the captured arguments
	pub fn matches(&self, path: &str) -> Option<PatternMatch> {
		let captures = self.regex.captures(path)?;
		let end = captures.get(0).map_or(0, |m| m.end());

		if self.has_named_groups {
			let kwargs = self
				.regex
				.capture_names()
				.flatten()
				.filter_map(|name| {
					captures
						.name(name)
						.map(|m| (name.to_string(), m.as_str().to_string()))
				})
				.collect();
			Some(PatternMatch {
				end,
				args: Vec::new(),
				kwargs,
			})
		} else {
			let args = captures
				.iter()
				.skip(1)
				.flatten()
				.map(|m| m.as_str().to_string())
				.collect();
			Some(PatternMatch {
				end,
				args,
				kwargs: HashMap::new(),
			})
		}
	}
}

fn build_regex(pattern: &str, language: &str) -> UrlResult<Regex> {
	RegexBuilder::new(pattern)
		.size_limit(MAX_ROUTE_REGEX_SIZE)
		.build()
		.map_err(|source| UrlError::PatternCompilation {
			pattern: pattern.to_string(),
			language: language.to_string(),
			source,
		})
}

type MatcherKey = (TemplateId, Anchoring);

/// Cache of compiled matchers and reverse verification patterns, partitioned by language.
#[derive(Debug, Default)]
pub struct MatcherCache {
	matchers: RwLock<HashMap<String, HashMap<MatcherKey, Arc<CompiledMatcher>>>>,
	verifiers: RwLock<HashMap<String, HashMap<String, Regex>>>,
	generation: AtomicU64,
}

impl MatcherCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// The matcher for `template` in `language`, compiling it on first use
	///
	/// Translatable templates are looked up through `translator` before
	/// compiling. An invalid translated pattern fails here, at first use.
	pub fn get_or_compile(
		&self,
		template: &RouteTemplate,
		language: &str,
		anchoring: Anchoring,
		translator: &dyn Translator,
	) -> UrlResult<Arc<CompiledMatcher>> {
		let key = (template.id(), anchoring);
		if let Some(hit) = self
			.matchers
			.read()
			.get(language)
			.and_then(|by_key| by_key.get(&key))
		{
			return Ok(Arc::clone(hit));
		}

		let generation = self.generation();
		let source = template.regex_source(language, translator);
		let matcher = Arc::new(CompiledMatcher::compile(language, &source, anchoring)?);
		tracing::debug!(
			language,
			raw = template.raw(),
			source = %source,
			?anchoring,
			"compiled route matcher"
		);

		let mut matchers = self.matchers.write();
		if self.generation() == generation {
			matchers
				.entry(language.to_string())
				.or_default()
				.insert(key, Arc::clone(&matcher));
		}
		Ok(matcher)
	}

	/// The fully anchored regex used to verify a reversed path
	pub fn verifier(&self, pattern: &str, language: &str) -> UrlResult<Regex> {
		if let Some(hit) = self
			.verifiers
			.read()
			.get(language)
			.and_then(|by_pattern| by_pattern.get(pattern))
		{
			return Ok(hit.clone());
		}

		let generation = self.generation();
		let regex = build_regex(&Anchoring::Full.anchor(pattern), language)?;

		let mut verifiers = self.verifiers.write();
		if self.generation() == generation {
			verifiers
				.entry(language.to_string())
				.or_default()
				.insert(pattern.to_string(), regex.clone());
		}
		Ok(regex)
	}

	/// Drop every cached matcher
	pub fn invalidate_all(&self) {
		let mut matchers = self.matchers.write();
		let mut verifiers = self.verifiers.write();
		matchers.clear();
		verifiers.clear();
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	/// Drop the cached matchers of one language
	pub fn invalidate_language(&self, language: &str) {
		let mut matchers = self.matchers.write();
		let mut verifiers = self.verifiers.write();
		matchers.remove(language);
		verifiers.remove(language);
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	/// Incremented by every invalidation
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Number of cached matchers across all languages
	pub fn len(&self) -> usize {
		self.matchers.read().values().map(HashMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use lingua_i18n::{CatalogSet, MessageCatalog, NullTranslator};
	use rstest::rstest;

	#[rstest]
	#[case(r"^articles/(?P<year>\d{4})/$", "articles/2024/", &[], &[("year", "2024")])]
	#[case(r"^articles/(\d{4})/(\d{2})/$", "articles/2024/05/", &["2024", "05"], &[])]
	#[case(r"^mixed/(?P<slug>\w+)/(\d+)/$", "mixed/abc/7/", &[], &[("slug", "abc")])]
	#[case(r"^opt/(?:(?P<page>\d+)/)?$", "opt/", &[], &[])]
	fn test_captures(
		#[case] source: &str,
		#[case] path: &str,
		#[case] args: &[&str],
		#[case] kwargs: &[(&str, &str)],
	) {
		// Arrange
		let matcher = CompiledMatcher::compile("en", source, Anchoring::Full).unwrap();

		// Act
		let matched = matcher.matches(path).unwrap();

		// Assert
		assert_eq!(matched.args, args);
		let expected: HashMap<String, String> = kwargs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		assert_eq!(matched.kwargs, expected);
		assert_eq!(matched.end, path.len());
	}

	#[rstest]
	fn test_anchoring() {
		let full = CompiledMatcher::compile("en", "^about-us/$", Anchoring::Full).unwrap();
		let prefix = CompiledMatcher::compile("en", "^about-us/", Anchoring::Prefix).unwrap();

		assert!(full.matches("about-us/team/").is_none());
		assert!(full.matches("x/about-us/").is_none());
		assert_eq!(prefix.matches("about-us/team/").map(|m| m.end), Some(9));
	}

	#[rstest]
	fn test_unanchored_leaf_source_is_fully_anchored() {
		let matcher = CompiledMatcher::compile("en", "about-us/", Anchoring::Full).unwrap();
		assert!(matcher.matches("about-us/").is_some());
		assert!(matcher.matches("about-us/more").is_none());
	}

	#[rstest]
	fn test_invalid_pattern_reports_language() {
		// Arrange
		let mut fr = MessageCatalog::new("fr");
		fr.add_translation("^ok/$", "^(unclosed/$");
		let catalogs = CatalogSet::new().with_catalog(fr);
		let cache = MatcherCache::new();
		let template = RouteTemplate::regex("^ok/$").translatable();

		// Act
		let english = cache.get_or_compile(&template, "en", Anchoring::Full, &catalogs);
		let french = cache.get_or_compile(&template, "fr", Anchoring::Full, &catalogs);

		// Assert
		assert!(english.is_ok());
		match french {
			Err(UrlError::PatternCompilation { language, .. }) => assert_eq!(language, "fr"),
			other => panic!("expected a compilation error, got {:?}", other),
		}
	}

	#[rstest]
	fn test_cache_hit_returns_same_matcher() {
		let cache = MatcherCache::new();
		let template = RouteTemplate::regex("^a/$");

		let first = cache
			.get_or_compile(&template, "en", Anchoring::Full, &NullTranslator)
			.unwrap();
		let second = cache
			.get_or_compile(&template, "en", Anchoring::Full, &NullTranslator)
			.unwrap();

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(cache.len(), 1);
	}

	#[rstest]
	fn test_invalidate_language_keeps_other_languages() {
		// Arrange
		let cache = MatcherCache::new();
		let template = RouteTemplate::regex("^a/$");
		for language in ["en", "fr"] {
			cache
				.get_or_compile(&template, language, Anchoring::Full, &NullTranslator)
				.unwrap();
		}
		let before = cache.generation();

		// Act
		cache.invalidate_language("fr");

		// Assert
		assert_eq!(cache.len(), 1);
		assert!(cache.generation() > before);
		cache.invalidate_all();
		assert!(cache.is_empty());
	}

	#[rstest]
	fn test_translator_change_is_seen_after_invalidation() {
		// Arrange
		let cache = MatcherCache::new();
		let template = RouteTemplate::regex("^the-cat/$").translatable();
		let old = |text: &str, _: &str| text.replace("cat", "chien");
		let new = |text: &str, _: &str| text.replace("cat", "chat");
		cache
			.get_or_compile(&template, "fr", Anchoring::Full, &old)
			.unwrap();

		// Act
		let stale = cache
			.get_or_compile(&template, "fr", Anchoring::Full, &new)
			.unwrap();
		cache.invalidate_all();
		let fresh = cache
			.get_or_compile(&template, "fr", Anchoring::Full, &new)
			.unwrap();

		// Assert
		assert_eq!(stale.source(), "^the-chien/$");
		assert_eq!(fresh.source(), "^the-chat/$");
	}

	#[rstest]
	fn test_verifier_is_fully_anchored() {
		let cache = MatcherCache::new();
		let verifier = cache.verifier(r"(?:a/)(?:(?P<id>\d+)/$)", "en").unwrap();
		assert!(verifier.is_match("a/12/"));
		assert!(!verifier.is_match("a/x/"));
		assert!(!verifier.is_match("b/a/12/"));
	}
}
