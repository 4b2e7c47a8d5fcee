//! Per-language reverse index and reverse resolution.
//!
//! [`ReverseIndex::build`] flattens a route table for one language, bottom-up:
//! every nested table produces its own fresh index, and the parent prefixes
//! its candidates with the group's translated prefix. Namespaced groups are
//! kept as separate sub-indices so a `namespace:name` lookup only ever sees
//! the candidates of the namespace it walked through.

use crate::error::{UrlError, UrlResult};
use crate::matcher::MatcherCache;
use crate::normalize::normalize;
use crate::table::{RouteEntry, RouteTable, ViewId};
use lingua_i18n::{I18nSettings, Translator};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Characters left unescaped when a reversed IRI is converted to a URI:
/// unreserved characters, sub-delimiters and `/ : @`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'.')
	.remove(b'_')
	.remove(b'~')
	.remove(b'/')
	.remove(b':')
	.remove(b'@')
	.remove(b'!')
	.remove(b'$')
	.remove(b'&')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')')
	.remove(b'*')
	.remove(b'+')
	.remove(b',')
	.remove(b';')
	.remove(b'=');

/// Key under which candidates are registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReverseKey {
	View(ViewId),
	Name(String),
}

/// What to reverse: a view, or a route name optionally qualified as `ns:ns:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseTarget {
	View(ViewId),
	Name(String),
}

impl From<&str> for ReverseTarget {
	fn from(name: &str) -> Self {
		Self::Name(name.to_string())
	}
}

impl From<String> for ReverseTarget {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

impl From<ViewId> for ReverseTarget {
	fn from(view: ViewId) -> Self {
		Self::View(view)
	}
}

impl From<&ViewId> for ReverseTarget {
	fn from(view: &ViewId) -> Self {
		Self::View(view.clone())
	}
}

impl fmt::Display for ReverseTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::View(view) => write!(f, "{}", view),
			Self::Name(name) => f.write_str(name),
		}
	}
}

/// Arguments for a reverse call: positional or keyword, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseArgs {
	pub args: Vec<String>,
	pub kwargs: HashMap<String, String>,
}

impl ReverseArgs {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn positional<I, V>(args: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<String>,
	{
		Self {
			args: args.into_iter().map(Into::into).collect(),
			kwargs: HashMap::new(),
		}
	}

	pub fn keyword<I, K, V>(kwargs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			args: Vec::new(),
			kwargs: kwargs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}

	pub fn arg(mut self, value: impl Into<String>) -> Self {
		self.args.push(value.into());
		self
	}

	pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.kwargs.insert(name.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty() && self.kwargs.is_empty()
	}
}

/// One way of building a URL for a view or name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseCandidate {
	template: String,
	params: Vec<String>,
	pattern: String,
	defaults: HashMap<String, String>,
}

impl ReverseCandidate {
	fn root() -> Self {
		Self {
			template: String::new(),
			params: Vec::new(),
			pattern: String::new(),
			defaults: HashMap::new(),
		}
	}

	/// Candidates for one translated regex source
	fn from_source(source: &str, defaults: &HashMap<String, String>) -> Vec<Self> {
		let stripped = source.strip_prefix('^').unwrap_or(source);
		let pattern = if stripped.is_empty() {
			String::new()
		} else {
			format!("(?:{})", stripped)
		};
		normalize(source)
			.into_iter()
			.map(|normalized| Self {
				template: normalized.template,
				params: normalized.params,
				pattern: pattern.clone(),
				defaults: defaults.clone(),
			})
			.collect()
	}

	/// The fixed `<language>/` prefix of a language-selection group
	fn language_prefix(language: &str) -> Self {
		Self {
			template: format!("{}/", language.replace('%', "%%")),
			params: Vec::new(),
			pattern: format!("{}/", regex::escape(language)),
			defaults: HashMap::new(),
		}
	}

	fn then(&self, child: &Self) -> Self {
		let mut defaults = self.defaults.clone();
		defaults.extend(child.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
		// Unnamed captures of the child continue the prefix's numbering
		let offset = self.params.iter().filter(|p| positional_index(p).is_some()).count();
		let shift = |name: &str| match positional_index(name) {
			Some(n) if offset > 0 => format!("_{}", n + offset),
			_ => name.to_string(),
		};
		Self {
			template: format!("{}{}", self.template, rename_placeholders(&child.template, &shift)),
			params: self
				.params
				.iter()
				.cloned()
				.chain(child.params.iter().map(|p| shift(p.as_str())))
				.collect(),
			pattern: format!("{}{}", self.pattern, child.pattern),
			defaults,
		}
	}

	/// Path template with `%(name)s` placeholders, relative to the script prefix
	pub fn template(&self) -> &str {
		&self.template
	}

	/// Parameter names in positional order
	pub fn params(&self) -> &[String] {
		&self.params
	}

	/// Regex the substituted path must match, without the outer anchors
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Default keyword arguments of the route and its groups
	pub fn defaults(&self) -> &HashMap<String, String> {
		&self.defaults
	}
}

fn compose(prefixes: &[ReverseCandidate], children: &[ReverseCandidate]) -> Vec<ReverseCandidate> {
	prefixes
		.iter()
		.flat_map(|prefix| children.iter().map(move |child| prefix.then(child)))
		.collect()
}

/// A namespaced group as seen from the table that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
	prefix: Vec<ReverseCandidate>,
	index: Arc<ReverseIndex>,
}

impl NamespaceEntry {
	/// Prefix candidates from the declaring table down to the namespaced group
	pub fn prefix(&self) -> &[ReverseCandidate] {
		&self.prefix
	}

	pub fn index(&self) -> &Arc<ReverseIndex> {
		&self.index
	}
}

/// Reverse lookup table of one route table for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseIndex {
	language: String,
	entries: HashMap<ReverseKey, Vec<ReverseCandidate>>,
	namespaces: HashMap<String, NamespaceEntry>,
	apps: HashMap<String, Vec<String>>,
}

impl ReverseIndex {
	fn empty(language: &str) -> Self {
		Self {
			language: language.to_string(),
			entries: HashMap::new(),
			namespaces: HashMap::new(),
			apps: HashMap::new(),
		}
	}

	/// Build the index of `table` for `language`
	pub fn build(table: &RouteTable, language: &str, translator: &dyn Translator) -> Self {
		let mut index = Self::empty(language);
		for entry in table.entries() {
			match entry {
				RouteEntry::Leaf(leaf) => {
					let source = leaf.template().regex_source(language, translator);
					let candidates = ReverseCandidate::from_source(&source, leaf.default_kwargs());
					if let Some(name) = leaf.name() {
						index.push(ReverseKey::Name(name.to_string()), candidates.clone());
					}
					index.push(ReverseKey::View(leaf.view().clone()), candidates);
				}
				RouteEntry::Group(group) => {
					let source = group.template().regex_source(language, translator);
					let prefix = ReverseCandidate::from_source(&source, group.default_kwargs());
					let sub = Self::build(group.table(), language, translator);
					match group.namespace() {
						Some(namespace) => {
							index.add_namespace(namespace, group.app_name(), prefix, sub)
						}
						None => index.absorb(&prefix, sub),
					}
				}
				RouteEntry::LangPrefixed(table) => {
					let prefix = [ReverseCandidate::language_prefix(language)];
					index.absorb(&prefix, Self::build(table, language, translator));
				}
			}
		}
		index
	}

	fn push(&mut self, key: ReverseKey, candidates: Vec<ReverseCandidate>) {
		self.entries.entry(key).or_default().extend(candidates);
	}

	fn add_namespace(
		&mut self,
		namespace: &str,
		app_name: Option<&str>,
		prefix: Vec<ReverseCandidate>,
		sub: ReverseIndex,
	) {
		if self.namespaces.contains_key(namespace) {
			tracing::warn!(
				namespace,
				language = %self.language,
				"namespace is declared more than once; the first declaration is used"
			);
			return;
		}
		self.namespaces.insert(
			namespace.to_string(),
			NamespaceEntry {
				prefix,
				index: Arc::new(sub),
			},
		);
		if let Some(app_name) = app_name {
			self.apps
				.entry(app_name.to_string())
				.or_default()
				.push(namespace.to_string());
		}
	}

	/// Merge a non-namespaced sub-index under `prefix`
	fn absorb(&mut self, prefix: &[ReverseCandidate], sub: ReverseIndex) {
		for (key, candidates) in sub.entries {
			self.push(key, compose(prefix, &candidates));
		}
		for (namespace, entry) in sub.namespaces {
			if self.namespaces.contains_key(&namespace) {
				tracing::warn!(
					namespace = %namespace,
					language = %self.language,
					"namespace is declared more than once; the first declaration is used"
				);
				continue;
			}
			self.namespaces.insert(
				namespace,
				NamespaceEntry {
					prefix: compose(prefix, &entry.prefix),
					index: entry.index,
				},
			);
		}
		for (app_name, instances) in sub.apps {
			let known = self.apps.entry(app_name).or_default();
			for instance in instances {
				if !known.contains(&instance) {
					known.push(instance);
				}
			}
		}
	}

	pub fn language(&self) -> &str {
		&self.language
	}

	/// Candidates registered under `key`, in declaration order
	pub fn candidates(&self, key: &ReverseKey) -> &[ReverseCandidate] {
		self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn keys(&self) -> impl Iterator<Item = &ReverseKey> {
		self.entries.keys()
	}

	pub fn namespace(&self, namespace: &str) -> Option<&NamespaceEntry> {
		self.namespaces.get(namespace)
	}

	/// Instance namespaces registered for an application namespace
	pub fn app_instances(&self, app_name: &str) -> &[String] {
		self.apps.get(app_name).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty() && self.namespaces.is_empty()
	}

	/// Pick the instance namespace for one `namespace` path part
	fn instance_for(&self, namespace: &str, hint: Option<&str>) -> UrlResult<String> {
		let Some(instances) = self.apps.get(namespace) else {
			return Ok(namespace.to_string());
		};
		if let Some(found) = hint.and_then(|hint| instances.iter().find(|i| *i == hint)) {
			return Ok(found.clone());
		}
		if instances.iter().any(|i| i == namespace) {
			return Ok(namespace.to_string());
		}
		match instances.as_slice() {
			[only] => Ok(only.clone()),
			_ => Err(UrlError::AmbiguousNamespace {
				namespace: namespace.to_string(),
				instances: instances.clone(),
			}),
		}
	}
}

/// Index `n` of an unnamed-capture placeholder `_n`
fn positional_index(name: &str) -> Option<usize> {
	let digits = name.strip_prefix('_')?;
	if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok()
}

/// Rewrite every `%(name)s` placeholder name of `template` through `rename`
fn rename_placeholders(template: &str, rename: impl Fn(&str) -> String) -> String {
	let mut result = String::with_capacity(template.len());
	let mut rest = template;
	while let Some(start) = rest.find('%') {
		result.push_str(&rest[..start]);
		let tail = &rest[start..];
		if let Some(after) = tail.strip_prefix("%%") {
			result.push_str("%%");
			rest = after;
		} else if let Some((name, after)) = tail
			.strip_prefix("%(")
			.and_then(|inner| inner.split_once(")s"))
		{
			result.push_str("%(");
			result.push_str(&rename(name));
			result.push_str(")s");
			rest = after;
		} else {
			result.push('%');
			rest = &tail[1..];
		}
	}
	result.push_str(rest);
	result
}

/// Substitute `%(name)s` placeholders; `None` if a value is missing
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use lingua_urls::reverse::substitute;
///
/// let mut values = HashMap::new();
/// values.insert("slug".to_string(), "hello".to_string());
///
/// assert_eq!(substitute("news/%(slug)s/", &values), Some("news/hello/".to_string()));
/// assert_eq!(substitute("100%%/", &values), Some("100%/".to_string()));
/// assert_eq!(substitute("%(missing)s/", &values), None);
/// ```
pub fn substitute(template: &str, values: &HashMap<String, String>) -> Option<String> {
	let mut result = String::with_capacity(template.len());
	let mut chars = template.chars();

	while let Some(ch) = chars.next() {
		if ch != '%' {
			result.push(ch);
			continue;
		}
		match chars.next() {
			Some('%') => result.push('%'),
			Some('(') => {
				let name: String = chars.by_ref().take_while(|&c| c != ')').collect();
				if chars.next() != Some('s') {
					return None;
				}
				result.push_str(values.get(&name)?);
			}
			_ => return None,
		}
	}

	Some(result)
}

/// Values for `candidate`, or `None` if the arguments do not fit it
fn candidate_values(
	candidate: &ReverseCandidate,
	args: &ReverseArgs,
) -> Option<HashMap<String, String>> {
	if !args.args.is_empty() {
		if args.args.len() != candidate.params.len() {
			return None;
		}
		return Some(
			candidate
				.params
				.iter()
				.cloned()
				.zip(args.args.iter().cloned())
				.collect(),
		);
	}

	let params: HashSet<&str> = candidate.params.iter().map(String::as_str).collect();
	let unexpected = args
		.kwargs
		.keys()
		.any(|k| !params.contains(k.as_str()) && !candidate.defaults.contains_key(k));
	let missing = params.iter().any(|p| !args.kwargs.contains_key(*p));
	let conflicting = candidate
		.defaults
		.iter()
		.any(|(k, v)| args.kwargs.get(k).is_some_and(|given| given != v));
	if unexpected || missing || conflicting {
		return None;
	}
	Some(args.kwargs.clone())
}

/// Find the first verifying candidate for `target` in `index`
///
/// Returns the path relative to the script prefix, not yet encoded.
pub(crate) fn reverse_path(
	index: &ReverseIndex,
	target: &ReverseTarget,
	args: &ReverseArgs,
	current_app: Option<&str>,
	matchers: &MatcherCache,
) -> UrlResult<String> {
	let language = index.language();
	if !args.args.is_empty() && !args.kwargs.is_empty() {
		return Err(UrlError::MixedArguments(target.to_string()));
	}

	let (namespaces, key) = match target {
		ReverseTarget::View(view) => (Vec::new(), ReverseKey::View(view.clone())),
		ReverseTarget::Name(qualified) => {
			let mut parts: Vec<&str> = qualified.split(':').collect();
			let name = parts.pop().unwrap_or_default();
			(parts, ReverseKey::Name(name.to_string()))
		}
	};
	let hints: Vec<&str> = current_app.map(|app| app.split(':').collect()).unwrap_or_default();

	let mut current = index;
	let mut prefix = vec![ReverseCandidate::root()];
	let mut resolved: Vec<String> = Vec::new();
	for (level, namespace) in namespaces.iter().enumerate() {
		let instance = current.instance_for(namespace, hints.get(level).copied())?;
		let Some(entry) = current.namespace(&instance) else {
			let reason = if resolved.is_empty() {
				format!("'{}' is not a registered namespace", namespace)
			} else {
				format!(
					"'{}' is not a registered namespace inside '{}'",
					namespace,
					resolved.join(":")
				)
			};
			return Err(UrlError::no_reverse_match(target.to_string(), language, reason));
		};
		prefix = compose(&prefix, entry.prefix());
		resolved.push(instance);
		current = entry.index().as_ref();
	}

	for candidate in compose(&prefix, current.candidates(&key)) {
		let Some(values) = candidate_values(&candidate, args) else {
			continue;
		};
		let Some(path) = substitute(&candidate.template, &values) else {
			continue;
		};
		if matchers.verifier(&candidate.pattern, language)?.is_match(&path) {
			return Ok(path);
		}
	}

	let mut kwargs: Vec<_> = args.kwargs.iter().collect();
	kwargs.sort();
	Err(UrlError::no_reverse_match(
		target.to_string(),
		language,
		format!(
			"no pattern accepts arguments {:?} and keyword arguments {:?}",
			args.args, kwargs
		),
	))
}

/// Script prefix, IRI to URI encoding and the language domain, if any
pub(crate) fn finish_url(path: &str, language: &str, settings: &I18nSettings) -> String {
	let prefix = settings.script_prefix.trim_matches('/');
	let iri = if prefix.is_empty() {
		format!("/{}", path)
	} else {
		format!("/{}/{}", prefix, path)
	};
	let uri = utf8_percent_encode(&iri, PATH_ENCODE_SET).to_string();
	match settings.domain_for(language) {
		Some(domain) => format!("{}://{}{}", settings.url_scheme, domain.host, uri),
		None => uri,
	}
}
