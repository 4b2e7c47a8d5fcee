//! Error types for language-aware routing.
//!
//! A path that matches no route is not an error: [`crate::UrlResolver::resolve`]
//! returns `Ok(None)` for it.

/// Errors raised by pattern compilation and reverse resolution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UrlError {
	/// A pattern (after translation) is not a valid regular expression.
	#[error("invalid URL pattern '{pattern}' for language '{language}': {source}")]
	PatternCompilation {
		pattern: String,
		language: String,
		#[source]
		source: regex::Error,
	},

	/// No reverse candidate accepted the supplied arguments.
	#[error("reverse for '{target}' in language '{language}' not found: {reason}")]
	NoReverseMatch {
		target: String,
		language: String,
		reason: String,
	},

	/// A dotted name reached several namespace instances and no current app was given.
	#[error("namespace '{namespace}' is ambiguous between instances {instances:?}")]
	AmbiguousNamespace {
		namespace: String,
		instances: Vec<String>,
	},

	/// Positional and keyword arguments were both supplied to reverse.
	#[error("cannot mix positional and keyword arguments when reversing '{0}'")]
	MixedArguments(String),

	/// Configuration does not support the requested operation.
	#[error("improperly configured: {0}")]
	ImproperlyConfigured(String),
}

impl UrlError {
	pub(crate) fn no_reverse_match(
		target: impl Into<String>,
		language: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		Self::NoReverseMatch {
			target: target.into(),
			language: language.into(),
			reason: reason.into(),
		}
	}
}

/// Result type for routing operations.
pub type UrlResult<T> = Result<T, UrlError>;
