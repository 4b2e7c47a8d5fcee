//! Request language detection
//!
//! Pure helpers for the request-classification step that runs before
//! routing: pick the language from the first path segment or from the host
//! name, and keep non-staff users out of blocked languages. Callers own the
//! request type and pass plain strings.

use crate::I18nSettings;

/// The language named by the first segment of `path`, if it is configured
///
/// # Example
/// ```
/// use lingua_i18n::{I18nSettings, Language, language_from_path};
///
/// let settings = I18nSettings::new("en", vec![Language::new("en", "English"), Language::new("fr", "French")]);
/// assert_eq!(language_from_path("/fr/a-propos-de-nous/", &settings), Some("fr"));
/// assert_eq!(language_from_path("/garfield/", &settings), None);
/// ```
pub fn language_from_path<'a>(path: &str, settings: &'a I18nSettings) -> Option<&'a str> {
	let candidate = path.trim_start_matches('/').split('/').next()?;
	if candidate.is_empty() {
		return None;
	}
	settings
		.languages
		.iter()
		.find(|l| l.code == candidate)
		.map(|l| l.code.as_str())
}

/// The language whose configured domain equals `host`
///
/// A port suffix on `host` is ignored and the comparison is
/// case-insensitive.
pub fn language_from_host<'a>(host: &str, settings: &'a I18nSettings) -> Option<&'a str> {
	let host = host.rsplit_once(':').map_or(host, |(name, port)| {
		if port.chars().all(|c| c.is_ascii_digit()) {
			name
		} else {
			host
		}
	});
	let found = settings
		.language_domains
		.iter()
		.find(|(_, domain)| domain.host.eq_ignore_ascii_case(host))
		.map(|(code, _)| code.as_str());
	if found.is_none() {
		tracing::trace!(host, "no language domain for host");
	}
	found
}

/// Replace a blocked language with the default language unless `is_staff`
pub fn apply_blocked_languages<'a>(
	language: &'a str,
	is_staff: bool,
	settings: &'a I18nSettings,
) -> &'a str {
	if settings.is_blocked(language) && !is_staff {
		tracing::debug!(
			language,
			fallback = settings.default_language(),
			"blocked language requested by non-staff user"
		);
		settings.default_language()
	} else {
		language
	}
}

/// Detect the request language: path segment, then host, then `fallback`
///
/// Unknown fallbacks are replaced by the default language; blocked
/// languages are applied last.
pub fn detect_language<'a>(
	path: &str,
	host: Option<&str>,
	fallback: Option<&'a str>,
	is_staff: bool,
	settings: &'a I18nSettings,
) -> &'a str {
	let detected = language_from_path(path, settings)
		.or_else(|| host.and_then(|h| language_from_host(h, settings)))
		.or_else(|| {
			fallback.filter(|code| {
				let known = settings.is_known_language(code);
				if !known {
					tracing::warn!(language = *code, "ignoring unknown fallback language");
				}
				known
			})
		})
		.unwrap_or_else(|| settings.default_language());
	apply_blocked_languages(detected, is_staff, settings)
}

/// Redirect target for a bare request to the site root: `/<code>/`
pub fn language_redirect_path(language: &str) -> String {
	format!("/{}/", language)
}
