//! Per-language domains.
//!
//! Language domains only ever apply to URLs being produced: reverse results
//! and [`complete_url`]. Matching never looks at them.

use crate::error::{UrlError, UrlResult};
use lingua_i18n::I18nSettings;

/// Make `url` absolute using the domain configured for `language`
///
/// URLs that already carry a scheme are returned unchanged.
///
/// # Examples
///
/// ```
/// use lingua_i18n::{I18nSettings, Language};
/// use lingua_urls::complete_url;
///
/// let settings = I18nSettings::new("en", vec![Language::new("en", "English"), Language::new("fr", "French")])
///     .with_domain("fr", "example.fr", "French");
///
/// assert_eq!(complete_url("/a-propos/", "fr", &settings).unwrap(), "http://example.fr/a-propos/");
/// assert_eq!(complete_url("https://x.org/", "fr", &settings).unwrap(), "https://x.org/");
/// assert!(complete_url("/about/", "en", &settings).is_err());
/// ```
pub fn complete_url(url: &str, language: &str, settings: &I18nSettings) -> UrlResult<String> {
	if has_scheme(url) {
		return Ok(url.to_string());
	}
	let domain = settings.domain_for(language).ok_or_else(|| {
		UrlError::ImproperlyConfigured(format!(
			"no domain specified for language code '{}'",
			language
		))
	})?;
	Ok(format!("{}://{}{}", settings.url_scheme, domain.host, url))
}

fn has_scheme(url: &str) -> bool {
	url.split_once("://").is_some_and(|(scheme, _)| {
		!scheme.is_empty()
			&& scheme
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use lingua_i18n::Language;
	use rstest::{fixture, rstest};

	#[fixture]
	fn settings() -> I18nSettings {
		I18nSettings::new(
			"en",
			vec![Language::new("en", "English"), Language::new("fr", "French")],
		)
		.with_domain("fr", "www.trapeze-fr.com", "French Site")
		.with_url_scheme("https")
	}

	#[rstest]
	#[case("/garfield/", "https://www.trapeze-fr.com/garfield/")]
	#[case("http://www.trapeze-en.com/garfield/", "http://www.trapeze-en.com/garfield/")]
	#[case("", "https://www.trapeze-fr.com")]
	fn test_complete_url(settings: I18nSettings, #[case] url: &str, #[case] expected: &str) {
		assert_eq!(complete_url(url, "fr", &settings).unwrap(), expected);
	}

	#[rstest]
	fn test_missing_domain_is_a_configuration_error(settings: I18nSettings) {
		// Act
		let err = complete_url("/garfield/", "en", &settings).unwrap_err();

		// Assert
		assert!(matches!(err, UrlError::ImproperlyConfigured(_)));
		assert_eq!(
			err.to_string(),
			"improperly configured: no domain specified for language code 'en'"
		);
	}

	#[rstest]
	#[case("/next?u=http://x", false)]
	#[case("ftp://host/", true)]
	#[case("://host/", false)]
	fn test_has_scheme(#[case] url: &str, #[case] expected: bool) {
		assert_eq!(has_scheme(url), expected);
	}
}
