//! Pure helpers: endpoint validation and cache directive parsing.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use url::Url;

use crate::error::ConfigError;

/// Reject key feed endpoints that are not https URLs.
pub fn validate_endpoint(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() != "https" {
        return Err(ConfigError::InsecureEndpoint {
            url: url.to_string(),
        });
    }

    Ok(parsed)
}

/// Freshness lifetime from a `Cache-Control` header value.
///
/// The first directive carrying `max-age=<digits>` wins; directives like
/// `max-age=-1` or `max-age=soon` are skipped. No such directive, or a value
/// too large to represent, yields zero.
pub fn parse_max_age(cache_control: Option<&str>) -> Duration {
    let Some(header) = cache_control else {
        return Duration::ZERO;
    };

    header
        .split(',')
        .find_map(|directive| max_age_pattern().captures(directive))
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

fn max_age_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\s*max-age\s*=\s*(\d+)\s*")
            .unwrap_or_else(|e| panic!("invalid max-age pattern: {e}"))
    })
}
