use std::time::*;

/// Default cache entry duration.
pub const DEFAULT_TTL: Duration = Duration::from_millis(2000);

/// Default maximum number of cache entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

//
// CacheConfiguration
//

/// Cache configuration.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfiguration {
    /// Duration of entries that do not specify their own.
    pub ttl: Duration,

    /// Maximum number of entries.
    pub max_entries: usize,
}

impl CacheConfiguration {
    /// Constructor.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries }
    }

    /// Set the TTL from a human-readable string, e.g. "2s" or "1m 30s".
    ///
    /// Parsed with [duration-str](https://github.com/baoyachi/duration-str).
    pub fn with_ttl_str(mut self, ttl: &str) -> Result<Self, InvalidDurationError> {
        self.ttl = duration_str::parse(ttl)
            .map_err(|error| InvalidDurationError(ttl.into(), error.to_string()))?;
        Ok(self)
    }
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

//
// InvalidDurationError
//

/// Invalid duration.
#[derive(Debug, thiserror::Error)]
#[error("invalid duration {0:?}: {1}")]
pub struct InvalidDurationError(pub String, pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_human_durations() {
        let configuration = CacheConfiguration::default().with_ttl_str("5s").unwrap();
        assert_eq!(configuration.ttl, Duration::from_secs(5));
        assert_eq!(configuration.max_entries, DEFAULT_MAX_ENTRIES);

        assert!(CacheConfiguration::default().with_ttl_str("soon").is_err());
    }
}
