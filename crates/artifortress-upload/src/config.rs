use std::time::Duration;

/// Presign TTL bounds/default and session expiry, named as config
/// knobs per the "Environment / configuration" inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    pub presign_ttl_min: Duration,
    pub presign_ttl_max: Duration,
    pub presign_ttl_default: Duration,
    pub session_ttl: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            presign_ttl_min: Duration::from_secs(60),
            presign_ttl_max: Duration::from_secs(3600),
            presign_ttl_default: Duration::from_secs(900),
            session_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl UploadConfig {
    pub fn clamp_presign_ttl(&self, requested: Option<Duration>) -> Duration {
        let ttl = requested.unwrap_or(self.presign_ttl_default);
        ttl.clamp(self.presign_ttl_min, self.presign_ttl_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_bounds() {
        let config = UploadConfig::default();
        assert_eq!(config.presign_ttl_default, Duration::from_secs(900));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn clamp_presign_ttl_respects_bounds() {
        let config = UploadConfig::default();
        assert_eq!(config.clamp_presign_ttl(Some(Duration::from_secs(10))), config.presign_ttl_min);
        assert_eq!(config.clamp_presign_ttl(Some(Duration::from_secs(9999))), config.presign_ttl_max);
        assert_eq!(config.clamp_presign_ttl(None), config.presign_ttl_default);
    }
}
