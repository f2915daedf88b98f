//! Client configuration.

use std::time::Duration;

use crate::accounts::Account;
use crate::error::{UntisError, UntisResult};

/// Configuration for one WebUntis account and the feed built from it.
#[derive(Debug, Clone)]
pub struct UntisConfig {
    /// Server name as the user supplied it (resolved before use).
    pub domain: String,

    /// School identifier registered on that server.
    pub school: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent sent upstream. WebUntis rejects unadorned clients, so the
    /// default imitates a browser.
    pub user_agent: String,

    /// Whether to backfill missing teacher names via detail lookups.
    pub enrich_teachers: bool,

    /// Cap on detail lookups per run.
    pub max_detail_requests: usize,

    /// Log every detail attempt instead of only the summary.
    pub verbose_enrichment: bool,
}

impl UntisConfig {
    /// Default per-request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default cap on detail lookups per run.
    pub const DEFAULT_MAX_DETAIL_REQUESTS: usize = 60;

    /// Creates a configuration with defaults for everything but the account.
    pub fn new(
        domain: impl Into<String>,
        school: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            school: school.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: "Mozilla/5.0".to_string(),
            enrich_teachers: true,
            max_detail_requests: Self::DEFAULT_MAX_DETAIL_REQUESTS,
            verbose_enrichment: false,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Toggles teacher enrichment.
    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_teachers = enabled;
        self
    }

    /// Sets the detail-lookup cap.
    pub fn with_max_detail_requests(mut self, max: usize) -> Self {
        self.max_detail_requests = max;
        self
    }

    /// Toggles per-attempt enrichment logging.
    pub fn with_verbose_enrichment(mut self, verbose: bool) -> Self {
        self.verbose_enrichment = verbose;
        self
    }

    /// Checks that the account fields are present.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` naming the first missing field.
    pub fn validate(&self) -> UntisResult<()> {
        for (field, value) in [
            ("domain", &self.domain),
            ("school", &self.school),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(UntisError::configuration(format!("{field} is not set")));
            }
        }
        Ok(())
    }
}

impl From<&Account> for UntisConfig {
    fn from(account: &Account) -> Self {
        Self::new(
            &account.domain,
            &account.school,
            &account.username,
            &account.password,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UntisErrorCode;

    #[test]
    fn defaults() {
        let config = UntisConfig::new("ajax", "My School", "user", "pass");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "Mozilla/5.0");
        assert!(config.enrich_teachers);
        assert_eq!(config.max_detail_requests, 60);
        assert!(!config.verbose_enrichment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = UntisConfig::new("ajax", "My School", "user", "pass")
            .with_timeout(Duration::from_secs(5))
            .with_enrichment(false)
            .with_max_detail_requests(10)
            .with_verbose_enrichment(true);

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.enrich_teachers);
        assert_eq!(config.max_detail_requests, 10);
        assert!(config.verbose_enrichment);
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let config = UntisConfig::new("ajax", "", "user", "pass");
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), UntisErrorCode::ConfigurationError);
        assert!(err.message().contains("school"));
    }
}
