//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use untical_untis::accounts::AccountRegistry;
use untical_untis::config::UntisConfig;

use crate::error::CliError;

/// untical - school timetable as a calendar feed
#[derive(Debug, Parser)]
#[command(name = "untical")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of weeks to include in the feed
    #[arg(long, short, default_value_t = 4)]
    pub weeks: u32,

    /// Start date (yyyy-mm-dd); snapped to its Monday. Defaults to the
    /// current week.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Output cleaned JSON instead of a calendar document
    #[arg(long)]
    pub json: bool,

    /// Write the feed to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Account id to use when a multi-account registry is configured
    #[arg(long)]
    pub account: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Credentials ---
    /// WebUntis server name
    #[arg(long, env = "WEBUNTIS_DOMAIN")]
    pub domain: Option<String>,

    /// School identifier
    #[arg(long, env = "WEBUNTIS_SCHOOL")]
    pub school: Option<String>,

    /// Login user name
    #[arg(long, env = "WEBUNTIS_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "WEBUNTIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Multi-account registry as a JSON array
    #[arg(long, env = "WEBUNTIS_ACCOUNTS", hide_env_values = true)]
    pub accounts: Option<String>,

    // --- Enrichment ---
    /// Skip the teacher-enrichment pass
    #[arg(long)]
    pub no_enrich: bool,

    /// Cap on detail lookups per run
    #[arg(long, env = "DETAIL_MAX", default_value_t = 60)]
    pub max_details: usize,

    /// Log every detail attempt
    #[arg(long)]
    pub verbose_details: bool,
}

impl Cli {
    /// Resolves the account configuration from the flags/environment.
    ///
    /// A multi-account registry wins over single-account credentials; both
    /// shapes end up as the same uniform account list.
    pub fn resolve_config(&self) -> Result<UntisConfig, CliError> {
        let registry = match &self.accounts {
            Some(raw) => AccountRegistry::from_json(raw),
            None => match (&self.domain, &self.school, &self.username, &self.password) {
                (Some(domain), Some(school), Some(username), Some(password)) => {
                    AccountRegistry::single(domain, school, username, password)
                }
                _ => {
                    return Err(CliError::Config(
                        "no credentials: set WEBUNTIS_DOMAIN/SCHOOL/USERNAME/PASSWORD \
                         or WEBUNTIS_ACCOUNTS"
                            .to_string(),
                    ));
                }
            },
        };

        let account = match &self.account {
            Some(id) => registry
                .get(id)
                .ok_or_else(|| CliError::Config(format!("unknown account id: {id}")))?,
            None => registry
                .accounts()
                .first()
                .ok_or_else(|| CliError::Config("account registry is empty".to_string()))?,
        };

        Ok(UntisConfig::from(account)
            .with_enrichment(!self.no_enrich)
            .with_max_detail_requests(self.max_details)
            .with_verbose_enrichment(self.verbose_details))
    }
}
