//! Feed orchestration.
//!
//! [`UntisClient`] runs the per-week pipeline (login → fetch → decode →
//! enrich → assemble) and fans it out over the requested week range. Week
//! fetches are independent, so they run concurrently and are reassembled in
//! date order afterwards; a week that fails logs a warning and is skipped
//! without aborting its siblings.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use untical_core::clean::CleanDocument;
use untical_core::ical::{FEED_TIMEZONE, project_calendar};
use untical_core::time::{
    is_summer_break, monday_of_week, next_school_year_start, remaining_school_weeks,
};
use untical_core::timetable::Timetable;

use crate::config::UntisConfig;
use crate::enrich::Enricher;
use crate::error::{UntisError, UntisResult};
use crate::fetch::fetch_week;
use crate::hosts::resolve_host;
use crate::http::UntisHttp;
use crate::normalize::decode_periods;
use crate::raw::ElementIndex;
use crate::session;

/// Upper bound on the weeks a single feed may span.
pub const MAX_FEED_WEEKS: u32 = 40;

/// The WebUntis client: one configured account, one shared transport.
#[derive(Clone)]
pub struct UntisClient {
    http: Arc<dyn UntisHttp>,
    config: UntisConfig,
}

impl UntisClient {
    /// Creates a client with a real HTTP transport.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for incomplete account fields, `InternalError`
    /// if the transport cannot be constructed.
    pub fn new(config: UntisConfig) -> UntisResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                UntisError::internal(format!("failed to create HTTP client: {e}")).with_source(e)
            })?;
        Ok(Self {
            http: Arc::new(client),
            config,
        })
    }

    /// Creates a client over a caller-supplied transport.
    pub fn with_http(config: UntisConfig, http: Arc<dyn UntisHttp>) -> UntisResult<Self> {
        config.validate()?;
        Ok(Self { http, config })
    }

    /// The client's configuration.
    pub fn config(&self) -> &UntisConfig {
        &self.config
    }

    /// Resolves the configured server name, retrying a transient probe
    /// failure exactly once.
    pub async fn resolve(&self) -> UntisResult<String> {
        match resolve_host(self.http.as_ref(), &self.config.domain).await {
            Ok(host) => Ok(host),
            Err(e) if e.is_retryable() => {
                debug!(error = %e, "retrying server resolution after transient failure");
                resolve_host(self.http.as_ref(), &self.config.domain).await
            }
            Err(e) => Err(e),
        }
    }

    /// Builds the timetable of the week starting at `week_start`.
    pub async fn week_timetable(&self, host: &str, week_start: NaiveDate) -> UntisResult<Timetable> {
        let session = session::login(
            self.http.as_ref(),
            host,
            &self.config.school,
            &self.config.username,
            &self.config.password,
        )
        .await?;

        let raw = fetch_week(self.http.as_ref(), host, &session, week_start).await?;
        let index = ElementIndex::build(&raw.elements);
        let mut lessons = decode_periods(raw.periods_for(session.person_id), &index)?;

        if self.config.enrich_teachers {
            let stats = Enricher::new(self.http.as_ref(), &self.config, host, &session)
                .enrich(&mut lessons)
                .await;
            if stats.total_missing > 0 {
                info!(
                    attempted = stats.attempted,
                    enriched = stats.enriched,
                    total_missing = stats.total_missing,
                    %week_start,
                    "teacher enrichment"
                );
            }
        }

        let mut timetable = Timetable::from_lessons(lessons);
        timetable.insert_free_periods();
        Ok(timetable)
    }

    /// Assembles the feed timetable over `weeks` weeks.
    ///
    /// The start date defaults to today in the feed timezone, shifts out of
    /// the summer break, snaps to its Monday, and is clamped to the weeks
    /// remaining in the school year. Failed weeks are skipped.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for a weeks count outside 1..=40; resolution
    /// errors are fatal for the whole feed.
    pub async fn feed_timetable(
        &self,
        weeks: u32,
        start: Option<NaiveDate>,
    ) -> UntisResult<Timetable> {
        if !(1..=MAX_FEED_WEEKS).contains(&weeks) {
            return Err(UntisError::configuration(format!(
                "weeks must be between 1 and {MAX_FEED_WEEKS}"
            )));
        }

        let host = self.resolve().await?;

        let mut start_date =
            start.unwrap_or_else(|| Utc::now().with_timezone(&FEED_TIMEZONE).date_naive());
        if is_summer_break(start_date) {
            let shifted = next_school_year_start(start_date);
            debug!(%start_date, %shifted, "start date falls in summer break; using next school year");
            start_date = shifted;
        }
        let start_date = monday_of_week(start_date);

        let weeks_to_fetch = weeks.min(remaining_school_weeks(start_date));
        if weeks_to_fetch == 0 {
            debug!("no school weeks remain; the feed is empty");
            return Ok(Timetable::default());
        }

        let mut tasks = JoinSet::new();
        for offset in 0..weeks_to_fetch {
            let client = self.clone();
            let host = host.clone();
            let monday = start_date + Duration::weeks(i64::from(offset));
            tasks.spawn(async move { (offset, client.week_timetable(&host, monday).await) });
        }

        let mut collected: Vec<Option<Timetable>> = vec![None; weeks_to_fetch as usize];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((offset, Ok(week))) => collected[offset as usize] = Some(week),
                Ok((offset, Err(e))) => {
                    warn!(week_offset = offset, error = %e, "skipping week that could not be generated");
                }
                Err(e) => warn!(error = %e, "week task failed to complete"),
            }
        }

        Ok(Timetable::merge(collected.into_iter().flatten()))
    }

    /// The feed as a serialized calendar document.
    pub async fn calendar_feed(&self, weeks: u32, start: Option<NaiveDate>) -> UntisResult<String> {
        let timetable = self.feed_timetable(weeks, start).await?;
        Ok(project_calendar(&timetable).to_string())
    }

    /// The feed as a cleaned JSON document.
    pub async fn clean_feed(
        &self,
        weeks: u32,
        start: Option<NaiveDate>,
    ) -> UntisResult<CleanDocument> {
        let timetable = self.feed_timetable(weeks, start).await?;
        Ok(CleanDocument::from_timetable(&timetable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UntisErrorCode;
    use crate::http::testing::FakeHttp;

    const LOGIN_OK: &str =
        r#"{"jsonrpc":"2.0","id":"id","result":{"sessionId":"S1","personType":5,"personId":1234}}"#;

    fn week_body(teacher_ref: &str) -> String {
        format!(
            r#"{{"data": {{"result": {{"data": {{
                "elements": [
                    {{"id": 1, "type": 2, "name": "Smith", "longName": "Smith John"}},
                    {{"id": 3, "type": 3, "name": "MATH", "longName": "mathematics"}}
                ],
                "elementPeriods": {{"1234": [
                    {{
                        "id": 10,
                        "date": 20240905,
                        "startTime": 835,
                        "endTime": 920,
                        "cellState": "STANDARD",
                        "elements": [{teacher_ref}{{"id": 3, "type": 3}}]
                    }}
                ]}}
            }}}}}}}}"#
        )
    }

    fn config() -> UntisConfig {
        UntisConfig::new("ajax", "My School", "user", "pass").with_enrichment(false)
    }

    fn client(http: FakeHttp) -> (Arc<FakeHttp>, UntisClient) {
        let http = Arc::new(http);
        let client = UntisClient::with_http(config(), http.clone()).unwrap();
        (http, client)
    }

    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()
    }

    #[tokio::test]
    async fn feed_snaps_to_monday_and_builds_the_week() {
        let body = week_body(r#"{"id": 1, "type": 2},"#);
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "timetable/weekly/data", &[(200, body.as_str())]);
        let (_http, client) = client(http);

        let timetable = client.feed_timetable(1, Some(thursday())).await.unwrap();
        assert_eq!(timetable.day_count(), 1);
        let lesson = timetable.lessons().next().unwrap();
        assert_eq!(lesson.teacher_name, "Smith");
        assert_eq!(lesson.subject_long, "Mathematics");
    }

    #[tokio::test]
    async fn fetch_uses_the_snapped_monday() {
        let body = week_body("");
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "timetable/weekly/data", &[(200, body.as_str())]);
        let (http, client) = client(http);

        client.feed_timetable(1, Some(thursday())).await.unwrap();
        assert!(
            http.requests()
                .iter()
                .any(|line| line.contains("date=2024-09-02"))
        );
    }

    #[tokio::test]
    async fn a_failed_week_does_not_abort_its_siblings() {
        let body = week_body("");
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "date=2024-09-02", &[(200, body.as_str())])
            .route("GET", "date=2024-09-09", &[(500, "")]);
        let (_http, client) = client(http);

        let timetable = client.feed_timetable(2, Some(thursday())).await.unwrap();
        assert_eq!(timetable.day_count(), 1);
    }

    #[tokio::test]
    async fn weeks_out_of_range_are_rejected() {
        let (_http, client) = client(FakeHttp::new());
        for weeks in [0, 41] {
            let err = client.feed_timetable(weeks, None).await.unwrap_err();
            assert_eq!(err.code(), UntisErrorCode::ConfigurationError);
        }
    }

    #[tokio::test]
    async fn summer_break_start_shifts_to_next_school_year() {
        let body = week_body("");
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "timetable/weekly/data", &[(200, body.as_str())]);
        let (http, client) = client(http);

        let summer = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
        client.feed_timetable(1, Some(summer)).await.unwrap();

        // First Monday of September 2024.
        assert!(
            http.requests()
                .iter()
                .any(|line| line.contains("date=2024-09-02"))
        );
    }

    #[tokio::test]
    async fn transient_probe_failure_is_retried_once() {
        let body = week_body("");
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(0, ""), (200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "timetable/weekly/data", &[(200, body.as_str())]);
        let (http, client) = client(http);

        client.feed_timetable(1, Some(thursday())).await.unwrap();
        let probes = http
            .requests()
            .iter()
            .filter(|line| line.starts_with("HEAD"))
            .count();
        assert_eq!(probes, 2);
    }

    #[tokio::test]
    async fn unknown_server_fails_the_feed() {
        let config = UntisConfig::new("nowhere", "s", "u", "p");
        let client = UntisClient::with_http(config, Arc::new(FakeHttp::new())).unwrap();
        let err = client.feed_timetable(1, Some(thursday())).await.unwrap_err();
        assert_eq!(err.code(), UntisErrorCode::UnknownServer);
    }

    #[tokio::test]
    async fn both_output_forms_derive_from_the_same_structure() {
        let body = week_body(r#"{"id": 1, "type": 2},"#);
        let http = FakeHttp::new()
            .route("HEAD", "Ajax.webuntis.com", &[(200, "")])
            .route("POST", "jsonrpc.do", &[(200, LOGIN_OK)])
            .route("GET", "timetable/weekly/data", &[(200, body.as_str())]);
        let (_http, client) = client(http);

        let ics = client.calendar_feed(1, Some(thursday())).await.unwrap();
        assert!(ics.contains("SUMMARY:MATH"));

        let clean = client.clean_feed(1, Some(thursday())).await.unwrap();
        assert_eq!(clean.days.len(), 1);
        assert_eq!(clean.days[0].lessons[0].subject.as_deref(), Some("MATH"));
    }
}
