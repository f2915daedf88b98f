//! Teacher enrichment fallback.
//!
//! Lessons sometimes arrive without a teacher element. For those, the REST
//! calendar-entry detail endpoint usually knows the answer. Each lesson
//! walks a query cascade in priority order (bearer+student, bearer+lesson,
//! cookie+student, cookie+lesson) until one query yields a usable detail
//! payload. A 401 on a bearer query invalidates the token, triggers exactly
//! one re-acquisition, and retries the cascade once; a second rejection is
//! a recorded miss. Individual transport failures are swallowed and the
//! cascade moves on.
//!
//! The detail cache lives on the [`Enricher`] and dies with the run; no
//! state leaks across invocations.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use untical_core::lesson::Lesson;

use crate::config::UntisConfig;
use crate::http::UntisHttp;
use crate::rest_auth::{BearerGrant, acquire_bearer};
use crate::session::Session;

/// Auth material a detail query presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    /// `Authorization: Bearer` with the acquired JWT.
    Bearer,
    /// Session cookie with the encoded school name.
    Cookie,
}

/// Which element the detail query asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryScope {
    /// The session's person (student context).
    Student,
    /// The lesson itself.
    Lesson,
}

/// The query cascade, in priority order.
const QUERY_CASCADE: &[(AuthMode, QueryScope)] = &[
    (AuthMode::Bearer, QueryScope::Student),
    (AuthMode::Bearer, QueryScope::Lesson),
    (AuthMode::Cookie, QueryScope::Student),
    (AuthMode::Cookie, QueryScope::Lesson),
];

/// Cache key for one timetable slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DetailKey {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    lesson_id: i64,
}

impl DetailKey {
    fn for_lesson(lesson: &Lesson) -> Self {
        Self {
            date: lesson.date,
            start: lesson.start_time,
            end: lesson.end_time,
            lesson_id: lesson.lesson_id.unwrap_or(lesson.id),
        }
    }
}

/// A teacher record from the detail payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailTeacher {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl DetailTeacher {
    /// Best available name, preferring the long form.
    fn best_name(&self) -> Option<&str> {
        [&self.long_name, &self.short_name, &self.display_name]
            .into_iter()
            .find_map(|name| name.as_deref().filter(|n| !n.is_empty()))
    }
}

/// One calendar entry of the detail payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailEntry {
    #[serde(default)]
    teachers: Vec<DetailTeacher>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailResponse {
    #[serde(default)]
    calendar_entries: Vec<DetailEntry>,
}

/// Outcome of one cascade walk. `Unauthorized` is its own variant so the
/// retry-once policy is driven by type, not by inspecting a sentinel.
#[derive(Debug, Clone)]
enum DetailOutcome {
    /// A usable detail payload (may still carry no teachers).
    Found(DetailEntry),
    /// A bearer query was rejected with 401.
    Unauthorized,
    /// Every query failed.
    Miss,
}

/// Counters reported after an enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    /// Lessons for which a cascade was started.
    pub attempted: usize,
    /// Lessons that ended up with a teacher name.
    pub enriched: usize,
    /// Lessons that were missing a teacher when the pass began.
    pub total_missing: usize,
}

/// One enrichment run. Owns the bearer state and the detail cache; both are
/// discarded with it.
pub struct Enricher<'a> {
    http: &'a dyn UntisHttp,
    config: &'a UntisConfig,
    host: &'a str,
    session: &'a Session,
    bearer: Option<BearerGrant>,
    cache: HashMap<DetailKey, Option<DetailEntry>>,
}

impl<'a> Enricher<'a> {
    /// Creates an enricher for one run.
    pub fn new(
        http: &'a dyn UntisHttp,
        config: &'a UntisConfig,
        host: &'a str,
        session: &'a Session,
    ) -> Self {
        Self {
            http,
            config,
            host,
            session,
            bearer: None,
            cache: HashMap::new(),
        }
    }

    /// Backfills missing teacher names in place, up to the configured cap.
    pub async fn enrich(mut self, lessons: &mut [Lesson]) -> EnrichmentStats {
        let targets: Vec<usize> = lessons
            .iter()
            .enumerate()
            .filter(|(_, lesson)| lesson.missing_teacher())
            .map(|(index, _)| index)
            .collect();

        let mut stats = EnrichmentStats {
            total_missing: targets.len(),
            ..EnrichmentStats::default()
        };
        if targets.is_empty() {
            return stats;
        }

        self.bearer = acquire_bearer(self.http, self.host, self.config, self.session).await;
        if self.bearer.is_none() {
            debug!("no bearer available; using cookie queries only");
        }

        for index in targets {
            if stats.attempted >= self.config.max_detail_requests {
                debug!(
                    cap = self.config.max_detail_requests,
                    "detail request cap reached"
                );
                break;
            }
            stats.attempted += 1;

            let mut outcome = self.fetch_detail(&lessons[index]).await;
            if matches!(outcome, DetailOutcome::Unauthorized) {
                debug!("bearer rejected; re-acquiring once");
                self.bearer = acquire_bearer(self.http, self.host, self.config, self.session).await;
                outcome = self.fetch_detail(&lessons[index]).await;
            }

            if let DetailOutcome::Found(entry) = outcome {
                if let Some(name) = entry.teachers.first().and_then(DetailTeacher::best_name) {
                    lessons[index].teacher_name = name.to_string();
                    stats.enriched += 1;
                }
            }
        }

        debug!(
            attempted = stats.attempted,
            enriched = stats.enriched,
            total_missing = stats.total_missing,
            "teacher enrichment finished"
        );
        stats
    }

    /// Walks the query cascade for one lesson.
    ///
    /// Successful and exhausted walks are cached by slot; an `Unauthorized`
    /// outcome is not, so the post-refresh retry reaches the network again.
    async fn fetch_detail(&mut self, lesson: &Lesson) -> DetailOutcome {
        let key = DetailKey::for_lesson(lesson);
        if let Some(cached) = self.cache.get(&key) {
            return match cached {
                Some(entry) => DetailOutcome::Found(entry.clone()),
                None => DetailOutcome::Miss,
            };
        }

        for &(auth, scope) in QUERY_CASCADE {
            if auth == AuthMode::Bearer && self.bearer.is_none() {
                continue;
            }

            let url = detail_url(self.host, self.session, lesson, scope);
            if self.config.verbose_enrichment {
                debug!(?auth, ?scope, %url, "detail attempt");
            }

            let response = match self.http.get(url, self.detail_headers(auth)).await {
                Ok(response) => response,
                Err(e) => {
                    trace!(error = %e, "detail attempt failed; trying next");
                    continue;
                }
            };

            if response.is_ok() {
                let Ok(parsed) = serde_json::from_str::<DetailResponse>(&response.body) else {
                    continue;
                };
                if let Some(entry) = parsed.calendar_entries.into_iter().next() {
                    self.cache.insert(key, Some(entry.clone()));
                    return DetailOutcome::Found(entry);
                }
                continue;
            }
            if response.status == 401 && auth == AuthMode::Bearer {
                return DetailOutcome::Unauthorized;
            }
        }

        self.cache.insert(key, None);
        DetailOutcome::Miss
    }

    fn detail_headers(&self, auth: AuthMode) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        match auth {
            AuthMode::Bearer => {
                if let Some(grant) = &self.bearer {
                    headers.push(("Authorization".to_string(), format!("Bearer {}", grant.token)));
                }
            }
            AuthMode::Cookie => {
                headers.push((
                    "Cookie".to_string(),
                    self.session.cookie_with_school(&self.config.school),
                ));
            }
        }
        if let Some(grant) = &self.bearer {
            if let Some(tenant) = &grant.tenant_id {
                headers.push(("Tenant-Id".to_string(), tenant.clone()));
            }
            if let Some(year) = &grant.school_year_id {
                headers.push((
                    "X-Webuntis-Api-School-Year-Id".to_string(),
                    year.clone(),
                ));
            }
        }
        headers
    }
}

fn detail_url(host: &str, session: &Session, lesson: &Lesson, scope: QueryScope) -> String {
    let day = lesson.date.format("%Y-%m-%d");
    let start = format!("{day}T{}:00", lesson.start_time.format("%H:%M"));
    let end = format!("{day}T{}:00", lesson.end_time.format("%H:%M"));
    let (element_id, element_type) = match scope {
        QueryScope::Student => (session.person_id, 5),
        QueryScope::Lesson => (lesson.lesson_id.unwrap_or(lesson.id), 3),
    };
    format!(
        "https://{host}/WebUntis/api/rest/view/v2/calendar-entry/detail?elementId={element_id}&elementType={element_type}&endDateTime={}&homeworkOption=DUE&startDateTime={}",
        urlencoding::encode(&end),
        urlencoding::encode(&start),
    )
}
