//! Weekly timetable fetch.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::trace;

use crate::error::{UntisError, UntisResult};
use crate::http::UntisHttp;
use crate::raw::RawTimetable;
use crate::session::Session;

// The payload sits three levels deep in the public API envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    result: EnvelopeResult,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    data: RawTimetable,
}

/// Fetches the raw weekly timetable for the session's person.
///
/// `date` selects the week; the upstream returns the whole week containing
/// it.
///
/// # Errors
///
/// `AuthenticationFailed` on 401, `ServerError` on 5xx, `InvalidResponse`
/// for any other unexpected status or an undecodable envelope.
pub async fn fetch_week(
    http: &dyn UntisHttp,
    host: &str,
    session: &Session,
    date: NaiveDate,
) -> UntisResult<RawTimetable> {
    let url = format!(
        "https://{host}/WebUntis/api/public/timetable/weekly/data?elementType={}&elementId={}&date={}&formatId=1",
        session.person_type,
        session.person_id,
        date.format("%Y-%m-%d"),
    );
    trace!(%url, "fetching weekly timetable");

    let headers = vec![("Cookie".to_string(), session.cookie())];
    let response = http.get(url, headers).await?;

    match response.status {
        200 => {}
        401 => {
            return Err(UntisError::authentication(
                "weekly fetch rejected: session expired or invalid",
            ));
        }
        status if (500..600).contains(&status) => {
            return Err(UntisError::server(format!(
                "weekly fetch returned status {status}"
            )));
        }
        status => {
            return Err(UntisError::invalid_response(format!(
                "weekly fetch returned status {status}"
            )));
        }
    }

    let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| {
        UntisError::invalid_response("malformed weekly timetable payload").with_source(e)
    })?;
    Ok(envelope.data.result.data)
}
