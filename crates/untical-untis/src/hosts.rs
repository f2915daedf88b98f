//! WebUntis server name resolution.
//!
//! Users configure a short server name ("ajax"), a full host
//! ("ajax.webuntis.com"), or a complete URL. Resolution canonicalizes the
//! input against the allow-list of known WebUntis servers and probes the
//! resulting host once for reachability. Retrying a failed probe is the
//! caller's decision.

use tracing::debug;
use url::Url;

use crate::error::{UntisError, UntisResult};
use crate::http::UntisHttp;

/// Known WebUntis server names, title-cased.
pub const KNOWN_SERVERS: &[&str] = &[
    "Achilles",
    "Ajax",
    "Antiope",
    "Aoide",
    "Arche",
    "Asopo",
    "Borys",
    "Chios",
    "Cissa",
    "Delos",
    "Erato",
    "Euterpe",
    "Hektor",
    "Hepta",
    "Herakles",
    "Hypate",
    "Ikarus",
    "Kadmos",
    "Kalliope",
    "Kephiso",
    "Klio",
    "Korfu",
    "Kos",
    "Kreta",
    "Melete",
    "Melpomene",
    "Mese",
    "Minos",
    "Naxos",
    "Neilo",
    "Nessa",
    "Nete",
    "Niobe",
    "Peleus",
    "Perseus",
    "Playground",
    "Poly",
    "Rhodos",
    "Samos",
    "Substitution Planning",
    "Tantalos",
    "Terpsichore",
    "Thalia",
    "Tipo",
    "Tritone",
    "Urania",
];

const HOST_SUFFIX: &str = ".webuntis.com";

/// Canonicalizes a user-supplied server name into a fully-qualified host.
///
/// Accepts a bare name, a name with the `.webuntis.com` suffix, or a full
/// URL; matching against the allow-list is case-insensitive.
///
/// # Errors
///
/// `ConfigurationError` when the input is empty or not a parseable URL,
/// `UnknownServer` when the name is not in the allow-list.
pub fn canonical_host(input: &str) -> UntisResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UntisError::configuration("server name is missing"));
    }

    let mut host = trimmed.to_string();
    let lowered = host.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        let parsed = Url::parse(&host)
            .map_err(|e| UntisError::configuration("invalid server name").with_source(e))?;
        host = parsed
            .host_str()
            .ok_or_else(|| UntisError::configuration("invalid server name"))?
            .to_string();
    }

    if host.to_ascii_lowercase().ends_with(HOST_SUFFIX) {
        host.truncate(host.len() - HOST_SUFFIX.len());
    }

    let formatted = title_case_name(&host);
    if !KNOWN_SERVERS.contains(&formatted.as_str()) {
        return Err(UntisError::unknown_server(format!(
            "server does not exist: {host}"
        )));
    }

    Ok(format!("{formatted}{HOST_SUFFIX}"))
}

/// Resolves and probes a server. One HEAD request, no retry at this layer.
///
/// # Errors
///
/// Everything [`canonical_host`] returns, plus `UnreachableServer` when the
/// probe fails.
pub async fn resolve_host(http: &dyn UntisHttp, input: &str) -> UntisResult<String> {
    let host = canonical_host(input)?;
    debug!(%host, "probing server");
    http.head(format!("https://{host}/")).await.map_err(|e| {
        UntisError::unreachable_server(format!("could not connect to server: {host}")).with_source(e)
    })?;
    Ok(host)
}

fn title_case_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UntisErrorCode;
    use crate::http::testing::FakeHttp;

    #[test]
    fn accepts_known_names_case_insensitively() {
        assert_eq!(canonical_host("ajax").unwrap(), "Ajax.webuntis.com");
        assert_eq!(canonical_host("AJAX").unwrap(), "Ajax.webuntis.com");
        assert_eq!(canonical_host("Ajax").unwrap(), "Ajax.webuntis.com");
    }

    #[test]
    fn accepts_full_urls_and_suffixed_hosts() {
        assert_eq!(
            canonical_host("https://ajax.webuntis.com").unwrap(),
            "Ajax.webuntis.com"
        );
        assert_eq!(
            canonical_host("https://ajax.webuntis.com/WebUntis/").unwrap(),
            "Ajax.webuntis.com"
        );
        assert_eq!(
            canonical_host("ajax.webuntis.com").unwrap(),
            "Ajax.webuntis.com"
        );
    }

    #[test]
    fn rejects_unknown_servers() {
        let err = canonical_host("this-server-does-not-exist").unwrap_err();
        assert_eq!(err.code(), UntisErrorCode::UnknownServer);
        assert!(err.message().contains("this-server-does-not-exist"));
    }

    #[test]
    fn rejects_empty_input() {
        let err = canonical_host("   ").unwrap_err();
        assert_eq!(err.code(), UntisErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn probes_resolved_host() {
        let http = FakeHttp::new().route("HEAD", "Ajax.webuntis.com", &[(200, "")]);
        let host = resolve_host(&http, "ajax").await.unwrap();
        assert_eq!(host, "Ajax.webuntis.com");
        assert_eq!(http.hits("Ajax.webuntis.com"), 1);
    }

    #[tokio::test]
    async fn unknown_server_is_not_probed() {
        let http = FakeHttp::new();
        let err = resolve_host(&http, "nowhere").await.unwrap_err();
        assert_eq!(err.code(), UntisErrorCode::UnknownServer);
        assert!(http.requests().is_empty());
    }
}
