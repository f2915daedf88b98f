//! WebUntis client: host resolution, session auth, weekly fetch, bearer
//! cascade, teacher enrichment, and feed orchestration.

pub mod accounts;
pub mod config;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod hosts;
pub mod http;
pub mod normalize;
pub mod raw;
pub mod rest_auth;
pub mod session;

pub use accounts::{Account, AccountRegistry};
pub use config::UntisConfig;
pub use enrich::{Enricher, EnrichmentStats};
pub use error::{UntisError, UntisErrorCode, UntisResult};
pub use feed::{MAX_FEED_WEEKS, UntisClient};
pub use hosts::{KNOWN_SERVERS, canonical_host, resolve_host};
pub use http::{BoxFuture, Headers, HttpResponse, UntisHttp};
pub use raw::{ElementIndex, ElementKind, RawElement, RawPeriod, RawTimetable};
pub use rest_auth::BearerGrant;
pub use session::{Session, login};
