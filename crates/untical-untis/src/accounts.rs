//! Account registry.
//!
//! Deployments run with either a single env-configured account or a JSON
//! list of accounts. Both shapes resolve into the same uniform
//! [`AccountRegistry`] once at startup; nothing downstream ever branches on
//! the mode again.

use tracing::warn;

/// Credentials for one WebUntis account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Lookup id, lowercased.
    pub id: String,
    /// Server name.
    pub domain: String,
    /// School identifier.
    pub school: String,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// The uniform list of configured accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Id assigned to a single env-configured account.
    pub const DEFAULT_ID: &'static str = "default";

    /// Builds a one-account registry from individual credentials.
    pub fn single(
        domain: impl Into<String>,
        school: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            accounts: vec![Account {
                id: Self::DEFAULT_ID.to_string(),
                domain: domain.into(),
                school: school.into(),
                username: username.into(),
                password: password.into(),
            }],
        }
    }

    /// Parses the multi-account JSON registry.
    ///
    /// Entries missing any field are dropped with a warning; malformed JSON
    /// yields an empty registry rather than an error, since account lookup
    /// failures are reported per request.
    pub fn from_json(raw: &str) -> Self {
        let parsed: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "account registry is not valid JSON");
                return Self::default();
            }
        };
        let Some(entries) = parsed.as_array() else {
            warn!("account registry is not a JSON array");
            return Self::default();
        };

        let accounts = entries
            .iter()
            .filter_map(|entry| {
                let account = Account {
                    // Ids may arrive as numbers; normalize to a string key.
                    id: scalar_field(entry, "id")?.to_lowercase(),
                    domain: scalar_field(entry, "domain")?.trim().to_string(),
                    school: scalar_field(entry, "school")?.trim().to_string(),
                    username: scalar_field(entry, "username")?.trim().to_string(),
                    password: scalar_field(entry, "password")?,
                };
                Some(account)
            })
            .collect();

        Self { accounts }
    }

    /// Looks up an account by id, case-insensitively.
    pub fn get(&self, id: &str) -> Option<&Account> {
        let id = id.to_lowercase();
        self.accounts.iter().find(|account| account.id == id)
    }

    /// All configured accounts.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Returns true when no account is configured.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn scalar_field(entry: &serde_json::Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
