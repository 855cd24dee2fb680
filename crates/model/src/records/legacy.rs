use crate::records::SourceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user row from the legacy store, joined with its secrets row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LegacyUser {
    pub id: String,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub email_verified: bool,
    pub two_factor_enabled: bool,
    /// Auth provider enum as stored by the legacy app (`email`, `github`, ...).
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub secrets: Option<LegacySecrets>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LegacySecrets {
    pub password: Option<String>,
    pub last_signed_in: Option<DateTime<Utc>>,
    pub two_factor_secret: Option<String>,
    pub two_factor_backup_codes: Vec<String>,
}

/// A resume row from the legacy store, joined with its statistics row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LegacyResume {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Raw legacy document; may be null or structurally invalid.
    pub data: Option<serde_json::Value>,
    pub visibility: Option<String>,
    pub locked: bool,
    /// Legacy owner id; resolved through the user identity map.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub statistics: Option<LegacyStatistics>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegacyStatistics {
    pub views: i32,
    pub downloads: i32,
}

impl SourceRecord for LegacyUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SourceRecord for LegacyResume {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
