use crate::records::TargetRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the target `user` table together with its auth `account` row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: String,
    pub username: String,
    pub display_username: String,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Written in the best-effort dependent step.
    pub account: NewAccount,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub id: String,
    pub account_id: String,
    pub provider_id: String,
    pub user_id: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the target `resume` table together with its statistics row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewResume {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub is_locked: bool,
    pub data: serde_json::Value,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Written in the best-effort dependent step.
    pub statistics: NewResumeStatistics,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewResumeStatistics {
    pub id: String,
    pub views: i32,
    pub downloads: i32,
    pub resume_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TargetRecord for NewUser {
    fn id(&self) -> &str {
        &self.id
    }
}

impl TargetRecord for NewResume {
    fn id(&self) -> &str {
        &self.id
    }
}
