use chrono::{DateTime, TimeZone, Utc};
use model::records::legacy::{LegacyResume, LegacySecrets, LegacyStatistics, LegacyUser};
use serde_json::{Value, json};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn legacy_user(id: &str, created: i64, email: &str) -> LegacyUser {
    LegacyUser {
        id: id.to_string(),
        name: Some(format!("User {id}")),
        username: id.to_string(),
        email: email.to_string(),
        picture: None,
        locale: Some("en-US".into()),
        email_verified: true,
        two_factor_enabled: false,
        provider: Some("email".into()),
        created_at: at(created),
        updated_at: Some(at(created + 1)),
        secrets: Some(LegacySecrets {
            password: Some("$2a$10$hash".into()),
            ..Default::default()
        }),
    }
}

/// Users `u1..=uN`, `u1` newest.
pub fn legacy_users(count: usize) -> Vec<LegacyUser> {
    (1..=count)
        .map(|n| {
            legacy_user(
                &format!("u{n}"),
                (count - n) as i64 * 10,
                &format!("u{n}@example.com"),
            )
        })
        .collect()
}

pub fn document() -> Value {
    json!({
        "basics": { "name": "Ada Lovelace", "headline": "Engineer" },
        "sections": {},
        "metadata": { "template": "rhyhorn" }
    })
}

pub fn legacy_resume(id: &str, created: i64, slug: &str, owner: &str) -> LegacyResume {
    LegacyResume {
        id: id.to_string(),
        title: format!("Resume {id}"),
        slug: slug.to_string(),
        data: Some(document()),
        visibility: Some("private".into()),
        locked: false,
        user_id: owner.to_string(),
        created_at: at(created),
        updated_at: None,
        statistics: Some(LegacyStatistics {
            views: 3,
            downloads: 1,
        }),
    }
}
