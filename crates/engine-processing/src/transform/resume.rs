use crate::transform::{
    Transformed,
    document::{DocumentConverter, default_document},
};
use model::records::{
    legacy::LegacyResume,
    target::{NewResume, NewResumeStatistics},
};
use uuid::Uuid;

/// Builds the target resume owned by `owner_id` (the owner's *new* id).
///
/// A document that cannot be converted is replaced by the default document
/// and the result is marked degraded; the row is migrated either way.
pub fn transform_resume(
    legacy: &LegacyResume,
    new_id: String,
    owner_id: &str,
    converter: &dyn DocumentConverter,
) -> Transformed<NewResume> {
    let updated_at = legacy.updated_at.unwrap_or(legacy.created_at);
    let statistics = legacy.statistics.unwrap_or_default();

    let (data, degraded) = match converter.convert(legacy.data.as_ref()) {
        Ok(data) => (data, None),
        Err(err) => (default_document(), Some(err.to_string())),
    };

    let name = if legacy.title.trim().is_empty() {
        legacy.slug.clone()
    } else {
        legacy.title.trim().to_string()
    };

    let record = NewResume {
        id: new_id.clone(),
        name,
        slug: legacy.slug.clone(),
        tags: Vec::new(),
        is_public: is_public(legacy.visibility.as_deref()),
        is_locked: legacy.locked,
        data,
        user_id: owner_id.to_string(),
        created_at: legacy.created_at,
        updated_at,
        statistics: NewResumeStatistics {
            id: Uuid::new_v4().to_string(),
            views: statistics.views.max(0),
            downloads: statistics.downloads.max(0),
            resume_id: new_id,
            created_at: legacy.created_at,
            updated_at,
        },
    };

    match degraded {
        None => Transformed::Ok(record),
        Some(reason) => Transformed::Degraded { record, reason },
    }
}

/// Only an explicit `public` visibility publishes a resume.
pub fn is_public(visibility: Option<&str>) -> bool {
    matches!(visibility, Some(v) if v.eq_ignore_ascii_case("public"))
}
