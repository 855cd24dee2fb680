use crate::transform::Transformed;
use model::records::{
    legacy::LegacyUser,
    target::{NewAccount, NewUser},
};
use uuid::Uuid;

pub const CREDENTIAL_PROVIDER: &str = "credential";

/// Maps the legacy auth provider enum onto the new provider vocabulary.
/// Unknown or missing providers fall back to password credentials.
pub fn provider_id(provider: Option<&str>) -> &'static str {
    match provider.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("github") => "github",
        Some("google") => "google",
        Some("openid") => "custom",
        _ => CREDENTIAL_PROVIDER,
    }
}

pub fn transform_user(legacy: &LegacyUser, new_id: String) -> Transformed<NewUser> {
    let secrets = legacy.secrets.clone().unwrap_or_default();
    let updated_at = legacy.updated_at.unwrap_or(legacy.created_at);
    let provider = provider_id(legacy.provider.as_deref());

    // Credential accounts are keyed by the user itself; OAuth accounts keep
    // the legacy id as the external account reference.
    let account_id = if provider == CREDENTIAL_PROVIDER {
        new_id.clone()
    } else {
        legacy.id.clone()
    };

    let name = match legacy.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => legacy.username.clone(),
    };

    let account = NewAccount {
        id: Uuid::new_v4().to_string(),
        account_id,
        provider_id: provider.to_string(),
        user_id: new_id.clone(),
        password: secrets.password.unwrap_or_default(),
        created_at: legacy.created_at,
        updated_at,
    };

    Transformed::Ok(NewUser {
        id: new_id,
        name,
        email: legacy.email.trim().to_lowercase(),
        email_verified: legacy.email_verified,
        image: legacy.picture.clone().unwrap_or_default(),
        username: legacy.username.trim().to_lowercase(),
        display_username: legacy.username.trim().to_string(),
        two_factor_enabled: legacy.two_factor_enabled && secrets.two_factor_secret.is_some(),
        created_at: legacy.created_at,
        updated_at,
        account,
    })
}
