use crate::{
    family::RecordFamily,
    transform::{Transformed, user::transform_user},
};
use model::records::{
    key::NaturalKey,
    legacy::LegacyUser,
    target::NewUser,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct UserFamily;

impl RecordFamily for UserFamily {
    type Source = LegacyUser;
    type Target = NewUser;

    fn name(&self) -> &'static str {
        "users"
    }

    fn natural_keys(&self, record: &LegacyUser, _owner: Option<&str>) -> Vec<NaturalKey> {
        let username = record.username.trim();
        vec![
            NaturalKey::Email(record.email.trim().to_lowercase()),
            NaturalKey::Username(username.to_lowercase()),
            NaturalKey::DisplayUsername(username.to_string()),
        ]
    }

    /// Only email identifies a person. Usernames are handles and may be
    /// shared across unrelated accounts.
    fn adopts_on(&self, key: &NaturalKey) -> bool {
        matches!(key, NaturalKey::Email(_))
    }

    fn transform(&self, record: &LegacyUser, new_id: String, _owner: Option<&str>) -> Transformed<NewUser> {
        transform_user(record, new_id)
    }
}
