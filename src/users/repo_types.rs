use serde::Serialize;
use time::OffsetDateTime;

/// User record as kept in the store.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub internal_id: u64,           // assigned on insert, never reused
    pub id: String,                 // normalized email or phone
    pub password: String,           // stored as given, never returned
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub internal_id: u64,
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&StoredUser> for PublicUser {
    fn from(u: &StoredUser) -> Self {
        Self {
            internal_id: u.internal_id,
            id: u.id.clone(),
            created_at: u.created_at,
        }
    }
}
