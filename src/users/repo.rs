use indexmap::{map::Entry, IndexMap};
use parking_lot::Mutex;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::users::repo_types::{PublicUser, StoredUser};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("user {0} already exists")]
    DuplicateKey(String),
}

#[derive(Debug)]
struct Inner {
    users: IndexMap<String, StoredUser>,
    next_internal_id: u64,
}

/// In-memory user store keyed by normalized identifier.
///
/// Iteration follows insertion order. All reads hand out [`PublicUser`],
/// so the stored password never leaves this type.
#[derive(Debug)]
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: IndexMap::new(),
                next_internal_id: 1,
            }),
        }
    }

    /// Insert a new user unless `id` is already taken.
    ///
    /// The lookup and the insert happen under one lock, and the internal id
    /// counter only advances on success.
    pub fn create(&self, id: &str, password: &str) -> Result<PublicUser, StoreError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let internal_id = inner.next_internal_id;
        match inner.users.entry(id.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(id.to_owned())),
            Entry::Vacant(slot) => {
                let user = slot.insert(StoredUser {
                    internal_id,
                    id: id.to_owned(),
                    password: password.to_owned(),
                    created_at: OffsetDateTime::now_utc(),
                });
                let public = PublicUser::from(&*user);
                inner.next_internal_id += 1;
                debug!(internal_id, "user inserted");
                Ok(public)
            }
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<PublicUser> {
        self.inner.lock().users.get(id).map(PublicUser::from)
    }

    pub fn get_all(&self) -> Vec<PublicUser> {
        self.inner
            .lock()
            .users
            .values()
            .map(PublicUser::from)
            .collect()
    }

    /// Returns whether a record was removed.
    pub fn delete_by_id(&self, id: &str) -> bool {
        // shift_remove keeps the survivors in insertion order
        self.inner.lock().users.shift_remove(id).is_some()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.inner.lock().users.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.inner.lock().users.len()
    }

    #[cfg(test)]
    fn stored_password(&self, id: &str) -> Option<String> {
        self.inner.lock().users.get(id).map(|u| u.password.clone())
    }
}
