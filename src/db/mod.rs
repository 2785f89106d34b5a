//! User directory access.
//!
//! The directory is the managed document store holding the `users`
//! collection. Handlers only see the [`UserDirectory`] trait; the
//! production implementation talks to the Firestore REST API.

pub mod firestore;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::models::UserRecord;

pub use firestore::FirestoreClient;

/// Collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// Read access to the `users` collection.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the document `users/{id}`. `Ok(None)` when it does not exist.
    async fn get_by_id(&self, id: &str) -> AppResult<Option<UserRecord>>;

    /// First document whose `phone` field equals `phone`.
    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<UserRecord>>;
}

/// Look a user up by normalized phone.
///
/// Documents are usually keyed by phone, so the id lookup runs first and the
/// field query only when no document exists at that id.
pub async fn find_user_by_phone(
    directory: &dyn UserDirectory,
    phone: &str,
) -> AppResult<Option<UserRecord>> {
    if let Some(user) = directory.get_by_id(phone).await? {
        debug!("User found by document id");
        return Ok(Some(user));
    }

    let user = directory.find_by_phone(phone).await?;
    if user.is_some() {
        debug!("User found by phone field");
    }
    Ok(user)
}
