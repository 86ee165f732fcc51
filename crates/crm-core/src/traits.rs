//! Core traits for the interfaces the dictionary consumes.
//!
//! These traits define the seams to storage, pub/sub and photo storage so
//! concrete backends stay pluggable and the dictionary stays testable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// STORAGE READER
// =============================================================================

/// Category-scoped incremental reads against the authoritative store.
///
/// Every operation returns all rows whose `updated_at >= since`, including
/// soft-deleted rows. Implementations never mutate.
#[async_trait]
pub trait DictionaryReader: Send + Sync {
    /// Users joined with their federation memberships.
    async fn fetch_users(&self, since: DateTime<Utc>) -> Result<Vec<UserRow>>;

    async fn fetch_federations(&self, since: DateTime<Utc>) -> Result<Vec<FederationRow>>;

    async fn fetch_companies(&self, since: DateTime<Utc>) -> Result<Vec<CompanyRow>>;

    async fn fetch_projects(&self, since: DateTime<Utc>) -> Result<Vec<ProjectRow>>;

    async fn fetch_tags(&self, since: DateTime<Utc>) -> Result<Vec<TagRow>>;

    /// Company fields with the UUIDs of the projects using them.
    async fn fetch_company_fields(&self, since: DateTime<Utc>) -> Result<Vec<CompanyFieldRow>>;

    /// Project fields joined with the company field they instantiate.
    async fn fetch_project_fields(&self, since: DateTime<Utc>) -> Result<Vec<ProjectFieldRow>>;

    async fn fetch_catalog_fields(&self, since: DateTime<Utc>) -> Result<Vec<CatalogFieldRow>>;

    async fn fetch_user_federations(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserFederationRow>>;

    async fn fetch_user_companies(&self, since: DateTime<Utc>) -> Result<Vec<UserCompanyRow>>;

    async fn fetch_company_priorities(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CompanyPriorityRow>>;
}

// =============================================================================
// PHOTO URLS
// =============================================================================

/// Maps a user to pre-signed profile photo URLs.
///
/// URLs may point at objects that do not exist; callers do not validate them.
pub trait PhotoUrlProvider: Send + Sync {
    fn small(&self, user_uuid: Uuid) -> String;

    fn medium(&self, user_uuid: Uuid) -> String;

    fn large(&self, user_uuid: Uuid) -> String;

    /// All three renditions.
    fn photo(&self, user_uuid: Uuid) -> Photo {
        Photo {
            small: self.small(user_uuid),
            medium: self.medium(user_uuid),
            large: self.large(user_uuid),
        }
    }
}

// =============================================================================
// PUB/SUB
// =============================================================================

/// Stream of message payloads received on a subscribed channel.
///
/// The stream ending means the subscription is gone.
pub type UpdateStream = BoxStream<'static, String>;

/// Subscribe side of the invalidation channel.
#[async_trait]
pub trait UpdateSubscriber: Send + Sync {
    async fn subscribe(&self, channel: &str) -> Result<UpdateStream>;
}

/// Publish side of the invalidation channel.
///
/// Delivery is at-most-once with no ordering and no replay.
#[async_trait]
pub trait UpdatePublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPhotos;

    impl PhotoUrlProvider for FixedPhotos {
        fn small(&self, user_uuid: Uuid) -> String {
            format!("s/{user_uuid}")
        }

        fn medium(&self, user_uuid: Uuid) -> String {
            format!("m/{user_uuid}")
        }

        fn large(&self, user_uuid: Uuid) -> String {
            format!("l/{user_uuid}")
        }
    }

    #[test]
    fn test_photo_combines_renditions() {
        let id = Uuid::nil();
        let photo = FixedPhotos.photo(id);
        assert_eq!(photo.small, format!("s/{id}"));
        assert_eq!(photo.medium, format!("m/{id}"));
        assert_eq!(photo.large, format!("l/{id}"));
    }
}
