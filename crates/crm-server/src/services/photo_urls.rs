//! Profile photo URLs in the public bucket.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `CDN_PUBLIC_BUCKET_NAME`: bucket holding the photos (default: empty)
//! - `CDN_PUBLIC_ENDPOINT`: object storage host (default: storage.yandexcloud.net)

use uuid::Uuid;

use crm_core::defaults::{PHOTO_LARGE_WIDTH, PHOTO_MEDIUM_WIDTH, PHOTO_SMALL_WIDTH};
use crm_core::PhotoUrlProvider;

pub const DEFAULT_CDN_ENDPOINT: &str = "storage.yandexcloud.net";

/// Composes `https://{bucket}.{endpoint}/photos-{uuid}.w{width}.jpg`.
///
/// Nothing is signed or checked against the bucket; a user without a photo
/// still gets URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPhotoUrls {
    bucket: String,
    endpoint: String,
}

impl BucketPhotoUrls {
    pub fn new(bucket: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_env() -> Self {
        let bucket = std::env::var("CDN_PUBLIC_BUCKET_NAME").unwrap_or_default();
        let endpoint = std::env::var("CDN_PUBLIC_ENDPOINT")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CDN_ENDPOINT.to_string());
        Self::new(bucket, endpoint)
    }

    fn url(&self, user_uuid: Uuid, width: u32) -> String {
        format!(
            "https://{}.{}/photos-{}.w{}.jpg",
            self.bucket, self.endpoint, user_uuid, width
        )
    }
}

impl PhotoUrlProvider for BucketPhotoUrls {
    fn small(&self, user_uuid: Uuid) -> String {
        self.url(user_uuid, PHOTO_SMALL_WIDTH)
    }

    fn medium(&self, user_uuid: Uuid) -> String {
        self.url(user_uuid, PHOTO_MEDIUM_WIDTH)
    }

    fn large(&self, user_uuid: Uuid) -> String {
        self.url(user_uuid, PHOTO_LARGE_WIDTH)
    }
}
