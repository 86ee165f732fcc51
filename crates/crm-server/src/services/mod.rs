//! Adapters for the dictionary's external collaborators.

pub mod photo_urls;
pub mod update_channel;

pub use photo_urls::BucketPhotoUrls;
pub use update_channel::RedisUpdateChannel;
