//! # crm-dictionary
//!
//! Read-through dictionary cache for the CRM back-end.
//!
//! The [`Dictionary`] mirrors eleven categories of reference data (users,
//! federations, companies, projects, tags, field definitions, priorities and
//! memberships) into in-memory indexes. Each category is pulled
//! incrementally by `updated_at`, soft deletions included, so every refresh
//! only transfers what changed since the last one.
//!
//! The [`Coordinator`] keeps the indexes fresh with a timed full refresh, a
//! fast hook loop that reacts to invalidations, and a pub/sub listener that
//! raises the invalidation flag whenever a write path announces a change.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crm_dictionary::{Coordinator, Dictionary, DictionaryConfig, InMemoryUpdateChannel};
//!
//! let dictionary = Dictionary::new(reader, photos, DictionaryConfig::from_env());
//! let handle = Coordinator::new(dictionary.clone(), Arc::new(InMemoryUpdateChannel::new())).start();
//!
//! if let Some(user) = dictionary.find_user("alice@example.com").await {
//!     println!("{} {}", user.name, user.lname);
//! }
//!
//! handle.shutdown().await;
//! ```

pub mod config;
pub mod coordinator;
pub mod dictionary;
mod indexes;
pub mod mock;
mod query;
pub mod search;
pub mod stats;
pub mod supervisor;
pub mod sync;
pub mod update_channel;

pub use config::DictionaryConfig;
pub use coordinator::{Coordinator, CoordinatorHandle, CoordinatorPolicies};
pub use dictionary::Dictionary;
pub use indexes::MergeOutcome;
pub use stats::DictionaryStats;
pub use supervisor::{install_panic_hook, supervise, RestartPolicy};
pub use sync::{CategoryOutcome, SyncReport};
pub use update_channel::{publish_update, InMemoryUpdateChannel};
