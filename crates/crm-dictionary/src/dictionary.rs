//! The dictionary value: shared state, collaborators and control operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::info;

use crm_core::defaults::COLD_START_LOOKBACK_YEARS;
use crm_core::{Category, DictionaryReader, PhotoUrlProvider};

use crate::config::DictionaryConfig;
use crate::indexes::Indexes;
use crate::stats::DictionaryStats;

/// Everything guarded by the dictionary's single lock.
#[derive(Debug)]
pub(crate) struct State {
    pub indexes: Indexes,
    /// Per-category high-water mark passed as `since` to the next read.
    pub high_water: HashMap<Category, DateTime<Utc>>,
    pub should_update: bool,
    /// Last storage error or panic per category, cleared on success.
    pub last_errors: HashMap<Category, String>,
}

impl State {
    fn new(cold_start: DateTime<Utc>) -> Self {
        Self {
            indexes: Indexes::default(),
            high_water: Category::ALL.iter().map(|c| (*c, cold_start)).collect(),
            should_update: false,
            last_errors: HashMap::new(),
        }
    }
}

struct Inner {
    state: RwLock<State>,
    reader: Arc<dyn DictionaryReader>,
    photos: Arc<dyn PhotoUrlProvider>,
    config: DictionaryConfig,
    /// Serializes full refreshes.
    refresh: Mutex<()>,
}

/// Process-local, incrementally synchronized mirror of the CRM's reference
/// data.
///
/// Cloning is cheap; clones share the same indexes.
#[derive(Clone)]
pub struct Dictionary {
    inner: Arc<Inner>,
}

/// High-water mark used before a category has ever been synced.
pub fn cold_start_mark(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(COLD_START_LOOKBACK_YEARS * 12))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Dictionary {
    /// Create an empty dictionary. Nothing is read until the first sync.
    pub fn new(
        reader: Arc<dyn DictionaryReader>,
        photos: Arc<dyn PhotoUrlProvider>,
        config: DictionaryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State::new(cold_start_mark(Utc::now()))),
                reader,
                photos,
                config,
                refresh: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.inner.config
    }

    pub(crate) fn state(&self) -> &RwLock<State> {
        &self.inner.state
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().await
    }

    pub(crate) fn reader(&self) -> &dyn DictionaryReader {
        self.inner.reader.as_ref()
    }

    pub(crate) fn photos(&self) -> Arc<dyn PhotoUrlProvider> {
        Arc::clone(&self.inner.photos)
    }

    pub(crate) fn refresh_lock(&self) -> &Mutex<()> {
        &self.inner.refresh
    }

    /// Set or clear the should-update flag.
    pub async fn mark_to_update(&self, value: bool) {
        self.inner.state.write().await.should_update = value;
    }

    pub async fn should_update(&self) -> bool {
        self.inner.state.read().await.should_update
    }

    /// Clear the should-update flag, returning whether it was set.
    pub(crate) async fn take_update_flag(&self) -> bool {
        let mut state = self.inner.state.write().await;
        std::mem::take(&mut state.should_update)
    }

    /// Current high-water mark of `category`.
    pub async fn high_water(&self, category: Category) -> DateTime<Utc> {
        let state = self.inner.state.read().await;
        state
            .high_water
            .get(&category)
            .copied()
            .unwrap_or_else(|| cold_start_mark(Utc::now()))
    }

    /// Log the current index sizes and high-water marks.
    pub async fn info(&self) {
        let (stats, marks) = {
            let state = self.inner.state.read().await;
            let marks = Category::ALL
                .iter()
                .filter_map(|c| state.high_water.get(c).map(|at| format!("{c}={}", at.to_rfc3339())))
                .collect::<Vec<_>>()
                .join(",");
            (DictionaryStats::from_state(&state), marks)
        };

        info!(
            subsystem = "dictionary",
            component = "dictionary",
            op = "info",
            high_water = %marks,
            "Last updated_at per category"
        );
        info!(
            subsystem = "dictionary",
            component = "dictionary",
            op = "info",
            users = stats.users,
            users_by_uuid = stats.users_by_uuid,
            federations = stats.federations,
            companies = stats.companies,
            projects = stats.projects,
            tags = stats.tags,
            company_field_lists = stats.company_field_lists,
            company_fields = stats.company_fields,
            project_field_lists = stats.project_field_lists,
            project_fields = stats.project_fields,
            catalog_fields = stats.catalog_fields,
            user_federations = stats.user_federations,
            user_companies = stats.user_companies,
            company_priorities = stats.company_priorities,
            "Dictionary items"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDictionaryReader, StaticPhotoUrls};

    fn dictionary() -> Dictionary {
        Dictionary::new(
            Arc::new(MockDictionaryReader::new()),
            Arc::new(StaticPhotoUrls),
            DictionaryConfig::default(),
        )
    }

    #[test]
    fn test_cold_start_is_ten_years_back() {
        let now = Utc::now();
        let mark = cold_start_mark(now);
        let years = (now - mark).num_days() / 365;
        assert_eq!(years, 10);
    }

    #[tokio::test]
    async fn test_every_category_starts_at_cold_start() {
        let dict = dictionary();
        let now = Utc::now();
        for category in Category::ALL {
            let mark = dict.high_water(category).await;
            assert!(mark < now - chrono::Duration::days(365 * 9));
        }
    }

    #[tokio::test]
    async fn test_update_flag() {
        let dict = dictionary();
        assert!(!dict.should_update().await);
        dict.mark_to_update(true).await;
        assert!(dict.should_update().await);
        assert!(dict.take_update_flag().await);
        assert!(!dict.should_update().await);
        assert!(!dict.take_update_flag().await);
    }
}
