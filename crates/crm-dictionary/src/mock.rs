//! In-memory doubles for the dictionary's collaborators.
//!
//! Always compiled so integration tests (in tests/) and downstream crates
//! can drive a [`Dictionary`](crate::Dictionary) without a database.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crm_dictionary::mock::{MockDictionaryReader, StaticPhotoUrls};
//!
//! let reader = MockDictionaryReader::new();
//! reader.update(|data| data.federations.push(federation_row));
//! let dictionary = Dictionary::new(Arc::new(reader.clone()), Arc::new(StaticPhotoUrls), config);
//! dictionary.sync_all().await;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crm_core::{
    CatalogFieldRow, Category, CompanyFieldRow, CompanyPriorityRow, CompanyRow, DictionaryReader,
    Error, FederationRow, PhotoUrlProvider, ProjectFieldRow, ProjectRow, Result, SyncRow, TagRow,
    UserCompanyRow, UserFederationRow, UserRow,
};

/// Rows held by [`MockDictionaryReader`], one table per category.
#[derive(Debug, Clone, Default)]
pub struct MockData {
    pub users: Vec<UserRow>,
    pub federations: Vec<FederationRow>,
    pub companies: Vec<CompanyRow>,
    pub projects: Vec<ProjectRow>,
    pub tags: Vec<TagRow>,
    pub company_fields: Vec<CompanyFieldRow>,
    pub project_fields: Vec<ProjectFieldRow>,
    pub catalog_fields: Vec<CatalogFieldRow>,
    pub user_federations: Vec<UserFederationRow>,
    pub user_companies: Vec<UserCompanyRow>,
    pub company_priorities: Vec<CompanyPriorityRow>,
}

#[derive(Debug, Default)]
struct MockState {
    data: MockData,
    calls: HashMap<Category, usize>,
    failing: HashMap<Category, String>,
    panicking: HashSet<Category>,
}

/// Storage reader over in-memory tables.
///
/// Reads return the rows with `updated_at >= since` in `updated_at` order,
/// like the SQL reader. Failures and panics can be injected per category.
#[derive(Debug, Clone, Default)]
pub struct MockDictionaryReader {
    state: Arc<Mutex<MockState>>,
}

impl MockDictionaryReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mutate the stored rows.
    pub fn update(&self, change: impl FnOnce(&mut MockData)) {
        change(&mut self.lock().data);
    }

    /// Make reads of `category` fail with `message`.
    pub fn fail(&self, category: Category, message: impl Into<String>) {
        self.lock().failing.insert(category, message.into());
    }

    /// Make reads of `category` panic.
    pub fn panic_on(&self, category: Category) {
        self.lock().panicking.insert(category);
    }

    /// Remove every injected failure and panic.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.panicking.clear();
    }

    /// Number of reads issued for `category`.
    pub fn calls(&self, category: Category) -> usize {
        self.lock().calls.get(&category).copied().unwrap_or(0)
    }

    fn read<R: SyncRow + Clone>(
        &self,
        category: Category,
        since: DateTime<Utc>,
        table: impl FnOnce(&MockData) -> &Vec<R>,
    ) -> Result<Vec<R>> {
        let (rows, panics) = {
            let mut state = self.lock();
            *state.calls.entry(category).or_insert(0) += 1;
            if let Some(message) = state.failing.get(&category) {
                return Err(Error::Internal(message.clone()));
            }
            let mut rows: Vec<R> = table(&state.data)
                .iter()
                .filter(|row| row.updated_at() >= since)
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.updated_at());
            (rows, state.panicking.contains(&category))
        };

        if panics {
            panic!("injected panic reading {category}");
        }
        Ok(rows)
    }
}

#[async_trait]
impl DictionaryReader for MockDictionaryReader {
    async fn fetch_users(&self, since: DateTime<Utc>) -> Result<Vec<UserRow>> {
        self.read(Category::Users, since, |d| &d.users)
    }

    async fn fetch_federations(&self, since: DateTime<Utc>) -> Result<Vec<FederationRow>> {
        self.read(Category::Federations, since, |d| &d.federations)
    }

    async fn fetch_companies(&self, since: DateTime<Utc>) -> Result<Vec<CompanyRow>> {
        self.read(Category::Companies, since, |d| &d.companies)
    }

    async fn fetch_projects(&self, since: DateTime<Utc>) -> Result<Vec<ProjectRow>> {
        self.read(Category::Projects, since, |d| &d.projects)
    }

    async fn fetch_tags(&self, since: DateTime<Utc>) -> Result<Vec<TagRow>> {
        self.read(Category::Tags, since, |d| &d.tags)
    }

    async fn fetch_company_fields(&self, since: DateTime<Utc>) -> Result<Vec<CompanyFieldRow>> {
        self.read(Category::CompanyFields, since, |d| &d.company_fields)
    }

    async fn fetch_project_fields(&self, since: DateTime<Utc>) -> Result<Vec<ProjectFieldRow>> {
        self.read(Category::ProjectFields, since, |d| &d.project_fields)
    }

    async fn fetch_catalog_fields(&self, since: DateTime<Utc>) -> Result<Vec<CatalogFieldRow>> {
        self.read(Category::CatalogFields, since, |d| &d.catalog_fields)
    }

    async fn fetch_user_federations(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserFederationRow>> {
        self.read(Category::UserFederation, since, |d| &d.user_federations)
    }

    async fn fetch_user_companies(&self, since: DateTime<Utc>) -> Result<Vec<UserCompanyRow>> {
        self.read(Category::UserCompany, since, |d| &d.user_companies)
    }

    async fn fetch_company_priorities(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CompanyPriorityRow>> {
        self.read(Category::CompanyPriorities, since, |d| &d.company_priorities)
    }
}

/// Photo URL provider returning fixed, predictable URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPhotoUrls;

impl PhotoUrlProvider for StaticPhotoUrls {
    fn small(&self, user_uuid: Uuid) -> String {
        format!("https://photos.test/{user_uuid}.small.jpg")
    }

    fn medium(&self, user_uuid: Uuid) -> String {
        format!("https://photos.test/{user_uuid}.medium.jpg")
    }

    fn large(&self, user_uuid: Uuid) -> String {
        format!("https://photos.test/{user_uuid}.large.jpg")
    }
}
