//! Per-category pullers and the full refresh.
//!
//! Every puller follows the same contract: read the category's high-water
//! mark, release the lock, query storage, then merge the rows under the
//! exclusive lock and advance the mark. A storage error leaves the mark
//! untouched and is recorded against that category only.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crm_core::{Category, Result};

use crate::dictionary::Dictionary;
use crate::indexes::{Indexes, MergeOutcome};

/// Outcome of one category within a full refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: Category,
    /// Rows applied, or the error text.
    pub result: std::result::Result<usize, String>,
}

/// Per-category outcomes of a full refresh, in category order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<CategoryOutcome>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn outcome(&self, category: Category) -> Option<&CategoryOutcome> {
        self.outcomes.iter().find(|o| o.category == category)
    }

    pub fn rows_applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Dictionary {
    pub async fn sync_users(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::Users).await;
        let fetched = self.reader().fetch_users(since).await;
        let photos = self.photos();
        self.merge(Category::Users, since, fetched, move |indexes, rows| {
            indexes.apply_users(rows, photos.as_ref())
        })
        .await
    }

    pub async fn sync_federations(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::Federations).await;
        let fetched = self.reader().fetch_federations(since).await;
        self.merge(Category::Federations, since, fetched, Indexes::apply_federations)
            .await
    }

    pub async fn sync_companies(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::Companies).await;
        let fetched = self.reader().fetch_companies(since).await;
        self.merge(Category::Companies, since, fetched, Indexes::apply_companies)
            .await
    }

    pub async fn sync_projects(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::Projects).await;
        let fetched = self.reader().fetch_projects(since).await;
        self.merge(Category::Projects, since, fetched, Indexes::apply_projects)
            .await
    }

    pub async fn sync_tags(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::Tags).await;
        let fetched = self.reader().fetch_tags(since).await;
        self.merge(Category::Tags, since, fetched, Indexes::apply_tags)
            .await
    }

    pub async fn sync_company_fields(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::CompanyFields).await;
        let fetched = self.reader().fetch_company_fields(since).await;
        self.merge(Category::CompanyFields, since, fetched, Indexes::apply_company_fields)
            .await
    }

    pub async fn sync_project_fields(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::ProjectFields).await;
        let fetched = self.reader().fetch_project_fields(since).await;
        self.merge(Category::ProjectFields, since, fetched, Indexes::apply_project_fields)
            .await
    }

    pub async fn sync_catalog_fields(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::CatalogFields).await;
        let fetched = self.reader().fetch_catalog_fields(since).await;
        self.merge(Category::CatalogFields, since, fetched, Indexes::apply_catalog_fields)
            .await
    }

    pub async fn sync_user_federations(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::UserFederation).await;
        let fetched = self.reader().fetch_user_federations(since).await;
        self.merge(Category::UserFederation, since, fetched, Indexes::apply_user_federations)
            .await
    }

    pub async fn sync_user_companies(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::UserCompany).await;
        let fetched = self.reader().fetch_user_companies(since).await;
        self.merge(Category::UserCompany, since, fetched, Indexes::apply_user_companies)
            .await
    }

    pub async fn sync_company_priorities(&self) -> Result<MergeOutcome> {
        let since = self.high_water(Category::CompanyPriorities).await;
        let fetched = self.reader().fetch_company_priorities(since).await;
        self.merge(
            Category::CompanyPriorities,
            since,
            fetched,
            Indexes::apply_company_priorities,
        )
        .await
    }

    /// Run the puller of one category.
    pub async fn sync_category(&self, category: Category) -> Result<MergeOutcome> {
        match category {
            Category::Users => self.sync_users().await,
            Category::Federations => self.sync_federations().await,
            Category::Companies => self.sync_companies().await,
            Category::Projects => self.sync_projects().await,
            Category::Tags => self.sync_tags().await,
            Category::CompanyFields => self.sync_company_fields().await,
            Category::ProjectFields => self.sync_project_fields().await,
            Category::CatalogFields => self.sync_catalog_fields().await,
            Category::UserFederation => self.sync_user_federations().await,
            Category::UserCompany => self.sync_user_companies().await,
            Category::CompanyPriorities => self.sync_company_priorities().await,
        }
    }

    /// Run all eleven pullers concurrently and wait for every one of them.
    ///
    /// Refreshes never overlap: a call made while another refresh is running
    /// waits for it to finish first.
    pub async fn sync_all(&self) -> SyncReport {
        let _refresh = self.refresh_lock().lock().await;
        let start = Instant::now();

        let mut pullers = JoinSet::new();
        for category in Category::ALL {
            let dictionary = self.clone();
            pullers.spawn(async move {
                let result = AssertUnwindSafe(dictionary.sync_category(category))
                    .catch_unwind()
                    .await;
                (category, result)
            });
        }

        let mut report = SyncReport::default();
        while let Some(joined) = pullers.join_next().await {
            let (category, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!(
                        subsystem = "dictionary",
                        component = "puller",
                        op = "sync_all",
                        error = %e,
                        "Puller task failed to join"
                    );
                    continue;
                }
            };

            let result = match result {
                Ok(Ok(outcome)) => Ok(outcome.applied),
                Ok(Err(e)) => Err(e.to_string()),
                Err(payload) => {
                    let message = format!("puller panicked: {}", panic_message(payload.as_ref()));
                    error!(
                        subsystem = "dictionary",
                        component = "puller",
                        op = "sync_all",
                        category = %category,
                        error = %message,
                        "Puller panicked"
                    );
                    self.state()
                        .write()
                        .await
                        .last_errors
                        .insert(category, message.clone());
                    Err(message)
                }
            };
            report.outcomes.push(CategoryOutcome { category, result });
        }
        report.outcomes.sort_by_key(|o| o.category);

        let failed = report.failures().count();
        if failed > 0 {
            warn!(
                subsystem = "dictionary",
                component = "puller",
                op = "sync_all",
                failed,
                row_count = report.rows_applied(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Full refresh finished with failures"
            );
        } else {
            info!(
                subsystem = "dictionary",
                component = "puller",
                op = "sync_all",
                row_count = report.rows_applied(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Full refresh complete"
            );
        }
        report
    }

    async fn merge<R>(
        &self,
        category: Category,
        since: DateTime<Utc>,
        fetched: Result<Vec<R>>,
        apply: impl FnOnce(&mut Indexes, Vec<R>) -> MergeOutcome,
    ) -> Result<MergeOutcome> {
        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    subsystem = "dictionary",
                    component = "puller",
                    op = "pull",
                    category = %category,
                    since = %since,
                    error = %e,
                    "Storage read failed, high-water mark kept"
                );
                self.state()
                    .write()
                    .await
                    .last_errors
                    .insert(category, e.to_string());
                return Err(e);
            }
        };

        let row_count = rows.len();
        let start = Instant::now();
        let mut state = self.state().write().await;
        let outcome = apply(&mut state.indexes, rows);

        if let Some(max_seen) = outcome.max_updated_at {
            let mark = state.high_water.entry(category).or_insert(max_seen);
            *mark = (*mark).max(max_seen);
        }
        let high_water = state.high_water.get(&category).copied();
        state.last_errors.remove(&category);
        drop(state);

        debug!(
            subsystem = "dictionary",
            component = "puller",
            op = "pull",
            category = %category,
            row_count,
            applied = outcome.applied,
            skipped_count = outcome.skipped,
            high_water = ?high_water,
            duration_ms = start.elapsed().as_millis() as u64,
            "Merged category"
        );
        Ok(outcome)
    }
}
