//! Index size snapshots for logging and metric exporters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crm_core::Category;

use crate::dictionary::{Dictionary, State};

/// Point-in-time sizes of every index plus per-category sync status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DictionaryStats {
    pub users: usize,
    pub users_by_uuid: usize,
    pub federation_user_lists: usize,
    pub federations: usize,
    pub companies: usize,
    pub projects: usize,
    pub tags: usize,
    /// Companies with at least one field.
    pub company_field_lists: usize,
    /// Fields across all companies.
    pub company_fields: usize,
    pub project_field_lists: usize,
    pub project_fields: usize,
    /// Fields across all catalogs.
    pub catalog_fields: usize,
    /// Users with at least one federation membership.
    pub user_federations: usize,
    /// Users with at least one company membership.
    pub user_companies: usize,
    /// Priorities across all companies.
    pub company_priorities: usize,
    pub high_water: BTreeMap<Category, DateTime<Utc>>,
    pub last_errors: BTreeMap<Category, String>,
}

impl DictionaryStats {
    pub(crate) fn from_state(state: &State) -> Self {
        let indexes = &state.indexes;
        Self {
            users: indexes.users_by_email.len(),
            users_by_uuid: indexes.users_by_uuid.len(),
            federation_user_lists: indexes.federation_users.len(),
            federations: indexes.federations.len(),
            companies: indexes.companies.len(),
            projects: indexes.projects.len(),
            tags: indexes.tags.len(),
            company_field_lists: indexes.company_fields.len(),
            company_fields: indexes.company_fields.values().map(Vec::len).sum(),
            project_field_lists: indexes.project_fields.len(),
            project_fields: indexes.project_fields.values().map(Vec::len).sum(),
            catalog_fields: indexes.catalog_fields.values().map(Vec::len).sum(),
            user_federations: indexes.user_federations.len(),
            user_companies: indexes.user_companies.len(),
            company_priorities: indexes.company_priorities.values().map(Vec::len).sum(),
            high_water: state.high_water.iter().map(|(c, at)| (*c, *at)).collect(),
            last_errors: state
                .last_errors
                .iter()
                .map(|(c, e)| (*c, e.clone()))
                .collect(),
        }
    }

    /// `(label, value)` pairs in a stable order, for gauge exporters.
    pub fn gauges(&self) -> [(&'static str, usize); 15] {
        [
            ("users", self.users),
            ("users_by_uuid", self.users_by_uuid),
            ("federation_user_lists", self.federation_user_lists),
            ("federations", self.federations),
            ("companies", self.companies),
            ("projects", self.projects),
            ("tags", self.tags),
            ("company_field_lists", self.company_field_lists),
            ("company_fields", self.company_fields),
            ("project_field_lists", self.project_field_lists),
            ("project_fields", self.project_fields),
            ("catalog_fields", self.catalog_fields),
            ("user_federations", self.user_federations),
            ("user_companies", self.user_companies),
            ("company_priorities", self.company_priorities),
        ]
    }
}

impl Dictionary {
    /// Snapshot of the current index sizes.
    pub async fn stats(&self) -> DictionaryStats {
        let state = self.read().await;
        DictionaryStats::from_state(&state)
    }
}
