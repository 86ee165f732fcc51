//! Read side of the dictionary.
//!
//! Every query takes the shared lock and returns owned clones. A query
//! against a primary index that has never been populated logs
//! "<index> not synced" at error level and reports not-found.

use std::collections::HashSet;

use rand::seq::IteratorRandom;
use tracing::{error, warn};
use uuid::Uuid;

use crm_core::defaults::SEARCH_RESULT_LIMIT;
use crm_core::{
    CatalogField, Company, CompanyField, CompanyPriority, Federation, Project, ProjectField,
    SearchUsers, Tag, User,
};

use crate::dictionary::Dictionary;
use crate::search;

fn not_synced(index: &'static str, op: &'static str) {
    error!(
        subsystem = "dictionary",
        component = "query",
        op,
        index,
        "{index} not synced"
    );
}

impl Dictionary {
    pub async fn find_user(&self, email: &str) -> Option<User> {
        let state = self.read().await;
        let users = &state.indexes.users_by_email;
        if users.is_empty() {
            not_synced("users", "find_user");
            return None;
        }
        users.get(email).cloned()
    }

    pub async fn find_user_by_uuid(&self, uuid: Uuid) -> Option<User> {
        let state = self.read().await;
        let users = &state.indexes.users_by_uuid;
        if users.is_empty() {
            not_synced("users by uuid", "find_user_by_uuid");
            return None;
        }
        users.get(&uuid).cloned()
    }

    pub async fn find_federation(&self, uuid: Uuid) -> Option<Federation> {
        let state = self.read().await;
        let federations = &state.indexes.federations;
        if federations.is_empty() {
            not_synced("federations", "find_federation");
            return None;
        }
        federations.get(&uuid).cloned()
    }

    pub async fn find_company(&self, uuid: Uuid) -> Option<Company> {
        let state = self.read().await;
        let companies = &state.indexes.companies;
        if companies.is_empty() {
            not_synced("companies", "find_company");
            return None;
        }
        companies.get(&uuid).cloned()
    }

    pub async fn find_tag(&self, uuid: Uuid) -> Option<Tag> {
        let state = self.read().await;
        let tags = &state.indexes.tags;
        if tags.is_empty() {
            not_synced("tags", "find_tag");
            return None;
        }
        tags.get(&uuid).cloned()
    }

    pub async fn find_project(&self, uuid: Uuid) -> Option<Project> {
        let state = self.read().await;
        let projects = &state.indexes.projects;
        if projects.is_empty() {
            not_synced("projects", "find_project");
            return None;
        }
        projects.get(&uuid).cloned()
    }

    /// Uniformly chosen user, for fixtures and load tests.
    pub async fn get_random_user(&self) -> Option<User> {
        let state = self.read().await;
        let users = &state.indexes.users_by_email;
        if users.is_empty() {
            not_synced("users", "get_random_user");
            return None;
        }
        users.values().choose(&mut rand::thread_rng()).cloned()
    }

    /// Uniformly chosen company, for fixtures and load tests.
    pub async fn get_random_company(&self) -> Option<Company> {
        let state = self.read().await;
        let companies = &state.indexes.companies;
        if companies.is_empty() {
            not_synced("companies", "get_random_company");
            return None;
        }
        companies.values().choose(&mut rand::thread_rng()).cloned()
    }

    /// Look up many users by email.
    ///
    /// Duplicate and empty emails are ignored; each miss is logged at warn.
    /// Returns the users found and their emails, in first-occurrence order.
    pub async fn find_users<S: AsRef<str>>(&self, emails: &[S]) -> (Vec<User>, Vec<String>) {
        let state = self.read().await;
        let users = &state.indexes.users_by_email;
        if users.is_empty() {
            not_synced("users", "find_users");
            return (Vec::new(), Vec::new());
        }

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for email in emails.iter().map(AsRef::as_ref) {
            if email.is_empty() || !seen.insert(email) {
                continue;
            }
            match users.get(email) {
                Some(user) => found.push(user.clone()),
                None => warn!(
                    subsystem = "dictionary",
                    component = "query",
                    op = "find_users",
                    email,
                    "User not found"
                ),
            }
        }

        let keys = found.iter().map(|u| u.email.clone()).collect();
        (found, keys)
    }

    pub async fn find_company_fields(&self, company_uuid: Uuid) -> Option<Vec<CompanyField>> {
        let state = self.read().await;
        let fields = &state.indexes.company_fields;
        if fields.is_empty() {
            not_synced("company fields", "find_company_fields");
            return None;
        }
        fields.get(&company_uuid).cloned()
    }

    pub async fn find_project_fields(&self, project_uuid: Uuid) -> Option<Vec<ProjectField>> {
        let state = self.read().await;
        let fields = &state.indexes.project_fields;
        if fields.is_empty() {
            not_synced("project fields", "find_project_fields");
            return None;
        }
        fields.get(&project_uuid).cloned()
    }

    pub async fn find_catalog_fields(&self, catalog_uuid: Uuid) -> Option<Vec<CatalogField>> {
        let state = self.read().await;
        let fields = &state.indexes.catalog_fields;
        if fields.is_empty() {
            not_synced("catalog fields", "find_catalog_fields");
            return None;
        }
        fields.get(&catalog_uuid).cloned()
    }

    /// The priority of `company_uuid` with the given `number`.
    pub async fn find_company_priority(
        &self,
        company_uuid: Uuid,
        number: i32,
    ) -> Option<CompanyPriority> {
        let state = self.read().await;
        let priorities = &state.indexes.company_priorities;
        if priorities.is_empty() {
            not_synced("company priorities", "find_company_priority");
            return None;
        }
        priorities
            .get(&company_uuid)?
            .iter()
            .find(|p| p.number == number)
            .cloned()
    }

    /// Companies `user_uuid` belongs to; empty if none are known.
    pub async fn get_user_companies(&self, user_uuid: Uuid) -> Vec<Uuid> {
        let state = self.read().await;
        let memberships = &state.indexes.user_companies;
        if memberships.is_empty() {
            not_synced("user companies", "get_user_companies");
            return Vec::new();
        }
        memberships.get(&user_uuid).cloned().unwrap_or_default()
    }

    /// Federations `user_uuid` belongs to; empty if none are known.
    pub async fn get_user_federations(&self, user_uuid: Uuid) -> Vec<Uuid> {
        let state = self.read().await;
        let memberships = &state.indexes.user_federations;
        if memberships.is_empty() {
            not_synced("user federations", "get_user_federations");
            return Vec::new();
        }
        memberships.get(&user_uuid).cloned().unwrap_or_default()
    }

    /// Free-text search among the users of one federation.
    ///
    /// See [`search::rank`] for the scoring rules.
    pub async fn search_users(&self, request: &SearchUsers) -> Vec<User> {
        let state = self.read().await;
        match state.indexes.federation_users.get(&request.federation_uuid) {
            Some(users) => search::rank(users, &request.search, SEARCH_RESULT_LIMIT),
            None => Vec::new(),
        }
    }
}
