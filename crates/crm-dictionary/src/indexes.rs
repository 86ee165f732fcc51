//! In-memory indexes and the per-category merge rules.
//!
//! Merges are synchronous and run while the caller holds the exclusive
//! lock; nothing here awaits.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{error, trace};
use uuid::Uuid;

use crm_core::{
    CatalogField, CatalogFieldRow, Category, Company, CompanyField, CompanyFieldRow,
    CompanyPriority, CompanyPriorityRow, CompanyRow, Error, Federation, FederationRow,
    PhotoUrlProvider, Project, ProjectField, ProjectFieldRow, ProjectOptions, ProjectRow, Result,
    StatusGraph, SyncRow, Tag, TagRow, User, UserCompanyRow, UserFederationRow, UserRow,
};

/// Result of merging one batch of rows into the indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub applied: usize,
    pub skipped: usize,
    /// Latest `updated_at` among applied rows.
    pub max_updated_at: Option<DateTime<Utc>>,
}

/// All eleven category indexes plus the federation → users projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Indexes {
    pub users_by_email: HashMap<String, User>,
    pub users_by_uuid: HashMap<Uuid, User>,
    /// Per-federation users, uniq by UUID, sorted by `lname` descending.
    pub federation_users: HashMap<Uuid, Vec<User>>,
    pub federations: HashMap<Uuid, Federation>,
    pub companies: HashMap<Uuid, Company>,
    pub projects: HashMap<Uuid, Project>,
    pub tags: HashMap<Uuid, Tag>,
    pub company_fields: HashMap<Uuid, Vec<CompanyField>>,
    pub project_fields: HashMap<Uuid, Vec<ProjectField>>,
    pub catalog_fields: HashMap<Uuid, Vec<CatalogField>>,
    pub user_federations: HashMap<Uuid, Vec<Uuid>>,
    pub user_companies: HashMap<Uuid, Vec<Uuid>>,
    pub company_priorities: HashMap<Uuid, Vec<CompanyPriority>>,
}

/// Apply `apply` to every row in order, tracking the high-water candidate.
///
/// A row whose `apply` fails is logged and skipped; its timestamp does not
/// count towards `max_updated_at`.
fn merge_each<R: SyncRow>(
    category: Category,
    rows: Vec<R>,
    mut apply: impl FnMut(R) -> Result<()>,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for row in rows {
        let updated_at = row.updated_at();
        let deleted = row.is_deleted();
        match apply(row) {
            Ok(()) => {
                trace!(
                    subsystem = "dictionary",
                    component = "puller",
                    category = %category,
                    updated_at = %updated_at,
                    deleted,
                    "Merged row"
                );
                outcome.applied += 1;
                outcome.max_updated_at = outcome.max_updated_at.max(Some(updated_at));
            }
            Err(e) => {
                error!(
                    subsystem = "dictionary",
                    component = "puller",
                    category = %category,
                    updated_at = %updated_at,
                    error = %e,
                    "Skipping row that failed to decode"
                );
                outcome.skipped += 1;
            }
        }
    }
    outcome
}

/// Replace the entry with the same key in place, or append.
fn upsert_by<T, K: PartialEq>(list: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let wanted = key(&item);
    match list.iter_mut().find(|existing| key(existing) == wanted) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

/// Drop matching entries from a keyed list; an emptied list is removed.
fn remove_from<K, V>(map: &mut HashMap<K, Vec<V>>, key: &K, matches: impl Fn(&V) -> bool)
where
    K: std::hash::Hash + Eq,
{
    if let Some(list) = map.get_mut(key) {
        list.retain(|v| !matches(v));
        if list.is_empty() {
            map.remove(key);
        }
    }
}

impl Indexes {
    // ─── Users ─────────────────────────────────────────────────────────────

    pub fn apply_users(&mut self, rows: Vec<UserRow>, photos: &dyn PhotoUrlProvider) -> MergeOutcome {
        let mut touched = BTreeSet::new();
        let outcome = merge_each(Category::Users, rows, |row| {
            self.apply_user(row, photos, &mut touched);
            Ok(())
        });

        for federation in touched {
            if let Some(list) = self.federation_users.get_mut(&federation) {
                list.sort_by(|a, b| b.lname.cmp(&a.lname));
            }
        }
        outcome
    }

    fn apply_user(&mut self, row: UserRow, photos: &dyn PhotoUrlProvider, touched: &mut BTreeSet<Uuid>) {
        if row.is_deleted() {
            self.remove_user(row.uuid, &row.email);
            return;
        }

        let previous = self.users_by_uuid.get(&row.uuid);

        // A row for a dropped membership keeps another federation the user
        // still belongs to.
        let federation_uuid = match row.live_federation() {
            Some(federation) => Some(federation),
            None => previous
                .and_then(|user| user.federation_uuid)
                .filter(|federation| Some(*federation) != row.federation_uuid)
                .or_else(|| self.remaining_federation(row.uuid, row.federation_uuid)),
        };

        if let Some(stale) = previous
            .filter(|user| user.email != row.email)
            .map(|user| user.email.clone())
        {
            if self.users_by_email.get(&stale).map(|u| u.uuid) == Some(row.uuid) {
                self.users_by_email.remove(&stale);
            }
        }

        let user = User {
            uuid: row.uuid,
            name: row.name.clone(),
            lname: row.lname.clone(),
            pname: row.pname.clone(),
            email: row.email.clone(),
            phone: row.phone,
            has_photo: row.has_photo,
            federation_uuid,
            photo: photos.photo(row.uuid),
        };

        match (row.live_federation(), row.federation_uuid) {
            (Some(federation), _) => {
                let entry = User {
                    federation_uuid: Some(federation),
                    ..user.clone()
                };
                let list = self.federation_users.entry(federation).or_default();
                upsert_by(list, entry, |u| u.uuid);
                touched.insert(federation);
            }
            (None, Some(dropped)) => {
                remove_from(&mut self.federation_users, &dropped, |u| u.uuid == row.uuid);
            }
            (None, None) => {}
        }

        self.users_by_email.insert(user.email.clone(), user.clone());
        self.users_by_uuid.insert(user.uuid, user);
    }

    /// Lowest-UUID federation other than `except` whose list holds `user`.
    fn remaining_federation(&self, user: Uuid, except: Option<Uuid>) -> Option<Uuid> {
        self.federation_users
            .iter()
            .filter(|(federation, list)| {
                Some(**federation) != except && list.iter().any(|u| u.uuid == user)
            })
            .map(|(federation, _)| *federation)
            .min()
    }

    fn remove_user(&mut self, uuid: Uuid, email: &str) {
        if let Some(user) = self.users_by_uuid.remove(&uuid) {
            if self.users_by_email.get(&user.email).map(|u| u.uuid) == Some(uuid) {
                self.users_by_email.remove(&user.email);
            }
        }
        if self.users_by_email.get(email).map(|u| u.uuid) == Some(uuid) {
            self.users_by_email.remove(email);
        }
        self.federation_users.retain(|_, list| {
            list.retain(|u| u.uuid != uuid);
            !list.is_empty()
        });
    }

    // ─── Keyed entities ────────────────────────────────────────────────────

    pub fn apply_federations(&mut self, rows: Vec<FederationRow>) -> MergeOutcome {
        merge_each(Category::Federations, rows, |row| {
            if row.is_deleted() {
                self.federations.remove(&row.uuid);
            } else {
                self.federations.insert(
                    row.uuid,
                    Federation {
                        uuid: row.uuid,
                        name: row.name,
                    },
                );
            }
            Ok(())
        })
    }

    pub fn apply_companies(&mut self, rows: Vec<CompanyRow>) -> MergeOutcome {
        merge_each(Category::Companies, rows, |row| {
            if row.is_deleted() {
                self.companies.remove(&row.uuid);
            } else {
                self.companies.insert(
                    row.uuid,
                    Company {
                        uuid: row.uuid,
                        name: row.name,
                        federation_uuid: row.federation_uuid,
                    },
                );
            }
            Ok(())
        })
    }

    pub fn apply_projects(&mut self, rows: Vec<ProjectRow>) -> MergeOutcome {
        merge_each(Category::Projects, rows, |row| {
            if row.is_deleted() {
                self.projects.remove(&row.uuid);
                return Ok(());
            }

            let status_graph = StatusGraph::from_json(&row.status_graph).map_err(|e| {
                Error::decode(Category::Projects, format!("project {} status_graph: {e}", row.uuid))
            })?;
            let options = ProjectOptions::from_json(&row.options).map_err(|e| {
                Error::decode(Category::Projects, format!("project {} options: {e}", row.uuid))
            })?;

            self.projects.insert(
                row.uuid,
                Project {
                    uuid: row.uuid,
                    name: row.name,
                    company_uuid: row.company_uuid,
                    federation_uuid: row.federation_uuid,
                    status_graph,
                    options,
                },
            );
            Ok(())
        })
    }

    pub fn apply_tags(&mut self, rows: Vec<TagRow>) -> MergeOutcome {
        merge_each(Category::Tags, rows, |row| {
            if row.is_deleted() {
                self.tags.remove(&row.uuid);
            } else {
                self.tags.insert(
                    row.uuid,
                    Tag {
                        uuid: row.uuid,
                        name: row.name,
                        color: row.color,
                    },
                );
            }
            Ok(())
        })
    }

    // ─── Field lists ───────────────────────────────────────────────────────

    pub fn apply_company_fields(&mut self, rows: Vec<CompanyFieldRow>) -> MergeOutcome {
        merge_each(Category::CompanyFields, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.company_fields, &row.company_uuid, |f| f.hash == row.hash);
            } else {
                let field = CompanyField {
                    hash: row.hash,
                    name: row.name,
                    data_type: row.data_type,
                    projects_uuid: row.projects_uuid,
                };
                let list = self.company_fields.entry(row.company_uuid).or_default();
                upsert_by(list, field, |f| f.hash.clone());
            }
            Ok(())
        })
    }

    pub fn apply_project_fields(&mut self, rows: Vec<ProjectFieldRow>) -> MergeOutcome {
        merge_each(Category::ProjectFields, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.project_fields, &row.project_uuid, |f| f.hash == row.hash);
            } else {
                let field = ProjectField {
                    hash: row.hash,
                    name: row.name,
                    data_type: row.data_type,
                    required_on_statuses: row.required_on_statuses,
                    style: row.style,
                    project_uuid: row.project_uuid,
                };
                let list = self.project_fields.entry(row.project_uuid).or_default();
                upsert_by(list, field, |f| f.hash.clone());
            }
            Ok(())
        })
    }

    pub fn apply_catalog_fields(&mut self, rows: Vec<CatalogFieldRow>) -> MergeOutcome {
        merge_each(Category::CatalogFields, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.catalog_fields, &row.catalog_uuid, |f| f.hash == row.hash);
            } else {
                let field = CatalogField {
                    hash: row.hash,
                    name: row.name,
                    data_type: row.data_type,
                };
                let list = self.catalog_fields.entry(row.catalog_uuid).or_default();
                upsert_by(list, field, |f| f.hash.clone());
            }
            Ok(())
        })
    }

    pub fn apply_company_priorities(&mut self, rows: Vec<CompanyPriorityRow>) -> MergeOutcome {
        merge_each(Category::CompanyPriorities, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.company_priorities, &row.company_uuid, |p| p.uuid == row.uuid);
            } else {
                let priority = CompanyPriority {
                    uuid: row.uuid,
                    name: row.name,
                    number: row.number,
                    color: row.color,
                };
                let list = self.company_priorities.entry(row.company_uuid).or_default();
                upsert_by(list, priority, |p| p.uuid);
            }
            Ok(())
        })
    }

    // ─── Memberships ───────────────────────────────────────────────────────

    pub fn apply_user_federations(&mut self, rows: Vec<UserFederationRow>) -> MergeOutcome {
        merge_each(Category::UserFederation, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.user_federations, &row.user_uuid, |f| *f == row.federation_uuid);
            } else {
                let set = self.user_federations.entry(row.user_uuid).or_default();
                if !set.contains(&row.federation_uuid) {
                    set.push(row.federation_uuid);
                }
            }
            Ok(())
        })
    }

    pub fn apply_user_companies(&mut self, rows: Vec<UserCompanyRow>) -> MergeOutcome {
        merge_each(Category::UserCompany, rows, |row| {
            if row.is_deleted() {
                remove_from(&mut self.user_companies, &row.user_uuid, |c| *c == row.company_uuid);
            } else {
                let set = self.user_companies.entry(row.user_uuid).or_default();
                if !set.contains(&row.company_uuid) {
                    set.push(row.company_uuid);
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticPhotoUrls;
    use chrono::Duration;

    fn user_row(name: &str, lname: &str, email: &str, federation: Option<Uuid>) -> UserRow {
        UserRow {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            lname: lname.to_string(),
            pname: String::new(),
            email: email.to_string(),
            phone: 0,
            has_photo: false,
            federation_uuid: federation,
            updated_at: Utc::now(),
            deleted_at: None,
            membership_deleted_at: None,
        }
    }

    #[test]
    fn test_users_sorted_by_lname_descending() {
        let fed = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let rows = vec![
            user_row("Allen", "Baker", "allen@x", Some(fed)),
            user_row("Bob", "Carter", "bob@x", Some(fed)),
            user_row("Alice", "Brown", "alice@x", Some(fed)),
        ];
        let outcome = indexes.apply_users(rows, &StaticPhotoUrls);

        assert_eq!(outcome.applied, 3);
        let lnames: Vec<_> = indexes.federation_users[&fed]
            .iter()
            .map(|u| u.lname.as_str())
            .collect();
        assert_eq!(lnames, ["Carter", "Brown", "Baker"]);
    }

    #[test]
    fn test_user_update_replaces_list_entry() {
        let fed = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let row = user_row("Alice", "Brown", "alice@x", Some(fed));
        indexes.apply_users(vec![row.clone()], &StaticPhotoUrls);

        let mut renamed = row.clone();
        renamed.lname = "Black".to_string();
        indexes.apply_users(vec![renamed], &StaticPhotoUrls);

        let list = &indexes.federation_users[&fed];
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].lname, "Black");
        assert_eq!(indexes.users_by_uuid[&row.uuid].lname, "Black");
    }

    #[test]
    fn test_email_change_drops_stale_key() {
        let mut indexes = Indexes::default();
        let row = user_row("Alice", "Brown", "alice@x", None);
        indexes.apply_users(vec![row.clone()], &StaticPhotoUrls);

        let mut moved = row.clone();
        moved.email = "alice@y".to_string();
        indexes.apply_users(vec![moved], &StaticPhotoUrls);

        assert!(!indexes.users_by_email.contains_key("alice@x"));
        assert_eq!(indexes.users_by_email["alice@y"].uuid, row.uuid);
    }

    #[test]
    fn test_deleted_user_leaves_every_index() {
        let fed_a = Uuid::new_v4();
        let fed_b = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let in_a = user_row("Alice", "Brown", "alice@x", Some(fed_a));
        let mut in_b = in_a.clone();
        in_b.federation_uuid = Some(fed_b);
        indexes.apply_users(vec![in_a.clone(), in_b], &StaticPhotoUrls);
        assert_eq!(indexes.federation_users.len(), 2);

        let mut deleted = in_a.clone();
        deleted.deleted_at = Some(Utc::now());
        indexes.apply_users(vec![deleted], &StaticPhotoUrls);

        assert!(indexes.users_by_uuid.is_empty());
        assert!(indexes.users_by_email.is_empty());
        assert!(indexes.federation_users.is_empty());
    }

    #[test]
    fn test_dropped_membership_leaves_only_that_list() {
        let fed_a = Uuid::new_v4();
        let fed_b = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let in_a = user_row("Alice", "Brown", "alice@x", Some(fed_a));
        let mut in_b = in_a.clone();
        in_b.federation_uuid = Some(fed_b);
        indexes.apply_users(vec![in_a.clone(), in_b], &StaticPhotoUrls);

        let mut left_a = in_a.clone();
        left_a.membership_deleted_at = Some(Utc::now());
        indexes.apply_users(vec![left_a], &StaticPhotoUrls);

        assert!(!indexes.federation_users.contains_key(&fed_a));
        assert_eq!(indexes.federation_users[&fed_b].len(), 1);
        assert_eq!(indexes.users_by_uuid[&in_a.uuid].federation_uuid, Some(fed_b));
    }

    #[test]
    fn test_leaving_latest_federation_falls_back_to_remaining_one() {
        let fed_a = Uuid::new_v4();
        let fed_b = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let in_a = user_row("Alice", "Brown", "alice@x", Some(fed_a));
        let mut in_b = in_a.clone();
        in_b.federation_uuid = Some(fed_b);
        indexes.apply_users(vec![in_a.clone(), in_b.clone()], &StaticPhotoUrls);
        assert_eq!(indexes.users_by_uuid[&in_a.uuid].federation_uuid, Some(fed_b));

        let mut left_b = in_b;
        left_b.membership_deleted_at = Some(Utc::now());
        indexes.apply_users(vec![left_b], &StaticPhotoUrls);

        assert!(!indexes.federation_users.contains_key(&fed_b));
        assert_eq!(indexes.federation_users[&fed_a].len(), 1);
        assert_eq!(indexes.users_by_uuid[&in_a.uuid].federation_uuid, Some(fed_a));
        assert_eq!(indexes.users_by_email["alice@x"].federation_uuid, Some(fed_a));
    }

    #[test]
    fn test_leaving_only_federation_clears_it() {
        let fed = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let row = user_row("Alice", "Brown", "alice@x", Some(fed));
        indexes.apply_users(vec![row.clone()], &StaticPhotoUrls);

        let mut left = row.clone();
        left.membership_deleted_at = Some(Utc::now());
        indexes.apply_users(vec![left], &StaticPhotoUrls);

        assert!(indexes.federation_users.is_empty());
        assert_eq!(indexes.users_by_uuid[&row.uuid].federation_uuid, None);
    }

    #[test]
    fn test_list_entries_carry_their_federation() {
        let fed_a = Uuid::new_v4();
        let fed_b = Uuid::new_v4();
        let mut indexes = Indexes::default();
        let in_a = user_row("Alice", "Brown", "alice@x", Some(fed_a));
        let mut in_b = in_a.clone();
        in_b.federation_uuid = Some(fed_b);
        indexes.apply_users(vec![in_a, in_b], &StaticPhotoUrls);

        for (federation, list) in &indexes.federation_users {
            assert!(list.iter().all(|u| u.federation_uuid == Some(*federation)));
        }
    }

    #[test]
    fn test_photo_urls_filled_on_insert() {
        let mut indexes = Indexes::default();
        let row = user_row("Alice", "Brown", "alice@x", None);
        indexes.apply_users(vec![row.clone()], &StaticPhotoUrls);
        let photo = &indexes.users_by_uuid[&row.uuid].photo;
        assert_eq!(photo.small, StaticPhotoUrls.small(row.uuid));
        assert_eq!(photo.large, StaticPhotoUrls.large(row.uuid));
    }

    #[test]
    fn test_malformed_project_is_skipped_and_excluded_from_high_water() {
        let now = Utc::now();
        let good = ProjectRow {
            uuid: Uuid::new_v4(),
            name: "good".to_string(),
            company_uuid: Uuid::new_v4(),
            federation_uuid: Uuid::new_v4(),
            status_graph: r#"{"0": ["1"]}"#.to_string(),
            options: "null".to_string(),
            updated_at: now - Duration::seconds(5),
            deleted_at: None,
        };
        let bad = ProjectRow {
            uuid: Uuid::new_v4(),
            options: "{not json".to_string(),
            updated_at: now,
            ..good.clone()
        };

        let mut indexes = Indexes::default();
        let outcome = indexes.apply_projects(vec![good.clone(), bad.clone()]);

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.max_updated_at, Some(good.updated_at));
        assert!(indexes.projects.contains_key(&good.uuid));
        assert!(!indexes.projects.contains_key(&bad.uuid));
    }

    #[test]
    fn test_company_fields_uniq_by_hash_latest_wins() {
        let company = Uuid::new_v4();
        let row = CompanyFieldRow {
            uuid: Uuid::new_v4(),
            company_uuid: company,
            hash: "budget".to_string(),
            name: "Budget".to_string(),
            data_type: 1,
            projects_uuid: vec![],
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let renamed = CompanyFieldRow {
            name: "Budget (USD)".to_string(),
            ..row.clone()
        };

        let mut indexes = Indexes::default();
        indexes.apply_company_fields(vec![row.clone(), renamed]);
        let list = &indexes.company_fields[&company];
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Budget (USD)");

        let deleted = CompanyFieldRow {
            deleted_at: Some(Utc::now()),
            ..row
        };
        indexes.apply_company_fields(vec![deleted]);
        assert!(!indexes.company_fields.contains_key(&company));
    }

    fn priority_row(company: Uuid, name: &str, number: i32) -> CompanyPriorityRow {
        CompanyPriorityRow {
            uuid: Uuid::new_v4(),
            company_uuid: company,
            name: name.to_string(),
            number,
            color: "#f00".to_string(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_renamed_priority_replaces_previous_version() {
        let company = Uuid::new_v4();
        let high = priority_row(company, "High", 3);
        let urgent = CompanyPriorityRow {
            name: "Urgent".to_string(),
            ..high.clone()
        };
        let low = priority_row(company, "Low", 1);

        let mut indexes = Indexes::default();
        indexes.apply_company_priorities(vec![high.clone(), low.clone(), urgent]);

        let names: Vec<_> = indexes.company_priorities[&company]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Urgent", "Low"]);

        indexes.apply_company_priorities(vec![CompanyPriorityRow {
            deleted_at: Some(Utc::now()),
            ..high
        }]);
        let remaining = &indexes.company_priorities[&company];
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uuid, low.uuid);
    }

    #[test]
    fn test_catalog_field_update_replaces_previous_version() {
        let catalog = Uuid::new_v4();
        let row = CatalogFieldRow {
            uuid: Uuid::new_v4(),
            catalog_uuid: catalog,
            hash: "sku".to_string(),
            name: "SKU".to_string(),
            data_type: 2,
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let retyped = CatalogFieldRow {
            name: "Article".to_string(),
            data_type: 3,
            ..row.clone()
        };

        let mut indexes = Indexes::default();
        indexes.apply_catalog_fields(vec![row.clone(), row, retyped]);

        let list = &indexes.catalog_fields[&catalog];
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Article");
        assert_eq!(list[0].data_type, 3);
    }

    #[test]
    fn test_memberships_are_sets() {
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let row = UserCompanyRow {
            user_uuid: user,
            company_uuid: company,
            updated_at: Utc::now(),
            deleted_at: None,
        };

        let mut indexes = Indexes::default();
        indexes.apply_user_companies(vec![row.clone(), row.clone()]);
        assert_eq!(indexes.user_companies[&user], vec![company]);

        indexes.apply_user_companies(vec![UserCompanyRow {
            deleted_at: Some(Utc::now()),
            ..row
        }]);
        assert!(!indexes.user_companies.contains_key(&user));
    }

    #[test]
    fn test_reapplying_same_rows_is_idempotent() {
        let fed = Uuid::new_v4();
        let rows = vec![
            user_row("Alice", "Brown", "alice@x", Some(fed)),
            user_row("Bob", "Carter", "bob@x", Some(fed)),
        ];
        let mut indexes = Indexes::default();
        indexes.apply_users(rows.clone(), &StaticPhotoUrls);
        let snapshot = indexes.clone();
        indexes.apply_users(rows, &StaticPhotoUrls);
        assert_eq!(indexes, snapshot);
    }
}
