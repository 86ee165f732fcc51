//! Raw rows returned by the storage reader, one struct per category.
//!
//! Rows include soft-deleted records so pullers can observe deletions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Common view over a category row used by the pullers.
pub trait SyncRow: Send + 'static {
    /// Timestamp that drives the category's high-water mark.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Whether the row carries a non-null `deleted_at`.
    fn is_deleted(&self) -> bool;
}

macro_rules! impl_sync_row {
    ($($row:ty),+ $(,)?) => {
        $(
            impl SyncRow for $row {
                fn updated_at(&self) -> DateTime<Utc> {
                    self.updated_at
                }

                fn is_deleted(&self) -> bool {
                    self.deleted_at.is_some()
                }
            }
        )+
    };
}

/// A user joined with one of its federation memberships.
///
/// A user in several federations is returned once per membership. A user
/// with no membership has `federation_uuid = None`. `updated_at` is the later
/// of the user's and the membership's timestamps.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRow {
    pub uuid: Uuid,
    pub name: String,
    pub lname: String,
    pub pname: String,
    pub email: String,
    pub phone: i64,
    pub has_photo: bool,
    pub federation_uuid: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub membership_deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Federation this row places the user in, if the membership is live.
    pub fn live_federation(&self) -> Option<Uuid> {
        match self.membership_deleted_at {
            Some(_) => None,
            None => self.federation_uuid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FederationRow {
    pub uuid: Uuid,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CompanyRow {
    pub uuid: Uuid,
    pub name: String,
    pub federation_uuid: Uuid,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Project row; `status_graph` and `options` are raw JSON text decoded by
/// the puller so a malformed payload only affects its own row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProjectRow {
    pub uuid: Uuid,
    pub name: String,
    pub company_uuid: Uuid,
    pub federation_uuid: Uuid,
    pub status_graph: String,
    pub options: String,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TagRow {
    pub uuid: Uuid,
    pub name: String,
    pub color: String,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Company field with the projects it is attached to.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CompanyFieldRow {
    pub uuid: Uuid,
    pub company_uuid: Uuid,
    pub hash: String,
    pub name: String,
    pub data_type: i32,
    #[sqlx(json)]
    pub projects_uuid: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Project field; hash, name, data type and style come from the company
/// field it instantiates.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProjectFieldRow {
    pub uuid: Uuid,
    pub project_uuid: Uuid,
    pub company_uuid: Uuid,
    pub hash: String,
    pub name: String,
    pub data_type: i32,
    pub style: String,
    #[sqlx(json)]
    pub required_on_statuses: Vec<i32>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CatalogFieldRow {
    pub uuid: Uuid,
    pub catalog_uuid: Uuid,
    pub hash: String,
    pub name: String,
    pub data_type: i32,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserFederationRow {
    pub user_uuid: Uuid,
    pub federation_uuid: Uuid,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserCompanyRow {
    pub user_uuid: Uuid,
    pub company_uuid: Uuid,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CompanyPriorityRow {
    pub uuid: Uuid,
    pub company_uuid: Uuid,
    pub name: String,
    pub number: i32,
    pub color: String,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_sync_row!(
    UserRow,
    FederationRow,
    CompanyRow,
    ProjectRow,
    TagRow,
    CompanyFieldRow,
    ProjectFieldRow,
    CatalogFieldRow,
    UserFederationRow,
    UserCompanyRow,
    CompanyPriorityRow,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row() -> UserRow {
        UserRow {
            uuid: Uuid::new_v4(),
            name: "Alice".to_string(),
            lname: "Brown".to_string(),
            pname: String::new(),
            email: "alice@x".to_string(),
            phone: 0,
            has_photo: false,
            federation_uuid: Some(Uuid::new_v4()),
            updated_at: Utc::now(),
            deleted_at: None,
            membership_deleted_at: None,
        }
    }

    #[test]
    fn test_live_federation_with_active_membership() {
        let row = user_row();
        assert_eq!(row.live_federation(), row.federation_uuid);
    }

    #[test]
    fn test_live_federation_with_deleted_membership() {
        let mut row = user_row();
        row.membership_deleted_at = Some(Utc::now());
        assert_eq!(row.live_federation(), None);
    }

    #[test]
    fn test_sync_row_reports_deletion() {
        let now = Utc::now();
        let row = TagRow {
            uuid: Uuid::new_v4(),
            name: "urgent".to_string(),
            color: "#f00".to_string(),
            updated_at: now,
            deleted_at: Some(now),
        };
        assert!(row.is_deleted());
        assert_eq!(SyncRow::updated_at(&row), now);
    }
}
