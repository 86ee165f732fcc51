//! PostgreSQL implementation of the dictionary's storage reader.
//!
//! Each query returns every row of its category with `updated_at >= $1`,
//! soft-deleted rows included, ordered by `updated_at` so merges replay
//! changes chronologically.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Pool, Postgres};
use tracing::debug;

use crm_core::{
    CatalogFieldRow, Category, CompanyFieldRow, CompanyPriorityRow, CompanyRow, DictionaryReader,
    Error, FederationRow, ProjectFieldRow, ProjectRow, Result, TagRow, UserCompanyRow,
    UserFederationRow, UserRow,
};

/// Users with one row per federation membership. A change to the
/// membership alone re-emits the user.
pub(crate) const USERS_SQL: &str = r#"
    SELECT
        u.uuid,
        u.name,
        u.lname,
        u.pname,
        u.email,
        u.phone::BIGINT AS phone,
        u.has_photo,
        fu.federation_uuid AS federation_uuid,
        GREATEST(u.updated_at, COALESCE(fu.updated_at, u.updated_at)) AS updated_at,
        u.deleted_at,
        fu.deleted_at AS membership_deleted_at
    FROM users u
    LEFT JOIN federation_users fu ON fu.user_uuid = u.uuid
    WHERE u.updated_at >= $1 OR fu.updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const FEDERATIONS_SQL: &str = r#"
    SELECT uuid, name, updated_at, deleted_at
    FROM federations
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const COMPANIES_SQL: &str = r#"
    SELECT uuid, name, federation_uuid, updated_at, deleted_at
    FROM companies
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const PROJECTS_SQL: &str = r#"
    SELECT
        uuid,
        name,
        company_uuid,
        federation_uuid,
        COALESCE(status_graph::TEXT, '') AS status_graph,
        COALESCE(options::TEXT, 'null') AS options,
        updated_at,
        deleted_at
    FROM projects
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const TAGS_SQL: &str = r#"
    SELECT uuid, name, color, updated_at, deleted_at
    FROM company_tags
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

/// Company fields with all live project attachments aggregated, selected
/// when the field itself or any of its attachments changed.
pub(crate) const COMPANY_FIELDS_SQL: &str = r#"
    SELECT
        cf.uuid,
        cf.company_uuid,
        cf.hash,
        cf.name,
        cf.data_type,
        COALESCE(
            json_agg(pf.project_uuid)
                FILTER (WHERE pf.project_uuid IS NOT NULL AND pf.deleted_at IS NULL),
            '[]'::JSON
        ) AS projects_uuid,
        GREATEST(cf.updated_at, COALESCE(MAX(pf.updated_at), cf.updated_at)) AS updated_at,
        cf.deleted_at
    FROM company_fields cf
    LEFT JOIN project_fields pf ON pf.company_field_uuid = cf.uuid
    WHERE cf.updated_at >= $1
       OR EXISTS (
            SELECT 1 FROM project_fields changed
            WHERE changed.company_field_uuid = cf.uuid AND changed.updated_at >= $1
       )
    GROUP BY cf.uuid
    ORDER BY updated_at
"#;

/// Project fields take their definition from the company field and their
/// status requirements from the attachment itself.
pub(crate) const PROJECT_FIELDS_SQL: &str = r#"
    SELECT
        pf.uuid,
        pf.project_uuid,
        pf.company_uuid,
        cf.hash,
        cf.name,
        cf.data_type,
        COALESCE(cf.style, '') AS style,
        COALESCE(pf.required_on_statuses, '[]'::JSONB) AS required_on_statuses,
        GREATEST(pf.updated_at, cf.updated_at) AS updated_at,
        COALESCE(pf.deleted_at, cf.deleted_at) AS deleted_at
    FROM project_fields pf
    JOIN company_fields cf ON pf.company_field_uuid = cf.uuid
    WHERE pf.updated_at >= $1 OR cf.updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const CATALOG_FIELDS_SQL: &str = r#"
    SELECT uuid, catalog_uuid, hash, name, data_type, updated_at, deleted_at
    FROM catalog_fields
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const USER_FEDERATIONS_SQL: &str = r#"
    SELECT user_uuid, federation_uuid, updated_at, deleted_at
    FROM federation_users
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const USER_COMPANIES_SQL: &str = r#"
    SELECT user_uuid, company_uuid, updated_at, deleted_at
    FROM company_users
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

pub(crate) const COMPANY_PRIORITIES_SQL: &str = r#"
    SELECT uuid, company_uuid, name, number, color, updated_at, deleted_at
    FROM company_priorities
    WHERE updated_at >= $1
    ORDER BY updated_at
"#;

/// PostgreSQL implementation of DictionaryReader.
#[derive(Clone)]
pub struct PgDictionaryReader {
    pool: Pool<Postgres>,
}

impl PgDictionaryReader {
    /// Create a new PgDictionaryReader with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_since<R>(
        &self,
        category: Category,
        sql: &'static str,
        since: DateTime<Utc>,
    ) -> Result<Vec<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let start = Instant::now();
        let rows = sqlx::query_as::<_, R>(sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "dictionary_reader",
            op = "fetch_since",
            category = %category,
            since = %since,
            row_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched category rows"
        );
        Ok(rows)
    }
}

#[async_trait]
impl DictionaryReader for PgDictionaryReader {
    async fn fetch_users(&self, since: DateTime<Utc>) -> Result<Vec<UserRow>> {
        self.fetch_since(Category::Users, USERS_SQL, since).await
    }

    async fn fetch_federations(&self, since: DateTime<Utc>) -> Result<Vec<FederationRow>> {
        self.fetch_since(Category::Federations, FEDERATIONS_SQL, since)
            .await
    }

    async fn fetch_companies(&self, since: DateTime<Utc>) -> Result<Vec<CompanyRow>> {
        self.fetch_since(Category::Companies, COMPANIES_SQL, since)
            .await
    }

    async fn fetch_projects(&self, since: DateTime<Utc>) -> Result<Vec<ProjectRow>> {
        self.fetch_since(Category::Projects, PROJECTS_SQL, since).await
    }

    async fn fetch_tags(&self, since: DateTime<Utc>) -> Result<Vec<TagRow>> {
        self.fetch_since(Category::Tags, TAGS_SQL, since).await
    }

    async fn fetch_company_fields(&self, since: DateTime<Utc>) -> Result<Vec<CompanyFieldRow>> {
        self.fetch_since(Category::CompanyFields, COMPANY_FIELDS_SQL, since)
            .await
    }

    async fn fetch_project_fields(&self, since: DateTime<Utc>) -> Result<Vec<ProjectFieldRow>> {
        self.fetch_since(Category::ProjectFields, PROJECT_FIELDS_SQL, since)
            .await
    }

    async fn fetch_catalog_fields(&self, since: DateTime<Utc>) -> Result<Vec<CatalogFieldRow>> {
        self.fetch_since(Category::CatalogFields, CATALOG_FIELDS_SQL, since)
            .await
    }

    async fn fetch_user_federations(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserFederationRow>> {
        self.fetch_since(Category::UserFederation, USER_FEDERATIONS_SQL, since)
            .await
    }

    async fn fetch_user_companies(&self, since: DateTime<Utc>) -> Result<Vec<UserCompanyRow>> {
        self.fetch_since(Category::UserCompany, USER_COMPANIES_SQL, since)
            .await
    }

    async fn fetch_company_priorities(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CompanyPriorityRow>> {
        self.fetch_since(Category::CompanyPriorities, COMPANY_PRIORITIES_SQL, since)
            .await
    }
}
