//! Row builders shared by the dictionary integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crm_core::{
    CatalogFieldRow, CompanyPriorityRow, CompanyRow, FederationRow, ProjectFieldRow, ProjectRow,
    TagRow, UserCompanyRow, UserFederationRow, UserRow,
};
use crm_dictionary::mock::{MockDictionaryReader, StaticPhotoUrls};
use crm_dictionary::{Dictionary, DictionaryConfig};

/// Dictionary over `reader` with a long sync interval so timed refreshes
/// never interfere with a test.
pub fn dictionary(reader: &MockDictionaryReader) -> Dictionary {
    Dictionary::new(
        Arc::new(reader.clone()),
        Arc::new(StaticPhotoUrls),
        DictionaryConfig::default().with_sync_interval(Duration::from_secs(3600)),
    )
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

pub fn user(name: &str, lname: &str, email: &str, federation: Uuid, updated: i64) -> UserRow {
    UserRow {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        lname: lname.to_string(),
        pname: String::new(),
        email: email.to_string(),
        phone: 0,
        has_photo: true,
        federation_uuid: Some(federation),
        updated_at: at(updated),
        deleted_at: None,
        membership_deleted_at: None,
    }
}

pub fn federation(name: &str, updated: i64) -> FederationRow {
    FederationRow {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn company(name: &str, federation: Uuid, updated: i64) -> CompanyRow {
    CompanyRow {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        federation_uuid: federation,
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn project(company: Uuid, federation: Uuid, status_graph: &str, updated: i64) -> ProjectRow {
    ProjectRow {
        uuid: Uuid::new_v4(),
        name: "Roadmap".to_string(),
        company_uuid: company,
        federation_uuid: federation,
        status_graph: status_graph.to_string(),
        options: r#"{"status_enable": true}"#.to_string(),
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn tag(name: &str, updated: i64) -> TagRow {
    TagRow {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        color: "#ff0000".to_string(),
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn project_field(project: Uuid, company: Uuid, hash: &str, updated: i64) -> ProjectFieldRow {
    ProjectFieldRow {
        uuid: Uuid::new_v4(),
        project_uuid: project,
        company_uuid: company,
        hash: hash.to_string(),
        name: hash.to_uppercase(),
        data_type: 1,
        style: "plain".to_string(),
        required_on_statuses: vec![1],
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn catalog_field(catalog: Uuid, hash: &str, updated: i64) -> CatalogFieldRow {
    CatalogFieldRow {
        uuid: Uuid::new_v4(),
        catalog_uuid: catalog,
        hash: hash.to_string(),
        name: hash.to_uppercase(),
        data_type: 2,
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn priority(company: Uuid, number: i32, updated: i64) -> CompanyPriorityRow {
    CompanyPriorityRow {
        uuid: Uuid::new_v4(),
        company_uuid: company,
        name: format!("P{number}"),
        number,
        color: "#00ff00".to_string(),
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn user_federation(user: Uuid, federation: Uuid, updated: i64) -> UserFederationRow {
    UserFederationRow {
        user_uuid: user,
        federation_uuid: federation,
        updated_at: at(updated),
        deleted_at: None,
    }
}

pub fn user_company(user: Uuid, company: Uuid, updated: i64) -> UserCompanyRow {
    UserCompanyRow {
        user_uuid: user,
        company_uuid: company,
        updated_at: at(updated),
        deleted_at: None,
    }
}
