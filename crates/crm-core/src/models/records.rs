//! Records held by the dictionary and handed out by its query API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status_graph::{ProjectOptions, StatusGraph};

/// Pre-signed profile photo URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Snapshot of a user as mirrored by the dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub name: String,
    pub lname: String,
    pub pname: String,
    pub email: String,
    pub phone: i64,
    pub has_photo: bool,
    /// Federation of the membership this snapshot was taken from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_uuid: Option<Uuid>,
    pub photo: Photo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Federation {
    pub uuid: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub uuid: Uuid,
    pub name: String,
    pub federation_uuid: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub uuid: Uuid,
    pub name: String,
    pub company_uuid: Uuid,
    pub federation_uuid: Uuid,
    pub status_graph: StatusGraph,
    pub options: ProjectOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub uuid: Uuid,
    pub name: String,
    pub color: String,
}

/// Custom field defined on a company; uniq within a company by `hash`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyField {
    pub hash: String,
    pub name: String,
    pub data_type: i32,
    #[serde(rename = "project_uuids")]
    pub projects_uuid: Vec<Uuid>,
}

/// Company field as attached to a project; uniq within a project by `hash`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectField {
    pub hash: String,
    pub name: String,
    pub data_type: i32,
    pub required_on_statuses: Vec<i32>,
    pub style: String,
    pub project_uuid: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
    pub hash: String,
    pub name: String,
    pub data_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPriority {
    pub uuid: Uuid,
    pub name: String,
    #[serde(rename = "priority")]
    pub number: i32,
    pub color: String,
}

/// Federation-scoped free-text user search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchUsers {
    pub federation_uuid: Uuid,
    pub search: String,
}

impl SearchUsers {
    pub fn new(federation_uuid: Uuid, search: impl Into<String>) -> Self {
        Self {
            federation_uuid,
            search: search.into(),
        }
    }
}
