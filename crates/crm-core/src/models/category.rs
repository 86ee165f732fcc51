//! The eleven mirrored categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the data kinds mirrored by the dictionary.
///
/// Each category owns its own high-water mark and puller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Users,
    Federations,
    Companies,
    Projects,
    Tags,
    CompanyFields,
    ProjectFields,
    CatalogFields,
    UserFederation,
    UserCompany,
    CompanyPriorities,
}

impl Category {
    /// Every category, in the order refreshes report them.
    pub const ALL: [Category; 11] = [
        Category::Users,
        Category::Federations,
        Category::Companies,
        Category::Projects,
        Category::Tags,
        Category::CompanyFields,
        Category::ProjectFields,
        Category::CatalogFields,
        Category::UserFederation,
        Category::UserCompany,
        Category::CompanyPriorities,
    ];

    /// Wire name used for high-water keys, log fields and gauge labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Users => "users",
            Category::Federations => "federations",
            Category::Companies => "companies",
            Category::Projects => "projects",
            Category::Tags => "tags",
            Category::CompanyFields => "company_fields",
            Category::ProjectFields => "project_fields",
            Category::CatalogFields => "catalog_fields",
            Category::UserFederation => "user_federation",
            Category::UserCompany => "user_company",
            Category::CompanyPriorities => "company_priorities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_categories_are_distinct() {
        let names: HashSet<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(Category::CompanyPriorities.to_string(), "company_priorities");
        assert_eq!(Category::UserFederation.to_string(), "user_federation");
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&Category::CatalogFields).unwrap();
        assert_eq!(json, "\"catalog_fields\"");
    }
}
