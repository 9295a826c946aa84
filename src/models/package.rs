//! Source record schema
//!
//! Typed shape of one catalogue package as returned by the CKAN-style
//! search endpoint. Deserialization of these structs *is* the
//! structural validation step: a missing field, wrong shape, or wrong
//! primitive type anywhere in the record (including nested contacts and
//! resources) rejects the whole record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One dataset record from the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CataloguePackage {
    /// Stable record id assigned by the catalogue.
    pub id: String,
    /// URL slug of the record.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Record type; only the dataset sentinel participates in aggregation.
    #[serde(rename = "type")]
    pub type_: String,
    /// Lifecycle state; only active records participate in aggregation.
    pub state: String,
    /// Owning organization, embedded in every record.
    pub organization: Organization,
    /// Contact points for the dataset.
    pub contacts: Vec<Contact>,
    /// Downloadable or service artifacts attached to the dataset.
    pub resources: Vec<Resource>,
    /// Free-form keywords.
    pub tags: Vec<PackageTag>,
    /// Date-stamped lifecycle events.
    pub dates: Vec<DateEvent>,
    /// Optional external reference links.
    #[serde(default)]
    pub more_info: Option<Vec<MoreInfoLink>>,
    #[serde(default)]
    pub license_title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub metadata_modified: Option<NaiveDateTime>,
}

/// Organization embedded in a package. Many packages share one
/// organization; the first occurrence per id is treated as canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Contact point embedded in a package. The email address is the join
/// key for deriving user entities, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One artifact attached to a package. `bcdc_type` and `format` decide
/// whether it becomes an API entity, a plain component link, or nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub format: String,
    #[serde(default)]
    pub bcdc_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Free-form keyword attached to a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageTag {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Date-stamped lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateEvent {
    pub date: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// External reference link from a package's more-info list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoreInfoLink {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource {
    /// URL of the resource, treating an empty string as absent.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}
