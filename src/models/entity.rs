//! Generated entity model
//!
//! Output side of the pipeline: the five entity kinds derived from
//! catalogue records, the entity reference grammar, and the annotation
//! keys every entity carries. Annotation key names are a stable
//! contract with downstream consumers; renaming one is a breaking
//! change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace used by every generated entity reference.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Annotation naming the source query endpoint that manages the entity.
pub const ANNOTATION_MANAGED_BY_LOCATION: &str = "catalogue.io/managed-by-location";

/// Annotation carrying the URL the entity was derived from.
pub const ANNOTATION_ORIGIN_URL: &str = "catalogue.io/origin-url";

/// Annotation carrying the run partition key; the sink uses it to know
/// which previously submitted entities this run's full-replace set
/// supersedes.
pub const ANNOTATION_PROVIDER: &str = "catalogue.io/provider";

/// Annotation carrying the source licence title, when the record has one.
pub const ANNOTATION_LICENSE: &str = "catalogue.io/license";

/// The five entity kinds this pipeline generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    System,
    Group,
    User,
    Component,
    Api,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            EntityKind::System => "system",
            EntityKind::Group => "group",
            EntityKind::User => "user",
            EntityKind::Component => "component",
            EntityKind::Api => "api",
        };
        write!(f, "{kind}")
    }
}

/// Globally unique entity reference of the form
/// `<kind>:default/<name>`.
///
/// Names are safe-name fragments except for users, whose name is the
/// raw lowercase email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    pub fn new(kind: EntityKind, name: &str) -> Self {
        Self(format!("{kind}:{DEFAULT_NAMESPACE}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hyperlink attached to a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityLink {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One system per catalogue organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEntity {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

/// One root group for the umbrella authority plus one group per email
/// hostname seen among contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityRef>,
    pub annotations: BTreeMap<String, String>,
}

/// One user per unique lowercase contact email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntity {
    /// Raw lowercase email; also the name part of the entity ref.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub member_of: Vec<EntityRef>,
    pub annotations: BTreeMap<String, String>,
}

/// One component per catalogue package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntity {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: EntityRef,
    pub system: EntityRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<EntityLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides_apis: Vec<EntityRef>,
    pub annotations: BTreeMap<String, String>,
}

/// One API per qualifying service resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEntity {
    pub name: String,
    pub title: String,
    pub owner: EntityRef,
    pub system: EntityRef,
    /// Either the resource URL or, for OpenAPI resources, the fetched
    /// definition body.
    pub definition: String,
    /// Source resource format, kept for collision auditing.
    pub format: String,
    pub source_resource_id: String,
    pub source_package_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

/// Any generated entity, tagged by kind for the sink payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    System(SystemEntity),
    Group(GroupEntity),
    User(UserEntity),
    Component(ComponentEntity),
    Api(ApiEntity),
}

impl Entity {
    /// Reference uniquely identifying this entity within a run.
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            Entity::System(e) => EntityRef::new(EntityKind::System, &e.name),
            Entity::Group(e) => EntityRef::new(EntityKind::Group, &e.name),
            Entity::User(e) => EntityRef::new(EntityKind::User, &e.name),
            Entity::Component(e) => EntityRef::new(EntityKind::Component, &e.name),
            Entity::Api(e) => EntityRef::new(EntityKind::Api, &e.name),
        }
    }
}
