//! Models module for the SDK
//!
//! Defines the typed shape of one source catalogue record and the
//! entity graph derived from it. The source structs double as the
//! declarative validation schema: a record that does not deserialize
//! into [`CataloguePackage`] is structurally invalid.

pub mod entity;
pub mod package;

pub use entity::{
    ANNOTATION_LICENSE, ANNOTATION_MANAGED_BY_LOCATION, ANNOTATION_ORIGIN_URL,
    ANNOTATION_PROVIDER, ApiEntity, ComponentEntity, DEFAULT_NAMESPACE, Entity, EntityKind,
    EntityLink, EntityRef, GroupEntity, SystemEntity, UserEntity,
};
pub use package::{
    CataloguePackage, Contact, DateEvent, MoreInfoLink, Organization, PackageTag, Resource,
};
