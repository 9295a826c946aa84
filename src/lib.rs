//! Catalogue Sync SDK - CKAN-style catalogue to entity graph
//!
//! Ingests paginated records from a government open-data catalogue and
//! derives a normalized graph of typed entities with globally unique,
//! filesystem/DNS-safe identifiers:
//! - organizations become systems
//! - contacts become users and email-hostname groups
//! - datasets become components
//! - service-like resources become APIs
//!
//! The crate owns the transformation and identifier-uniqueness
//! pipeline: record validation, multi-pass aggregation, and collision
//! resolution between generated API names. Scheduling, transport, and
//! the entity store sit behind the [`fetch::ContentFetcher`] and
//! [`sink::EntitySink`] seams.

pub mod aggregate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod naming;
pub mod provider;
pub mod sink;
pub mod validation;

// Re-export commonly used types
pub use aggregate::{AggregatedEntities, EntityAggregator};
pub use config::ProviderConfig;
pub use fetch::{ContentFetcher, FetchError, HttpFetcher, fetch_all_packages};
pub use models::{
    ApiEntity, CataloguePackage, ComponentEntity, Entity, EntityKind, EntityRef, GroupEntity,
    SystemEntity, UserEntity,
};
pub use naming::{distinguishing_suffix, to_safe_name};
pub use provider::{CatalogueProvider, RunStats, SyncError};
pub use sink::{EntitySink, FullReplaceBatch, InMemorySink, SinkError};
pub use validation::{ValidationError, is_eligible, validate_package};
