//! Entity aggregation
//!
//! Consumes the validated package stream and builds the five entity
//! collections: systems from organizations, users and groups from
//! contacts, components from packages, and APIs from service-like
//! resources. The aggregator is the sole owner of its collections for
//! the duration of one run and is handed off immutably afterward.
//!
//! API identifier uniqueness is enforced here, before insert, against
//! an in-run registry. Collision resolution depends on insertion order
//! (page order, then resource order within a package): only the first
//! claimant of a base name keeps the un-suffixed form, and a reordered
//! upstream can swap which entity that is between runs. That is an
//! inherited property of the source catalogue, not a bug to fix.

use crate::config::ProviderConfig;
use crate::fetch::ContentFetcher;
use crate::models::{
    ANNOTATION_LICENSE, ANNOTATION_MANAGED_BY_LOCATION, ANNOTATION_ORIGIN_URL,
    ANNOTATION_PROVIDER, ApiEntity, CataloguePackage, ComponentEntity, Entity, EntityKind,
    EntityLink, EntityRef, GroupEntity, Resource, SystemEntity, UserEntity,
};
use crate::naming::{MAX_SAFE_NAME_LEN, distinguishing_suffix, to_safe_name};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Resource type that marks a service endpoint.
pub const RESOURCE_TYPE_WEBSERVICE: &str = "webservice";

/// Resource type for map layers; skipped entirely when they carry no URL.
pub const RESOURCE_TYPE_GEOGRAPHIC: &str = "geographic";

/// Format whose definition body is fetched and embedded.
pub const FORMAT_OPENAPI_JSON: &str = "openapi-json";

/// Format excluded from API generation even on webservice resources.
pub const FORMAT_KML: &str = "kml";

/// Formats that qualify a resource as an API regardless of its type.
const REST_LIKE_FORMATS: &[&str] = &["arcgis_rest", FORMAT_OPENAPI_JSON];

/// Formats whose API name is derived from the owning component rather
/// than the resource name, and therefore needs disambiguation.
const DISAMBIGUATED_FORMATS: &[&str] = &[FORMAT_OPENAPI_JSON, "arcgis_rest", "wms", "wfs"];

/// Builds the entity collections for one run.
pub struct EntityAggregator<'a> {
    config: &'a ProviderConfig,
    /// Systems keyed by source organization id; first occurrence wins.
    systems: BTreeMap<String, SystemEntity>,
    /// Users keyed by lowercase email.
    users: BTreeMap<String, UserEntity>,
    /// Groups keyed by entity ref.
    groups: BTreeMap<EntityRef, GroupEntity>,
    /// Components keyed by entity ref.
    components: BTreeMap<EntityRef, ComponentEntity>,
    /// APIs keyed by entity ref; doubles as the collision registry.
    apis: BTreeMap<EntityRef, ApiEntity>,
    root_group: EntityRef,
}

/// Immutable hand-off of one run's collections.
#[derive(Debug)]
pub struct AggregatedEntities {
    pub systems: Vec<SystemEntity>,
    pub groups: Vec<GroupEntity>,
    pub users: Vec<UserEntity>,
    pub components: Vec<ComponentEntity>,
    pub apis: Vec<ApiEntity>,
}

impl AggregatedEntities {
    /// Total number of entities across all collections.
    pub fn len(&self) -> usize {
        self.systems.len()
            + self.groups.len()
            + self.users.len()
            + self.components.len()
            + self.apis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the sink payload shape.
    pub fn into_entities(self) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(self.len());
        entities.extend(self.systems.into_iter().map(Entity::System));
        entities.extend(self.groups.into_iter().map(Entity::Group));
        entities.extend(self.users.into_iter().map(Entity::User));
        entities.extend(self.components.into_iter().map(Entity::Component));
        entities.extend(self.apis.into_iter().map(Entity::Api));
        entities
    }
}

impl<'a> EntityAggregator<'a> {
    pub fn new(config: &'a ProviderConfig) -> Self {
        let root_name = to_safe_name(&config.authority);
        let root_group = EntityRef::new(EntityKind::Group, &root_name);
        let mut groups = BTreeMap::new();
        groups.insert(
            root_group.clone(),
            GroupEntity {
                name: root_name,
                parent: None,
                annotations: base_annotations(config),
            },
        );
        Self {
            config,
            systems: BTreeMap::new(),
            users: BTreeMap::new(),
            groups,
            components: BTreeMap::new(),
            apis: BTreeMap::new(),
            root_group,
        }
    }

    /// Fold one eligible package into the collections.
    ///
    /// The fetcher is only used for best-effort OpenAPI definition
    /// retrieval; its failures degrade, never abort.
    pub async fn add_package(&mut self, package: &CataloguePackage, fetcher: &dyn ContentFetcher) {
        let system_ref = self.add_organization(package);
        self.add_contacts(package);

        let component_name = to_safe_name(&package.name);
        let component_ref = EntityRef::new(EntityKind::Component, &component_name);

        let mut links: Vec<EntityLink> = package
            .more_info
            .iter()
            .flatten()
            .map(|info| EntityLink {
                url: info.url.clone(),
                title: info.description.clone(),
            })
            .collect();
        let mut provides_apis = Vec::new();

        for resource in &package.resources {
            if resource.bcdc_type.as_deref() == Some(RESOURCE_TYPE_GEOGRAPHIC)
                && resource.url().is_none()
            {
                debug!(
                    package = %package.name,
                    resource = %resource.name,
                    "skipping geographic resource without a URL"
                );
                continue;
            }

            if is_api_resource(resource) {
                let api_ref = self
                    .add_api(package, resource, &component_name, &system_ref, fetcher)
                    .await;
                provides_apis.push(api_ref);
            } else if let Some(url) = resource.url() {
                links.push(EntityLink {
                    url: url.to_string(),
                    title: Some(resource.name.clone()),
                });
            }
        }

        let mut annotations = base_annotations(self.config);
        annotations.insert(ANNOTATION_ORIGIN_URL.to_string(), self.config.base_url.clone());
        if let Some(license) = &package.license_title {
            annotations.insert(ANNOTATION_LICENSE.to_string(), license.clone());
        }

        self.components.insert(
            component_ref,
            ComponentEntity {
                name: component_name,
                title: package.title.clone(),
                description: package.notes.clone(),
                owner: self.root_group.clone(),
                system: system_ref,
                links,
                tags: package
                    .tags
                    .iter()
                    .map(|t| to_safe_name(&t.name))
                    .filter(|t| !t.is_empty())
                    .collect(),
                provides_apis,
                annotations,
            },
        );
    }

    /// Finish the run and hand the collections off.
    pub fn finish(self) -> AggregatedEntities {
        AggregatedEntities {
            systems: self.systems.into_values().collect(),
            groups: self.groups.into_values().collect(),
            users: self.users.into_values().collect(),
            components: self.components.into_values().collect(),
            apis: self.apis.into_values().collect(),
        }
    }

    /// Deduplicate organizations by id; the first occurrence's fields
    /// are canonical for the run.
    fn add_organization(&mut self, package: &CataloguePackage) -> EntityRef {
        let org = &package.organization;
        let entry = self.systems.entry(org.id.clone()).or_insert_with(|| {
            SystemEntity {
                name: to_safe_name(&org.name),
                title: org.title.clone(),
                description: org.description.clone(),
                annotations: base_annotations(self.config),
            }
        });
        EntityRef::new(EntityKind::System, &entry.name)
    }

    /// Derive users and hostname groups from the package contacts.
    fn add_contacts(&mut self, package: &CataloguePackage) {
        for contact in &package.contacts {
            let email = contact.email.trim().to_lowercase();
            if email.is_empty() {
                continue;
            }

            let group_ref = email.split_once('@').and_then(|(_, host)| {
                let group_name = to_safe_name(host);
                if group_name.is_empty() {
                    return None;
                }
                let group_ref = EntityRef::new(EntityKind::Group, &group_name);
                self.groups
                    .entry(group_ref.clone())
                    .or_insert_with(|| GroupEntity {
                        name: group_name,
                        parent: Some(self.root_group.clone()),
                        annotations: base_annotations(self.config),
                    });
                Some(group_ref)
            });

            let user = self.users.entry(email.clone()).or_insert_with(|| UserEntity {
                name: email.clone(),
                display_name: None,
                member_of: Vec::new(),
                annotations: base_annotations(self.config),
            });
            if user.display_name.is_none() {
                user.display_name = contact.name.clone();
            }
            if let Some(group_ref) = group_ref
                && !user.member_of.contains(&group_ref)
            {
                user.member_of.push(group_ref);
            }
        }
    }

    /// Build one API entity from a qualifying resource, resolving any
    /// name collision before insert.
    async fn add_api(
        &mut self,
        package: &CataloguePackage,
        resource: &Resource,
        component_name: &str,
        system_ref: &EntityRef,
        fetcher: &dyn ContentFetcher,
    ) -> EntityRef {
        let format = resource.format.to_lowercase();
        let base = if DISAMBIGUATED_FORMATS.contains(&format.as_str()) {
            let prefix = if format == FORMAT_OPENAPI_JSON {
                "api"
            } else {
                format.as_str()
            };
            to_safe_name(&format!("{prefix}-{component_name}"))
        } else {
            to_safe_name(&resource.name)
        };

        let name = self.resolve_api_name(&base, package, resource, &format);
        let api_ref = EntityRef::new(EntityKind::Api, &name);

        if let Some(url) = resource.url() {
            self.check_host_allowlist(url, &name);
        }

        let definition = resolve_definition(resource, &format, fetcher).await;

        let mut annotations = base_annotations(self.config);
        if let Some(url) = resource.url() {
            annotations.insert(ANNOTATION_ORIGIN_URL.to_string(), url.to_string());
        }

        self.apis.insert(
            api_ref.clone(),
            ApiEntity {
                name,
                title: resource.name.clone(),
                owner: self.root_group.clone(),
                system: system_ref.clone(),
                definition,
                format,
                source_resource_id: resource.id.clone(),
                source_package_id: package.id.clone(),
                source_url: resource.url().map(str::to_string),
                annotations,
            },
        );
        api_ref
    }

    /// Resolve a unique API name from the base candidate.
    ///
    /// First claimant keeps the base name. A collision appends the
    /// distinguishing suffix of the incoming resource name, truncating
    /// the base so the result stays within the length budget; if that
    /// still collides, a numeric counter joins the suffix as the
    /// reserved tail and the base is re-truncated from scratch, so the
    /// suffix survives intact near the budget. Every collision is
    /// logged with both sides' metadata before the slot is claimed.
    fn resolve_api_name(
        &self,
        base: &str,
        package: &CataloguePackage,
        resource: &Resource,
        format: &str,
    ) -> String {
        if !self.contains_api(base) {
            return base.to_string();
        }

        self.log_collision(base, package, resource, format);

        let suffix = distinguishing_suffix(&resource.name);
        let suffixed = append_within_budget(base, &suffix);
        if !self.contains_api(&suffixed) {
            return suffixed;
        }

        let mut counter = 1u32;
        loop {
            let candidate = append_within_budget(base, &format!("{suffix}-{counter}"));
            if !self.contains_api(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn contains_api(&self, name: &str) -> bool {
        self.apis
            .contains_key(&EntityRef::new(EntityKind::Api, name))
    }

    fn log_collision(
        &self,
        base: &str,
        package: &CataloguePackage,
        resource: &Resource,
        format: &str,
    ) {
        let existing = self.apis.get(&EntityRef::new(EntityKind::Api, base));
        let (existing_format, existing_resource, existing_package, existing_url) = existing
            .map(|api| {
                (
                    api.format.clone(),
                    api.source_resource_id.clone(),
                    api.source_package_id.clone(),
                    api.source_url.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();
        warn!(
            name = %base,
            existing_format = %existing_format,
            existing_resource = %existing_resource,
            existing_package = %existing_package,
            existing_url = %existing_url,
            incoming_format = %format,
            incoming_resource = %resource.id,
            incoming_package = %package.id,
            incoming_url = resource.url().unwrap_or_default(),
            "API name collision, disambiguating incoming entity"
        );
    }

    /// Warn when an API definition URL points at a host outside the
    /// configured allowlist. The entity is still emitted.
    fn check_host_allowlist(&self, url: &str, api_name: &str) {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        match host {
            Some(host) if self.config.is_allowed_host(&host) => {}
            Some(host) => {
                warn!(api = %api_name, %host, "API definition host is not in the allowlist");
            }
            None => {
                warn!(api = %api_name, %url, "API definition URL has no parseable host");
            }
        }
    }
}

/// Definition body for the API: the resource URL, except for OpenAPI
/// resources where the content behind the URL is fetched best-effort
/// and the URL is the fallback.
async fn resolve_definition(
    resource: &Resource,
    format: &str,
    fetcher: &dyn ContentFetcher,
) -> String {
    let Some(url) = resource.url() else {
        return String::new();
    };

    if format != FORMAT_OPENAPI_JSON {
        return url.to_string();
    }

    match fetcher.fetch(url).await {
        Ok(body) => match String::from_utf8(body) {
            Ok(text) => text,
            Err(_) => {
                warn!(%url, "OpenAPI definition is not valid UTF-8, storing the URL instead");
                url.to_string()
            }
        },
        Err(err) => {
            warn!(%url, "failed to fetch OpenAPI definition, storing the URL instead: {err}");
            url.to_string()
        }
    }
}

/// Decide whether a resource becomes an API entity: webservice-typed
/// non-KML resources, or any resource with a REST/OpenAPI format.
fn is_api_resource(resource: &Resource) -> bool {
    let format = resource.format.to_lowercase();
    if resource.bcdc_type.as_deref() == Some(RESOURCE_TYPE_WEBSERVICE) && format != FORMAT_KML {
        return true;
    }
    REST_LIKE_FORMATS.contains(&format.as_str())
}

/// Join `base` and `suffix` with a hyphen, truncating `base` so the
/// whole normalized result stays within the name length budget.
fn append_within_budget(base: &str, suffix: &str) -> String {
    let reserved = suffix.len() + 1;
    let keep = MAX_SAFE_NAME_LEN
        .saturating_sub(reserved)
        .min(base.len());
    let head = base[..keep].trim_end_matches(['-', '_', '.']);
    to_safe_name(&format!("{head}-{suffix}"))
}

fn base_annotations(config: &ProviderConfig) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    annotations.insert(
        ANNOTATION_MANAGED_BY_LOCATION.to_string(),
        config.base_url.clone(),
    );
    annotations.insert(ANNOTATION_PROVIDER.to_string(), config.provider_name());
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_within_budget_respects_limit() {
        let base = "a".repeat(MAX_SAFE_NAME_LEN);
        let joined = append_within_budget(&base, "2023");
        assert!(joined.len() <= MAX_SAFE_NAME_LEN);
        assert!(joined.ends_with("-2023"));
    }

    #[test]
    fn short_names_keep_their_suffix_whole() {
        assert_eq!(append_within_budget("api-roads", "2023"), "api-roads-2023");
    }

    #[test]
    fn counter_tail_truncates_the_base_not_the_suffix() {
        let base = "a".repeat(MAX_SAFE_NAME_LEN);
        let joined = append_within_budget(&base, "2023-1");
        assert!(joined.len() <= MAX_SAFE_NAME_LEN);
        assert!(joined.ends_with("-2023-1"));
    }
}
