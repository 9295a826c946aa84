//! End-to-end pipeline tests against an in-memory sink

use async_trait::async_trait;
use catalogue_sync_sdk::config::ProviderConfig;
use catalogue_sync_sdk::fetch::{ContentFetcher, FetchError};
use catalogue_sync_sdk::provider::{CatalogueProvider, SyncError};
use catalogue_sync_sdk::sink::InMemorySink;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "script exhausted".to_string(),
                })
            })
    }
}

fn record(name: &str, type_: &str, state: &str) -> Value {
    json!({
        "id": format!("pkg-{name}"),
        "name": name,
        "title": name,
        "type": type_,
        "state": state,
        "organization": {
            "id": "org-1",
            "name": "Transportation",
            "title": "Ministry of Transportation"
        },
        "contacts": [{"email": "steward@gov.example.ca", "name": "Steward"}],
        "resources": [
            {
                "id": format!("res-{name}"),
                "name": "Roads WMS",
                "format": "wms",
                "bcdc_type": "webservice",
                "url": "https://maps.gov.example.ca/wms"
            }
        ],
        "tags": [{"name": "transportation"}],
        "dates": [{"date": "2021-03-01", "type": "Created"}]
    })
}

fn page_of(records: Vec<Value>) -> Result<Vec<u8>, FetchError> {
    let body = json!({"success": true, "result": {"results": records}});
    Ok(serde_json::to_vec(&body).unwrap())
}

fn config() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://cat.example/search".to_string(),
        environment: "test".to_string(),
        allowed_hosts: vec!["maps.gov.example.ca".to_string()],
        authority: "Data Custodians".to_string(),
    }
}

mod run_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_run_applies_one_batch() {
        let fetcher = ScriptedFetcher::new(vec![
            page_of(vec![
                record("roads", "bcdc_dataset", "active"),
                record("bridges", "bcdc_dataset", "active"),
            ]),
            page_of(vec![]),
        ]);
        let provider = CatalogueProvider::new(config(), fetcher, InMemorySink::new());

        let stats = provider.run().await.unwrap();
        assert_eq!(stats.packages_seen, 2);
        assert_eq!(stats.packages_eligible, 2);
        assert!(stats.entities_emitted > 0);
    }

    #[tokio::test]
    async fn test_batch_carries_partition_key_and_unique_refs() {
        let fetcher = ScriptedFetcher::new(vec![
            page_of(vec![
                record("roads", "bcdc_dataset", "active"),
                record("bridges", "bcdc_dataset", "active"),
            ]),
            page_of(vec![]),
        ]);
        let sink = std::sync::Arc::new(InMemorySink::new());
        let provider = CatalogueProvider::new(config(), fetcher, sink.clone());

        provider.run().await.unwrap();

        let batch = sink.last_batch().expect("one batch applied");
        assert_eq!(batch.provider_name, "catalogue-test");
        let mut refs = HashSet::new();
        for entity in &batch.entities {
            assert!(
                refs.insert(entity.entity_ref()),
                "duplicate ref {}",
                entity.entity_ref()
            );
        }
    }

    #[tokio::test]
    async fn test_ineligible_packages_are_dropped_quietly() {
        let fetcher = ScriptedFetcher::new(vec![
            page_of(vec![
                record("roads", "bcdc_dataset", "active"),
                record("draft", "bcdc_dataset", "draft"),
                record("webapp", "bcdc_application", "active"),
            ]),
            page_of(vec![]),
        ]);
        let sink = std::sync::Arc::new(InMemorySink::new());
        let provider = CatalogueProvider::new(config(), fetcher, sink.clone());

        let stats = provider.run().await.unwrap();
        assert_eq!(stats.packages_seen, 3);
        assert_eq!(stats.packages_eligible, 1);

        let batch = sink.last_batch().unwrap();
        let components = batch
            .entities
            .iter()
            .filter(|e| e.entity_ref().as_str().starts_with("component:"))
            .count();
        assert_eq!(components, 1);
    }
}

mod abort_tests {
    use super::*;

    fn transport_error() -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Transport {
            url: "scripted".to_string(),
            message: "connection refused".to_string(),
        })
    }

    #[tokio::test]
    async fn test_exhausted_page_budget_never_touches_the_sink() {
        let fetcher =
            ScriptedFetcher::new(vec![transport_error(), transport_error(), transport_error()]);
        let sink = std::sync::Arc::new(InMemorySink::new());
        let provider = CatalogueProvider::new(config(), fetcher, sink.clone());

        let err = provider.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)));
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn test_schema_violation_aborts_before_the_sink() {
        let mut bad = record("roads", "bcdc_dataset", "active");
        bad.as_object_mut().unwrap().remove("organization");
        let fetcher = ScriptedFetcher::new(vec![
            page_of(vec![record("bridges", "bcdc_dataset", "active"), bad]),
            page_of(vec![]),
        ]);
        let sink = std::sync::Arc::new(InMemorySink::new());
        let provider = CatalogueProvider::new(config(), fetcher, sink.clone());

        let err = provider.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(sink.batches().is_empty());
    }
}
