//! Command line interface.

use std::path::PathBuf;

use clap::Parser;
use search_sync_pipeline::{BulkSyncSummary, SyncError};
use search_sync_shared::EntityType;
use tracing::{error, info, warn};

use crate::config::Dependencies;
use crate::store::{EntityLocation, NdjsonRecordSource};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "search-sync")]
#[command(about = "Rebuild search indexes from tracked records", long_about = None)]
pub struct Cli {
    /// Entity types to resync, e.g. `User` or `App/Models/User`
    pub entity_types: Vec<String>,

    /// Namespace prefixes tried for every entity type
    #[arg(long = "namespace", short = 'n')]
    pub namespaces: Vec<String>,

    /// Prepared NDJSON bulk files sent as they are
    #[arg(long = "resource", short = 'r')]
    pub resources: Vec<PathBuf>,

    /// Settings file layered over `search-sync.toml`
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding `<storage>.ndjson` record files
    #[arg(long, default_value = ".")]
    pub records_dir: PathBuf,
}

impl Cli {
    /// Entity types to try for `name`: the name itself, then the name under
    /// each namespace.
    pub fn candidates(&self, name: &str) -> Vec<EntityType> {
        let bare = EntityType::new(name);
        let mut candidates = vec![bare.clone()];
        for namespace in &self.namespaces {
            let qualified = bare.qualify(namespace);
            if !candidates.contains(&qualified) {
                candidates.push(qualified);
            }
        }
        candidates
    }
}

/// Outcome of one CLI run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub resynced: Vec<BulkSyncSummary>,
    pub ingested: Vec<PathBuf>,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, message: String) {
        error!("{}", message);
        self.failures.push(message);
    }
}

/// Resync every resolved entity type, then ingest every resource.
///
/// Failures are collected and do not stop the remaining work.
pub async fn run(cli: &Cli, deps: &Dependencies) -> RunReport {
    let mut report = RunReport::default();

    for name in &cli.entity_types {
        let locations: Vec<EntityLocation> = cli
            .candidates(name)
            .iter()
            .filter_map(|candidate| EntityLocation::resolve(&deps.settings, candidate, &cli.records_dir))
            .collect();

        if locations.is_empty() {
            report.fail(format!("Entity type {} not found", name));
            continue;
        }

        for location in locations {
            info!(entity_type = %location.entity_type, "Start sync");
            match resync(deps, &location).await {
                Ok(summary) => {
                    info!(entity_type = %location.entity_type, index = %summary.index, "Sync done");
                    report.resynced.push(summary);
                }
                Err(e) => report.fail(format!("Sync for {} failed: {}", location.entity_type, e)),
            }
        }
    }

    for resource in &cli.resources {
        match deps.orchestrator.ingest_resource(resource).await {
            Ok(response) => {
                if response.bulk_failures() > 0 {
                    warn!(path = %resource.display(), "Resource ingested with failed items");
                }
                report.ingested.push(resource.clone());
            }
            Err(e) => report.fail(format!("Resource {} failed: {}", resource.display(), e)),
        }
    }

    report
}

async fn resync(deps: &Dependencies, location: &EntityLocation) -> Result<BulkSyncSummary, SyncError> {
    let source = NdjsonRecordSource::open(location).await?;
    deps.orchestrator.resync(&source).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_sync_repository::{Method, SearchClient, SearchError, SearchRequest, SearchResponse};
    use search_sync_shared::{EntitySettings, SyncSettings};
    use std::fs;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockSearchClient {
        requests: Mutex<Vec<SearchRequest>>,
    }

    #[async_trait]
    impl SearchClient for MockSearchClient {
        async fn send(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
            self.requests.lock().await.push(request);
            Ok(SearchResponse::new(200, "{}"))
        }
    }

    fn deps(settings: SyncSettings) -> (Dependencies, Arc<MockSearchClient>) {
        let client = Arc::new(MockSearchClient {
            requests: Mutex::new(Vec::new()),
        });
        let deps = Dependencies::new(settings).with_default_client(client.clone());
        (deps, client)
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from([
            "search-sync",
            "User",
            "Post",
            "--namespace",
            "App/Models",
            "--resource",
            "seed.ndjson",
            "--records-dir",
            "/data",
        ]);
        assert_eq!(cli.entity_types, vec!["User", "Post"]);
        assert_eq!(cli.namespaces, vec!["App/Models"]);
        assert_eq!(cli.resources, vec![PathBuf::from("seed.ndjson")]);
        assert_eq!(cli.records_dir, PathBuf::from("/data"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_candidates_normalize_namespaces() {
        let cli = Cli {
            namespaces: vec!["App/Models".to_string(), "App\\Models\\".to_string()],
            ..Cli::default()
        };
        let candidates: Vec<String> = cli
            .candidates("User")
            .iter()
            .map(|ty| ty.as_str().to_string())
            .collect();
        assert_eq!(candidates, vec!["User", "App\\Models\\User"]);
    }

    #[tokio::test]
    async fn test_run_resyncs_catalogued_types() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("users.ndjson"),
            "{\"id\":1,\"name\":\"a\"}\n{\"id\":2,\"name\":\"b\"}\n",
        )
        .unwrap();

        let mut settings = SyncSettings::default();
        settings.entities.insert(
            "App\\Models\\User".to_string(),
            EntitySettings {
                storage: Some("users".to_string()),
                records: None,
            },
        );
        let (deps, client) = deps(settings);

        let cli = Cli {
            entity_types: vec!["User".to_string(), "Missing".to_string()],
            namespaces: vec!["App/Models".to_string()],
            records_dir: dir.path().to_path_buf(),
            ..Cli::default()
        };

        let report = run(&cli, &deps).await;
        assert_eq!(report.resynced.len(), 1);
        assert_eq!(report.resynced[0].documents, 2);
        assert_eq!(report.failures, vec!["Entity type Missing not found".to_string()]);

        let requests = client.requests.lock().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].path, "/users");
        assert_eq!(requests[1].path, "/_bulk");
    }

    #[tokio::test]
    async fn test_run_continues_after_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("seed.ndjson");
        fs::write(&present, "{\"index\":{\"_index\":\"users\",\"_id\":\"1\"}}\n{\"id\":1}\n").unwrap();
        let (deps, client) = deps(SyncSettings::default());

        let cli = Cli {
            resources: vec![dir.path().join("absent.ndjson"), present.clone()],
            ..Cli::default()
        };

        let report = run(&cli, &deps).await;
        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.ingested, vec![present]);
        assert_eq!(client.requests.lock().await.len(), 1);
    }
}
