use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use raidlog_application::{AppState, BroadcastHub, Metrics};
use raidlog_domain::{
    ensure_wildcards, EventLogRepository, ExplosiveTracker, ItemCatalog, OwnershipFilter,
    PolicyRepository, RaidEngine, RaidEventStore, TerritoryAdvisor, WeaponRegistry,
};
use raidlog_infrastructure::{
    default_policy_table, AppConfig, DeliveryQueue, DeliveryTiming, JsonEventLogRepository,
    PolicyFileRepository, WebhookTransport, WorldMirror,
};

pub struct AppContext {
    pub state: AppState,
    pub delivery: Arc<DeliveryQueue>,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let event_repo = Arc::new(JsonEventLogRepository::new(
            &runtime_config.event_log_path,
            &runtime_config.archive_dir,
        ));
        let policy_repo = Arc::new(PolicyFileRepository::new(
            &runtime_config.policy_table_path,
            &runtime_config.ignore_table_path,
            &runtime_config.item_catalog_path,
        ));

        let events = event_repo.load_events().await.unwrap_or_else(|err| {
            warn!("failed to load event log, starting empty: {}", err);
            Vec::new()
        });
        let stored_table = policy_repo.load_policy_table().await.unwrap_or_else(|err| {
            warn!("failed to load weapon policies, using defaults: {}", err);
            None
        });
        let seed_defaults = stored_table.is_none();
        let mut policies = match stored_table {
            Some(table) => table,
            None => default_policy_table()?,
        };
        ensure_wildcards(&mut policies);
        if seed_defaults {
            if let Err(err) = policy_repo.save_policy_table(&policies).await {
                warn!("failed to write default weapon policies: {}", err);
            }
        }
        let ignores = policy_repo.load_ignore_table().await.unwrap_or_else(|err| {
            warn!("failed to load ownership ignore table: {}", err);
            Default::default()
        });
        let catalog = policy_repo.load_catalog().await.unwrap_or_else(|err| {
            warn!("failed to load item catalog: {}", err);
            Vec::new()
        });
        info!(
            events = events.len(),
            catalog = catalog.len(),
            ignores = ignores.len(),
            "raid log tables loaded"
        );

        let engine = RaidEngine::new(
            WeaponRegistry::new(
                policies,
                ItemCatalog::new(catalog),
                runtime_config.enable_new_trackers,
            ),
            OwnershipFilter::new(runtime_config.suppression_rules(), ignores),
            ExplosiveTracker::new(runtime_config.excluded_explosives.iter().cloned()),
            RaidEventStore::from_persisted(events),
            runtime_config.wipe_on_new_world,
        );

        let delivery = match runtime_config.webhook.active_url() {
            Some(url) => {
                let transport = WebhookTransport::new(url, runtime_config.request_timeout_seconds)?;
                Arc::new(DeliveryQueue::start(
                    runtime_config.webhook.clone(),
                    DeliveryTiming::from_config(&runtime_config),
                    Arc::new(transport),
                ))
            }
            None => Arc::new(DeliveryQueue::disabled()),
        };

        let world = Arc::new(WorldMirror::new());
        let territories: Vec<Arc<dyn TerritoryAdvisor>> = vec![world.clone()];

        let state = AppState {
            config: runtime_config,
            engine: Arc::new(Mutex::new(engine)),
            event_repo,
            policy_repo,
            world: world.clone(),
            relations: world.clone(),
            territories,
            world_sync: world,
            delivery: delivery.clone(),
            broadcast_hub: Arc::new(BroadcastHub::default()),
            metrics: Arc::new(Metrics::default()),
            last_queries: Arc::new(RwLock::new(HashMap::new())),
        };

        Ok(Self { state, delivery })
    }
}
