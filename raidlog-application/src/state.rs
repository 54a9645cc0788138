use std::collections::HashMap;
use std::sync::Arc;

use raidlog_domain::ports::{
    DeliveryService, EventLogRepository, PolicyRepository, RelationDirectory, TerritoryAdvisor,
    WorldQuery, WorldSync,
};
use raidlog_domain::services::{Collaborators, RaidEngine};
use raidlog_domain::{QueryRequest, RuntimeConfig};
use tokio::sync::{Mutex, RwLock};

use crate::{BroadcastHub, Metrics};

/// Operators remembered for "repeat last"; the least recently saved one is evicted past this.
pub const MAX_REMEMBERED_QUERIES: usize = 256;

#[derive(Debug, Clone)]
pub struct RememberedQuery {
    pub request: QueryRequest,
    /// Save order, higher is newer.
    pub sequence: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub engine: Arc<Mutex<RaidEngine>>,
    pub event_repo: Arc<dyn EventLogRepository>,
    pub policy_repo: Arc<dyn PolicyRepository>,
    pub world: Arc<dyn WorldQuery>,
    pub relations: Arc<dyn RelationDirectory>,
    pub territories: Vec<Arc<dyn TerritoryAdvisor>>,
    pub world_sync: Arc<dyn WorldSync>,
    pub delivery: Arc<dyn DeliveryService>,
    pub broadcast_hub: Arc<BroadcastHub>,
    pub metrics: Arc<Metrics>,
    /// Last radius query per operator key, for "repeat last".
    pub last_queries: Arc<RwLock<HashMap<String, RememberedQuery>>>,
}

impl AppState {
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            world: self.world.as_ref(),
            relations: self.relations.as_ref(),
            territories: &self.territories,
        }
    }
}
