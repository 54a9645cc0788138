use async_trait::async_trait;

use crate::entities::{
    ActorInfo, AllianceRecord, DeliveryItem, DeliveryRecord, PlayerRecord, StructureInfo,
    TeamRecord, TerritoryZone, TransportResponse,
};
use crate::value_objects::{PlayerId, Vec3};

/// Spatial questions answered by the host world.
pub trait WorldQuery: Send + Sync {
    /// Structures touched by a sphere of `radius` swept `max_distance` along `direction`.
    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
    ) -> Vec<StructureInfo>;

    fn is_visible(&self, from: Vec3, target: &StructureInfo) -> bool;
}

pub trait RelationDirectory: Send + Sync {
    fn player_name(&self, player: PlayerId) -> Option<String>;
    fn team_of(&self, player: PlayerId) -> u64;
    fn team_label(&self, team_id: u64) -> Option<String>;
    fn is_team_member(&self, team_id: u64, player: PlayerId) -> bool;
    fn is_clan_member_or_ally(&self, attacker: PlayerId, owner: PlayerId) -> bool;
}

/// Third-party event systems that protect areas from being counted as raids.
pub trait TerritoryAdvisor: Send + Sync {
    fn source(&self) -> &str;
    fn is_protected(&self, position: Vec3) -> bool;
}

/// Sink for the host's descriptive signals that keep the collaborators above current.
pub trait WorldSync: Send + Sync {
    fn observe_actor(&self, actor: &ActorInfo);
    fn observe_players(&self, players: &[PlayerRecord], teams: &[TeamRecord]);
    fn observe_structures(&self, upserts: &[StructureInfo], removed: &[u64]);
    fn observe_alliances(&self, alliances: &[AllianceRecord]);
    fn declare_territory(&self, zone: TerritoryZone);
    fn clear_territory(&self, source: &str, zone_id: &str);
}

#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn post(&self, body: &serde_json::Value) -> anyhow::Result<TransportResponse>;
}

#[async_trait]
pub trait DeliveryService: Send + Sync {
    /// Queues an item; returns false when outbound delivery is disabled.
    fn enqueue(&self, item: DeliveryItem) -> bool;
    fn pending(&self) -> usize;
    async fn list_deliveries(&self, limit: usize) -> Vec<DeliveryRecord>;
    async fn last_delivery(&self) -> Option<DeliveryRecord>;
}
