use chrono::Utc;
use raidlog_domain::{HostSignal, IngestSummary, Initiator, RaidError};
use tracing::{debug, error};

use crate::commands::store_commands;
use crate::notify::{self, Notification};
use crate::{AppError, AppState};

/// Applies one batch of host signals in order, then persists and fans out what it produced.
pub async fn process_host_signals(
    state: &AppState,
    signals: Vec<HostSignal>,
) -> Result<IngestSummary, AppError> {
    let signal_count = signals.len();
    let now = Utc::now();
    let mut save_requested = false;

    let (notifications, recorded, in_flight, log_size, dirty_policies, dirty_ignores) = {
        let mut engine = state.engine.lock().await;
        let collaborators = state.collaborators();
        let mut recorded = Vec::new();

        for signal in signals {
            debug!(signal = signal.kind(), "host signal");
            let outcome: Result<_, RaidError> = match signal {
                HostSignal::Spawn(spawn) => {
                    if let Some(creator) = &spawn.creator {
                        state.world_sync.observe_actor(creator);
                    }
                    engine.on_spawn(&spawn, now).map(|_| None)
                }
                HostSignal::Tick(sample) => {
                    engine.on_tick(&sample, collaborators);
                    Ok(None)
                }
                HostSignal::Despawn(despawn) => engine.on_despawn(&despawn, collaborators),
                HostSignal::Damage(damage) => {
                    if let Initiator::Player(attacker) = &damage.initiator {
                        state.world_sync.observe_actor(attacker);
                    }
                    engine.on_damage(&damage, now, collaborators)
                }
                HostSignal::ArtilleryFired {
                    launcher_position,
                    operator,
                } => {
                    engine.on_artillery_fired(launcher_position, operator);
                    Ok(None)
                }
                HostSignal::ArtilleryEnded { launcher_position } => {
                    engine.on_artillery_ended(launcher_position);
                    Ok(None)
                }
                HostSignal::WorldReset => {
                    engine.on_world_reset();
                    save_requested = true;
                    Ok(None)
                }
                HostSignal::Save => {
                    save_requested = true;
                    Ok(None)
                }
                HostSignal::Players { players, teams } => {
                    state.world_sync.observe_players(&players, &teams);
                    Ok(None)
                }
                HostSignal::Structures { upserts, removed } => {
                    state.world_sync.observe_structures(&upserts, &removed);
                    Ok(None)
                }
                HostSignal::Alliances { alliances } => {
                    state.world_sync.observe_alliances(&alliances);
                    Ok(None)
                }
                HostSignal::TerritoryDeclared(zone) => {
                    state.world_sync.declare_territory(zone);
                    Ok(None)
                }
                HostSignal::TerritoryCleared { source, zone_id } => {
                    state.world_sync.clear_territory(&source, &zone_id);
                    Ok(None)
                }
            };
            match outcome {
                Ok(Some(event)) => recorded.push(event),
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, "attribution invariant violated, signal dropped");
                    state.metrics.record_invariant_violation();
                }
            }
        }

        let notifications: Vec<Notification> = recorded
            .iter()
            .map(|event| {
                notify::compose(&engine, &state.config, state.relations.as_ref(), event)
            })
            .collect();
        (
            notifications,
            recorded.len(),
            engine.tracker().active(),
            engine.store().len(),
            engine.take_dirty_policies(),
            engine.take_dirty_ignores(),
        )
    };

    state.metrics.record_events(recorded);
    notify::dispatch(state, notifications);
    state.metrics.record_ingest(signal_count);

    store_commands::persist_tables(state, dirty_policies, dirty_ignores).await;
    if save_requested {
        // The log stays dirty, so the next housekeeping pass retries the write.
        if let Err(err) = store_commands::flush_event_log(state).await {
            error!("event log flush on save failed: {}", err);
            state.metrics.record_ingest_error();
        }
    }

    Ok(IngestSummary {
        signals: signal_count,
        recorded,
        in_flight,
        log_size,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use raidlog_domain::DeliveryService;

    use raidlog_domain::value_objects::Vec3;
    use raidlog_domain::{
        DespawnSignal, ExplosiveKind, OwnershipIgnoreEntry, OwnershipIgnoreTable, SpawnSignal,
        TickSample,
    };

    use super::*;
    use crate::test_support::{
        raider, state_with, state_with_ignores, wall, CollectingDelivery, FlatWorld,
        MemoryEvents, WALL_CLASS,
    };

    fn timed_charge(instance_id: u64, at: Vec3) -> Vec<HostSignal> {
        vec![
            HostSignal::Spawn(SpawnSignal {
                instance_id,
                identifier: "explosive.timed.deployed".to_string(),
                kind: ExplosiveKind::Timed,
                creator: Some(raider()),
                position: at,
                facing: Vec3::new(1.0, 0.0, 0.0),
                blast_radius: None,
            }),
            HostSignal::Tick(TickSample {
                instance_id,
                position: at.add(Vec3::new(-0.5, 0.0, 0.0)),
                facing: None,
                parent: None,
                armed: true,
            }),
            HostSignal::Despawn(DespawnSignal {
                instance_id,
                facing: None,
            }),
        ]
    }

    #[tokio::test]
    async fn timed_charge_is_recorded_flushed_and_enqueued() {
        let wall_at = Vec3::new(100.0, 0.0, 100.0);
        let delivery = Arc::new(CollectingDelivery::default());
        let events = Arc::new(MemoryEvents::default());
        let state = state_with(
            FlatWorld {
                structures: vec![wall(20, wall_at)],
            },
            delivery.clone(),
            events.clone(),
        );

        let mut signals = timed_charge(1, wall_at);
        signals.push(HostSignal::Save);
        let summary = process_host_signals(&state, signals).await.expect("ingest");
        assert_eq!(summary.signals, 4);
        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.in_flight, 0);
        assert_eq!(summary.log_size, 1);

        let queued = delivery.items.lock().expect("lock").clone();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].event.attacker_id, 10);
        assert_eq!(queued[0].event.victim_owner_id, 20);
        assert_eq!(queued[0].placeholders["victimName"], "B");
        assert_eq!(queued[0].placeholders["raidEventType"], "hit");
        assert_eq!(events.saved.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn own_structure_produces_nothing() {
        let wall_at = Vec3::new(100.0, 0.0, 100.0);
        let delivery = Arc::new(CollectingDelivery::default());
        let state = state_with(
            FlatWorld {
                structures: vec![wall(10, wall_at)],
            },
            delivery.clone(),
            Arc::new(MemoryEvents::default()),
        );
        let signals = vec![
            HostSignal::Spawn(SpawnSignal {
                instance_id: 2,
                identifier: "explosive.timed.deployed".to_string(),
                kind: ExplosiveKind::Timed,
                creator: Some(raider()),
                position: wall_at,
                facing: Vec3::ZERO,
                blast_radius: None,
            }),
            HostSignal::Despawn(DespawnSignal {
                instance_id: 2,
                facing: None,
            }),
        ];
        let summary = process_host_signals(&state, signals).await.expect("ingest");
        assert_eq!(summary.recorded, 0);
        assert_eq!(delivery.pending(), 0);
    }

    #[tokio::test]
    async fn failed_save_still_notifies_and_keeps_log_dirty() {
        let wall_at = Vec3::new(100.0, 0.0, 100.0);
        let delivery = Arc::new(CollectingDelivery::default());
        let state = state_with(
            FlatWorld {
                structures: vec![wall(20, wall_at)],
            },
            delivery.clone(),
            Arc::new(MemoryEvents::failing()),
        );
        let mut listener = state.broadcast_hub.subscribe();

        let mut signals = timed_charge(3, wall_at);
        signals.push(HostSignal::Save);
        let summary = process_host_signals(&state, signals).await.expect("ingest");
        assert_eq!(summary.recorded, 1);
        assert_eq!(delivery.pending(), 1);
        assert!(listener.try_recv().is_ok());
        assert!(state.engine.lock().await.store().needs_flush());
    }

    #[tokio::test]
    async fn external_only_ignore_skips_delivery_but_keeps_event() {
        let wall_at = Vec3::new(100.0, 0.0, 100.0);
        let mut ignores = OwnershipIgnoreTable::default();
        ignores.insert(
            WALL_CLASS,
            OwnershipIgnoreEntry {
                name: "Stone Wall".to_string(),
                ignore: false,
                ignore_external_only: true,
            },
        );
        let delivery = Arc::new(CollectingDelivery::default());
        let state = state_with_ignores(
            FlatWorld {
                structures: vec![wall(20, wall_at)],
            },
            delivery.clone(),
            Arc::new(MemoryEvents::default()),
            ignores,
        );
        let mut listener = state.broadcast_hub.subscribe();

        let summary = process_host_signals(&state, timed_charge(4, wall_at))
            .await
            .expect("ingest");
        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.log_size, 1);
        assert_eq!(delivery.pending(), 0);
        let message = listener.try_recv().expect("broadcast");
        assert!(!message.text.is_empty());
    }
}
