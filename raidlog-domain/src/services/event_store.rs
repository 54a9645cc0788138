use chrono::{DateTime, Utc};

use crate::entities::{IndexedEvent, RaidEvent};
use crate::error::RaidError;
use crate::value_objects::{EventIndex, Vec3};

/// Append-only log of raid events.
///
/// Appends keep existing indices valid. Every removal bumps the generation, so indices issued
/// earlier fail with [`RaidError::StaleIndex`] instead of addressing a different record.
#[derive(Debug, Default)]
pub struct RaidEventStore {
    events: Vec<RaidEvent>,
    generation: u64,
    flushed: Option<(usize, u64)>,
}

impl RaidEventStore {
    /// Store seeded from persisted records, considered already flushed.
    pub fn from_persisted(events: Vec<RaidEvent>) -> Self {
        let flushed = Some((events.len(), 0));
        Self {
            events,
            generation: 0,
            flushed,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RaidEvent] {
        &self.events
    }

    pub fn append(&mut self, event: RaidEvent) -> EventIndex {
        self.events.push(event);
        EventIndex {
            position: self.events.len() - 1,
            generation: self.generation,
        }
    }

    pub fn query_by_index(&self, index: EventIndex) -> Result<&RaidEvent, RaidError> {
        if index.generation != self.generation {
            return Err(RaidError::StaleIndex {
                index,
                current: self.generation,
            });
        }
        self.events
            .get(index.position)
            .ok_or(RaidError::IndexNotFound {
                position: index.position,
                len: self.events.len(),
            })
    }

    pub fn query_by_radius(&self, point: Vec3, radius: f32) -> Vec<IndexedEvent> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.is_near(point, radius))
            .map(|(position, event)| IndexedEvent {
                index: self.index_at(position),
                event: event.clone(),
            })
            .collect()
    }

    /// Removes matching records and hands them back in log order.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<RaidEvent>
    where
        F: FnMut(&RaidEvent) -> bool,
    {
        let (removed, kept): (Vec<RaidEvent>, Vec<RaidEvent>) =
            self.events.drain(..).partition(|event| predicate(event));
        self.events = kept;
        if !removed.is_empty() {
            self.generation += 1;
        }
        removed
    }

    pub fn delete_where<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&RaidEvent) -> bool,
    {
        self.remove_where(predicate).len()
    }

    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        self.delete_where(|event| event.timestamp < cutoff)
    }

    pub fn wipe_all(&mut self) -> usize {
        let removed = self.events.len();
        self.events.clear();
        self.generation += 1;
        removed
    }

    /// True when the record count or the generation moved since the last flush.
    pub fn needs_flush(&self) -> bool {
        self.flushed != Some((self.events.len(), self.generation))
    }

    pub fn mark_flushed(&mut self) {
        self.flushed = Some((self.events.len(), self.generation));
    }

    fn index_at(&self, position: usize) -> EventIndex {
        EventIndex {
            position,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TargetDescriptor, WeaponDescriptor, WeaponRef};
    use crate::value_objects::{EventOutcome, TrackerCategory};
    use chrono::Duration;

    fn event(attacker_id: u64, at: Vec3, timestamp: DateTime<Utc>) -> RaidEvent {
        RaidEvent {
            attacker_id,
            attacker_name: format!("player{}", attacker_id),
            attacker_team_id: 0,
            victim_owner_id: 99,
            weapon: WeaponDescriptor::single(WeaponRef::new(
                "explosive.timed.deployed",
                TrackerCategory::EntityCollision,
            )),
            outcome: EventOutcome::Hit,
            target: TargetDescriptor::new("wall", None),
            origin: at,
            target_position: at.add(Vec3::new(1.0, 0.0, 0.0)),
            timestamp,
        }
    }

    #[test]
    fn append_then_query_by_index_returns_same_record() {
        let mut store = RaidEventStore::default();
        let first = event(1, Vec3::ZERO, Utc::now());
        let index = store.append(first.clone());
        assert_eq!(store.query_by_index(index).expect("record"), &first);
        let second = store.append(event(2, Vec3::ZERO, Utc::now()));
        assert_eq!(second.position, 1);
        assert!(store.query_by_index(index).is_ok());
    }

    #[test]
    fn mutations_invalidate_earlier_indices() {
        let mut store = RaidEventStore::default();
        let index = store.append(event(1, Vec3::ZERO, Utc::now()));
        store.append(event(2, Vec3::ZERO, Utc::now()));
        assert_eq!(store.delete_where(|event| event.attacker_id == 2), 1);
        assert!(matches!(
            store.query_by_index(index),
            Err(RaidError::StaleIndex { .. })
        ));
        let fresh = store.query_by_radius(Vec3::ZERO, 10.0)[0].index;
        assert_eq!(
            store.query_by_index(EventIndex {
                position: 5,
                generation: fresh.generation
            }),
            Err(RaidError::IndexNotFound { position: 5, len: 1 })
        );
    }

    #[test]
    fn radius_query_matches_origin_or_target_strictly() {
        let mut store = RaidEventStore::default();
        store.append(event(1, Vec3::new(10.0, 0.0, 0.0), Utc::now()));
        store.append(event(2, Vec3::new(100.0, 0.0, 0.0), Utc::now()));
        let hits = store.query_by_radius(Vec3::ZERO, 50.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event.attacker_id, 1);
        assert!(store.query_by_radius(Vec3::ZERO, 10.0).is_empty());
    }

    #[test]
    fn wipe_then_append_still_works() {
        let mut store = RaidEventStore::default();
        store.append(event(1, Vec3::ZERO, Utc::now()));
        assert_eq!(store.wipe_all(), 1);
        assert!(store.query_by_radius(Vec3::ZERO, 10_000.0).is_empty());
        let index = store.append(event(2, Vec3::ZERO, Utc::now()));
        assert_eq!(store.query_by_index(index).expect("record").attacker_id, 2);
    }

    #[test]
    fn prune_drops_only_old_records() {
        let now = Utc::now();
        let mut store = RaidEventStore::default();
        store.append(event(1, Vec3::ZERO, now - Duration::days(8)));
        store.append(event(2, Vec3::ZERO, now - Duration::hours(1)));
        assert_eq!(store.prune_older_than(now - Duration::days(7)), 1);
        assert_eq!(store.events()[0].attacker_id, 2);
    }

    #[test]
    fn flush_is_skipped_when_nothing_changed() {
        let mut store = RaidEventStore::from_persisted(vec![event(1, Vec3::ZERO, Utc::now())]);
        assert!(!store.needs_flush());
        store.append(event(2, Vec3::ZERO, Utc::now()));
        assert!(store.needs_flush());
        store.mark_flushed();
        assert!(!store.needs_flush());

        store.delete_where(|event| event.attacker_id == 2);
        store.append(event(3, Vec3::ZERO, Utc::now()));
        assert!(store.needs_flush());
    }
}
