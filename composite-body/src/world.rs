// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Entity container and per-tick control flow
//!
//! A tick runs in strict phases:
//!
//! 1. (`step` only) every body integrates its accumulated forces
//! 2. every entity is swept in order; fragments go to a spawn buffer
//! 3. the spawn buffer is appended to the live list
//! 4. entities marked for removal are dropped
//!
//! A [`FissionError`] aborts the sweep of the entity that raised it only.
//! It is logged, recorded in the [`TickReport`], and the remaining entities
//! are swept as usual.

use crate::blueprint::{Blueprint, SlotId};
use crate::config::FissionConfig;
use crate::effects::{EffectsBuffer, EffectsRequest, EffectsSink};
use crate::entity::{EntityId, EntityIdAllocator, ShipEntity};
use crate::error::FissionError;
use crate::filter::Team;
use crate::fission::{FissionContext, SpawnBuffer};
use crate::math::Transform2;
use crate::physics::{PhysicsBody, RigidBody};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of sweeping a list of entities
#[derive(Debug)]
pub struct SweepOutcome<B> {
    /// Fragments created during the sweep, in creation order
    pub spawned: Vec<ShipEntity<B>>,
    /// Entities whose sweep was aborted
    pub faults: Vec<(EntityId, FissionError)>,
}

/// Sweep every entity once, staging fragments instead of inserting them
///
/// Entities are processed strictly in slice order. The returned fragments
/// must be added to the live set only after this call returns.
pub fn sweep_entities<B: PhysicsBody>(
    entities: &mut [ShipEntity<B>],
    ids: &mut EntityIdAllocator,
    effects: &mut dyn EffectsSink,
) -> SweepOutcome<B> {
    let mut buffer = SpawnBuffer::new();
    let mut faults = Vec::new();

    for entity in entities.iter_mut() {
        let mut ctx = FissionContext::new(&mut *ids, &mut buffer, &mut *effects);
        if let Err(err) = entity.sweep(&mut ctx) {
            error!(entity = %entity.id(), error = %err, "sweep aborted");
            faults.push((entity.id(), err));
        }
    }

    SweepOutcome {
        spawned: buffer.drain(),
        faults,
    }
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Fragments that joined the world
    pub spawned: Vec<EntityId>,
    /// Entities dropped from the world
    pub removed: Vec<EntityId>,
    /// Entities whose sweep was aborted
    pub faults: Vec<(EntityId, FissionError)>,
}

/// Owns every live entity of a simulation
#[derive(Debug)]
pub struct World<B = RigidBody> {
    entities: Vec<ShipEntity<B>>,
    ids: EntityIdAllocator,
    config: FissionConfig,
    effects: EffectsBuffer,
}

impl<B: PhysicsBody> World<B> {
    /// Create an empty world
    pub fn new(config: FissionConfig) -> Self {
        World {
            entities: Vec::new(),
            ids: EntityIdAllocator::new(),
            config,
            effects: EffectsBuffer::new(),
        }
    }

    /// Tuning given to every spawned entity
    pub fn config(&self) -> &FissionConfig {
        &self.config
    }

    /// Instantiate a blueprint at `transform`
    pub fn spawn(&mut self, blueprint: Arc<Blueprint>, transform: Transform2, team: Option<Team>) -> EntityId {
        let id = self.ids.allocate();
        let entity = ShipEntity::from_blueprint(id, blueprint, transform, team, self.config);
        debug!(entity = %id, slots = entity.live_count(), "entity spawned");
        self.entities.push(entity);
        id
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&ShipEntity<B>> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Look up an entity mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut ShipEntity<B>> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// Every live entity in insertion order
    pub fn entities(&self) -> &[ShipEntity<B>] {
        &self.entities
    }

    /// Mutable access to every live entity
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut ShipEntity<B>> {
        self.entities.iter_mut()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Effects queued since the last drain
    pub fn effects(&self) -> &EffectsBuffer {
        &self.effects
    }

    /// Take every queued effect
    pub fn drain_effects(&mut self) -> Vec<EffectsRequest> {
        self.effects.drain()
    }

    /// Apply contact damage for a touching fixture pair
    ///
    /// The collision filter is evaluated once for the pair. If the contact
    /// is allowed, both fixtures lose `contact_damage` health. Returns false
    /// if either fixture is missing, both belong to the same entity, or the
    /// filter rejects the pair.
    pub fn report_contact(&mut self, a: (EntityId, SlotId), b: (EntityId, SlotId)) -> bool {
        // Fixtures of one body never touch each other
        if a.0 == b.0 {
            return false;
        }
        let filter_of = |(entity, slot): (EntityId, SlotId)| {
            self.entity(entity)
                .and_then(|e| e.fixture(slot))
                .map(|f| *f.filter())
        };
        let (filter_a, filter_b) = match (filter_of(a), filter_of(b)) {
            (Some(fa), Some(fb)) => (fa, fb),
            _ => return false,
        };
        if !filter_a.is_allowed(&filter_b) {
            return false;
        }

        let damage = self.config.contact_damage;
        for (entity, slot) in [a, b] {
            if let Some(target) = self.entity_mut(entity) {
                if let Err(err) = target.damage(slot, damage) {
                    warn!(error = %err, "contact damage skipped");
                }
            }
        }
        true
    }

    /// Destroy one component right away, outside the tick sweep
    ///
    /// Fragments join the world immediately.
    pub fn destroy(&mut self, entity: EntityId, slot: SlotId) -> Result<Vec<EntityId>, FissionError> {
        let mut buffer = SpawnBuffer::new();
        let index = self
            .entities
            .iter()
            .position(|e| e.id() == entity)
            .ok_or(FissionError::UnknownEntity { entity })?;

        let target = &mut self.entities[index];
        let mut ctx = FissionContext::new(&mut self.ids, &mut buffer, &mut self.effects);
        let fragments = target.destroy(slot, &mut ctx)?;
        self.entities.extend(buffer.drain());
        Ok(fragments)
    }

    /// Sweep, add fragments, then drop entities marked for removal
    pub fn tick(&mut self) -> TickReport {
        let outcome = sweep_entities(&mut self.entities, &mut self.ids, &mut self.effects);

        let spawned: Vec<EntityId> = outcome.spawned.iter().map(ShipEntity::id).collect();
        self.entities.extend(outcome.spawned);

        let removed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.is_marked_for_removal())
            .map(ShipEntity::id)
            .collect();
        self.entities.retain(|e| !e.is_marked_for_removal());

        if !spawned.is_empty() || !removed.is_empty() {
            debug!(spawned = spawned.len(), removed = removed.len(), live = self.entities.len(), "tick complete");
        }

        TickReport {
            spawned,
            removed,
            faults: outcome.faults,
        }
    }

    /// Integrate every body by `dt` seconds, then run [`World::tick`]
    pub fn step(&mut self, dt: f64) -> TickReport {
        #[cfg(feature = "parallel")]
        {
            self.entities.par_iter_mut().for_each(|e| e.body_mut().step(dt));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for entity in &mut self.entities {
                entity.body_mut().step(dt);
            }
        }

        self.tick()
    }
}

impl<B: PhysicsBody> Default for World<B> {
    fn default() -> Self {
        World::new(FissionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{BlueprintBuilder, Shape, SlotRole};
    use crate::entity::EntityState;
    use crate::math::{Rotation, Vec2};

    fn s(i: u32) -> SlotId {
        SlotId::new(i)
    }

    /// 0 - 1 - 2 with 0 as cockpit
    fn trio() -> Arc<Blueprint> {
        let mut builder = BlueprintBuilder::new("trio");
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let role = if i == 0 { SlotRole::Cockpit } else { SlotRole::Structural };
                let pose = Transform2::new(Vec2::new(i as f64, 0.0), Rotation::identity());
                builder.add_slot(Shape::square(1.0), pose, 1.0, role)
            })
            .collect();
        builder.connect(ids[0], ids[1]).connect(ids[1], ids[2]);
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_tick_adds_fragments_after_sweep() {
        let mut world: World = World::default();
        let id = world.spawn(trio(), Transform2::identity(), None);
        world.entity_mut(id).unwrap().kill(s(1)).unwrap();

        let report = world.tick();
        assert_eq!(report.spawned.len(), 1);
        assert!(report.removed.is_empty());
        assert!(report.faults.is_empty());
        assert_eq!(world.len(), 2);

        let fragment = world.entity(report.spawned[0]).unwrap();
        assert_eq!(fragment.live_slots().collect::<Vec<_>>(), vec![s(2)]);
        assert_eq!(world.effects().len(), 1);
    }

    #[test]
    fn test_tick_removes_wrecked_and_marked() {
        let mut world: World = World::default();
        let doomed = world.spawn(trio(), Transform2::identity(), None);
        let retired = world.spawn(trio(), Transform2::identity(), None);
        let kept = world.spawn(trio(), Transform2::identity(), None);

        let entity = world.entity_mut(doomed).unwrap();
        for slot in 0..3 {
            entity.kill(s(slot)).unwrap();
        }
        world.entity_mut(retired).unwrap().mark_for_removal();

        let report = world.tick();
        assert_eq!(report.removed, vec![doomed, retired]);
        assert!(report.spawned.is_empty());
        assert_eq!(world.len(), 1);
        assert!(world.entity(kept).is_some());
        assert!(world
            .drain_effects()
            .iter()
            .any(|r| matches!(r, EffectsRequest::EntityWrecked { entity, .. } if *entity == doomed)));
    }

    #[test]
    fn test_report_contact_respects_teams() {
        let mut world: World = World::new(FissionConfig::default().with_contact_damage(10));
        let red = world.spawn(trio(), Transform2::identity(), Some(Team(1)));
        let red_wing = world.spawn(trio(), Transform2::identity(), Some(Team(1)));
        let blue = world.spawn(trio(), Transform2::identity(), Some(Team(2)));

        assert!(!world.report_contact((red, s(2)), (red_wing, s(2))));
        assert!(world.report_contact((red, s(2)), (blue, s(0))));
        assert_eq!(world.entity(red).unwrap().fixture(s(2)).unwrap().health(), 90);
        assert_eq!(world.entity(blue).unwrap().fixture(s(0)).unwrap().health(), 90);
        assert!(!world.report_contact((red, s(7)), (blue, s(0))));
    }

    #[test]
    fn test_report_contact_ignores_same_entity() {
        let mut world: World = World::new(FissionConfig::default().with_contact_damage(10));
        let id = world.spawn(trio(), Transform2::identity(), None);

        assert!(!world.report_contact((id, s(2)), (id, s(2))));
        assert!(!world.report_contact((id, s(1)), (id, s(2))));
        let entity = world.entity(id).unwrap();
        assert_eq!(entity.fixture(s(1)).unwrap().health(), 100);
        assert_eq!(entity.fixture(s(2)).unwrap().health(), 100);
    }

    #[test]
    fn test_contacts_wear_fixture_down() {
        let mut world: World = World::new(FissionConfig::new(3, Default::default()));
        let a = world.spawn(trio(), Transform2::identity(), Some(Team(1)));
        let b = world.spawn(trio(), Transform2::identity(), Some(Team(2)));
        for _ in 0..3 {
            assert!(world.report_contact((a, s(2)), (b, s(2))));
        }
        let report = world.tick();
        assert!(report.spawned.is_empty());
        assert_eq!(world.entity(a).unwrap().live_count(), 2);
        assert_eq!(world.entity(b).unwrap().live_count(), 2);
    }

    #[test]
    fn test_destroy_outside_tick() {
        let mut world: World = World::default();
        let id = world.spawn(trio(), Transform2::identity(), None);
        let fragments = world.destroy(id, s(1)).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(world.len(), 2);
        assert!(world.destroy(id, s(1)).is_err());
        assert_eq!(
            world.destroy(EntityId::new(99), s(0)),
            Err(FissionError::UnknownEntity { entity: EntityId::new(99) })
        );
    }

    #[test]
    fn test_step_moves_bodies_then_ticks() {
        let mut world: World = World::default();
        let id = world.spawn(trio(), Transform2::identity(), None);
        world
            .entity_mut(id)
            .unwrap()
            .body_mut()
            .set_linear_velocity(Vec2::new(2.0, 0.0));
        let before = world.entity(id).unwrap().body().world_center();

        let report = world.step(0.5);
        assert!(report.spawned.is_empty());
        let after = world.entity(id).unwrap().body().world_center();
        assert!((after - before - Vec2::new(1.0, 0.0)).length() < 1e-9);
        assert_eq!(world.entity(id).unwrap().state(), EntityState::Active);
    }
}
