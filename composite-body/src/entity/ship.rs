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
//! Ship entities
//!
//! A [`ShipEntity`] owns one physics body, its own copy of the connection
//! map, and the liveness of every slot in that map. All structural changes go
//! through four operations:
//!
//! - [`revive`](ShipEntity::revive) creates a fixture for a destroyed slot
//! - [`destroy`](ShipEntity::destroy) removes a fixture and resolves
//!   connectivity, splitting off every branch that lost its path to the root
//! - [`detach_for_fission`](ShipEntity::detach_for_fission) hands a slot over
//!   to a fragment without resolving anything
//! - [`sweep`](ShipEntity::sweep) destroys every fixture whose health reached
//!   zero and recomputes mass once for the whole batch
//!
//! # Invariants
//!
//! - Every slot in the fixture map is a node of the connection map.
//! - Every live slot is reachable from the root through live slots.
//! - While the entity is [`EntityState::Active`] the root has a live fixture.

use crate::blueprint::{Blueprint, ConnectionMap, RoleKind, SlotId, SlotRole};
use crate::config::FissionConfig;
use crate::effects::{DestructionEvent, EffectsSink};
use crate::entity::{EntityId, EntityState, Fixture, FixtureState};
use crate::error::FissionError;
use crate::filter::Team;
use crate::fission::{resolver, spawn, FissionContext, RootOutcome};
use crate::math::{Transform2, Vec2};
use crate::physics::{FixtureShape, PhysicsBody};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Serializable view of an entity's kinematic and structural state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    /// Entity identity
    pub id: EntityId,
    /// Team affiliation
    pub team: Option<Team>,
    /// Lifecycle state
    pub state: EntityState,
    /// Current root slot
    pub root: SlotId,
    /// World centre of mass
    pub world_center: Vec2,
    /// Orientation in radians
    pub rotation: f64,
    /// Velocity of the centre of mass
    pub linear_velocity: Vec2,
    /// Angular velocity in radians per second
    pub angular_velocity: f64,
    /// Slots with a live fixture, ascending
    pub live_slots: Vec<SlotId>,
}

/// One destructible composite body
#[derive(Debug)]
pub struct ShipEntity<B> {
    id: EntityId,
    team: Option<Team>,
    blueprint: Arc<Blueprint>,
    root: SlotId,
    connections: ConnectionMap,
    fixtures: BTreeMap<SlotId, FixtureState>,
    body: B,
    state: EntityState,
    removal_requested: bool,
    config: FissionConfig,
}

impl<B: PhysicsBody> ShipEntity<B> {
    /// Instantiate a blueprint with every slot alive
    ///
    /// The body is created empty, placed at `transform`, filled with one
    /// fixture per slot and then has its mass computed once.
    pub fn from_blueprint(
        id: EntityId,
        blueprint: Arc<Blueprint>,
        transform: Transform2,
        team: Option<Team>,
        config: FissionConfig,
    ) -> Self {
        let mut body = B::default();
        body.set_transform(transform);
        let members: Vec<_> = blueprint
            .slots()
            .iter()
            .map(|slot| (slot.id(), config.fixture_health))
            .collect();
        let connections = blueprint.connections().clone();
        let root = blueprint.root();
        ShipEntity::assemble(id, blueprint, connections, root, body, team, config, members)
    }

    /// Shared constructor for fresh entities and fragments
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        id: EntityId,
        blueprint: Arc<Blueprint>,
        connections: ConnectionMap,
        root: SlotId,
        body: B,
        team: Option<Team>,
        config: FissionConfig,
        members: Vec<(SlotId, i32)>,
    ) -> Self {
        let fixtures = connections.nodes().map(|slot| (slot, FixtureState::Destroyed)).collect();
        let mut entity = ShipEntity {
            id,
            team,
            blueprint,
            root,
            connections,
            fixtures,
            body,
            state: EntityState::Active,
            removal_requested: false,
            config,
        };

        for (slot, health) in members {
            if !entity.attach(slot, health) {
                warn!(entity = %id, slot = %slot, "slot missing from blueprint, left destroyed");
            }
        }
        entity.body.update_mass();
        if entity.live_count() == 0 {
            entity.state = EntityState::Wrecked;
        }
        entity
    }

    /// Create and register the fixture for `slot`
    ///
    /// Returns false if the slot is not part of this entity.
    fn attach(&mut self, slot: SlotId, health: i32) -> bool {
        if !self.connections.contains(slot) {
            return false;
        }
        let blueprint = Arc::clone(&self.blueprint);
        let template = match blueprint.slot(slot) {
            Some(template) => template,
            None => return false,
        };

        let filter = template.filter().with_team(self.team);
        let handle = self.body.add_fixture(FixtureShape {
            polygon: template.placed_polygon(),
            filter,
            density: template.density(),
        });
        self.fixtures
            .insert(slot, FixtureState::Alive(Fixture::new(handle, health, filter)));
        trace!(entity = %self.id, slot = %slot, handle = %handle, "fixture attached");
        true
    }

    /// Entity identity
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Team affiliation
    pub fn team(&self) -> Option<Team> {
        self.team
    }

    /// Current root slot
    pub fn root(&self) -> SlotId {
        self.root
    }

    /// Lifecycle state
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Template shared with every fragment of this entity
    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.blueprint
    }

    /// This entity's own connection map
    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    /// Tuning this entity was created with
    pub fn config(&self) -> FissionConfig {
        self.config
    }

    /// Physics body
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Mutable physics body, for the engine's own integration
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    /// Liveness of a slot, `None` if the slot is not part of this entity
    pub fn fixture_state(&self, slot: SlotId) -> Option<&FixtureState> {
        self.fixtures.get(&slot)
    }

    /// Live fixture of a slot
    pub fn fixture(&self, slot: SlotId) -> Option<&Fixture> {
        self.fixtures.get(&slot).and_then(FixtureState::fixture)
    }

    /// Check whether a slot currently has a live fixture
    pub fn is_alive(&self, slot: SlotId) -> bool {
        self.fixtures.get(&slot).map_or(false, FixtureState::is_alive)
    }

    /// Slots with a live fixture, ascending
    pub fn live_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.fixtures
            .iter()
            .filter(|(_, state)| state.is_alive())
            .map(|(slot, _)| *slot)
    }

    /// Number of live fixtures
    pub fn live_count(&self) -> usize {
        self.fixtures.values().filter(|state| state.is_alive()).count()
    }

    /// Live slots whose role is of the given kind
    pub fn live_slots_with_role(&self, kind: RoleKind) -> Vec<SlotId> {
        self.live_slots()
            .filter(|slot| {
                self.blueprint
                    .slot(*slot)
                    .map_or(false, |template| template.role().kind() == kind)
            })
            .collect()
    }

    /// Live slots with no path to the root through live slots
    ///
    /// Always empty unless an invariant has been broken.
    pub fn unreachable_live_slots(&self) -> Vec<SlotId> {
        let reachable = self.connections.reachable_from(self.root, |slot| self.is_alive(slot));
        self.live_slots().filter(|slot| !reachable.contains(slot)).collect()
    }

    /// Whether the world should drop this entity after the tick
    pub fn is_marked_for_removal(&self) -> bool {
        self.removal_requested || self.state == EntityState::Wrecked
    }

    /// Flag the entity for removal at the end of the tick
    pub fn mark_for_removal(&mut self) {
        self.removal_requested = true;
    }

    /// Change team and rewrite every live fixture filter
    pub fn set_team(&mut self, team: Option<Team>) {
        self.team = team;
        for state in self.fixtures.values_mut() {
            if let Some(fixture) = state.fixture_mut() {
                let filter = fixture.filter().with_team(team);
                fixture.set_filter(filter);
                self.body.set_fixture_filter(fixture.handle(), filter);
            }
        }
    }

    /// World pose of a slot's frame
    pub fn slot_world_transform(&self, slot: SlotId) -> Option<Transform2> {
        if !self.connections.contains(slot) {
            return None;
        }
        let template = self.blueprint.slot(slot)?;
        Some(self.body.transform().compose(&template.transform()))
    }

    /// Capture the entity's current state
    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            team: self.team,
            state: self.state,
            root: self.root,
            world_center: self.body.world_center(),
            rotation: self.body.transform().rotation.radians(),
            linear_velocity: self.body.linear_velocity(),
            angular_velocity: self.body.angular_velocity(),
            live_slots: self.live_slots().collect(),
        }
    }

    /// Push with every live thruster
    ///
    /// `local_force` is expressed in the body frame and is clamped per
    /// thruster to its maximum thrust. Returns the number of thrusters that
    /// fired.
    pub fn thrust(&mut self, local_force: Vec2) -> usize {
        let magnitude = local_force.length();
        if magnitude == 0.0 || !local_force.is_valid() {
            return 0;
        }
        let direction = self.body.transform().rotation.apply(local_force);

        let mut fired = 0;
        for slot in self.live_slots_with_role(RoleKind::Thruster) {
            let max_thrust = match self.blueprint.slot(slot).map(|t| *t.role()) {
                Some(SlotRole::Thruster { max_thrust }) => max_thrust,
                _ => continue,
            };
            let point = match self.slot_world_transform(slot) {
                Some(pose) => pose.translation,
                None => continue,
            };
            let scale = (max_thrust / magnitude).min(1.0);
            self.body.apply_force(direction * scale, point);
            fired += 1;
        }
        fired
    }

    /// Remove health from a live fixture, returning what is left
    pub fn damage(&mut self, slot: SlotId, amount: i32) -> Result<i32, FissionError> {
        let fixture = self.live_fixture_mut(slot)?;
        fixture.damage(amount);
        Ok(fixture.health())
    }

    /// Drop a live fixture's health to zero so the next sweep destroys it
    pub fn kill(&mut self, slot: SlotId) -> Result<(), FissionError> {
        self.live_fixture_mut(slot)?.kill();
        Ok(())
    }

    fn live_fixture_mut(&mut self, slot: SlotId) -> Result<&mut Fixture, FissionError> {
        let entity = self.id;
        match self.fixtures.get_mut(&slot) {
            None => Err(FissionError::UnknownSlot { entity, slot }),
            Some(state) => state
                .fixture_mut()
                .ok_or(FissionError::AlreadyDestroyed { entity, slot }),
        }
    }

    /// Recreate the fixture of a destroyed slot
    ///
    /// The slot must belong to this entity and currently be destroyed. A
    /// slot other than the root also needs a live neighbour, otherwise it
    /// would come back disconnected from the root. Mass is recomputed once.
    pub fn revive(&mut self, slot: SlotId) -> Result<(), FissionError> {
        let entity = self.id;
        match self.fixtures.get(&slot) {
            None => return Err(FissionError::UnknownSlot { entity, slot }),
            Some(FixtureState::Alive(_)) => return Err(FissionError::AlreadyAlive { entity, slot }),
            Some(FixtureState::Destroyed) => {}
        }
        if slot != self.root && !self.connections.neighbors(slot).any(|n| self.is_alive(n)) {
            return Err(FissionError::DisconnectedRevival { entity, slot });
        }

        if !self.attach(slot, self.config.fixture_health) {
            return Err(FissionError::UnknownSlot { entity, slot });
        }
        self.body.update_mass();
        if self.state == EntityState::Wrecked {
            debug!(entity = %entity, slot = %slot, "wrecked entity revived");
            self.state = EntityState::Active;
        }
        Ok(())
    }

    /// Destroy a slot's fixture and split off every branch that lost the root
    ///
    /// Fragments are staged in the context's spawn buffer and their ids are
    /// returned in discovery order. Mass is recomputed once, after all
    /// fragments have been carved out.
    pub fn destroy(&mut self, slot: SlotId, ctx: &mut FissionContext<'_, B>) -> Result<Vec<EntityId>, FissionError> {
        let fragments = self.destroy_deferred(slot, ctx)?;
        self.body.update_mass();
        Ok(fragments)
    }

    /// Hand a live slot over to a fragment
    ///
    /// Removes the fixture from the body and the slot from this entity's maps
    /// without resolving connectivity and without recomputing mass. Returns
    /// the detached fixture so its health can travel with the slot.
    pub fn detach_for_fission(&mut self, slot: SlotId) -> Result<Fixture, FissionError> {
        let fixture = self.take_live_fixture(slot)?;
        self.fixtures.remove(&slot);
        self.connections.remove_node(slot);
        trace!(entity = %self.id, slot = %slot, "slot detached for fission");
        Ok(fixture)
    }

    /// Destroy every fixture whose health reached zero
    ///
    /// Slots are processed in ascending order. A slot that has already moved
    /// to a fragment earlier in the same sweep is skipped; its fixture keeps
    /// its health and is destroyed in the fragment's own sweep. Mass is
    /// recomputed once if anything was destroyed, even when the sweep is
    /// aborted by an error.
    pub fn sweep(&mut self, ctx: &mut FissionContext<'_, B>) -> Result<usize, FissionError> {
        let doomed: Vec<SlotId> = self
            .fixtures
            .iter()
            .filter(|(_, state)| state.fixture().map_or(false, Fixture::is_marked_for_removal))
            .map(|(slot, _)| *slot)
            .collect();

        let mut destroyed = 0;
        let mut outcome = Ok(());
        for slot in doomed {
            if !self.is_alive(slot) {
                continue;
            }
            if let Err(err) = self.destroy_deferred(slot, ctx) {
                outcome = Err(err);
                break;
            }
            destroyed += 1;
        }

        if destroyed > 0 {
            self.body.update_mass();
        }
        outcome.map(|()| destroyed)
    }

    /// Mark a slot destroyed and unregister its fixture
    fn take_live_fixture(&mut self, slot: SlotId) -> Result<Fixture, FissionError> {
        let entity = self.id;
        let state = self
            .fixtures
            .get_mut(&slot)
            .ok_or(FissionError::UnknownSlot { entity, slot })?;
        let fixture = match std::mem::replace(state, FixtureState::Destroyed) {
            FixtureState::Alive(fixture) => fixture,
            FixtureState::Destroyed => return Err(FissionError::AlreadyDestroyed { entity, slot }),
        };
        if !self.body.remove_fixture(fixture.handle()) {
            warn!(entity = %entity, slot = %slot, handle = %fixture.handle(), "engine did not know fixture");
        }
        Ok(fixture)
    }

    /// Destruction without the mass recompute, so a sweep can batch it
    fn destroy_deferred(
        &mut self,
        slot: SlotId,
        ctx: &mut FissionContext<'_, B>,
    ) -> Result<Vec<EntityId>, FissionError> {
        self.take_live_fixture(slot)?;

        if let (Some(pose), Some(template)) = (self.slot_world_transform(slot), self.blueprint.slot(slot)) {
            ctx.effects.component_destroyed(DestructionEvent {
                entity: self.id,
                slot,
                role: *template.role(),
                position: pose.translation,
                velocity: self.body.velocity_at(pose.translation),
            });
        }

        let resolution = resolver::resolve(
            &self.connections,
            slot,
            self.root,
            |s| self.is_alive(s),
            self.config.root_loss,
        );
        debug!(
            entity = %self.id,
            slot = %slot,
            branches = resolution.branch_count(),
            fragments = resolution.fragments().len(),
            "component destroyed"
        );

        match resolution.root() {
            RootOutcome::Unchanged => {}
            RootOutcome::Promoted(new_root) => {
                warn!(
                    entity = %self.id,
                    lost = %slot,
                    promoted = %new_root,
                    policy = self.config.root_loss.name(),
                    "root destroyed, promoting surviving slot"
                );
                self.root = new_root;
            }
            RootOutcome::Lost => {
                warn!(
                    entity = %self.id,
                    lost = %slot,
                    policy = self.config.root_loss.name(),
                    "root destroyed, no branch keeps the entity"
                );
            }
        }

        let mut spawned = Vec::new();
        for branch in resolution.into_fragments() {
            if let Some(fragment) = self.split_off(branch.into_members(), ctx)? {
                spawned.push(fragment);
            }
        }

        if self.live_count() == 0 {
            self.wreck(ctx.effects);
        }
        debug_assert!(
            self.state == EntityState::Wrecked || self.unreachable_live_slots().is_empty(),
            "live slots left disconnected from the root"
        );
        Ok(spawned)
    }

    /// Move a branch into a new entity staged in the spawn buffer
    fn split_off(
        &mut self,
        members: BTreeSet<SlotId>,
        ctx: &mut FissionContext<'_, B>,
    ) -> Result<Option<EntityId>, FissionError> {
        if members.is_empty() {
            return Ok(None);
        }
        let sub_map = self.connections.restrict(&members);

        let mut detached = Vec::with_capacity(members.len());
        for slot in &members {
            let fixture = self.detach_for_fission(*slot)?;
            detached.push((*slot, fixture.health()));
        }

        let id = ctx.ids.allocate();
        let fragment = match spawn::spawn_fragment(self, id, sub_map, detached) {
            Some(fragment) => fragment,
            None => return Ok(None),
        };
        if self.config.log_fission_events {
            info!(
                parent = %self.id,
                fragment = %id,
                members = members.len(),
                root = %fragment.root(),
                "entity split"
            );
        }
        ctx.spawned.push(fragment);
        Ok(Some(id))
    }

    fn wreck(&mut self, effects: &mut dyn EffectsSink) {
        if self.state == EntityState::Wrecked {
            return;
        }
        self.state = EntityState::Wrecked;
        warn!(entity = %self.id, "entity wrecked, no live fixtures left");
        effects.entity_wrecked(self.id, self.body.world_center());
    }
}
