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
//! Fragment materialisation
//!
//! A fragment is a new entity built from the same blueprint as its parent,
//! restricted to the branch's slots. Its body starts at the parent's pose:
//! the parent's origin is recovered by translating by the parent's world
//! centre and rotating by its orientation, then the fragment's own mass
//! recompute moves its centre of mass onto its components. Linear and
//! angular velocity are copied unchanged.

use crate::blueprint::{ConnectionMap, SlotId};
use crate::entity::{EntityId, ShipEntity};
use crate::math::Transform2;
use crate::physics::PhysicsBody;
use std::sync::Arc;

/// Entities created during a sweep, waiting to join the world
#[derive(Debug)]
pub struct SpawnBuffer<B> {
    pending: Vec<ShipEntity<B>>,
}

impl<B> SpawnBuffer<B> {
    /// Create an empty buffer
    pub fn new() -> Self {
        SpawnBuffer { pending: Vec::new() }
    }

    pub(crate) fn push(&mut self, entity: ShipEntity<B>) {
        self.pending.push(entity);
    }

    /// Staged entities in creation order
    pub fn iter(&self) -> impl Iterator<Item = &ShipEntity<B>> {
        self.pending.iter()
    }

    /// Number of staged entities
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every staged entity
    pub fn drain(&mut self) -> Vec<ShipEntity<B>> {
        std::mem::take(&mut self.pending)
    }
}

impl<B> Default for SpawnBuffer<B> {
    fn default() -> Self {
        SpawnBuffer::new()
    }
}

/// Build a fragment entity from slots already detached from `parent`
///
/// `members` pairs each slot with the health its detached fixture had.
/// Returns `None` for an empty fragment.
pub(crate) fn spawn_fragment<B: PhysicsBody>(
    parent: &ShipEntity<B>,
    id: EntityId,
    connections: ConnectionMap,
    members: Vec<(SlotId, i32)>,
) -> Option<ShipEntity<B>> {
    let root = members.iter().map(|(slot, _)| *slot).min()?;

    let source = parent.body();
    let rotation = source.transform().rotation;
    let origin = source.world_center() - rotation.apply(source.local_center());

    let mut body = B::default();
    body.set_transform(Transform2::new(origin, rotation));
    body.set_linear_velocity(source.linear_velocity());
    body.set_angular_velocity(source.angular_velocity());

    Some(ShipEntity::assemble(
        id,
        Arc::clone(parent.blueprint()),
        connections,
        root,
        body,
        parent.team(),
        parent.config(),
        members,
    ))
}
