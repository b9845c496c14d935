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
//! On-destruction hooks
//!
//! Decorative consequences of destruction (debris particles, explosions,
//! sounds) belong to the host. The destruction code only reports what
//! happened through an [`EffectsSink`].

use crate::blueprint::{SlotId, SlotRole};
use crate::entity::EntityId;
use crate::math::Vec2;

/// A component lost its fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestructionEvent {
    /// Entity that owned the component
    pub entity: EntityId,
    /// Destroyed slot
    pub slot: SlotId,
    /// Role of the destroyed slot
    pub role: SlotRole,
    /// World position of the slot origin
    pub position: Vec2,
    /// World velocity of that point at the moment of destruction
    pub velocity: Vec2,
}

/// Receiver of destruction side effects
pub trait EffectsSink {
    /// Called once per destroyed component, before connectivity is resolved
    fn component_destroyed(&mut self, event: DestructionEvent);

    /// Called when an entity loses its last fixture
    fn entity_wrecked(&mut self, _entity: EntityId, _position: Vec2) {}
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEffects;

impl EffectsSink for NullEffects {
    fn component_destroyed(&mut self, _event: DestructionEvent) {}
}

/// Effect the host should play
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectsRequest {
    /// Debris for one component
    ComponentDestroyed(DestructionEvent),
    /// Final explosion of a wrecked entity
    EntityWrecked {
        /// Wrecked entity
        entity: EntityId,
        /// Last world centre of the entity
        position: Vec2,
    },
}

/// Sink that queues requests for the host to drain after the tick
#[derive(Debug, Clone, Default)]
pub struct EffectsBuffer {
    requests: Vec<EffectsRequest>,
}

impl EffectsBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        EffectsBuffer { requests: Vec::new() }
    }

    /// Queued requests in emission order
    pub fn requests(&self) -> &[EffectsRequest] {
        &self.requests
    }

    /// Take every queued request
    pub fn drain(&mut self) -> Vec<EffectsRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl EffectsSink for EffectsBuffer {
    fn component_destroyed(&mut self, event: DestructionEvent) {
        self.requests.push(EffectsRequest::ComponentDestroyed(event));
    }

    fn entity_wrecked(&mut self, entity: EntityId, position: Vec2) {
        self.requests.push(EffectsRequest::EntityWrecked { entity, position });
    }
}
