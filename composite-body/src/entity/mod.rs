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
//! Live entities
//!
//! An entity is one simulated body built from a blueprint. Identities come
//! from a monotonic counter and are never reused, so a fragment can always be
//! told apart from its parent and from any entity that existed before it.

pub mod fixture;
pub mod ship;

pub use fixture::{Fixture, FixtureState};
pub use ship::{BodySnapshot, ShipEntity};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a ship or fragment within a world
///
/// Ids order by allocation, so a fragment always sorts after its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap an allocation counter value
    ///
    /// Worlds hand out ids through [`EntityIdAllocator`]; this is for
    /// tests and for restoring saved snapshots.
    pub fn new(counter: u64) -> Self {
        EntityId(counter)
    }

    /// Allocation counter value this id was made from
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Source of fresh entity identities
#[derive(Debug, Clone, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    /// Create an allocator starting at zero
    pub fn new() -> Self {
        EntityIdAllocator { next: 0 }
    }

    /// Hand out the next identity
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next);
        self.next += 1;
        id
    }

    /// Number of identities handed out so far
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

/// Lifecycle state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityState {
    /// At least the root carries a live fixture
    #[default]
    Active,
    /// No live fixture is left; the entity waits to be swept from the world
    Wrecked,
}
