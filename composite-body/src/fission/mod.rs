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
//! Connectivity resolution and entity fission
//!
//! - [`resolver`]: partitions what is left around a destroyed slot into
//!   branches and picks the survivor
//! - [`spawn`]: turns each excised branch into a new entity staged in a
//!   [`SpawnBuffer`]
//!
//! The sweep writes to the buffer and the caller drains it only after every
//! entity has been swept, so no sweep ever observes another entity's
//! fragments.

pub mod resolver;
pub mod spawn;

pub use resolver::{partition_branches, resolve, Branch, Resolution, RootLossPolicy, RootOutcome};
pub use spawn::SpawnBuffer;

use crate::effects::EffectsSink;
use crate::entity::EntityIdAllocator;

/// Collaborators a destruction event needs besides the entity itself
pub struct FissionContext<'a, B> {
    pub(crate) ids: &'a mut EntityIdAllocator,
    pub(crate) spawned: &'a mut SpawnBuffer<B>,
    pub(crate) effects: &'a mut dyn EffectsSink,
}

impl<'a, B> FissionContext<'a, B> {
    /// Bundle an id source, a pending-addition buffer and an effects sink
    pub fn new(
        ids: &'a mut EntityIdAllocator,
        spawned: &'a mut SpawnBuffer<B>,
        effects: &'a mut dyn EffectsSink,
    ) -> Self {
        FissionContext { ids, spawned, effects }
    }
}
