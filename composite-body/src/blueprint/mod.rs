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
//! Entity templates
//!
//! A [`Blueprint`] is the immutable description of a ship: an indexed table of
//! [`ComponentSlot`]s, the [`ConnectionMap`] joining them and the designated
//! root slot. Blueprints are validated once when built and then shared
//! read-only (behind an `Arc`) by every entity instantiated from them,
//! including fragments produced by fission.
//!
//! # Example
//!
//! ```
//! use composite_body::blueprint::{BlueprintBuilder, Shape, SlotRole};
//! use composite_body::math::{Rotation, Transform2, Vec2};
//!
//! let mut builder = BlueprintBuilder::new("dart");
//! let cockpit = builder.add_slot(Shape::square(1.0), Transform2::identity(), 1.0, SlotRole::Cockpit);
//! let wing = builder.add_slot(
//!     Shape::square(1.0),
//!     Transform2::new(Vec2::new(1.0, 0.0), Rotation::identity()),
//!     1.0,
//!     SlotRole::Structural,
//! );
//! builder.connect(cockpit, wing);
//!
//! let blueprint = builder.build().unwrap();
//! assert_eq!(blueprint.root(), cockpit);
//! assert_eq!(blueprint.slot_count(), 2);
//! ```

pub mod document;
pub mod graph;
pub mod slot;

pub use document::{BlueprintDocument, ComponentKind, ComponentRecord, ShapeLibrary, BLUEPRINT_FORMAT_VERSION};
pub use graph::ConnectionMap;
pub use slot::{ComponentSlot, RoleKind, Shape, SlotId, SlotRole};

use crate::error::BlueprintError;
use crate::filter::CollisionFilter;
use crate::math::Transform2;

/// Validated, immutable entity template
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    name: String,
    slots: Vec<ComponentSlot>,
    connections: ConnectionMap,
    root: SlotId,
}

impl Blueprint {
    /// Human readable template name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot table, indexed by [`SlotId::index`]
    pub fn slots(&self) -> &[ComponentSlot] {
        &self.slots
    }

    /// Look up a slot by id
    pub fn slot(&self, id: SlotId) -> Option<&ComponentSlot> {
        self.slots.get(id.index())
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Full connection map of the template
    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    /// Designated root slot
    pub fn root(&self) -> SlotId {
        self.root
    }
}

/// Incremental builder for [`Blueprint`]
///
/// Slots receive consecutive ids in insertion order. Nothing is validated
/// until [`BlueprintBuilder::build`].
#[derive(Debug, Clone)]
pub struct BlueprintBuilder {
    name: String,
    slots: Vec<ComponentSlot>,
    edges: Vec<(usize, usize)>,
    root: Option<usize>,
}

impl BlueprintBuilder {
    /// Start an empty blueprint
    pub fn new(name: impl Into<String>) -> Self {
        BlueprintBuilder {
            name: name.into(),
            slots: Vec::new(),
            edges: Vec::new(),
            root: None,
        }
    }

    /// Append a slot and return its id
    pub fn add_slot(&mut self, shape: Shape, transform: Transform2, scale: f64, role: SlotRole) -> SlotId {
        let id = SlotId::new(self.slots.len() as u32);
        self.slots.push(ComponentSlot::new(id, shape, transform, scale, role));
        id
    }

    /// Replace the density of an already added slot
    ///
    /// # Panics
    ///
    /// Panics if the slot was not added by this builder or the density is
    /// not positive and finite.
    pub fn set_density(&mut self, slot: SlotId, density: f64) -> &mut Self {
        self.update_slot(slot, |s| s.with_density(density))
    }

    /// Replace the collision filter of an already added slot
    ///
    /// # Panics
    ///
    /// Panics if the slot was not added by this builder.
    pub fn set_filter(&mut self, slot: SlotId, filter: CollisionFilter) -> &mut Self {
        self.update_slot(slot, |s| s.with_filter(filter))
    }

    /// Replace the render model of an already added slot
    ///
    /// # Panics
    ///
    /// Panics if the slot was not added by this builder.
    pub fn set_model(&mut self, slot: SlotId, model: usize) -> &mut Self {
        self.update_slot(slot, |s| s.with_model(model))
    }

    fn update_slot<F>(&mut self, slot: SlotId, update: F) -> &mut Self
    where
        F: FnOnce(ComponentSlot) -> ComponentSlot,
    {
        assert!(slot.index() < self.slots.len(), "Slot was not added to this builder");
        let current = self.slots[slot.index()].clone();
        self.slots[slot.index()] = update(current);
        self
    }

    /// Join two slots (symmetric)
    pub fn connect(&mut self, a: SlotId, b: SlotId) -> &mut Self {
        self.edges.push((a.index(), b.index()));
        self
    }

    /// Join two slots by raw index, as read from authoring data
    pub fn connect_indices(&mut self, a: usize, b: usize) -> &mut Self {
        self.edges.push((a, b));
        self
    }

    /// Designate the root slot
    ///
    /// Defaults to the first cockpit, or slot 0 when there is none.
    pub fn root(&mut self, root: SlotId) -> &mut Self {
        self.root = Some(root.index());
        self
    }

    /// Designate the root slot by raw index
    pub fn root_index(&mut self, root: usize) -> &mut Self {
        self.root = Some(root);
        self
    }

    /// Number of slots added so far
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Validate and freeze the blueprint
    ///
    /// Fails if there are no slots, a shape is degenerate, an edge is
    /// dangling or a self-connection, the root is out of range, or any slot
    /// is unreachable from the root.
    pub fn build(&self) -> Result<Blueprint, BlueprintError> {
        if self.slots.is_empty() {
            return Err(BlueprintError::Empty);
        }

        for slot in &self.slots {
            if Shape::polygon(slot.shape().points().to_vec()).is_none() {
                return Err(BlueprintError::DegenerateShape { slot: slot.id() });
            }
        }

        let mut connections = ConnectionMap::new();
        for slot in &self.slots {
            connections.add_node(slot.id());
        }
        for &(from, to) in &self.edges {
            if from >= self.slots.len() || to >= self.slots.len() {
                return Err(BlueprintError::DanglingConnection { from, to });
            }
            if !connections.connect(SlotId::new(from as u32), SlotId::new(to as u32)) {
                return Err(BlueprintError::SelfConnection {
                    slot: SlotId::new(from as u32),
                });
            }
        }

        let root = match self.root {
            Some(root) if root < self.slots.len() => SlotId::new(root as u32),
            Some(root) => return Err(BlueprintError::InvalidRoot { root }),
            None => self
                .slots
                .iter()
                .find(|s| matches!(s.role(), SlotRole::Cockpit))
                .map_or(SlotId::new(0), ComponentSlot::id),
        };

        let reachable = connections.reachable_from(root, |_| true);
        if reachable.len() != self.slots.len() {
            let unreachable = connections.nodes().filter(|s| !reachable.contains(s)).collect();
            return Err(BlueprintError::Disconnected { unreachable });
        }

        Ok(Blueprint {
            name: self.name.clone(),
            slots: self.slots.clone(),
            connections,
            root,
        })
    }
}
