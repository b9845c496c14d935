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
//! # Composite Body
//!
//! Destructible rigid bodies assembled from a graph of components.
//!
//! A [`Blueprint`] describes the components of a ship and which of them are
//! welded together. A [`ShipEntity`] instantiates it as one rigid body with
//! one collision fixture per component. When a component is destroyed the
//! entity works out which components lost their path to the root and turns
//! each disconnected branch into a new entity that inherits the parent's
//! pose and velocity.
//!
//! ## Features
//!
//! - **Blueprints**: validated component graphs, loadable from versioned JSON
//! - **Connectivity resolution**: deterministic branch discovery with
//!   configurable root-loss handling
//! - **Fission**: fragments staged in a spawn buffer and added after the sweep
//! - **Batched mass updates**: one mass recompute per entity per sweep
//! - **Parallelization**: optional Rayon integration for body integration
//!
//! ## Example
//!
//! ```rust
//! use composite_body::blueprint::{BlueprintBuilder, Shape, SlotId, SlotRole};
//! use composite_body::math::{Rotation, Transform2, Vec2};
//! use composite_body::World;
//! use std::sync::Arc;
//!
//! let mut builder = BlueprintBuilder::new("barge");
//! let slots: Vec<SlotId> = (0..3)
//!     .map(|i| {
//!         let pose = Transform2::new(Vec2::new(i as f64, 0.0), Rotation::identity());
//!         builder.add_slot(Shape::square(1.0), pose, 1.0, SlotRole::Structural)
//!     })
//!     .collect();
//! builder.connect(slots[0], slots[1]).connect(slots[1], slots[2]);
//! let blueprint = Arc::new(builder.build().unwrap());
//!
//! let mut world: World = World::default();
//! let ship = world.spawn(blueprint, Transform2::identity(), None);
//! world.entity_mut(ship).unwrap().kill(slots[1]).unwrap();
//!
//! let report = world.tick();
//! assert_eq!(report.spawned.len(), 1);
//! assert_eq!(world.len(), 2);
//! ```

#![warn(missing_docs)]

/// Component templates and their connection graph
pub mod blueprint;

/// Fission tuning and environment overrides
pub mod config;

/// Destruction side-effect hooks
pub mod effects;

/// Live entities and their fixtures
pub mod entity;

/// Error types
pub mod error;

/// Collision categories and team filtering
pub mod filter;

/// Connectivity resolution and fragment spawning
pub mod fission;

/// Planar vectors, rotations and transforms
pub mod math;

/// Physics engine seam and the bundled rigid body
pub mod physics;

/// Entity container and tick loop
pub mod world;

pub use blueprint::{Blueprint, BlueprintBuilder, BlueprintDocument, SlotId};
pub use config::FissionConfig;
pub use entity::{EntityId, ShipEntity};
pub use error::{BlueprintError, FissionError};
pub use fission::RootLossPolicy;
pub use physics::{PhysicsBody, RigidBody};
pub use world::{TickReport, World};
