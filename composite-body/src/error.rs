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
//! Error types
//!
//! Errors fall into two groups:
//!
//! - [`FissionError`]: internal-consistency violations raised while mutating a
//!   live entity (unknown slot, double revive, double destroy). They indicate a
//!   corrupted blueprint or a sweep ordering bug. The offending operation is
//!   aborted before any state changes, and the world skips the rest of that
//!   entity's sweep while other entities keep simulating.
//! - [`BlueprintError`] and [`ConfigError`]: rejected input data.

use crate::blueprint::SlotId;
use crate::entity::EntityId;

/// Consistency violation while mutating a live entity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FissionError {
    /// The entity is not part of the world
    #[error("{entity} is not part of the world")]
    UnknownEntity {
        /// Requested entity
        entity: EntityId,
    },
    /// The slot is not a node of the entity's connection map
    #[error("{slot} is not part of {entity}")]
    UnknownSlot {
        /// Entity the operation targeted
        entity: EntityId,
        /// Offending slot
        slot: SlotId,
    },
    /// Tried to revive a slot whose fixture is still live
    #[error("{slot} on {entity} is already alive")]
    AlreadyAlive {
        /// Entity the operation targeted
        entity: EntityId,
        /// Offending slot
        slot: SlotId,
    },
    /// Tried to destroy or detach a slot whose fixture is already gone
    #[error("{slot} on {entity} is already destroyed")]
    AlreadyDestroyed {
        /// Entity the operation targeted
        entity: EntityId,
        /// Offending slot
        slot: SlotId,
    },
    /// Reviving the slot would leave it unreachable from the root
    #[error("reviving {slot} on {entity} would leave it disconnected from the root")]
    DisconnectedRevival {
        /// Entity the operation targeted
        entity: EntityId,
        /// Offending slot
        slot: SlotId,
    },
}

/// Rejected blueprint or authoring document
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// The document is not valid JSON for the expected schema
    #[error("blueprint document could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
    /// The document's format version is not a semantic version
    #[error("blueprint format version is malformed: {0}")]
    MalformedVersion(#[from] semver::Error),
    /// The document was written for an incompatible format
    #[error("blueprint format version {found} is incompatible with supported version {supported}")]
    IncompatibleVersion {
        /// Version declared by the document
        found: String,
        /// Version understood by this crate
        supported: &'static str,
    },
    /// A blueprint needs at least one component
    #[error("blueprint has no components")]
    Empty,
    /// A component refers to a shape the library does not have
    #[error("component {component} refers to unknown shape {shape}")]
    UnknownShape {
        /// Component index in the document
        component: usize,
        /// Shape index requested
        shape: usize,
    },
    /// A shape needs at least three finite, non-collinear points
    #[error("shape for {slot} is degenerate")]
    DegenerateShape {
        /// Slot carrying the shape
        slot: SlotId,
    },
    /// An edge refers to a slot that does not exist
    #[error("connection {from} -> {to} refers to a missing slot")]
    DanglingConnection {
        /// Edge origin
        from: usize,
        /// Edge target
        to: usize,
    },
    /// A slot is connected to itself
    #[error("{slot} is connected to itself")]
    SelfConnection {
        /// Offending slot
        slot: SlotId,
    },
    /// Some slots cannot be reached from the root
    #[error("{} slot(s) are unreachable from the root", unreachable.len())]
    Disconnected {
        /// Slots with no path to the root
        unreachable: Vec<SlotId>,
    },
    /// A component parameter is zero, negative or not finite
    #[error("component {component} has invalid {field} {value}")]
    InvalidComponentValue {
        /// Component index in the document
        component: usize,
        /// Document field name
        field: &'static str,
        /// Value found
        value: f64,
    },
    /// The document's grid scale is zero, negative or not finite
    #[error("grid scale {value} must be positive and finite")]
    InvalidGridScale {
        /// Value found
        value: f64,
    },
    /// The designated root is not one of the blueprint's slots
    #[error("root {root} is not a slot of this blueprint")]
    InvalidRoot {
        /// Requested root
        root: usize,
    },
}

/// Rejected configuration value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment override could not be parsed
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// Raw value found
        value: String,
    },
    /// A setting is outside its allowed range
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        /// Setting name
        field: &'static str,
        /// Allowed range
        expected: &'static str,
        /// Value found
        value: i32,
    },
}
