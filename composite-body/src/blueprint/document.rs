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
//! Blueprint authoring documents
//!
//! Ships are authored on a grid and stored as JSON. A document refers to
//! shapes by index into a caller supplied [`ShapeLibrary`], places each
//! component in grid units and quarter turns, and lists connections as a map
//! from component index to neighbour indices.
//!
//! ```json
//! {
//!   "format_version": "1.0.0",
//!   "name": "scout",
//!   "components": [
//!     { "shape": 0, "scale": 1.0, "position": { "x": 0, "y": 0 }, "rotation": 0, "kind": "cockpit" },
//!     { "shape": 0, "scale": 1.0, "position": { "x": 30, "y": 0 }, "rotation": 1, "kind": "thruster" }
//!   ],
//!   "connections": { "0": [1] }
//! }
//! ```
//!
//! # Format Versioning
//!
//! Documents declare the format they were written for. A document is accepted
//! when its major version matches [`BLUEPRINT_FORMAT_VERSION`] and its minor
//! version is not newer. For `0.x` formats the minor version must match
//! exactly.

use crate::blueprint::{Blueprint, BlueprintBuilder, Shape, SlotId, SlotRole};
use crate::error::BlueprintError;
use crate::math::{Rotation, Transform2, Vec2};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Blueprint document format understood by this crate
pub const BLUEPRINT_FORMAT_VERSION: &str = "1.0.0";

/// Grid cells per world unit used by the authoring tool
pub const DEFAULT_GRID_UNITS_PER_METER: f64 = 30.0;

/// Thrust given to thrusters that do not declare one
pub const DEFAULT_MAX_THRUST: f64 = 100.0;

/// Muzzle speed given to guns that do not declare one
pub const DEFAULT_PROJECTILE_SPEED: f64 = 20.0;

/// Indexed collection of shapes that documents refer to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeLibrary {
    shapes: Vec<Shape>,
}

impl ShapeLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        ShapeLibrary { shapes: Vec::new() }
    }

    /// Append a shape and return its index
    pub fn push(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    /// Look up a shape by index
    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    /// Number of shapes
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if the library has no shapes
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl FromIterator<Shape> for ShapeLibrary {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        ShapeLibrary {
            shapes: iter.into_iter().collect(),
        }
    }
}

/// Component kind as written by the authoring tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Structural hull piece
    Body,
    /// Engine
    Thruster,
    /// Weapon mount
    Gun,
    /// Pilot seat
    Cockpit,
}

/// One component entry of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Index into the shape library
    pub shape: usize,
    /// Uniform scale
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Grid position of the component
    pub position: Vec2,
    /// Orientation in quarter turns
    #[serde(default)]
    pub rotation: i32,
    /// Component kind
    pub kind: ComponentKind,
    /// Material density, when not the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Thrust override for thrusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thrust: Option<f64>,
    /// Muzzle speed override for guns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectile_speed: Option<f64>,
}

impl ComponentRecord {
    fn role(&self, index: usize) -> Result<SlotRole, BlueprintError> {
        Ok(match self.kind {
            ComponentKind::Body => SlotRole::Structural,
            ComponentKind::Thruster => SlotRole::Thruster {
                max_thrust: positive(index, "max_thrust", self.max_thrust)?.unwrap_or(DEFAULT_MAX_THRUST),
            },
            ComponentKind::Gun => SlotRole::WeaponMount {
                muzzle_offset: Vec2::new(0.0, self.scale / 2.0),
                projectile_speed: positive(index, "projectile_speed", self.projectile_speed)?
                    .unwrap_or(DEFAULT_PROJECTILE_SPEED),
            },
            ComponentKind::Cockpit => SlotRole::Cockpit,
        })
    }
}

/// Reject a present value that is not positive and finite
fn positive(component: usize, field: &'static str, value: Option<f64>) -> Result<Option<f64>, BlueprintError> {
    match value {
        Some(v) if !(v > 0.0 && v.is_finite()) => Err(BlueprintError::InvalidComponentValue {
            component,
            field,
            value: v,
        }),
        other => Ok(other),
    }
}

/// Serialized ship layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintDocument {
    /// Format the document was written for
    pub format_version: String,
    /// Template name
    pub name: String,
    /// Components in slot order
    pub components: Vec<ComponentRecord>,
    /// Adjacency lists by component index (symmetrised on load)
    #[serde(default)]
    pub connections: BTreeMap<usize, Vec<usize>>,
    /// Root component index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<usize>,
    /// Grid cells per world unit
    #[serde(default = "default_grid_units")]
    pub grid_units_per_meter: f64,
}

fn default_scale() -> f64 {
    1.0
}

fn default_grid_units() -> f64 {
    DEFAULT_GRID_UNITS_PER_METER
}

impl BlueprintDocument {
    /// Decode a document and check its format version
    pub fn from_json(json: &str) -> Result<Self, BlueprintError> {
        let document: BlueprintDocument = serde_json::from_str(json)?;
        check_format_version(&document.format_version)?;
        Ok(document)
    }

    /// Encode the document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, BlueprintError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve shapes and build a validated blueprint
    ///
    /// Positions are converted from grid units to world units and scaled by
    /// the component's scale; rotations are converted from quarter turns.
    pub fn to_blueprint(&self, library: &ShapeLibrary) -> Result<Blueprint, BlueprintError> {
        check_format_version(&self.format_version)?;

        let grid = self.grid_units_per_meter;
        if !(grid > 0.0 && grid.is_finite()) {
            return Err(BlueprintError::InvalidGridScale { value: grid });
        }

        let mut builder = BlueprintBuilder::new(self.name.clone());
        for (index, record) in self.components.iter().enumerate() {
            let shape = library.get(record.shape).ok_or(BlueprintError::UnknownShape {
                component: index,
                shape: record.shape,
            })?;
            if !(record.scale > 0.0 && record.scale.is_finite()) {
                return Err(BlueprintError::DegenerateShape {
                    slot: SlotId::new(index as u32),
                });
            }
            let transform = Transform2::new(
                record.position * (record.scale / grid),
                Rotation::from_quarter_turns(record.rotation),
            );
            let role = record.role(index)?;
            let density = positive(index, "density", record.density)?;
            let id = builder.add_slot(shape.clone(), transform, record.scale, role);
            if let Some(density) = density {
                builder.set_density(id, density);
            }
        }

        for (&from, targets) in &self.connections {
            for &to in targets {
                builder.connect_indices(from, to);
            }
        }
        if let Some(root) = self.root {
            builder.root_index(root);
        }

        builder.build()
    }

    /// Decode and build in one step, wrapping the result for sharing
    pub fn load(json: &str, library: &ShapeLibrary) -> Result<Arc<Blueprint>, BlueprintError> {
        let document = BlueprintDocument::from_json(json)?;
        Ok(Arc::new(document.to_blueprint(library)?))
    }
}

/// Check a document version against [`BLUEPRINT_FORMAT_VERSION`]
fn check_format_version(found: &str) -> Result<(), BlueprintError> {
    let document = Version::parse(found)?;
    let supported = Version::parse(BLUEPRINT_FORMAT_VERSION)?;
    if is_version_compatible(&document, &supported) {
        Ok(())
    } else {
        Err(BlueprintError::IncompatibleVersion {
            found: found.to_string(),
            supported: BLUEPRINT_FORMAT_VERSION,
        })
    }
}

fn is_version_compatible(document: &Version, supported: &Version) -> bool {
    if document.major != supported.major {
        return false;
    }
    if document.major != 0 {
        document.minor <= supported.minor
    } else {
        // 0.x minors are breaking
        document.minor == supported.minor
    }
}
