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
//! Component slots
//!
//! A slot is the immutable template for one attachable part. Live entities
//! never mutate slots; they only decide whether each slot currently has a
//! fixture.

use crate::filter::CollisionFilter;
use crate::math::{Transform2, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a slot in its blueprint's slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Create a slot id from a raw index
    pub const fn new(index: u32) -> Self {
        SlotId(index)
    }

    /// Raw index value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Index into the slot table
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

/// Behavioural role of a slot
///
/// Roles never influence structure; they select what a live component can
/// do (push, shoot, pilot) and how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SlotRole {
    /// Plain hull plating
    Structural,
    /// Engine that can push the body
    Thruster {
        /// Force applied at full throttle, in Newtons
        max_thrust: f64,
    },
    /// Gun hardpoint
    WeaponMount {
        /// Projectile spawn point relative to the slot
        muzzle_offset: Vec2,
        /// Muzzle speed of fired projectiles
        projectile_speed: f64,
    },
    /// Pilot seat, the usual root of a ship
    Cockpit,
}

impl SlotRole {
    /// Fieldless discriminant, handy for filtering
    pub fn kind(&self) -> RoleKind {
        match self {
            SlotRole::Structural => RoleKind::Structural,
            SlotRole::Thruster { .. } => RoleKind::Thruster,
            SlotRole::WeaponMount { .. } => RoleKind::WeaponMount,
            SlotRole::Cockpit => RoleKind::Cockpit,
        }
    }
}

/// Discriminant of [`SlotRole`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    /// See [`SlotRole::Structural`]
    Structural,
    /// See [`SlotRole::Thruster`]
    Thruster,
    /// See [`SlotRole::WeaponMount`]
    WeaponMount,
    /// See [`SlotRole::Cockpit`]
    Cockpit,
}

/// Convex polygon in model space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    points: Vec<Vec2>,
}

impl Shape {
    const MIN_AREA: f64 = 1e-12;

    /// Create a shape from counter-clockwise or clockwise points
    ///
    /// Returns `None` for fewer than three points, non-finite points, or a
    /// polygon with (near) zero area.
    pub fn polygon(points: Vec<Vec2>) -> Option<Self> {
        if points.len() < 3 || points.iter().any(|p| !p.is_valid()) {
            return None;
        }
        let shape = Shape { points };
        if shape.signed_area().abs() < Self::MIN_AREA {
            return None;
        }
        Some(shape)
    }

    /// Axis-aligned square of the given side length centred on the origin
    pub fn square(side: f64) -> Self {
        let h = side / 2.0;
        Shape {
            points: vec![
                Vec2::new(-h, -h),
                Vec2::new(h, -h),
                Vec2::new(h, h),
                Vec2::new(-h, h),
            ],
        }
    }

    /// Model-space vertices
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Signed area (positive for counter-clockwise winding)
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }
}

/// Signed area of a closed polygon (shoelace formula)
pub(crate) fn signed_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    let mut twice = 0.0;
    for i in 0..n {
        twice += points[i].cross(points[(i + 1) % n]);
    }
    twice / 2.0
}

/// Immutable description of one attachable part
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSlot {
    id: SlotId,
    model: usize,
    shape: Shape,
    transform: Transform2,
    scale: f64,
    density: f64,
    filter: CollisionFilter,
    role: SlotRole,
}

impl ComponentSlot {
    /// Default density used when none is given
    pub const DEFAULT_DENSITY: f64 = 1.0;

    /// Create a slot
    ///
    /// # Panics
    ///
    /// Panics if `scale` or `density` is not positive and finite.
    pub fn new(id: SlotId, shape: Shape, transform: Transform2, scale: f64, role: SlotRole) -> Self {
        assert!(scale > 0.0 && scale.is_finite(), "Slot scale must be positive and finite");
        ComponentSlot {
            id,
            model: 0,
            shape,
            transform,
            scale,
            density: Self::DEFAULT_DENSITY,
            filter: CollisionFilter::default(),
            role,
        }
    }

    /// Set the render model reference
    pub fn with_model(mut self, model: usize) -> Self {
        self.model = model;
        self
    }

    /// Set the material density
    ///
    /// # Panics
    ///
    /// Panics if `density` is not positive and finite.
    pub fn with_density(mut self, density: f64) -> Self {
        assert!(density > 0.0 && density.is_finite(), "Slot density must be positive and finite");
        self.density = density;
        self
    }

    /// Set the collision category and mask
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Identity within the owning blueprint
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Render model reference
    pub fn model(&self) -> usize {
        self.model
    }

    /// Model-space shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Placement within the blueprint frame
    pub fn transform(&self) -> Transform2 {
        self.transform
    }

    /// Uniform scale applied to the shape before placement
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Material density
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Template collision filter (team is filled in per entity)
    pub fn filter(&self) -> CollisionFilter {
        self.filter
    }

    /// Behavioural role
    pub fn role(&self) -> &SlotRole {
        &self.role
    }

    /// Shape vertices placed in the blueprint frame
    ///
    /// Scale first, then rotate, then translate.
    pub fn placed_polygon(&self) -> Vec<Vec2> {
        self.shape
            .points()
            .iter()
            .map(|p| self.transform.apply(*p * self.scale))
            .collect()
    }
}
