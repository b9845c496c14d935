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
//! Physics engine seam
//!
//! Rigid-body simulation (collision detection, constraint solving, force
//! integration) is an external collaborator. This module defines the narrow
//! interface the destruction code needs from it: fixtures in, fixtures out,
//! mass recompute on demand, and read/write access to pose and velocity.
//!
//! [`RigidBody`] is a small reference implementation used by the tests, the
//! benchmarks and the demo.
//!
//! # Frames
//!
//! A body's [`transform`](PhysicsBody::transform) places its local origin in
//! the world. Fixture polygons are given in that local frame, which is the
//! frame blueprint slots are laid out in. The centre of mass is a local point
//! that moves when fixtures are added or removed and mass is recomputed; the
//! transform itself does not move, so surviving fixtures stay put in world
//! space.

pub mod rigid_body;

pub use rigid_body::RigidBody;

use crate::filter::CollisionFilter;
use crate::math::{Transform2, Vec2};
use std::fmt;

/// Engine-side handle of one collision shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureHandle(u64);

impl FixtureHandle {
    /// Create a handle from a raw engine value
    pub fn new(raw: u64) -> Self {
        FixtureHandle(raw)
    }

    /// Raw engine value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FixtureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixture({})", self.0)
    }
}

/// Everything the engine needs to create a collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureShape {
    /// Convex polygon in body-local coordinates
    pub polygon: Vec<Vec2>,
    /// Collision filter for the engine's broad phase
    pub filter: CollisionFilter,
    /// Material density
    pub density: f64,
}

/// Result of a mass recompute
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassData {
    /// Total mass
    pub mass: f64,
    /// Moment of inertia about the centre of mass
    pub inertia: f64,
    /// Centre of mass in body-local coordinates
    pub center: Vec2,
}

impl MassData {
    /// Check if the body has no mass (no fixtures)
    pub fn is_empty(&self) -> bool {
        self.mass <= 0.0
    }

    /// Inverse mass, zero for massless bodies
    pub fn inverse_mass(&self) -> f64 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inverse inertia, zero for bodies that cannot rotate
    pub fn inverse_inertia(&self) -> f64 {
        if self.inertia > 0.0 {
            1.0 / self.inertia
        } else {
            0.0
        }
    }
}

/// One simulated rigid body as seen by the destruction subsystem
///
/// `Default` must produce an empty body (no fixtures, identity pose, at rest)
/// that belongs to the same simulation; fission uses it to create fragment
/// bodies.
pub trait PhysicsBody: Default + Send {
    /// Register a collision shape
    fn add_fixture(&mut self, shape: FixtureShape) -> FixtureHandle;

    /// Unregister a collision shape, returning false if it was unknown
    fn remove_fixture(&mut self, handle: FixtureHandle) -> bool;

    /// Replace the collision filter of a registered shape
    fn set_fixture_filter(&mut self, handle: FixtureHandle, filter: CollisionFilter) -> bool;

    /// Number of registered shapes
    fn fixture_count(&self) -> usize;

    /// Recompute mass, inertia and centre of mass from the current shapes
    fn update_mass(&mut self);

    /// Result of the last mass recompute
    fn mass(&self) -> MassData;

    /// Pose of the body's local origin in the world
    fn transform(&self) -> Transform2;

    /// Move the body's local origin
    fn set_transform(&mut self, transform: Transform2);

    /// Centre of mass in local coordinates
    fn local_center(&self) -> Vec2 {
        self.mass().center
    }

    /// Centre of mass in world coordinates
    fn world_center(&self) -> Vec2 {
        self.transform().apply(self.local_center())
    }

    /// Velocity of the centre of mass
    fn linear_velocity(&self) -> Vec2;

    /// Set the velocity of the centre of mass
    fn set_linear_velocity(&mut self, velocity: Vec2);

    /// Angular velocity in radians per second
    fn angular_velocity(&self) -> f64;

    /// Set the angular velocity
    fn set_angular_velocity(&mut self, omega: f64);

    /// Velocity of a world point attached to the body
    fn velocity_at(&self, point: Vec2) -> Vec2 {
        self.linear_velocity() + (point - self.world_center()).perp_scaled(self.angular_velocity())
    }

    /// Accumulate a force acting at a world point
    fn apply_force(&mut self, force: Vec2, point: Vec2);

    /// Apply an instantaneous impulse at a world point
    fn apply_impulse(&mut self, impulse: Vec2, point: Vec2);

    /// Accumulate a torque
    fn apply_torque(&mut self, torque: f64);

    /// Advance the body by `dt` seconds
    ///
    /// Engines that integrate bodies themselves can leave this as a no-op.
    fn step(&mut self, _dt: f64) {}
}
