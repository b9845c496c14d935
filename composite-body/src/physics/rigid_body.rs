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
//! Reference rigid body
//!
//! A minimal 2D body that keeps its fixtures in a list, computes mass
//! properties from polygon geometry, and integrates accumulated forces with
//! semi-implicit Euler:
//!
//! ```text
//! v' = v + (F / m) * dt
//! w' = w + (T / I) * dt
//! c' = c + v' * dt
//! a' = a + w' * dt
//! ```
//!
//! where `c` is the world centre of mass and `a` the orientation. Rotation
//! happens about the centre of mass.

use crate::blueprint::slot::signed_area;
use crate::filter::CollisionFilter;
use crate::math::{Rotation, Transform2, Vec2};
use crate::physics::{FixtureHandle, FixtureShape, MassData, PhysicsBody};

/// Simple polygon rigid body
#[derive(Debug, Clone, Default)]
pub struct RigidBody {
    fixtures: Vec<(FixtureHandle, FixtureShape)>,
    next_handle: u64,
    transform: Transform2,
    mass: MassData,
    linear_velocity: Vec2,
    angular_velocity: f64,
    force: Vec2,
    torque: f64,
    mass_updates: usize,
}

impl RigidBody {
    /// Create an empty body at rest at the given pose
    pub fn new(transform: Transform2) -> Self {
        RigidBody {
            transform,
            ..RigidBody::default()
        }
    }

    /// How many times mass has been recomputed
    pub fn mass_update_count(&self) -> usize {
        self.mass_updates
    }

    /// Registered shapes
    pub fn fixtures(&self) -> impl Iterator<Item = (FixtureHandle, &FixtureShape)> {
        self.fixtures.iter().map(|(h, s)| (*h, s))
    }

    /// Look up a registered shape
    pub fn fixture(&self, handle: FixtureHandle) -> Option<&FixtureShape> {
        self.fixtures.iter().find(|(h, _)| *h == handle).map(|(_, s)| s)
    }

    /// Accumulated force waiting for the next step
    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    /// Accumulated torque waiting for the next step
    pub fn pending_torque(&self) -> f64 {
        self.torque
    }
}

/// Area, centroid and polar second moment (about the local origin) of a polygon
fn polygon_properties(points: &[Vec2]) -> (f64, Vec2, f64) {
    let area = signed_area(points);
    if area == 0.0 {
        return (0.0, Vec2::zero(), 0.0);
    }

    let n = points.len();
    let mut centroid = Vec2::zero();
    let mut second_moment = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.cross(q);
        centroid += (p + q) * cross;
        second_moment += cross * (p.dot(p) + p.dot(q) + q.dot(q));
    }
    centroid = centroid * (1.0 / (6.0 * area));
    // Signed area in the centroid and signum here keep both winding-independent
    let polar = second_moment / 12.0 * area.signum();
    (area.abs(), centroid, polar)
}

impl PhysicsBody for RigidBody {
    fn add_fixture(&mut self, shape: FixtureShape) -> FixtureHandle {
        let handle = FixtureHandle::new(self.next_handle);
        self.next_handle += 1;
        self.fixtures.push((handle, shape));
        handle
    }

    fn remove_fixture(&mut self, handle: FixtureHandle) -> bool {
        match self.fixtures.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                self.fixtures.remove(index);
                true
            }
            None => false,
        }
    }

    fn set_fixture_filter(&mut self, handle: FixtureHandle, filter: CollisionFilter) -> bool {
        match self.fixtures.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, shape)) => {
                shape.filter = filter;
                true
            }
            None => false,
        }
    }

    fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    fn update_mass(&mut self) {
        self.mass_updates += 1;

        let mut mass = 0.0;
        let mut weighted_center = Vec2::zero();
        let mut origin_inertia = 0.0;
        for (_, shape) in &self.fixtures {
            let (area, centroid, polar) = polygon_properties(&shape.polygon);
            let m = area * shape.density;
            mass += m;
            weighted_center += centroid * m;
            origin_inertia += polar * shape.density;
        }

        self.mass = if mass > 0.0 {
            let center = weighted_center * (1.0 / mass);
            // Parallel axis theorem moves the inertia to the centre of mass
            MassData {
                mass,
                inertia: (origin_inertia - mass * center.length_squared()).max(0.0),
                center,
            }
        } else {
            MassData::default()
        };
    }

    fn mass(&self) -> MassData {
        self.mass
    }

    fn transform(&self) -> Transform2 {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform2) {
        self.transform = transform;
    }

    fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, omega: f64) {
        self.angular_velocity = omega;
    }

    fn apply_force(&mut self, force: Vec2, point: Vec2) {
        self.force += force;
        self.torque += (point - self.world_center()).cross(force);
    }

    fn apply_impulse(&mut self, impulse: Vec2, point: Vec2) {
        self.linear_velocity += impulse * self.mass.inverse_mass();
        self.angular_velocity += (point - self.world_center()).cross(impulse) * self.mass.inverse_inertia();
    }

    fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    fn step(&mut self, dt: f64) {
        // Massless bodies keep coasting but ignore forces
        self.linear_velocity += self.force * (self.mass.inverse_mass() * dt);
        self.angular_velocity += self.torque * self.mass.inverse_inertia() * dt;
        self.force = Vec2::zero();
        self.torque = 0.0;

        let center = self.world_center() + self.linear_velocity * dt;
        let rotation = self
            .transform
            .rotation
            .then(Rotation::from_radians(self.angular_velocity * dt));
        let translation = center - rotation.apply(self.mass.center);
        let next = Transform2::new(translation, rotation);

        if next.is_valid() {
            self.transform = next;
        } else {
            tracing::warn!("integration produced an invalid pose, keeping the previous one");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: Vec2, side: f64) -> FixtureShape {
        let h = side / 2.0;
        FixtureShape {
            polygon: vec![
                center + Vec2::new(-h, -h),
                center + Vec2::new(h, -h),
                center + Vec2::new(h, h),
                center + Vec2::new(-h, h),
            ],
            filter: CollisionFilter::default(),
            density: 1.0,
        }
    }

    #[test]
    fn test_square_mass_properties() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::zero(), 2.0));
        body.update_mass();
        let mass = body.mass();
        assert!((mass.mass - 4.0).abs() < 1e-12);
        assert!(mass.center.length() < 1e-12);
        // m * (w^2 + h^2) / 12
        assert!((mass.inertia - 4.0 * 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_polygon_same_mass() {
        let mut shape = square(Vec2::new(1.0, 2.0), 2.0);
        shape.polygon.reverse();
        let mut body = RigidBody::default();
        body.add_fixture(shape);
        body.update_mass();
        assert!((body.mass().mass - 4.0).abs() < 1e-12);
        assert!((body.mass().center - Vec2::new(1.0, 2.0)).length() < 1e-12);
        assert!((body.mass().inertia - 4.0 * 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_moves_after_removal() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::zero(), 1.0));
        let right = body.add_fixture(square(Vec2::new(2.0, 0.0), 1.0));
        body.update_mass();
        assert!((body.local_center() - Vec2::new(1.0, 0.0)).length() < 1e-12);

        assert!(body.remove_fixture(right));
        assert!(!body.remove_fixture(right));
        body.update_mass();
        assert!(body.local_center().length() < 1e-12);
        assert_eq!(body.mass_update_count(), 2);
        assert_eq!(body.fixture_count(), 1);
    }

    #[test]
    fn test_empty_body_is_massless() {
        let mut body = RigidBody::default();
        body.update_mass();
        assert!(body.mass().is_empty());
        assert_eq!(body.mass().inverse_mass(), 0.0);
    }

    #[test]
    fn test_step_integrates_force() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::zero(), 1.0));
        body.update_mass();
        body.apply_force(Vec2::new(2.0, 0.0), body.world_center());
        body.step(0.5);
        assert!((body.linear_velocity() - Vec2::new(1.0, 0.0)).length() < 1e-12);
        assert!((body.world_center() - Vec2::new(0.5, 0.0)).length() < 1e-12);
        assert_eq!(body.pending_force(), Vec2::zero());
    }

    #[test]
    fn test_off_center_force_spins() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::zero(), 1.0));
        body.update_mass();
        body.apply_force(Vec2::new(0.0, 1.0), Vec2::new(0.5, 0.0));
        assert!((body.pending_torque() - 0.5).abs() < 1e-12);
        body.step(0.1);
        assert!(body.angular_velocity() > 0.0);
    }

    #[test]
    fn test_rotation_about_center_of_mass() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::new(3.0, 0.0), 1.0));
        body.update_mass();
        body.set_angular_velocity(1.0);
        let before = body.world_center();
        body.step(0.25);
        assert!((body.world_center() - before).length() < 1e-12);
        assert!((body.transform().rotation.radians() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_impulse_changes_velocity() {
        let mut body = RigidBody::default();
        body.add_fixture(square(Vec2::zero(), 2.0));
        body.update_mass();
        body.apply_impulse(Vec2::new(4.0, 0.0), body.world_center());
        assert!((body.linear_velocity() - Vec2::new(1.0, 0.0)).length() < 1e-12);
        assert_eq!(body.angular_velocity(), 0.0);
    }
}
