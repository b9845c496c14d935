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
//! Fixture liveness

use crate::filter::CollisionFilter;
use crate::physics::FixtureHandle;

/// Live counterpart of a slot, exclusively owned by one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    handle: FixtureHandle,
    health: i32,
    filter: CollisionFilter,
}

impl Fixture {
    pub(crate) fn new(handle: FixtureHandle, health: i32, filter: CollisionFilter) -> Self {
        Fixture { handle, health, filter }
    }

    /// Engine handle of the collision shape
    pub fn handle(&self) -> FixtureHandle {
        self.handle
    }

    /// Remaining health
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Collision filter including the owning entity's team
    pub fn filter(&self) -> &CollisionFilter {
        &self.filter
    }

    /// Health has reached the removal threshold
    pub fn is_marked_for_removal(&self) -> bool {
        self.health <= 0
    }

    pub(crate) fn damage(&mut self, amount: i32) {
        self.health = self.health.saturating_sub(amount);
    }

    pub(crate) fn kill(&mut self) {
        self.health = 0;
    }

    pub(crate) fn set_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }
}

/// Per-slot liveness as owned by the entity
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureState {
    /// The component is present in the simulation
    Alive(Fixture),
    /// The component has been destroyed and can only come back via revive
    Destroyed,
}

impl FixtureState {
    /// Check for a live fixture
    pub fn is_alive(&self) -> bool {
        matches!(self, FixtureState::Alive(_))
    }

    /// Borrow the live fixture
    pub fn fixture(&self) -> Option<&Fixture> {
        match self {
            FixtureState::Alive(fixture) => Some(fixture),
            FixtureState::Destroyed => None,
        }
    }

    pub(crate) fn fixture_mut(&mut self) -> Option<&mut Fixture> {
        match self {
            FixtureState::Alive(fixture) => Some(fixture),
            FixtureState::Destroyed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_reaches_threshold() {
        let mut fixture = Fixture::new(FixtureHandle::new(0), 2, CollisionFilter::default());
        fixture.damage(1);
        assert!(!fixture.is_marked_for_removal());
        fixture.damage(1);
        assert!(fixture.is_marked_for_removal());
        fixture.damage(i32::MAX);
        assert!(fixture.health() < 0);
    }

    #[test]
    fn test_kill_zeroes_health() {
        let mut fixture = Fixture::new(FixtureHandle::new(0), 100, CollisionFilter::default());
        fixture.kill();
        assert_eq!(fixture.health(), 0);
        assert!(fixture.is_marked_for_removal());
    }

    #[test]
    fn test_state_accessors() {
        let alive = FixtureState::Alive(Fixture::new(FixtureHandle::new(3), 1, CollisionFilter::default()));
        assert!(alive.is_alive());
        assert_eq!(alive.fixture().map(Fixture::handle), Some(FixtureHandle::new(3)));
        assert!(!FixtureState::Destroyed.is_alive());
        assert!(FixtureState::Destroyed.fixture().is_none());
    }
}
