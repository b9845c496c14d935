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
//! Collision filtering by category bitmask and team
//!
//! Two fixtures may collide only when all four checks pass:
//!
//! 1. `a.category & b.mask != 0`
//! 2. `b.category & a.mask != 0`
//! 3. `a`'s team rule accepts `b`'s team
//! 4. `b`'s team rule accepts `a`'s team
//!
//! A single failing check suppresses the contact regardless of the others.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard collision category bits
pub mod categories {
    /// Ship hulls and all ship components
    pub const SHIP: u64 = 0b0001;

    /// Projectiles fired from weapon mounts
    pub const PROJECTILE: u64 = 0b0010;

    /// Shield bubbles
    pub const SHIELD: u64 = 0b0100;

    /// Every category
    pub const ALL: u64 = u64::MAX;
}

/// Team affiliation of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Team(pub u32);

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Predicate a fixture applies to the team of the fixture it might touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeamRule {
    /// Collide with anything unless both sides belong to the same team.
    /// Unaffiliated fixtures collide with everyone.
    #[default]
    OpposingOnly,
    /// Ignore teams entirely
    Any,
    /// Collide only with fixtures of the same affiliation
    SameOnly,
}

impl TeamRule {
    /// Evaluate this rule for a fixture of team `own` meeting team `other`
    pub fn accepts(self, own: Option<Team>, other: Option<Team>) -> bool {
        match self {
            TeamRule::Any => true,
            TeamRule::OpposingOnly => match (own, other) {
                (Some(a), Some(b)) => a != b,
                _ => true,
            },
            TeamRule::SameOnly => own == other,
        }
    }
}

/// Per-fixture collision filter
///
/// # Examples
///
/// ```
/// use composite_body::filter::{categories, CollisionFilter, Team};
///
/// let a = CollisionFilter::new(categories::SHIP, categories::SHIP).with_team(Some(Team(1)));
/// let b = CollisionFilter::new(categories::SHIP, categories::SHIP).with_team(Some(Team(2)));
/// let c = CollisionFilter::new(categories::SHIP, categories::SHIP).with_team(Some(Team(1)));
///
/// assert!(a.is_allowed(&b));
/// assert!(!a.is_allowed(&c));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Categories this fixture belongs to
    pub category: u64,
    /// Categories this fixture is willing to touch
    pub mask: u64,
    /// Team of the owning entity
    pub team: Option<Team>,
    /// Team predicate applied to the other fixture
    pub team_rule: TeamRule,
}

impl CollisionFilter {
    /// Create an unaffiliated filter with the default team rule
    pub fn new(category: u64, mask: u64) -> Self {
        CollisionFilter {
            category,
            mask,
            team: None,
            team_rule: TeamRule::default(),
        }
    }

    /// Set the team carried by this filter
    pub fn with_team(mut self, team: Option<Team>) -> Self {
        self.team = team;
        self
    }

    /// Set the team rule
    pub fn with_team_rule(mut self, rule: TeamRule) -> Self {
        self.team_rule = rule;
        self
    }

    /// Decide whether this fixture and `other` may collide
    ///
    /// Symmetric: `a.is_allowed(&b) == b.is_allowed(&a)` for any pair.
    pub fn is_allowed(&self, other: &CollisionFilter) -> bool {
        (self.category & other.mask) != 0
            && (other.category & self.mask) != 0
            && self.team_rule.accepts(self.team, other.team)
            && other.team_rule.accepts(other.team, self.team)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        CollisionFilter::new(categories::SHIP, categories::SHIP)
    }
}
