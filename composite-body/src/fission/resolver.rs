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
//! Connectivity resolution
//!
//! After a slot `D` loses its fixture, the live slots that hung off `D` are
//! grouped into branches:
//!
//! 1. Walk `D`'s neighbours in ascending slot order.
//! 2. From each live neighbour not yet claimed, flood-fill over the
//!    connection map. The fill never enters `D`, never enters a dead slot and
//!    never enters a slot claimed by an earlier branch.
//! 3. The branch holding the root survives; every other branch is a
//!    fragment that must be split off.
//!
//! When `D` is the root itself a [`RootLossPolicy`] picks the surviving
//! branch, if any.
//!
//! Resolution is a pure function of the connection map, the destroyed slot,
//! the root and the liveness predicate, so repeated runs give the same
//! partition.

use crate::blueprint::{ConnectionMap, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rule applied when the root slot itself is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootLossPolicy {
    /// The branch containing the lowest surviving slot id keeps the entity;
    /// that slot becomes the new root.
    #[default]
    PromoteLowestSlot,
    /// The branch with the most members keeps the entity (ties go to the
    /// branch with the lowest slot id); its lowest slot becomes the new root.
    PromoteLargestBranch,
    /// Every branch splits off and the original entity is wrecked.
    Destroy,
}

impl RootLossPolicy {
    /// Short name used in configuration
    pub fn name(&self) -> &'static str {
        match self {
            RootLossPolicy::PromoteLowestSlot => "lowest-slot",
            RootLossPolicy::PromoteLargestBranch => "largest-branch",
            RootLossPolicy::Destroy => "destroy",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lowest-slot" => Some(RootLossPolicy::PromoteLowestSlot),
            "largest-branch" => Some(RootLossPolicy::PromoteLargestBranch),
            "destroy" => Some(RootLossPolicy::Destroy),
            _ => None,
        }
    }
}

/// Maximal set of live, mutually reachable slots hanging off one neighbour
/// of a destroyed slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    members: BTreeSet<SlotId>,
}

impl Branch {
    /// Member slots in ascending order
    pub fn members(&self) -> &BTreeSet<SlotId> {
        &self.members
    }

    /// Consume the branch into its member set
    pub fn into_members(self) -> BTreeSet<SlotId> {
        self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for branches produced by [`partition_branches`]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check membership
    pub fn contains(&self, slot: SlotId) -> bool {
        self.members.contains(&slot)
    }

    /// Lowest member id
    pub fn lowest(&self) -> Option<SlotId> {
        self.members.iter().next().copied()
    }
}

/// What happened to the root during a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOutcome {
    /// A non-root slot was destroyed
    Unchanged,
    /// The root was destroyed and this slot took over
    Promoted(SlotId),
    /// The root was destroyed and no branch keeps the entity
    Lost,
}

/// Outcome of resolving one destroyed slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    destroyed: SlotId,
    survivor: Option<Branch>,
    fragments: Vec<Branch>,
    root: RootOutcome,
}

impl Resolution {
    /// Slot whose loss was resolved
    pub fn destroyed(&self) -> SlotId {
        self.destroyed
    }

    /// Branch that stays with the original entity, if it was touched
    pub fn survivor(&self) -> Option<&Branch> {
        self.survivor.as_ref()
    }

    /// Branches to split off, in discovery order
    pub fn fragments(&self) -> &[Branch] {
        &self.fragments
    }

    /// Consume the resolution into its fragments
    pub fn into_fragments(self) -> Vec<Branch> {
        self.fragments
    }

    /// Effect on the root
    pub fn root(&self) -> RootOutcome {
        self.root
    }

    /// Total number of branches found
    pub fn branch_count(&self) -> usize {
        self.fragments.len() + usize::from(self.survivor.is_some())
    }
}

/// Partition the live neighbourhood of `destroyed` into branches
///
/// Branches are returned in the order their seeding neighbour appears in the
/// ascending neighbour list of `destroyed`.
pub fn partition_branches<F>(connections: &ConnectionMap, destroyed: SlotId, is_alive: F) -> Vec<Branch>
where
    F: Fn(SlotId) -> bool,
{
    let mut claimed = BTreeSet::new();
    let mut branches = Vec::new();

    for seed in connections.neighbors(destroyed) {
        if seed == destroyed || !is_alive(seed) || claimed.contains(&seed) {
            continue;
        }

        let mut members = BTreeSet::new();
        let mut stack = vec![seed];
        claimed.insert(seed);
        members.insert(seed);
        while let Some(node) = stack.pop() {
            for next in connections.neighbors(node) {
                if next != destroyed && is_alive(next) && claimed.insert(next) {
                    members.insert(next);
                    stack.push(next);
                }
            }
        }
        branches.push(Branch { members });
    }

    branches
}

/// Partition the branches and decide which one survives
pub fn resolve<F>(
    connections: &ConnectionMap,
    destroyed: SlotId,
    root: SlotId,
    is_alive: F,
    policy: RootLossPolicy,
) -> Resolution
where
    F: Fn(SlotId) -> bool,
{
    let mut branches = partition_branches(connections, destroyed, is_alive);

    if destroyed != root {
        let survivor = branches
            .iter()
            .position(|b| b.contains(root))
            .map(|index| branches.remove(index));
        return Resolution {
            destroyed,
            survivor,
            fragments: branches,
            root: RootOutcome::Unchanged,
        };
    }

    let chosen = match policy {
        RootLossPolicy::PromoteLowestSlot => branches
            .iter()
            .enumerate()
            .min_by_key(|(_, b)| b.lowest())
            .map(|(index, _)| index),
        RootLossPolicy::PromoteLargestBranch => branches
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.len().cmp(&b.len()).then_with(|| b.lowest().cmp(&a.lowest())))
            .map(|(index, _)| index),
        RootLossPolicy::Destroy => None,
    };

    let survivor = chosen.map(|index| branches.remove(index));
    let root = match survivor.as_ref().and_then(Branch::lowest) {
        Some(promoted) => RootOutcome::Promoted(promoted),
        None => RootOutcome::Lost,
    };

    Resolution {
        destroyed,
        survivor,
        fragments: branches,
        root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: u32) -> SlotId {
        SlotId::new(i)
    }

    fn map(edges: &[(u32, u32)]) -> ConnectionMap {
        let mut map = ConnectionMap::new();
        for &(a, b) in edges {
            map.connect(s(a), s(b));
        }
        map
    }

    fn members(branch: &Branch) -> Vec<u32> {
        branch.members().iter().map(SlotId::raw).collect()
    }

    #[test]
    fn test_chain_split() {
        // 0 - 1 - 2 - 3, destroy 1
        let graph = map(&[(0, 1), (1, 2), (2, 3)]);
        let resolution = resolve(&graph, s(1), s(0), |slot| slot != s(1), RootLossPolicy::default());
        assert_eq!(resolution.root(), RootOutcome::Unchanged);
        assert_eq!(members(resolution.survivor().unwrap()), vec![0]);
        assert_eq!(resolution.fragments().len(), 1);
        assert_eq!(members(&resolution.fragments()[0]), vec![2, 3]);
    }

    #[test]
    fn test_y_split_orders_fragments() {
        // 0 - 1, 1 - 2, 1 - 3, destroy 1
        let graph = map(&[(0, 1), (1, 2), (1, 3)]);
        let resolution = resolve(&graph, s(1), s(0), |slot| slot != s(1), RootLossPolicy::default());
        let fragments: Vec<_> = resolution.fragments().iter().map(members).collect();
        assert_eq!(fragments, vec![vec![2], vec![3]]);
        assert_eq!(resolution.branch_count(), 3);
    }

    #[test]
    fn test_cycle_keeps_single_branch() {
        // Ring 0 - 1 - 2 - 3 - 0, destroy 2: both neighbours reach each other
        let graph = map(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let resolution = resolve(&graph, s(2), s(0), |slot| slot != s(2), RootLossPolicy::default());
        assert!(resolution.fragments().is_empty());
        assert_eq!(members(resolution.survivor().unwrap()), vec![0, 1, 3]);
    }

    #[test]
    fn test_dead_neighbours_do_not_propagate() {
        // 0 - 1 - 2 - 3 with 2 already dead, destroy 3
        let graph = map(&[(0, 1), (1, 2), (2, 3)]);
        let branches = partition_branches(&graph, s(3), |slot| slot != s(2) && slot != s(3));
        assert!(branches.is_empty());
    }

    #[test]
    fn test_isolated_slot_has_no_branches() {
        let mut graph = ConnectionMap::new();
        graph.add_node(s(5));
        assert!(partition_branches(&graph, s(5), |_| true).is_empty());
    }

    #[test]
    fn test_root_loss_promotes_lowest_slot() {
        // 4 - 0 - 2 - 3, root 0 destroyed
        let graph = map(&[(0, 4), (0, 2), (2, 3)]);
        let resolution = resolve(&graph, s(0), s(0), |slot| slot != s(0), RootLossPolicy::PromoteLowestSlot);
        assert_eq!(resolution.root(), RootOutcome::Promoted(s(2)));
        assert_eq!(members(resolution.survivor().unwrap()), vec![2, 3]);
        assert_eq!(resolution.fragments().len(), 1);
    }

    #[test]
    fn test_root_loss_promotes_largest_branch() {
        // 1 - 0 - 4 - 5 - 6, root 0 destroyed
        let graph = map(&[(0, 1), (0, 4), (4, 5), (5, 6)]);
        let resolution = resolve(&graph, s(0), s(0), |slot| slot != s(0), RootLossPolicy::PromoteLargestBranch);
        assert_eq!(resolution.root(), RootOutcome::Promoted(s(4)));
        assert_eq!(members(&resolution.fragments()[0]), vec![1]);
    }

    #[test]
    fn test_largest_branch_tie_goes_to_lowest() {
        let graph = map(&[(0, 7), (0, 3)]);
        let resolution = resolve(&graph, s(0), s(0), |slot| slot != s(0), RootLossPolicy::PromoteLargestBranch);
        assert_eq!(resolution.root(), RootOutcome::Promoted(s(3)));
    }

    #[test]
    fn test_root_loss_destroy_policy() {
        let graph = map(&[(0, 1), (0, 2)]);
        let resolution = resolve(&graph, s(0), s(0), |slot| slot != s(0), RootLossPolicy::Destroy);
        assert_eq!(resolution.root(), RootOutcome::Lost);
        assert!(resolution.survivor().is_none());
        assert_eq!(resolution.fragments().len(), 2);
    }

    #[test]
    fn test_root_loss_without_branches() {
        let graph = map(&[(0, 1)]);
        let resolution = resolve(&graph, s(0), s(0), |slot| slot == s(99), RootLossPolicy::default());
        assert_eq!(resolution.root(), RootOutcome::Lost);
        assert_eq!(resolution.branch_count(), 0);
    }

    #[test]
    fn test_policy_names() {
        for policy in [
            RootLossPolicy::PromoteLowestSlot,
            RootLossPolicy::PromoteLargestBranch,
            RootLossPolicy::Destroy,
        ] {
            assert_eq!(RootLossPolicy::from_name(policy.name()), Some(policy));
        }
        assert_eq!(RootLossPolicy::from_name(" Destroy "), Some(RootLossPolicy::Destroy));
        assert_eq!(RootLossPolicy::from_name("explode"), None);
    }
}
