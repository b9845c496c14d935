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
//! Connection graph over slots
//!
//! The connection map is a general undirected graph (cycles allowed) keyed by
//! [`SlotId`]. Edges reference slot indices rather than slot objects, so a
//! sub-graph for a fragment is built as a plain value copy.
//!
//! Neighbour sets are ordered, which makes every traversal deterministic.

use crate::blueprint::SlotId;
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric adjacency relation between slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionMap {
    adjacency: BTreeMap<SlotId, BTreeSet<SlotId>>,
}

impl ConnectionMap {
    /// Create an empty map
    pub fn new() -> Self {
        ConnectionMap {
            adjacency: BTreeMap::new(),
        }
    }

    /// Add an isolated node (no-op if present)
    pub fn add_node(&mut self, slot: SlotId) {
        self.adjacency.entry(slot).or_default();
    }

    /// Join two slots, adding either node if missing
    ///
    /// Returns false for a self-connection, which is never stored.
    pub fn connect(&mut self, a: SlotId, b: SlotId) -> bool {
        if a == b {
            return false;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        true
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, slot: SlotId) -> bool {
        match self.adjacency.remove(&slot) {
            Some(neighbors) => {
                for n in neighbors {
                    if let Some(set) = self.adjacency.get_mut(&n) {
                        set.remove(&slot);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Check if the slot is a node of this map
    pub fn contains(&self, slot: SlotId) -> bool {
        self.adjacency.contains_key(&slot)
    }

    /// Directly connected slots in ascending order
    pub fn neighbors(&self, slot: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.adjacency.get(&slot).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Check whether two slots share an edge
    pub fn are_connected(&self, a: SlotId, b: SlotId) -> bool {
        self.adjacency.get(&a).map_or(false, |set| set.contains(&b))
    }

    /// All nodes in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Check if the map has no nodes
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Sub-graph induced by `members`
    ///
    /// Keeps only edges whose two endpoints are both members. Members that are
    /// not nodes of this map are ignored.
    pub fn restrict(&self, members: &BTreeSet<SlotId>) -> ConnectionMap {
        let adjacency = members
            .iter()
            .filter_map(|slot| {
                self.adjacency.get(slot).map(|neighbors| {
                    let kept = neighbors.intersection(members).copied().collect();
                    (*slot, kept)
                })
            })
            .collect();
        ConnectionMap { adjacency }
    }

    /// Every node reachable from `start` through nodes accepted by `passable`
    ///
    /// `start` itself must be passable to be included.
    pub fn reachable_from<F>(&self, start: SlotId, passable: F) -> BTreeSet<SlotId>
    where
        F: Fn(SlotId) -> bool,
    {
        let mut seen = BTreeSet::new();
        if !self.contains(start) || !passable(start) {
            return seen;
        }
        let mut stack = vec![start];
        seen.insert(start);
        while let Some(node) = stack.pop() {
            for next in self.neighbors(node) {
                if passable(next) && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Check the symmetry invariant
    pub fn is_symmetric(&self) -> bool {
        self.adjacency
            .iter()
            .all(|(a, set)| set.iter().all(|b| self.are_connected(*b, *a)))
    }
}
