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
//! Fission scenarios on small hand-built ships
//!
//! Covers chain and fork splits, leaf and isolated destruction, independent
//! entities in one tick, every root-loss policy, and revival.

use composite_body::blueprint::{Blueprint, BlueprintBuilder, Shape, SlotId, SlotRole};
use composite_body::config::FissionConfig;
use composite_body::effects::EffectsRequest;
use composite_body::entity::{EntityId, EntityState};
use composite_body::error::FissionError;
use composite_body::filter::Team;
use composite_body::fission::{partition_branches, RootLossPolicy};
use composite_body::math::{Rotation, Transform2, Vec2};
use composite_body::physics::PhysicsBody;
use composite_body::World;
use std::collections::BTreeSet;
use std::sync::Arc;

fn s(i: u32) -> SlotId {
    SlotId::new(i)
}

fn at(x: f64, y: f64) -> Transform2 {
    Transform2::new(Vec2::new(x, y), Rotation::identity())
}

/// Build a blueprint of unit squares at `positions` joined by `edges`
///
/// Slot 0 is the cockpit and therefore the root.
fn ship(name: &str, positions: &[(f64, f64)], edges: &[(u32, u32)]) -> Arc<Blueprint> {
    let mut builder = BlueprintBuilder::new(name);
    for (index, (x, y)) in positions.iter().enumerate() {
        let role = if index == 0 { SlotRole::Cockpit } else { SlotRole::Structural };
        builder.add_slot(Shape::square(1.0), at(*x, *y), 1.0, role);
    }
    for (a, b) in edges {
        builder.connect(s(*a), s(*b));
    }
    Arc::new(builder.build().unwrap())
}

/// root(0) - B(1) - C(2) - D(3)
fn chain() -> Arc<Blueprint> {
    ship(
        "chain",
        &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)],
        &[(0, 1), (1, 2), (2, 3)],
    )
}

/// root(0) - B(1), B - C(2), B - D(3)
fn fork() -> Arc<Blueprint> {
    ship(
        "fork",
        &[(0.0, 0.0), (1.0, 0.0), (2.0, 1.0), (2.0, -1.0)],
        &[(0, 1), (1, 2), (1, 3)],
    )
}

/// Root 0 in the middle with arms {1}, {2, 3} and {4}
fn cross() -> Arc<Blueprint> {
    ship(
        "cross",
        &[(0.0, 0.0), (-1.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0)],
        &[(0, 1), (0, 2), (2, 3), (0, 4)],
    )
}

fn live(world: &World, id: EntityId) -> Vec<SlotId> {
    world.entity(id).unwrap().live_slots().collect()
}

fn fragment_sets(world: &World, ids: &[EntityId]) -> BTreeSet<Vec<SlotId>> {
    ids.iter().map(|id| live(world, *id)).collect()
}

#[test]
fn test_chain_split_keeps_root_side() {
    let mut world: World = World::default();
    let id = world.spawn(chain(), Transform2::identity(), None);
    world.entity_mut(id).unwrap().kill(s(1)).unwrap();

    let report = world.tick();
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(live(&world, id), vec![s(0)]);
    assert_eq!(live(&world, report.spawned[0]), vec![s(2), s(3)]);
}

#[test]
fn test_fork_split_yields_two_fragments() {
    let mut world: World = World::default();
    let id = world.spawn(fork(), Transform2::identity(), None);
    world.entity_mut(id).unwrap().kill(s(1)).unwrap();

    let report = world.tick();
    assert_eq!(report.spawned.len(), 2);
    assert_eq!(live(&world, id), vec![s(0)]);
    let expected: BTreeSet<Vec<SlotId>> = [vec![s(2)], vec![s(3)]].into_iter().collect();
    assert_eq!(fragment_sets(&world, &report.spawned), expected);
}

#[test]
fn test_leaf_destruction_spawns_nothing() {
    let mut world: World = World::default();
    let id = world.spawn(chain(), Transform2::identity(), None);
    let fragments = world.destroy(id, s(3)).unwrap();

    assert!(fragments.is_empty());
    assert_eq!(world.len(), 1);
    assert_eq!(live(&world, id), vec![s(0), s(1), s(2)]);
}

#[test]
fn test_slot_with_dead_neighbor_spawns_nothing() {
    let mut world: World = World::default();
    let id = world.spawn(chain(), Transform2::identity(), None);
    world.destroy(id, s(1)).unwrap();

    // Root's only neighbour is dead
    let fragments = world.destroy(id, s(0)).unwrap();
    assert!(fragments.is_empty());
    assert_eq!(world.entity(id).unwrap().state(), EntityState::Wrecked);

    // Same check at the resolver level on the pristine graph
    let blueprint = chain();
    let alive = |slot: SlotId| slot != s(1);
    assert!(partition_branches(blueprint.connections(), s(0), alive).is_empty());
}

#[test]
fn test_same_tick_destructions_do_not_interact() {
    let mut world: World = World::default();
    let first = world.spawn(chain(), Transform2::identity(), None);
    let second = world.spawn(fork(), at(50.0, 0.0), None);
    world.entity_mut(first).unwrap().kill(s(2)).unwrap();
    world.entity_mut(second).unwrap().kill(s(1)).unwrap();

    let report = world.tick();
    assert!(report.faults.is_empty());
    assert_eq!(report.spawned.len(), 3);
    assert_eq!(live(&world, first), vec![s(0), s(1)]);
    assert_eq!(live(&world, second), vec![s(0)]);

    let unique: BTreeSet<_> = report.spawned.iter().collect();
    assert_eq!(unique.len(), 3);
    for entity in world.entities() {
        assert!(entity.live_slots().all(|slot| entity.connections().contains(slot)));
        assert!(entity.unreachable_live_slots().is_empty());
    }
    // Fragments of the first ship carry its blueprint, not the second's
    let tail = world.entity(report.spawned[0]).unwrap();
    assert_eq!(tail.blueprint().name(), "chain");
    assert_eq!(tail.live_slots().collect::<Vec<_>>(), vec![s(3)]);
}

#[test]
fn test_root_loss_promotes_lowest_slot() {
    let config = FissionConfig::default().with_root_loss(RootLossPolicy::PromoteLowestSlot);
    let mut world: World = World::new(config);
    let id = world.spawn(cross(), Transform2::identity(), None);
    let fragments = world.destroy(id, s(0)).unwrap();

    let entity = world.entity(id).unwrap();
    assert_eq!(entity.root(), s(1));
    assert_eq!(entity.state(), EntityState::Active);
    assert_eq!(live(&world, id), vec![s(1)]);
    let expected: BTreeSet<Vec<SlotId>> = [vec![s(2), s(3)], vec![s(4)]].into_iter().collect();
    assert_eq!(fragment_sets(&world, &fragments), expected);
}

#[test]
fn test_root_loss_promotes_largest_branch() {
    let config = FissionConfig::default().with_root_loss(RootLossPolicy::PromoteLargestBranch);
    let mut world: World = World::new(config);
    let id = world.spawn(cross(), Transform2::identity(), None);
    let fragments = world.destroy(id, s(0)).unwrap();

    assert_eq!(world.entity(id).unwrap().root(), s(2));
    assert_eq!(live(&world, id), vec![s(2), s(3)]);
    let expected: BTreeSet<Vec<SlotId>> = [vec![s(1)], vec![s(4)]].into_iter().collect();
    assert_eq!(fragment_sets(&world, &fragments), expected);
}

#[test]
fn test_root_loss_destroy_policy_wrecks_entity() {
    let config = FissionConfig::default().with_root_loss(RootLossPolicy::Destroy);
    let mut world: World = World::new(config);
    let id = world.spawn(cross(), Transform2::identity(), None);
    let fragments = world.destroy(id, s(0)).unwrap();

    assert_eq!(fragments.len(), 3);
    assert_eq!(world.entity(id).unwrap().state(), EntityState::Wrecked);

    let report = world.tick();
    assert_eq!(report.removed, vec![id]);
    assert_eq!(world.len(), 3);
    assert!(world
        .drain_effects()
        .iter()
        .any(|r| matches!(r, EffectsRequest::EntityWrecked { entity, .. } if *entity == id)));
}

#[test]
fn test_revive_after_destruction() {
    let mut world: World = World::default();
    let id = world.spawn(chain(), Transform2::identity(), None);
    world.destroy(id, s(1)).unwrap();

    let entity = world.entity_mut(id).unwrap();
    // Slots handed to the fragment are no longer part of this entity
    assert_eq!(
        entity.revive(s(2)),
        Err(FissionError::UnknownSlot { entity: id, slot: s(2) })
    );
    entity.revive(s(1)).unwrap();
    assert_eq!(entity.live_slots().collect::<Vec<_>>(), vec![s(0), s(1)]);
    assert_eq!(entity.fixture(s(1)).unwrap().health(), 100);
}

#[test]
fn test_fragments_keep_world_pose_and_velocity() {
    let mut world: World = World::default();
    let pose = Transform2::new(Vec2::new(4.0, -3.0), Rotation::from_radians(0.4));
    let id = world.spawn(chain(), pose, Some(Team(3)));
    {
        let body = world.entity_mut(id).unwrap().body_mut();
        body.set_linear_velocity(Vec2::new(0.5, 1.5));
        body.set_angular_velocity(-0.2);
    }
    let before: Vec<Transform2> = (2..4)
        .map(|i| world.entity(id).unwrap().slot_world_transform(s(i)).unwrap())
        .collect();

    let fragments = world.destroy(id, s(1)).unwrap();
    let fragment = world.entity(fragments[0]).unwrap();
    assert_eq!(fragment.team(), Some(Team(3)));
    assert_eq!(fragment.body().linear_velocity(), Vec2::new(0.5, 1.5));
    assert_eq!(fragment.body().angular_velocity(), -0.2);
    for (i, expected) in (2..4).zip(before) {
        let after = fragment.slot_world_transform(s(i)).unwrap();
        assert!((after.translation - expected.translation).length() < 1e-9);
        assert!((after.rotation.radians() - expected.rotation.radians()).abs() < 1e-9);
    }
}

#[test]
fn test_contact_damage_drives_fission() {
    let config = FissionConfig::new(2, RootLossPolicy::default());
    let mut world: World = World::new(config);
    let victim = world.spawn(chain(), Transform2::identity(), Some(Team(1)));
    let rammer = world.spawn(chain(), at(0.0, 1.0), Some(Team(2)));

    assert!(world.report_contact((victim, s(1)), (rammer, s(3))));
    assert!(world.tick().spawned.is_empty());
    assert!(world.report_contact((victim, s(1)), (rammer, s(3))));

    let report = world.tick();
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(live(&world, victim), vec![s(0)]);
    assert_eq!(live(&world, rammer), vec![s(0), s(1), s(2)]);
}

#[test]
fn test_effects_report_every_destroyed_component() {
    let mut world: World = World::default();
    let id = world.spawn(fork(), Transform2::identity(), None);
    for slot in [1, 2, 3] {
        world.entity_mut(id).unwrap().kill(s(slot)).unwrap();
    }
    world.tick();
    // Slot 1 goes first and its neighbours move to fragments, which are
    // swept on the next tick
    world.tick();

    let destroyed: BTreeSet<SlotId> = world
        .drain_effects()
        .into_iter()
        .filter_map(|r| match r {
            EffectsRequest::ComponentDestroyed(event) => Some(event.slot),
            EffectsRequest::EntityWrecked { .. } => None,
        })
        .collect();
    assert_eq!(destroyed, [s(1), s(2), s(3)].into_iter().collect());
    assert_eq!(world.len(), 1);
}
