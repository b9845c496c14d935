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
//! Two ships collide and break apart
//!
//! Loads a blueprint from JSON, spawns a red and a blue ship on a collision
//! course, feeds contact damage until the hulls give way, and prints every
//! fragment that splits off.
//!
//! Run with `RUST_LOG=composite_body=debug` to see the fission log, and set
//! `COMPOSITE_BODY_ROOT_LOSS=largest-branch` to change the root-loss rule.

use composite_body::blueprint::{BlueprintDocument, Shape, ShapeLibrary, SlotId};
use composite_body::effects::EffectsRequest;
use composite_body::filter::Team;
use composite_body::math::{Rotation, Transform2, Vec2};
use composite_body::physics::PhysicsBody;
use composite_body::{FissionConfig, World};
use tracing_subscriber::EnvFilter;

const CORVETTE: &str = r#"{
    "format_version": "1.0.0",
    "name": "corvette",
    "components": [
        { "shape": 0, "position": { "x": 0, "y": 0 }, "kind": "cockpit" },
        { "shape": 0, "position": { "x": 30, "y": 0 }, "kind": "body" },
        { "shape": 0, "position": { "x": 60, "y": 0 }, "kind": "body" },
        { "shape": 0, "position": { "x": 60, "y": 30 }, "kind": "gun" },
        { "shape": 0, "position": { "x": 60, "y": -30 }, "kind": "thruster" },
        { "shape": 0, "position": { "x": 90, "y": 0 }, "kind": "body" }
    ],
    "connections": {
        "0": [1],
        "1": [2],
        "2": [3, 4, 5]
    }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("Composite Body - Split Demo");
    println!("===========================\n");

    let config = FissionConfig::from_env()?.with_contact_damage(25);
    println!(
        "Root loss policy: {}, fixture health: {}",
        config.root_loss.name(),
        config.fixture_health
    );

    let library: ShapeLibrary = [Shape::square(1.0)].into_iter().collect();
    let blueprint = BlueprintDocument::load(CORVETTE, &library)?;
    println!("Loaded '{}' with {} components\n", blueprint.name(), blueprint.slot_count());

    let mut world: World = World::new(config);
    let red = world.spawn(
        blueprint.clone(),
        Transform2::new(Vec2::new(-5.0, 0.0), Rotation::identity()),
        Some(Team(1)),
    );
    let blue = world.spawn(
        blueprint,
        Transform2::new(Vec2::new(5.0, 0.0), Rotation::from_quarter_turns(2)),
        Some(Team(2)),
    );

    for (id, speed) in [(red, 2.0), (blue, -2.0)] {
        if let Some(ship) = world.entity_mut(id) {
            ship.body_mut().set_linear_velocity(Vec2::new(speed, 0.0));
            ship.body_mut().set_angular_velocity(0.1);
        }
    }

    // The tail section of red grinds against blue's midsection
    let contact = ((red, SlotId::new(2)), (blue, SlotId::new(1)));

    for frame in 0..10 {
        if world.report_contact(contact.0, contact.1) {
            println!("Frame {}: contact between {} and {}", frame, red, blue);
        }

        let report = world.step(1.0 / 60.0);
        for id in &report.spawned {
            if let Some(fragment) = world.entity(*id) {
                let slots: Vec<_> = fragment.live_slots().map(|s| s.raw()).collect();
                println!(
                    "  {} split off with slots {:?}, velocity {:?}",
                    id,
                    slots,
                    fragment.body().linear_velocity()
                );
            }
        }
        for id in &report.removed {
            println!("  {} removed", id);
        }
        for (id, err) in &report.faults {
            println!("  {} faulted: {}", id, err);
        }
    }

    println!("\nDebris requests:");
    for request in world.drain_effects() {
        match request {
            EffectsRequest::ComponentDestroyed(event) => {
                println!("  {:?} from {} at {:?}", event.role, event.entity, event.position);
            }
            EffectsRequest::EntityWrecked { entity, position } => {
                println!("  explosion for {} at {:?}", entity, position);
            }
        }
    }

    println!("\nFinal state:");
    for entity in world.entities() {
        let snapshot = entity.snapshot();
        println!("  {}", serde_json::to_string(&snapshot)?);
    }

    Ok(())
}
