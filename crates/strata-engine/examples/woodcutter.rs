//! Woodcutter demo: a lumberjack chops an oak for a few dozen ticks.
//!
//! Builds the scene from a JSON manifest, registers a periodic weather
//! system, submits one chop request per tick, and prints each tick's
//! outcome plus a final observer snapshot.
//!
//! ```sh
//! cargo run -p strata-engine --example woodcutter
//! ```

use anyhow::Result;
use strata_engine::prelude::*;

const ACTOR: EntityId = EntityId::new(0);
const TREE: EntityId = EntityId::new(2);

const MANIFEST: &str = r#"[
    {"entity_index": 0, "component": {"Capabilities": 2}},
    {"entity_index": 0, "component": {"Anatomy": 7}},
    {"entity_index": 0, "component": {"Skills": {"levels": [0, 60, 0, 0, 0, 0, 0, 0]}}},
    {"entity_index": 0, "component": {"Tool": {"material": "Iron"}}},
    {"entity_index": 0, "component": {"BodyParts": {"slots": [4294967295, 1, 4294967295, 4294967295, 4294967295, 4294967295]}}},
    {"entity_index": 0, "component": {"Position": {"x": 9, "y": 3}}},
    {"entity_index": 0, "component": {"Glyph": {"ch": "@"}}},
    {"entity_index": 1, "component": {"Layers": {"layers": [
        {"material": "Flesh", "integrity": 2, "max_integrity": 2},
        {"material": "Bone", "integrity": 3, "max_integrity": 3},
        {"material": "None", "integrity": 0, "max_integrity": 0},
        {"material": "None", "integrity": 0, "max_integrity": 0}], "count": 2}}},
    {"entity_index": 2, "component": {"Layers": {"layers": [
        {"material": "Bark", "integrity": 3, "max_integrity": 3},
        {"material": "Wood", "integrity": 5, "max_integrity": 5},
        {"material": "None", "integrity": 0, "max_integrity": 0},
        {"material": "None", "integrity": 0, "max_integrity": 0}], "count": 2}}},
    {"entity_index": 2, "component": {"Affordances": 2}},
    {"entity_index": 2, "component": {"Position": {"x": 10, "y": 3}}},
    {"entity_index": 2, "component": {"Glyph": {"ch": "T"}}}
]"#;

/// Every third tick, ambient weather chips the tree's bark.
fn weather(view: &WorldView<'_>, cmds: &mut CommandBuffer) {
    if view
        .stores
        .layers
        .get(TREE)
        .is_some_and(|stack| !stack.is_empty())
    {
        cmds.push(Command::damage_layer(view.tick, EntityId::INVALID, TREE, 1));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut world = World::new(0xBEEF);
    let report = load_manifest_json(&mut world, MANIFEST)?;
    println!(
        "loaded {} entities, {} components ({} skipped)",
        report.entities_allocated, report.components_added, report.skipped
    );

    world
        .rules_mut()
        .add(
            RuleDef::new(1, VerbId::Chop, CapabilityId::Chop)
                .condition(Condition::ToolHarderThanLayer)
                .roll(40, 15, BodyPartSlot::RightHand, 2)
                .effect(RuleEffect::new(
                    TargetRole::Target,
                    EffectKind::DamageLayer {
                        amount: Amount::fixed(1),
                    },
                )),
        )?;

    // Fast ticks so the demo finishes quickly; the simulation itself is
    // oblivious to the interval.
    let config = TickConfig {
        tick_interval_us: 50_000,
        ..TickConfig::default()
    };
    let mut tick_loop = TickLoop::new(world, SystemClock::new(), config);
    tick_loop.add_system("weather", 3, weather);

    for _ in 0..24 {
        tick_loop.world_mut().submit(InteractionRequest {
            actor: ACTOR,
            target: TREE,
            verb: VerbId::Chop,
        });
        for report in tick_loop.run_for(1) {
            for (request, result) in &report.results {
                println!(
                    "tick {:>3}  {:?} on {}: {}",
                    report.tick, request.verb, request.target, result
                );
            }
            if report.applied + report.rejected > 0 {
                println!(
                    "          flush: {} applied, {} rejected",
                    report.applied, report.rejected
                );
            }
        }
        if tick_loop
            .world()
            .stores()
            .layers
            .get(TREE)
            .map_or(true, |stack| stack.is_empty())
        {
            println!("the oak is down!");
            break;
        }
    }

    println!("\nfinal snapshot:");
    for view in tick_loop.world().snapshot().entities {
        let layer = view
            .outer_layer
            .map(|l| format!("{:?} {}/{}", l.material, l.integrity, l.max_integrity))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {} {} at ({}, {})  layer: {}  alive: {}",
            view.entity,
            view.glyph.unwrap_or(' '),
            view.position.x,
            view.position.y,
            layer,
            view.alive
        );
    }
    println!("state digest: {}", tick_loop.world().digest());
    Ok(())
}
