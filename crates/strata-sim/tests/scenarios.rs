//! Seeded end-to-end scenarios.
//!
//! Each test builds a small world from a manifest, drives it through
//! `World::step`, and checks both the structural outcome (result codes,
//! counters) and the material outcome (store state after flush).
//! Roll-dependent scenarios pick their world seed by scanning for one
//! whose tick-0 roll lands in the band the scenario needs -- rolls are
//! pure functions of `(seed, tick, actor, target)`, so the scan is
//! deterministic.

use strata_sim::prelude::*;

const ACTOR: EntityId = EntityId::new(0);
const HAND: EntityId = EntityId::new(1);
const TREE: EntityId = EntityId::new(2);

/// Scan world seeds until the tick-0 roll for (actor, tree) satisfies
/// the predicate.
fn find_seed(want: impl Fn(i32) -> bool) -> u32 {
    (0..100_000u32)
        .find(|&seed| want(SplitMix32::for_roll(seed, 0, ACTOR, TREE).d100()))
        .expect("no seed in range satisfies the roll predicate")
}

fn chop_rule() -> RuleDef {
    RuleDef::new(1, VerbId::Chop, CapabilityId::Chop)
        .condition(Condition::ToolHarderThanLayer)
        .roll(40, 15, BodyPartSlot::RightHand, 2)
        .effect(RuleEffect::new(
            TargetRole::Target,
            EffectKind::DamageLayer {
                amount: Amount::fixed(1),
            },
        ))
}

/// The lumberjack scene: actor 0 with an iron axe and a right hand
/// (entity 1, flesh over bone), and a bark-wrapped oak (entity 2).
fn build_chop_world(seed: u32, hand_layers: &[Layer]) -> World {
    let mut world = World::new(seed);
    let entries = vec![
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Capabilities(
                Capabilities::new().with(CapabilityId::Chop),
            ),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Anatomy(Anatomy::ARMS | Anatomy::HANDS | Anatomy::LEGS),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Skills(Skills::new().with(SkillId::Woodcutting, 60)),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Tool(Tool {
                material: Material::Iron,
            }),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::BodyParts(
                BodyParts::new().with(BodyPartSlot::RightHand, HAND),
            ),
        },
        ManifestEntry {
            entity_index: 1,
            component: ComponentPayload::Layers(LayerStack::from_layers(hand_layers)),
        },
        ManifestEntry {
            entity_index: 2,
            component: ComponentPayload::Layers(LayerStack::from_layers(&[
                Layer::new(Material::Bark, 3),
                Layer::new(Material::Wood, 5),
            ])),
        },
        ManifestEntry {
            entity_index: 2,
            component: ComponentPayload::Affordances(
                Affordances::new().with(AffordanceId::Choppable),
            ),
        },
    ];
    load_manifest(&mut world, &entries).unwrap();
    world.rules_mut().add(chop_rule()).unwrap();
    world
}

fn chop() -> InteractionRequest {
    InteractionRequest {
        actor: ACTOR,
        target: TREE,
        verb: VerbId::Chop,
    }
}

// ---------------------------------------------------------------------------
// S1: successful chop
// ---------------------------------------------------------------------------

#[test]
fn successful_chop_damages_bark() {
    let seed = find_seed(|roll| roll >= 15);
    let mut world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );

    world.submit(chop());
    let report = world.step();

    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(report.applied, 1);
    assert_eq!(report.rejected, 0);
    assert_eq!(report.dropped, 0);

    let tree = world.stores().layers.get(TREE).unwrap();
    let outer = tree.outermost().unwrap();
    assert_eq!(outer.material, Material::Bark);
    assert_eq!(outer.integrity, 2);
    assert_eq!(outer.max_integrity, 3);
}

// ---------------------------------------------------------------------------
// S2: critical failure peels flesh
// ---------------------------------------------------------------------------

#[test]
fn crit_failure_peels_flesh_from_hand() {
    let seed = find_seed(|roll| roll < 15);
    let mut world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );

    world.submit(chop());
    let report = world.step();

    assert_eq!(report.results[0].1, InteractResult::CritFail);
    assert_eq!(report.applied, 1);

    // Both flesh points consumed: the hand is down to bare bone.
    let hand = world.stores().layers.get(HAND).unwrap();
    assert_eq!(hand.count(), 1);
    let outer = hand.outermost().unwrap();
    assert_eq!(outer.material, Material::Bone);
    assert_eq!(outer.integrity, 3);

    // The tree is untouched by a critical failure.
    let tree = world.stores().layers.get(TREE).unwrap();
    assert_eq!(tree.outermost().unwrap().integrity, 3);
}

// ---------------------------------------------------------------------------
// S3: cascade to loss of capability
// ---------------------------------------------------------------------------

#[test]
fn crit_empties_hand_and_blocks_further_chops() {
    let seed = find_seed(|roll| roll < 15);
    // Thin hand: two layers of one point each, so crit damage 2 empties it.
    let mut world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 1), Layer::new(Material::Bone, 1)],
    );

    world.submit(chop());
    let report = world.step();
    assert_eq!(report.results[0].1, InteractResult::CritFail);
    assert!(world.stores().layers.get(HAND).unwrap().is_empty());

    // The body-part gate precedes the roll, so the next attempt fails
    // the same way under every seed -- no commands, no state change.
    world.submit(chop());
    let report = world.step();
    assert_eq!(report.results[0].1, InteractResult::FailBodyPart);
    assert_eq!(report.applied, 0);
    assert_eq!(report.rejected, 0);

    let tree = world.stores().layers.get(TREE).unwrap();
    assert_eq!(tree.outermost().unwrap().integrity, 3);
}

// ---------------------------------------------------------------------------
// S4: tool too soft
// ---------------------------------------------------------------------------

#[test]
fn soft_tool_fails_condition_with_no_commands() {
    let mut world = build_chop_world(
        find_seed(|roll| roll >= 15),
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );
    world.stores_mut().tools.get_mut(ACTOR).unwrap().material = Material::Wood;
    *world.stores_mut().layers.get_mut(TREE).unwrap() =
        LayerStack::from_layers(&[Layer::new(Material::Stone, 4)]);

    world.submit(chop());
    let report = world.step();

    assert_eq!(report.results[0].1, InteractResult::FailCondition);
    assert_eq!(report.applied, 0);
    assert_eq!(
        world
            .stores()
            .layers
            .get(TREE)
            .unwrap()
            .outermost()
            .unwrap()
            .integrity,
        4
    );
}

// ---------------------------------------------------------------------------
// S5: item transform chain
// ---------------------------------------------------------------------------

const EATER: EntityId = EntityId::new(0);
const APPLE: EntityId = EntityId::new(50);

fn build_orchard_world() -> World {
    let mut world = World::new(0);

    // Item definitions: the Golden Apple chain.
    world
        .items_mut()
        .add(
            ItemDef::new(900, 900)
                .weight(50)
                .tags(ItemTags::CONSUMABLE | ItemTags::FOOD | ItemTags::FRUIT | ItemTags::RARE)
                .afford(
                    ItemAfford::new(VerbId::Eat, 901)
                        .with_prop(PropertyKey::Nutrition, 2500)
                        .with_prop(PropertyKey::Message, 1),
                ),
        )
        .unwrap();
    world
        .items_mut()
        .add(
            ItemDef::new(901, 901)
                .tags(ItemTags::ORGANIC | ItemTags::TRASH)
                .afford(ItemAfford::new(VerbId::Extract, 902).with_prop(PropertyKey::Message, 2)),
        )
        .unwrap();
    world
        .items_mut()
        .add(
            ItemDef::new(902, 902)
                .tags(ItemTags::SEED | ItemTags::ORGANIC)
                .afford(ItemAfford::new(VerbId::Plant, 903).with_prop(PropertyKey::Message, 3)),
        )
        .unwrap();
    world
        .items_mut()
        .add(
            ItemDef::new(903, 903)
                .tags(ItemTags::PLANT | ItemTags::ORGANIC)
                .afford(
                    ItemAfford::new(VerbId::Water, 0)
                        .with_prop(PropertyKey::GrowthAmount, 1000)
                        .with_prop(PropertyKey::Message, 4),
                ),
        )
        .unwrap();

    // Rules: item verbs are deterministic (difficulty 0). Eat also
    // feeds the actor from the item's nutrition property.
    world
        .rules_mut()
        .add(
            RuleDef::new(10, VerbId::Eat, CapabilityId::Eat).effect(RuleEffect::new(
                TargetRole::Actor,
                EffectKind::ModifyStat {
                    stat: StatId::Nutrition,
                    op: StatOp::Add,
                    amount: Amount::property(PropertyKey::Nutrition, 0),
                },
            )),
        )
        .unwrap();
    world
        .rules_mut()
        .add(RuleDef::new(11, VerbId::Extract, CapabilityId::Cultivate))
        .unwrap();
    world
        .rules_mut()
        .add(RuleDef::new(12, VerbId::Plant, CapabilityId::Cultivate))
        .unwrap();
    world
        .rules_mut()
        .add(RuleDef::new(13, VerbId::Water, CapabilityId::Cultivate))
        .unwrap();

    // Entities: the eater (0), their hand (1), and the apple (50).
    let entries = vec![
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Capabilities(
                Capabilities::new()
                    .with(CapabilityId::Eat)
                    .with(CapabilityId::Cultivate),
            ),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Anatomy(
                Anatomy::ARMS | Anatomy::HANDS | Anatomy::LEGS | Anatomy::MOUTH,
            ),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Skills(Skills::new()),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::Stats(Stats::new().with(StatId::Nutrition, 0, 10_000)),
        },
        ManifestEntry {
            entity_index: 0,
            component: ComponentPayload::BodyParts(
                BodyParts::new().with(BodyPartSlot::RightHand, EntityId::new(1)),
            ),
        },
        ManifestEntry {
            entity_index: 1,
            component: ComponentPayload::Layers(LayerStack::from_layers(&[
                Layer::new(Material::Flesh, 2),
                Layer::new(Material::Bone, 3),
            ])),
        },
        ManifestEntry {
            entity_index: 50,
            component: ComponentPayload::ItemRef(ItemRef { def_id: 900 }),
        },
        ManifestEntry {
            entity_index: 50,
            component: ComponentPayload::Affordances(
                Affordances::new()
                    .with(AffordanceId::Edible)
                    .with(AffordanceId::Extractable)
                    .with(AffordanceId::Plantable)
                    .with(AffordanceId::Waterable),
            ),
        },
    ];
    load_manifest(&mut world, &entries).unwrap();
    world
}

fn act(world: &mut World, verb: VerbId) -> TickReport {
    world.submit(InteractionRequest {
        actor: EATER,
        target: APPLE,
        verb,
    });
    world.step()
}

#[test]
fn transform_chain_eat_extract_plant() {
    let mut world = build_orchard_world();
    let def_of = |world: &World| world.stores().item_refs.get(APPLE).unwrap().def_id;

    // Eat: 900 -> 901, nutrition lands on the actor, message 1 plays.
    let report = act(&mut world, VerbId::Eat);
    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(def_of(&world), 901);
    assert_eq!(
        world.stores().stats.get(EATER).unwrap().get(StatId::Nutrition),
        2500
    );
    assert_eq!(world.feedback().len(), 1);
    assert_eq!(world.feedback()[0].message_id, 1);

    // Extract: 901 -> 902.
    let report = act(&mut world, VerbId::Extract);
    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(def_of(&world), 902);
    assert_eq!(world.feedback()[0].message_id, 2);

    // Plant: 902 -> 903.
    let report = act(&mut world, VerbId::Plant);
    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(def_of(&world), 903);
    assert_eq!(world.feedback()[0].message_id, 3);

    // Water: no transform, sapling stays 903, message 4 plays.
    let report = act(&mut world, VerbId::Water);
    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(def_of(&world), 903);
    assert_eq!(world.feedback()[0].message_id, 4);
}

#[test]
fn verb_the_item_does_not_afford_changes_nothing() {
    let mut world = build_orchard_world();
    // The apple's definition (900) has no Extract entry; the rule still
    // matches and succeeds, but no transform or feedback is emitted.
    let report = act(&mut world, VerbId::Extract);
    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(world.stores().item_refs.get(APPLE).unwrap().def_id, 900);
    assert!(world.feedback().is_empty());
}

// ---------------------------------------------------------------------------
// Tool target role
// ---------------------------------------------------------------------------

#[test]
fn tool_role_resolves_to_equipped_entity() {
    // Chopping wears the axe: the rule's second effect targets the
    // Tool role, which resolves to the actor's equipped entity.
    let seed = find_seed(|roll| roll >= 15);
    let mut world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );

    const AXE: EntityId = EntityId::new(3);
    let _ = world.create_entity(); // id 3, allocated after the manifest's 0..=2
    world
        .stores_mut()
        .stats
        .add(AXE, Stats::new().with(StatId::Health, 100, 100))
        .unwrap();
    world
        .stores_mut()
        .equipped
        .add(ACTOR, Equipped { tool: AXE })
        .unwrap();

    *world.rules_mut() = RuleTable::new();
    world
        .rules_mut()
        .add(
            chop_rule().effect(RuleEffect::new(
                TargetRole::Tool,
                EffectKind::ModifyStat {
                    stat: StatId::Health,
                    op: StatOp::Subtract,
                    amount: Amount::fixed(1),
                },
            )),
        )
        .unwrap();

    world.submit(chop());
    let report = world.step();

    assert_eq!(report.results[0].1, InteractResult::Success);
    assert_eq!(report.applied, 2);
    assert_eq!(world.stores().stats.get(AXE).unwrap().get(StatId::Health), 99);
}

// ---------------------------------------------------------------------------
// Single-writer discipline
// ---------------------------------------------------------------------------

#[test]
fn pipeline_processing_never_touches_stores() {
    let seed = find_seed(|roll| roll >= 15);
    let world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );

    let before = stores_digest(world.stores());

    // Run the pipeline against a detached buffer: commands are emitted
    // but nothing flushes.
    let mut buffer = CommandBuffer::new();
    let result = process(&world.view(), &chop(), EntityId::INVALID, &mut buffer);
    assert_eq!(result, InteractResult::Success);
    assert_eq!(buffer.len(), 1);

    let after = stores_digest(world.stores());
    assert_eq!(before, after, "read-only phase must not mutate stores");
}

#[test]
fn flush_is_the_only_mutation_point() {
    let seed = find_seed(|roll| roll >= 15);
    let mut world = build_chop_world(
        seed,
        &[Layer::new(Material::Flesh, 2), Layer::new(Material::Bone, 3)],
    );

    let before = stores_digest(world.stores());
    world.submit(chop());
    let report = world.step();
    assert_eq!(report.applied, 1);

    let after = stores_digest(world.stores());
    assert_ne!(before, after, "flush applies the emitted damage");
}
