//! Component record layouts.
//!
//! Every record the pipeline touches lives here: material layer stacks,
//! body-part tables, skills, the anatomy/capability/affordance
//! bitfields, tools, item references, stats, and the item-instance
//! components spawned from definition blueprints. Records are plain
//! data -- behavior beyond shape is limited to the layer-damage
//! semantics on [`LayerStack`], which the command applicators call.

use serde::{Deserialize, Serialize};
use strata_ecs::entity::EntityId;

use crate::defs::{AffordanceId, BodyPartSlot, CapabilityId, SkillId, StatId};

/// Maximum layers per destructible entity.
pub const MAX_LAYERS: usize = 4;
/// Body-part slots per actor, indexed by [`BodyPartSlot`].
pub const MAX_BODY_PARTS: usize = 6;
/// Skill slots per actor, indexed by [`SkillId`].
pub const MAX_SKILLS: usize = 8;
/// Stat slots per entity, indexed by [`StatId`].
pub const MAX_STATS: usize = 8;
/// Sentinel for "no destination" in [`Location`] / move commands.
pub const INVALID_PLACE: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// The closed set of layer materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    None,
    Wood,
    Stone,
    Iron,
    Flesh,
    Bark,
    Bone,
}

impl Material {
    /// Static hardness on the 0..=100 scale.
    pub fn hardness(self) -> i32 {
        match self {
            Material::None => 0,
            Material::Wood => 30,
            Material::Stone => 65,
            Material::Iron => 80,
            Material::Flesh => 10,
            Material::Bark => 25,
            Material::Bone => 40,
        }
    }
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One element of a material stack.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Layer {
    pub material: Material,
    pub integrity: i32,
    pub max_integrity: i32,
}

impl Layer {
    /// A fresh layer at full integrity.
    pub fn new(material: Material, integrity: i32) -> Self {
        Self {
            material,
            integrity,
            max_integrity: integrity,
        }
    }
}

/// Ordered stack of material layers; element 0 is outermost.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerStack {
    layers: [Layer; MAX_LAYERS],
    count: usize,
}

impl LayerStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from outermost-first layers. Excess layers beyond
    /// [`MAX_LAYERS`] are ignored.
    pub fn from_layers(layers: &[Layer]) -> Self {
        let mut stack = Self::new();
        for &layer in layers.iter().take(MAX_LAYERS) {
            stack.layers[stack.count] = layer;
            stack.count += 1;
        }
        stack
    }

    /// Number of remaining layers.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether all layers have been peeled away.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The current outermost layer, if any.
    pub fn outermost(&self) -> Option<&Layer> {
        if self.count == 0 {
            None
        } else {
            Some(&self.layers[0])
        }
    }

    /// The live layers, outermost first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers[..self.count]
    }

    /// Apply `amount` points of damage, one point at a time.
    ///
    /// Each point decrements the outermost layer's integrity; when it
    /// reaches zero the layer peels (subsequent layers shift up, the
    /// previously-second layer becomes outermost with its integrity
    /// intact) and remaining points carry into the new outermost layer.
    /// Returns the number of layers peeled.
    pub fn damage(&mut self, amount: i32) -> usize {
        let mut peeled = 0;
        let mut remaining = amount;
        while remaining > 0 && self.count > 0 {
            self.layers[0].integrity -= 1;
            remaining -= 1;
            if self.layers[0].integrity <= 0 {
                for i in 0..self.count - 1 {
                    self.layers[i] = self.layers[i + 1];
                }
                self.count -= 1;
                peeled += 1;
            }
        }
        peeled
    }
}

// ---------------------------------------------------------------------------
// Body parts
// ---------------------------------------------------------------------------

/// Slot table mapping [`BodyPartSlot`] to the entity owning that part's
/// layer stack. [`EntityId::INVALID`] marks an absent part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyParts {
    slots: [EntityId; MAX_BODY_PARTS],
}

impl Default for BodyParts {
    fn default() -> Self {
        Self {
            slots: [EntityId::INVALID; MAX_BODY_PARTS],
        }
    }
}

impl BodyParts {
    /// A table with every slot absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity backing `slot`, or [`EntityId::INVALID`].
    pub fn get(&self, slot: BodyPartSlot) -> EntityId {
        self.slots[slot.index()]
    }

    /// Point `slot` at a body-part entity.
    pub fn set(&mut self, slot: BodyPartSlot, entity: EntityId) {
        self.slots[slot.index()] = entity;
    }

    /// Builder convenience for fixtures and manifests.
    pub fn with(mut self, slot: BodyPartSlot, entity: EntityId) -> Self {
        self.set(slot, entity);
        self
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// Fixed-width skill levels keyed by [`SkillId`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skills {
    levels: [i32; MAX_SKILLS],
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, skill: SkillId) -> i32 {
        self.levels[skill.index()]
    }

    pub fn set_level(&mut self, skill: SkillId, level: i32) {
        self.levels[skill.index()] = level;
    }

    pub fn with(mut self, skill: SkillId, level: i32) -> Self {
        self.set_level(skill, level);
        self
    }
}

// ---------------------------------------------------------------------------
// Anatomy
// ---------------------------------------------------------------------------

/// Bitfield over anatomy traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Anatomy(u32);

impl Anatomy {
    pub const NONE: Anatomy = Anatomy(0);
    pub const ARMS: Anatomy = Anatomy(1 << 0);
    pub const LEGS: Anatomy = Anatomy(1 << 1);
    pub const HANDS: Anatomy = Anatomy(1 << 2);
    pub const MOUTH: Anatomy = Anatomy(1 << 3);

    /// Whether every trait in `required` is present.
    pub fn contains_all(self, required: Anatomy) -> bool {
        self.0 & required.0 == required.0
    }
}

impl std::ops::BitOr for Anatomy {
    type Output = Anatomy;

    fn bitor(self, rhs: Anatomy) -> Anatomy {
        Anatomy(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Capabilities / Affordances
// ---------------------------------------------------------------------------

/// Actor-side bitfield: which verbs this entity can potentially perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities(u32);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(self, cap: CapabilityId) -> bool {
        self.0 & (1 << cap as u32) != 0
    }

    pub fn grant(&mut self, cap: CapabilityId) {
        self.0 |= 1 << cap as u32;
    }

    pub fn with(mut self, cap: CapabilityId) -> Self {
        self.grant(cap);
        self
    }
}

/// Object-side bitfield: which verbs this entity admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Affordances(u32);

impl Affordances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(self, aff: AffordanceId) -> bool {
        self.0 & (1 << aff as u32) != 0
    }

    pub fn grant(&mut self, aff: AffordanceId) {
        self.0 |= 1 << aff as u32;
    }

    pub fn with(mut self, aff: AffordanceId) -> Self {
        self.grant(aff);
        self
    }
}

// ---------------------------------------------------------------------------
// Tool / equipment / item reference
// ---------------------------------------------------------------------------

/// The currently-wielded tool material, used by hardness conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub material: Material,
}

/// The actor's wielded tool entity, for the `Tool` command-target role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equipped {
    pub tool: EntityId,
}

/// Which item definition this entity currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    pub def_id: u32,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Fixed-width stat block keyed by [`StatId`]. `maxima` is informational
/// (snapshot hp/max_hp); stat commands mutate `values` only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    values: [i32; MAX_STATS],
    maxima: [i32; MAX_STATS],
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: StatId) -> i32 {
        self.values[stat.index()]
    }

    pub fn max(&self, stat: StatId) -> i32 {
        self.maxima[stat.index()]
    }

    pub fn set(&mut self, stat: StatId, value: i32) {
        self.values[stat.index()] = value;
    }

    pub fn set_max(&mut self, stat: StatId, max: i32) {
        self.maxima[stat.index()] = max;
    }

    /// Builder convenience: set a value and its maximum together.
    pub fn with(mut self, stat: StatId, value: i32, max: i32) -> Self {
        self.set(stat, value);
        self.set_max(stat, max);
        self
    }
}

// ---------------------------------------------------------------------------
// Spatial / presentation
// ---------------------------------------------------------------------------

/// Grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Display glyph for the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyph {
    pub ch: char,
}

/// Container/zone record mutated by move commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub place: u32,
}

// ---------------------------------------------------------------------------
// Item-instance components (spawned from definition blueprints)
// ---------------------------------------------------------------------------

/// Stackable item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub count: i32,
}

/// Item quality, fixed-point x100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    pub value: i32,
}

/// Item durability, fixed-point x100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    pub max: i32,
    pub current: i32,
}

/// Growth stage for plantable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub stage: i32,
    pub max_stage: i32,
}

/// Light emission, fixed-point x100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSource {
    pub radius: i32,
    pub intensity: i32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bark_over_wood() -> LayerStack {
        LayerStack::from_layers(&[Layer::new(Material::Bark, 3), Layer::new(Material::Wood, 5)])
    }

    // -- layer damage -------------------------------------------------------

    #[test]
    fn partial_damage_keeps_layer() {
        let mut stack = bark_over_wood();
        let peeled = stack.damage(1);
        assert_eq!(peeled, 0);
        let outer = stack.outermost().unwrap();
        assert_eq!(outer.material, Material::Bark);
        assert_eq!(outer.integrity, 2);
        assert_eq!(outer.max_integrity, 3);
    }

    #[test]
    fn exact_damage_peels_layer() {
        let mut stack = bark_over_wood();
        let peeled = stack.damage(3);
        assert_eq!(peeled, 1);
        let outer = stack.outermost().unwrap();
        // The previously-second layer surfaces with integrity intact.
        assert_eq!(outer.material, Material::Wood);
        assert_eq!(outer.integrity, 5);
        assert_eq!(stack.count(), 1);
    }

    #[test]
    fn overflow_damage_carries_into_next_layer() {
        let mut stack = bark_over_wood();
        let peeled = stack.damage(4);
        assert_eq!(peeled, 1);
        let outer = stack.outermost().unwrap();
        assert_eq!(outer.material, Material::Wood);
        assert_eq!(outer.integrity, 4);
    }

    #[test]
    fn damage_exhausts_whole_stack() {
        let mut stack = LayerStack::from_layers(&[
            Layer::new(Material::Flesh, 1),
            Layer::new(Material::Bone, 1),
        ]);
        let peeled = stack.damage(2);
        assert_eq!(peeled, 2);
        assert!(stack.is_empty());
        assert_eq!(stack.outermost(), None);
    }

    #[test]
    fn damage_on_empty_stack_is_noop() {
        let mut stack = LayerStack::new();
        assert_eq!(stack.damage(10), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn excess_damage_stops_at_empty() {
        let mut stack = LayerStack::from_layers(&[Layer::new(Material::Flesh, 2)]);
        let peeled = stack.damage(100);
        assert_eq!(peeled, 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn from_layers_truncates_at_max() {
        let layer = Layer::new(Material::Stone, 1);
        let stack = LayerStack::from_layers(&[layer; 6]);
        assert_eq!(stack.count(), MAX_LAYERS);
    }

    // -- hardness -----------------------------------------------------------

    #[test]
    fn hardness_table() {
        assert_eq!(Material::None.hardness(), 0);
        assert_eq!(Material::Flesh.hardness(), 10);
        assert_eq!(Material::Bark.hardness(), 25);
        assert_eq!(Material::Wood.hardness(), 30);
        assert_eq!(Material::Bone.hardness(), 40);
        assert_eq!(Material::Stone.hardness(), 65);
        assert_eq!(Material::Iron.hardness(), 80);
    }

    // -- bitfields ----------------------------------------------------------

    #[test]
    fn anatomy_contains_all() {
        let humanoid = Anatomy::ARMS | Anatomy::HANDS | Anatomy::LEGS;
        assert!(humanoid.contains_all(Anatomy::ARMS | Anatomy::HANDS));
        assert!(!humanoid.contains_all(Anatomy::MOUTH));
        assert!(humanoid.contains_all(Anatomy::NONE));
    }

    #[test]
    fn capability_bits_are_independent() {
        let caps = Capabilities::new()
            .with(CapabilityId::Chop)
            .with(CapabilityId::Eat);
        assert!(caps.has(CapabilityId::Chop));
        assert!(caps.has(CapabilityId::Eat));
        assert!(!caps.has(CapabilityId::Mine));
    }

    #[test]
    fn affordance_bits_are_independent() {
        let affs = Affordances::new().with(AffordanceId::Choppable);
        assert!(affs.has(AffordanceId::Choppable));
        assert!(!affs.has(AffordanceId::Mineable));
    }

    // -- body parts ---------------------------------------------------------

    #[test]
    fn body_part_slots_default_absent() {
        let parts = BodyParts::new();
        assert_eq!(parts.get(BodyPartSlot::RightHand), EntityId::INVALID);
        let parts = parts.with(BodyPartSlot::RightHand, EntityId::new(9));
        assert_eq!(parts.get(BodyPartSlot::RightHand), EntityId::new(9));
        assert_eq!(parts.get(BodyPartSlot::LeftHand), EntityId::INVALID);
    }

    // -- stats --------------------------------------------------------------

    #[test]
    fn stats_roundtrip() {
        let stats = Stats::new().with(StatId::Health, 8, 10);
        assert_eq!(stats.get(StatId::Health), 8);
        assert_eq!(stats.max(StatId::Health), 10);
        assert_eq!(stats.get(StatId::Stamina), 0);
    }
}
