//! Item definitions: the static, shared half of every item.
//!
//! An item has two layers. The *definition* ([`ItemDef`]) is immutable
//! and shared: name, weight, tags, which verbs it affords (and what the
//! item becomes when one succeeds), and the blueprint of instance
//! components to attach on spawn. The *instance* is an entity carrying
//! an [`ItemRef`](crate::components::ItemRef) plus whatever the
//! blueprint spawned (stack count, durability, quality, growth, light).
//!
//! Transform chains hang off affordance entries: an entry with a
//! non-zero `transform_to` means "succeeding at this verb turns the
//! entity into that definition" -- the entity id stays the same, only
//! the referenced definition changes, via a transform command at flush.
//!
//! Lookup is a linear scan. The table is small and read-mostly;
//! a sorted or hashed index can replace the scan without touching the
//! call sites.

use serde::{Deserialize, Serialize};

use crate::defs::VerbId;
use crate::SimError;

/// Maximum item definitions in the table.
pub const MAX_ITEM_DEFS: usize = 256;
/// Maximum affordance entries per definition.
pub const MAX_ITEM_AFFORDS: usize = 8;
/// Maximum properties per affordance entry.
pub const MAX_ITEM_PROPS: usize = 8;
/// Maximum component blueprints per definition.
pub const MAX_ITEM_COMPS: usize = 4;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Item category bitfield, used for filtering and recipe checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemTags(u32);

impl ItemTags {
    pub const NONE: ItemTags = ItemTags(0);
    pub const WEAPON: ItemTags = ItemTags(1 << 0);
    pub const METAL: ItemTags = ItemTags(1 << 1);
    pub const CONSUMABLE: ItemTags = ItemTags(1 << 2);
    pub const LIQUID: ItemTags = ItemTags(1 << 3);
    pub const HEALING: ItemTags = ItemTags(1 << 4);
    pub const FOOD: ItemTags = ItemTags(1 << 5);
    pub const CONTAINER: ItemTags = ItemTags(1 << 6);
    pub const GLASS: ItemTags = ItemTags(1 << 7);
    pub const CRAFTING: ItemTags = ItemTags(1 << 8);
    pub const TRASH: ItemTags = ItemTags(1 << 9);
    pub const SHARP: ItemTags = ItemTags(1 << 10);
    pub const MATERIAL: ItemTags = ItemTags(1 << 11);
    pub const ORGANIC: ItemTags = ItemTags(1 << 12);
    pub const SEED: ItemTags = ItemTags(1 << 13);
    pub const PLANT: ItemTags = ItemTags(1 << 14);
    pub const TOOL: ItemTags = ItemTags(1 << 15);
    pub const FIRE: ItemTags = ItemTags(1 << 16);
    pub const MAGIC: ItemTags = ItemTags(1 << 17);
    pub const DOCUMENT: ItemTags = ItemTags(1 << 18);
    pub const LEATHER: ItemTags = ItemTags(1 << 19);
    pub const ORE: ItemTags = ItemTags(1 << 20);
    pub const REFINED: ItemTags = ItemTags(1 << 21);
    pub const SPOILED: ItemTags = ItemTags(1 << 22);
    pub const RARE: ItemTags = ItemTags(1 << 23);
    pub const BLUNT: ItemTags = ItemTags(1 << 24);
    pub const BONE: ItemTags = ItemTags(1 << 25);
    pub const INSCRIBED: ItemTags = ItemTags(1 << 26);
    pub const LIGHT: ItemTags = ItemTags(1 << 27);
    pub const BURNING: ItemTags = ItemTags(1 << 28);
    pub const MEAT: ItemTags = ItemTags(1 << 29);
    pub const FRUIT: ItemTags = ItemTags(1 << 30);

    pub fn contains(self, other: ItemTags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ItemTags {
    type Output = ItemTags;

    fn bitor(self, rhs: ItemTags) -> ItemTags {
        ItemTags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Known property keys attachable to an affordance entry. Float-valued
/// properties are fixed-point x100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKey {
    HealAmount,
    /// Feedback message id paired with the affordance.
    Message,
    Nutrition,
    /// Redundant with `transform_to`; available for rule indirection.
    TransformId,
    Damage,
    StaminaCost,
    ManaCost,
    DurabilityLoss,
    Description,
    GrowthAmount,
    QualityBoost,
    RepairAmount,
    Price,
    SellValue,
    ArmorValue,
    StrengthReq,
    ArrowCost,
    SpellEffect,
}

/// One typed key -> integer pair on an affordance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProp {
    pub key: PropertyKey,
    pub value: i32,
}

// ---------------------------------------------------------------------------
// Affordance entries
// ---------------------------------------------------------------------------

/// "What can be done to this item, and what happens when it succeeds."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAfford {
    pub verb: VerbId,
    /// Definition id this item becomes on success; 0 means no change.
    pub transform_to: u32,
    props: Vec<ItemProp>,
}

impl ItemAfford {
    pub fn new(verb: VerbId, transform_to: u32) -> Self {
        Self {
            verb,
            transform_to,
            props: Vec::new(),
        }
    }

    /// Builder: attach a property. Entries beyond [`MAX_ITEM_PROPS`] are
    /// rejected at table insertion.
    pub fn with_prop(mut self, key: PropertyKey, value: i32) -> Self {
        self.props.push(ItemProp { key, value });
        self
    }

    /// Look up a property value, falling back to `default`.
    pub fn property(&self, key: PropertyKey, default: i32) -> i32 {
        self.props
            .iter()
            .find(|p| p.key == key)
            .map_or(default, |p| p.value)
    }

    pub fn props(&self) -> &[ItemProp] {
        &self.props
    }
}

// ---------------------------------------------------------------------------
// Component blueprints
// ---------------------------------------------------------------------------

/// Instance components to attach when an item entity is spawned.
/// Fixed-point fields are x100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentInit {
    Stack { count: i32 },
    Quality { value: i32 },
    Durability { max: i32, current: i32 },
    Growth { stage: i32, max_stage: i32 },
    Light { radius: i32, intensity: i32 },
}

// ---------------------------------------------------------------------------
// ItemDef
// ---------------------------------------------------------------------------

/// The complete static definition of an item, indexed by `def_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub def_id: u32,
    /// Index into the external name/string table.
    pub name_id: u32,
    /// Weight x100.
    pub weight: i32,
    pub tags: ItemTags,
    affordances: Vec<ItemAfford>,
    components: Vec<ComponentInit>,
}

impl ItemDef {
    pub fn new(def_id: u32, name_id: u32) -> Self {
        Self {
            def_id,
            name_id,
            weight: 0,
            tags: ItemTags::NONE,
            affordances: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn tags(mut self, tags: ItemTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn afford(mut self, afford: ItemAfford) -> Self {
        self.affordances.push(afford);
        self
    }

    pub fn component(mut self, init: ComponentInit) -> Self {
        self.components.push(init);
        self
    }

    /// The affordance entry responding to `verb`, if the item has one.
    pub fn find_affordance(&self, verb: VerbId) -> Option<&ItemAfford> {
        self.affordances.iter().find(|a| a.verb == verb)
    }

    pub fn affordances(&self) -> &[ItemAfford] {
        &self.affordances
    }

    pub fn components(&self) -> &[ComponentInit] {
        &self.components
    }
}

// ---------------------------------------------------------------------------
// ItemTable
// ---------------------------------------------------------------------------

/// Bounded lookup table of item definitions.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    defs: Vec<ItemDef>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition, validating the per-definition bounds.
    pub fn add(&mut self, def: ItemDef) -> Result<(), SimError> {
        if self.defs.len() >= MAX_ITEM_DEFS {
            return Err(SimError::ItemTableFull {
                capacity: MAX_ITEM_DEFS,
            });
        }
        if self.get(def.def_id).is_some() {
            return Err(SimError::DuplicateItemDef { def_id: def.def_id });
        }
        if def.affordances.len() > MAX_ITEM_AFFORDS
            || def.components.len() > MAX_ITEM_COMPS
            || def.affordances.iter().any(|a| a.props.len() > MAX_ITEM_PROPS)
        {
            return Err(SimError::ItemDefOverflow { def_id: def.def_id });
        }
        self.defs.push(def);
        Ok(())
    }

    /// Look up a definition by id. Linear scan.
    pub fn get(&self, def_id: u32) -> Option<&ItemDef> {
        self.defs.iter().find(|d| d.def_id == def_id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
