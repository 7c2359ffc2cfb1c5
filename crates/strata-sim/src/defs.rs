//! Static definition tables: verbs, capabilities, skills, body parts.
//!
//! These are the closed identifier sets the rule pipeline dispatches
//! over, plus the two const lookup tables that tie them together:
//! [`CapabilityDef`] (what an actor needs to exercise a capability) and
//! [`VerbDef`] (which capability/affordance pair a verb engages).
//! Dispatch is always an exhaustive `match` -- no function pointers, so
//! behavior stays enumerable from the tables.

use serde::{Deserialize, Serialize};

use crate::components::Anatomy;

// ---------------------------------------------------------------------------
// Identifier enums
// ---------------------------------------------------------------------------

/// Skill identifiers; index into [`Skills`](crate::components::Skills).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkillId {
    #[default]
    None = 0,
    Woodcutting = 1,
    Mining = 2,
    Combat = 3,
    Foraging = 4,
    Farming = 5,
}

impl SkillId {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Named body-part slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyPartSlot {
    #[default]
    None = 0,
    RightHand = 1,
    LeftHand = 2,
    Torso = 3,
    Head = 4,
    Mouth = 5,
}

impl BodyPartSlot {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Actor capabilities. The discriminant is the bit position in
/// [`Capabilities`](crate::components::Capabilities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapabilityId {
    #[default]
    None = 0,
    Chop = 1,
    Mine = 2,
    Strike = 3,
    Eat = 4,
    Drink = 5,
    Cultivate = 6,
    Craft = 7,
}

/// Object affordances. The discriminant is the bit position in
/// [`Affordances`](crate::components::Affordances).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AffordanceId {
    #[default]
    None = 0,
    Choppable = 1,
    Mineable = 2,
    Hittable = 3,
    Edible = 4,
    Drinkable = 5,
    Extractable = 6,
    Plantable = 7,
    Waterable = 8,
}

/// Stat identifiers; index into [`Stats`](crate::components::Stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatId {
    Health = 0,
    Stamina = 1,
    Mana = 2,
    Nutrition = 3,
    Growth = 4,
}

impl StatId {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Verbs
// ---------------------------------------------------------------------------

/// Every verb the simulation knows. 1..=3 are the world-interaction
/// verbs; 20..=39 are the item verbs from the content design document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerbId {
    #[default]
    None = 0,
    Chop = 1,
    Mine = 2,
    Strike = 3,
    Examine = 20,
    Eat = 21,
    Drink = 22,
    Drop = 23,
    Place = 24,
    Light = 25,
    Extinguish = 26,
    Extract = 27,
    Plant = 28,
    Water = 29,
    Smelt = 30,
    Forge = 31,
    Sharpen = 32,
    Tan = 33,
    Etch = 34,
    Read = 35,
    Discard = 36,
    Throw = 37,
    Crumble = 38,
    Twist = 39,
}

impl VerbId {
    /// Decode a wire-level verb id; `None` for ids outside the table.
    /// Adapters map that to [`VerbId::None`], which the pipeline turns
    /// into a no-verb failure.
    pub fn from_raw(raw: u16) -> Option<VerbId> {
        Some(match raw {
            0 => VerbId::None,
            1 => VerbId::Chop,
            2 => VerbId::Mine,
            3 => VerbId::Strike,
            20 => VerbId::Examine,
            21 => VerbId::Eat,
            22 => VerbId::Drink,
            23 => VerbId::Drop,
            24 => VerbId::Place,
            25 => VerbId::Light,
            26 => VerbId::Extinguish,
            27 => VerbId::Extract,
            28 => VerbId::Plant,
            29 => VerbId::Water,
            30 => VerbId::Smelt,
            31 => VerbId::Forge,
            32 => VerbId::Sharpen,
            33 => VerbId::Tan,
            34 => VerbId::Etch,
            35 => VerbId::Read,
            36 => VerbId::Discard,
            37 => VerbId::Throw,
            38 => VerbId::Crumble,
            39 => VerbId::Twist,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Definition tables
// ---------------------------------------------------------------------------

/// What an actor needs before a capability can be exercised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityDef {
    /// Anatomy traits the actor must possess, all of them.
    pub required_anatomy: Anatomy,
    pub required_skill: SkillId,
    pub min_skill_level: i32,
    /// Body part whose layer stack must retain integrity; the fine-motor
    /// gate. [`BodyPartSlot::None`] disables the check.
    pub body_part_required: BodyPartSlot,
}

impl CapabilityId {
    /// The static prerequisite record for this capability.
    pub fn def(self) -> CapabilityDef {
        let (required_anatomy, required_skill, min_skill_level, body_part_required) = match self {
            CapabilityId::None => (Anatomy::NONE, SkillId::None, 0, BodyPartSlot::None),
            CapabilityId::Chop => (
                Anatomy::ARMS | Anatomy::HANDS,
                SkillId::Woodcutting,
                1,
                BodyPartSlot::RightHand,
            ),
            CapabilityId::Mine => (
                Anatomy::ARMS | Anatomy::HANDS,
                SkillId::Mining,
                1,
                BodyPartSlot::RightHand,
            ),
            CapabilityId::Strike => (Anatomy::ARMS, SkillId::Combat, 1, BodyPartSlot::None),
            CapabilityId::Eat => (Anatomy::MOUTH, SkillId::None, 0, BodyPartSlot::None),
            CapabilityId::Drink => (Anatomy::MOUTH, SkillId::None, 0, BodyPartSlot::None),
            CapabilityId::Cultivate => (
                Anatomy::ARMS | Anatomy::HANDS,
                SkillId::Farming,
                0,
                BodyPartSlot::RightHand,
            ),
            CapabilityId::Craft => (
                Anatomy::ARMS | Anatomy::HANDS,
                SkillId::None,
                0,
                BodyPartSlot::RightHand,
            ),
        };
        CapabilityDef {
            required_anatomy,
            required_skill,
            min_skill_level,
            body_part_required,
        }
    }
}

/// Which capability/affordance pair a verb engages.
///
/// A `None` capability skips the capability gate; a `None` affordance
/// skips the target-affordance gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbDef {
    pub actor_cap: CapabilityId,
    pub target_aff: AffordanceId,
}

impl VerbId {
    /// The static capability/affordance mapping for this verb.
    pub fn def(self) -> VerbDef {
        let (actor_cap, target_aff) = match self {
            VerbId::None => (CapabilityId::None, AffordanceId::None),
            VerbId::Chop => (CapabilityId::Chop, AffordanceId::Choppable),
            VerbId::Mine => (CapabilityId::Mine, AffordanceId::Mineable),
            VerbId::Strike => (CapabilityId::Strike, AffordanceId::Hittable),
            VerbId::Eat => (CapabilityId::Eat, AffordanceId::Edible),
            VerbId::Drink => (CapabilityId::Drink, AffordanceId::Drinkable),
            VerbId::Extract => (CapabilityId::Cultivate, AffordanceId::Extractable),
            VerbId::Plant => (CapabilityId::Cultivate, AffordanceId::Plantable),
            VerbId::Water => (CapabilityId::Cultivate, AffordanceId::Waterable),
            VerbId::Smelt
            | VerbId::Forge
            | VerbId::Sharpen
            | VerbId::Tan
            | VerbId::Etch => (CapabilityId::Craft, AffordanceId::None),
            VerbId::Examine
            | VerbId::Drop
            | VerbId::Place
            | VerbId::Light
            | VerbId::Extinguish
            | VerbId::Read
            | VerbId::Discard
            | VerbId::Throw
            | VerbId::Crumble
            | VerbId::Twist => (CapabilityId::None, AffordanceId::None),
        };
        VerbDef {
            actor_cap,
            target_aff,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
