//! Strata Sim -- rule-driven interaction core over packed stores.
//!
//! This crate holds the simulation semantics of the Strata engine: the
//! component data model, the material layer engine, the item definition
//! table with its transform chains, the compiled rule surface, the
//! seven-stage interaction pipeline, and the deferred command buffer
//! that is the single place world state ever changes.
//!
//! The shape of a tick, driven by `strata-engine`:
//!
//! 1. Read-only systems inspect a [`WorldView`](world::WorldView) and
//!    queue commands.
//! 2. Pending [`InteractionRequest`](pipeline::InteractionRequest)s run
//!    through the pipeline, which queues more commands.
//! 3. The command buffer flushes: applicators mutate stores.
//! 4. Observers build a [`WorldSnapshot`](snapshot::WorldSnapshot).
//!
//! # Quick Start
//!
//! ```
//! use strata_sim::prelude::*;
//!
//! let mut world = World::new(0xC0FFEE);
//! let apple = {
//!     world
//!         .items_mut()
//!         .add(
//!             ItemDef::new(900, 900)
//!                 .afford(ItemAfford::new(VerbId::Examine, 0)),
//!         )
//!         .unwrap();
//!     world.spawn_item(900).unwrap()
//! };
//!
//! assert_eq!(world.stores().item_refs.get(apple).unwrap().def_id, 900);
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod components;
pub mod defs;
pub mod items;
pub mod loader;
pub mod pipeline;
pub mod rules;
pub mod snapshot;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from table authoring and entity spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// The item definition table is at capacity.
    #[error("item table full (capacity {capacity})")]
    ItemTableFull { capacity: usize },

    /// A definition with this id already exists.
    #[error("item definition {def_id} already registered")]
    DuplicateItemDef { def_id: u32 },

    /// A definition exceeds its affordance/property/blueprint bounds.
    #[error("item definition {def_id} exceeds its static bounds")]
    ItemDefOverflow { def_id: u32 },

    /// No definition with this id.
    #[error("unknown item definition {def_id}")]
    UnknownItemDef { def_id: u32 },

    /// The rule table is at capacity.
    #[error("rule table full (capacity {capacity})")]
    RuleTableFull { capacity: usize },

    /// A rule exceeds its condition/effect bounds.
    #[error("rule {rule_id} exceeds its static bounds")]
    RuleOverflow { rule_id: u32 },

    /// The entity address space is exhausted.
    #[error("entity address space exhausted (capacity {capacity})")]
    EntitiesExhausted { capacity: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use strata_ecs::prelude::*;

    pub use crate::command::{
        Command, CommandBuffer, CommandKind, FeedbackEvent, FlushReport, StatOp, MAX_COMMANDS,
    };
    pub use crate::components::{
        Affordances, Anatomy, BodyParts, Capabilities, Durability, Equipped, Glyph, Growth,
        ItemRef, Layer, LayerStack, LightSource, Location, Material, Position, Quality, Skills,
        Stack, Stats, Tool, INVALID_PLACE, MAX_BODY_PARTS, MAX_LAYERS, MAX_SKILLS, MAX_STATS,
    };
    pub use crate::defs::{
        AffordanceId, BodyPartSlot, CapabilityId, SkillId, StatId, VerbId,
    };
    pub use crate::items::{
        ComponentInit, ItemAfford, ItemDef, ItemTable, ItemTags, PropertyKey, MAX_ITEM_AFFORDS,
        MAX_ITEM_COMPS, MAX_ITEM_DEFS, MAX_ITEM_PROPS,
    };
    pub use crate::loader::{
        load_manifest, load_manifest_json, ComponentPayload, LoadError, LoadReport, ManifestEntry,
    };
    pub use crate::pipeline::{process, InteractResult, InteractionRequest};
    pub use crate::rules::{
        Amount, Condition, EffectKind, RuleDef, RuleEffect, RuleTable, TargetRole, MAX_RULES,
        MAX_RULE_CONDS, MAX_RULE_EFFECTS,
    };
    pub use crate::snapshot::{stores_digest, EntityView, LayerView, WorldSnapshot};
    pub use crate::world::{
        SystemFn, TickReport, World, WorldView, MAX_ENTITIES, MAX_REQUESTS,
    };
    pub use crate::SimError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
