//! World-load manifest: data-driven initialization.
//!
//! A manifest is a flat sequence of "attach this component to this
//! entity index" records -- the compiled output of the upstream world
//! description. The loader allocates entity ids contiguously up to the
//! highest index referenced, then walks the records populating stores.
//! It is the only way the core populates a world; after loading, all
//! mutation flows through commands.
//!
//! The JSON path is lenient: records naming unknown component types are
//! skipped with a warning rather than failing the load.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::components::{
    Affordances, Anatomy, BodyParts, Capabilities, Durability, Equipped, Glyph, Growth, ItemRef,
    LayerStack, LightSource, Location, Position, Quality, Skills, Stack, Stats, Tool,
};
use crate::world::World;

// ---------------------------------------------------------------------------
// Manifest schema
// ---------------------------------------------------------------------------

/// One component payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentPayload {
    Layers(LayerStack),
    BodyParts(BodyParts),
    Skills(Skills),
    Anatomy(Anatomy),
    Capabilities(Capabilities),
    Affordances(Affordances),
    Tool(Tool),
    Equipped(Equipped),
    ItemRef(ItemRef),
    Stats(Stats),
    Position(Position),
    Glyph(Glyph),
    Location(Location),
    Stack(Stack),
    Quality(Quality),
    Durability(Durability),
    Growth(Growth),
    LightSource(LightSource),
}

/// "Attach this data to this entity index." Indices are 0-based and the
/// loader allocates entities sequentially, so index 0 becomes entity 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub entity_index: u32,
    pub component: ComponentPayload,
}

/// What a load did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub entities_allocated: u32,
    pub components_added: u32,
    /// Records skipped: unknown component types (JSON path) or store
    /// add failures (duplicates, capacity).
    pub skipped: u32,
}

/// Manifest loading failures that abort the load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The manifest references more entities than the world admits.
    #[error("manifest needs {needed} entities but the world holds at most {capacity}")]
    AddressSpaceExhausted { needed: u32, capacity: u32 },

    /// The manifest JSON is not an array of records.
    #[error("malformed manifest: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Populate `world` from manifest entries.
///
/// Phase 1 allocates entity ids contiguously up to the maximum index
/// referenced (entries may arrive unordered). Phase 2 adds each
/// component to its store; individual add failures are warned and
/// counted as skipped, they do not abort the load.
pub fn load_manifest(world: &mut World, entries: &[ManifestEntry]) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();

    // Phase 1: ensure entities exist.
    if let Some(max_index) = entries.iter().map(|e| e.entity_index).max() {
        let needed = max_index + 1;
        while world.entity_count() < needed {
            if world.create_entity().is_none() {
                return Err(LoadError::AddressSpaceExhausted {
                    needed,
                    capacity: world.entity_count(),
                });
            }
            report.entities_allocated += 1;
        }
    }

    // Phase 2: populate components.
    for entry in entries {
        let entity = strata_ecs::entity::EntityId::new(entry.entity_index);
        let stores = world.stores_mut();
        let result = match entry.component.clone() {
            ComponentPayload::Layers(v) => stores.layers.add(entity, v),
            ComponentPayload::BodyParts(v) => stores.body_parts.add(entity, v),
            ComponentPayload::Skills(v) => stores.skills.add(entity, v),
            ComponentPayload::Anatomy(v) => stores.anatomy.add(entity, v),
            ComponentPayload::Capabilities(v) => stores.capabilities.add(entity, v),
            ComponentPayload::Affordances(v) => stores.affordances.add(entity, v),
            ComponentPayload::Tool(v) => stores.tools.add(entity, v),
            ComponentPayload::Equipped(v) => stores.equipped.add(entity, v),
            ComponentPayload::ItemRef(v) => stores.item_refs.add(entity, v),
            ComponentPayload::Stats(v) => stores.stats.add(entity, v),
            ComponentPayload::Position(v) => stores.positions.add(entity, v),
            ComponentPayload::Glyph(v) => stores.glyphs.add(entity, v),
            ComponentPayload::Location(v) => stores.locations.add(entity, v),
            ComponentPayload::Stack(v) => stores.stacks.add(entity, v),
            ComponentPayload::Quality(v) => stores.qualities.add(entity, v),
            ComponentPayload::Durability(v) => stores.durabilities.add(entity, v),
            ComponentPayload::Growth(v) => stores.growths.add(entity, v),
            ComponentPayload::LightSource(v) => stores.lights.add(entity, v),
        };
        match result {
            Ok(()) => report.components_added += 1,
            Err(err) => {
                report.skipped += 1;
                warn!(entity_index = entry.entity_index, %err, "manifest record skipped");
            }
        }
    }

    Ok(report)
}

/// Populate `world` from a JSON manifest: an array of entry records.
///
/// Records that fail to decode (unknown component types, shape
/// mismatches) are skipped with a warning; only a malformed top-level
/// document aborts.
pub fn load_manifest_json(world: &mut World, json: &str) -> Result<LoadReport, LoadError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut entries = Vec::with_capacity(raw.len());
    let mut skipped = 0u32;
    for value in raw {
        match serde_json::from_value::<ManifestEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                skipped += 1;
                warn!(%err, "unknown or malformed manifest record skipped");
            }
        }
    }

    let mut report = load_manifest(world, &entries)?;
    report.skipped += skipped;
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
