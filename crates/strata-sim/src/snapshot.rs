//! Observer snapshots and state digests.
//!
//! After a flush the external presentation layer needs a read-only view
//! of the world: per visible entity, where it is, what it looks like,
//! its outermost material layer, health, and whether it is still alive,
//! plus the feedback messages the tick produced. [`World::snapshot`]
//! builds that view ordered by entity id.
//!
//! Digests serialize state canonically (entity-id order, stable field
//! order) and hash it with BLAKE3. Two worlds that evolved identically
//! digest identically, which is what the replay and single-writer test
//! suites check.

use serde::{Deserialize, Serialize};
use strata_ecs::entity::EntityId;

use crate::command::FeedbackEvent;
use crate::components::{Material, Position};
use crate::defs::StatId;
use crate::world::{Stores, World};

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// The outermost layer of an entity, as the renderer needs it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerView {
    pub material: Material,
    pub integrity: i32,
    pub max_integrity: i32,
}

/// One visible entity in the observer view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub entity: EntityId,
    pub position: Position,
    pub glyph: Option<char>,
    pub outer_layer: Option<LayerView>,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
}

/// A read-only view of the world built after flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// Visible entities (those with a position), ordered by id.
    pub entities: Vec<EntityView>,
    /// Feedback messages recorded by this tick's flush.
    pub feedback: Vec<FeedbackEvent>,
}

impl WorldSnapshot {
    /// BLAKE3 hex digest of the serialized snapshot.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("snapshot is always serializable");
        blake3::hash(&bytes).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Snapshot construction
// ---------------------------------------------------------------------------

impl World {
    /// Build the observer view for the current state.
    ///
    /// Pure read; call after [`step`](World::step) so the view reflects
    /// this tick's flush. An entity is visible iff it has a position;
    /// `alive` reports whether any store still holds it.
    pub fn snapshot(&self) -> WorldSnapshot {
        let stores = self.stores();

        let mut ids: Vec<EntityId> = stores.positions.entities().to_vec();
        ids.sort_unstable();

        let entities = ids
            .into_iter()
            .map(|entity| {
                let position = *stores
                    .positions
                    .get(entity)
                    .expect("id came from the position store");
                let glyph = stores.glyphs.get(entity).map(|g| g.ch);
                let outer_layer =
                    stores
                        .layers
                        .get(entity)
                        .and_then(|stack| stack.outermost())
                        .map(|layer| LayerView {
                            material: layer.material,
                            integrity: layer.integrity,
                            max_integrity: layer.max_integrity,
                        });
                let (hp, max_hp) = stores
                    .stats
                    .get(entity)
                    .map_or((0, 0), |stats| {
                        (stats.get(StatId::Health), stats.max(StatId::Health))
                    });
                EntityView {
                    entity,
                    position,
                    glyph,
                    outer_layer,
                    hp,
                    max_hp,
                    alive: stores.holds(entity),
                }
            })
            .collect();

        WorldSnapshot {
            // `step` advances the counter after flushing, so the state
            // we see belongs to the previous tick number.
            tick: self.tick().saturating_sub(1),
            entities,
            feedback: self.feedback().to_vec(),
        }
    }

    /// BLAKE3 hex digest of the full mutable state: seed, tick, and
    /// every store in canonical order.
    pub fn digest(&self) -> String {
        #[derive(Serialize)]
        struct Hashable {
            seed: u32,
            tick: u64,
            stores: serde_json::Value,
        }

        let hashable = Hashable {
            seed: self.seed(),
            tick: self.tick(),
            stores: canonical_stores(self.stores()),
        };
        let bytes = serde_json::to_vec(&hashable).expect("world state is always serializable");
        blake3::hash(&bytes).to_hex().to_string()
    }
}

/// BLAKE3 hex digest of store contents alone, independent of tick and
/// seed. Used to verify the read-only phase leaves stores untouched.
pub fn stores_digest(stores: &Stores) -> String {
    let bytes =
        serde_json::to_vec(&canonical_stores(stores)).expect("stores are always serializable");
    blake3::hash(&bytes).to_hex().to_string()
}

/// Serialize every store as `[entity, payload]` pairs in ascending
/// entity order, so the digest depends on content rather than on the
/// swap history of the packed arrays.
fn canonical_stores(stores: &Stores) -> serde_json::Value {
    fn entries<T: Serialize>(
        set: &strata_ecs::store::SparseSet<T>,
    ) -> Vec<(u32, serde_json::Value)> {
        let mut ids: Vec<EntityId> = set.entities().to_vec();
        ids.sort_unstable();
        ids.into_iter()
            .map(|e| {
                let value = serde_json::to_value(set.get(e).expect("id came from the store"))
                    .expect("component is always serializable");
                (e.raw(), value)
            })
            .collect()
    }

    serde_json::json!({
        "layers": entries(&stores.layers),
        "body_parts": entries(&stores.body_parts),
        "skills": entries(&stores.skills),
        "anatomy": entries(&stores.anatomy),
        "capabilities": entries(&stores.capabilities),
        "affordances": entries(&stores.affordances),
        "tools": entries(&stores.tools),
        "equipped": entries(&stores.equipped),
        "item_refs": entries(&stores.item_refs),
        "stats": entries(&stores.stats),
        "positions": entries(&stores.positions),
        "glyphs": entries(&stores.glyphs),
        "locations": entries(&stores.locations),
        "stacks": entries(&stores.stacks),
        "qualities": entries(&stores.qualities),
        "durabilities": entries(&stores.durabilities),
        "growths": entries(&stores.growths),
        "lights": entries(&stores.lights),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
