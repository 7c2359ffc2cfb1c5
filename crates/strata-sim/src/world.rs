//! The world: every store, table, and queue behind one value.
//!
//! All simulation state lives in a single [`World`] -- the entity
//! allocator, one sparse set per component kind, the item and rule
//! tables, the command buffer, the pending request queue, and the tick
//! counter. Every entry point takes `&mut World`, which makes the
//! read-only-then-apply discipline structural: systems and the pipeline
//! see a shared [`WorldView`], and the only path that writes to stores
//! is the command-buffer flush inside [`World::step`].
//!
//! Storage is sized once at construction; the tick loop never allocates.

use serde::{Deserialize, Serialize};
use strata_ecs::entity::{EntityAllocator, EntityId};
use strata_ecs::store::SparseSet;
use tracing::warn;

use crate::command::{CommandBuffer, FeedbackEvent, MAX_COMMANDS};
use crate::components::{
    Affordances, Anatomy, BodyParts, Capabilities, Durability, Equipped, Glyph, Growth, ItemRef,
    LayerStack, LightSource, Location, Position, Quality, Skills, Stack, Stats, Tool,
};
use crate::items::{ComponentInit, ItemTable};
use crate::pipeline::{self, InteractResult, InteractionRequest};
use crate::rules::RuleTable;
use crate::SimError;

/// Hard upper bound on entities per world.
pub const MAX_ENTITIES: usize = 1024;
/// Pending interaction requests per tick; excess is dropped, and
/// requests never carry across ticks.
pub const MAX_REQUESTS: usize = 64;

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// One sparse set per component kind.
#[derive(Debug)]
pub struct Stores {
    pub layers: SparseSet<LayerStack>,
    pub body_parts: SparseSet<BodyParts>,
    pub skills: SparseSet<Skills>,
    pub anatomy: SparseSet<Anatomy>,
    pub capabilities: SparseSet<Capabilities>,
    pub affordances: SparseSet<Affordances>,
    pub tools: SparseSet<Tool>,
    pub equipped: SparseSet<Equipped>,
    pub item_refs: SparseSet<ItemRef>,
    pub stats: SparseSet<Stats>,
    pub positions: SparseSet<Position>,
    pub glyphs: SparseSet<Glyph>,
    pub locations: SparseSet<Location>,
    pub stacks: SparseSet<Stack>,
    pub qualities: SparseSet<Quality>,
    pub durabilities: SparseSet<Durability>,
    pub growths: SparseSet<Growth>,
    pub lights: SparseSet<LightSource>,
}

impl Stores {
    /// Create every store with the same entity capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            layers: SparseSet::new(capacity),
            body_parts: SparseSet::new(capacity),
            skills: SparseSet::new(capacity),
            anatomy: SparseSet::new(capacity),
            capabilities: SparseSet::new(capacity),
            affordances: SparseSet::new(capacity),
            tools: SparseSet::new(capacity),
            equipped: SparseSet::new(capacity),
            item_refs: SparseSet::new(capacity),
            stats: SparseSet::new(capacity),
            positions: SparseSet::new(capacity),
            glyphs: SparseSet::new(capacity),
            locations: SparseSet::new(capacity),
            stacks: SparseSet::new(capacity),
            qualities: SparseSet::new(capacity),
            durabilities: SparseSet::new(capacity),
            growths: SparseSet::new(capacity),
            lights: SparseSet::new(capacity),
        }
    }

    /// Remove `entity` from every store that holds it. Returns how many
    /// stores released a component. This is what "destroying" an entity
    /// means -- there is no separate liveness flag.
    pub fn remove_everywhere(&mut self, entity: EntityId) -> usize {
        let mut removed = 0;
        removed += usize::from(self.layers.remove(entity).is_ok());
        removed += usize::from(self.body_parts.remove(entity).is_ok());
        removed += usize::from(self.skills.remove(entity).is_ok());
        removed += usize::from(self.anatomy.remove(entity).is_ok());
        removed += usize::from(self.capabilities.remove(entity).is_ok());
        removed += usize::from(self.affordances.remove(entity).is_ok());
        removed += usize::from(self.tools.remove(entity).is_ok());
        removed += usize::from(self.equipped.remove(entity).is_ok());
        removed += usize::from(self.item_refs.remove(entity).is_ok());
        removed += usize::from(self.stats.remove(entity).is_ok());
        removed += usize::from(self.positions.remove(entity).is_ok());
        removed += usize::from(self.glyphs.remove(entity).is_ok());
        removed += usize::from(self.locations.remove(entity).is_ok());
        removed += usize::from(self.stacks.remove(entity).is_ok());
        removed += usize::from(self.qualities.remove(entity).is_ok());
        removed += usize::from(self.durabilities.remove(entity).is_ok());
        removed += usize::from(self.growths.remove(entity).is_ok());
        removed += usize::from(self.lights.remove(entity).is_ok());
        removed
    }

    /// Whether any store holds a component for `entity`.
    pub fn holds(&self, entity: EntityId) -> bool {
        self.layers.has(entity)
            || self.body_parts.has(entity)
            || self.skills.has(entity)
            || self.anatomy.has(entity)
            || self.capabilities.has(entity)
            || self.affordances.has(entity)
            || self.tools.has(entity)
            || self.equipped.has(entity)
            || self.item_refs.has(entity)
            || self.stats.has(entity)
            || self.positions.has(entity)
            || self.glyphs.has(entity)
            || self.locations.has(entity)
            || self.stacks.has(entity)
            || self.qualities.has(entity)
            || self.durabilities.has(entity)
            || self.growths.has(entity)
            || self.lights.has(entity)
    }
}

// ---------------------------------------------------------------------------
// WorldView
// ---------------------------------------------------------------------------

/// Read-only view of the world handed to systems and the pipeline.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub stores: &'a Stores,
    pub items: &'a ItemTable,
    pub rules: &'a RuleTable,
    pub seed: u32,
    pub tick: u64,
}

/// A system run during the read-only phase: it inspects the view and
/// queues commands, never mutating stores directly.
pub type SystemFn = fn(&WorldView<'_>, &mut CommandBuffer);

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What one call to [`World::step`] did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Per-request outcome, in submission order.
    pub results: Vec<(InteractionRequest, InteractResult)>,
    /// Commands applied at this tick's flush.
    pub applied: u32,
    /// Commands rejected at this tick's flush.
    pub rejected: u32,
    /// Commands dropped on push since the previous flush.
    pub dropped: u32,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// All simulation state.
#[derive(Debug)]
pub struct World {
    seed: u32,
    tick: u64,
    allocator: EntityAllocator,
    stores: Stores,
    items: ItemTable,
    rules: RuleTable,
    commands: CommandBuffer,
    pending: Vec<InteractionRequest>,
    feedback: Vec<FeedbackEvent>,
}

impl World {
    /// An empty world seeded for deterministic rolls.
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            tick: 0,
            allocator: EntityAllocator::new(MAX_ENTITIES as u32),
            stores: Stores::new(MAX_ENTITIES),
            items: ItemTable::new(),
            rules: RuleTable::new(),
            commands: CommandBuffer::new(),
            pending: Vec::with_capacity(MAX_REQUESTS),
            feedback: Vec::with_capacity(MAX_COMMANDS),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The current tick number. Commands emitted this tick are stamped
    /// with it; [`step`](Self::step) advances it.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Direct store access for world-load and test setup only.
    /// Simulation-time mutation must flow through commands.
    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    pub fn items(&self) -> &ItemTable {
        &self.items
    }

    /// Item-table authoring access (load time).
    pub fn items_mut(&mut self) -> &mut ItemTable {
        &mut self.items
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Rule-table authoring access (load time).
    pub fn rules_mut(&mut self) -> &mut RuleTable {
        &mut self.rules
    }

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Feedback events recorded by the most recent flush.
    pub fn feedback(&self) -> &[FeedbackEvent] {
        &self.feedback
    }

    pub fn entity_count(&self) -> u32 {
        self.allocator.allocated()
    }

    /// Allocate a fresh entity id, or `None` when the space is exhausted.
    pub fn create_entity(&mut self) -> Option<EntityId> {
        self.allocator.create()
    }

    /// A read-only view for systems and the pipeline.
    pub fn view(&self) -> WorldView<'_> {
        WorldView {
            stores: &self.stores,
            items: &self.items,
            rules: &self.rules,
            seed: self.seed,
            tick: self.tick,
        }
    }

    // -- request intake -----------------------------------------------------

    /// Queue an interaction request for this tick. Returns `false` and
    /// drops the request when the intake queue is full.
    pub fn submit(&mut self, request: InteractionRequest) -> bool {
        if self.pending.len() >= MAX_REQUESTS {
            warn!(?request, "request queue full, dropping request");
            return false;
        }
        self.pending.push(request);
        true
    }

    /// Pending requests awaiting the next step.
    pub fn pending(&self) -> &[InteractionRequest] {
        &self.pending
    }

    // -- phases -------------------------------------------------------------

    /// Run one system against the current view. Commands it pushes are
    /// applied at this tick's flush.
    pub fn dispatch_system(&mut self, system: SystemFn) {
        let view = WorldView {
            stores: &self.stores,
            items: &self.items,
            rules: &self.rules,
            seed: self.seed,
            tick: self.tick,
        };
        system(&view, &mut self.commands);
    }

    /// Execute the interaction and flush phases for the current tick.
    ///
    /// Drains every pending request through the pipeline (read-only,
    /// emitting commands), applies the command batch, then advances the
    /// tick counter. Requests that cannot be resolved are reported with
    /// their failure code; nothing is retried on a later tick.
    pub fn step(&mut self) -> TickReport {
        self.feedback.clear();

        let mut results = Vec::with_capacity(self.pending.len());
        {
            let view = WorldView {
                stores: &self.stores,
                items: &self.items,
                rules: &self.rules,
                seed: self.seed,
                tick: self.tick,
            };
            for request in &self.pending {
                let tool = self
                    .stores
                    .equipped
                    .get(request.actor)
                    .map_or(EntityId::INVALID, |eq| eq.tool);
                let result = pipeline::process(&view, request, tool, &mut self.commands);
                results.push((*request, result));
            }
        }
        self.pending.clear();

        let flush = self.commands.flush(&mut self.stores, &mut self.feedback);
        let report = TickReport {
            tick: self.tick,
            results,
            applied: flush.applied,
            rejected: flush.rejected,
            dropped: flush.dropped,
        };
        self.tick += 1;
        report
    }

    // -- item spawning ------------------------------------------------------

    /// Create an entity from an item definition: attaches the item
    /// reference and every blueprint component. Load-time operation.
    pub fn spawn_item(&mut self, def_id: u32) -> Result<EntityId, SimError> {
        let def = self
            .items
            .get(def_id)
            .ok_or(SimError::UnknownItemDef { def_id })?;
        let inits: Vec<ComponentInit> = def.components().to_vec();

        let entity = self
            .allocator
            .create()
            .ok_or(SimError::EntitiesExhausted {
                capacity: MAX_ENTITIES,
            })?;

        // Fresh id: none of these adds can fail on duplicates, and the
        // store capacity matches the allocator's.
        let _ = self.stores.item_refs.add(entity, ItemRef { def_id });
        for init in inits {
            let result = match init {
                ComponentInit::Stack { count } => self.stores.stacks.add(entity, Stack { count }),
                ComponentInit::Quality { value } => {
                    self.stores.qualities.add(entity, Quality { value })
                }
                ComponentInit::Durability { max, current } => self
                    .stores
                    .durabilities
                    .add(entity, Durability { max, current }),
                ComponentInit::Growth { stage, max_stage } => self
                    .stores
                    .growths
                    .add(entity, Growth { stage, max_stage }),
                ComponentInit::Light { radius, intensity } => self
                    .stores
                    .lights
                    .add(entity, LightSource { radius, intensity }),
            };
            if let Err(err) = result {
                warn!(%entity, def_id, %err, "blueprint component not attached");
            }
        }
        Ok(entity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
