//! Deferred mutation commands and the bounded command buffer.
//!
//! During a tick every system and the interaction pipeline only *read*
//! component stores; any intended mutation is pushed here as a
//! [`Command`]. At the tick boundary [`CommandBuffer::flush`] validates
//! and applies the whole batch in push order. The applicators in this
//! module are the only code in the core that writes to stores.
//!
//! A full buffer drops further pushes with a warning -- an overflow
//! event counted separately from flush-time rejections, never an abort.

use serde::{Deserialize, Serialize};
use strata_ecs::entity::EntityId;
use tracing::{debug, warn};

use crate::components::INVALID_PLACE;
use crate::defs::{BodyPartSlot, StatId};
use crate::world::Stores;

/// Maximum queued commands per tick.
pub const MAX_COMMANDS: usize = 256;

// ---------------------------------------------------------------------------
// Command kinds
// ---------------------------------------------------------------------------

/// How a stat command combines with the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatOp {
    Add,
    Subtract,
    Set,
}

/// The mutation a command performs. One variant per command type;
/// flush dispatch is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Reduce the target's outermost layer integrity, peeling on zero.
    DamageLayer { amount: i32 },
    /// Layer damage against a body-part entity from a critical failure.
    /// Carries the slot for audit; the target entity is already resolved.
    CritDamage { body_part: BodyPartSlot, amount: i32 },
    /// Combine `amount` into the named stat on the target.
    ModifyStat { stat: StatId, op: StatOp, amount: i32 },
    /// Replace the target's item definition reference.
    TransformEntity { new_def_id: u32 },
    /// Update the target's location/container record.
    MoveEntity { destination: u32 },
    /// Remove the target from every store that holds it.
    RemoveEntity,
    /// Record a feedback message for the snapshot; no store change.
    PlayFeedback { message_id: u32 },
}

/// A queued mutation: what to do, to whom, issued by whom, and when.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    /// Who issued this command (for audit).
    pub source: EntityId,
    /// The resolved entity to mutate.
    pub target: EntityId,
    /// Tick this command was emitted on.
    pub tick: u64,
}

impl Command {
    pub fn damage_layer(tick: u64, source: EntityId, target: EntityId, amount: i32) -> Self {
        Self {
            kind: CommandKind::DamageLayer { amount },
            source,
            target,
            tick,
        }
    }

    pub fn crit_damage(
        tick: u64,
        source: EntityId,
        body_part_entity: EntityId,
        body_part: BodyPartSlot,
        amount: i32,
    ) -> Self {
        Self {
            kind: CommandKind::CritDamage { body_part, amount },
            source,
            target: body_part_entity,
            tick,
        }
    }

    pub fn modify_stat(
        tick: u64,
        source: EntityId,
        target: EntityId,
        stat: StatId,
        op: StatOp,
        amount: i32,
    ) -> Self {
        Self {
            kind: CommandKind::ModifyStat { stat, op, amount },
            source,
            target,
            tick,
        }
    }

    pub fn transform(tick: u64, source: EntityId, target: EntityId, new_def_id: u32) -> Self {
        Self {
            kind: CommandKind::TransformEntity { new_def_id },
            source,
            target,
            tick,
        }
    }

    pub fn move_entity(tick: u64, source: EntityId, target: EntityId, destination: u32) -> Self {
        Self {
            kind: CommandKind::MoveEntity { destination },
            source,
            target,
            tick,
        }
    }

    pub fn remove(tick: u64, source: EntityId, target: EntityId) -> Self {
        Self {
            kind: CommandKind::RemoveEntity,
            source,
            target,
            tick,
        }
    }

    pub fn feedback(tick: u64, source: EntityId, message_id: u32) -> Self {
        Self {
            kind: CommandKind::PlayFeedback { message_id },
            source,
            target: EntityId::INVALID,
            tick,
        }
    }
}

/// A feedback message recorded by a flushed `PlayFeedback` command,
/// surfaced to observers via the snapshot. The core never composes
/// strings; the id resolves in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub message_id: u32,
    pub source: EntityId,
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// Per-flush counters. `applied` and `rejected` cover only the
/// just-flushed batch; `dropped` counts overflow events since the
/// previous flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: u32,
    pub rejected: u32,
    pub dropped: u32,
}

/// Bounded FIFO of emitted commands.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    applied: u32,
    rejected: u32,
    dropped: u32,
}

impl CommandBuffer {
    /// An empty buffer with its full capacity reserved up front.
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(MAX_COMMANDS),
            applied: 0,
            rejected: 0,
            dropped: 0,
        }
    }

    /// Queue a command. Returns `false` (and counts a drop) when the
    /// buffer is full; the interaction that pushed it is not aborted.
    pub fn push(&mut self, cmd: Command) -> bool {
        if self.commands.len() >= MAX_COMMANDS {
            self.dropped += 1;
            warn!(kind = ?cmd.kind, target = %cmd.target, "command buffer full, dropping command");
            return false;
        }
        self.commands.push(cmd);
        true
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands in push order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Commands applied in the last flush.
    pub fn applied(&self) -> u32 {
        self.applied
    }

    /// Commands rejected in the last flush.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Drops since the last flush.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Apply every queued command to the stores in push order.
    ///
    /// Each applicator either mutates its target or rejects without
    /// touching it; rejection never aborts the batch. The queue is
    /// reset regardless.
    pub fn flush(&mut self, stores: &mut Stores, feedback: &mut Vec<FeedbackEvent>) -> FlushReport {
        self.applied = 0;
        self.rejected = 0;

        for i in 0..self.commands.len() {
            let cmd = self.commands[i];
            let result = match cmd.kind {
                CommandKind::DamageLayer { amount } => apply_layer_damage(stores, cmd.target, amount),
                CommandKind::CritDamage { body_part, amount } => {
                    debug!(
                        source = %cmd.source,
                        part_entity = %cmd.target,
                        slot = ?body_part,
                        "critical failure: actor damages own body part"
                    );
                    apply_layer_damage(stores, cmd.target, amount)
                }
                CommandKind::ModifyStat { stat, op, amount } => {
                    apply_modify_stat(stores, cmd.target, stat, op, amount)
                }
                CommandKind::TransformEntity { new_def_id } => {
                    apply_transform(stores, cmd.target, new_def_id)
                }
                CommandKind::MoveEntity { destination } => {
                    apply_move(stores, cmd.target, destination)
                }
                CommandKind::RemoveEntity => {
                    let removed = stores.remove_everywhere(cmd.target);
                    debug!(target = %cmd.target, stores = removed, "entity removed");
                    Ok(())
                }
                CommandKind::PlayFeedback { message_id } => {
                    apply_feedback(feedback, message_id, cmd.source, cmd.tick)
                }
            };

            match result {
                Ok(()) => self.applied += 1,
                Err(reason) => {
                    self.rejected += 1;
                    warn!(
                        kind = ?cmd.kind,
                        target = %cmd.target,
                        reason,
                        "command rejected at flush"
                    );
                }
            }
        }

        if !self.commands.is_empty() {
            debug!(
                applied = self.applied,
                rejected = self.rejected,
                total = self.commands.len(),
                "command buffer flushed"
            );
        }

        self.commands.clear();
        FlushReport {
            applied: self.applied,
            rejected: self.rejected,
            dropped: std::mem::take(&mut self.dropped),
        }
    }
}

// ---------------------------------------------------------------------------
// Applicators -- the only store writers in the core
// ---------------------------------------------------------------------------

fn apply_layer_damage(stores: &mut Stores, target: EntityId, amount: i32) -> Result<(), &'static str> {
    let Some(stack) = stores.layers.get_mut(target) else {
        return Err("target has no layer stack");
    };
    if stack.is_empty() {
        return Err("layer stack already empty");
    }
    let peeled = stack.damage(amount);
    if peeled > 0 {
        debug!(target = %target, peeled, remaining = stack.count(), "layer peeled");
    }
    Ok(())
}

fn apply_modify_stat(
    stores: &mut Stores,
    target: EntityId,
    stat: StatId,
    op: StatOp,
    amount: i32,
) -> Result<(), &'static str> {
    let Some(stats) = stores.stats.get_mut(target) else {
        return Err("target has no stat block");
    };
    let current = stats.get(stat);
    let next = match op {
        StatOp::Add => current + amount,
        StatOp::Subtract => current - amount,
        StatOp::Set => amount,
    };
    stats.set(stat, next);
    Ok(())
}

fn apply_transform(stores: &mut Stores, target: EntityId, new_def_id: u32) -> Result<(), &'static str> {
    let Some(item) = stores.item_refs.get_mut(target) else {
        return Err("target has no item reference");
    };
    debug!(target = %target, from = item.def_id, to = new_def_id, "item transformed");
    item.def_id = new_def_id;
    Ok(())
}

fn apply_move(stores: &mut Stores, target: EntityId, destination: u32) -> Result<(), &'static str> {
    if destination == INVALID_PLACE {
        return Err("invalid destination");
    }
    let Some(location) = stores.locations.get_mut(target) else {
        return Err("target has no location record");
    };
    location.place = destination;
    Ok(())
}

fn apply_feedback(
    feedback: &mut Vec<FeedbackEvent>,
    message_id: u32,
    source: EntityId,
    tick: u64,
) -> Result<(), &'static str> {
    // Bounded like the buffer that produced it; excess is dropped, not
    // an error -- feedback is presentation-only.
    if feedback.len() < MAX_COMMANDS {
        feedback.push(FeedbackEvent {
            message_id,
            source,
            tick,
        });
    } else {
        warn!(message_id, "feedback list full, dropping message");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
