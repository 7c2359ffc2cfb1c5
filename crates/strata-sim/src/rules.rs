//! Compiled interaction rules.
//!
//! A [`RuleDef`] is the fully-resolved form of an authored interaction:
//! trigger verb, required capability, condition list, roll parameters,
//! and an ordered effect list with symbolic target roles. The runtime
//! never parses rule syntax -- upstream tooling compiles to these
//! values and the pipeline consumes them as data.

use serde::{Deserialize, Serialize};

use crate::command::StatOp;
use crate::defs::{BodyPartSlot, CapabilityId, StatId, VerbId};
use crate::items::PropertyKey;
use crate::SimError;

/// Maximum rules in the table.
pub const MAX_RULES: usize = 64;
/// Maximum effects per rule.
pub const MAX_RULE_EFFECTS: usize = 8;
/// Maximum conditions per rule.
pub const MAX_RULE_CONDS: usize = 4;

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Pure predicates over read-only store state, evaluated in rule order.
/// New conditions extend this enum and the evaluator's match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Condition {
    /// Always true.
    #[default]
    None,
    /// The actor wields a tool strictly harder than the target's
    /// outermost layer.
    ToolHarderThanLayer,
    /// The target has a non-empty layer stack with outermost
    /// integrity > 0.
    TargetHasIntegrity,
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Who an effect's command targets, resolved at emission time against
/// the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRole {
    Actor,
    Target,
    Tool,
    Env,
}

/// An effect magnitude: fixed in the rule, or read from the target
/// item's affordance entry at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(i32),
    Property { key: PropertyKey, default: i32 },
}

impl Amount {
    pub const fn fixed(value: i32) -> Self {
        Amount::Fixed(value)
    }

    pub const fn property(key: PropertyKey, default: i32) -> Self {
        Amount::Property { key, default }
    }
}

/// What kind of command an effect emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    DamageLayer {
        amount: Amount,
    },
    ModifyStat {
        stat: StatId,
        op: StatOp,
        amount: Amount,
    },
    TransformEntity {
        new_def_id: u32,
    },
    MoveEntity {
        destination: u32,
    },
    RemoveEntity,
    PlayFeedback {
        message_id: u32,
    },
}

/// One parameterized command template inside a rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleEffect {
    pub target: TargetRole,
    pub kind: EffectKind,
}

impl RuleEffect {
    pub const fn new(target: TargetRole, kind: EffectKind) -> Self {
        Self { target, kind }
    }
}

// ---------------------------------------------------------------------------
// RuleDef
// ---------------------------------------------------------------------------

/// A complete compiled interaction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub rule_id: u32,
    pub trigger_verb: VerbId,
    pub required_cap: CapabilityId,
    conditions: Vec<Condition>,
    /// Base d100 difficulty; 0 skips the roll entirely.
    pub difficulty: i32,
    /// Rolls below this value are critical failures; 0 disables.
    pub crit_fail_threshold: i32,
    /// Actor body part damaged on critical failure.
    pub crit_fail_body_part: BodyPartSlot,
    pub crit_fail_damage: i32,
    effects: Vec<RuleEffect>,
}

impl RuleDef {
    pub fn new(rule_id: u32, trigger_verb: VerbId, required_cap: CapabilityId) -> Self {
        Self {
            rule_id,
            trigger_verb,
            required_cap,
            conditions: Vec::new(),
            difficulty: 0,
            crit_fail_threshold: 0,
            crit_fail_body_part: BodyPartSlot::None,
            crit_fail_damage: 0,
            effects: Vec::new(),
        }
    }

    /// Builder: append a condition.
    pub fn condition(mut self, cond: Condition) -> Self {
        self.conditions.push(cond);
        self
    }

    /// Builder: set the d100 roll parameters.
    pub fn roll(
        mut self,
        difficulty: i32,
        crit_fail_threshold: i32,
        crit_fail_body_part: BodyPartSlot,
        crit_fail_damage: i32,
    ) -> Self {
        self.difficulty = difficulty;
        self.crit_fail_threshold = crit_fail_threshold;
        self.crit_fail_body_part = crit_fail_body_part;
        self.crit_fail_damage = crit_fail_damage;
        self
    }

    /// Builder: append an effect.
    pub fn effect(mut self, effect: RuleEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn effects(&self) -> &[RuleEffect] {
        &self.effects
    }
}

// ---------------------------------------------------------------------------
// RuleTable
// ---------------------------------------------------------------------------

/// Bounded table of compiled rules; first match by trigger verb wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<RuleDef>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, validating the per-rule bounds.
    pub fn add(&mut self, rule: RuleDef) -> Result<(), SimError> {
        if self.rules.len() >= MAX_RULES {
            return Err(SimError::RuleTableFull {
                capacity: MAX_RULES,
            });
        }
        if rule.conditions.len() > MAX_RULE_CONDS || rule.effects.len() > MAX_RULE_EFFECTS {
            return Err(SimError::RuleOverflow {
                rule_id: rule.rule_id,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// First rule whose trigger matches `verb`. Linear scan.
    pub fn find(&self, verb: VerbId) -> Option<&RuleDef> {
        self.rules.iter().find(|r| r.trigger_verb == verb)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
