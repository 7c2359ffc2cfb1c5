//! Strata ECS -- packed sparse-set storage with deterministic identity.
//!
//! This crate provides the storage primitives of the Strata simulation
//! core: densely-allocated [`EntityId`](entity::EntityId)s, one bounded
//! [`SparseSet`](store::SparseSet) per component kind, and the seedable
//! [`SplitMix32`](rng::SplitMix32) generator that makes every
//! interaction roll a pure function of `(world seed, tick, actor,
//! target)`.
//!
//! # Quick Start
//!
//! ```
//! use strata_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Hp(i32);
//!
//! let mut alloc = EntityAllocator::new(16);
//! let mut hp: SparseSet<Hp> = SparseSet::new(16);
//!
//! let e = alloc.create().unwrap();
//! hp.add(e, Hp(10)).unwrap();
//!
//! assert_eq!(hp.get(e), Some(&Hp(10)));
//! hp.remove(e).unwrap();
//! assert!(!hp.has(e));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod rng;
pub mod store;

use entity::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity id is outside the store's address space.
    #[error("entity {entity} is out of range (store capacity {capacity})")]
    OutOfRange {
        entity: EntityId,
        capacity: usize,
    },

    /// The entity already has a component in this store.
    #[error("entity {entity} already has a component in this store")]
    Duplicate {
        entity: EntityId,
    },

    /// The store is at capacity.
    #[error("store is full (capacity {capacity})")]
    StoreFull {
        capacity: usize,
    },

    /// The entity has no component in this store.
    #[error("entity {entity} has no component in this store")]
    Missing {
        entity: EntityId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::rng::SplitMix32;
    pub use crate::store::SparseSet;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
