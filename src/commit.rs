//! Two-phase insertion plumbing shared by both engines.
//!
//! `insert_check` walks the tree once and either reports the resident entry with an equal key, or
//! hands back a `CommitContext` describing the empty slot. The caller prepares the new entry only
//! after a successful check and then links it with `insert_commit`.

use crate::links::Side;

/// The empty slot found by `insert_check`.
///
/// A context is valid until the next mutation of the tree it came from and is consumed by exactly
/// one `insert_commit`. Debug builds reject a context that outlived a mutation.
#[derive(Debug, Eq, PartialEq)]
#[must_use = "a commit context does nothing unless passed to `insert_commit`"]
pub struct CommitContext<H> {
    pub(crate) parent: Option<H>,
    pub(crate) side: Side,
    pub(crate) generation: u64,
}

impl<H: Copy> CommitContext<H> {
    pub(crate) fn new(parent: Option<H>, side: Side, generation: u64) -> Self {
        CommitContext {
            parent,
            side,
            generation,
        }
    }

    /// Returns the node the new entry will hang from, or `None` if it becomes the root.
    pub fn parent(&self) -> Option<H> {
        self.parent
    }

    /// Returns which child slot of the parent the new entry will occupy.
    pub fn side(&self) -> Side {
        self.side
    }
}

/// Outcome of `insert_check`.
#[derive(Debug, Eq, PartialEq)]
pub enum InsertCheck<H> {
    /// No entry with an equal key is resident.
    Vacant(CommitContext<H>),
    /// An entry with an equal key is already resident.
    Occupied(H),
}

impl<H> InsertCheck<H> {
    /// Returns the commit context, or `None` on a duplicate.
    pub fn vacant(self) -> Option<CommitContext<H>> {
        match self {
            InsertCheck::Vacant(context) => Some(context),
            InsertCheck::Occupied(_) => None,
        }
    }

    /// Returns the resident duplicate, or `None` if the slot is vacant.
    pub fn occupied(&self) -> Option<&H> {
        match self {
            InsertCheck::Vacant(_) => None,
            InsertCheck::Occupied(node) => Some(node),
        }
    }
}
