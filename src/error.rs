//! Structural violations reported by the invariant walkers.

/// A broken tree invariant found by `verify_invariants`.
///
/// A violation is always the result of caller misuse: removing a node that is not resident,
/// committing a stale insert context, a comparator that is not a total order, or editing links
/// by hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("root node is red")]
    RedRoot,

    #[error("red node has a red child")]
    DoubleRed,

    #[error("black height differs between subtrees: left {left}, right {right}")]
    BlackHeightMismatch { left: usize, right: usize },

    #[error("subtree heights differ by more than one: left {left}, right {right}")]
    Unbalanced { left: usize, right: usize },

    #[error("stored height {stored} does not match actual height {actual}")]
    StaleHeight { stored: usize, actual: usize },

    #[error("child does not point back at its parent")]
    BrokenParentLink,

    #[error("in-order keys are not sorted")]
    OutOfOrder,

    #[error("cached minimum or maximum does not match the tree")]
    StaleBound,

    #[error("tree reports {expected} entries but {actual} are linked")]
    LengthMismatch { expected: usize, actual: usize },
}
