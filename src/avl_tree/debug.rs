use crate::avl_tree::node::AvlLink;
use crate::avl_tree::tree::{height, link, AvlTree};
use crate::error::InvariantViolation;
use crate::links::{self, Linked};
use crate::order::{Comparator, KeyExtractor};
use crate::print;
use std::cmp;
use std::fmt;
use std::ops::Index;
use tracing::debug;

// Returns the recomputed height of the subtree under `node`.
fn check_subtree<H, S>(
    store: &S,
    node: Option<H>,
    parent: Option<H>,
) -> Result<usize, InvariantViolation>
where
    H: Copy + Eq,
    S: Index<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    let node = match node {
        Some(node) => node,
        None => return Ok(0),
    };
    let node_link = link(store, node);

    if node_link.parent != parent {
        return Err(InvariantViolation::BrokenParentLink);
    }

    let left = check_subtree(store, node_link.left, Some(node))?;
    let right = check_subtree(store, node_link.right, Some(node))?;
    if cmp::max(left, right) - cmp::min(left, right) > 1 {
        return Err(InvariantViolation::Unbalanced { left, right });
    }

    let actual = cmp::max(left, right) + 1;
    if node_link.height != actual {
        return Err(InvariantViolation::StaleHeight {
            stored: node_link.height,
            actual,
        });
    }
    Ok(actual)
}

impl<H, X, C> AvlTree<H, X, C>
where
    H: Copy + Eq,
{
    /// Walks the whole tree and returns the first broken invariant: a child that does not point
    /// back at its parent, subtree heights that differ by more than one, a stored height that does
    /// not match the subtree, keys out of order or a wrong length.
    ///
    /// Runs in O(n) and is intended for tests and debugging.
    pub fn verify_invariants<S>(&self, store: &S) -> Result<(), InvariantViolation>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let ret = check_subtree(store, self.root, None)
            .and_then(|_| links::check_order::<AvlLink<H>, H, S, X, C>(self.first(store), store))
            .and_then(|actual| {
                if actual == self.len {
                    Ok(())
                } else {
                    Err(InvariantViolation::LengthMismatch {
                        expected: self.len,
                        actual,
                    })
                }
            });
        if let Err(violation) = ret {
            debug!(%violation, len = self.len, "avl tree invariant violated");
        }
        ret
    }

    /// Returns the stored height of the root, or 0 for an empty tree.
    pub fn height<S>(&self, store: &S) -> usize
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        height(store, self.root)
    }

    /// Renders the tree shape into `out`, one node per line with the right subtree above the left
    /// one. `label` writes the text for a node, which is followed by its stored height.
    pub fn pretty_print<S, W, F>(&self, store: &S, out: &mut W, mut label: F) -> fmt::Result
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        W: fmt::Write,
        F: FnMut(&mut W, H) -> fmt::Result,
    {
        let mut label = |out: &mut W, node: H| -> fmt::Result {
            label(out, node)?;
            write!(out, " (h={})", link(store, node).height)
        };
        print::render::<AvlLink<H>, H, S, W, _>(self.root, store, out, &mut label)
    }
}
