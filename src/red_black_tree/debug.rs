//! Debug-only inspection of a red-black tree: invariant walker, height and rendering.

use crate::error::InvariantViolation;
use crate::links::{self, Linked};
use crate::order::{Comparator, KeyExtractor};
use crate::print;
use crate::red_black_tree::node::{Color, RbLink};
use crate::red_black_tree::tree::{is_red, link, RbTree};
use std::cmp;
use std::fmt;
use std::ops::Index;
use tracing::debug;

// Returns the black height of the subtree under `node`, counting the absent leaves as zero.
fn check_subtree<H, S>(
    store: &S,
    node: Option<H>,
    parent: Option<H>,
) -> Result<usize, InvariantViolation>
where
    H: Copy + Eq,
    S: Index<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    let node = match node {
        Some(node) => node,
        None => return Ok(0),
    };
    let node_link = link(store, node);

    if node_link.parent != parent {
        return Err(InvariantViolation::BrokenParentLink);
    }
    if node_link.color == Color::Red
        && (is_red(store, node_link.left) || is_red(store, node_link.right))
    {
        return Err(InvariantViolation::DoubleRed);
    }

    let left = check_subtree(store, node_link.left, Some(node))?;
    let right = check_subtree(store, node_link.right, Some(node))?;
    if left != right {
        return Err(InvariantViolation::BlackHeightMismatch { left, right });
    }

    Ok(left + if node_link.color == Color::Black { 1 } else { 0 })
}

fn subtree_height<H, S>(store: &S, node: Option<H>) -> usize
where
    H: Copy,
    S: Index<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    match node {
        Some(node) => {
            let node_link = link(store, node);
            1 + cmp::max(
                subtree_height(store, node_link.left),
                subtree_height(store, node_link.right),
            )
        },
        None => 0,
    }
}

impl<H, X, C> RbTree<H, X, C>
where
    H: Copy + Eq,
{
    /// Walks the whole tree and returns the first broken invariant: a red root, a red node with a
    /// red child, unequal black heights, a child that does not point back at its parent, keys out
    /// of order, stale cached bounds or a wrong length.
    ///
    /// Runs in O(n) and is intended for tests and debugging.
    pub fn verify_invariants<S>(&self, store: &S) -> Result<(), InvariantViolation>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let ret = self.check(store);
        if let Err(violation) = ret {
            debug!(%violation, len = self.len, "red-black tree invariant violated");
        }
        ret
    }

    fn check<S>(&self, store: &S) -> Result<(), InvariantViolation>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        if let Some(root) = self.root {
            if link(store, root).color == Color::Red {
                return Err(InvariantViolation::RedRoot);
            }
        }
        check_subtree(store, self.root, None)?;

        let min = self
            .root
            .map(|root| links::subtree_min::<RbLink<H>, H, S>(store, root));
        let max = self
            .root
            .map(|root| links::subtree_max::<RbLink<H>, H, S>(store, root));
        if self.first != min || self.last != max {
            return Err(InvariantViolation::StaleBound);
        }

        let actual = links::check_order::<RbLink<H>, H, S, X, C>(self.first, store)?;
        if actual != self.len {
            return Err(InvariantViolation::LengthMismatch {
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }

    /// Returns the number of nodes on the longest root-to-leaf path, or 0 for an empty tree.
    pub fn height<S>(&self, store: &S) -> usize
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        subtree_height(store, self.root)
    }

    /// Returns the number of black nodes on the leftmost root-to-leaf path.
    pub fn black_height<S>(&self, store: &S) -> usize
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        let mut ret = 0;
        let mut cursor = self.root;
        while let Some(node) = cursor {
            let node_link = link(store, node);
            if node_link.color == Color::Black {
                ret += 1;
            }
            cursor = node_link.left;
        }
        ret
    }

    /// Renders the tree shape into `out`, one node per line with the right subtree above the left
    /// one. `label` writes the text for a node; red nodes are suffixed with ` (red)`.
    pub fn pretty_print<S, W, F>(&self, store: &S, out: &mut W, mut label: F) -> fmt::Result
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        W: fmt::Write,
        F: FnMut(&mut W, H) -> fmt::Result,
    {
        let mut label = |out: &mut W, node: H| -> fmt::Result {
            label(out, node)?;
            if link(store, node).color == Color::Red {
                out.write_str(" (red)")?;
            }
            Ok(())
        };
        print::render::<RbLink<H>, H, S, W, _>(self.root, store, out, &mut label)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::InvariantViolation;
    use crate::links::Linked;
    use crate::order::{KeyExtractor, NaturalOrder};
    use crate::red_black_tree::node::{Color, RbLink};
    use crate::red_black_tree::tree::RbTree;
    use std::fmt::Write;

    struct Slot {
        key: i32,
        link: RbLink<usize>,
    }

    impl Linked<RbLink<usize>> for Slot {
        fn link(&self) -> &RbLink<usize> {
            &self.link
        }

        fn link_mut(&mut self) -> &mut RbLink<usize> {
            &mut self.link
        }
    }

    struct SlotKey;

    impl KeyExtractor<Slot> for SlotKey {
        type Key = i32;

        fn key(entry: &Slot) -> &i32 {
            &entry.key
        }
    }

    type Tree = RbTree<usize, SlotKey, NaturalOrder>;

    fn build(keys: &[i32]) -> (Tree, Vec<Slot>) {
        let mut slots: Vec<Slot> = keys
            .iter()
            .map(|key| Slot {
                key: *key,
                link: RbLink::new(),
            })
            .collect();
        let mut tree = Tree::new();
        for node in 0..slots.len() {
            tree.insert(&mut slots, node).unwrap();
        }
        (tree, slots)
    }

    fn render(tree: &Tree, slots: &Vec<Slot>) -> String {
        let mut out = String::new();
        tree.pretty_print(slots, &mut out, |out, node| write!(out, "{}", slots[node].key))
            .unwrap();
        out
    }

    #[test]
    fn test_verify_empty() {
        let tree = Tree::new();
        let slots: Vec<Slot> = Vec::new();
        assert_eq!(tree.verify_invariants(&slots), Ok(()));
        assert_eq!(tree.height(&slots), 0);
        assert_eq!(tree.black_height(&slots), 0);
    }

    #[test]
    fn test_height_and_black_height() {
        let (tree, slots) = build(&(0..15).collect::<Vec<i32>>());
        tree.verify_invariants(&slots).unwrap();
        assert!(tree.height(&slots) <= 8);
        assert!(tree.black_height(&slots) >= 2);
    }

    #[test]
    fn test_pretty_print() {
        let (tree, slots) = build(&[1, 2, 3]);
        assert_eq!(render(&tree, &slots), "2\n├── 3 (red)\n└── 1 (red)\n");
    }

    #[test]
    fn test_pretty_print_empty() {
        let tree = Tree::new();
        assert_eq!(render(&tree, &Vec::new()), "");
    }

    #[test]
    fn test_detects_red_root() {
        let (tree, mut slots) = build(&[1, 2, 3]);
        let root = tree.root().unwrap();
        slots[root].link.color = Color::Red;
        assert_eq!(tree.verify_invariants(&slots), Err(InvariantViolation::RedRoot));
    }

    #[test]
    fn test_detects_double_red() {
        let (tree, mut slots) = build(&[2, 1, 3, 4]);
        // 4 hangs red below 3, which was recolored black; make 3 red again.
        let node = tree.search(&slots, &3).unwrap();
        slots[node].link.color = Color::Red;
        assert_eq!(tree.verify_invariants(&slots), Err(InvariantViolation::DoubleRed));
    }

    #[test]
    fn test_detects_black_height_mismatch() {
        let (tree, mut slots) = build(&[2, 1, 3]);
        let node = tree.search(&slots, &1).unwrap();
        slots[node].link.color = Color::Black;
        assert_eq!(
            tree.verify_invariants(&slots),
            Err(InvariantViolation::BlackHeightMismatch { left: 1, right: 0 }),
        );
    }

    #[test]
    fn test_detects_out_of_order() {
        let (tree, mut slots) = build(&[2, 1, 3]);
        let node = tree.search(&slots, &1).unwrap();
        slots[node].key = 5;
        assert_eq!(tree.verify_invariants(&slots), Err(InvariantViolation::OutOfOrder));
    }

    #[test]
    fn test_detects_broken_parent_link() {
        let (tree, mut slots) = build(&[2, 1, 3]);
        let node = tree.search(&slots, &3).unwrap();
        slots[node].link.parent = None;
        assert_eq!(
            tree.verify_invariants(&slots),
            Err(InvariantViolation::BrokenParentLink),
        );
    }
}
