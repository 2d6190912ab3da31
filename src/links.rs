//! Link records shared by both tree engines and the walks that only need parent/left/right.
//!
//! A tree never owns its entries. Each entry embeds a link record (`RbLink<H>` or `AvlLink<H>`)
//! and exposes it through `Linked<L>`; the tree reaches entries through caller-owned storage
//! indexed by a copyable handle `H`. Absent relations are `None`, so there is no shared nil node.

use crate::error::InvariantViolation;
use crate::order::{Comparator, KeyExtractor};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Which child slot of a node a relation refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Returns the mirror side.
    #[inline]
    pub fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Structural relations of a tree node.
pub trait Links<H: Copy>: Default {
    fn left(&self) -> Option<H>;

    fn right(&self) -> Option<H>;

    fn parent(&self) -> Option<H>;

    fn set_left(&mut self, node: Option<H>);

    fn set_right(&mut self, node: Option<H>);

    fn set_parent(&mut self, node: Option<H>);

    #[inline]
    fn child(&self, side: Side) -> Option<H> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    #[inline]
    fn set_child(&mut self, side: Side, node: Option<H>) {
        match side {
            Side::Left => self.set_left(node),
            Side::Right => self.set_right(node),
        }
    }
}

/// Implemented by entry types that embed a link record `L`.
///
/// An entry can embed several link records and implement `Linked` once per record type, which
/// lets the same entry sit in a red-black tree and an AVL tree at the same time.
///
/// # Examples
///
/// ```
/// use intrusive_bst::{Linked, RbLink};
///
/// struct Timer {
///     deadline: u64,
///     link: RbLink<usize>,
/// }
///
/// impl Linked<RbLink<usize>> for Timer {
///     fn link(&self) -> &RbLink<usize> {
///         &self.link
///     }
///
///     fn link_mut(&mut self) -> &mut RbLink<usize> {
///         &mut self.link
///     }
/// }
/// ```
pub trait Linked<L> {
    fn link(&self) -> &L;

    fn link_mut(&mut self) -> &mut L;
}

/// Read access to the link records of a storage, for one link type.
pub(crate) trait LinkView<L, H> {
    fn link<'a>(&'a self, node: H) -> &'a L
    where
        H: 'a;
}

/// Write access to the link records of a storage, for one link type.
pub(crate) trait LinkViewMut<L, H>: LinkView<L, H> {
    fn link_mut<'a>(&'a mut self, node: H) -> &'a mut L
    where
        H: 'a;
}

impl<L, H, S> LinkView<L, H> for S
where
    S: Index<H> + ?Sized,
    S::Output: Linked<L>,
{
    #[inline]
    fn link<'a>(&'a self, node: H) -> &'a L
    where
        H: 'a,
    {
        <S::Output as Linked<L>>::link(&self[node])
    }
}

impl<L, H, S> LinkViewMut<L, H> for S
where
    S: IndexMut<H> + ?Sized,
    S::Output: Linked<L>,
{
    #[inline]
    fn link_mut<'a>(&'a mut self, node: H) -> &'a mut L
    where
        H: 'a,
    {
        <S::Output as Linked<L>>::link_mut(&mut self[node])
    }
}

#[inline]
pub(crate) fn side_of<L, H, S>(store: &S, parent: H, child: Option<H>) -> Side
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    if store.link(parent).left() == child {
        Side::Left
    } else {
        Side::Right
    }
}

pub(crate) fn subtree_min<L, H, S>(store: &S, mut node: H) -> H
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    while let Some(left) = store.link(node).left() {
        node = left;
    }
    node
}

pub(crate) fn subtree_max<L, H, S>(store: &S, mut node: H) -> H
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    while let Some(right) = store.link(node).right() {
        node = right;
    }
    node
}

/// In-order neighbour of `node` on the `side` side, or `None` past the end.
fn neighbour<L, H, S>(store: &S, node: H, side: Side) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    if let Some(child) = store.link(node).child(side) {
        return Some(match side {
            Side::Left => subtree_max::<L, H, S>(store, child),
            Side::Right => subtree_min::<L, H, S>(store, child),
        });
    }

    let mut node = node;
    let mut parent = store.link(node).parent();
    while let Some(ancestor) = parent {
        if store.link(ancestor).child(side) != Some(node) {
            break;
        }
        node = ancestor;
        parent = store.link(ancestor).parent();
    }
    parent
}

pub(crate) fn successor<L, H, S>(store: &S, node: H) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    neighbour::<L, H, S>(store, node, Side::Right)
}

pub(crate) fn predecessor<L, H, S>(store: &S, node: H) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkView<L, H> + ?Sized,
{
    neighbour::<L, H, S>(store, node, Side::Left)
}

pub(crate) fn search<L, H, S, X, C>(root: Option<H>, store: &S, key: &X::Key) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut cursor = root;
    while let Some(node) = cursor {
        cursor = match C::compare(X::key(&store[node]), key) {
            Ordering::Less => store.link(node).right(),
            Ordering::Greater => store.link(node).left(),
            Ordering::Equal => return Some(node),
        };
    }
    None
}

/// Locates the empty slot where an entry with `key` belongs, or returns `Err(existing)` when an
/// equal key is resident.
pub(crate) fn find_slot<L, H, S, X, C>(
    root: Option<H>,
    store: &S,
    key: &X::Key,
) -> Result<(Option<H>, Side), H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut parent = None;
    let mut side = Side::Left;
    let mut cursor = root;
    while let Some(node) = cursor {
        side = match C::compare(X::key(&store[node]), key) {
            Ordering::Less => Side::Right,
            Ordering::Greater => Side::Left,
            Ordering::Equal => return Err(node),
        };
        parent = Some(node);
        cursor = store.link(node).child(side);
    }
    Ok((parent, side))
}

/// Locates the empty slot for `key` when equal keys may coexist. Equal keys are passed on the
/// right, so the new entry lands after every resident entry with the same key.
pub(crate) fn find_slot_multi<L, H, S, X, C>(
    root: Option<H>,
    store: &S,
    key: &X::Key,
) -> (Option<H>, Side)
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut parent = None;
    let mut side = Side::Left;
    let mut cursor = root;
    while let Some(node) = cursor {
        side = match C::compare(X::key(&store[node]), key) {
            Ordering::Greater => Side::Left,
            Ordering::Less | Ordering::Equal => Side::Right,
        };
        parent = Some(node);
        cursor = store.link(node).child(side);
    }
    (parent, side)
}

/// Greatest entry whose key is at most `key`. Among equal keys the last one in order wins.
pub(crate) fn floor<L, H, S, X, C>(root: Option<H>, store: &S, key: &X::Key) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut best = None;
    let mut cursor = root;
    while let Some(node) = cursor {
        cursor = match C::compare(X::key(&store[node]), key) {
            Ordering::Greater => store.link(node).left(),
            Ordering::Less | Ordering::Equal => {
                best = Some(node);
                store.link(node).right()
            },
        };
    }
    best
}

/// Least entry whose key is at least `key`. Among equal keys the first one in order wins.
pub(crate) fn ceil<L, H, S, X, C>(root: Option<H>, store: &S, key: &X::Key) -> Option<H>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut best = None;
    let mut cursor = root;
    while let Some(node) = cursor {
        cursor = match C::compare(X::key(&store[node]), key) {
            Ordering::Less => store.link(node).right(),
            Ordering::Greater | Ordering::Equal => {
                best = Some(node);
                store.link(node).left()
            },
        };
    }
    best
}

/// Points whatever referenced `old` (a parent's child slot, or the root) at `new`.
pub(crate) fn replace_child<L, H, S>(
    root: &mut Option<H>,
    store: &mut S,
    parent: Option<H>,
    old: H,
    new: Option<H>,
) where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkViewMut<L, H> + ?Sized,
{
    match parent {
        None => *root = new,
        Some(parent) => {
            let link = store.link_mut(parent);
            if link.left() == Some(old) {
                link.set_left(new);
            } else {
                link.set_right(new);
            }
        },
    }
}

/// Puts `new` in the position of `old`. The children of `new` are left to the caller.
pub(crate) fn transplant<L, H, S>(root: &mut Option<H>, store: &mut S, old: H, new: Option<H>)
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkViewMut<L, H> + ?Sized,
{
    let parent = store.link(old).parent();
    replace_child::<L, H, S>(root, store, parent, old, new);
    if let Some(new) = new {
        store.link_mut(new).set_parent(parent);
    }
}

/// Rotates the subtree rooted at `node` towards `dir`.
///
/// ```text
///        node                 pivot
///       /    \     Right     /     \
///    pivot    c    ====>    a      node
///   /     \                       /    \
///  a    inner                  inner    c
/// ```
///
/// The child of `node` on the opposite side of `dir` becomes the new subtree root. Heights and
/// colors are left to the caller.
pub(crate) fn rotate<L, H, S>(root: &mut Option<H>, store: &mut S, node: H, dir: Side)
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkViewMut<L, H> + ?Sized,
{
    let pivot = store
        .link(node)
        .child(dir.flip())
        .expect("Expected a child node to rotate about.");
    let inner = store.link(pivot).child(dir);
    let parent = store.link(node).parent();

    store.link_mut(node).set_child(dir.flip(), inner);
    if let Some(inner) = inner {
        store.link_mut(inner).set_parent(Some(node));
    }

    replace_child::<L, H, S>(root, store, parent, node, Some(pivot));

    let pivot_link = store.link_mut(pivot);
    pivot_link.set_parent(parent);
    pivot_link.set_child(dir, Some(node));
    store.link_mut(node).set_parent(Some(pivot));
}

/// Detaches every node below `root` bottom-up without recursion, handing each one to `release`
/// once its links are reset. Returns the number of released nodes.
pub(crate) fn teardown<L, H, S, F>(root: Option<H>, store: &mut S, mut release: F) -> usize
where
    L: Links<H>,
    H: Copy + Eq,
    S: LinkViewMut<L, H> + ?Sized,
    F: FnMut(&mut S, H),
{
    let mut released = 0;
    let mut cursor = root;
    while let Some(node) = cursor {
        let link = store.link(node);
        if let Some(left) = link.left() {
            cursor = Some(left);
        } else if let Some(right) = link.right() {
            cursor = Some(right);
        } else {
            let parent = link.parent();
            if let Some(parent) = parent {
                let parent_link = store.link_mut(parent);
                if parent_link.left() == Some(node) {
                    parent_link.set_left(None);
                } else {
                    parent_link.set_right(None);
                }
            }
            *store.link_mut(node) = L::default();
            release(store, node);
            released += 1;
            cursor = parent;
        }
    }
    released
}

/// Walks the in-order sequence from `first`, checking that consecutive keys never decrease, and
/// returns the number of nodes visited.
pub(crate) fn check_order<L, H, S, X, C>(
    first: Option<H>,
    store: &S,
) -> Result<usize, InvariantViolation>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + LinkView<L, H> + ?Sized,
    X: KeyExtractor<S::Output>,
    C: Comparator<X::Key>,
{
    let mut count = 0;
    let mut prev: Option<H> = None;
    let mut cursor = first;
    while let Some(node) = cursor {
        if let Some(prev) = prev {
            if C::compare(X::key(&store[prev]), X::key(&store[node])) == Ordering::Greater {
                return Err(InvariantViolation::OutOfOrder);
            }
        }
        count += 1;
        prev = Some(node);
        cursor = successor::<L, H, S>(store, node);
    }
    Ok(count)
}

/// Double-ended in-order iterator over the handles of a tree.
///
/// The iterator borrows the storage immutably, so the tree cannot be mutated while it is alive.
pub struct Iter<'a, L, H, S: ?Sized> {
    store: &'a S,
    front: Option<H>,
    back: Option<H>,
    _link: PhantomData<fn() -> L>,
}

impl<'a, L, H, S: ?Sized> Iter<'a, L, H, S> {
    pub(crate) fn new(store: &'a S, first: Option<H>, last: Option<H>) -> Self {
        Iter {
            store,
            front: first,
            back: last,
            _link: PhantomData,
        }
    }
}

impl<'a, L, H, S> Iterator for Iter<'a, L, H, S>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + ?Sized,
    S::Output: Linked<L>,
{
    type Item = H;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = successor::<L, H, S>(self.store, node);
        }
        Some(node)
    }
}

impl<'a, L, H, S> DoubleEndedIterator for Iter<'a, L, H, S>
where
    L: Links<H>,
    H: Copy + Eq,
    S: Index<H> + ?Sized,
    S::Output: Linked<L>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = predecessor::<L, H, S>(self.store, node);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{rotate, successor, teardown, transplant, Linked, Links, Side};

    #[derive(Default)]
    struct Link {
        left: Option<usize>,
        right: Option<usize>,
        parent: Option<usize>,
    }

    impl Links<usize> for Link {
        fn left(&self) -> Option<usize> {
            self.left
        }

        fn right(&self) -> Option<usize> {
            self.right
        }

        fn parent(&self) -> Option<usize> {
            self.parent
        }

        fn set_left(&mut self, node: Option<usize>) {
            self.left = node;
        }

        fn set_right(&mut self, node: Option<usize>) {
            self.right = node;
        }

        fn set_parent(&mut self, node: Option<usize>) {
            self.parent = node;
        }
    }

    #[derive(Default)]
    struct Node {
        link: Link,
    }

    impl Linked<Link> for Node {
        fn link(&self) -> &Link {
            &self.link
        }

        fn link_mut(&mut self) -> &mut Link {
            &mut self.link
        }
    }

    fn attach(nodes: &mut Vec<Node>, parent: usize, side: Side, child: usize) {
        nodes[parent].link.set_child(side, Some(child));
        nodes[child].link.parent = Some(parent);
    }

    // 1 is the root with children 0 and 3; 3 has children 2 and 4.
    fn sample() -> (Option<usize>, Vec<Node>) {
        let mut nodes: Vec<Node> = (0..5).map(|_| Node::default()).collect();
        attach(&mut nodes, 1, Side::Left, 0);
        attach(&mut nodes, 1, Side::Right, 3);
        attach(&mut nodes, 3, Side::Left, 2);
        attach(&mut nodes, 3, Side::Right, 4);
        (Some(1), nodes)
    }

    fn in_order(root: Option<usize>, nodes: &Vec<Node>) -> Vec<usize> {
        let mut ret = Vec::new();
        let mut cursor = root.map(|root| super::subtree_min::<Link, _, _>(nodes, root));
        while let Some(node) = cursor {
            ret.push(node);
            cursor = successor::<Link, _, _>(nodes, node);
        }
        ret
    }

    #[test]
    fn test_side_flip() {
        assert_eq!(Side::Left.flip(), Side::Right);
        assert_eq!(Side::Right.flip(), Side::Left);
    }

    #[test]
    fn test_rotate_left_at_root() {
        let (mut root, mut nodes) = sample();
        rotate::<Link, _, _>(&mut root, &mut nodes, 1, Side::Left);

        assert_eq!(root, Some(3));
        assert_eq!(nodes[3].link.parent, None);
        assert_eq!(nodes[3].link.left, Some(1));
        assert_eq!(nodes[3].link.right, Some(4));
        assert_eq!(nodes[1].link.parent, Some(3));
        assert_eq!(nodes[1].link.left, Some(0));
        assert_eq!(nodes[1].link.right, Some(2));
        assert_eq!(nodes[2].link.parent, Some(1));
        assert_eq!(in_order(root, &nodes), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rotate_right_below_root() {
        let (mut root, mut nodes) = sample();
        rotate::<Link, _, _>(&mut root, &mut nodes, 3, Side::Right);

        assert_eq!(root, Some(1));
        assert_eq!(nodes[1].link.right, Some(2));
        assert_eq!(nodes[2].link.parent, Some(1));
        assert_eq!(nodes[2].link.right, Some(3));
        assert_eq!(nodes[2].link.left, None);
        assert_eq!(nodes[3].link.parent, Some(2));
        assert_eq!(nodes[3].link.left, None);
        assert_eq!(in_order(root, &nodes), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rotations_are_inverse() {
        let (mut root, mut nodes) = sample();
        rotate::<Link, _, _>(&mut root, &mut nodes, 1, Side::Left);
        rotate::<Link, _, _>(&mut root, &mut nodes, 3, Side::Right);

        assert_eq!(root, Some(1));
        assert_eq!(nodes[1].link.left, Some(0));
        assert_eq!(nodes[1].link.right, Some(3));
        assert_eq!(nodes[3].link.left, Some(2));
        assert_eq!(nodes[3].link.right, Some(4));
        assert_eq!(nodes[3].link.parent, Some(1));
        assert_eq!(nodes[2].link.parent, Some(3));
    }

    #[test]
    fn test_transplant() {
        let (mut root, mut nodes) = sample();
        transplant::<Link, _, _>(&mut root, &mut nodes, 3, Some(4));

        assert_eq!(nodes[1].link.right, Some(4));
        assert_eq!(nodes[4].link.parent, Some(1));
        assert_eq!(in_order(root, &nodes), vec![0, 1, 4]);
    }

    #[test]
    fn test_successor_and_predecessor() {
        let (_, nodes) = sample();
        assert_eq!(successor::<Link, _, _>(&nodes, 0), Some(1));
        assert_eq!(successor::<Link, _, _>(&nodes, 2), Some(3));
        assert_eq!(successor::<Link, _, _>(&nodes, 4), None);
        assert_eq!(super::predecessor::<Link, _, _>(&nodes, 2), Some(1));
        assert_eq!(super::predecessor::<Link, _, _>(&nodes, 0), None);
    }

    #[test]
    fn test_teardown_visits_every_node() {
        let (root, mut nodes) = sample();
        let mut released = Vec::new();
        let count = teardown::<Link, _, _, _>(root, &mut nodes, |_, node| released.push(node));

        assert_eq!(count, 5);
        released.sort();
        assert_eq!(released, vec![0, 1, 2, 3, 4]);
        for node in &nodes {
            assert_eq!(node.link.left, None);
            assert_eq!(node.link.right, None);
            assert_eq!(node.link.parent, None);
        }
    }
}
