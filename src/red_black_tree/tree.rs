use crate::commit::{CommitContext, InsertCheck};
use crate::links::{self, Iter, Linked, Links, Side};
use crate::order::{Comparator, KeyExtractor, NaturalOrder};
use crate::red_black_tree::node::{Color, RbLink};
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use tracing::trace;

#[inline]
pub(crate) fn link<H, S>(store: &S, node: H) -> &RbLink<H>
where
    S: Index<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    <S::Output as Linked<RbLink<H>>>::link(&store[node])
}

#[inline]
fn link_mut<H, S>(store: &mut S, node: H) -> &mut RbLink<H>
where
    S: IndexMut<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    <S::Output as Linked<RbLink<H>>>::link_mut(&mut store[node])
}

// Absent nodes count as black.
#[inline]
pub(crate) fn is_red<H, S>(store: &S, node: Option<H>) -> bool
where
    S: Index<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    match node {
        Some(node) => link(store, node).color == Color::Red,
        None => false,
    }
}

#[inline]
fn set_color<H, S>(store: &mut S, node: H, color: Color)
where
    S: IndexMut<H> + ?Sized,
    S::Output: Linked<RbLink<H>>,
{
    link_mut(store, node).color = color;
}

/// An intrusive red-black tree over caller-owned entries.
///
/// The tree stores handles `H` into a storage `S` (anything indexable by `H`, such as a
/// `TypedArena<E>` or a `Vec<E>`), and each entry embeds an `RbLink<H>`. Keys are read through
/// the key extractor `X` and ordered by the comparator `C`. The same storage must be passed to
/// every call on a tree.
///
/// # Examples
///
/// ```
/// use intrusive_bst::arena::{Handle, TypedArena};
/// use intrusive_bst::order::{ByKey, Keyed};
/// use intrusive_bst::{InsertCheck, Linked, RbLink, RbTree};
///
/// struct Order {
///     id: u32,
///     link: RbLink<Handle>,
/// }
///
/// impl Keyed for Order {
///     type Key = u32;
///
///     fn key(&self) -> &u32 {
///         &self.id
///     }
/// }
///
/// impl Linked<RbLink<Handle>> for Order {
///     fn link(&self) -> &RbLink<Handle> {
///         &self.link
///     }
///
///     fn link_mut(&mut self) -> &mut RbLink<Handle> {
///         &mut self.link
///     }
/// }
///
/// let mut arena: TypedArena<Order> = TypedArena::new(64);
/// let mut tree: RbTree<Handle, ByKey> = RbTree::new();
///
/// for id in &[5, 1, 3] {
///     if let InsertCheck::Vacant(context) = tree.insert_check(&arena, id) {
///         let order = arena.allocate(Order { id: *id, link: RbLink::new() });
///         tree.insert_commit(&mut arena, context, order);
///     }
/// }
///
/// assert!(tree.insert_check(&arena, &3).occupied().is_some());
/// assert_eq!(tree.first().map(|order| arena[order].id), Some(1));
/// assert_eq!(tree.last().map(|order| arena[order].id), Some(5));
///
/// let removed = tree.remove(&mut arena, &3).unwrap();
/// assert_eq!(arena.free(&removed).id, 3);
/// assert_eq!(tree.len(), 2);
/// ```
pub struct RbTree<H, X, C = NaturalOrder> {
    pub(crate) root: Option<H>,
    pub(crate) first: Option<H>,
    pub(crate) last: Option<H>,
    pub(crate) len: usize,
    generation: u64,
    _strategy: PhantomData<fn() -> (X, C)>,
}

impl<H, X, C> RbTree<H, X, C>
where
    H: Copy + Eq,
{
    /// Constructs a new, empty `RbTree`.
    pub fn new() -> Self {
        RbTree {
            root: None,
            first: None,
            last: None,
            len: 0,
            generation: 0,
            _strategy: PhantomData,
        }
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree has no resident entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<H> {
        self.root
    }

    /// Returns the entry with the minimum key in O(1), or `None` if the tree is empty.
    pub fn first(&self) -> Option<H> {
        self.first
    }

    /// Returns the entry with the maximum key in O(1), or `None` if the tree is empty.
    pub fn last(&self) -> Option<H> {
        self.last
    }

    /// Returns `true` if `position` is the end-of-sequence marker returned by `successor`,
    /// `predecessor`, `first`, `last` and the lookups.
    pub fn is_terminator(&self, position: Option<H>) -> bool {
        position.is_none()
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the entry that follows `node` in key order.
    pub fn successor<S>(&self, store: &S, node: H) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        links::successor::<RbLink<H>, H, S>(store, node)
    }

    /// Returns the entry that precedes `node` in key order.
    pub fn predecessor<S>(&self, store: &S, node: H) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        links::predecessor::<RbLink<H>, H, S>(store, node)
    }

    /// Returns an in-order iterator over the handles of the resident entries.
    pub fn iter<'a, S>(&self, store: &'a S) -> Iter<'a, RbLink<H>, H, S>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        Iter::new(store, self.first, self.last)
    }

    /// Looks up an entry whose key compares equal to `key`.
    pub fn search<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::search::<RbLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Returns the last entry whose key is less than or equal to `key`.
    pub fn floor<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::floor::<RbLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Returns the first entry whose key is greater than or equal to `key`.
    pub fn ceil<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::ceil::<RbLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Finds the slot for `key` without mutating the tree.
    ///
    /// Returns `InsertCheck::Occupied` with the resident entry if an equal key exists, otherwise a
    /// context to pass to `insert_commit`.
    pub fn insert_check<S>(&self, store: &S, key: &X::Key) -> InsertCheck<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        match links::find_slot::<RbLink<H>, H, S, X, C>(self.root, store, key) {
            Ok((parent, side)) => {
                InsertCheck::Vacant(CommitContext::new(parent, side, self.generation))
            },
            Err(node) => InsertCheck::Occupied(node),
        }
    }

    /// Finds the slot for `key`, accepting equal keys. The new entry is placed after every
    /// resident entry with an equal key.
    pub fn insert_check_multi<S>(&self, store: &S, key: &X::Key) -> CommitContext<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let (parent, side) =
            links::find_slot_multi::<RbLink<H>, H, S, X, C>(self.root, store, key);
        CommitContext::new(parent, side, self.generation)
    }

    /// Links `node` into the slot described by `context` and rebalances.
    ///
    /// `node` must not be resident in any tree using the same link record, and `context` must come
    /// from the latest `insert_check` on this tree with no mutation in between.
    pub fn insert_commit<S>(&mut self, store: &mut S, context: CommitContext<H>, node: H)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        debug_assert_eq!(
            context.generation, self.generation,
            "Expected a commit context from the latest check.",
        );

        *link_mut(store, node) = RbLink {
            left: None,
            right: None,
            parent: context.parent,
            color: Color::Red,
        };

        match context.parent {
            None => {
                set_color(store, node, Color::Black);
                self.root = Some(node);
                self.first = Some(node);
                self.last = Some(node);
            },
            Some(parent) => {
                link_mut(store, parent).set_child(context.side, Some(node));
                match context.side {
                    Side::Left if self.first == Some(parent) => self.first = Some(node),
                    Side::Right if self.last == Some(parent) => self.last = Some(node),
                    _ => {},
                }
                if is_red(store, Some(parent)) {
                    self.insert_fixup(store, node);
                }
            },
        }

        self.len += 1;
        self.bump();
    }

    /// Inserts the prepared entry `node` using its own key. Returns `Err` with the resident entry
    /// if an equal key exists, leaving `node` detached.
    pub fn insert<S>(&mut self, store: &mut S, node: H) -> Result<(), H>
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let check = self.insert_check(&*store, X::key(&store[node]));
        match check {
            InsertCheck::Vacant(context) => {
                self.insert_commit(store, context, node);
                Ok(())
            },
            InsertCheck::Occupied(existing) => Err(existing),
        }
    }

    /// Inserts the prepared entry `node` after every resident entry with an equal key.
    pub fn insert_multi<S>(&mut self, store: &mut S, node: H)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let context = self.insert_check_multi(&*store, X::key(&store[node]));
        self.insert_commit(store, context, node);
    }

    fn rotate<S>(&mut self, store: &mut S, node: H, dir: Side)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        links::rotate::<RbLink<H>, H, S>(&mut self.root, store, node, dir);
    }

    fn transplant<S>(&mut self, store: &mut S, old: H, new: Option<H>)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        links::transplant::<RbLink<H>, H, S>(&mut self.root, store, old, new);
    }

    // Seen as a 2-3-4 tree, a red parent means the new node joined a 3-node or 4-node. A red uncle
    // means a 4-node overflowed: split it by recoloring and push the grandparent up. A black uncle
    // means a 3-node became a 4-node: one or two rotations settle it locally.
    fn insert_fixup<S>(&mut self, store: &mut S, mut node: H)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        loop {
            let mut parent = match link(store, node).parent {
                Some(parent) if is_red(store, Some(parent)) => parent,
                _ => break,
            };
            let grandparent = link(store, parent)
                .parent
                .expect("Expected a red node to have a parent.");
            let side = links::side_of::<RbLink<H>, H, S>(store, grandparent, Some(parent));

            match link(store, grandparent).child(side.flip()) {
                Some(uncle) if is_red(store, Some(uncle)) => {
                    set_color(store, parent, Color::Black);
                    set_color(store, uncle, Color::Black);
                    set_color(store, grandparent, Color::Red);
                    node = grandparent;
                },
                _ => {
                    if link(store, parent).child(side.flip()) == Some(node) {
                        self.rotate(store, parent, side);
                        mem::swap(&mut node, &mut parent);
                    }
                    self.rotate(store, grandparent, side.flip());
                    set_color(store, parent, Color::Black);
                    set_color(store, grandparent, Color::Red);
                    break;
                },
            }
        }

        if let Some(root) = self.root {
            set_color(store, root, Color::Black);
        }
    }

    /// Removes the entry whose key compares equal to `key` and returns it, detached. Returns
    /// `None` if no such entry is resident.
    pub fn remove<S>(&mut self, store: &mut S, key: &X::Key) -> Option<H>
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let node = self.search(&*store, key)?;
        self.remove_node(store, node);
        Some(node)
    }

    /// Unlinks the resident entry `node` and rebalances. The entry itself stays in `store`.
    pub fn remove_node<S>(&mut self, store: &mut S, node: H)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        if self.first == Some(node) {
            self.first = self.successor(&*store, node);
        }
        if self.last == Some(node) {
            self.last = self.predecessor(&*store, node);
        }

        let RbLink {
            left,
            right,
            parent,
            color,
        } = link(store, node).clone();

        // `child` took the place of the node that was physically unlinked; `child_parent` tracks
        // its parent since `child` may be absent.
        let (child, child_parent, removed_color) = match (left, right) {
            (None, _) => {
                self.transplant(store, node, right);
                (right, parent, color)
            },
            (_, None) => {
                self.transplant(store, node, left);
                (left, parent, color)
            },
            (Some(left), Some(right)) => {
                let heir = links::subtree_min::<RbLink<H>, H, S>(store, right);
                let heir_link = link(store, heir);
                let (heir_right, heir_color) = (heir_link.right, heir_link.color);

                let child_parent = if heir == right {
                    Some(heir)
                } else {
                    let heir_parent = heir_link.parent;
                    self.transplant(store, heir, heir_right);
                    link_mut(store, heir).right = Some(right);
                    link_mut(store, right).parent = Some(heir);
                    heir_parent
                };

                self.transplant(store, node, Some(heir));
                let heir_link = link_mut(store, heir);
                heir_link.left = Some(left);
                heir_link.color = color;
                link_mut(store, left).parent = Some(heir);
                (heir_right, child_parent, heir_color)
            },
        };

        if removed_color == Color::Black {
            self.remove_fixup(store, child, child_parent);
        }

        *link_mut(store, node) = RbLink::new();
        self.len -= 1;
        self.bump();
    }

    // `child` carries an extra black. Borrow from a sibling that is a 3-node or 4-node in 2-3-4
    // terms; otherwise merge with a 2-node sibling and push the deficit to the parent.
    fn remove_fixup<S>(&mut self, store: &mut S, mut child: Option<H>, mut parent: Option<H>)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
    {
        while child != self.root && !is_red(store, child) {
            let current_parent = match parent {
                Some(parent) => parent,
                None => break,
            };
            let side = links::side_of::<RbLink<H>, H, S>(store, current_parent, child);
            let far = side.flip();

            let mut sibling = link(store, current_parent)
                .child(far)
                .expect("Expected a sibling opposite a black-height deficit.");

            if is_red(store, Some(sibling)) {
                set_color(store, sibling, Color::Black);
                set_color(store, current_parent, Color::Red);
                self.rotate(store, current_parent, side);
                sibling = link(store, current_parent)
                    .child(far)
                    .expect("Expected a sibling after rotating a red sibling away.");
            }

            let near_nephew = link(store, sibling).child(side);
            let far_nephew = link(store, sibling).child(far);

            if !is_red(store, near_nephew) && !is_red(store, far_nephew) {
                set_color(store, sibling, Color::Red);
                child = Some(current_parent);
                parent = link(store, current_parent).parent;
                continue;
            }

            if !is_red(store, far_nephew) {
                let near_nephew = near_nephew.expect("Expected a red near nephew.");
                set_color(store, near_nephew, Color::Black);
                set_color(store, sibling, Color::Red);
                self.rotate(store, sibling, far);
                sibling = link(store, current_parent)
                    .child(far)
                    .expect("Expected a sibling after rotating the near nephew up.");
            }

            let parent_color = link(store, current_parent).color;
            set_color(store, sibling, parent_color);
            set_color(store, current_parent, Color::Black);
            if let Some(far_nephew) = link(store, sibling).child(far) {
                set_color(store, far_nephew, Color::Black);
            }
            self.rotate(store, current_parent, side);
            child = self.root;
            break;
        }

        if let Some(child) = child {
            set_color(store, child, Color::Black);
        }
    }

    /// Detaches every entry without recursion and hands each one to `release`, then resets the
    /// tree to empty. Returns the number of released entries.
    ///
    /// `release` receives each entry after its links are reset and may free it from `store`.
    pub fn teardown<S, F>(&mut self, store: &mut S, release: F) -> usize
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<RbLink<H>>,
        F: FnMut(&mut S, H),
    {
        let released = links::teardown::<RbLink<H>, H, S, F>(self.root, store, release);
        trace!(released, "red-black tree torn down");

        self.root = None;
        self.first = None;
        self.last = None;
        self.len = 0;
        self.bump();
        released
    }
}

impl<H, X, C> Default for RbTree<H, X, C>
where
    H: Copy + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}
