use crate::avl_tree::node::AvlLink;
use crate::commit::{CommitContext, InsertCheck};
use crate::links::{self, Iter, Linked, Links, Side};
use crate::order::{Comparator, KeyExtractor, NaturalOrder};
use std::cmp;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use tracing::trace;

#[inline]
pub(crate) fn link<H, S>(store: &S, node: H) -> &AvlLink<H>
where
    S: Index<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    <S::Output as Linked<AvlLink<H>>>::link(&store[node])
}

#[inline]
fn link_mut<H, S>(store: &mut S, node: H) -> &mut AvlLink<H>
where
    S: IndexMut<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    <S::Output as Linked<AvlLink<H>>>::link_mut(&mut store[node])
}

#[inline]
pub(crate) fn height<H, S>(store: &S, node: Option<H>) -> usize
where
    S: Index<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    match node {
        Some(node) => link(store, node).height,
        None => 0,
    }
}

fn update<H, S>(store: &mut S, node: H)
where
    H: Copy,
    S: IndexMut<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    let node_link = link(store, node);
    let new_height = cmp::max(
        height(store, node_link.left),
        height(store, node_link.right),
    ) + 1;
    link_mut(store, node).height = new_height;
}

fn balance<H, S>(store: &S, node: H) -> isize
where
    H: Copy,
    S: Index<H> + ?Sized,
    S::Output: Linked<AvlLink<H>>,
{
    let node_link = link(store, node);
    height(store, node_link.left) as isize - height(store, node_link.right) as isize
}

/// An intrusive AVL tree over caller-owned entries.
///
/// The tree stores handles `H` into a storage `S` (anything indexable by `H`), and each entry
/// embeds an `AvlLink<H>`. Keys are read through the key extractor `X` and ordered by the
/// comparator `C`. The same storage must be passed to every call on a tree.
///
/// # Examples
///
/// ```
/// use intrusive_bst::order::KeyExtractor;
/// use intrusive_bst::{AvlLink, AvlTree, Linked};
///
/// struct Page {
///     offset: u64,
///     link: AvlLink<usize>,
/// }
///
/// impl Linked<AvlLink<usize>> for Page {
///     fn link(&self) -> &AvlLink<usize> {
///         &self.link
///     }
///
///     fn link_mut(&mut self) -> &mut AvlLink<usize> {
///         &mut self.link
///     }
/// }
///
/// struct ByOffset;
///
/// impl KeyExtractor<Page> for ByOffset {
///     type Key = u64;
///
///     fn key(page: &Page) -> &u64 {
///         &page.offset
///     }
/// }
///
/// let mut pages: Vec<Page> = (0..7)
///     .map(|i| Page { offset: i * 4096, link: AvlLink::new() })
///     .collect();
/// let mut tree: AvlTree<usize, ByOffset> = AvlTree::new();
///
/// for page in 0..pages.len() {
///     tree.insert(&mut pages, page).unwrap();
/// }
///
/// assert_eq!(tree.height(&pages), 3);
/// assert_eq!(tree.floor(&pages, &5000), Some(1));
/// ```
pub struct AvlTree<H, X, C = NaturalOrder> {
    pub(crate) root: Option<H>,
    pub(crate) len: usize,
    generation: u64,
    _strategy: PhantomData<fn() -> (X, C)>,
}

impl<H, X, C> AvlTree<H, X, C>
where
    H: Copy + Eq,
{
    /// Constructs a new, empty `AvlTree`.
    pub fn new() -> Self {
        AvlTree {
            root: None,
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

    /// Returns `true` if `position` is the end-of-sequence marker.
    pub fn is_terminator(&self, position: Option<H>) -> bool {
        position.is_none()
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the entry with the minimum key, walking the left spine.
    pub fn first<S>(&self, store: &S) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        self.root
            .map(|root| links::subtree_min::<AvlLink<H>, H, S>(store, root))
    }

    /// Returns the entry with the maximum key, walking the right spine.
    pub fn last<S>(&self, store: &S) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        self.root
            .map(|root| links::subtree_max::<AvlLink<H>, H, S>(store, root))
    }

    pub fn successor<S>(&self, store: &S, node: H) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        links::successor::<AvlLink<H>, H, S>(store, node)
    }

    pub fn predecessor<S>(&self, store: &S, node: H) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        links::predecessor::<AvlLink<H>, H, S>(store, node)
    }

    /// Returns an in-order iterator over the handles of the resident entries.
    pub fn iter<'a, S>(&self, store: &'a S) -> Iter<'a, AvlLink<H>, H, S>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        Iter::new(store, self.first(store), self.last(store))
    }

    /// Looks up an entry whose key compares equal to `key`.
    pub fn search<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::search::<AvlLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Returns the last entry whose key is less than or equal to `key`.
    pub fn floor<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::floor::<AvlLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Returns the first entry whose key is greater than or equal to `key`.
    pub fn ceil<S>(&self, store: &S, key: &X::Key) -> Option<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        links::ceil::<AvlLink<H>, H, S, X, C>(self.root, store, key)
    }

    /// Finds the slot for `key` without mutating the tree.
    ///
    /// Returns `InsertCheck::Occupied` with the resident entry if an equal key exists, otherwise a
    /// context to pass to `insert_commit`.
    pub fn insert_check<S>(&self, store: &S, key: &X::Key) -> InsertCheck<H>
    where
        S: Index<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        match links::find_slot::<AvlLink<H>, H, S, X, C>(self.root, store, key) {
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
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let (parent, side) =
            links::find_slot_multi::<AvlLink<H>, H, S, X, C>(self.root, store, key);
        CommitContext::new(parent, side, self.generation)
    }

    /// Links `node` into the slot described by `context` and rebalances.
    ///
    /// `node` must not be resident in any tree using the same link record, and `context` must come
    /// from the latest `insert_check` on this tree with no mutation in between.
    pub fn insert_commit<S>(&mut self, store: &mut S, context: CommitContext<H>, node: H)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        debug_assert_eq!(
            context.generation, self.generation,
            "Expected a commit context from the latest check.",
        );

        *link_mut(store, node) = AvlLink {
            left: None,
            right: None,
            parent: context.parent,
            height: 1,
        };

        match context.parent {
            None => self.root = Some(node),
            Some(parent) => {
                link_mut(store, parent).set_child(context.side, Some(node));
                self.retrace(store, Some(parent));
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
        S::Output: Linked<AvlLink<H>>,
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
        S::Output: Linked<AvlLink<H>>,
        X: KeyExtractor<S::Output>,
        C: Comparator<X::Key>,
    {
        let context = self.insert_check_multi(&*store, X::key(&store[node]));
        self.insert_commit(store, context, node);
    }

    fn rotate<S>(&mut self, store: &mut S, node: H, dir: Side)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        links::rotate::<AvlLink<H>, H, S>(&mut self.root, store, node, dir);
    }

    // Recomputes the height of `node` and rotates if it is off balance by two. Returns the root
    // of the subtree that now sits in the position of `node`.
    fn rebalance<S>(&mut self, store: &mut S, node: H) -> H
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        update(store, node);

        let heavy = match balance(store, node) {
            b if b > 1 => Side::Left,
            b if b < -1 => Side::Right,
            _ => return node,
        };
        let child = link(store, node)
            .child(heavy)
            .expect("Expected a child on the heavy side.");

        let inner_taller = match heavy {
            Side::Left => balance(store, child) < 0,
            Side::Right => balance(store, child) > 0,
        };
        if inner_taller {
            self.rotate(store, child, heavy);
            update(store, child);
            let inner = link(store, child)
                .parent
                .expect("Expected the rotated child to have a parent.");
            update(store, inner);
        }

        self.rotate(store, node, heavy.flip());
        update(store, node);
        let top = link(store, node)
            .parent
            .expect("Expected the rotated node to have a parent.");
        update(store, top);
        top
    }

    // Walks upward from `cursor`, stopping once a subtree keeps the height it had before the
    // mutation.
    fn retrace<S>(&mut self, store: &mut S, mut cursor: Option<H>)
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
    {
        while let Some(node) = cursor {
            let old_height = link(store, node).height;
            let top = self.rebalance(store, node);
            if link(store, top).height == old_height {
                break;
            }
            cursor = link(store, top).parent;
        }
    }

    /// Removes the entry whose key compares equal to `key` and returns it, detached. Returns
    /// `None` if no such entry is resident.
    pub fn remove<S>(&mut self, store: &mut S, key: &X::Key) -> Option<H>
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
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
        S::Output: Linked<AvlLink<H>>,
    {
        let AvlLink {
            left,
            right,
            parent,
            height,
        } = link(store, node).clone();

        let start = match (left, right) {
            (None, _) => {
                links::transplant::<AvlLink<H>, H, S>(&mut self.root, store, node, right);
                parent
            },
            (_, None) => {
                links::transplant::<AvlLink<H>, H, S>(&mut self.root, store, node, left);
                parent
            },
            (Some(left), Some(right)) => {
                let heir = links::subtree_min::<AvlLink<H>, H, S>(store, right);
                let start = if heir == right {
                    heir
                } else {
                    let heir_link = link(store, heir);
                    let (heir_parent, heir_right) = (heir_link.parent, heir_link.right);
                    links::transplant::<AvlLink<H>, H, S>(&mut self.root, store, heir, heir_right);
                    link_mut(store, heir).right = Some(right);
                    link_mut(store, right).parent = Some(heir);
                    heir_parent.expect("Expected a left descendant to have a parent.")
                };

                links::transplant::<AvlLink<H>, H, S>(&mut self.root, store, node, Some(heir));
                let heir_link = link_mut(store, heir);
                heir_link.left = Some(left);
                heir_link.height = height;
                link_mut(store, left).parent = Some(heir);
                Some(start)
            },
        };

        self.retrace(store, start);

        *link_mut(store, node) = AvlLink::new();
        self.len -= 1;
        self.bump();
    }

    /// Detaches every entry without recursion and hands each one to `release`, then resets the
    /// tree to empty. Returns the number of released entries.
    pub fn teardown<S, F>(&mut self, store: &mut S, release: F) -> usize
    where
        S: IndexMut<H> + ?Sized,
        S::Output: Linked<AvlLink<H>>,
        F: FnMut(&mut S, H),
    {
        let released = links::teardown::<AvlLink<H>, H, S, F>(self.root, store, release);
        trace!(released, "avl tree torn down");

        self.root = None;
        self.len = 0;
        self.bump();
        released
    }
}

impl<H, X, C> Default for AvlTree<H, X, C>
where
    H: Copy + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::AvlTree;
    use crate::arena::{Handle, TypedArena};
    use crate::avl_tree::node::AvlLink;
    use crate::commit::InsertCheck;
    use crate::links::{Linked, Side};
    use crate::order::{ByKey, Keyed};

    struct Item {
        key: u32,
        link: AvlLink<Handle>,
    }

    impl Item {
        fn new(key: u32) -> Self {
            Item {
                key,
                link: AvlLink::new(),
            }
        }
    }

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.key
        }
    }

    impl Linked<AvlLink<Handle>> for Item {
        fn link(&self) -> &AvlLink<Handle> {
            &self.link
        }

        fn link_mut(&mut self) -> &mut AvlLink<Handle> {
            &mut self.link
        }
    }

    type Tree = AvlTree<Handle, ByKey>;

    fn build(keys: &[u32]) -> (Tree, TypedArena<Item>) {
        let mut arena = TypedArena::new(64);
        let mut tree = Tree::new();
        for key in keys {
            let node = arena.allocate(Item::new(*key));
            assert!(tree.insert(&mut arena, node).is_ok());
            tree.verify_invariants(&arena).unwrap();
        }
        (tree, arena)
    }

    fn keys(tree: &Tree, arena: &TypedArena<Item>) -> Vec<u32> {
        tree.iter(arena).map(|node| arena[node].key).collect()
    }

    fn root_key(tree: &Tree, arena: &TypedArena<Item>) -> Option<u32> {
        tree.root().map(|node| arena[node].key)
    }

    #[test]
    fn test_new_is_empty() {
        let tree = Tree::new();
        let arena: TypedArena<Item> = TypedArena::new(1);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(&arena), 0);
        assert!(tree.is_terminator(tree.first(&arena)));
        assert!(tree.is_terminator(tree.last(&arena)));
    }

    #[test]
    fn test_single_rotations() {
        let (tree, arena) = build(&[3, 2, 1]);
        assert_eq!(root_key(&tree, &arena), Some(2));
        assert_eq!(tree.height(&arena), 2);

        let (tree, arena) = build(&[1, 2, 3]);
        assert_eq!(root_key(&tree, &arena), Some(2));
        assert_eq!(tree.height(&arena), 2);
    }

    #[test]
    fn test_double_rotations() {
        let (tree, arena) = build(&[3, 1, 2]);
        assert_eq!(root_key(&tree, &arena), Some(2));
        assert_eq!(tree.height(&arena), 2);

        let (tree, arena) = build(&[1, 3, 2]);
        assert_eq!(root_key(&tree, &arena), Some(2));
        assert_eq!(tree.height(&arena), 2);
    }

    #[test]
    fn test_ascending_is_perfect() {
        let (tree, arena) = build(&(1..8).collect::<Vec<u32>>());
        assert_eq!(root_key(&tree, &arena), Some(4));
        assert_eq!(tree.height(&arena), 3);
    }

    #[test]
    fn test_insert_check_reports_slot() {
        let (tree, arena) = build(&[2]);
        let root = tree.root().unwrap();

        match tree.insert_check(&arena, &3) {
            InsertCheck::Vacant(context) => {
                assert_eq!(context.parent(), Some(root));
                assert_eq!(context.side(), Side::Right);
            },
            InsertCheck::Occupied(_) => panic!("Expected a vacant slot."),
        }
        assert_eq!(tree.insert_check(&arena, &2), InsertCheck::Occupied(root));
    }

    #[test]
    fn test_insert_check_multi_passes_equal_keys_right() {
        let (tree, arena) = build(&[2, 1, 3]);
        let three = tree.search(&arena, &3).unwrap();

        let context = tree.insert_check_multi(&arena, &2);
        assert_eq!(context.parent(), Some(three));
        assert_eq!(context.side(), Side::Left);
    }

    #[test]
    #[should_panic(expected = "Expected a commit context from the latest check.")]
    fn test_commit_after_mutation_panics() {
        let (mut tree, mut arena) = build(&[2, 4]);
        let context = match tree.insert_check(&arena, &3) {
            InsertCheck::Vacant(context) => context,
            InsertCheck::Occupied(_) => panic!("Expected a vacant slot."),
        };

        let other = arena.allocate(Item::new(1));
        tree.insert(&mut arena, other).unwrap();

        let node = arena.allocate(Item::new(3));
        tree.insert_commit(&mut arena, context, node);
    }

    #[test]
    fn test_ascending_scenario() {
        let (mut tree, mut arena) = build(&(0..10).collect::<Vec<u32>>());
        assert_eq!(tree.first(&arena).map(|node| arena[node].key), Some(0));
        assert_eq!(tree.last(&arena).map(|node| arena[node].key), Some(9));

        let removed = tree.remove(&mut arena, &5).unwrap();
        assert_eq!(arena[removed].key, 5);
        assert!(arena[removed].link.is_detached());
        assert_eq!(arena[removed].link.height(), 0);
        assert_eq!(keys(&tree, &arena), vec![0, 1, 2, 3, 4, 6, 7, 8, 9]);
        tree.verify_invariants(&arena).unwrap();
    }

    #[test]
    fn test_insert_duplicate_leaves_tree_unchanged() {
        let (mut tree, mut arena) = build(&[3, 1, 2]);
        let original = tree.search(&arena, &2).unwrap();
        let duplicate = arena.allocate(Item::new(2));

        assert_eq!(tree.insert(&mut arena, duplicate), Err(original));
        assert_eq!(tree.len(), 3);
        assert!(arena[duplicate].link.is_detached());
    }

    #[test]
    fn test_remove_rebalances() {
        // Removing 1 leaves the root right-heavy by two.
        let (mut tree, mut arena) = build(&[2, 1, 3, 4]);
        tree.remove(&mut arena, &1).unwrap();
        tree.verify_invariants(&arena).unwrap();
        assert_eq!(root_key(&tree, &arena), Some(3));
        assert_eq!(tree.height(&arena), 2);
    }

    #[test]
    fn test_remove_with_distant_heir() {
        let (mut tree, mut arena) = build(&[4, 2, 6, 1, 3, 5, 7]);
        tree.remove(&mut arena, &4).unwrap();
        tree.verify_invariants(&arena).unwrap();
        assert_eq!(root_key(&tree, &arena), Some(5));
        assert_eq!(keys(&tree, &arena), vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_remove_all() {
        let (mut tree, mut arena) = build(&(0..32).collect::<Vec<u32>>());
        for key in (0..32).rev() {
            tree.remove(&mut arena, &key).unwrap();
            tree.verify_invariants(&arena).unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.remove(&mut arena, &0), None);
    }

    #[test]
    fn test_successor_predecessor() {
        let (tree, arena) = build(&[20, 10, 30, 5, 15]);
        let node = tree.search(&arena, &15).unwrap();

        let next = tree.successor(&arena, node).unwrap();
        assert_eq!(arena[next].key, 20);
        let prev = tree.predecessor(&arena, node).unwrap();
        assert_eq!(arena[prev].key, 10);
        assert!(tree.is_terminator(tree.successor(&arena, tree.last(&arena).unwrap())));
    }

    #[test]
    fn test_floor_ceil() {
        let (tree, arena) = build(&[1, 3, 5]);
        let key_of = |node: Option<Handle>| node.map(|node| arena[node].key);

        assert_eq!(key_of(tree.floor(&arena, &0)), None);
        assert_eq!(key_of(tree.floor(&arena, &4)), Some(3));
        assert_eq!(key_of(tree.ceil(&arena, &4)), Some(5));
        assert_eq!(key_of(tree.ceil(&arena, &6)), None);
    }

    #[test]
    fn test_multi_keeps_insertion_order() {
        let mut arena = TypedArena::new(16);
        let mut tree = Tree::new();
        let mut handles = Vec::new();
        for key in &[2, 1, 2, 3, 2] {
            let node = arena.allocate(Item::new(*key));
            tree.insert_multi(&mut arena, node);
            handles.push(node);
        }
        tree.verify_invariants(&arena).unwrap();

        let order: Vec<Handle> = tree.iter(&arena).collect();
        assert_eq!(
            order,
            vec![handles[1], handles[0], handles[2], handles[4], handles[3]],
        );

        tree.remove_node(&mut arena, handles[0]);
        let order: Vec<Handle> = tree.iter(&arena).collect();
        assert_eq!(order, vec![handles[1], handles[2], handles[4], handles[3]]);
        tree.verify_invariants(&arena).unwrap();
    }

    #[test]
    fn test_teardown_releases_all() {
        let (mut tree, mut arena) = build(&(0..50).collect::<Vec<u32>>());
        let mut released = Vec::new();

        let count = tree.teardown(&mut arena, |arena, node| {
            released.push(arena.free(&node).key);
        });

        assert_eq!(count, 50);
        assert!(arena.is_empty());
        assert!(tree.is_empty());
        released.sort();
        assert_eq!(released, (0..50).collect::<Vec<u32>>());
    }
}
