//! Chunked slab that hands out stable handles to entries.
//!
//! The tree engines in this crate never allocate. Entries live in caller-owned storage and the
//! trees only rewire the links embedded in them. `TypedArena<T>` is one such storage: it never
//! moves an entry once allocated, and a `Handle` stays valid until the entry is freed.

use std::mem;
use std::ops::{Index, IndexMut};

/// A handle to an entry in a `TypedArena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    /// Returns the flat slot index of the handle.
    pub fn index(self) -> usize {
        self.0
    }
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Handle>),
}

/// A slab of entries of a single type, organized in fixed-size chunks.
///
/// Growing the arena pushes a new chunk instead of reallocating, so entries are never moved.
/// Freed slots are threaded onto a free list and reused by later allocations.
///
/// # Examples
///
/// ```
/// use intrusive_bst::arena::TypedArena;
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(&x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Handle>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
}

impl<T> TypedArena<T> {
    /// Constructs a new, empty `TypedArena<T>` holding `chunk_size` entries per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_bst::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(64);
    /// assert_eq!(arena.capacity(), 0);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Expected a positive chunk size.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
        }
    }

    fn locate(&self, handle: Handle) -> (usize, usize) {
        (handle.0 / self.chunk_size, handle.0 % self.chunk_size)
    }

    fn block(&self, handle: Handle) -> Option<&Block<T>> {
        let (chunk, offset) = self.locate(handle);
        self.chunks.get(chunk).and_then(|blocks| blocks.get(offset))
    }

    fn block_mut(&mut self, handle: Handle) -> Option<&mut Block<T>> {
        let (chunk, offset) = self.locate(handle);
        self.chunks
            .get_mut(chunk)
            .and_then(|blocks| blocks.get_mut(offset))
    }

    /// Moves `value` into the arena and returns its handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_bst::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(2);
    /// let x = arena.allocate('x');
    /// let y = arena.allocate('y');
    /// assert_ne!(x, y);
    /// assert_eq!(arena.len(), 2);
    /// ```
    pub fn allocate(&mut self, value: T) -> Handle {
        self.len += 1;

        if let Some(handle) = self.head.take() {
            let block = self
                .block_mut(handle)
                .expect("Expected free list to point into the arena.");
            match mem::replace(block, Block::Occupied(value)) {
                Block::Vacant(next) => self.head = next,
                Block::Occupied(_) => panic!("Expected a vacant block on the free list."),
            }
            return handle;
        }

        let needs_chunk = self
            .chunks
            .last()
            .map_or(true, |blocks| blocks.len() == self.chunk_size);
        if needs_chunk {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        }

        let chunk_index = self.chunks.len() - 1;
        let blocks = &mut self.chunks[chunk_index];
        blocks.push(Block::Occupied(value));
        Handle(chunk_index * self.chunk_size + blocks.len() - 1)
    }

    /// Removes the entry behind `handle` from the arena and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not refer to an occupied slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_bst::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(&x), 0);
    /// assert!(!arena.contains(x));
    /// ```
    pub fn free(&mut self, handle: &Handle) -> T {
        let next = self.head;
        let block = match self.block_mut(*handle) {
            Some(block) => block,
            None => panic!("Error: attempting to free invalid block."),
        };
        if let Block::Vacant(_) = block {
            panic!("Error: attempting to free vacant block.");
        }

        match mem::replace(block, Block::Vacant(next)) {
            Block::Occupied(value) => {
                self.len -= 1;
                self.head = Some(*handle);
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to the entry behind `handle`, or `None` if the slot is
    /// vacant or out of range.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.block(handle) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the entry behind `handle`, or `None` if the slot is vacant
    /// or out of range.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.block_mut(handle) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if `handle` refers to a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots reserved across all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_size
    }
}

impl<T> Index<Handle> for TypedArena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(handle).expect("Error: handle does not refer to a live entry.")
    }
}

impl<T> IndexMut<Handle> for TypedArena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(handle)
            .expect("Error: handle does not refer to a live entry.")
    }
}
