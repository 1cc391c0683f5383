//! Generational entity pools.
//!
//! Triangles and subsegments are created and destroyed in large numbers during
//! local remeshing. The pool recycles slots through a free list to avoid
//! allocation churn and tags every slot with a generation counter so that a
//! stale handle to a recycled slot is detected instead of silently aliasing a
//! different live entity.

use std::marker::PhantomData;

/// Implemented by the fixed handle types that index into a [Pool].
pub trait PoolHandle: Copy {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> usize;
    fn generation(&self) -> u32;
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    payload: Option<T>,
}

#[derive(Clone, Debug)]
pub struct Pool<T, H: PoolHandle> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    _handle: PhantomData<H>,
}

impl<T, H: PoolHandle> Pool<T, H> {
    /// Creates a pool whose slot 0 is occupied by `sentinel`.
    ///
    /// The sentinel is never recycled and is not reported by [Self::len] or
    /// iteration; it backs the per-mesh ghost entity.
    pub fn with_sentinel(sentinel: T) -> Self {
        Pool {
            slots: vec![Slot {
                generation: 0,
                payload: Some(sentinel),
            }],
            free: Vec::new(),
            live: 0,
            _handle: PhantomData,
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Number of live entities, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Upper bound (exclusive) of slot indices currently backed by storage.
    pub fn slot_upper_bound(&self) -> usize {
        self.slots.len()
    }

    pub fn insert(&mut self, payload: T) -> H {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.payload.is_none());
            slot.payload = Some(payload);
            H::from_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                payload: Some(payload),
            });
            H::from_parts(index, 0)
        }
    }

    /// Releases a live entity, bumping the slot generation so that any
    /// remaining handle to it becomes stale.
    ///
    /// # Panics
    /// Panics if the handle is stale or refers to the sentinel slot.
    pub fn remove(&mut self, handle: H) -> T {
        assert_ne!(handle.index(), 0, "cannot remove the sentinel entity");
        let slot = &mut self.slots[handle.index()];
        assert_eq!(
            slot.generation,
            handle.generation(),
            "stale handle passed to Pool::remove"
        );
        let payload = slot.payload.take().expect("slot is already empty");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.live -= 1;
        payload
    }

    /// Returns the entity if `handle` is still live, `None` if it is stale.
    pub fn try_get(&self, handle: H) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation == handle.generation() {
            slot.payload.as_ref()
        } else {
            None
        }
    }

    /// Returns `true` if the handle refers to a live entity (or the sentinel).
    pub fn is_live(&self, handle: H) -> bool {
        self.try_get(handle).is_some()
    }

    pub fn get(&self, handle: H) -> &T {
        self.try_get(handle).expect("stale entity handle")
    }

    pub fn get_mut(&mut self, handle: H) -> &mut T {
        let slot = &mut self.slots[handle.index()];
        assert_eq!(
            slot.generation,
            handle.generation(),
            "stale entity handle"
        );
        slot.payload.as_mut().expect("stale entity handle")
    }

    /// The live entity stored at `index`, if any. Used for random sampling.
    pub fn get_at_index(&self, index: usize) -> Option<(H, &T)> {
        let slot = self.slots.get(index)?;
        if index == 0 {
            return None;
        }
        let payload = slot.payload.as_ref()?;
        Some((H::from_parts(index as u32, slot.generation), payload))
    }

    /// Iterates over all live entities, excluding the sentinel.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, slot)| {
                slot.payload
                    .as_ref()
                    .map(|payload| (H::from_parts(index as u32, slot.generation), payload))
            })
    }

    /// Iterates over the handles of all live entities, excluding the sentinel.
    ///
    /// The handles are collected eagerly which allows mutating the pool while
    /// walking them; algorithms check staleness via [Self::try_get].
    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

#[cfg(test)]
mod test {
    use super::{Pool, PoolHandle};

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct TestHandle(u32, u32);

    impl PoolHandle for TestHandle {
        fn from_parts(index: u32, generation: u32) -> Self {
            TestHandle(index, generation)
        }

        fn index(&self) -> usize {
            self.0 as usize
        }

        fn generation(&self) -> u32 {
            self.1
        }
    }

    #[test]
    fn test_insert_remove_recycle() {
        let mut pool: Pool<i32, TestHandle> = Pool::with_sentinel(-1);
        let a = pool.insert(10);
        let b = pool.insert(20);
        assert_eq!(pool.len(), 2);
        assert_eq!(*pool.get(a), 10);

        assert_eq!(pool.remove(a), 10);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.try_get(a), None);
        assert_eq!(*pool.get(b), 20);

        // The freed slot is reused with a new generation.
        let c = pool.insert(30);
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert_eq!(pool.try_get(a), None);
        assert_eq!(*pool.get(c), 30);
    }

    #[test]
    #[should_panic]
    fn test_stale_removal_panics() {
        let mut pool: Pool<i32, TestHandle> = Pool::with_sentinel(-1);
        let a = pool.insert(1);
        pool.remove(a);
        pool.remove(a);
    }

    #[test]
    fn test_iteration_skips_sentinel_and_dead() {
        let mut pool: Pool<i32, TestHandle> = Pool::with_sentinel(-1);
        let a = pool.insert(1);
        let _b = pool.insert(2);
        let _c = pool.insert(3);
        pool.remove(a);

        let mut values: Vec<i32> = pool.iter().map(|(_, value)| *value).collect();
        values.sort();
        assert_eq!(values, vec![2, 3]);
        assert_eq!(pool.get_at_index(0), None);
    }
}
