use crate::handles::Handle;

/// Fixed-capacity slot arena with an index free list.
///
/// All slots are allocated up front and never freed; `acquire`/`release` only
/// move indices on and off the free list. Slot values survive a release so
/// callers can reuse buffers held inside them.
///
/// Ordering contract:
/// - A fresh arena hands out slots in ascending index order.
/// - After that the free list is LIFO: the most recently released slot is the
///   next one acquired.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    occupied: bool,
    value: T,
}

impl<T> SlotArena<T> {
    pub fn new(capacity: usize, mut init: impl FnMut(u32) -> T) -> Self {
        let capacity = capacity.min(u32::MAX as usize) as u32;
        let slots = (0..capacity)
            .map(|i| Slot {
                generation: 0,
                occupied: false,
                value: init(i),
            })
            .collect();
        let free = (0..capacity).rev().collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Marks a free slot occupied. Returns `None` when every slot is taken.
    pub fn acquire(&mut self) -> Option<Handle> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.occupied);
        slot.occupied = true;
        Some(Handle::new(index, slot.generation))
    }

    /// Returns the slot to the free list.
    ///
    /// Releasing a stale or already-released handle is a no-op and returns
    /// `false`.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index() as usize) else {
            return false;
        };
        if !slot.occupied || slot.generation != handle.generation() {
            return false;
        }
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        true
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|s| s.occupied && s.generation == handle.generation())
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index() as usize)?;
        (slot.occupied && slot.generation == handle.generation()).then_some(&slot.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.occupied && slot.generation == handle.generation() {
            Some(&mut slot.value)
        } else {
            None
        }
    }

    /// Occupied slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.occupied
                .then(|| (Handle::new(i as u32, s.generation), &s.value))
        })
    }

    /// Occupied slots in ascending index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            if s.occupied {
                Some((Handle::new(i as u32, s.generation), &mut s.value))
            } else {
                None
            }
        })
    }
}
