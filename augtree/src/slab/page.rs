//! A single fixed-capacity page of node slots.

use crate::node::Node;
use crate::slab::bitmap::Bitmap;

pub(crate) struct Page<V> {
    slots: Vec<Option<Node<V>>>,
    live: Bitmap,
    live_count: u32,
    capacity: u32,
    next_free_word_hint: usize,
}

impl<V> Page<V> {
    pub fn new(capacity: u32) -> Self {
        let mut slots = Vec::with_capacity(capacity as usize);
        slots.resize_with(capacity as usize, || None);
        Page {
            slots,
            live: Bitmap::new(capacity as usize),
            live_count: 0,
            capacity,
            next_free_word_hint: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.live_count == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Reserves slot 0 without storing a node there, used only for page 0
    /// so that handle zero (`Handle::NIL`) is never handed out by
    /// [`Page::alloc_slot`].
    pub fn reserve_slot_zero(&mut self) {
        self.live.set(0);
        self.live_count += 1;
    }

    pub fn alloc_slot(&mut self, node: Node<V>) -> Option<u32> {
        let slot = self.live.find_first_zero(self.next_free_word_hint)? as u32;
        self.live.set(slot as usize);
        self.live_count += 1;
        self.next_free_word_hint = slot as usize / 64;
        self.slots[slot as usize] = Some(node);
        Some(slot)
    }

    pub fn free_slot(&mut self, slot: u32) {
        debug_assert!(self.slots[slot as usize].is_some(), "freeing an already-dead slot");
        self.slots[slot as usize] = None;
        self.live.clear(slot as usize);
        self.live_count -= 1;
    }

    pub fn get(&self, slot: u32) -> Option<&Node<V>> {
        self.slots[slot as usize].as_ref()
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Node<V>> {
        self.slots[slot as usize].as_mut()
    }
}
