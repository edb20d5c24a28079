//! Dense-handle node storage: a growable page table over fixed-capacity
//! pages, each tracked by a live-slot bitmap, with a second bitmap over the
//! page table marking full pages (spec §4.1).

mod bitmap;
mod page;

use crate::errors::{TreeError, TreeResult};
use crate::handle::{Handle, MAX_PAGES};
use crate::node::{Color, Node};
use bitmap::Bitmap;
use page::Page;

/// Page capacities grow geometrically; the final tier repeats once the
/// handle's 16-bit slot index is saturated.
const PAGE_TIERS: [u32; 6] = [32, 256, 1024, 4096, 8192, 65536];

fn tier_capacity(page_index: usize) -> u32 {
    PAGE_TIERS[page_index.min(PAGE_TIERS.len() - 1)]
}

pub(crate) struct Slab<V> {
    pages: Vec<Option<Page<V>>>,
    full: Bitmap,
    next_free_page_hint: usize,
}

impl<V> Slab<V> {
    pub fn new() -> Self {
        Slab {
            pages: Vec::new(),
            full: Bitmap::new(0),
            next_free_page_hint: 0,
        }
    }

    pub fn allocate(&mut self, value: Option<V>) -> TreeResult<Handle> {
        let page_index = self.find_or_grow_page_with_room()?;
        let page = self.pages[page_index].as_mut().expect("page just ensured present");
        let slot = page
            .alloc_slot(Node::leaf(value))
            .expect("page selected by find_or_grow_page_with_room must have room");
        if page.is_full() {
            self.full.set(page_index);
        }
        Ok(Handle::new(page_index as u32, slot))
    }

    pub fn free(&mut self, handle: Handle) {
        debug_assert!(!handle.is_nil(), "attempted to free the sentinel handle");
        let page_index = handle.page_index() as usize;
        let was_full = {
            let page = self.pages[page_index].as_mut().expect("freeing a handle on an absent page");
            let was_full = page.is_full();
            page.free_slot(handle.slot_index());
            was_full
        };
        let page_now_empty = self.pages[page_index].as_ref().unwrap().is_empty();
        if page_now_empty && page_index != 0 {
            self.pages[page_index] = None;
            self.full.clear(page_index);
            log::trace!("released empty slab page {page_index}");
        } else if was_full {
            self.full.clear(page_index);
        }
        if page_index < self.next_free_page_hint {
            self.next_free_page_hint = page_index;
        }
    }

    fn find_or_grow_page_with_room(&mut self) -> TreeResult<usize> {
        if let Some(idx) = self.full.find_first_zero(self.next_free_page_hint) {
            debug_assert!(idx < self.pages.len());
            if self.pages[idx].is_none() {
                // A released page leaves a hole with its full-bit cleared;
                // reinitialise it in place rather than growing past it.
                self.pages[idx] = Some(Page::new(tier_capacity(idx)));
            }
            self.next_free_page_hint = idx;
            return Ok(idx);
        }
        self.grow_page_table()
    }

    fn grow_page_table(&mut self) -> TreeResult<usize> {
        let page_index = self.pages.len();
        if page_index as u32 >= MAX_PAGES {
            return Err(TreeError::resource_exhausted(
                "slab handle space exhausted (~2^31 node capacity reached)",
            ));
        }
        let mut page = Page::new(tier_capacity(page_index));
        if page_index == 0 {
            page.reserve_slot_zero();
        }
        self.pages.push(Some(page));
        let mut grown = Bitmap::new(self.pages.len());
        for i in 0..page_index {
            if self.full.get(i) {
                grown.set(i);
            }
        }
        self.full = grown;
        self.next_free_page_hint = page_index;
        log::debug!("grew slab to {} pages", self.pages.len());
        Ok(page_index)
    }

    pub fn is_allocated(&self, handle: Handle) -> bool {
        if handle.is_nil() {
            return false;
        }
        self.try_get(handle).is_some()
    }

    fn try_get(&self, handle: Handle) -> Option<&Node<V>> {
        self.pages
            .get(handle.page_index() as usize)?
            .as_ref()?
            .get(handle.slot_index())
    }

    fn try_get_mut(&mut self, handle: Handle) -> Option<&mut Node<V>> {
        self.pages
            .get_mut(handle.page_index() as usize)?
            .as_mut()?
            .get_mut(handle.slot_index())
    }

    pub fn get(&self, handle: Handle) -> &Node<V> {
        self.try_get(handle).expect("handle does not address a live node")
    }

    pub fn get_mut(&mut self, handle: Handle) -> &mut Node<V> {
        self.try_get_mut(handle).expect("handle does not address a live node")
    }

    pub fn value_is_none(&self, handle: Handle) -> bool {
        !handle.is_nil() && self.try_get(handle).map(|n| n.value.is_none()).unwrap_or(true)
    }

    pub fn value_ref(&self, handle: Handle) -> &V {
        self.get(handle).value.as_ref().expect("node has no value (is it an anchor placeholder?)")
    }

    pub fn take_value(&mut self, handle: Handle) -> V {
        self.get_mut(handle).value.take().expect("node has no value to take")
    }

    pub fn set_value(&mut self, handle: Handle, value: V) {
        self.get_mut(handle).value = Some(value);
    }

    pub fn left(&self, h: Handle) -> Handle {
        if h.is_nil() {
            Handle::NIL
        } else {
            self.get(h).left
        }
    }

    pub fn right(&self, h: Handle) -> Handle {
        if h.is_nil() {
            Handle::NIL
        } else {
            self.get(h).right
        }
    }

    pub fn parent(&self, h: Handle) -> Handle {
        if h.is_nil() {
            Handle::NIL
        } else {
            self.get(h).parent
        }
    }

    pub fn link(&self, h: Handle) -> Handle {
        if h.is_nil() {
            Handle::NIL
        } else {
            self.get(h).link
        }
    }

    pub fn size(&self, h: Handle) -> u32 {
        if h.is_nil() {
            0
        } else {
            self.get(h).size
        }
    }

    pub fn color(&self, h: Handle) -> Color {
        if h.is_nil() {
            Color::Black
        } else {
            self.get(h).color
        }
    }

    pub fn set_left(&mut self, h: Handle, v: Handle) {
        if !h.is_nil() {
            self.get_mut(h).left = v;
        }
    }

    pub fn set_right(&mut self, h: Handle, v: Handle) {
        if !h.is_nil() {
            self.get_mut(h).right = v;
        }
    }

    pub fn set_parent(&mut self, h: Handle, v: Handle) {
        if !h.is_nil() {
            self.get_mut(h).parent = v;
        }
    }

    pub fn set_link(&mut self, h: Handle, v: Handle) {
        if !h.is_nil() {
            self.get_mut(h).link = v;
        }
    }

    pub fn set_size(&mut self, h: Handle, v: u32) {
        if !h.is_nil() {
            self.get_mut(h).size = v;
        }
    }

    pub fn set_color(&mut self, h: Handle, v: Color) {
        if !h.is_nil() {
            self.get_mut(h).color = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_never_returns_nil() {
        let mut slab: Slab<i32> = Slab::new();
        for i in 0..1000 {
            let h = slab.allocate(Some(i)).unwrap();
            assert!(!h.is_nil());
        }
    }

    #[test]
    fn nil_reads_return_defaults() {
        let slab: Slab<i32> = Slab::new();
        assert!(slab.left(Handle::NIL).is_nil());
        assert!(slab.right(Handle::NIL).is_nil());
        assert!(slab.parent(Handle::NIL).is_nil());
        assert_eq!(slab.size(Handle::NIL), 0);
        assert_eq!(slab.color(Handle::NIL), Color::Black);
    }

    #[test]
    fn free_and_reallocate_reuses_slots() {
        let mut slab: Slab<i32> = Slab::new();
        let h = slab.allocate(Some(1)).unwrap();
        slab.free(h);
        let h2 = slab.allocate(Some(2)).unwrap();
        assert_eq!(*slab.value_ref(h2), 2);
    }

    #[test]
    fn growing_past_one_page_works() {
        let mut slab: Slab<i32> = Slab::new();
        let mut handles = Vec::new();
        for i in 0..300 {
            handles.push(slab.allocate(Some(i)).unwrap());
        }
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(*slab.value_ref(*h), i as i32);
        }
    }

    #[test]
    fn emptied_non_zero_page_is_released() {
        let mut slab: Slab<i32> = Slab::new();
        let mut handles = Vec::new();
        for i in 0..40 {
            handles.push(slab.allocate(Some(i)).unwrap());
        }
        // page 0 has capacity 32 (minus reserved slot 0); page 1 now holds the overflow.
        for h in handles.drain(8..) {
            slab.free(h);
        }
        assert!(slab.pages[1].is_none());
    }
}
