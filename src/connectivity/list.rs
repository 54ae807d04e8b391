//! Per-kind item storage and spatial indexing
//!
//! Each item kind gets one `ItemList`: a generational arena of connectivity
//! items plus an R-tree over their bounding boxes. Invalidation is an O(1)
//! flag set; physical removal happens in a batch compaction pass that frees
//! slots, bumps their generation tags, and rebuilds the R-tree only when
//! something was actually invalid.

use rstar::{RTree, RTreeObject, AABB};

use super::item::{ConnectivityItem, ItemHandle};
use super::types::{ItemKind, LayerSet};

/// R-tree entry: stored envelope plus the handle and layer set needed to
/// pre-filter candidates before the exact touch test
#[derive(Clone, Debug)]
pub struct IndexedItem {
    pub handle: ItemHandle,
    pub layers: LayerSet,
    envelope: AABB<[i32; 2]>,
}

impl IndexedItem {
    fn new(handle: ItemHandle, item: &ConnectivityItem) -> Self {
        let (min, max) = item.bounds();
        Self { handle, layers: item.layers(), envelope: AABB::from_corners(min, max) }
    }
}

impl RTreeObject for IndexedItem {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

struct Slot {
    gen: u32,
    item: Option<ConnectivityItem>,
}

/// Typed collection of one kind of connectivity item
pub struct ItemList {
    kind: ItemKind,
    slots: Vec<Slot>,
    free: Vec<u32>,
    has_invalid: bool,
    index_stale: bool,
    index: RTree<IndexedItem>,
}

impl ItemList {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            free: Vec::new(),
            has_invalid: false,
            index_stale: false,
            index: RTree::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Insert an item and return its stable handle. Items that arrived
    /// malformed (already invalid) keep a slot but are never indexed.
    pub fn add(&mut self, item: ConnectivityItem) -> ItemHandle {
        debug_assert_eq!(item.kind(), self.kind);
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot { gen: 0, item: None });
                (self.slots.len() - 1) as u32
            }
        };
        let handle = ItemHandle { kind: self.kind, slot, gen: self.slots[slot as usize].gen };
        if item.is_valid() {
            self.index.insert(IndexedItem::new(handle, &item));
        } else {
            self.has_invalid = true;
        }
        self.slots[slot as usize].item = Some(item);
        handle
    }

    fn slot(&self, handle: ItemHandle) -> Option<&Slot> {
        let slot = self.slots.get(handle.slot as usize)?;
        (slot.gen == handle.gen).then_some(slot)
    }

    /// Resolve a handle, rejecting stale generations
    pub fn get(&self, handle: ItemHandle) -> Option<&ConnectivityItem> {
        self.slot(handle)?.item.as_ref()
    }

    pub fn get_mut(&mut self, handle: ItemHandle) -> Option<&mut ConnectivityItem> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.gen != handle.gen {
            return None;
        }
        slot.item.as_mut()
    }

    /// O(1) invalidation; the slot and index entry linger until `compact`
    pub fn invalidate(&mut self, handle: ItemHandle) -> bool {
        match self.get_mut(handle) {
            Some(item) => {
                item.invalidate();
                self.has_invalid = true;
                true
            }
            None => false,
        }
    }

    /// Replace an item's payload in place, keeping the handle valid. The
    /// index is rebuilt lazily at the next compaction.
    pub fn replace(&mut self, handle: ItemHandle, item: ConnectivityItem) -> bool {
        debug_assert_eq!(item.kind(), self.kind);
        let invalid = !item.is_valid();
        let replaced = match self.get_mut(handle) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        };
        if replaced {
            self.has_invalid |= invalid;
            self.index_stale = true;
        }
        replaced
    }

    /// Physically remove every invalidated item in one pass, appending the
    /// purged handles to `garbage` so callers can drop external references.
    /// Rebuilds the R-tree only if anything was invalid or replaced.
    pub fn compact(&mut self, garbage: &mut Vec<ItemHandle>) {
        if !self.has_invalid && !self.index_stale {
            return;
        }
        for (slot_idx, slot) in self.slots.iter_mut().enumerate() {
            let purge = slot.item.as_ref().is_some_and(|item| !item.is_valid());
            if purge {
                slot.item = None;
                garbage.push(ItemHandle { kind: self.kind, slot: slot_idx as u32, gen: slot.gen });
                // Stale handles to this slot die here
                slot.gen = slot.gen.wrapping_add(1);
                self.free.push(slot_idx as u32);
            }
        }
        let entries: Vec<IndexedItem> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot_idx, slot)| {
                let item = slot.item.as_ref()?;
                let handle =
                    ItemHandle { kind: self.kind, slot: slot_idx as u32, gen: slot.gen };
                Some(IndexedItem::new(handle, item))
            })
            .collect();
        self.index = RTree::bulk_load(entries);
        self.has_invalid = false;
        self.index_stale = false;
    }

    /// All valid items in ascending slot order
    pub fn iter_valid(&self) -> impl Iterator<Item = (ItemHandle, &ConnectivityItem)> {
        self.slots.iter().enumerate().filter_map(|(slot_idx, slot)| {
            let item = slot.item.as_ref()?;
            if !item.is_valid() {
                return None;
            }
            let handle = ItemHandle { kind: self.kind, slot: slot_idx as u32, gen: slot.gen };
            Some((handle, item))
        })
    }

    /// Envelope query over the index, filtered down to currently-valid items
    pub fn query<'a>(
        &'a self,
        envelope: &AABB<[i32; 2]>,
    ) -> impl Iterator<Item = &'a IndexedItem> + 'a {
        self.index
            .locate_in_envelope_intersecting(envelope)
            .filter(|entry| self.get(entry.handle).is_some_and(|item| item.is_valid()))
    }

    pub fn len_valid(&self) -> usize {
        self.iter_valid().count()
    }
}

/// The four per-kind lists, owned together so cross-kind queries and
/// compaction run as one unit
pub struct ItemStore {
    pads: ItemList,
    tracks: ItemList,
    vias: ItemList,
    zones: ItemList,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            pads: ItemList::new(ItemKind::Pad),
            tracks: ItemList::new(ItemKind::Track),
            vias: ItemList::new(ItemKind::Via),
            zones: ItemList::new(ItemKind::ZoneIsland),
        }
    }

    pub fn list(&self, kind: ItemKind) -> &ItemList {
        match kind {
            ItemKind::Pad => &self.pads,
            ItemKind::Track => &self.tracks,
            ItemKind::Via => &self.vias,
            ItemKind::ZoneIsland => &self.zones,
        }
    }

    fn list_mut(&mut self, kind: ItemKind) -> &mut ItemList {
        match kind {
            ItemKind::Pad => &mut self.pads,
            ItemKind::Track => &mut self.tracks,
            ItemKind::Via => &mut self.vias,
            ItemKind::ZoneIsland => &mut self.zones,
        }
    }

    pub fn add(&mut self, item: ConnectivityItem) -> ItemHandle {
        let kind = item.kind();
        self.list_mut(kind).add(item)
    }

    pub fn get(&self, handle: ItemHandle) -> Option<&ConnectivityItem> {
        self.list(handle.kind).get(handle)
    }

    pub fn get_mut(&mut self, handle: ItemHandle) -> Option<&mut ConnectivityItem> {
        self.list_mut(handle.kind).get_mut(handle)
    }

    pub fn invalidate(&mut self, handle: ItemHandle) -> bool {
        self.list_mut(handle.kind).invalidate(handle)
    }

    pub fn replace(&mut self, handle: ItemHandle, item: ConnectivityItem) -> bool {
        self.list_mut(handle.kind).replace(handle, item)
    }

    /// Compact all lists, then scrub purged handles out of the survivors'
    /// connected lists. Returns the purged handles.
    pub fn compact(&mut self) -> Vec<ItemHandle> {
        let mut garbage = Vec::new();
        for kind in ItemKind::ALL {
            self.list_mut(kind).compact(&mut garbage);
        }
        if !garbage.is_empty() {
            let purged: std::collections::HashSet<ItemHandle> = garbage.iter().copied().collect();
            let live: Vec<ItemHandle> = self.valid_handles();
            for handle in live {
                if let Some(item) = self.get_mut(handle) {
                    item.remove_invalid_refs(|h| !purged.contains(&h));
                }
            }
        }
        garbage
    }

    /// All valid handles in kind-major, slot-minor order, the
    /// deterministic walk order used throughout clustering
    pub fn valid_handles(&self) -> Vec<ItemHandle> {
        let mut handles = Vec::new();
        for kind in ItemKind::ALL {
            handles.extend(self.list(kind).iter_valid().map(|(h, _)| h));
        }
        handles
    }

    /// Candidate handles whose envelope intersects `envelope` and whose
    /// layer set overlaps `layers`, across all kinds
    pub fn candidates(&self, envelope: &AABB<[i32; 2]>, layers: LayerSet) -> Vec<ItemHandle> {
        let mut out = Vec::new();
        for kind in ItemKind::ALL {
            out.extend(
                self.list(kind)
                    .query(envelope)
                    .filter(|entry| entry.layers.intersects(layers))
                    .map(|entry| entry.handle),
            );
        }
        out
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
