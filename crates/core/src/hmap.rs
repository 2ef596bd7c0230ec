//! Open-addressed hash map used by environments
//!
//! Linear probing from `hash % cap`, initial capacity 4, doubling rehash
//! when the table fills. Slots carry the symbol name next to its 32-bit
//! hash so that two distinct names with colliding hashes resolve to their
//! own bindings instead of shadowing each other.

use crate::heap::ValRef;

const HMAP_INIT_CAP: usize = 4;
const HMAP_GROWTH_RATE: usize = 2;

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub hash: u32,
    pub name: String,
    pub val: ValRef,
}

#[derive(Clone, Debug)]
pub(crate) struct HMap {
    slots: Vec<Option<Slot>>,
    len: usize,
}

impl HMap {
    pub fn new() -> HMap {
        HMap {
            slots: vec![None; HMAP_INIT_CAP],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, hash: u32, name: &str) -> Option<ValRef> {
        let cap = self.slots.len();
        let mut c = (hash as usize) % cap;
        for _ in 0..cap {
            match &self.slots[c] {
                Some(s) if s.hash == hash && s.name == name => return Some(s.val),
                Some(_) => c = (c + 1) % cap,
                None => return None,
            }
        }
        None
    }

    /// Inserts or overwrites the binding for `(hash, name)`. Returns the
    /// displaced value on overwrite so the caller can release it.
    pub fn put(&mut self, hash: u32, name: String, val: ValRef) -> Option<ValRef> {
        if self.len == self.slots.len() {
            self.rehash();
        }
        self.insert(Slot { hash, name, val })
    }

    /// Probe-insert; the table must not be full.
    fn insert(&mut self, slot: Slot) -> Option<ValRef> {
        let cap = self.slots.len();
        let mut c = (slot.hash as usize) % cap;
        loop {
            match &mut self.slots[c] {
                Some(s) if s.hash == slot.hash && s.name == slot.name => {
                    return Some(std::mem::replace(&mut s.val, slot.val));
                }
                Some(_) => c = (c + 1) % cap,
                empty @ None => {
                    *empty = Some(slot);
                    self.len += 1;
                    return None;
                }
            }
        }
    }

    fn rehash(&mut self) {
        let new_cap = self.slots.len() * HMAP_GROWTH_RATE;
        let old = std::mem::replace(&mut self.slots, vec![None; new_cap]);
        self.len = 0;
        for slot in old.into_iter().flatten() {
            self.insert(slot);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().flatten()
    }

    pub fn into_entries(self) -> impl Iterator<Item = Slot> {
        self.slots.into_iter().flatten()
    }
}

/// Bit-mix then Knuth multiplicative hash, truncating to the low 32 bits.
pub(crate) fn int_hash(key: i64) -> u32 {
    let mut k = key as i32;
    k = k.wrapping_add(k.wrapping_shl(12));
    k ^= k.wrapping_shr(22);
    k = k.wrapping_add(k.wrapping_shl(4));
    k ^= k.wrapping_shr(9);
    k = k.wrapping_add(k.wrapping_shl(10));
    k ^= k.wrapping_shr(2);
    k = k.wrapping_add(k.wrapping_shl(7));
    k ^= k.wrapping_shr(12);
    (k.wrapping_shr(3) as u32).wrapping_mul(2_654_435_761)
}

/// Polynomial rolling hash over the bytes of `s`.
pub(crate) fn str_hash(s: &str) -> u32 {
    s.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
}

/// Polynomial rolling hash over child hashes, seeded at 31.
pub(crate) fn list_hash<I>(children: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    children
        .into_iter()
        .fold(31u32, |h, c| h.wrapping_mul(31).wrapping_add(c))
}
