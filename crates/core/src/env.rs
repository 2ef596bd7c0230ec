//! Environments: symbol-to-value scopes with parent linkage
//!
//! Scopes live in a slab owned by the heap so that releasing a lambda can
//! delete its captured scope in the same pass. Lookup walks the parent
//! chain; `def` always targets the outermost scope, `put` the current one.

use tracing::trace;

use crate::heap::{Heap, HeapResult, ValRef};
use crate::hmap::HMap;

/// Handle to a scope. Stable until the scope is deleted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EnvRef(u32);

impl EnvRef {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

pub(crate) struct EnvData {
    parent: Option<EnvRef>,
    map: HMap,
}

/// Slab of scopes with index reuse.
pub(crate) struct EnvArena {
    slots: Vec<Option<EnvData>>,
    free: Vec<u32>,
}

impl EnvArena {
    pub fn new() -> EnvArena {
        EnvArena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn get(&self, e: EnvRef) -> &EnvData {
        self.slots[e.idx()].as_ref().expect("use of deleted scope")
    }

    fn get_mut(&mut self, e: EnvRef) -> &mut EnvData {
        self.slots[e.idx()].as_mut().expect("use of deleted scope")
    }
}

impl Heap {
    /// Creates an empty scope with the given parent.
    pub fn env_new(&mut self, parent: Option<EnvRef>) -> EnvRef {
        let data = EnvData {
            parent,
            map: HMap::new(),
        };
        let e = match self.envs.free.pop() {
            Some(i) => {
                self.envs.slots[i as usize] = Some(data);
                EnvRef(i)
            }
            None => {
                self.envs.slots.push(Some(data));
                EnvRef((self.envs.slots.len() - 1) as u32)
            }
        };
        trace!(env = e.0, "scope created");
        e
    }

    /// Deletes a scope, releasing every bound value. Parents are not
    /// affected.
    pub fn env_del(&mut self, e: EnvRef) {
        let data = self.envs.slots[e.idx()].take().expect("double scope delete");
        self.envs.free.push(e.0);
        for slot in data.map.into_entries() {
            self.release(slot.val);
        }
    }

    pub fn env_parent(&self, e: EnvRef) -> Option<EnvRef> {
        self.envs.get(e).parent
    }

    pub fn env_set_parent(&mut self, e: EnvRef, parent: Option<EnvRef>) {
        self.envs.get_mut(e).parent = parent;
    }

    /// Number of bindings in this scope alone.
    pub fn env_len(&self, e: EnvRef) -> usize {
        self.envs.get(e).map.len()
    }

    /// Looks `key` (a symbol) up in this scope, then the parent chain.
    /// A hit is shared; a global miss produces an unbound-symbol error
    /// value.
    pub fn env_get(&mut self, e: EnvRef, key: ValRef) -> HeapResult<ValRef> {
        let hash = self.hash(key);
        let found = {
            let name = self.sym_name(key);
            let mut cur = Some(e);
            let mut hit = None;
            while let Some(env) = cur {
                let data = self.envs.get(env);
                if let Some(v) = data.map.get(hash, name) {
                    hit = Some(v);
                    break;
                }
                cur = data.parent;
            }
            hit
        };
        match found {
            Some(v) => Ok(self.share(v)),
            None => {
                let msg = format!("Unbound symbol '{}'!", self.sym_name(key));
                self.err(msg)
            }
        }
    }

    /// Binds `key` to a share of `val` in this scope, releasing any
    /// displaced binding.
    pub fn env_put(&mut self, e: EnvRef, key: ValRef, val: ValRef) {
        let hash = self.hash(key);
        let name = self.sym_name(key).to_string();
        let shared = self.share(val);
        let old = self.envs.get_mut(e).map.put(hash, name, shared);
        if let Some(old) = old {
            self.release(old);
        }
    }

    /// Binds in the outermost scope reachable from `e`.
    pub fn env_def(&mut self, e: EnvRef, key: ValRef, val: ValRef) {
        let mut root = e;
        while let Some(parent) = self.envs.get(root).parent {
            root = parent;
        }
        self.env_put(root, key, val);
    }

    /// Sibling scope: same parent, fresh map, every binding shared.
    pub fn env_copy(&mut self, e: EnvRef) -> EnvRef {
        let src = self.envs.get(e);
        let parent = src.parent;
        let entries: Vec<(u32, String, ValRef)> = src
            .map
            .iter()
            .map(|s| (s.hash, s.name.clone(), s.val))
            .collect();
        let copy = self.env_new(parent);
        for (hash, name, val) in entries {
            let shared = self.share(val);
            let old = self.envs.get_mut(copy).map.put(hash, name, shared);
            debug_assert!(old.is_none());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_shares_the_binding() {
        let mut heap = Heap::new();
        let e = heap.env_new(None);
        let k = heap.sym("x").unwrap();
        let v = heap.num(10).unwrap();
        heap.env_put(e, k, v);
        assert_eq!(heap.refs(v), 2);

        let got = heap.env_get(e, k).unwrap();
        assert_eq!(got, v);
        assert_eq!(heap.refs(v), 3);

        heap.release(got);
        heap.release(v);
        heap.release(k);
        heap.env_del(e);
        assert_eq!(heap.free_count(), heap.cell_count());
    }

    #[test]
    fn get_walks_the_parent_chain() {
        let mut heap = Heap::new();
        let outer = heap.env_new(None);
        let inner = heap.env_new(Some(outer));
        assert_eq!(heap.env_parent(inner), Some(outer));
        assert_eq!(heap.env_parent(outer), None);
        let k = heap.sym("x").unwrap();
        let v = heap.num(1).unwrap();
        heap.env_put(outer, k, v);

        let got = heap.env_get(inner, k).unwrap();
        assert_eq!(got, v);
        heap.release(got);
        heap.release(v);
        heap.release(k);
        heap.env_del(inner);
        heap.env_del(outer);
    }

    #[test]
    fn missing_symbol_is_an_error_value() {
        let mut heap = Heap::new();
        let e = heap.env_new(None);
        let k = heap.sym("ghost").unwrap();
        let got = heap.env_get(e, k).unwrap();
        assert_eq!(heap.kind(got), crate::value::Kind::Err);
        assert_eq!(heap.err_msg(got), "Unbound symbol 'ghost'!");
        heap.release(got);
        heap.release(k);
        heap.env_del(e);
    }

    #[test]
    fn def_targets_the_outermost_scope() {
        let mut heap = Heap::new();
        let root = heap.env_new(None);
        let mid = heap.env_new(Some(root));
        let leaf = heap.env_new(Some(mid));
        let k = heap.sym("x").unwrap();
        let v = heap.num(5).unwrap();
        heap.env_def(leaf, k, v);

        assert_eq!(heap.env_len(root), 1);
        assert_eq!(heap.env_len(mid), 0);
        assert_eq!(heap.env_len(leaf), 0);
        heap.release(v);
        heap.release(k);
        heap.env_del(leaf);
        heap.env_del(mid);
        heap.env_del(root);
    }

    #[test]
    fn put_shadows_only_the_current_scope() {
        let mut heap = Heap::new();
        let outer = heap.env_new(None);
        let inner = heap.env_new(Some(outer));
        let k = heap.sym("x").unwrap();
        let one = heap.num(1).unwrap();
        let two = heap.num(2).unwrap();
        heap.env_put(outer, k, one);
        heap.env_put(inner, k, two);

        let via_inner = heap.env_get(inner, k).unwrap();
        let via_outer = heap.env_get(outer, k).unwrap();
        assert_eq!(via_inner, two);
        assert_eq!(via_outer, one);
        for v in [via_inner, via_outer, one, two, k] {
            heap.release(v);
        }
        heap.env_del(inner);
        heap.env_del(outer);
    }

    #[test]
    fn rebinding_releases_the_old_value() {
        let mut heap = Heap::new();
        let e = heap.env_new(None);
        let k = heap.sym("x").unwrap();
        let one = heap.num(1).unwrap();
        heap.env_put(e, k, one);
        heap.release(one);

        let two = heap.num(2).unwrap();
        heap.env_put(e, k, two);
        heap.release(two);
        heap.release(k);
        heap.env_del(e);
        assert_eq!(heap.free_count(), heap.cell_count());
    }

    #[test]
    fn copy_is_independent_but_shares_values() {
        let mut heap = Heap::new();
        let e = heap.env_new(None);
        let k = heap.sym("x").unwrap();
        let v = heap.num(1).unwrap();
        heap.env_put(e, k, v);

        let c = heap.env_copy(e);
        assert_eq!(heap.refs(v), 3);

        // New binding in the copy is invisible to the original.
        let k2 = heap.sym("y").unwrap();
        let v2 = heap.num(2).unwrap();
        heap.env_put(c, k2, v2);
        let miss = heap.env_get(e, k2).unwrap();
        assert_eq!(heap.kind(miss), crate::value::Kind::Err);

        for val in [miss, v2, k2, v, k] {
            heap.release(val);
        }
        heap.env_del(c);
        heap.env_del(e);
        assert_eq!(heap.free_count(), heap.cell_count());
    }

    #[test]
    fn colliding_names_do_not_shadow() {
        let mut heap = Heap::new();
        let e = heap.env_new(None);
        // "Aa" and "BB" share a hash under the 31-polynomial.
        let ka = heap.sym("Aa").unwrap();
        let kb = heap.sym("BB").unwrap();
        assert_eq!(heap.hash(ka), heap.hash(kb));
        let one = heap.num(1).unwrap();
        let two = heap.num(2).unwrap();
        heap.env_put(e, ka, one);
        heap.env_put(e, kb, two);

        let got_a = heap.env_get(e, ka).unwrap();
        let got_b = heap.env_get(e, kb).unwrap();
        assert_eq!(heap.num_val(got_a), 1);
        assert_eq!(heap.num_val(got_b), 2);
        for v in [got_a, got_b, one, two, ka, kb] {
            heap.release(v);
        }
        heap.env_del(e);
    }
}
