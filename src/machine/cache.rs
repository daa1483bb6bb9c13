//! Per-state memoization of machine queries.
//!
//! `TtlCache` keeps entries alive for a fixed number of `prune` calls
//! since last access; a caller prunes once per search iteration and the
//! cache forgets states the search stopped visiting. `CachedMachine`
//! wraps any backend with one such cache per query kind. Errors are never
//! cached, so a transient fault does not poison later queries.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::error::EngineError;
use crate::gdl::{Role, SymbolTable};
use crate::machine::state::{MachineState, Move};
use crate::machine::StateMachine;

struct Entry<V> {
    value: V,
    ttl: u32,
}

/// A map whose entries expire after `ttl` prunes without access.
pub struct TtlCache<K, V> {
    entries: FxHashMap<K, Entry<V>>,
    ttl: u32,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    #[must_use]
    pub fn new(ttl: u32) -> Self {
        Self { entries: FxHashMap::default(), ttl }
    }

    /// Look up a key, refreshing its lifetime on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let ttl = self.ttl;
        self.entries.get_mut(key).map(|entry| {
            entry.ttl = ttl;
            &entry.value
        })
    }

    pub fn insert(&mut self, key: K, value: V) {
        let ttl = self.ttl;
        self.entries.insert(key, Entry { value, ttl });
    }

    /// Age every entry, evicting those that ran out of lifetime.
    pub fn prune(&mut self) {
        self.entries.retain(|_, entry| {
            if entry.ttl == 0 {
                false
            } else {
                entry.ttl -= 1;
                true
            }
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decorator that memoizes queries per state.
pub struct CachedMachine<M> {
    inner: M,
    moves: TtlCache<(MachineState, Role), Vec<Move>>,
    nexts: TtlCache<(MachineState, Vec<Move>), MachineState>,
    goal_values: TtlCache<(MachineState, Role), u8>,
    terminals: TtlCache<MachineState, bool>,
}

impl<M: StateMachine> CachedMachine<M> {
    /// Entries survive one prune without access.
    const TTL: u32 = 1;

    #[must_use]
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            moves: TtlCache::new(Self::TTL),
            nexts: TtlCache::new(Self::TTL),
            goal_values: TtlCache::new(Self::TTL),
            terminals: TtlCache::new(Self::TTL),
        }
    }

    /// Age all four caches. Call once per search iteration.
    pub fn prune(&mut self) {
        self.moves.prune();
        self.nexts.prune();
        self.goal_values.prune();
        self.terminals.prune();
    }

    #[must_use]
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: StateMachine> StateMachine for CachedMachine<M> {
    fn symbols(&self) -> &SymbolTable {
        self.inner.symbols()
    }

    fn roles(&self) -> &[Role] {
        self.inner.roles()
    }

    fn initial_state(&mut self) -> Result<MachineState, EngineError> {
        self.inner.initial_state()
    }

    fn legal_moves(
        &mut self,
        state: &MachineState,
        role: Role,
    ) -> Result<Vec<Move>, EngineError> {
        let key = (state.clone(), role);
        if let Some(cached) = self.moves.get(&key) {
            return Ok(cached.clone());
        }
        let moves = self.inner.legal_moves(state, role)?;
        self.moves.insert(key, moves.clone());
        Ok(moves)
    }

    fn next_state(
        &mut self,
        state: &MachineState,
        moves: &[Move],
    ) -> Result<MachineState, EngineError> {
        let key = (state.clone(), moves.to_vec());
        if let Some(cached) = self.nexts.get(&key) {
            return Ok(cached.clone());
        }
        let next = self.inner.next_state(state, moves)?;
        self.nexts.insert(key, next.clone());
        Ok(next)
    }

    fn is_terminal(&mut self, state: &MachineState) -> Result<bool, EngineError> {
        if let Some(&cached) = self.terminals.get(state) {
            return Ok(cached);
        }
        let terminal = self.inner.is_terminal(state)?;
        self.terminals.insert(state.clone(), terminal);
        Ok(terminal)
    }

    fn goal(&mut self, state: &MachineState, role: Role) -> Result<u8, EngineError> {
        let key = (state.clone(), role);
        if let Some(&cached) = self.goal_values.get(&key) {
            return Ok(cached);
        }
        let value = self.inner.goal(state, role)?;
        self.goal_values.insert(key, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_cache_expires_without_access() {
        let mut cache: TtlCache<u32, u32> = TtlCache::new(1);
        cache.insert(1, 10);
        cache.prune();
        assert_eq!(cache.get(&1), Some(&10));
        cache.prune();
        cache.prune();
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_ttl_cache_access_refreshes() {
        let mut cache: TtlCache<u32, u32> = TtlCache::new(1);
        cache.insert(1, 10);
        for _ in 0..5 {
            cache.prune();
            assert_eq!(cache.get(&1), Some(&10));
        }
    }
}
