//! Inline caching of resolved strategies
//!
//! Property and method references remember which accessor or executor
//! handled each receiver type. The cache moves through mono-, poly- and
//! megamorphic states as more receiver types are seen.

use arrayvec::ArrayVec;
use core_types::TypeDescriptor;

/// Receiver type key; `None` is the null receiver
pub type ReceiverKey = Option<TypeDescriptor>;

/// Inline cache mapping receiver types to resolved entries
#[derive(Debug, Clone)]
pub enum InlineCache<T: Clone> {
    /// Nothing cached yet
    Uninitialized,
    /// Single receiver type cached (most common case)
    Monomorphic {
        /// Cached receiver type
        key: ReceiverKey,
        /// Entry resolved for it
        entry: T,
    },
    /// Multiple receiver types cached (up to 4)
    Polymorphic {
        /// (receiver type, entry) pairs
        entries: ArrayVec<(ReceiverKey, T), 4>,
    },
    /// Too many receiver types; always resolve
    Megamorphic,
}

impl<T: Clone> InlineCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        InlineCache::Uninitialized
    }

    /// Entry cached for this receiver type
    pub fn lookup(&self, key: &ReceiverKey) -> Option<T> {
        match self {
            InlineCache::Uninitialized | InlineCache::Megamorphic => None,
            InlineCache::Monomorphic { key: cached, entry } => {
                (cached == key).then(|| entry.clone())
            }
            InlineCache::Polymorphic { entries } => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, entry)| entry.clone()),
        }
    }

    /// Record the entry resolved for a receiver type
    ///
    /// - Uninitialized → Monomorphic
    /// - Monomorphic → Polymorphic (different receiver type)
    /// - Polymorphic → Megamorphic (more than 4 receiver types)
    pub fn update(&mut self, key: ReceiverKey, entry: T) {
        match self {
            InlineCache::Uninitialized => {
                *self = InlineCache::Monomorphic { key, entry };
            }
            InlineCache::Monomorphic {
                key: cached,
                entry: cached_entry,
            } => {
                if *cached == key {
                    *cached_entry = entry;
                } else {
                    let mut entries = ArrayVec::new();
                    entries.push((cached.clone(), cached_entry.clone()));
                    entries.push((key, entry));
                    *self = InlineCache::Polymorphic { entries };
                }
            }
            InlineCache::Polymorphic { entries } => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                    slot.1 = entry;
                } else if entries.len() < 4 {
                    entries.push((key, entry));
                } else {
                    tracing::trace!("inline cache went megamorphic");
                    *self = InlineCache::Megamorphic;
                }
            }
            InlineCache::Megamorphic => {}
        }
    }

    /// Number of receiver types seen, `None` once megamorphic
    pub fn degree(&self) -> Option<usize> {
        match self {
            InlineCache::Uninitialized => Some(0),
            InlineCache::Monomorphic { .. } => Some(1),
            InlineCache::Polymorphic { entries } => Some(entries.len()),
            InlineCache::Megamorphic => None,
        }
    }

    /// The single cached entry while monomorphic
    pub fn monomorphic_entry(&self) -> Option<(&ReceiverKey, &T)> {
        match self {
            InlineCache::Monomorphic { key, entry } => Some((key, entry)),
            _ => None,
        }
    }
}

impl<T: Clone> Default for InlineCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(n: usize) -> ReceiverKey {
        Some(TypeDescriptor::Named(format!("T{}", n)))
    }

    #[test]
    fn test_monomorphic_hit_and_miss() {
        let mut cache = InlineCache::new();
        cache.update(Some(TypeDescriptor::String), 1);
        assert_eq!(cache.lookup(&Some(TypeDescriptor::String)), Some(1));
        assert_eq!(cache.lookup(&None), None);
        assert_eq!(cache.degree(), Some(1));
    }

    #[test]
    fn test_transitions_to_megamorphic() {
        let mut cache = InlineCache::new();
        for n in 0..4 {
            cache.update(named(n), n);
        }
        assert_eq!(cache.degree(), Some(4));
        assert_eq!(cache.lookup(&named(2)), Some(2));
        cache.update(named(9), 9);
        assert_eq!(cache.degree(), None);
        assert_eq!(cache.lookup(&named(2)), None);
    }
}
