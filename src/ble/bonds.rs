//! Bounded in-RAM bond store.
//!
//! Keeps the keys of up to `N` centrals. When full, the oldest bond is
//! evicted to make room (round-robin). Lost on reset.

use super::PeerAddress;

pub struct BondTable<T, const N: usize> {
    entries: heapless::Vec<(PeerAddress, T), N>,
}

impl<T, const N: usize> BondTable<T, N> {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Store `value` for `peer`. An existing bond is updated in place.
    /// Returns the peer evicted to make room, if any.
    pub fn insert(&mut self, peer: PeerAddress, value: T) -> Option<PeerAddress> {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(p, _)| *p == peer) {
            *existing = value;
            return None;
        }

        let evicted = if self.entries.is_full() {
            Some(self.entries.remove(0).0)
        } else {
            None
        };
        // Room was made above.
        let _ = self.entries.push((peer, value));
        evicted
    }

    pub fn remove(&mut self, peer: &PeerAddress) -> Option<T> {
        let idx = self.entries.iter().position(|(p, _)| p == peer)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, peer: &PeerAddress) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|(p, v)| (p == peer).then_some(v))
    }

    pub fn contains(&self, peer: &PeerAddress) -> bool {
        self.get(peer).is_some()
    }

    /// First bond matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&PeerAddress, &T) -> bool) -> Option<(&PeerAddress, &T)> {
        self.entries
            .iter()
            .find(|(p, v)| pred(p, v))
            .map(|(p, v)| (p, v))
    }

    /// Mutable access to the first bond matching `pred`.
    pub fn find_mut(&mut self, mut pred: impl FnMut(&PeerAddress, &T) -> bool) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(p, v)| pred(p, v))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, const N: usize> Default for BondTable<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u8) -> PeerAddress {
        PeerAddress::new(1, [n, 0, 0, 0, 0, 0xC0])
    }

    #[test]
    fn insert_and_lookup() {
        let mut table: BondTable<u32, 2> = BondTable::new();
        assert!(table.is_empty());
        assert_eq!(table.insert(peer(1), 10), None);
        assert_eq!(table.get(&peer(1)), Some(&10));
        assert!(!table.contains(&peer(2)));
    }

    #[test]
    fn rebond_updates_in_place() {
        let mut table: BondTable<u32, 2> = BondTable::new();
        table.insert(peer(1), 10);
        table.insert(peer(1), 11);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&peer(1)), Some(&11));
    }

    #[test]
    fn full_table_evicts_oldest() {
        let mut table: BondTable<u32, 2> = BondTable::new();
        table.insert(peer(1), 1);
        table.insert(peer(2), 2);
        assert_eq!(table.insert(peer(3), 3), Some(peer(1)));
        assert!(!table.contains(&peer(1)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_and_find() {
        let mut table: BondTable<u32, 4> = BondTable::new();
        table.insert(peer(1), 7);
        table.insert(peer(2), 8);
        assert_eq!(table.find(|_, v| *v == 8).map(|(p, _)| *p), Some(peer(2)));
        assert_eq!(table.remove(&peer(2)), Some(8));
        assert_eq!(table.remove(&peer(2)), None);
        assert!(table.find(|_, v| *v == 8).is_none());
    }

    #[test]
    fn find_mut_updates_matching_bond() {
        let mut table: BondTable<u32, 4> = BondTable::new();
        table.insert(peer(1), 7);
        table.insert(peer(2), 8);
        if let Some(v) = table.find_mut(|p, _| *p == peer(2)) {
            *v = 80;
        }
        assert_eq!(table.get(&peer(2)), Some(&80));
        assert_eq!(table.get(&peer(1)), Some(&7));
        assert!(table.find_mut(|p, _| *p == peer(3)).is_none());
    }
}
