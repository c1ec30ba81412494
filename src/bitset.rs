/// Bitset capable of storing interface numbers 0x00..=0xff
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceSet([u64; 4]);

impl InterfaceSet {
    fn mask(intf: u8) -> (usize, u64) {
        ((intf >> 6) as usize, 1u64 << (intf & 0x3f))
    }

    pub fn contains(&self, intf: u8) -> bool {
        let (word, bit) = Self::mask(intf);
        self.0[word] & bit != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn insert(&mut self, intf: u8) {
        let (word, bit) = Self::mask(intf);
        self.0[word] |= bit
    }

    pub fn remove(&mut self, intf: u8) {
        let (word, bit) = Self::mask(intf);
        self.0[word] &= !bit
    }

    /// Interface numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&i| self.contains(i))
    }

    pub fn first(&self) -> Option<u8> {
        self.iter().next()
    }
}

impl FromIterator<u8> for InterfaceSet {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut set = InterfaceSet::default();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl std::fmt::Debug for InterfaceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[test]
fn test_interface_set() {
    let mut s: InterfaceSet = [3, 1, 200].into_iter().collect();
    assert_eq!(s.len(), 3);
    assert!(s.contains(200));
    assert!(!s.contains(2));
    assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 3, 200]);
    s.remove(1);
    assert_eq!(s.first(), Some(3));
    s.remove(3);
    s.remove(200);
    assert!(s.is_empty());
    s.insert(255);
    assert_eq!(s.first(), Some(255));
}
