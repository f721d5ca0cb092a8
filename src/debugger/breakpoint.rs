use crate::MEMORY_SIZE;

/// One flag per memory address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Breakpoints(Box<[bool; MEMORY_SIZE]>);

impl Default for Breakpoints {
    fn default() -> Self {
        Self(Box::new([false; MEMORY_SIZE]))
    }
}

impl Breakpoints {
    pub fn contains(&self, address: u16) -> bool {
        self.0.get(address as usize).copied().unwrap_or(false)
    }

    /// Addresses outside memory are ignored.
    pub fn insert(&mut self, address: u16) {
        if let Some(slot) = self.0.get_mut(address as usize) {
            *slot = true;
        }
    }

    /// Returns whether a breakpoint was set at `address`.
    pub fn remove(&mut self, address: u16) -> bool {
        match self.0.get_mut(address as usize) {
            Some(slot) => std::mem::replace(slot, false),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|set| **set).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addresses with a breakpoint, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(address, _)| address as u16)
    }

    pub fn as_slice(&self) -> &[bool] {
        self.0.as_slice()
    }

    /// Returns `None` unless `flags` covers all of memory.
    pub fn from_slice(flags: &[bool]) -> Option<Self> {
        let mut breakpoints = Self::default();
        if flags.len() != MEMORY_SIZE {
            return None;
        }
        breakpoints.0.copy_from_slice(flags);
        Some(breakpoints)
    }
}

impl FromIterator<u16> for Breakpoints {
    fn from_iter<T: IntoIterator<Item = u16>>(iter: T) -> Self {
        let mut breakpoints = Self::default();
        for address in iter {
            breakpoints.insert(address);
        }
        breakpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove() {
        let mut breakpoints = Breakpoints::default();
        assert!(breakpoints.is_empty());
        breakpoints.insert(0x204);
        breakpoints.insert(0x200);
        breakpoints.insert(0x200);
        breakpoints.insert(0x1000);
        assert_eq!(breakpoints.iter().collect::<Vec<_>>(), [0x200, 0x204]);
        assert!(breakpoints.remove(0x204));
        assert!(!breakpoints.remove(0x204));
        assert!(breakpoints.contains(0x200));
        assert!(!breakpoints.contains(0xFFFF));
        assert_eq!(breakpoints.len(), 1);
    }
}
