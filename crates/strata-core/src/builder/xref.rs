use std::hash::Hash;

use indexmap::IndexMap;

/// Bidirectional map between a declaration id and the IR node built for it.
///
/// Each declaration is built exactly once; a second insert for the same
/// declaration is refused.
#[derive(Debug, Clone)]
pub struct XrefTable<D, I> {
    forward: IndexMap<D, I>,
    backward: IndexMap<I, D>,
}

impl<D, I> Default for XrefTable<D, I> {
    fn default() -> Self {
        Self {
            forward: IndexMap::new(),
            backward: IndexMap::new(),
        }
    }
}

impl<D, I> XrefTable<D, I>
where
    D: Copy + Eq + Hash,
    I: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns `false` if either side is already mapped.
    pub fn insert(&mut self, declaration: D, ir: I) -> bool {
        if self.forward.contains_key(&declaration) || self.backward.contains_key(&ir) {
            return false;
        }
        self.forward.insert(declaration, ir);
        self.backward.insert(ir, declaration);
        true
    }

    pub fn ir(&self, declaration: D) -> Option<I> {
        self.forward.get(&declaration).copied()
    }

    pub fn declaration(&self, ir: I) -> Option<D> {
        self.backward.get(&ir).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (D, I)> + '_ {
        self.forward.iter().map(|(d, i)| (*d, *i))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_work_both_ways() {
        let mut table = XrefTable::new();
        assert!(table.insert(1u32, 10u32));
        assert_eq!(table.ir(1), Some(10));
        assert_eq!(table.declaration(10), Some(1));
        assert_eq!(table.ir(2), None);
    }

    #[test]
    fn a_declaration_is_built_once() {
        let mut table = XrefTable::new();
        assert!(table.insert(1u32, 10u32));
        assert!(!table.insert(1, 11));
        assert!(!table.insert(2, 10));
        assert_eq!(table.len(), 1);
    }
}
