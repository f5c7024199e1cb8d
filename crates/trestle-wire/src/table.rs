//! Caller-owned string interning table.

/// Borrowed view of a string table supplied by the caller of an invocation.
///
/// When a call carries [`WireStr::Interned`] values, every index resolves
/// against one table that stays owned by the caller for the duration of the
/// call; the bridge never retains it.
///
/// [`WireStr::Interned`]: crate::value::WireStr
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    entries: &'a [&'a str],
}

impl<'a> StringTable<'a> {
    pub fn new(entries: &'a [&'a str]) -> Self {
        Self { entries }
    }

    /// Bounds-checked lookup.
    pub fn get(&self, index: u32) -> Option<&'a str> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_in_bounds() {
        let table = StringTable::new(&["zero", "one"]);
        assert_eq!(table.get(0), Some("zero"));
        assert_eq!(table.get(1), Some("one"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookup_out_of_bounds() {
        let table = StringTable::new(&["only"]);
        assert_eq!(table.get(1), None);
        assert_eq!(table.get(u32::MAX), None);
    }

    #[test]
    fn empty_table() {
        let table = StringTable::new(&[]);
        assert!(table.is_empty());
        assert_eq!(table.get(0), None);
    }
}
