use lasso::{Spur, ThreadedRodeo};

/// Interned functor label. Cheap to copy, ordered by interning order.
pub type FuncId = Spur;

/// Interner for functor names.
///
/// Term tables are per-analysis and single-threaded, but functor names are
/// usually shared by every table of a run, so the store itself is
/// thread-safe and can sit behind an `Arc`.
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a functor name, returning the existing id if already present.
    pub fn intern(&self, name: &str) -> FuncId {
        self.rodeo.get_or_intern(name)
    }

    /// Name of a functor, or None if the id comes from another store.
    pub fn resolve(&self, id: FuncId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<FuncId> {
        self.rodeo.get(name)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}
