//! Hash-consed term DAG.
//!
//! A [`TermTable`] is an arena of term slots. Structurally equal terms are
//! interned to one [`TermId`], every slot carries a reference count, its
//! structural depth and the set of applications that use it as a child.
//! Slots vacated by [`TermTable::deref`] go on a free list and are reused.

use crate::error::TermError;
use crate::symbol::{FuncId, SymbolStore};
use crate::trace::trace;
use hashbrown::HashMap;
use rustc_hash::FxHasher;
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::hash::{BuildHasherDefault, Hash};

/// Hash map keyed with the Fx hasher, used for all intern and memo tables.
pub type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Identifier of a term inside one table.
///
/// Ids are only meaningful for the table that issued them; moving a term
/// between tables goes through an explicit renaming map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Build an id from its raw index.
    pub fn from_raw(raw: u32) -> Self {
        TermId(raw)
    }

    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Values usable as term constants.
pub trait Numeral: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display {}

impl<T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display> Numeral for T {}

/// Labels usable as application heads.
pub trait Functor: Clone + Eq + Ord + Hash + fmt::Debug {}

impl<T: Clone + Eq + Ord + Hash + fmt::Debug> Functor for T {}

/// A term node. The derived order (constants, then variables, then
/// applications by functor and child ids) is the total term order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term<N, F> {
    /// A numeric constant.
    Const(N),
    /// A variable slot.
    Var(u32),
    /// A functor applied to an ordered list of children.
    App(F, SmallVec<[TermId; 4]>),
}

impl<N: fmt::Display, F: fmt::Display> fmt::Display for Term<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Const(n) => write!(f, "c({})", n),
            Term::Var(v) => write!(f, "v({})", v),
            Term::App(func, args) => {
                write!(f, "{}", func)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Slot<N, F> {
    term: Term<N, F>,
    ref_count: u32,
    depth: u32,
    /// Applications having this term as a direct child. Unordered, no repeats.
    parents: SmallVec<[TermId; 4]>,
}

/// Canonicalizing pool of terms with manual reference counting.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - Every child of a live application is live
/// - A term is reclaimed exactly when `deref` drops its count to zero
///
/// Newly interned terms carry no external reference; their count only
/// reflects the applications built on top of them. Callers holding an id
/// across a `deref` must `add_ref` it first.
#[derive(Debug, Clone)]
pub struct TermTable<N, F> {
    slots: Vec<Option<Slot<N, F>>>,
    index: FxHashMap<Term<N, F>, TermId>,
    free: Vec<TermId>,
    /// Next slot for `fresh_var`; `None` once slot `u32::MAX` is taken.
    next_var: Option<u32>,
}

impl<N: Numeral, F: Functor> TermTable<N, F> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: FxHashMap::default(),
            free: Vec::new(),
            next_var: Some(0),
        }
    }

    fn slot(&self, id: TermId) -> Result<&Slot<N, F>, TermError> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TermError::UnknownTerm(id))
    }

    fn slot_mut(&mut self, id: TermId) -> Option<&mut Slot<N, F>> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn allocate(&mut self, term: Term<N, F>, depth: u32) -> TermId {
        let slot = Slot {
            term,
            ref_count: 0,
            depth,
            parents: SmallVec::new(),
        };
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(slot);
                id
            }
            None => {
                let id = TermId(self.slots.len() as u32);
                self.slots.push(Some(slot));
                id
            }
        }
    }

    /// Intern a term whose children are known to be live.
    fn intern(&mut self, term: Term<N, F>) -> TermId {
        if let Some(&id) = self.index.get(&term) {
            return id;
        }

        let children: SmallVec<[TermId; 4]> = match &term {
            Term::App(_, children) => children.clone(),
            Term::Const(_) | Term::Var(_) => SmallVec::new(),
        };
        let depth = match &term {
            Term::App(..) => {
                1 + children
                    .iter()
                    .filter_map(|&c| self.slot(c).ok().map(|s| s.depth))
                    .max()
                    .unwrap_or(0)
            }
            Term::Const(_) | Term::Var(_) => 0,
        };

        let id = self.allocate(term.clone(), depth);
        for &child in &children {
            if let Some(slot) = self.slot_mut(child) {
                slot.ref_count += 1;
                if !slot.parents.contains(&id) {
                    slot.parents.push(id);
                }
            }
        }
        self.index.insert(term, id);
        trace!(id = id.raw(), depth, "term_interned");
        id
    }

    /// Intern a constant.
    pub fn make_const(&mut self, value: N) -> TermId {
        self.intern(Term::Const(value))
    }

    /// Intern the variable at `slot`, reserving it against `fresh_var`.
    ///
    /// Taking slot `u32::MAX` exhausts the fresh slots of this table.
    pub fn make_var(&mut self, slot: u32) -> TermId {
        if let Some(next) = self.next_var {
            if slot >= next {
                self.next_var = slot.checked_add(1);
            }
        }
        self.intern(Term::Var(slot))
    }

    /// Intern a variable at a slot never issued by this table before.
    pub fn fresh_var(&mut self) -> Result<TermId, TermError> {
        let slot = self.next_var.ok_or(TermError::VarSlotsExhausted)?;
        Ok(self.make_var(slot))
    }

    /// Intern `func(children...)`. Every child must be live in this table.
    pub fn apply_functor(&mut self, func: F, children: &[TermId]) -> Result<TermId, TermError> {
        for &child in children {
            self.slot(child)?;
        }
        Ok(self.intern(Term::App(func, SmallVec::from_slice(children))))
    }

    /// Create a nullary (0-arity) application.
    pub fn app0(&mut self, func: F) -> TermId {
        self.intern(Term::App(func, SmallVec::new()))
    }

    /// Create a unary (1-arity) application.
    pub fn app1(&mut self, func: F, child: TermId) -> Result<TermId, TermError> {
        self.apply_functor(func, &[child])
    }

    /// Create a binary (2-arity) application.
    pub fn app2(&mut self, func: F, left: TermId, right: TermId) -> Result<TermId, TermError> {
        self.apply_functor(func, &[left, right])
    }

    /// Structural lookup without interning.
    pub fn find_term(&self, term: &Term<N, F>) -> Option<TermId> {
        self.index.get(term).copied()
    }

    pub fn find_const(&self, value: &N) -> Option<TermId> {
        self.find_term(&Term::Const(value.clone()))
    }

    pub fn find_var(&self, slot: u32) -> Option<TermId> {
        self.find_term(&Term::Var(slot))
    }

    pub fn find_app(&self, func: &F, children: &[TermId]) -> Option<TermId> {
        self.find_term(&Term::App(func.clone(), SmallVec::from_slice(children)))
    }

    /// Record one more external reference to `id`.
    pub fn add_ref(&mut self, id: TermId) -> Result<(), TermError> {
        self.slot(id)?;
        if let Some(slot) = self.slot_mut(id) {
            slot.ref_count += 1;
        }
        Ok(())
    }

    /// Drop one reference to `id`, reclaiming every term whose count
    /// reaches zero as a result. Returns the reclaimed ids.
    pub fn deref(&mut self, id: TermId) -> Result<Vec<TermId>, TermError> {
        if self.slot(id)?.ref_count == 0 {
            return Err(TermError::ZeroRefCount(id));
        }

        let mut collected = Vec::new();
        // One entry per reference being dropped.
        let mut work: SmallVec<[TermId; 16]> = smallvec![id];
        while let Some(t) = work.pop() {
            let slot = match self.slot_mut(t) {
                Some(slot) => slot,
                None => continue,
            };
            debug_assert!(slot.ref_count > 0, "live child with zero count");
            slot.ref_count = slot.ref_count.saturating_sub(1);
            if slot.ref_count > 0 {
                continue;
            }

            if let Some(dead) = self.slots[t.index()].take() {
                self.index.remove(&dead.term);
                self.free.push(t);
                collected.push(t);
                trace!(id = t.raw(), "term_collected");
                if let Term::App(_, children) = dead.term {
                    for &child in &children {
                        if let Some(child_slot) = self.slot_mut(child) {
                            child_slot.parents.retain(|p| *p != t);
                        }
                        work.push(child);
                    }
                }
            }
        }
        Ok(collected)
    }

    pub fn ref_count(&self, id: TermId) -> Result<u32, TermError> {
        Ok(self.slot(id)?.ref_count)
    }

    /// 0 for constants and variables, 1 + the deepest child otherwise.
    pub fn depth(&self, id: TermId) -> Result<u32, TermError> {
        Ok(self.slot(id)?.depth)
    }

    /// Applications that have `id` as a direct child, in no particular order.
    pub fn parents(&self, id: TermId) -> Result<&[TermId], TermError> {
        Ok(self.slot(id)?.parents.as_slice())
    }

    /// Check whether `id` names a live term.
    pub fn contains(&self, id: TermId) -> bool {
        self.slot(id).is_ok()
    }

    /// Resolve a TermId to its term. Returns None for collected or foreign ids.
    pub fn resolve(&self, id: TermId) -> Option<&Term<N, F>> {
        self.slot(id).ok().map(|s| &s.term)
    }

    pub fn is_const(&self, id: TermId) -> Option<&N> {
        match self.resolve(id)? {
            Term::Const(n) => Some(n),
            Term::Var(_) | Term::App(..) => None,
        }
    }

    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id)? {
            Term::Var(v) => Some(*v),
            Term::Const(_) | Term::App(..) => None,
        }
    }

    pub fn is_app(&self, id: TermId) -> Option<(&F, &[TermId])> {
        match self.resolve(id)? {
            Term::App(f, children) => Some((f, children.as_slice())),
            Term::Const(_) | Term::Var(_) => None,
        }
    }

    /// Number of live terms.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The slot `fresh_var` would hand out next, if any is left.
    pub fn next_var_slot(&self) -> Option<u32> {
        self.next_var
    }

    /// Live terms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term<N, F>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (TermId(i as u32), &s.term)))
    }
}

impl<N: Numeral, F: Functor> Default for TermTable<N, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Numeral + fmt::Display, F: Functor + fmt::Display> fmt::Display for TermTable<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, term)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", id, term)?;
        }
        Ok(())
    }
}

/// Render a term as an s-expression, resolving functor names through `symbols`.
///
/// Variables print as `$slot`, constants as their value.
pub fn format_term<N: Numeral>(
    term: TermId,
    table: &TermTable<N, FuncId>,
    symbols: &SymbolStore,
) -> Result<String, String> {
    fn render<N: Numeral>(
        term: TermId,
        table: &TermTable<N, FuncId>,
        symbols: &SymbolStore,
        out: &mut String,
    ) -> Result<(), String> {
        match table.resolve(term) {
            Some(Term::Const(n)) => {
                out.push_str(&n.to_string());
                Ok(())
            }
            Some(Term::Var(slot)) => {
                out.push('$');
                out.push_str(&slot.to_string());
                Ok(())
            }
            Some(Term::App(func, children)) => {
                let name = symbols
                    .resolve(*func)
                    .ok_or_else(|| format!("Unknown symbol for func id {:?}", func))?;
                if children.is_empty() {
                    out.push_str(name);
                    return Ok(());
                }
                out.push('(');
                out.push_str(name);
                for child in children.iter() {
                    out.push(' ');
                    render(*child, table, symbols, out)?;
                }
                out.push(')');
                Ok(())
            }
            None => Err(format!("Unknown term id {:?}", term)),
        }
    }

    let mut out = String::new();
    render(term, table, symbols, &mut out)?;
    Ok(out)
}
