//! Congruence closure over a [`TermTable`].
//!
//! The solver keeps a union-find forest over term ids plus, for every class
//! representative, the set of applications that use some class member as a
//! direct child ("class parents"). Merging two classes compares the parents
//! of one side against the parents of the other and queues every congruent
//! pair for merging, until nothing is left to do.

use crate::config::DiagnosticsConfig;
use crate::error::TermError;
use crate::term::{Functor, FxHashMap, Numeral, Term, TermId, TermTable};
use crate::trace::{debug, debug_span, trace};
use std::collections::BTreeSet;
use std::fmt;

/// Counters for one call to [`CongruenceClosure::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Asserted equations consumed.
    pub equations: usize,
    /// Class merges performed, including those caused by congruence.
    pub unions: usize,
    /// Merges caused by congruence rather than by an asserted equation.
    pub congruences: usize,
}

pub struct CongruenceClosure<'t, N, F> {
    table: &'t TermTable<N, F>,
    /// Union-find parent links; roots map to themselves.
    find: FxHashMap<TermId, TermId>,
    /// Class sizes, kept for roots only.
    size: FxHashMap<TermId, usize>,
    /// Class parents, kept for roots only.
    ccpar: FxHashMap<TermId, BTreeSet<TermId>>,
    pending: Vec<(TermId, TermId)>,
    /// Every term the solver has placed in the forest.
    seen: BTreeSet<TermId>,
    /// Members per root. Cleared on every union.
    members: FxHashMap<TermId, Vec<TermId>>,
    diagnostics: Option<DiagnosticsConfig>,
}

impl<'t, N: Numeral, F: Functor> CongruenceClosure<'t, N, F> {
    pub fn new(table: &'t TermTable<N, F>) -> Self {
        Self {
            table,
            find: FxHashMap::default(),
            size: FxHashMap::default(),
            ccpar: FxHashMap::default(),
            pending: Vec::new(),
            seen: BTreeSet::new(),
            members: FxHashMap::default(),
            diagnostics: None,
        }
    }

    /// Create a solver that dumps its partition after each run when
    /// `config` enables the `congruence` tag at verbosity 2 or more.
    pub fn with_diagnostics(table: &'t TermTable<N, F>, config: DiagnosticsConfig) -> Self {
        let mut cc = Self::new(table);
        cc.diagnostics = Some(config);
        cc
    }

    pub fn table(&self) -> &'t TermTable<N, F> {
        self.table
    }

    /// Queue `a = b`. Both ids must be live in the table.
    pub fn assert_equation(&mut self, a: TermId, b: TermId) -> Result<(), TermError> {
        self.check_live(a)?;
        self.check_live(b)?;
        self.pending.push((a, b));
        Ok(())
    }

    /// Queue every equation, stopping at the first one over an unknown id.
    pub fn assert_equations<I>(&mut self, equations: I) -> Result<(), TermError>
    where
        I: IntoIterator<Item = (TermId, TermId)>,
    {
        for (a, b) in equations {
            self.assert_equation(a, b)?;
        }
        Ok(())
    }

    /// Number of equations waiting for the next `run`.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Process all pending equations to a fixpoint.
    ///
    /// May be called again after more equations are asserted; classes only
    /// ever grow.
    pub fn run(&mut self) -> RunStats {
        let _span = debug_span!("cc_run", pending = self.pending.len()).entered();
        let mut stats = RunStats::default();

        let equations = std::mem::take(&mut self.pending);
        for (a, b) in equations {
            stats.equations += 1;
            self.merge(a, b, &mut stats);
        }

        debug!(
            equations = stats.equations,
            unions = stats.unions,
            congruences = stats.congruences,
            "cc_run_done"
        );
        if self
            .diagnostics
            .as_ref()
            .is_some_and(|c| c.wants("congruence", 2))
        {
            debug!(partition = %self, "cc_partition");
        }
        stats
    }

    /// Assert a batch of equations and run.
    pub fn run_with<I>(&mut self, equations: I) -> Result<RunStats, TermError>
    where
        I: IntoIterator<Item = (TermId, TermId)>,
    {
        self.assert_equations(equations)?;
        Ok(self.run())
    }

    /// Representative of the class of `id`. Live terms the solver has not
    /// seen yet are their own class.
    pub fn get_class(&mut self, id: TermId) -> Result<TermId, TermError> {
        self.check_live(id)?;
        Ok(self.find(id))
    }

    pub fn are_equal(&mut self, a: TermId, b: TermId) -> Result<bool, TermError> {
        self.check_live(a)?;
        self.check_live(b)?;
        Ok(self.find(a) == self.find(b))
    }

    /// Members of the class of `id`, sorted, among the terms the solver has seen.
    pub fn get_members(&mut self, id: TermId) -> Result<&[TermId], TermError> {
        self.check_live(id)?;
        let root = self.find(id);
        if !self.members.contains_key(&root) {
            let seen: Vec<TermId> = self.seen.iter().copied().collect();
            let members: Vec<TermId> = seen.into_iter().filter(|&t| self.find(t) == root).collect();
            self.members.insert(root, members);
        }
        Ok(self.members.get(&root).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn get_size(&mut self, id: TermId) -> Result<usize, TermError> {
        Ok(self.get_members(id)?.len())
    }

    /// Only live terms of the table ever enter the forest.
    fn check_live(&self, id: TermId) -> Result<(), TermError> {
        if self.table.contains(id) {
            Ok(())
        } else {
            Err(TermError::UnknownTerm(id))
        }
    }

    /// Place `t` in the forest as a singleton if it is not there yet.
    fn touch(&mut self, t: TermId) {
        if self.find.contains_key(&t) {
            return;
        }
        let parents: BTreeSet<TermId> = self
            .table
            .parents(t)
            .map(|ps| ps.iter().copied().collect())
            .unwrap_or_default();
        self.find.insert(t, t);
        self.size.insert(t, 1);
        self.ccpar.insert(t, parents);
        self.seen.insert(t);
    }

    fn find(&mut self, t: TermId) -> TermId {
        self.touch(t);
        let root = self.root_of(t);
        let mut cur = t;
        while cur != root {
            match self.find.insert(cur, root) {
                Some(next) => cur = next,
                None => break,
            }
        }
        root
    }

    /// Root lookup without path compression.
    fn root_of(&self, t: TermId) -> TermId {
        let mut cur = t;
        while let Some(&next) = self.find.get(&cur) {
            if next == cur {
                break;
            }
            cur = next;
        }
        cur
    }

    fn congruent(&mut self, p1: TermId, p2: TermId) -> bool {
        let table = self.table;
        let (Some(Term::App(f1, args1)), Some(Term::App(f2, args2))) =
            (table.resolve(p1), table.resolve(p2))
        else {
            return false;
        };
        if f1 != f2 || args1.len() != args2.len() {
            return false;
        }
        args1
            .iter()
            .zip(args2.iter())
            .all(|(&a, &b)| self.find(a) == self.find(b))
    }

    fn merge(&mut self, a: TermId, b: TermId, stats: &mut RunStats) {
        // (lhs, rhs, discovered by congruence)
        let mut work = vec![(a, b, false)];
        while let Some((x, y, by_congruence)) = work.pop() {
            let rx = self.find(x);
            let ry = self.find(y);
            if rx == ry {
                continue;
            }

            let size_x = self.size.get(&rx).copied().unwrap_or(1);
            let size_y = self.size.get(&ry).copied().unwrap_or(1);
            let (child, root) = if size_x > size_y { (ry, rx) } else { (rx, ry) };

            let child_parents = self.ccpar.remove(&child).unwrap_or_default();
            // Taken out while `find` runs below; `touch` never recreates it
            // because `root` is already in the forest.
            let mut root_parents = self.ccpar.remove(&root).unwrap_or_default();

            self.find.insert(child, root);
            self.size.remove(&child);
            self.size.insert(root, size_x + size_y);
            self.members.clear();
            stats.unions += 1;
            if by_congruence {
                stats.congruences += 1;
            }
            trace!(
                child = child.raw(),
                root = root.raw(),
                by_congruence,
                "cc_union"
            );

            for &p1 in &child_parents {
                for &p2 in &root_parents {
                    if self.find(p1) != self.find(p2) && self.congruent(p1, p2) {
                        work.push((p1, p2, true));
                    }
                }
            }
            root_parents.extend(child_parents);
            self.ccpar.insert(root, root_parents);
        }
    }
}

impl<N: Numeral, F: Functor> fmt::Display for CongruenceClosure<'_, N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &t1 in &self.seen {
            let root = self.root_of(t1);
            write!(f, "t{} --> {{", t1)?;
            for &t2 in &self.seen {
                if self.root_of(t2) == root {
                    write!(f, "t{};", t2)?;
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
