use proptest::prelude::*;
use termdag::congruence::CongruenceClosure;
use termdag::generalize::{copy_term, generalize, is_instance_of, GenMap, RenameMap};
use termdag::term::{Term, TermId, TermTable};

type Table = TermTable<i64, u8>;

const MAX_VAR: u32 = 3;
const NULLARY: u8 = 0;
const UNARY: u8 = 1;
const BINARY: u8 = 2;
const BINARY_ALT: u8 = 3;

#[derive(Clone, Debug)]
enum RawTerm {
    Const(i64),
    Var(u32),
    App { f: u8, kids: Vec<RawTerm> },
}

fn raw_term_strategy() -> impl Strategy<Value = RawTerm> {
    let leaf = prop_oneof![
        (0i64..3).prop_map(RawTerm::Const),
        (0..=MAX_VAR).prop_map(RawTerm::Var),
        Just(RawTerm::App {
            f: NULLARY,
            kids: vec![]
        }),
    ];

    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| RawTerm::App {
                f: UNARY,
                kids: vec![t]
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| RawTerm::App {
                f: BINARY,
                kids: vec![a, b],
            }),
            (inner.clone(), inner).prop_map(|(a, b)| RawTerm::App {
                f: BINARY_ALT,
                kids: vec![a, b],
            }),
        ]
    })
}

fn build_term(raw: &RawTerm, table: &mut Table) -> TermId {
    match raw {
        RawTerm::Const(n) => table.make_const(*n),
        RawTerm::Var(v) => table.make_var(*v),
        RawTerm::App { f, kids } => {
            let child_ids: Vec<TermId> = kids.iter().map(|k| build_term(k, table)).collect();
            table
                .apply_functor(*f, &child_ids)
                .expect("children were just built")
        }
    }
}

/// Render with variables numbered by first occurrence.
fn shape(table: &Table, id: TermId) -> String {
    fn go(table: &Table, id: TermId, vars: &mut Vec<u32>, out: &mut String) {
        match table.resolve(id).expect("live term") {
            Term::Const(n) => out.push_str(&format!("c{}", n)),
            Term::Var(slot) => {
                let pos = match vars.iter().position(|v| v == slot) {
                    Some(pos) => pos,
                    None => {
                        vars.push(*slot);
                        vars.len() - 1
                    }
                };
                out.push_str(&format!("?{}", pos));
            }
            Term::App(f, kids) => {
                out.push_str(&format!("f{}(", f));
                for kid in kids.iter() {
                    go(table, *kid, vars, out);
                    out.push(',');
                }
                out.push(')');
            }
        }
    }
    let mut out = String::new();
    go(table, id, &mut Vec::new(), &mut out);
    out
}

/// Congruence closure by brute force: repeat equations and congruence over
/// every pair of live terms until nothing changes.
struct NaiveClosure {
    ids: Vec<TermId>,
    parent: Vec<usize>,
}

impl NaiveClosure {
    fn new(table: &Table, eqs: &[(TermId, TermId)]) -> Self {
        let ids: Vec<TermId> = table.iter().map(|(id, _)| id).collect();
        let mut nc = NaiveClosure {
            parent: (0..ids.len()).collect(),
            ids,
        };
        loop {
            let mut changed = false;
            for &(a, b) in eqs {
                changed |= nc.union(a, b);
            }
            for i in 0..nc.ids.len() {
                for j in (i + 1)..nc.ids.len() {
                    let (ti, tj) = (nc.ids[i], nc.ids[j]);
                    if let (Some(Term::App(f, xs)), Some(Term::App(g, ys))) =
                        (table.resolve(ti), table.resolve(tj))
                    {
                        if f == g
                            && xs.len() == ys.len()
                            && xs.iter().zip(ys.iter()).all(|(&x, &y)| nc.equal(x, y))
                        {
                            changed |= nc.union(ti, tj);
                        }
                    }
                }
            }
            if !changed {
                return nc;
            }
        }
    }

    fn index(&self, id: TermId) -> usize {
        self.ids.iter().position(|&t| t == id).expect("live term")
    }

    fn root(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    fn equal(&self, a: TermId, b: TermId) -> bool {
        self.root(self.index(a)) == self.root(self.index(b))
    }

    fn union(&mut self, a: TermId, b: TermId) -> bool {
        let ra = self.root(self.index(a));
        let rb = self.root(self.index(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

proptest! {
    #[test]
    fn closure_matches_naive_fixpoint(
        raws in prop::collection::vec(raw_term_strategy(), 1..8),
        picks in prop::collection::vec((0usize..64, 0usize..64), 0..6),
    ) {
        let mut table = Table::new();
        let roots: Vec<TermId> = raws.iter().map(|r| build_term(r, &mut table)).collect();
        let eqs: Vec<(TermId, TermId)> = picks
            .iter()
            .map(|&(i, j)| (roots[i % roots.len()], roots[j % roots.len()]))
            .collect();

        let naive = NaiveClosure::new(&table, &eqs);
        let mut cc = CongruenceClosure::new(&table);
        cc.run_with(eqs.iter().copied()).unwrap();

        let all: Vec<TermId> = table.iter().map(|(id, _)| id).collect();
        for &a in &all {
            for &b in &all {
                prop_assert_eq!(
                    cc.are_equal(a, b).unwrap(),
                    naive.equal(a, b),
                    "terms {:?} and {:?} disagree", a, b
                );
            }
        }
    }

    #[test]
    fn union_order_does_not_change_partition(
        raws in prop::collection::vec(raw_term_strategy(), 1..8),
        picks in prop::collection::vec((0usize..64, 0usize..64), 0..6),
    ) {
        let mut table = Table::new();
        let roots: Vec<TermId> = raws.iter().map(|r| build_term(r, &mut table)).collect();
        let eqs: Vec<(TermId, TermId)> = picks
            .iter()
            .map(|&(i, j)| (roots[i % roots.len()], roots[j % roots.len()]))
            .collect();

        let mut forward = CongruenceClosure::new(&table);
        forward.run_with(eqs.iter().copied()).unwrap();
        let mut backward = CongruenceClosure::new(&table);
        backward.run_with(eqs.iter().rev().map(|&(a, b)| (b, a))).unwrap();

        let all: Vec<TermId> = table.iter().map(|(id, _)| id).collect();
        for &a in &all {
            for &b in &all {
                prop_assert_eq!(
                    forward.are_equal(a, b).unwrap(),
                    backward.are_equal(a, b).unwrap()
                );
            }
        }
    }

    #[test]
    fn deref_keeps_children_of_live_terms_alive(
        raws in prop::collection::vec(raw_term_strategy(), 1..8),
        order in any::<u64>(),
    ) {
        let mut table = Table::new();
        let roots: Vec<TermId> = raws.iter().map(|r| build_term(r, &mut table)).collect();
        for &r in &roots {
            table.add_ref(r).unwrap();
        }

        let mut pending = roots.clone();
        let mut seed = order;
        while !pending.is_empty() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let idx = (seed >> 33) as usize % pending.len();
            let root = pending.swap_remove(idx);
            let collected = table.deref(root).unwrap();

            for &dead in &collected {
                prop_assert!(!table.contains(dead));
            }
            for (id, term) in table.iter() {
                if let Term::App(_, kids) = term {
                    for kid in kids.iter() {
                        prop_assert!(table.contains(*kid), "child of {:?} was collected", id);
                        prop_assert!(table.parents(*kid).unwrap().contains(&id));
                    }
                }
                for p in table.parents(id).unwrap() {
                    prop_assert!(!collected.contains(p), "dangling parent link");
                }
                prop_assert_eq!(table.find_term(term), Some(id));
            }
        }
        prop_assert!(table.is_empty(), "every built term hangs off some root");
    }

    #[test]
    fn generalization_is_symmetric(a in raw_term_strategy(), b in raw_term_strategy()) {
        let mut x = Table::new();
        let tx = build_term(&a, &mut x);
        let mut y = Table::new();
        let ty = build_term(&b, &mut y);

        let mut out_xy = Table::new();
        let gxy = generalize(&x, tx, &y, ty, &mut out_xy, &mut GenMap::default()).unwrap();
        let mut out_yx = Table::new();
        let gyx = generalize(&y, ty, &x, tx, &mut out_yx, &mut GenMap::default()).unwrap();

        prop_assert_eq!(shape(&out_xy, gxy), shape(&out_yx, gyx));
        prop_assert!(is_instance_of(&x, tx, &out_xy, gxy, &mut RenameMap::default()).unwrap());
        prop_assert!(is_instance_of(&y, ty, &out_xy, gxy, &mut RenameMap::default()).unwrap());
    }

    #[test]
    fn self_generalization_and_copy_preserve_shape(a in raw_term_strategy()) {
        let mut t = Table::new();
        let root = build_term(&a, &mut t);

        let mut out = Table::new();
        let g = generalize(&t, root, &t, root, &mut out, &mut GenMap::default()).unwrap();
        prop_assert_eq!(shape(&out, g), shape(&t, root));

        let mut dest = Table::new();
        let c = copy_term(&mut dest, &t, root, &mut RenameMap::default()).unwrap();
        prop_assert_eq!(shape(&dest, c), shape(&t, root));
        prop_assert_eq!(dest.size(), t.size());
    }

    #[test]
    fn interning_is_idempotent(a in raw_term_strategy()) {
        let mut t = Table::new();
        let first = build_term(&a, &mut t);
        let size = t.size();
        let second = build_term(&a, &mut t);
        prop_assert_eq!(first, second);
        prop_assert_eq!(t.size(), size);
    }
}
