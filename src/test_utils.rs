use crate::symbol::SymbolStore;
use crate::term::{Term, TermId, TermTable};
use crate::AnalysisTable;
use num_bigint::BigInt;
use std::fmt::Display;

pub(crate) fn setup() -> (SymbolStore, AnalysisTable) {
    (SymbolStore::new(), AnalysisTable::new())
}

pub(crate) fn num(n: i64) -> BigInt {
    BigInt::from(n)
}

/// Table with string functors, for tests that compare printed structure.
pub(crate) type StrTable = TermTable<i64, &'static str>;

/// Render a term as `f(1, ?0)`, numbering variables by first occurrence so
/// terms from different tables can be compared.
pub(crate) fn shape<N: crate::term::Numeral + Display>(
    table: &TermTable<N, &'static str>,
    id: TermId,
) -> String {
    fn go<N: crate::term::Numeral + Display>(
        table: &TermTable<N, &'static str>,
        id: TermId,
        vars: &mut Vec<u32>,
        out: &mut String,
    ) {
        match table.resolve(id) {
            Some(Term::Const(n)) => out.push_str(&n.to_string()),
            Some(Term::Var(slot)) => {
                let pos = match vars.iter().position(|v| v == slot) {
                    Some(pos) => pos,
                    None => {
                        vars.push(*slot);
                        vars.len() - 1
                    }
                };
                out.push_str(&format!("?{}", pos));
            }
            Some(Term::App(f, args)) => {
                out.push_str(f);
                if !args.is_empty() {
                    out.push('(');
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        go(table, *arg, vars, out);
                    }
                    out.push(')');
                }
            }
            None => out.push_str("<dead>"),
        }
    }

    let mut out = String::new();
    go(table, id, &mut Vec::new(), &mut out);
    out
}
