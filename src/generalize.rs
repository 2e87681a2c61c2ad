//! Anti-unification and structural copying between term tables.
//!
//! [`generalize`] computes the least general common pattern of two terms
//! living in two different tables and writes it into a third. Wherever the
//! inputs disagree the result holds a fresh variable. This is the join of
//! two equality-tracking abstract states.
//!
//! All three entry points are memoized on source ids, so shared structure
//! in the inputs stays shared in the output.

use crate::error::TermError;
use crate::term::{Functor, FxHashMap, Numeral, Term, TermId, TermTable};
use crate::trace::trace;
use smallvec::SmallVec;

/// Memo for [`generalize`]: `(x id, y id)` to output id.
pub type GenMap = FxHashMap<(TermId, TermId), TermId>;

/// Mapping from ids of one table to ids of another.
pub type RenameMap = FxHashMap<TermId, TermId>;

/// Least general generalization of `tx` (in `x`) and `ty` (in `y`), built in `out`.
///
/// Neither input table is modified. Reusing `memo` across calls that target
/// the same `out` table keeps repeated pairs mapped to the same output term,
/// including the same fresh variable.
pub fn generalize<N: Numeral, F: Functor>(
    x: &TermTable<N, F>,
    tx: TermId,
    y: &TermTable<N, F>,
    ty: TermId,
    out: &mut TermTable<N, F>,
    memo: &mut GenMap,
) -> Result<TermId, TermError> {
    if let Some(&id) = memo.get(&(tx, ty)) {
        return Ok(id);
    }

    let px = x.resolve(tx).ok_or(TermError::UnknownTerm(tx))?;
    let py = y.resolve(ty).ok_or(TermError::UnknownTerm(ty))?;

    let result = match (px, py) {
        (Term::Const(a), Term::Const(b)) if a == b => out.make_const(a.clone()),
        (Term::App(f, xargs), Term::App(g, yargs)) if f == g && xargs.len() == yargs.len() => {
            let mut args: SmallVec<[TermId; 4]> = SmallVec::with_capacity(xargs.len());
            for (&cx, &cy) in xargs.iter().zip(yargs.iter()) {
                args.push(generalize(x, cx, y, cy, out, memo)?);
            }
            out.apply_functor(f.clone(), &args)?
        }
        _ => {
            let v = out.fresh_var()?;
            trace!(tx = tx.raw(), ty = ty.raw(), var = v.raw(), "generalize_diverged");
            v
        }
    };

    memo.insert((tx, ty), result);
    Ok(result)
}

/// Copy `id` and everything below it from `src` into `dest`.
///
/// Every source variable becomes a fresh variable of `dest`; a variable
/// seen twice (or any subterm already in `rename`) maps to the same
/// destination term.
pub fn copy_term<N: Numeral, F: Functor>(
    dest: &mut TermTable<N, F>,
    src: &TermTable<N, F>,
    id: TermId,
    rename: &mut RenameMap,
) -> Result<TermId, TermError> {
    if let Some(&copied) = rename.get(&id) {
        return Ok(copied);
    }

    let result = match src.resolve(id).ok_or(TermError::UnknownTerm(id))? {
        Term::Var(_) => dest.fresh_var()?,
        Term::Const(n) => dest.make_const(n.clone()),
        Term::App(f, children) => {
            let mut args: SmallVec<[TermId; 4]> = SmallVec::with_capacity(children.len());
            for &child in children.iter() {
                args.push(copy_term(dest, src, child, rename)?);
            }
            dest.apply_functor(f.clone(), &args)?
        }
    };

    rename.insert(id, result);
    Ok(result)
}

/// Check that `tx` (in `x`) is an instance of `ty` (in `y`).
///
/// `map` records which `x` term each `y` term was matched against; a `y`
/// term seen again must match the same `x` term. A variable of `y` matches
/// anything. On failure `map` may hold partial bindings.
pub fn is_instance_of<N: Numeral, F: Functor>(
    x: &TermTable<N, F>,
    tx: TermId,
    y: &TermTable<N, F>,
    ty: TermId,
    map: &mut RenameMap,
) -> Result<bool, TermError> {
    if let Some(&bound) = map.get(&ty) {
        return Ok(bound == tx);
    }

    let px = x.resolve(tx).ok_or(TermError::UnknownTerm(tx))?;
    let py = y.resolve(ty).ok_or(TermError::UnknownTerm(ty))?;

    let matches = match (py, px) {
        (Term::Var(_), _) => true,
        (Term::Const(b), Term::Const(a)) => a == b,
        (Term::App(g, yargs), Term::App(f, xargs)) => {
            if f != g || xargs.len() != yargs.len() {
                false
            } else {
                let mut all = true;
                for (&cx, &cy) in xargs.iter().zip(yargs.iter()) {
                    if !is_instance_of(x, cx, y, cy, map)? {
                        all = false;
                        break;
                    }
                }
                all
            }
        }
        _ => false,
    };

    if matches {
        map.insert(ty, tx);
    }
    Ok(matches)
}
