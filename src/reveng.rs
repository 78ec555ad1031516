//! The reverse-engineering search core.
//!
//! Given a partially-specified [`Model`], a list of `(message, CRC)`
//! samples, and a bitset recording which of `{poly, init, xorout}` are
//! already known, enumerates every candidate [`Model`] consistent with
//! the samples. The dispatch table ("which of HAVEP/HAVEI/HAVEX are
//! set") is [`dispatch`] below, and the no-poly-given factor search is
//! [`factor_search`].

use bitflags::bitflags;

use crate::crc::{self, Flags};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::poly::{self, Poly};

bitflags! {
    /// Which parts of the model are already known, plus search-shaping
    /// modifiers. Distinct from [`crate::crc::Flags`] (the Williams
    /// model's own `REFIN`/`REFOUT`/.../`MULXN` word): this is metadata
    /// about the search itself.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SearchFlags: u32 {
        /// The generator polynomial is known; search only for init/xorout.
        const HAVEP  = 1 << 0;
        /// The init value is known.
        const HAVEI  = 1 << 1;
        /// The xorout value is known.
        const HAVEX  = 1 << 2;
        /// The caller explicitly specified RefIn (vs. a search default).
        const HAVERI = 1 << 3;
        /// The caller explicitly specified RefOut.
        const HAVERO = 1 << 4;
        /// An explicit range end (`qpoly`) was given.
        const HAVEQ  = 1 << 5;
        /// Use the compact "short" factor-search enumeration.
        const SHORT  = 1 << 6;
        /// Stop at the first solution found (exhaustive search off).
        const EXHST  = 1 << 7;
    }
}

/// Report candidates and progress as the search runs. An injected
/// capability rather than global function symbols, so a search can be
/// driven and observed without global state.
pub trait Reporter {
    /// A complete candidate model was found and passed verification.
    fn found(&mut self, _model: &Model) {}
    /// Periodic telemetry; `seq` increases monotonically and the first
    /// call (`seq == 0`) is conventionally suppressed by the driver.
    fn progress(&mut self, _poly: &Poly, _flags: SearchFlags, _seq: u64) {}
}

/// A [`Reporter`] that discards everything, useful when only the
/// returned `Vec<Model>` matters, not the streaming callbacks.
#[derive(Default)]
pub struct NullReporter;
impl Reporter for NullReporter {}

/// How often (in candidates tested) [`Reporter::progress`] is invoked
/// during the brute-force/factor enumeration loops.
const SPMASK: u64 = 0xffff;

/// Run the reverse-engineering search.
///
/// `guess` carries the known width (`guess.spoly.len()`), any already-
/// known `spoly`/`init`/`xorout` values (gated by the corresponding
/// `HAVEP`/`HAVEI`/`HAVEX` bits of `rflags`), and the `REFIN`/`REFOUT`
/// that every candidate must share. `qpoly`, if `Some`, is the exclusive
/// end of the poly search range when `rflags` has `HAVEQ` set.
pub fn reveng(guess: &Model, qpoly: Option<&Poly>, rflags: SearchFlags, samples: &[Poly], reporter: &mut dyn Reporter) -> Result<Vec<Model>> {
    if guess.is_crossed_endian() {
        return Err(Error::CrossedEndian);
    }
    let width = guess.width();
    if width == 0 {
        return Err(Error::NoWidth);
    }

    let mut results = Vec::new();
    if rflags.contains(SearchFlags::HAVEP) {
        dispatch(&guess.spoly.clone(), guess, rflags, samples, reporter, &mut results);
    } else {
        factor_search(guess, qpoly, rflags, samples, reporter, &mut results);
    }
    Ok(results)
}

/// The dispatch table: given a fixed `poly`, route to
/// `chkres`/`calout`/`calini`/`engini` depending on which of
/// `init`/`xorout` are already known.
fn dispatch(poly_val: &Poly, guess: &Model, rflags: SearchFlags, samples: &[Poly], reporter: &mut dyn Reporter, results: &mut Vec<Model>) {
    let have_i = rflags.contains(SearchFlags::HAVEI);
    let have_x = rflags.contains(SearchFlags::HAVEX);

    match (have_i, have_x) {
        (true, true) => {
            if chkres(poly_val, &guess.init, &guess.xorout, guess.flags, samples) {
                emit(poly_val, &guess.init, &guess.xorout, guess.flags, reporter, results);
            }
        }
        (true, false) => {
            if let Some(xorout) = calout(poly_val, &guess.init, guess.flags, samples) {
                emit(poly_val, &guess.init, &xorout, guess.flags, reporter, results);
            }
        }
        (false, true) => {
            if let Some(init) = calini(poly_val, &guess.xorout, guess.flags, samples) {
                if chkres(poly_val, &init, &guess.xorout, guess.flags, samples) {
                    emit(poly_val, &init, &guess.xorout, guess.flags, reporter, results);
                }
            }
        }
        (false, false) => {
            for init in engini(poly_val, guess.flags, rflags, samples) {
                if let Some(xorout) = calout(poly_val, &init, guess.flags, samples) {
                    emit(poly_val, &init, &xorout, guess.flags, reporter, results);
                }
            }
        }
    }
}

/// `chkres`: append a fully-populated [`Model`] (catalog name cleared,
/// `check`/`magic` recomputed) and report it.
fn emit(poly_val: &Poly, init: &Poly, xorout: &Poly, flags: Flags, reporter: &mut dyn Reporter, results: &mut Vec<Model>) {
    let mut model = Model {
        spoly: poly_val.clone(),
        init: init.clone(),
        xorout: xorout.clone(),
        check: Poly::zero(),
        magic: Poly::zero(),
        flags,
        name: None,
    };
    model.mcheck();
    reporter.found(&model);
    results.push(model);
}

/// Split a sample (message bits followed by its CRC bits) into its two
/// parts, given the algorithm's `width`.
fn split_sample(sample: &Poly, width: usize) -> (Poly, Poly) {
    let msg_len = sample.len().saturating_sub(width);
    let mut message = Poly::palloc(msg_len);
    poly::pshift(&mut message, sample, 0, 0, msg_len, false);
    let mut crc_bits = Poly::palloc(width);
    poly::pshift(&mut crc_bits, sample, 0, msg_len, sample.len(), false);
    (message, crc_bits)
}

/// `chkres`: true iff `poly`/`init`/`xorout` correctly predict every
/// sample's embedded CRC.
fn chkres(poly_val: &Poly, init: &Poly, xorout: &Poly, flags: Flags, samples: &[Poly]) -> bool {
    let width = poly_val.len();
    samples.iter().all(|s| {
        if s.len() < width {
            return false;
        }
        let (message, expected) = split_sample(s, width);
        crc::pcrc_williams(&message, poly_val, init, xorout, flags) == expected
    })
}

/// `calout`: derive `xorout` from the shortest sample given `poly` and
/// `init`, then verify against every sample.
fn calout(poly_val: &Poly, init: &Poly, flags: Flags, samples: &[Poly]) -> Option<Poly> {
    let width = poly_val.len();
    let shortest = samples.iter().min_by_key(|s| s.len())?;
    if shortest.len() < width {
        return None;
    }
    let (message, expected) = split_sample(shortest, width);
    let predicted_zero_xorout = crc::pcrc_williams(&message, poly_val, init, &Poly::palloc(width), flags);
    let mut xorout = predicted_zero_xorout;
    xorout.pxor_assign(&expected);

    if chkres(poly_val, init, &xorout, flags, samples) {
        Some(xorout)
    } else {
        None
    }
}

/// `calini`: the "reverse trick". CRC the reversed sample under the
/// reciprocal polynomial with a reversed `xorout` standing in for
/// `init`; the reversed result is `init`.
fn calini(poly_val: &Poly, xorout: &Poly, flags: Flags, samples: &[Poly]) -> Option<Poly> {
    let width = poly_val.len();
    let sample = samples.iter().min_by_key(|s| s.len())?;
    if sample.len() < width {
        return None;
    }
    let rpoly = poly_val.prcp();
    let reversed = sample.prev();
    let mut rev_flags = flags;
    rev_flags.remove(Flags::MULXN);
    let result = crc::pcrc_williams(&reversed, &rpoly, &xorout.prev(), &Poly::palloc(width), rev_flags);
    Some(result.prev())
}

/// `engini`: recover every `init` consistent with `poly` (and the
/// model's `REFIN`/`REFOUT`) via linear algebra over GF(2), without
/// knowing `xorout`.
///
/// Picks the two shortest samples and eliminates the (unknown, but
/// additive) `xorout` term by differencing their CRC equations, leaving
/// a `width`-unknown linear system in `init` alone; [`gf2_solve`] finds
/// every solution (or just one if `EXHST`).
fn engini(poly_val: &Poly, flags: Flags, rflags: SearchFlags, samples: &[Poly]) -> Vec<Poly> {
    let width = poly_val.len();
    if samples.len() < 2 {
        return Vec::new();
    }
    let mut sorted: Vec<&Poly> = samples.iter().collect();
    sorted.sort_by_key(|s| s.len());
    let a = sorted[0];
    let b = sorted[1];

    if a.len() == b.len() {
        // All samples equal length falls back to calini with xorout
        // assumed zero.
        let zero = Poly::palloc(width);
        return calini(poly_val, &zero, flags, samples).into_iter().collect();
    }

    let (msg_a, crc_a) = split_sample(a, width);
    let (msg_b, crc_b) = split_sample(b, width);

    let zero_init = Poly::palloc(width);
    let base_a = crc::pcrc_williams(&msg_a, poly_val, &zero_init, &Poly::palloc(width), flags);
    let base_b = crc::pcrc_williams(&msg_b, poly_val, &zero_init, &Poly::palloc(width), flags);

    let mut target = crc_a.clone();
    target.pxor_assign(&crc_b);
    target.pxor_assign(&base_a);
    target.pxor_assign(&base_b);

    // column k = contribution of init's unit vector e_k to (len_a
    // contribution xor len_b contribution) after the xorout-cancelling
    // difference above.
    let zero_msg_a = Poly::palloc(msg_a.len());
    let zero_msg_b = Poly::palloc(msg_b.len());
    let mut columns = Vec::with_capacity(width);
    for k in 0..width {
        let unit = Poly::unit(width, k);
        let la = crc::pcrc_williams(&zero_msg_a, poly_val, &unit, &Poly::palloc(width), flags);
        let lb = crc::pcrc_williams(&zero_msg_b, poly_val, &unit, &Poly::palloc(width), flags);
        let mut col = la;
        col.pxor_assign(&lb);
        columns.push(col);
    }

    let exhaustive = !rflags.contains(SearchFlags::EXHST);
    gf2_solve(&columns, &target, exhaustive)
}

/// Solve `M * x = target` over GF(2), where `M`'s `k`-th column is
/// `columns[k]` (a `width`-bit vector: `columns[k].coeff(r)` is the
/// coefficient of `x_k` in equation `r`). Returns every solution, or
/// just the first if `exhaustive` is false.
fn gf2_solve(columns: &[Poly], target: &Poly, exhaustive: bool) -> Vec<Poly> {
    let width = target.len();
    if columns.len() != width {
        return Vec::new();
    }

    // Build augmented rows: row[r] = (coeff for x_0 .. x_{width-1}, rhs).
    let mut rows: Vec<Poly> = (0..width)
        .map(|r| {
            let mut bits: Vec<bool> = columns.iter().map(|c| c.coeff(r)).collect();
            bits.push(target.coeff(r));
            Poly::from_bits(&bits)
        })
        .collect();

    let mut pivot_col_of_row: Vec<Option<usize>> = vec![None; width];
    let mut pivot_row = 0;
    for col in 0..width {
        if pivot_row >= width {
            break;
        }
        let found = (pivot_row..width).find(|&r| rows[r].coeff(col));
        let Some(found) = found else { continue };
        rows.swap(pivot_row, found);
        for r in 0..width {
            if r != pivot_row && rows[r].coeff(col) {
                let pivot_row_val = rows[pivot_row].clone();
                rows[r].pxor_assign(&pivot_row_val);
            }
        }
        pivot_col_of_row[pivot_row] = Some(col);
        pivot_row += 1;
    }

    // Inconsistent: an all-zero coefficient row with a nonzero RHS.
    for r in pivot_row..width {
        if rows[r].coeff(width) {
            return Vec::new();
        }
    }

    let pivot_cols: Vec<usize> = pivot_col_of_row.iter().filter_map(|c| *c).collect();
    let free_cols: Vec<usize> = (0..width).filter(|c| !pivot_cols.contains(c)).collect();

    let base = |free_assignment: &[bool]| -> Poly {
        let mut x = vec![false; width];
        for (i, &c) in free_cols.iter().enumerate() {
            x[c] = free_assignment[i];
        }
        for (r, pc) in pivot_col_of_row.iter().enumerate() {
            let Some(pc) = pc else { continue };
            let mut v = rows[r].coeff(width);
            for fc in &free_cols {
                if rows[r].coeff(*fc) {
                    v ^= x[*fc];
                }
            }
            x[*pc] = v;
        }
        Poly::from_bits(&x)
    };

    if free_cols.is_empty() {
        return vec![base(&[])];
    }
    if !exhaustive {
        return vec![base(&vec![false; free_cols.len()])];
    }

    // Enumerate every assignment of the free variables (bounded: callers
    // are expected to pass modest widths, matching a "try every
    // combination" completeness guarantee).
    let n = free_cols.len();
    if n > 24 {
        // Defend against pathological rank deficiency rather than
        // enumerating billions of combinations.
        return vec![base(&vec![false; n])];
    }
    let mut out = Vec::with_capacity(1 << n);
    for mask in 0..(1u32 << n) {
        let assignment: Vec<bool> = (0..n).map(|i| (mask >> i) & 1 != 0).collect();
        out.push(base(&assignment));
    }
    out
}

/// The no-poly-given branch: find `D`, the GCD of all pairwise sample
/// differences, then dispatch every width-degree divisor of `D` found
/// in range `[start, qpoly)`.
fn factor_search(guess: &Model, qpoly: Option<&Poly>, rflags: SearchFlags, samples: &[Poly], reporter: &mut dyn Reporter, results: &mut Vec<Model>) {
    let width = guess.width();
    let have_i = rflags.contains(SearchFlags::HAVEI);

    let mut gcd = Poly::zero();
    for i in 0..samples.len() {
        for j in (i + 1)..samples.len() {
            let a = &samples[i];
            let b = &samples[j];
            let diff = if a.len() == b.len() {
                let mut d = a.clone();
                d.pxor_assign(b);
                Some(d)
            } else if have_i && a.len() >= width && b.len() >= width {
                // Cancel init's contribution at the leading `width` bits
                // of each operand, then compare the aligned tail.
                let mut a2 = a.clone();
                a2.psum(&guess.init, 0);
                let mut b2 = b.clone();
                b2.psum(&guess.init, 0);
                let short_len = a.len().min(b.len());
                let mut ta = Poly::palloc(short_len);
                poly::pshift(&mut ta, &a2, 0, a2.len() - short_len, a2.len(), false);
                let mut tb = Poly::palloc(short_len);
                poly::pshift(&mut tb, &b2, 0, b2.len() - short_len, b2.len(), false);
                ta.pxor_assign(&tb);
                Some(ta)
            } else {
                None
            };
            if let Some(d) = diff {
                gcd = poly::pgcd(&gcd, &d);
            }
        }
    }
    gcd.pnorm();

    if !gcd.ptst() {
        // No pairwise difference contributed (e.g. every sample has a
        // distinct length and init is unknown): the GCD certificate
        // gives no information. Rather than silently abandoning, fall
        // back to brute-force enumeration of every candidate over the
        // requested range, verified by full dispatch. Slower, but sound.
        enumerate_candidates(guess, qpoly, rflags, samples, reporter, results, None);
        return;
    }

    if gcd.len() < width + 1 {
        // Abandoned: no generator of the required width divides D.
        return;
    }

    if gcd.len() == width + 1 {
        let candidate = gcd.pright(width);
        dispatch(&candidate, guess, rflags, samples, reporter, results);
        return;
    }

    // Short mode and the general enumeration both reduce to "enumerate
    // odd width-bit polys in range, keep the ones that divide D exactly",
    // so both are handled by the same enumeration below.
    enumerate_candidates(guess, qpoly, rflags, samples, reporter, results, Some(&gcd));
}

/// Enumerate every odd (unit-term) `width`-bit polynomial in
/// `[guess.spoly, qpoly)`, optionally filtered to only those that
/// divide `gcd` exactly, dispatching each survivor.
fn enumerate_candidates(
    guess: &Model,
    qpoly: Option<&Poly>,
    rflags: SearchFlags,
    samples: &[Poly],
    reporter: &mut dyn Reporter,
    results: &mut Vec<Model>,
    gcd: Option<&Poly>,
) {
    let width = guess.width();
    if width == 0 {
        return;
    }

    let start = &guess.spoly;
    let mut hi = Poly::palloc(width - 1);
    poly::pshift(&mut hi, start, 0, 0, width - 1, false);

    let have_q = rflags.contains(SearchFlags::HAVEQ);
    let qpoly = qpoly.cloned();

    let mut seq: u64 = 0;
    loop {
        let candidate = poly::concat(&hi, &Poly::ones(1));

        if have_q {
            if let Some(q) = &qpoly {
                if poly::psncmp(&candidate, q) != core::cmp::Ordering::Less {
                    break;
                }
            }
        }

        let divides = match gcd {
            Some(d) => !poly::pmod(d, &candidate.unchop()).ptst(),
            None => true,
        };
        if divides {
            dispatch(&candidate, guess, rflags, samples, reporter, results);
        }

        seq += 1;
        if seq & SPMASK == 0 {
            reporter.progress(&candidate, rflags, seq);
        }

        if !hi.piter() {
            break;
        }
    }
}
