//! Bounded scalar minimization (Brent's method).
//!
//! Golden-section steps guarantee progress; parabolic interpolation through
//! the three best points speeds up convergence on smooth stretches. The
//! objective is fallible so predictor errors surface unchanged.

use super::error::{EngineError, EngineResult};

/// `(3 - sqrt(5)) / 2`
const GOLDEN_MEAN: f64 = 0.381_966_011_250_105_1;

/// Relative tolerance floor, `sqrt(f64::EPSILON)`.
const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;

/// Result of a bounded minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// Minimizer, always within `[low, high]`
    pub x: f64,
    /// Objective at `x`
    pub fun: f64,
    /// Objective evaluations
    pub evaluations: usize,
    /// False when `max_evaluations` ran out before the tolerance was met
    pub converged: bool,
}

/// Minimize `f` over `[low, high]` to absolute tolerance `xatol`.
///
/// `low == high` evaluates the objective once at that point.
pub fn minimize_bounded<F>(
    mut f: F,
    low: f64,
    high: f64,
    xatol: f64,
    max_evaluations: usize,
) -> EngineResult<Minimum>
where
    F: FnMut(f64) -> EngineResult<f64>,
{
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(EngineError::InvalidBounds { low, high });
    }
    if low == high {
        return Ok(Minimum {
            x: low,
            fun: f(low)?,
            evaluations: 1,
            converged: true,
        });
    }

    let (mut a, mut b) = (low, high);

    // xf: best point, nfc: second best, fulc: previous second best
    let mut fulc = a + GOLDEN_MEAN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat: f64 = 0.0;
    let mut e: f64 = 0.0;

    let mut fx = f(xf)?;
    let mut evaluations = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;

    let mut xm = 0.5 * (a + b);
    let mut tol1 = SQRT_EPS * xf.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            // Parabola through (xf, fx), (nfc, fnfc), (fulc, ffulc)
            let r = (xf - nfc) * (fx - ffulc);
            let q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            let mut q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                golden = false;
                rat = p / q;
                let x = xf + rat;
                // Keep clear of the bracket ends
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * step_sign(xm - xf);
                }
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN_MEAN * e;
        }

        let x = (xf + step_sign(rat) * rat.abs().max(tol1)).clamp(low, high);
        let fu = f(x)?;
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = SQRT_EPS * xf.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;

        if evaluations >= max_evaluations {
            converged = false;
            break;
        }
    }

    Ok(Minimum {
        x: xf,
        fun: fx,
        evaluations,
        converged,
    })
}

/// Sign of `v`, with 0 counted as positive.
fn step_sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
