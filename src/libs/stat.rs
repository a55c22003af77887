//! Exact-test and FDR machinery for contact-count contingency tables.

/// Natural log of the gamma function, Lanczos approximation (g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const LN_SQRT_TWO_PI: f64 = 0.9189385332046727;

    if x < 0.5 {
        // reflection: Γ(x) Γ(1-x) = π / sin(πx)
        let pi = std::f64::consts::PI;
        (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut acc = 0.99999999999980993_f64;
        for (i, &c) in COEFFS.iter().enumerate() {
            acc += c / (x + i as f64 + 1.0);
        }
        let t = x + 7.5;
        LN_SQRT_TWO_PI + (x + 0.5) * t.ln() - t + acc.ln()
    }
}

/// Log of the binomial coefficient C(n, k).
fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

/// Log of the hypergeometric PMF of drawing `k` marked items when `row1`
/// items are drawn from `n` of which `col1` are marked.
fn ln_hypergeom(k: u64, row1: u64, col1: u64, n: u64) -> f64 {
    ln_choose(col1, k) + ln_choose(n - col1, row1 - k) - ln_choose(n, row1)
}

/// Two-sided Fisher exact test of independence on `[[a, b], [c, d]]`.
///
/// Sums the probabilities of all tables with the observed margins that are
/// at most as likely as the observed one. The comparison runs in log space
/// with a relative tolerance, so deep tails of large tables do not leak into
/// the sum. A table with no observations carries no evidence and returns 1.
pub fn fisher_exact(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let n = a + b + c + d;
    if n == 0 {
        return 1.0;
    }
    let row1 = a + b;
    let col1 = a + c;

    let ln_p_observed = ln_hypergeom(a, row1, col1, n);

    let k_min = row1.saturating_sub(n - col1);
    let k_max = row1.min(col1);

    let mut p_value = 0.0;
    for k in k_min..=k_max {
        let ln_p_k = ln_hypergeom(k, row1, col1, n);
        if ln_p_k <= ln_p_observed + 1e-7 {
            p_value += ln_p_k.exp();
        }
    }
    p_value.min(1.0)
}

/// Benjamini-Hochberg adjusted p-values, input order preserved.
///
/// Sorted p-values are scaled by `n / rank`, monotonicity is enforced right
/// to left and results are clamped to 1.
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return vec![];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| p_values[i].total_cmp(&p_values[j]));

    let mut adjusted = vec![0.0; n];
    let mut running = f64::INFINITY;
    for rank in (0..n).rev() {
        let i = order[rank];
        let adj = (p_values[i] * n as f64 / (rank + 1) as f64).min(1.0);
        running = running.min(adj);
        adjusted[i] = running;
    }

    adjusted
}
