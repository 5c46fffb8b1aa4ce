//! Rolling-window primitives over a full history.
//!
//! Every function takes whole series and returns a series of the same length;
//! index `i` of the output lines up with index `i` of the input. Windows are
//! trailing and clipped at the start of the series, so early bars aggregate
//! the prefix that exists rather than padding with zeros.
//!
//! Window lengths of 0 are treated as 1. MA, LLV and HHV evaluate each window
//! directly over its slice, which keeps two identical windows bit-identical.

/// REF(x, k): x lagged by k bars, 0.0 where no history exists.
pub fn ref_lag(x: &[f64], k: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| if i >= k { x[i - k] } else { 0.0 })
        .collect()
}

fn window_start(i: usize, n: usize) -> usize {
    (i + 1).saturating_sub(n.max(1))
}

/// MA(x, n): mean of the trailing min(n, i+1) values.
pub fn ma(x: &[f64], n: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            let window = &x[window_start(i, n)..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// EMA(x, n) with α = 2/(n+1), seeded with x[0].
pub fn ema(x: &[f64], n: usize) -> Vec<f64> {
    let alpha = 2.0 / (n.max(1) as f64 + 1.0);
    let mut out = Vec::with_capacity(x.len());
    for (i, &value) in x.iter().enumerate() {
        if i == 0 {
            out.push(value);
        } else {
            let prev = out[i - 1];
            out.push(alpha * value + (1.0 - alpha) * prev);
        }
    }
    out
}

/// SMA(x, n, m): weighted smoothing with period `n` and weight `m`.
///
/// result[0] = x[0]; running prefix mean while i < n; afterwards
/// result[i] = (m·x[i] + (n−m)·result[i−1]) / n.
pub fn sma(x: &[f64], n: usize, m: usize) -> Vec<f64> {
    let n = n.max(1);
    let nf = n as f64;
    let mf = m.min(n) as f64;
    let mut out = Vec::with_capacity(x.len());
    let mut prefix_sum = 0.0;
    for (i, &value) in x.iter().enumerate() {
        prefix_sum += value;
        if i == 0 {
            out.push(value);
        } else if i < n {
            out.push(prefix_sum / (i + 1) as f64);
        } else {
            let prev = out[i - 1];
            out.push((mf * value + (nf - mf) * prev) / nf);
        }
    }
    out
}

/// LLV(x, n): trailing minimum.
pub fn llv(x: &[f64], n: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            x[window_start(i, n)..=i]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// HHV(x, n): trailing maximum.
pub fn hhv(x: &[f64], n: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            x[window_start(i, n)..=i]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// CROSS(a, b): `a` moves from at-or-below `b` to strictly above it.
///
/// Always false at index 0. A downward cross is `cross(b, a)`.
pub fn cross(a: &[f64], b: &[f64]) -> Vec<bool> {
    let len = a.len().min(b.len());
    (0..len)
        .map(|i| i >= 1 && a[i - 1] <= b[i - 1] && a[i] > b[i])
        .collect()
}

pub fn abs(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.abs()).collect()
}

/// IF(cond, a, b)
pub fn select(cond: &[bool], a: &[f64], b: &[f64]) -> Vec<f64> {
    cond.iter()
        .zip(a.iter().zip(b))
        .map(|(&c, (&x, &y))| if c { x } else { y })
        .collect()
}

/// MAX(x, c) elementwise against a scalar.
pub fn max_with(x: &[f64], c: f64) -> Vec<f64> {
    x.iter().map(|&v| v.max(c)).collect()
}

/// MIN(x, c) elementwise against a scalar.
pub fn min_with(x: &[f64], c: f64) -> Vec<f64> {
    x.iter().map(|&v| v.min(c)).collect()
}

/// Elementwise binary operation over two aligned series.
pub fn zip_with(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// Elementwise num/den, substituting `neutral` for a zero denominator or a
/// non-finite quotient.
pub fn ratio(num: &[f64], den: &[f64], neutral: f64) -> Vec<f64> {
    zip_with(num, den, |n, d| safe_div(n, d, neutral))
}

pub fn safe_div(num: f64, den: f64, neutral: f64) -> f64 {
    if den == 0.0 {
        return neutral;
    }
    let q = num / den;
    if q.is_finite() { q } else { neutral }
}

/// Position of `x` inside the trailing [LLV(low), HHV(high)] band scaled to
/// `scale`, with `neutral` for a zero-width band.
pub fn band_position(
    x: &[f64],
    high: &[f64],
    low: &[f64],
    n: usize,
    scale: f64,
    neutral: f64,
) -> Vec<f64> {
    let hh = hhv(high, n);
    let ll = llv(low, n);
    (0..x.len())
        .map(|i| {
            let width = hh[i] - ll[i];
            if width == 0.0 {
                return neutral;
            }
            let q = (x[i] - ll[i]) / width;
            if q.is_finite() { q * scale } else { neutral }
        })
        .collect()
}

/// COUNT(cond, n): number of true values in the trailing window.
pub fn count(cond: &[bool], n: usize) -> Vec<usize> {
    (0..cond.len())
        .map(|i| cond[window_start(i, n)..=i].iter().filter(|&&c| c).count())
        .collect()
}

/// EVERY(cond, n): a full window of `n` bars exists and all of them are true.
pub fn every(cond: &[bool], n: usize) -> Vec<bool> {
    let n = n.max(1);
    count(cond, n)
        .into_iter()
        .enumerate()
        .map(|(i, c)| i + 1 >= n && c == n)
        .collect()
}

pub fn constant(value: f64, len: usize) -> Vec<f64> {
    vec![value; len]
}
