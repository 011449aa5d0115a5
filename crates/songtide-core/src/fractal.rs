//! Fractal sequence generators (Morse-Thue digit sums, one-over-f noise)

/// Convert a number to its digits in the given base (most significant first)
///
/// Zero converts to `[0]`, so its digit sum is 0.
pub fn number_to_base(mut num: u64, base: u64) -> Vec<u64> {
    if num == 0 {
        return vec![0];
    }

    let mut digits = Vec::new();
    while num > 0 {
        digits.push(num % base);
        num /= base;
    }
    digits.reverse();
    digits
}

/// Sum of the digits of `num` written in `base`
pub fn sum_digits_base(num: u64, base: u64) -> u64 {
    number_to_base(num, base).iter().sum()
}

/// Morse-Thue value for a sequence counter
///
/// Computes `digit_sum(counter * multiplier, base)`. As the counter
/// increments this yields a bounded, deterministic sequence that never
/// settles into an obvious repeat — used as scale-degree offsets and
/// (modulo a maximum) as duration exponents.
pub fn morse_thue_value(counter: u64, base: u64, multiplier: u64) -> u64 {
    sum_digits_base(counter * multiplier, base)
}

/// One iteration of the logistic map `k * x * (1 - x)`
pub fn logistic_map(x: f64, k: f64) -> f64 {
    k * x * (1.0 - x)
}

/// One-over-f noise step
///
/// Advances the chaotic component via a fully-driven logistic map
/// (`r' = 4 r (1 - r)`) and blends it with the previous output:
/// `x' = x * n + sqrt(1 - n^2) * r'`. `n` in (0, 1) trades inertia
/// against chaotic surprise.
///
/// # Returns
/// `(next_x, next_logistic)`
pub fn one_over_f(x: f64, n: f64, prev_logistic: f64) -> (f64, f64) {
    let r = logistic_map(prev_logistic, 4.0);
    (x * n + (1.0 - n * n).sqrt() * r, r)
}
