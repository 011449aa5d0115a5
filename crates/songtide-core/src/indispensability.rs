//! Barlow metric indispensability (per-pulse accent weighting)
//!
//! Computes how dispensable each pulse of a bar is to the perception of
//! the meter. The bar's pulse count is factorized into primes (time
//! signature nominator plus the subdivision primes below it) and each
//! pulse gets a weighted sum of "basic indispensabilities" across the
//! factorization levels. The result is the familiar nested accent
//! hierarchy: in 4/4 the downbeat is strongest, beat 3 next, and so on
//! down to the weakest sixteenth.

/// Metric resolution: the finest subdivision of a whole note considered.
pub const METRIC_LEVEL: u32 = 16;

/// Prime factors of `n` in ascending order
pub fn prime_factors(mut n: i64) -> Vec<i64> {
    let mut i = 2;
    let mut factors = Vec::new();
    while i * i <= n {
        if n % i != 0 {
            i += 1;
        } else {
            n /= i;
            factors.push(i);
        }
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Prime factors of a time signature at the given metric resolution
fn time_signature_factors(nominator: u32, denominator: u32, metric_level: u32) -> Vec<i64> {
    let subdivisions = (metric_level / denominator) as i64;

    let mut factors = prime_factors(nominator as i64);
    factors.extend(prime_factors(subdivisions));
    factors
}

/// Per-pulse weights for a bar of the given time signature
///
/// One weight per pulse at [`METRIC_LEVEL`] resolution, normalized to
/// [0.7, 1.0] so metrically strong pulses are emphasized without fully
/// silencing weak ones. The downbeat always carries weight 1.0.
pub fn pulse_weights(nominator: u32, denominator: u32) -> Vec<f64> {
    pulse_weights_with_level(nominator, denominator, METRIC_LEVEL)
}

/// [`pulse_weights`] at an explicit metric resolution
pub fn pulse_weights_with_level(
    nominator: u32,
    denominator: u32,
    metric_level: u32,
) -> Vec<f64> {
    let pulses = (metric_level / denominator * nominator) as i64;
    if pulses <= 1 {
        return vec![1.0];
    }

    let mut primes = vec![1];
    primes.extend(time_signature_factors(nominator, denominator, metric_level));
    primes.push(1);

    let max_value = (pulses - 1) as f64;
    (1..=pulses)
        .map(|pulse| indispensability(pulse, &primes) as f64 / max_value * 0.3 + 0.7)
        .collect()
}

/// Indispensability of a pulse against a bracketed prime factorization
///
/// `primes` is the factor list bracketed by sentinel 1s. The formula is
/// Barlow's: a sum over factorization levels of stride products times the
/// basic indispensability of a transformed pulse index. Pure integer
/// arithmetic; negative pulse offsets wrap Euclidean-style.
pub fn indispensability(pulse: i64, primes: &[i64]) -> i64 {
    let z = primes.len() as i64 - 2;
    let top: i64 = primes[1..=z as usize].iter().product();

    let mut sum = 0;
    for r in 0..z {
        let bot: i64 = (0..=r).map(|k| primes[(z + 1 - k) as usize]).product();
        let mult: i64 = primes[..(z - r) as usize].iter().product();
        let modulo = primes[(z - r) as usize];

        let mut temp = 1 + (pulse - 2).rem_euclid(top) / bot;
        temp %= modulo;
        temp += 1;

        sum += mult * basic_indispensability(temp, primes[(z - r) as usize]);
    }

    sum
}

fn w(x: i64) -> i64 {
    if x == 0 { 0 } else { 1 }
}

/// Basic indispensability of a pulse for a single prime
///
/// Closed-form for primes up to 3; larger primes recurse through
/// [`indispensability`] on the reversed factorization of `prime - 1`.
pub fn basic_indispensability(pulse: i64, prime: i64) -> i64 {
    if prime <= 3 {
        return (prime + pulse - 2).rem_euclid(prime);
    }

    let new_pulse = pulse - 1 + w(prime - pulse);
    let mut factors = prime_factors(prime - 1);
    factors.reverse();

    let mut primes = vec![1];
    primes.extend(factors);
    primes.push(1);

    let q = indispensability(new_pulse, &primes);
    let quarter = prime / 4;

    (q + w(q / quarter)) * w(prime - pulse - 1) + quarter * (1 - w(prime - pulse - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_weights(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_prime_factors() {
        assert_eq!(prime_factors(1), Vec::<i64>::new());
        assert_eq!(prime_factors(4), vec![2, 2]);
        assert_eq!(prime_factors(6), vec![2, 3]);
        assert_eq!(prime_factors(13), vec![13]);
    }

    #[test]
    fn test_four_four() {
        let weights = pulse_weights(4, 4);
        assert_weights(
            &weights,
            &[
                1.0, 0.7, 0.86, 0.78, 0.94, 0.74, 0.9, 0.82, 0.98, 0.72, 0.88, 0.8, 0.96,
                0.76, 0.92, 0.84,
            ],
        );

        // Downbeat is the strongest pulse of the bar.
        assert!(weights.iter().skip(1).all(|&x| x < weights[0]));
    }

    #[test]
    fn test_four_four_at_beat_resolution() {
        // At metric level 4 a 4/4 bar has one pulse per beat: the classic
        // strong / weak / medium / weak shape.
        let weights = pulse_weights_with_level(4, 4, 4);
        assert_weights(&weights, &[1.0, 0.7, 0.9, 0.8]);
    }

    #[test]
    fn test_three_four() {
        let weights = pulse_weights(3, 4);
        assert_weights(
            &weights,
            &[
                1.0,
                0.7,
                0.863636363636,
                0.781818181818,
                0.945454545455,
                0.727272727273,
                0.890909090909,
                0.809090909091,
                0.972727272727,
                0.754545454545,
                0.918181818182,
                0.836363636364,
            ],
        );
    }

    #[test]
    fn test_six_eight() {
        let weights = pulse_weights(6, 8);
        assert_eq!(weights.len(), 12);
        assert!((weights[0] - 1.0).abs() < 1e-9);
        // Second strongest pulse is the mid-bar division.
        assert!((weights[6] - 0.972727272727).abs() < 1e-9);
        assert!(weights.iter().all(|&x| (0.7..=1.0).contains(&x)));
    }

    #[test]
    fn test_bounds_across_signatures() {
        for (nominator, denominator) in [(2, 4), (3, 4), (4, 4), (5, 4), (6, 8), (7, 8), (9, 8)] {
            let weights = pulse_weights(nominator, denominator);
            assert_eq!(
                weights.len(),
                (METRIC_LEVEL / denominator * nominator) as usize
            );
            assert!(weights.iter().all(|&x| (0.7..=1.0).contains(&x)));
            assert!((weights[0] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_pulse_degenerates() {
        assert_eq!(pulse_weights(1, 16), vec![1.0]);
    }
}
