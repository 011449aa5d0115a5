//! Euclidean rhythm generation (Bjorklund's algorithm)

/// Generate a Euclidean rhythm pattern with accents
///
/// # Arguments
/// * `steps` - Total number of steps in the pattern (e.g., 13)
/// * `hits` - Number of hits to distribute (clamped to `steps`)
/// * `accents` - Number of hits to promote to accents
/// * `rotation` - Rotate the pattern right by this many steps
/// * `accent_rotation` - Rotate the accent overlay right by this many hits
///
/// # Returns
/// Vec of step values where 0 = rest, 1 = hit, 2 = accented hit
///
/// # Example
/// ```
/// use songtide_core::euclidean_rhythm;
/// let pattern = euclidean_rhythm(8, 3, 0, 0, 0);
/// // Returns [1, 0, 0, 1, 0, 0, 1, 0]
/// ```
pub fn euclidean_rhythm(
    steps: usize,
    hits: usize,
    accents: usize,
    rotation: usize,
    accent_rotation: usize,
) -> Vec<u8> {
    let mut pattern = euclidean_rhythm_simple(steps, hits, rotation);

    if accents > 0 {
        let overlay = euclidean_rhythm_simple(hits.min(steps), accents, accent_rotation);
        let mut accent_index = 0;
        for value in pattern.iter_mut() {
            if *value == 1 {
                *value += overlay[accent_index];
                accent_index += 1;
            }
        }
    }

    pattern
}

/// Generate a plain Euclidean rhythm (no accents)
///
/// Hits are distributed maximally evenly among the steps via the
/// continued-fraction form of Bjorklund's algorithm. Rotation 0 places
/// the first hit at index 0; positive rotations shift the pattern right
/// (circular).
pub fn euclidean_rhythm_simple(steps: usize, hits: usize, rotation: usize) -> Vec<u8> {
    if steps == 0 {
        return vec![];
    }

    let hits = hits.min(steps);

    if hits == 0 {
        return vec![0; steps];
    }

    if hits == steps {
        return vec![1; steps];
    }

    // Continued-fraction bracketing: counts[i] repetitions at each level,
    // remainders[i] carrying the leftover group down one level.
    let mut counts: Vec<usize> = Vec::new();
    let mut remainders: Vec<usize> = vec![hits];
    let mut divisor = steps - hits;
    let mut level = 0;

    loop {
        counts.push(divisor / remainders[level]);
        remainders.push(divisor % remainders[level]);
        divisor = remainders[level];
        level += 1;
        if remainders[level] <= 1 {
            break;
        }
    }

    counts.push(divisor);

    let mut pattern: Vec<u8> = Vec::with_capacity(steps);
    build(level as isize, &counts, &remainders, &mut pattern);

    // Normalize so the first hit lands on index 0, then rotate right.
    let first_hit = pattern
        .iter()
        .position(|&v| v == 1)
        .unwrap_or(0);
    let split = (first_hit + steps - rotation % steps) % steps;
    pattern.rotate_left(split);

    pattern
}

fn build(level: isize, counts: &[usize], remainders: &[usize], pattern: &mut Vec<u8>) {
    match level {
        -1 => pattern.push(0),
        -2 => pattern.push(1),
        _ => {
            for _ in 0..counts[level as usize] {
                build(level - 1, counts, remainders, pattern);
            }
            if remainders[level as usize] != 0 {
                build(level - 2, counts, remainders, pattern);
            }
        }
    }
}
