//! Scale construction and octave mapping

use serde::{Deserialize, Serialize};

/// Scale interval patterns (whole/half step sequences)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intervals {
    Major,
    Minor,
}

impl Intervals {
    /// Step intervals from one scale degree to the next
    pub fn steps(&self) -> &'static [i64] {
        match self {
            Self::Major => &[2, 2, 1, 2, 2, 2, 1],
            Self::Minor => &[2, 1, 2, 2, 1, 2, 2],
        }
    }
}

/// Compute a scale from a key and interval pattern
///
/// Returns the cumulative semitone offsets including the closing octave,
/// so a major scale on key 0 is `[0, 2, 4, 5, 7, 9, 11, 12]`.
pub fn compute_scale(key: i64, intervals: Intervals) -> Vec<i64> {
    let mut scale = vec![key];
    for step in intervals.steps() {
        scale.push(scale[scale.len() - 1] + step);
    }
    scale
}

/// Map a degree index into the scale, wrapping octaves
///
/// The octave cycles modulo `num_octaves`, so an ever-increasing index
/// sweeps up through the octaves and wraps back down.
pub fn octave_wrapped(scale: &[i64], num_octaves: i64, index: i64) -> i64 {
    let len = scale.len() as i64;
    let octave = (index / len) % num_octaves;
    let index = index % len;

    scale[index as usize] + 12 * octave
}

/// Map a degree index into the scale, saturating at the top octave
///
/// Indices past the range pin to the highest degree of the highest
/// octave instead of wrapping.
pub fn octave_clamped(scale: &[i64], num_octaves: i64, index: i64) -> i64 {
    let len = scale.len() as i64;
    let mut octave = index / len;
    let index = if octave >= num_octaves {
        octave = num_octaves - 1;
        len - 1
    } else {
        index % len
    };

    scale[index as usize] + 12 * octave
}
