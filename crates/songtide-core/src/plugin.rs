//! Monster plugins: the transform stages of a monster's sound pipeline
//!
//! Each stage has the contract `(note, duration, rest) -> (note, duration,
//! rest)`, reading and conditionally overwriting fields while leaving the
//! rest untouched. Order matters: a duration stage must run before the
//! rhythm stage that accumulates rests from it, and a raw note generator
//! before the octave stage that maps it onto a scale.

use serde::{Deserialize, Serialize};

use crate::euclidean::euclidean_rhythm;
use crate::fractal::{morse_thue_value, one_over_f};
use crate::scale::{Intervals, compute_scale, octave_clamped, octave_wrapped};

/// Enum wrapper for all monster plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MonsterPlugin {
    ConstantRest(ConstantRestPlugin),
    ConstantDuration(ConstantDurationPlugin),
    EuclideanRhythm(EuclideanRhythmPlugin),
    FractalNote(FractalNotePlugin),
    FractalDuration(FractalDurationPlugin),
    OneOverF(OneOverFPlugin),
    DiatonicOctave(DiatonicOctavePlugin),
    MultiplicativeOctave(MultiplicativeOctavePlugin),
}

impl MonsterPlugin {
    pub fn transform(&mut self, note: i64, duration: f64, rest: f64) -> (i64, f64, f64) {
        match self {
            Self::ConstantRest(p) => p.transform(note, duration, rest),
            Self::ConstantDuration(p) => p.transform(note, duration, rest),
            Self::EuclideanRhythm(p) => p.transform(note, duration, rest),
            Self::FractalNote(p) => p.transform(note, duration, rest),
            Self::FractalDuration(p) => p.transform(note, duration, rest),
            Self::OneOverF(p) => p.transform(note, duration, rest),
            Self::DiatonicOctave(p) => p.transform(note, duration, rest),
            Self::MultiplicativeOctave(p) => p.transform(note, duration, rest),
        }
    }

    /// Read a plugin parameter by local index
    pub fn param(&self, index: usize) -> Option<f64> {
        match self {
            Self::ConstantRest(p) => p.param(index),
            Self::ConstantDuration(p) => p.param(index),
            Self::EuclideanRhythm(p) => p.param(index),
            Self::FractalNote(p) => p.param(index),
            Self::FractalDuration(p) => p.param(index),
            Self::OneOverF(p) => p.param(index),
            Self::DiatonicOctave(p) => p.param(index),
            Self::MultiplicativeOctave(p) => p.param(index),
        }
    }

    /// Write a plugin parameter by local index
    pub fn set_param(&mut self, index: usize, value: f64) {
        match self {
            Self::ConstantRest(p) => p.set_param(index, value),
            Self::ConstantDuration(p) => p.set_param(index, value),
            Self::EuclideanRhythm(p) => p.set_param(index, value),
            Self::FractalNote(p) => p.set_param(index, value),
            Self::FractalDuration(p) => p.set_param(index, value),
            Self::OneOverF(p) => p.set_param(index, value),
            Self::DiatonicOctave(p) => p.set_param(index, value),
            Self::MultiplicativeOctave(p) => p.set_param(index, value),
        }
    }
}

// ============================================================================
// Constant rest / duration
// ============================================================================

/// Overwrites the rest with a fixed value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantRestPlugin {
    rest: f64,
}

impl ConstantRestPlugin {
    pub fn new(rest: f64) -> Self {
        Self { rest }
    }

    fn transform(&mut self, note: i64, duration: f64, _rest: f64) -> (i64, f64, f64) {
        (note, duration, self.rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        (index == 0).then_some(self.rest)
    }

    fn set_param(&mut self, index: usize, value: f64) {
        if index == 0 {
            self.rest = value;
        }
    }
}

/// Overwrites the duration with a fixed value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantDurationPlugin {
    duration: f64,
}

impl ConstantDurationPlugin {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    fn transform(&mut self, note: i64, _duration: f64, rest: f64) -> (i64, f64, f64) {
        (note, self.duration, rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        (index == 0).then_some(self.duration)
    }

    fn set_param(&mut self, index: usize, value: f64) {
        if index == 0 {
            self.duration = value;
        }
    }
}

// ============================================================================
// Euclidean rhythm
// ============================================================================

/// Walks a Euclidean rhythm, emitting hit values and accumulated rests
///
/// The note becomes the step value (1 or 2 for an accented hit) and the
/// rest becomes one incoming duration per skipped zero step, so the
/// rhythm stage must run after a duration stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuclideanRhythmPlugin {
    steps: usize,
    hits: usize,
    accents: usize,
    rotation: usize,
    accent_rotation: usize,
    rhythm: Vec<u8>,
    cursor: usize,
}

impl EuclideanRhythmPlugin {
    pub fn new(
        steps: usize,
        hits: usize,
        accents: usize,
        rotation: usize,
        accent_rotation: usize,
    ) -> Self {
        let rhythm = euclidean_rhythm(steps, hits, accents, rotation, accent_rotation);
        Self {
            steps,
            hits,
            accents,
            rotation,
            accent_rotation,
            rhythm,
            cursor: 0,
        }
    }

    /// Regenerate the pattern wholesale after any parameter change
    fn reset_rhythm(&mut self) {
        self.rhythm = euclidean_rhythm(
            self.steps,
            self.hits,
            self.accents,
            self.rotation,
            self.accent_rotation,
        );
        self.cursor %= self.steps.max(1);
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn rhythm(&self) -> &[u8] {
        &self.rhythm
    }

    fn transform(&mut self, _note: i64, duration: f64, _rest: f64) -> (i64, f64, f64) {
        if self.rhythm.iter().all(|&v| v == 0) {
            return (0, duration, 0.0);
        }

        // Skip to the next hit.
        while self.rhythm[self.cursor] == 0 {
            self.cursor = (self.cursor + 1) % self.steps;
        }

        let note = self.rhythm[self.cursor] as i64;

        // Accumulate one duration of rest per silent step that follows.
        self.cursor = (self.cursor + 1) % self.steps;
        let mut rest = 0.0;
        while self.rhythm[self.cursor] == 0 {
            rest += duration;
            self.cursor = (self.cursor + 1) % self.steps;
        }

        (note, duration, rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.steps as f64),
            1 => Some(self.hits as f64),
            2 => Some(self.accents as f64),
            3 => Some(self.rotation as f64),
            4 => Some(self.accent_rotation as f64),
            _ => None,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        let value = value.max(0.0) as usize;
        match index {
            0 => self.steps = value.max(1),
            1 => self.hits = value,
            2 => self.accents = value,
            3 => self.rotation = value,
            4 => self.accent_rotation = value,
            _ => return,
        }
        self.reset_rhythm();
    }
}

// ============================================================================
// Fractal note / duration
// ============================================================================

/// Morse-Thue scale-degree generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractalNotePlugin {
    base: u64,
    multiplier: u64,
    counter: u64,
}

impl FractalNotePlugin {
    pub fn new(base: u64, multiplier: u64) -> Self {
        Self {
            base,
            multiplier,
            counter: 0,
        }
    }

    fn transform(&mut self, _note: i64, duration: f64, rest: f64) -> (i64, f64, f64) {
        let note = morse_thue_value(self.counter, self.base, self.multiplier) as i64;
        self.counter += 1;
        (note, duration, rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.base as f64),
            1 => Some(self.multiplier as f64),
            _ => None,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        match index {
            0 => self.base = (value as u64).max(2),
            1 => self.multiplier = (value as u64).max(1),
            _ => {}
        }
    }
}

/// Morse-Thue duration generator
///
/// The sequence value becomes a halving exponent:
/// `duration = starting_duration / 2^(value mod max_duration)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractalDurationPlugin {
    base: u64,
    multiplier: u64,
    starting_duration: f64,
    max_duration: f64,
    counter: u64,
}

impl FractalDurationPlugin {
    pub fn new(base: u64, multiplier: u64, starting_duration: f64, max_duration: f64) -> Self {
        Self {
            base,
            multiplier,
            starting_duration,
            max_duration,
            counter: 0,
        }
    }

    fn transform(&mut self, note: i64, _duration: f64, rest: f64) -> (i64, f64, f64) {
        let value = morse_thue_value(self.counter, self.base, self.multiplier) as f64;
        let exponent = value % self.max_duration;
        let duration = self.starting_duration / exponent.exp2();
        self.counter += 1;
        (note, duration, rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.base as f64),
            1 => Some(self.multiplier as f64),
            2 => Some(self.starting_duration),
            3 => Some(self.max_duration),
            _ => None,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        match index {
            0 => self.base = (value as u64).max(2),
            1 => self.multiplier = (value as u64).max(1),
            2 => self.starting_duration = value.max(0.0),
            3 => self.max_duration = value.max(1.0),
            _ => {}
        }
    }
}

// ============================================================================
// One-over-f
// ============================================================================

/// Logistic-map-blended note generator
///
/// Smoothness (the original's "Cuteness") sets the inertia `n` of the
/// one-over-f blend; higher values give melodically smoother lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneOverFPlugin {
    smoothness: f64,
    value: f64,
    logistic: f64,
}

/// Degree span the blended value is spread over (two 8-degree octaves).
const ONE_OVER_F_SPAN: f64 = 16.0;

impl OneOverFPlugin {
    pub fn new(smoothness: f64) -> Self {
        Self {
            smoothness: smoothness.clamp(0.01, 0.99),
            value: 0.5,
            // Seeding the logistic iteration at 0.5 would collapse it to
            // zero after two steps; 0.4 keeps it chaotic.
            logistic: 0.4,
        }
    }

    fn transform(&mut self, _note: i64, duration: f64, rest: f64) -> (i64, f64, f64) {
        let (value, logistic) = one_over_f(self.value, self.smoothness, self.logistic);
        self.value = value;
        self.logistic = logistic;

        let note = (value.abs() * ONE_OVER_F_SPAN) as i64;
        (note, duration, rest)
    }

    fn param(&self, index: usize) -> Option<f64> {
        (index == 0).then_some(self.smoothness)
    }

    fn set_param(&mut self, index: usize, value: f64) {
        if index == 0 {
            self.smoothness = value.clamp(0.01, 0.99);
        }
    }
}

// ============================================================================
// Octave mapping
// ============================================================================

/// Maps a raw degree index onto a scale, cycling through octaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiatonicOctavePlugin {
    intervals: Intervals,
    scale: Vec<i64>,
    num_octaves: i64,
}

impl DiatonicOctavePlugin {
    pub fn new(intervals: Intervals, num_octaves: i64) -> Self {
        Self {
            intervals,
            scale: compute_scale(0, intervals),
            num_octaves: num_octaves.max(1),
        }
    }

    fn transform(&mut self, note: i64, duration: f64, rest: f64) -> (i64, f64, f64) {
        (
            octave_wrapped(&self.scale, self.num_octaves, note.max(0)),
            duration,
            rest,
        )
    }

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(match self.intervals {
                Intervals::Major => 0.0,
                Intervals::Minor => 1.0,
            }),
            1 => Some(self.num_octaves as f64),
            _ => None,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        match index {
            0 => {
                self.intervals = if value as i64 == 1 {
                    Intervals::Minor
                } else {
                    Intervals::Major
                };
                self.scale = compute_scale(0, self.intervals);
            }
            1 => self.num_octaves = (value as i64).max(1),
            _ => {}
        }
    }
}

/// Maps a raw degree index onto a scale, saturating at the top octave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplicativeOctavePlugin {
    intervals: Intervals,
    scale: Vec<i64>,
    num_octaves: i64,
}

impl MultiplicativeOctavePlugin {
    pub fn new(intervals: Intervals, num_octaves: i64) -> Self {
        Self {
            intervals,
            scale: compute_scale(0, intervals),
            num_octaves: num_octaves.max(1),
        }
    }

    fn transform(&mut self, note: i64, duration: f64, rest: f64) -> (i64, f64, f64) {
        (
            octave_clamped(&self.scale, self.num_octaves, note.max(0)),
            duration,
            rest,
        )
    }

    fn param(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(match self.intervals {
                Intervals::Major => 0.0,
                Intervals::Minor => 1.0,
            }),
            1 => Some(self.num_octaves as f64),
            _ => None,
        }
    }

    fn set_param(&mut self, index: usize, value: f64) {
        match index {
            0 => {
                self.intervals = if value as i64 == 1 {
                    Intervals::Minor
                } else {
                    Intervals::Major
                };
                self.scale = compute_scale(0, self.intervals);
            }
            1 => self.num_octaves = (value as i64).max(1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_plugins() {
        let mut duration = MonsterPlugin::ConstantDuration(ConstantDurationPlugin::new(0.25));
        let mut rest = MonsterPlugin::ConstantRest(ConstantRestPlugin::new(0.5));
        assert_eq!(duration.transform(3, 0.0, 0.0), (3, 0.25, 0.0));
        assert_eq!(rest.transform(3, 0.25, 0.0), (3, 0.25, 0.5));

        duration.set_param(0, 1.0);
        assert_eq!(duration.param(0), Some(1.0));
    }

    #[test]
    fn test_euclidean_plugin_cycle() {
        // E(13,5): hits at 0, 3, 5, 8, 10 -> rests of 2, 1, 2, 1, 2 steps
        let mut plugin = EuclideanRhythmPlugin::new(13, 5, 0, 0, 0);
        let mut outputs = Vec::new();
        for _ in 0..5 {
            outputs.push(plugin.transform(0, 0.25, 0.0));
        }
        assert_eq!(
            outputs,
            vec![
                (1, 0.25, 0.5),
                (1, 0.25, 0.25),
                (1, 0.25, 0.5),
                (1, 0.25, 0.25),
                (1, 0.25, 0.5),
            ]
        );
    }

    #[test]
    fn test_euclidean_plugin_accents() {
        let mut plugin = EuclideanRhythmPlugin::new(13, 5, 2, 0, 0);
        let notes: Vec<i64> = (0..5).map(|_| plugin.transform(0, 0.25, 0.0).0).collect();
        assert_eq!(notes, vec![2, 1, 2, 1, 1]);
    }

    #[test]
    fn test_euclidean_plugin_param_change_regenerates() {
        let mut plugin = EuclideanRhythmPlugin::new(13, 5, 0, 0, 0);
        plugin.set_param(0, 8.0);
        plugin.set_param(1, 3.0);
        assert_eq!(plugin.rhythm(), &[1, 0, 0, 1, 0, 0, 1, 0]);
        assert!(plugin.cursor < 8);
    }

    #[test]
    fn test_euclidean_plugin_all_rests_is_harmless() {
        let mut plugin = EuclideanRhythmPlugin::new(8, 3, 0, 0, 0);
        plugin.set_param(1, 0.0);
        assert_eq!(plugin.transform(0, 0.25, 0.0), (0, 0.25, 0.0));
    }

    #[test]
    fn test_fractal_note_sequence() {
        let mut plugin = FractalNotePlugin::new(3, 33);
        let notes: Vec<i64> = (0..5).map(|_| plugin.transform(0, 1.0, 0.0).0).collect();
        assert_eq!(notes, vec![0, 3, 4, 3, 6]);
    }

    #[test]
    fn test_fractal_duration_halving_law() {
        let mut plugin = FractalDurationPlugin::new(3, 33, 1.0, 3.0);
        // Morse-Thue(3, 33) starts 0, 3, 4 -> exponents 0, 0, 1
        let durations: Vec<f64> = (0..3).map(|_| plugin.transform(0, 0.0, 0.0).1).collect();
        assert_eq!(durations, vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_one_over_f_notes_in_range() {
        let mut plugin = OneOverFPlugin::new(0.8);
        for _ in 0..200 {
            let (note, _, _) = plugin.transform(0, 1.0, 0.0);
            assert!(note >= 0);
            assert!(note < 100);
        }
    }

    #[test]
    fn test_octave_plugins() {
        let mut wrapped = DiatonicOctavePlugin::new(Intervals::Major, 2);
        assert_eq!(wrapped.transform(9, 1.0, 0.0).0, 14);
        assert_eq!(wrapped.transform(16, 1.0, 0.0).0, 0);

        let mut clamped = MultiplicativeOctavePlugin::new(Intervals::Major, 2);
        assert_eq!(clamped.transform(40, 1.0, 0.0).0, 24);
    }
}
