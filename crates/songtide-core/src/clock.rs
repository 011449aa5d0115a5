//! Musical clock: wall-clock-driven beat/bar position

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongtideError};
use crate::indispensability::{METRIC_LEVEL, pulse_weights};

/// A validated time signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    nominator: u32,
    denominator: u32,
}

impl TimeSignature {
    /// Construct a time signature, failing fast on invalid input
    ///
    /// The denominator must be a power of two no finer than the metric
    /// resolution, so every bar has a whole number of pulses.
    pub fn new(nominator: u32, denominator: u32) -> Result<Self> {
        let valid = nominator >= 1
            && denominator >= 1
            && denominator.is_power_of_two()
            && METRIC_LEVEL % denominator == 0;
        if !valid {
            return Err(SongtideError::InvalidSignature(nominator, denominator));
        }
        Ok(Self {
            nominator,
            denominator,
        })
    }

    pub fn nominator(&self) -> u32 {
        self.nominator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Beats per bar, in quarter-note beats
    pub fn beats_per_bar(&self) -> f64 {
        self.nominator as f64 * 4.0 / self.denominator as f64
    }

    /// Pulses per bar at the metric resolution
    pub fn pulses(&self) -> u32 {
        METRIC_LEVEL / self.denominator * self.nominator
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            nominator: 4,
            denominator: 4,
        }
    }
}

/// Tracks beat and bar position at a given tempo
///
/// The clock only runs; pausing is a front-end rendering concept and
/// never reaches the synthesis side.
#[derive(Debug, Clone)]
pub struct Clock {
    bpm: f64,
    seconds_per_beat: f64,
    signature: TimeSignature,
    beats_per_bar: f64,
    pulse_weights: Vec<f64>,
    previous_time: Instant,
    current_beat: f64,
    current_bar: f64,
}

impl Clock {
    pub fn new(bpm: f64, signature: TimeSignature) -> Result<Self> {
        if !(bpm > 0.0) {
            return Err(SongtideError::InvalidBpm(bpm));
        }
        Ok(Self {
            bpm,
            seconds_per_beat: 60.0 / bpm,
            signature,
            beats_per_bar: signature.beats_per_bar(),
            pulse_weights: pulse_weights(signature.nominator(), signature.denominator()),
            previous_time: Instant::now(),
            current_beat: 0.0,
            current_bar: 0.0,
        })
    }

    /// Advance by the wall-clock time since the previous tick
    ///
    /// Called every iteration of the synthesis loop; never blocks.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;

        self.advance(delta);
        self.current_beat
    }

    /// Advance by an explicit wall-clock delta in seconds
    pub fn advance(&mut self, delta_seconds: f64) {
        let beats = delta_seconds / self.seconds_per_beat;
        self.current_beat += beats;
        self.current_bar += beats / self.beats_per_bar;
    }

    /// Change tempo without rescaling the current position
    ///
    /// A live performance continues from where it is. In-flight sounds
    /// and monster cursors are expressed in beats and must be rescaled
    /// by the caller with `old_bpm / new_bpm`.
    pub fn change_bpm(&mut self, bpm: f64) -> Result<()> {
        if !(bpm > 0.0) {
            return Err(SongtideError::InvalidBpm(bpm));
        }
        self.bpm = bpm;
        self.seconds_per_beat = 60.0 / bpm;
        Ok(())
    }

    /// Change the time signature, regenerating pulse weights
    ///
    /// `current_bar` is intentionally left alone.
    pub fn change_signature(&mut self, nominator: u32, denominator: u32) -> Result<()> {
        let signature = TimeSignature::new(nominator, denominator)?;
        self.signature = signature;
        self.beats_per_bar = signature.beats_per_bar();
        self.pulse_weights = pulse_weights(nominator, denominator);
        Ok(())
    }

    /// Bar number containing a beat position
    pub fn beat_to_bar(&self, beat: f64) -> f64 {
        (beat / self.beats_per_bar).floor()
    }

    /// Beats remaining until the next bar line
    pub fn remaining_beats_to_bar(&self, beat: f64) -> f64 {
        self.beats_per_bar - beat % self.beats_per_bar
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn current_beat(&self) -> f64 {
        self.current_beat
    }

    pub fn current_bar(&self) -> f64 {
        self.current_bar
    }

    pub fn pulse_weights(&self) -> &[f64] {
        &self.pulse_weights
    }
}
