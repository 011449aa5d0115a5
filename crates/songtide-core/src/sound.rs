//! Sound events exchanged with the synthesis backend

use serde::{Deserialize, Serialize};

/// A scheduled note, expressed in beats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// MIDI channel to play on
    pub channel: u8,
    /// MIDI note number (0-127)
    pub note: u8,
    /// Base velocity before pulse weighting (0-127)
    pub velocity: u8,
    /// Beat at which the note triggers
    pub init: f64,
    /// Length in beats
    pub duration: f64,
}

impl Sound {
    pub fn new(channel: u8, note: u8, velocity: u8, init: f64, duration: f64) -> Self {
        Self {
            channel,
            note,
            velocity,
            init,
            duration,
        }
    }

    /// The trigger deadline has been reached
    pub fn is_due(&self, current_beat: f64) -> bool {
        current_beat >= self.init
    }

    /// The release deadline has been reached
    pub fn is_finished(&self, current_beat: f64) -> bool {
        current_beat >= self.init + self.duration
    }

    /// Velocity scaled by the metric weight of the current pulse
    pub fn weighted_velocity(&self, current_bar: f64, pulse_weights: &[f64]) -> u8 {
        let num_pulses = pulse_weights.len();
        if num_pulses == 0 {
            return self.velocity;
        }
        let pulse = (current_bar * num_pulses as f64) as usize % num_pulses;
        (self.velocity as f64 * pulse_weights[pulse]) as u8
    }

    /// Rescale beat-domain timing after a tempo change
    ///
    /// `ratio` is `old_bpm / new_bpm`, preserving the wall-clock timing
    /// of the already-scheduled note.
    pub fn rescale_tempo(&mut self, ratio: f64) {
        self.init *= ratio;
        self.duration *= ratio;
    }
}

/// Voice on/off notification posted back to the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSoundEvent {
    pub monster_id: u64,
    pub on: bool,
}
