//! Voice lifecycle tracking: in-flight notes awaiting release

use songtide_core::Sound;

use crate::synth::{Synth, SynthError};

/// The set of currently-sounding notes and their owners
#[derive(Debug, Default)]
pub struct VoiceTracker {
    voices: Vec<(u64, Sound)>,
}

impl VoiceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger a sound, scaling velocity by the bar's current pulse weight
    pub fn trigger<S: Synth>(
        &mut self,
        synth: &mut S,
        monster_id: u64,
        sound: Sound,
        current_bar: f64,
        pulse_weights: &[f64],
    ) -> Result<(), SynthError> {
        let velocity = sound.weighted_velocity(current_bar, pulse_weights);
        synth.note_on(sound.channel, sound.note, velocity)?;
        self.voices.push((monster_id, sound));
        Ok(())
    }

    /// Release every voice past its deadline, returning the owners' ids
    ///
    /// This is the sole mechanism releasing notes; there is no separate
    /// timer.
    pub fn release_finished<S: Synth>(
        &mut self,
        synth: &mut S,
        current_beat: f64,
    ) -> Result<Vec<u64>, SynthError> {
        let mut released = Vec::new();
        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].1.is_finished(current_beat) {
                let (monster_id, sound) = self.voices.swap_remove(index);
                synth.note_off(sound.channel, sound.note)?;
                released.push(monster_id);
            } else {
                index += 1;
            }
        }
        Ok(released)
    }

    /// Rescale every in-flight deadline after a tempo change
    pub fn rescale_tempo(&mut self, ratio: f64) {
        for (_, sound) in self.voices.iter_mut() {
            sound.rescale_tempo(ratio);
        }
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_sounding(&self, monster_id: u64) -> bool {
        self.voices.iter().any(|(id, _)| *id == monster_id)
    }
}
