//! Monsters: stateful sound-event schedulers bound to a screen position

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::plugin::{
    ConstantDurationPlugin, ConstantRestPlugin, DiatonicOctavePlugin, EuclideanRhythmPlugin,
    FractalDurationPlugin, FractalNotePlugin, MonsterPlugin, MultiplicativeOctavePlugin,
    OneOverFPlugin,
};
use crate::scale::Intervals;
use crate::sound::Sound;

/// Nudge applied to every scheduled trigger beat so a freshly generated
/// sound never ties with the tick that produced it.
pub const SCHEDULE_EPSILON: f64 = 0.05;

/// A UI-editable plugin parameter descriptor
///
/// Routes a monster-level parameter index to a slot in the plugin chain.
/// The value itself lives in the plugin.
#[derive(Debug, Clone)]
pub struct PluginParameter {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    plugin: usize,
    param: usize,
}

impl PluginParameter {
    fn new(name: &'static str, min: f64, max: f64, step: f64, plugin: usize, param: usize) -> Self {
        Self {
            name,
            min,
            max,
            step,
            plugin,
            param,
        }
    }
}

/// The closed set of monster types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterKind {
    /// Kick drum on a Euclidean grid
    ThumpFoot,
    /// Snare sibling of ThumpFoot
    RattleSnare,
    /// Long ambient notes from the Morse-Thue sequence
    EtherealEcho,
    /// Smooth one-over-f hum
    HummingWisp,
}

impl MonsterKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThumpFoot => "ThumpFoot",
            Self::RattleSnare => "RattleSnare",
            Self::EtherealEcho => "EtherealEcho",
            Self::HummingWisp => "HummingWisp",
        }
    }

    /// MIDI channel this kind plays on
    pub fn channel(&self) -> u8 {
        match self {
            Self::ThumpFoot => 2,
            Self::RattleSnare => 3,
            Self::EtherealEcho => 0,
            Self::HummingWisp => 1,
        }
    }

    /// Instrument program selected when a monster of this kind is created
    pub fn program(&self) -> u8 {
        match self {
            Self::ThumpFoot => 116,
            Self::RattleSnare => 118,
            Self::EtherealEcho => 32,
            Self::HummingWisp => 52,
        }
    }

    /// The fixed plugin chain encoding this kind's musical intent
    fn build_plugins(&self) -> Vec<MonsterPlugin> {
        match self {
            Self::ThumpFoot | Self::RattleSnare => vec![
                MonsterPlugin::ConstantDuration(ConstantDurationPlugin::new(0.25)),
                MonsterPlugin::EuclideanRhythm(EuclideanRhythmPlugin::new(13, 5, 2, 0, 0)),
            ],
            Self::EtherealEcho => vec![
                MonsterPlugin::FractalNote(FractalNotePlugin::new(3, 33)),
                MonsterPlugin::FractalDuration(FractalDurationPlugin::new(3, 33, 1.0, 3.0)),
                MonsterPlugin::ConstantRest(ConstantRestPlugin::new(0.0)),
                MonsterPlugin::DiatonicOctave(DiatonicOctavePlugin::new(Intervals::Major, 2)),
            ],
            Self::HummingWisp => vec![
                MonsterPlugin::ConstantDuration(ConstantDurationPlugin::new(1.0)),
                MonsterPlugin::ConstantRest(ConstantRestPlugin::new(0.5)),
                MonsterPlugin::OneOverF(OneOverFPlugin::new(0.8)),
                MonsterPlugin::MultiplicativeOctave(MultiplicativeOctavePlugin::new(
                    Intervals::Major,
                    3,
                )),
            ],
        }
    }

    /// UI-facing parameters, routed into the plugin chain
    fn build_parameters(&self) -> Vec<PluginParameter> {
        match self {
            Self::ThumpFoot | Self::RattleSnare => vec![
                PluginParameter::new("Jiveness", 0.0625, 1.0, 0.0625, 0, 0),
                PluginParameter::new("Recall", 1.0, 16.0, 1.0, 1, 0),
                PluginParameter::new("Footiness", 1.0, 16.0, 1.0, 1, 1),
                PluginParameter::new("Stompiness", 0.0, 16.0, 1.0, 1, 2),
                PluginParameter::new("Aloofness", 0.0, 16.0, 1.0, 1, 3),
            ],
            Self::EtherealEcho => vec![
                PluginParameter::new("Dreaminess", 2.0, 9.0, 1.0, 0, 0),
                PluginParameter::new("Weirdness", 1.0, 99.0, 1.0, 0, 1),
                PluginParameter::new("Languor", 0.25, 4.0, 0.25, 1, 2),
                PluginParameter::new("Patience", 0.0, 4.0, 0.25, 2, 0),
            ],
            Self::HummingWisp => vec![
                PluginParameter::new("Cuteness", 0.05, 0.95, 0.05, 2, 0),
                PluginParameter::new("Laziness", 0.25, 4.0, 0.25, 0, 0),
                PluginParameter::new("Patience", 0.0, 4.0, 0.25, 1, 0),
            ],
        }
    }
}

/// A monster on the field
///
/// State machine: uninitialized until its first clock contact, then
/// endlessly scheduling. `generate_next_sound` fills the pending slot by
/// running the plugin pipeline; `make_sound` hands the pending sound over
/// once its trigger beat arrives.
#[derive(Debug, Clone)]
pub struct Monster {
    kind: MonsterKind,
    position: (f64, f64),
    channel: u8,
    muted: bool,
    starting_value: i64,
    velocity: u8,
    plugins: Vec<MonsterPlugin>,
    parameters: Vec<PluginParameter>,
    pending: Option<Sound>,
    last_beat: f64,
    last_duration: f64,
    last_rest: f64,
    initialized: bool,
}

impl Monster {
    pub fn new(kind: MonsterKind, position: (f64, f64)) -> Self {
        let mut monster = Self {
            kind,
            position: (0.0, 0.0),
            channel: kind.channel(),
            muted: false,
            starting_value: 0,
            velocity: 0,
            plugins: kind.build_plugins(),
            parameters: kind.build_parameters(),
            pending: None,
            last_beat: 0.0,
            last_duration: 0.0,
            last_rest: 0.0,
            initialized: false,
        };
        monster.change_position(position);
        monster
    }

    pub fn kind(&self) -> MonsterKind {
        self.kind
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn parameters(&self) -> &[PluginParameter] {
        &self.parameters
    }

    /// Move the monster, rederiving its pitch offset and velocity
    ///
    /// Horizontal position picks the base pitch, vertical the loudness;
    /// both span MIDI values 20..=100.
    pub fn change_position(&mut self, position: (f64, f64)) {
        self.position = position;
        self.starting_value = (position.0 * 80.0) as i64 + 20;
        self.velocity = ((position.1 * 80.0) as i64 + 20).clamp(0, 127) as u8;
    }

    /// Current value of a UI parameter
    pub fn parameter_value(&self, index: usize) -> Option<f64> {
        let descriptor = self.parameters.get(index)?;
        self.plugins[descriptor.plugin].param(descriptor.param)
    }

    /// Set a UI parameter, clamping to its declared range
    ///
    /// Unknown indices are ignored: a stale update racing a parameter
    /// change must not take down the synthesis loop.
    pub fn set_parameter(&mut self, index: usize, value: f64) -> bool {
        let Some(descriptor) = self.parameters.get(index) else {
            return false;
        };
        let value = value.clamp(descriptor.min, descriptor.max);
        self.plugins[descriptor.plugin].set_param(descriptor.param, value);
        true
    }

    /// Join mid-performance on the next whole beat
    fn initialize(&mut self, current_beat: f64) {
        self.last_beat = current_beat.floor() + 1.0;
        self.initialized = true;
    }

    /// Pre-generate the next sound if the pending slot is free
    pub fn generate_next_sound(&mut self, current_beat: f64) {
        if self.pending.is_some() {
            return;
        }
        if !self.initialized {
            self.initialize(current_beat);
        }

        let mut note = 0i64;
        let mut duration = 0.0f64;
        let mut rest = 0.0f64;
        for plugin in self.plugins.iter_mut() {
            (note, duration, rest) = plugin.transform(note, duration, rest);
        }

        let next_beat = self.last_beat + self.last_duration + self.last_rest;
        self.pending = Some(self.finalize(note, duration, next_beat));

        self.last_beat = next_beat;
        self.last_duration = duration;
        self.last_rest = rest;
    }

    /// Map the pipeline's raw note into an absolute, position-anchored Sound
    fn finalize(&self, note: i64, duration: f64, next_beat: f64) -> Sound {
        let mut note = note;
        let mut velocity = self.velocity as i64;

        // Accented hits land harder and a third higher.
        if matches!(self.kind, MonsterKind::ThumpFoot | MonsterKind::RattleSnare) && note == 2 {
            note += 4;
            velocity += 20;
        }

        Sound::new(
            self.channel,
            (self.starting_value + note).clamp(0, 127) as u8,
            velocity.clamp(0, 127) as u8,
            next_beat + SCHEDULE_EPSILON,
            duration,
        )
    }

    /// Emit the pending sound once its trigger beat has arrived
    ///
    /// Muted monsters discard the expired sound instead, so their internal
    /// schedule keeps advancing and unmuting never releases a backlog.
    pub fn make_sound(&mut self, current_beat: f64) -> Option<Sound> {
        let pending = self.pending?;
        if !pending.is_due(current_beat) {
            return None;
        }

        self.pending = None;
        if self.muted { None } else { Some(pending) }
    }

    /// Rescale all beat-domain scheduling state after a tempo change
    pub fn rescale_tempo(&mut self, ratio: f64) {
        self.last_beat *= ratio;
        self.last_duration *= ratio;
        self.last_rest *= ratio;
        if let Some(pending) = &mut self.pending {
            pending.rescale_tempo(ratio);
        }
    }
}

/// Front-end-side monster store with id assignment
#[derive(Debug, Default)]
pub struct MonsterRepository {
    monsters: HashMap<u64, Monster>,
    next_id: u64,
}

impl MonsterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a monster, returning its assigned id
    pub fn add_monster(&mut self, monster: Monster) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.monsters.insert(id, monster);
        id
    }

    pub fn remove_monster(&mut self, id: u64) -> Option<Monster> {
        self.monsters.remove(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Monster> {
        self.monsters.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &Monster)> {
        self.monsters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_mapping() {
        let monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        assert_eq!(monster.starting_value, 60);
        assert_eq!(monster.velocity, 60);
        assert_eq!(monster.channel(), 2);
    }

    #[test]
    fn test_initialization_joins_next_whole_beat() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        monster.generate_next_sound(3.4);
        let sound = monster.pending.unwrap();
        assert!((sound.init - (4.0 + SCHEDULE_EPSILON)).abs() < 1e-9);
    }

    #[test]
    fn test_pending_not_regenerated_until_consumed() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        monster.generate_next_sound(0.0);
        let first = monster.pending.unwrap();
        monster.generate_next_sound(0.5);
        assert_eq!(monster.pending.unwrap(), first);
    }

    #[test]
    fn test_make_sound_waits_for_deadline() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        monster.generate_next_sound(0.0);
        assert!(monster.make_sound(0.5).is_none());
        assert!(monster.pending.is_some());
        let sound = monster.make_sound(1.1).unwrap();
        assert_eq!(sound.channel, 2);
        assert!(monster.pending.is_none());
    }

    #[test]
    fn test_muted_discards_but_keeps_scheduling() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        monster.set_muted(true);
        monster.generate_next_sound(0.0);
        assert!(monster.make_sound(1.1).is_none());
        // The deadline passed, so the pending slot was cleared.
        assert!(monster.pending.is_none());
        monster.generate_next_sound(1.1);
        assert!(monster.pending.is_some());
    }

    #[test]
    fn test_percussion_cycle_emits_five_hits() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        assert!(monster.set_parameter(3, 0.0)); // Stompiness = 0

        // One full 13-step cycle at 0.25 beats per step spans 3.25 beats.
        let mut sounds = Vec::new();
        let mut beat = 0.0;
        while beat < 1.0 + 3.25 {
            monster.generate_next_sound(beat);
            if let Some(sound) = monster.make_sound(beat) {
                sounds.push(sound);
            }
            beat += 0.01;
        }

        assert_eq!(sounds.len(), 5);
        assert!(sounds.iter().all(|s| s.channel == 2));
    }

    #[test]
    fn test_accent_boosts_velocity_and_pitch() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        // Default chain: E(13,5,2) starts on an accented hit.
        monster.generate_next_sound(0.0);
        let sound = monster.pending.unwrap();
        assert_eq!(sound.note, 60 + 2 + 4);
        assert_eq!(sound.velocity, 80);
    }

    #[test]
    fn test_parameter_routing_and_clamping() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        assert_eq!(monster.parameter_value(0), Some(0.25));
        assert!(monster.set_parameter(1, 99.0));
        assert_eq!(monster.parameter_value(1), Some(16.0));
        assert!(!monster.set_parameter(42, 1.0));
    }

    #[test]
    fn test_tempo_rescale_halves_schedule() {
        let mut monster = Monster::new(MonsterKind::ThumpFoot, (0.5, 0.5));
        monster.generate_next_sound(0.0);
        let before = monster.pending.unwrap();
        monster.rescale_tempo(0.5);
        let after = monster.pending.unwrap();
        assert!((after.init - before.init * 0.5).abs() < 1e-9);
        assert!((after.duration - before.duration * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_repository_assigns_increasing_ids() {
        let mut repository = MonsterRepository::new();
        let a = repository.add_monster(Monster::new(MonsterKind::ThumpFoot, (0.1, 0.1)));
        let b = repository.add_monster(Monster::new(MonsterKind::EtherealEcho, (0.9, 0.9)));
        assert_eq!((a, b), (0, 1));
        assert_eq!(repository.len(), 2);
        assert!(repository.remove_monster(a).is_some());
        assert!(repository.get(a).is_none());
        assert!(repository.get(b).is_some());
    }
}
