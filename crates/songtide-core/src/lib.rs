//! songtide-core: Domain types for the songtide generative music toy

mod clock;
mod command;
mod config;
mod error;
pub mod euclidean;
pub mod fractal;
pub mod indispensability;
mod monster;
mod plugin;
pub mod scale;
mod sound;

pub use clock::{Clock, TimeSignature};
pub use command::{ClockCommand, MonsterCommand};
pub use config::Config;
pub use error::{Result, SongtideError};
pub use euclidean::{euclidean_rhythm, euclidean_rhythm_simple};
pub use fractal::{morse_thue_value, one_over_f};
pub use indispensability::{METRIC_LEVEL, pulse_weights, pulse_weights_with_level};
pub use monster::{Monster, MonsterKind, MonsterRepository, PluginParameter, SCHEDULE_EPSILON};
pub use plugin::{
    ConstantDurationPlugin, ConstantRestPlugin, DiatonicOctavePlugin, EuclideanRhythmPlugin,
    FractalDurationPlugin, FractalNotePlugin, MonsterPlugin, MultiplicativeOctavePlugin,
    OneOverFPlugin,
};
pub use scale::{Intervals, compute_scale};
pub use sound::{MonsterSoundEvent, Sound};
