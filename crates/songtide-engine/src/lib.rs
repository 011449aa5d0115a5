//! Synthesis engine: the sound-making half of songtide
//!
//! Hosts the authoritative monster map on its own thread and turns the
//! shared core's scheduling decisions into MIDI traffic.

pub mod engine;
pub mod synth;
pub mod voices;

pub use engine::{EngineError, SoundEngine};
pub use synth::{MidiSynth, Synth, SynthError};
pub use voices::VoiceTracker;
