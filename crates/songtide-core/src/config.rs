//! Process-wide configuration, read once at startup
//!
//! An explicit struct handed into the engine and front-end entry points;
//! there is no global. Malformed values recover to defaults at this
//! boundary instead of propagating.

use std::env;

/// Startup configuration sourced from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Soundfont loaded by the external synthesizer
    pub soundfont_path: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Name hint for the MIDI output port to the synthesizer
    pub midi_port: String,
    /// Audio driver the synthesizer should use
    pub audio_driver: String,
    pub sample_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            soundfont_path: "soundfonts/EarthBound.sf2".to_string(),
            screen_width: 1280,
            screen_height: 700,
            midi_port: "FLUID".to_string(),
            audio_driver: "pipewire".to_string(),
            sample_rate: 48_000,
        }
    }
}

impl Config {
    /// Read configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            soundfont_path: env::var("SOUNDFONT_PATH").unwrap_or(defaults.soundfont_path),
            screen_width: parse_or("SCREEN_WIDTH", defaults.screen_width),
            screen_height: parse_or("SCREEN_HEIGHT", defaults.screen_height),
            midi_port: env::var("MIDI_PORT").unwrap_or(defaults.midi_port),
            audio_driver: env::var("AUDIO_DRIVER").unwrap_or(defaults.audio_driver),
            sample_rate: parse_or("SAMPLE_RATE", defaults.sample_rate),
        }
    }
}

fn parse_or(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.screen_width, 1280);
        assert_eq!(config.screen_height, 700);
    }
}
