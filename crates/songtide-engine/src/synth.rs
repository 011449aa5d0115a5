//! Synthesizer backend: an opaque MIDI sound renderer
//!
//! The engine only ever speaks note-on/note-off/program-change; timbre,
//! effects, and audio output belong to the external synthesizer process
//! on the other end of the MIDI port.

use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("MIDI output unavailable: {0}")]
    Init(#[from] midir::InitError),
    #[error("No MIDI output port matching '{0}'")]
    PortNotFound(String),
    #[error("Failed to open MIDI output port: {0}")]
    Connect(String),
    #[error("Failed to send MIDI message: {0}")]
    Send(#[from] midir::SendError),
}

/// The capability set the engine needs from a synthesizer
pub trait Synth {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError>;
    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError>;
    fn all_notes_off(&mut self, channel: u8) -> Result<(), SynthError>;
    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SynthError>;
}

/// Synthesizer reached over a MIDI output port
pub struct MidiSynth {
    connection: MidiOutputConnection,
}

impl MidiSynth {
    /// Open the first output port whose name contains `port_hint`
    ///
    /// The engine never enters its tick loop without a working backend.
    pub fn connect(port_hint: &str) -> Result<Self, SynthError> {
        let output = MidiOutput::new("songtide")?;

        let port = output
            .ports()
            .into_iter()
            .find(|port| {
                output
                    .port_name(port)
                    .map(|name| name.contains(port_hint))
                    .unwrap_or(false)
            })
            .ok_or_else(|| SynthError::PortNotFound(port_hint.to_string()))?;

        let port_name = output.port_name(&port).unwrap_or_default();
        let connection = output
            .connect(&port, "songtide-out")
            .map_err(|e| SynthError::Connect(e.to_string()))?;

        info!(port = %port_name, "Connected to synthesizer");
        Ok(Self { connection })
    }
}

impl Synth for MidiSynth {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SynthError> {
        self.connection
            .send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])?;
        Ok(())
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), SynthError> {
        self.connection
            .send(&[0x80 | (channel & 0x0F), note & 0x7F, 0])?;
        Ok(())
    }

    fn all_notes_off(&mut self, channel: u8) -> Result<(), SynthError> {
        // CC 123: all notes off
        self.connection.send(&[0xB0 | (channel & 0x0F), 123, 0])?;
        Ok(())
    }

    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SynthError> {
        self.connection
            .send(&[0xC0 | (channel & 0x0F), program & 0x7F])?;
        Ok(())
    }
}
