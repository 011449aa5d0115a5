//! Synthesis engine loop
//!
//! Owns the authoritative monster map and the clock. Each pass drains
//! the command channels, lets every monster pre-generate its next sound,
//! releases voices past their deadline and triggers the ones whose beat
//! has arrived. Voice on/off notifications flow back to the front-end
//! over the event channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use songtide_core::{Clock, ClockCommand, Monster, MonsterCommand, MonsterSoundEvent};
use thiserror::Error;
use tracing::{info, warn};

use crate::synth::{Synth, SynthError};
use crate::voices::VoiceTracker;

/// Pause between scheduling passes
const LOOP_INTERVAL: Duration = Duration::from_micros(500);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// The synthesis half of the application
///
/// Runs on its own thread; all interaction happens over the channels
/// passed at construction, plus the shared stop flag.
pub struct SoundEngine<S: Synth> {
    synth: S,
    clock: Clock,
    monsters: HashMap<u64, Monster>,
    voices: VoiceTracker,
    monster_rx: Receiver<MonsterCommand>,
    clock_rx: Receiver<ClockCommand>,
    event_tx: Sender<MonsterSoundEvent>,
    stop: Arc<AtomicBool>,
}

impl<S: Synth> SoundEngine<S> {
    pub fn new(
        synth: S,
        clock: Clock,
        monster_rx: Receiver<MonsterCommand>,
        clock_rx: Receiver<ClockCommand>,
        event_tx: Sender<MonsterSoundEvent>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            synth,
            clock,
            monsters: HashMap::new(),
            voices: VoiceTracker::new(),
            monster_rx,
            clock_rx,
            event_tx,
            stop,
        }
    }

    /// Run until the stop flag is raised, then silence every channel
    pub fn run(mut self) -> Result<(), EngineError> {
        info!(bpm = self.clock.bpm(), "Synthesis engine running");
        loop {
            self.clock.tick();
            self.process()?;
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(LOOP_INTERVAL);
        }
        self.shutdown()
    }

    /// One scheduling pass at the clock's current position
    fn process(&mut self) -> Result<(), EngineError> {
        self.drain_monster_commands()?;
        self.drain_clock_commands();

        let current_beat = self.clock.current_beat();
        for monster in self.monsters.values_mut() {
            monster.generate_next_sound(current_beat);
        }

        for monster_id in self.voices.release_finished(&mut self.synth, current_beat)? {
            self.event_tx
                .send(MonsterSoundEvent {
                    monster_id,
                    on: false,
                })
                .ok();
        }

        let current_bar = self.clock.current_bar();
        for (&monster_id, monster) in self.monsters.iter_mut() {
            if let Some(sound) = monster.make_sound(current_beat) {
                self.voices.trigger(
                    &mut self.synth,
                    monster_id,
                    sound,
                    current_bar,
                    self.clock.pulse_weights(),
                )?;
                self.event_tx
                    .send(MonsterSoundEvent { monster_id, on: true })
                    .ok();
            }
        }

        Ok(())
    }

    fn drain_monster_commands(&mut self) -> Result<(), EngineError> {
        while let Ok(command) = self.monster_rx.try_recv() {
            // A create also claims the monster's instrument on its channel.
            if let MonsterCommand::Create { kind, .. } = &command {
                self.synth.program_change(kind.channel(), kind.program())?;
            }
            if let Err(error) = command.apply(&mut self.monsters) {
                warn!(%error, "Dropping stale monster command");
            }
        }
        Ok(())
    }

    fn drain_clock_commands(&mut self) {
        while let Ok(command) = self.clock_rx.try_recv() {
            match command {
                ClockCommand::UpdateBpm { bpm } => {
                    let old_bpm = self.clock.bpm();
                    match self.clock.change_bpm(bpm) {
                        Ok(()) => {
                            // Keep already-scheduled beats at their wall-clock
                            // instants under the new tempo.
                            let ratio = old_bpm / bpm;
                            self.voices.rescale_tempo(ratio);
                            for monster in self.monsters.values_mut() {
                                monster.rescale_tempo(ratio);
                            }
                            info!(bpm, "Tempo changed");
                        }
                        Err(error) => warn!(%error, "Rejected tempo change"),
                    }
                }
                ClockCommand::UpdateSignature {
                    nominator,
                    denominator,
                } => match self.clock.change_signature(nominator, denominator) {
                    Ok(()) => info!(nominator, denominator, "Time signature changed"),
                    Err(error) => warn!(%error, "Rejected time signature change"),
                },
            }
        }
    }

    /// Release everything, including notes a crashed front-end left behind
    fn shutdown(&mut self) -> Result<(), EngineError> {
        for channel in 0..16 {
            self.synth.all_notes_off(channel)?;
        }
        info!("Synthesis engine stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use songtide_core::{MonsterKind, TimeSignature};

    fn test_engine() -> (
        SoundEngine<crate::synth::testing::RecordingSynth>,
        Sender<MonsterCommand>,
        Sender<ClockCommand>,
        Receiver<MonsterSoundEvent>,
    ) {
        let (monster_tx, monster_rx) = unbounded();
        let (clock_tx, clock_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let clock = Clock::new(120.0, TimeSignature::default()).unwrap();
        let engine = SoundEngine::new(
            crate::synth::testing::RecordingSynth::default(),
            clock,
            monster_rx,
            clock_rx,
            event_tx,
            Arc::new(AtomicBool::new(false)),
        );
        (engine, monster_tx, clock_tx, event_rx)
    }

    #[test]
    fn test_create_claims_instrument() {
        let (mut engine, monster_tx, _clock_tx, _event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Create {
                id: 0,
                kind: MonsterKind::ThumpFoot,
                position: (0.5, 0.5),
            })
            .unwrap();

        engine.process().unwrap();

        assert_eq!(engine.synth.programs, vec![(2, 116)]);
        assert_eq!(engine.monsters.len(), 1);
    }

    #[test]
    fn test_stale_command_does_not_stop_the_loop() {
        let (mut engine, monster_tx, _clock_tx, _event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Delete { id: 42 })
            .unwrap();

        engine.process().unwrap();

        assert!(engine.monsters.is_empty());
    }

    #[test]
    fn test_monster_plays_after_its_first_whole_beat() {
        let (mut engine, monster_tx, _clock_tx, event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Create {
                id: 0,
                kind: MonsterKind::ThumpFoot,
                position: (0.5, 0.5),
            })
            .unwrap();

        // Joining at beat 0.0 schedules the first hit for beat 1.0 plus
        // the scheduling epsilon.
        engine.process().unwrap();
        assert!(engine.synth.note_ons.is_empty());

        engine.clock.advance(0.6); // 120 bpm: 1.2 beats
        engine.process().unwrap();

        assert_eq!(engine.synth.note_ons.len(), 1);
        assert_eq!(
            event_rx.try_recv(),
            Ok(MonsterSoundEvent {
                monster_id: 0,
                on: true
            })
        );
    }

    #[test]
    fn test_voice_released_and_reported() {
        let (mut engine, monster_tx, _clock_tx, event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Create {
                id: 0,
                kind: MonsterKind::ThumpFoot,
                position: (0.5, 0.5),
            })
            .unwrap();

        engine.process().unwrap();
        engine.clock.advance(0.6);
        engine.process().unwrap();
        assert_eq!(engine.voices.active_count(), 1);
        let _ = event_rx.try_recv();

        // The sixteenth triggered at beat 1.05 ends at beat 1.3.
        engine.clock.advance(0.15); // 120 bpm: 0.3 beats
        engine.process().unwrap();

        assert_eq!(engine.synth.note_offs.len(), 1);
        assert_eq!(engine.voices.active_count(), 0);
        assert_eq!(
            event_rx.try_recv(),
            Ok(MonsterSoundEvent {
                monster_id: 0,
                on: false
            })
        );
    }

    #[test]
    fn test_muted_monster_stays_silent_but_keeps_time() {
        let (mut engine, monster_tx, _clock_tx, _event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Create {
                id: 0,
                kind: MonsterKind::ThumpFoot,
                position: (0.5, 0.5),
            })
            .unwrap();
        monster_tx
            .send(MonsterCommand::UpdateMuted { id: 0, muted: true })
            .unwrap();

        engine.process().unwrap();
        for _ in 0..8 {
            engine.clock.advance(0.25);
            engine.process().unwrap();
        }

        assert!(engine.synth.note_ons.is_empty());

        // Unmuting picks up the schedule without a backlog of old notes.
        engine.monsters.get_mut(&0).unwrap().set_muted(false);
        engine.clock.advance(0.125);
        engine.process().unwrap();
        assert!(engine.synth.note_ons.len() <= 1);
    }

    #[test]
    fn test_tempo_change_rescales_everything_in_flight() {
        let (mut engine, monster_tx, clock_tx, _event_rx) = test_engine();
        monster_tx
            .send(MonsterCommand::Create {
                id: 0,
                kind: MonsterKind::HummingWisp,
                position: (0.5, 0.5),
            })
            .unwrap();

        engine.process().unwrap();
        engine.clock.advance(0.6);
        engine.process().unwrap();
        assert_eq!(engine.voices.active_count(), 1);

        clock_tx.send(ClockCommand::UpdateBpm { bpm: 60.0 }).unwrap();
        engine.process().unwrap();
        assert_eq!(engine.clock.bpm(), 60.0);

        // The in-flight voice spanned beats 1.05..2.05; halving the tempo
        // doubles those to 2.1..4.1 while the clock stays at beat 1.2.
        engine.clock.advance(2.8); // 60 bpm: 2.8 beats, to beat 4.0
        engine.process().unwrap();
        assert_eq!(engine.voices.active_count(), 1);

        engine.clock.advance(0.2);
        engine.process().unwrap();
        assert_eq!(engine.voices.active_count(), 0);
    }

    #[test]
    fn test_invalid_tempo_is_rejected_without_rescaling() {
        let (mut engine, _monster_tx, clock_tx, _event_rx) = test_engine();
        clock_tx.send(ClockCommand::UpdateBpm { bpm: 0.0 }).unwrap();
        engine.process().unwrap();
        assert_eq!(engine.clock.bpm(), 120.0);
    }

    #[test]
    fn test_shutdown_silences_all_channels() {
        let (mut engine, _monster_tx, _clock_tx, _event_rx) = test_engine();
        engine.shutdown().unwrap();
        assert_eq!(engine.synth.all_offs, (0..16).collect::<Vec<_>>());
    }
}
