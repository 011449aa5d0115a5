//! songtide: generative-music monsters on the command line
//!
//! Runs the synthesis engine on a background thread and drives it from a
//! small stdin console. The console keeps its own mirror of the monster
//! map; the two sides stay convergent only through the command channels.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossbeam_channel::{Sender, unbounded};
use songtide_core::{
    Clock, ClockCommand, Config, Monster, MonsterCommand, MonsterKind, MonsterRepository,
    TimeSignature,
};
use songtide_engine::{MidiSynth, SoundEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "songtide", about = "Generative-music monster toy")]
struct Args {
    /// Starting tempo in beats per minute
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,

    /// Starting time signature, e.g. 4/4 or 6/8
    #[arg(long, default_value = "4/4", value_parser = parse_signature)]
    signature: (u32, u32),

    /// MIDI output port name hint, overriding MIDI_PORT
    #[arg(long)]
    port: Option<String>,
}

fn parse_signature(raw: &str) -> Result<(u32, u32), String> {
    let (nominator, denominator) = raw
        .split_once('/')
        .ok_or_else(|| format!("expected N/D, got {raw}"))?;
    let nominator = nominator.parse().map_err(|_| "bad nominator".to_string())?;
    let denominator = denominator
        .parse()
        .map_err(|_| "bad denominator".to_string())?;
    Ok((nominator, denominator))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("songtide=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let port_hint = args.port.unwrap_or(config.midi_port);

    tracing::info!("Starting songtide");
    tracing::debug!(
        soundfont = %config.soundfont_path,
        driver = %config.audio_driver,
        sample_rate = config.sample_rate,
        "Expecting an external synthesizer with this audio setup"
    );

    let clock = Clock::new(args.bpm, TimeSignature::new(args.signature.0, args.signature.1)?)?;
    let synth = MidiSynth::connect(&port_hint)
        .with_context(|| format!("no MIDI synthesizer matching {port_hint:?}"))?;

    let (monster_tx, monster_rx) = unbounded();
    let (clock_tx, clock_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    let stop = Arc::new(AtomicBool::new(false));

    let engine = SoundEngine::new(synth, clock, monster_rx, clock_rx, event_tx, stop.clone());
    let engine_handle = thread::spawn(move || engine.run());

    // Voice notifications only feed visual feedback; log them.
    let event_handle = thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            tracing::debug!(monster_id = event.monster_id, on = event.on, "Voice");
        }
    });

    console(&monster_tx, &clock_tx)?;

    stop.store(true, Ordering::Relaxed);
    engine_handle
        .join()
        .map_err(|_| anyhow!("engine thread panicked"))?
        .context("engine failed")?;
    drop(monster_tx);
    event_handle
        .join()
        .map_err(|_| anyhow!("event thread panicked"))?;

    tracing::info!("Goodbye");
    Ok(())
}

const HELP: &str = "\
commands:
  add <foot|snare|echo|wisp> [x y]   place a monster (position in 0..1)
  rm <id>                            remove a monster
  move <id> <x> <y>                  reposition a monster
  mute <id> / unmute <id>            toggle a monster's output
  params <id>                        list a monster's parameters
  param <id> <index> <value>         set a parameter
  bpm <value>                        change tempo
  sig <n> <d>                        change time signature
  list                               list monsters
  quit                               stop";

/// Interactive console; returns when the user quits or stdin closes
fn console(
    monster_tx: &Sender<MonsterCommand>,
    clock_tx: &Sender<ClockCommand>,
) -> Result<()> {
    let mut repository = MonsterRepository::new();
    let stdin = io::stdin();

    println!("{HELP}");
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => return Ok(()),
            ["help"] => println!("{HELP}"),
            ["list"] => {
                for (id, monster) in repository.iter() {
                    let muted = if monster.is_muted() { " (muted)" } else { "" };
                    println!(
                        "  {id}: {} at {:.2},{:.2}{muted}",
                        monster.kind().name(),
                        monster.position().0,
                        monster.position().1,
                    );
                }
            }
            ["add", kind, rest @ ..] => match (parse_kind(kind), parse_position(rest)) {
                (Some(kind), Some(position)) => {
                    let id = repository.add_monster(Monster::new(kind, position));
                    monster_tx.send(MonsterCommand::Create { id, kind, position })?;
                    println!("  {id}: {}", kind.name());
                }
                _ => println!("  unknown monster kind or position"),
            },
            ["rm", id] => match id.parse::<u64>() {
                Ok(id) => {
                    if repository.remove_monster(id).is_some() {
                        monster_tx.send(MonsterCommand::Delete { id })?;
                    } else {
                        println!("  no such monster");
                    }
                }
                Err(_) => println!("  no such monster"),
            },
            ["move", id, x, y] => match (id.parse(), parse_position(&[*x, *y])) {
                (Ok(id), Some(position)) => {
                    if let Some(monster) = repository.get_mut(id) {
                        monster.change_position(position);
                        monster_tx.send(MonsterCommand::UpdatePosition { id, position })?;
                    } else {
                        println!("  no such monster");
                    }
                }
                _ => println!("  no such monster"),
            },
            ["mute", id] | ["unmute", id] => {
                let muted = words[0] == "mute";
                match id.parse() {
                    Ok(id) => {
                        if let Some(monster) = repository.get_mut(id) {
                            monster.set_muted(muted);
                            monster_tx.send(MonsterCommand::UpdateMuted { id, muted })?;
                        } else {
                            println!("  no such monster");
                        }
                    }
                    _ => println!("  no such monster"),
                }
            }
            ["params", id] => match id.parse::<u64>() {
                Ok(id) => match repository.get(id) {
                    Some(monster) => {
                        for (index, parameter) in monster.parameters().iter().enumerate() {
                            println!(
                                "  {index}: {} = {:.3} [{}..{} step {}]",
                                parameter.name,
                                monster.parameter_value(index).unwrap_or(0.0),
                                parameter.min,
                                parameter.max,
                                parameter.step,
                            );
                        }
                    }
                    None => println!("  no such monster"),
                },
                Err(_) => println!("  no such monster"),
            },
            ["param", id, index, value] => {
                match (id.parse(), index.parse(), value.parse()) {
                    (Ok(id), Ok(parameter_index), Ok(value))
                        if repository.get(id).is_some() =>
                    {
                        let known = repository
                            .get_mut(id)
                            .is_some_and(|monster| monster.set_parameter(parameter_index, value));
                        if known {
                            monster_tx.send(MonsterCommand::UpdatePluginParameter {
                                id,
                                parameter_index,
                                value,
                            })?;
                        } else {
                            println!("  no such parameter");
                        }
                    }
                    _ => println!("  no such monster or bad value"),
                }
            }
            ["bpm", value] => match value.parse() {
                Ok(bpm) if bpm > 0.0 => clock_tx.send(ClockCommand::UpdateBpm { bpm })?,
                _ => println!("  bad tempo"),
            },
            ["sig", nominator, denominator] => {
                match (nominator.parse(), denominator.parse()) {
                    (Ok(nominator), Ok(denominator)) => clock_tx.send(
                        ClockCommand::UpdateSignature {
                            nominator,
                            denominator,
                        },
                    )?,
                    _ => println!("  bad signature"),
                }
            }
            _ => println!("  unrecognized; try `help`"),
        }
    }
}

fn parse_kind(raw: &str) -> Option<MonsterKind> {
    match raw {
        "foot" | "thumpfoot" => Some(MonsterKind::ThumpFoot),
        "snare" | "rattlesnare" => Some(MonsterKind::RattleSnare),
        "echo" | "etherealecho" => Some(MonsterKind::EtherealEcho),
        "wisp" | "hummingwisp" => Some(MonsterKind::HummingWisp),
        _ => None,
    }
}

/// Parse an optional `x y` pair, defaulting to the field's center
fn parse_position(words: &[&str]) -> Option<(f64, f64)> {
    match words {
        [] => Some((0.5, 0.5)),
        [x, y] => {
            let x: f64 = x.parse().ok()?;
            let y: f64 = y.parse().ok()?;
            Some((x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
        }
        _ => None,
    }
}
