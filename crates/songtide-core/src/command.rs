//! Replication commands between the front-end and the synthesis engine
//!
//! Each side owns its own copy of the monster map and clock; the copies
//! stay convergent only through these one-way, FIFO-ordered commands.
//! Payloads are primitive and serializable so the protocol can cross a
//! process boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongtideError};
use crate::monster::{Monster, MonsterKind};

/// A state change to replay against a monster map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonsterCommand {
    Create {
        id: u64,
        kind: MonsterKind,
        position: (f64, f64),
    },
    Delete {
        id: u64,
    },
    UpdatePosition {
        id: u64,
        position: (f64, f64),
    },
    UpdateMuted {
        id: u64,
        muted: bool,
    },
    UpdatePluginParameter {
        id: u64,
        parameter_index: usize,
        value: f64,
    },
}

impl MonsterCommand {
    /// Apply the command to an authoritative monster map
    ///
    /// A missing id is a recoverable race (an update overtaken by a
    /// delete): the command is reported and simply not applied.
    pub fn apply(self, monsters: &mut HashMap<u64, Monster>) -> Result<()> {
        match self {
            Self::Create { id, kind, position } => {
                monsters.insert(id, Monster::new(kind, position));
                Ok(())
            }
            Self::Delete { id } => {
                monsters
                    .remove(&id)
                    .map(|_| ())
                    .ok_or(SongtideError::MonsterNotFound(id))
            }
            Self::UpdatePosition { id, position } => {
                let monster = monsters
                    .get_mut(&id)
                    .ok_or(SongtideError::MonsterNotFound(id))?;
                monster.change_position(position);
                Ok(())
            }
            Self::UpdateMuted { id, muted } => {
                let monster = monsters
                    .get_mut(&id)
                    .ok_or(SongtideError::MonsterNotFound(id))?;
                monster.set_muted(muted);
                Ok(())
            }
            Self::UpdatePluginParameter {
                id,
                parameter_index,
                value,
            } => {
                let monster = monsters
                    .get_mut(&id)
                    .ok_or(SongtideError::MonsterNotFound(id))?;
                if !monster.set_parameter(parameter_index, value) {
                    return Err(SongtideError::ParameterNotFound(id, parameter_index));
                }
                Ok(())
            }
        }
    }
}

/// A state change to replay against the clock
///
/// Applied by the engine loop rather than the clock itself: a tempo
/// change must also rescale every in-flight sound and monster cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClockCommand {
    UpdateBpm { bpm: f64 },
    UpdateSignature { nominator: u32, denominator: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_apply_in_submission_order() {
        let mut monsters = HashMap::new();
        let queue = vec![
            MonsterCommand::Create {
                id: 1,
                kind: MonsterKind::ThumpFoot,
                position: (0.5, 0.5),
            },
            MonsterCommand::UpdateMuted { id: 1, muted: true },
        ];

        for command in queue {
            command.apply(&mut monsters).unwrap();
        }

        assert!(monsters[&1].is_muted());
    }

    #[test]
    fn test_stale_command_is_recoverable() {
        let mut monsters = HashMap::new();
        let result = MonsterCommand::UpdateMuted { id: 7, muted: true }.apply(&mut monsters);
        assert!(matches!(result, Err(SongtideError::MonsterNotFound(7))));
        assert!(monsters.is_empty());
    }

    #[test]
    fn test_update_position_rederives_mapping() {
        let mut monsters = HashMap::new();
        MonsterCommand::Create {
            id: 0,
            kind: MonsterKind::EtherealEcho,
            position: (0.0, 0.0),
        }
        .apply(&mut monsters)
        .unwrap();
        MonsterCommand::UpdatePosition {
            id: 0,
            position: (1.0, 1.0),
        }
        .apply(&mut monsters)
        .unwrap();
        assert_eq!(monsters[&0].position(), (1.0, 1.0));
    }
}
