//! Transport-agnostic messages. The wire shape is `{"type": ..., "data": ...}`.

use serde::{Deserialize, Serialize};

use crate::dice::Die;
use crate::types::{CheckerId, CubeSnapshot, GameResult, Player, Resignation, Snapshot, Turn};

fn one_step() -> usize {
    1
}

/// Stimuli the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Inbound {
    Roll {
        player: Player,
    },
    Move {
        checker: CheckerId,
        point: u8,
    },
    Pass {
        player: Player,
    },
    Resign {
        player: Player,
    },
    Double {
        player: Player,
    },
    AcceptDouble,
    #[serde(alias = "cancel_double")]
    DeclineDouble,
    SetTurn {
        turn: Turn,
        #[serde(default)]
        resign: Resignation,
    },
    LoadPosition(Snapshot),
    /// Mirrors a peer's dice verbatim.
    SetDice {
        player: Player,
        dice: [Die; 4],
    },
    /// Mirrors a peer's cube verbatim.
    SetCube(CubeSnapshot),
    NewGame,
    /// `steps == 0` rewinds to the oldest snapshot.
    Back {
        #[serde(default = "one_step")]
        steps: usize,
    },
    Forward {
        #[serde(default = "one_step")]
        steps: usize,
    },
}

impl Inbound {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Kind name as it appears in the `type` field, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Roll { .. } => "roll",
            Inbound::Move { .. } => "move",
            Inbound::Pass { .. } => "pass",
            Inbound::Resign { .. } => "resign",
            Inbound::Double { .. } => "double",
            Inbound::AcceptDouble => "accept_double",
            Inbound::DeclineDouble => "decline_double",
            Inbound::SetTurn { .. } => "set_turn",
            Inbound::LoadPosition(_) => "load_position",
            Inbound::SetDice { .. } => "set_dice",
            Inbound::SetCube(_) => "set_cube",
            Inbound::NewGame => "new_game",
            Inbound::Back { .. } => "back",
            Inbound::Forward { .. } => "forward",
        }
    }
}

/// State deltas for rendering and relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outbound {
    CheckerMoved {
        checker: CheckerId,
        point: u8,
        slot: usize,
    },
    DiceSet {
        player: Player,
        dice: [Die; 4],
        rolled: bool,
    },
    CubeSet(CubeSnapshot),
    TurnChanged {
        turn: Turn,
        resign: Resignation,
    },
    GameFinished {
        result: GameResult,
        score: [u32; 2],
    },
    /// Whole-position replacement (load, new game, history navigation).
    PositionLoaded(Snapshot),
}
