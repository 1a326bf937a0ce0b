use thiserror::Error;

use crate::types::CheckerId;

/// Why an inbound stimulus was refused. A refused stimulus never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("game is already over")]
    GameOver,
    #[error("it is not the player's turn")]
    NotYourTurn,
    #[error("no active dice remain")]
    NoActiveDice,
    #[error("a checker on the bar must enter first")]
    MustEnterFromBar,
    #[error("illegal move from {from} to {to}")]
    IllegalDestination { from: u8, to: u8 },
    #[error("checker {0} is not on the board")]
    UnknownChecker(CheckerId),
    #[error("dice were already rolled")]
    AlreadyRolled,
    #[error("an active die can still be played")]
    DiceStillPlayable,
    #[error("dice must be rolled before passing")]
    MustRollFirst,
    #[error("player is closed out and must pass")]
    ClosedOut,
    #[error("a double is waiting for an answer")]
    OfferPending,
    #[error("no double has been offered")]
    NoOffer,
    #[error("doubling is not allowed now")]
    CannotDouble,
    #[error("cube is already at its maximum value")]
    CubeAtMaximum,
    #[error("no more history in that direction")]
    HistoryExhausted,
    #[error(transparent)]
    InvalidSnapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("expected {expected} points, got {actual}")]
    PointCount { expected: usize, actual: usize },
    #[error("player {player} has {count} checkers, expected 15")]
    CheckerCount { player: u8, count: usize },
    #[error("player {player} has a checker on point {point}, which belongs to the opponent")]
    OpponentPoint { player: u8, point: u8 },
    #[error("point {0} holds more than one checker of each player")]
    MixedPoint(u8),
    #[error("invalid cube value: {0}")]
    CubeValue(u8),
}

/// Failure decoding a persisted history blob.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid history magic (expected BGHS)")]
    Magic,
    #[error("unsupported history version: expected {expected}, got {actual}")]
    Version { expected: u32, actual: u32 },
    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Crc { expected: u32, actual: u32 },
    #[error("snapshot count mismatch: header says {header}, payload has {payload}")]
    Count { header: usize, payload: usize },
    #[error("history payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
