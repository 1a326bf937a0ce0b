use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dice::Die;

pub const CHECKERS_PER_PLAYER: usize = 15;
pub const CHECKER_COUNT: usize = CHECKERS_PER_PLAYER * 2;
pub const POINT_COUNT: usize = 28;

/// Off-board point of player 0 (borne-off checkers).
pub const HOME_0: u8 = 0;
/// Off-board point of player 1.
pub const HOME_1: u8 = 25;
pub const BAR_0: u8 = 26;
pub const BAR_1: u8 = 27;

/// One of the two sides. Serialized as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    Zero,
    One,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::Zero, Player::One];

    pub fn index(self) -> usize {
        match self {
            Player::Zero => 0,
            Player::One => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::Zero => Player::One,
            Player::One => Player::Zero,
        }
    }

    pub fn bar_point(self) -> u8 {
        match self {
            Player::Zero => BAR_0,
            Player::One => BAR_1,
        }
    }

    pub fn home_point(self) -> u8 {
        match self {
            Player::Zero => HOME_0,
            Player::One => HOME_1,
        }
    }

    /// Virtual point a bar checker starts counting from when it re-enters.
    pub fn entry_origin(self) -> i8 {
        match self {
            Player::Zero => 25,
            Player::One => 0,
        }
    }

    /// Player 0 counts down towards point 0, player 1 counts up towards 25.
    pub fn direction(self) -> i8 {
        match self {
            Player::Zero => -1,
            Player::One => 1,
        }
    }

    pub fn home_quadrant(self) -> RangeInclusive<u8> {
        match self {
            Player::Zero => 1..=6,
            Player::One => 19..=24,
        }
    }

    /// Pips a checker on `point` still has to travel.
    pub fn pip_distance(self, point: u8) -> u32 {
        if point == BAR_0 || point == BAR_1 {
            return 25;
        }
        let point = u32::from(point.min(25));
        match self {
            Player::Zero => point,
            Player::One => 25 - point,
        }
    }

    /// True when `point` lies farther from this player's home than `than`.
    pub fn is_farther(self, point: u8, than: u8) -> bool {
        match self {
            Player::Zero => point > than,
            Player::One => point < than,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Player::Zero),
            1 => Ok(Player::One),
            other => Err(format!("invalid player index: {other}")),
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        player.index() as u8
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player{}", self.index())
    }
}

/// Stable identity of one of the 30 checkers, written `p0NN` / `p1NN` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckerId(u8);

impl CheckerId {
    pub fn new(player: Player, index: usize) -> Option<Self> {
        if index >= CHECKERS_PER_PLAYER {
            return None;
        }
        Some(Self((player.index() * CHECKERS_PER_PLAYER + index) as u8))
    }

    pub fn owner(self) -> Player {
        if usize::from(self.0) < CHECKERS_PER_PLAYER {
            Player::Zero
        } else {
            Player::One
        }
    }

    /// Index within the owner's 15 checkers.
    pub fn index(self) -> usize {
        usize::from(self.0) % CHECKERS_PER_PLAYER
    }

    pub(crate) fn slot(self) -> usize {
        usize::from(self.0)
    }

    pub fn all(player: Player) -> impl Iterator<Item = CheckerId> {
        (0..CHECKERS_PER_PLAYER).filter_map(move |i| CheckerId::new(player, i))
    }
}

impl fmt::Display for CheckerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}{:02}", self.owner().index(), self.index())
    }
}

impl FromStr for CheckerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid checker id: {s:?}");
        let rest = s.strip_prefix('p').ok_or_else(invalid)?;
        if rest.len() != 3 || !rest.is_ascii() {
            return Err(invalid());
        }
        let player: u8 = rest[..1].parse().map_err(|_| invalid())?;
        let index: usize = rest[1..].parse().map_err(|_| invalid())?;
        let player = Player::try_from(player).map_err(|_| invalid())?;
        CheckerId::new(player, index).ok_or_else(invalid)
    }
}

impl TryFrom<String> for CheckerId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CheckerId> for String {
    fn from(id: CheckerId) -> Self {
        id.to_string()
    }
}

/// Whose move it is. Wire form: `-1` game over, `0`/`1` a player, `>= 2` opening roll.
/// Loading is lossy: any value below `-1` reads as game over and anything
/// above `2` is written back as `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum Turn {
    GameOver,
    Player(Player),
    OpeningRoll,
}

impl Turn {
    pub fn player(self) -> Option<Player> {
        match self {
            Turn::Player(player) => Some(player),
            Turn::GameOver | Turn::OpeningRoll => None,
        }
    }
}

impl From<i8> for Turn {
    fn from(value: i8) -> Self {
        match value {
            i8::MIN..=-1 => Turn::GameOver,
            0 => Turn::Player(Player::Zero),
            1 => Turn::Player(Player::One),
            _ => Turn::OpeningRoll,
        }
    }
}

impl From<Turn> for i8 {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::GameOver => -1,
            Turn::Player(player) => player.index() as i8,
            Turn::OpeningRoll => 2,
        }
    }
}

/// Wire form: `-1` nobody, otherwise the resigning player's index. Values other
/// than `0` and `1` read as nobody.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum Resignation {
    #[default]
    None,
    ResignedBy(Player),
}

impl From<i8> for Resignation {
    fn from(value: i8) -> Self {
        match value {
            0 => Resignation::ResignedBy(Player::Zero),
            1 => Resignation::ResignedBy(Player::One),
            _ => Resignation::None,
        }
    }
}

impl From<Resignation> for i8 {
    fn from(resign: Resignation) -> Self {
        match resign {
            Resignation::None => -1,
            Resignation::ResignedBy(player) => player.index() as i8,
        }
    }
}

/// Cube as stored in a snapshot. `owner == None` means centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeSnapshot {
    pub owner: Option<Player>,
    pub value: u8,
    pub accepted: bool,
}

/// Save/resume format and the payload of `load_position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: Turn,
    #[serde(default)]
    pub resign: Resignation,
    pub cube: CubeSnapshot,
    pub dice: [[Die; 4]; 2],
    /// 28 entries, each the owners of the checkers stacked there, bottom first.
    pub point: Vec<Vec<Player>>,
    #[serde(default)]
    pub game_num: u32,
    #[serde(default)]
    pub score: [u32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinKind {
    Single,
    Gammon,
    Backgammon,
    Resignation,
    DoubleDeclined,
}

/// Final result after game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Player,
    pub kind: WinKind,
    pub points: u32,
}

/// Which controls the presentation layer should enable for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Actions {
    pub can_roll: bool,
    pub can_pass: bool,
    pub can_double: bool,
    pub can_accept: bool,
    pub can_decline: bool,
}
