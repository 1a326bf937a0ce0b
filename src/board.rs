use crate::error::SnapshotError;
use crate::types::{CHECKER_COUNT, CHECKERS_PER_PLAYER, CheckerId, POINT_COUNT, Player};

/// Starting points for player 0. Player 1 uses the mirror image `25 - p`.
const INITIAL_POINTS: [(u8, usize); 4] = [(24, 2), (13, 5), (8, 3), (6, 5)];

/// Checker stacks for all 28 points plus the reverse index checker -> point.
///
/// Points 1..=24 are the playing points numbered from player 0's side,
/// 0 / 25 the borne-off trays and 26 / 27 the bars. The board never checks
/// legality; that is the rules engine's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    points: [Vec<CheckerId>; POINT_COUNT],
    location: [Option<u8>; CHECKER_COUNT],
}

impl Board {
    /// Creates the standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for player in Player::BOTH {
            let mut ids = CheckerId::all(player);
            for (point, count) in INITIAL_POINTS {
                let point = match player {
                    Player::Zero => point,
                    Player::One => 25 - point,
                };
                for id in ids.by_ref().take(count) {
                    board.add_checker(point, id);
                }
            }
        }
        board
    }

    /// A board with no checkers placed at all.
    pub fn empty() -> Self {
        Self {
            points: std::array::from_fn(|_| Vec::new()),
            location: [None; CHECKER_COUNT],
        }
    }

    /// Stack on `point`, bottom first. Out-of-range points are empty.
    pub fn checkers_at(&self, point: u8) -> &[CheckerId] {
        self.points
            .get(usize::from(point))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Puts `checker` on top of `point`, lifting it from wherever it was.
    /// Returns its slot index in the new stack.
    pub fn add_checker(&mut self, point: u8, checker: CheckerId) -> usize {
        if let Some(prev) = self.location[checker.slot()] {
            self.remove_checker(prev, checker);
        }
        let stack = &mut self.points[usize::from(point)];
        stack.push(checker);
        self.location[checker.slot()] = Some(point);
        stack.len() - 1
    }

    pub fn remove_checker(&mut self, point: u8, checker: CheckerId) -> bool {
        let Some(stack) = self.points.get_mut(usize::from(point)) else {
            return false;
        };
        let Some(pos) = stack.iter().position(|&c| c == checker) else {
            return false;
        };
        stack.remove(pos);
        self.location[checker.slot()] = None;
        true
    }

    pub fn point_of(&self, checker: CheckerId) -> Option<u8> {
        self.location[checker.slot()]
    }

    pub fn top(&self, point: u8) -> Option<CheckerId> {
        self.checkers_at(point).last().copied()
    }

    /// Topmost checker of `player` on `point`.
    pub fn top_of(&self, point: u8, player: Player) -> Option<CheckerId> {
        self.checkers_at(point)
            .iter()
            .rev()
            .find(|c| c.owner() == player)
            .copied()
    }

    pub fn count(&self, point: u8, player: Player) -> usize {
        self.checkers_at(point)
            .iter()
            .filter(|c| c.owner() == player)
            .count()
    }

    /// Two or more checkers, all the opponent's.
    pub fn is_blocked_for(&self, point: u8, player: Player) -> bool {
        let stack = self.checkers_at(point);
        stack.len() >= 2 && stack.iter().all(|c| c.owner() != player)
    }

    /// The lone opposing checker on `point`, if that is all there is.
    pub fn blot_for(&self, point: u8, player: Player) -> Option<CheckerId> {
        match self.checkers_at(point) {
            [only] if only.owner() != player => Some(*only),
            _ => None,
        }
    }

    pub fn on_bar(&self, player: Player) -> usize {
        self.count(player.bar_point(), player)
    }

    pub fn borne_off(&self, player: Player) -> usize {
        self.count(player.home_point(), player)
    }

    /// Points holding at least one of `player`'s checkers, bar first when occupied.
    pub fn occupied_by(&self, player: Player) -> Vec<u8> {
        let bar = player.bar_point();
        let mut out = Vec::new();
        if self.count(bar, player) > 0 {
            out.push(bar);
        }
        out.extend((1..=24).filter(|&p| self.count(p, player) > 0));
        out
    }

    /// Every checker of `player` is in the home quadrant or already borne off.
    pub fn all_home(&self, player: Player) -> bool {
        let quadrant = player.home_quadrant();
        CheckerId::all(player).all(|id| match self.point_of(id) {
            Some(p) => p == player.home_point() || quadrant.contains(&p),
            None => false,
        })
    }

    /// Any of `player`'s checkers on the board farther from home than `point`.
    pub fn has_checker_beyond(&self, player: Player, point: u8) -> bool {
        self.count(player.bar_point(), player) > 0
            || (1..=24).any(|p| player.is_farther(p, point) && self.count(p, player) > 0)
    }

    pub fn pip_count(&self, player: Player) -> u32 {
        CheckerId::all(player)
            .filter_map(|id| self.point_of(id))
            .map(|p| player.pip_distance(p))
            .sum()
    }

    /// `player` holds all six home points with two or more checkers each
    /// while the opponent has a checker waiting on the bar.
    pub fn closes_out(&self, player: Player) -> bool {
        let opponent = player.opponent();
        self.on_bar(opponent) > 0
            && player.home_quadrant().all(|p| {
                let stack = self.checkers_at(p);
                stack.len() >= 2 && stack.iter().all(|c| c.owner() == player)
            })
    }

    /// Owner ids per point, bottom of the stack first.
    pub fn to_point_array(&self) -> Vec<Vec<Player>> {
        self.points
            .iter()
            .map(|stack| stack.iter().map(|c| c.owner()).collect())
            .collect()
    }

    /// Rebuilds a board from owner lists. Checker ids are handed out per player
    /// in point order, so equal occupancy always yields an equal board.
    pub fn from_point_array(points: &[Vec<Player>]) -> Result<Self, SnapshotError> {
        if points.len() != POINT_COUNT {
            return Err(SnapshotError::PointCount {
                expected: POINT_COUNT,
                actual: points.len(),
            });
        }

        for (point, owners) in points.iter().enumerate() {
            let point = point as u8;
            if let Some(&owner) = owners.iter().find(|owner| {
                let opponent = owner.opponent();
                point == opponent.bar_point() || point == opponent.home_point()
            }) {
                return Err(SnapshotError::OpponentPoint {
                    player: owner.into(),
                    point,
                });
            }
            let zero = owners.iter().filter(|&&o| o == Player::Zero).count();
            let one = owners.len() - zero;
            if (1..=24).contains(&point) && zero > 1 && one > 1 {
                return Err(SnapshotError::MixedPoint(point));
            }
        }

        let mut board = Self::empty();
        let mut next = [0usize; 2];
        for (point, owners) in points.iter().enumerate() {
            for &owner in owners {
                let idx = next[owner.index()];
                let id = CheckerId::new(owner, idx).ok_or(SnapshotError::CheckerCount {
                    player: owner.into(),
                    count: idx + 1,
                })?;
                board.add_checker(point as u8, id);
                next[owner.index()] += 1;
            }
        }

        for player in Player::BOTH {
            let count = next[player.index()];
            if count != CHECKERS_PER_PLAYER {
                return Err(SnapshotError::CheckerCount {
                    player: player.into(),
                    count,
                });
            }
        }

        Ok(board)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
