use tracing::{debug, instrument, warn};
use web_time::Instant;

use crate::board::Board;
use crate::config::EngineConfig;
use crate::cube::Cube;
use crate::dice::{DiceRoller, DiceSet, RandomDice};
use crate::error::Rejection;
use crate::events::{Inbound, Outbound};
use crate::history::History;
use crate::moves;
use crate::timer::DanceTimer;
use crate::types::{
    Actions, CHECKERS_PER_PLAYER, CheckerId, CubeSnapshot, GameResult, Player, Resignation,
    Snapshot, Turn, WinKind,
};

type Outcome = Result<Vec<Outbound>, Rejection>;

/// The single authoritative rules engine for one table.
///
/// Every stimulus is validated against the current position before anything
/// is touched, so a rejected stimulus leaves the instance exactly as it was.
pub struct GameInstance {
    board: Board,
    dice: [DiceSet; 2],
    cube: Cube,
    turn: Turn,
    resign: Resignation,
    result: Option<GameResult>,
    score: [u32; 2],
    game_num: u32,
    dance: DanceTimer,
    history: History,
    config: EngineConfig,
    roller: Box<dyn DiceRoller>,
}

impl GameInstance {
    pub fn new(config: EngineConfig, roller: Box<dyn DiceRoller>) -> Self {
        let mut game = Self {
            board: Board::new(),
            dice: [DiceSet::default(); 2],
            cube: Cube::new(),
            turn: Turn::OpeningRoll,
            resign: Resignation::None,
            result: None,
            score: [0; 2],
            game_num: 1,
            dance: DanceTimer::new(config.dance_delay()),
            history: History::new(config.history_limit),
            config,
            roller,
        };
        game.record();
        game
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self::new(EngineConfig::default(), Box::new(RandomDice::from_seed(seed)))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn dice(&self, player: Player) -> DiceSet {
        self.dice[player.index()]
    }

    pub fn cube(&self) -> Cube {
        self.cube
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn resign(&self) -> Resignation {
        self.resign
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn score(&self) -> [u32; 2] {
        self.score
    }

    pub fn game_num(&self) -> u32 {
        self.game_num
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Adopts a restored history and jumps to its current position.
    pub fn restore_history(&mut self, history: History) -> Outcome {
        let events = match history.current() {
            Some(snapshot) => self.load_position(snapshot)?,
            None => Vec::new(),
        };
        self.history = history;
        Ok(events)
    }

    pub fn pip_count(&self, player: Player) -> u32 {
        self.board.pip_count(player)
    }

    pub fn handle(&mut self, msg: Inbound) -> Outcome {
        self.handle_at(msg, Instant::now())
    }

    /// Applies one stimulus. `now` only matters for arming the dance timer.
    #[instrument(skip_all, fields(kind = msg.kind()))]
    pub fn handle_at(&mut self, msg: Inbound, now: Instant) -> Outcome {
        let navigates = matches!(msg, Inbound::Back { .. } | Inbound::Forward { .. });

        let events = match msg {
            Inbound::Roll { player } => self.roll(player, now),
            Inbound::Move { checker, point } => self.move_checker(checker, point),
            Inbound::Pass { player } => self.pass(player),
            Inbound::Resign { player } => self.resign_game(player),
            Inbound::Double { player } => self.double(player),
            Inbound::AcceptDouble => self.accept_double(),
            Inbound::DeclineDouble => self.decline_double(),
            Inbound::SetTurn { turn, resign } => Ok(self.set_turn(turn, resign)),
            Inbound::LoadPosition(snapshot) => self.load_position(&snapshot),
            Inbound::SetDice { player, dice } => Ok(self.set_dice(player, DiceSet::new(dice))),
            Inbound::SetCube(cube) => self.set_cube(cube),
            Inbound::NewGame => Ok(self.new_game()),
            Inbound::Back { steps } => self.back(steps),
            Inbound::Forward { steps } => self.forward(steps),
        }?;

        if !navigates {
            self.record();
        }
        debug!(events = events.len(), turn = ?self.turn, "accepted");
        Ok(events)
    }

    /// Parses and applies a wire message. Unknown kinds and rejections are
    /// logged and produce no events.
    pub fn handle_json(&mut self, text: &str) -> Vec<Outbound> {
        let msg = match Inbound::from_json(text) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(%err, "ignoring unrecognized message");
                return Vec::new();
            }
        };
        self.handle(msg).unwrap_or_else(|rejection| {
            debug!(%rejection, "rejected");
            Vec::new()
        })
    }

    pub fn tick(&mut self) -> Vec<Outbound> {
        self.tick_at(Instant::now())
    }

    /// Fires the dance timer if it is due.
    pub fn tick_at(&mut self, now: Instant) -> Vec<Outbound> {
        let Some(player) = self.dance.poll(now) else {
            return Vec::new();
        };
        match self.pass(player) {
            Ok(events) => {
                debug!(%player, "dance timer passed the turn");
                self.record();
                events
            }
            Err(rejection) => {
                debug!(%player, %rejection, "dance timer superseded");
                Vec::new()
            }
        }
    }

    pub fn dance_pending(&self) -> Option<Player> {
        self.dance.pending()
    }

    /// Points the given checker may be dropped on right now.
    pub fn destination_points(&self, checker: CheckerId) -> Vec<u8> {
        let player = checker.owner();
        if self.turn != Turn::Player(player) || self.cube.pending_offer().is_some() {
            return Vec::new();
        }
        let Some(from) = self.board.point_of(checker) else {
            return Vec::new();
        };
        let dice = self.dice[player.index()].active_values();
        moves::destination_points(&self.board, player, from, &dice)
    }

    pub fn actions(&self, player: Player) -> Actions {
        let offered_to = self.cube.pending_offer();
        Actions {
            can_roll: self.check_roll(player).is_ok(),
            can_pass: self.check_pass(player).is_ok(),
            can_double: self.check_double(player).is_ok(),
            can_accept: self.turn != Turn::GameOver && offered_to == Some(player),
            can_decline: self.turn != Turn::GameOver && offered_to == Some(player),
        }
    }

    /// Disables every active die of `player` that no checker can use any more.
    /// Returns whether an active die is left.
    pub fn check_disable(&mut self, player: Player) -> bool {
        let dice = &mut self.dice[player.index()];
        let values = dice.active_values();
        let usable = moves::usable_values(&self.board, player, &values);
        if dice.retain_usable(&usable) {
            debug!(%player, ?usable, "disabled unusable dice");
        }
        dice.has_active()
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            turn: self.turn,
            resign: self.resign,
            cube: self.cube.to_snapshot(),
            dice: [self.dice[0].slots(), self.dice[1].slots()],
            point: self.board.to_point_array(),
            game_num: self.game_num,
            score: self.score,
        }
    }

    fn roll(&mut self, player: Player, now: Instant) -> Outcome {
        if self.turn == Turn::OpeningRoll {
            return self.opening_roll(player, now);
        }
        self.check_roll(player)?;

        let opponent = player.opponent();
        let first = self.roller.roll_die().clamp(1, 6);
        let second = self.roller.roll_die().clamp(1, 6);
        let Some(rolled) = DiceSet::from_roll(first, second) else {
            return Err(Rejection::NoActiveDice);
        };

        let mut events = Vec::new();
        if self.dice[opponent.index()].is_rolled() {
            self.dice[opponent.index()].clear();
            events.push(self.dice_event(opponent, false));
        }
        self.dice[player.index()] = rolled;
        let playable = self.check_disable(player);
        events.push(self.dice_event(player, true));
        debug!(%player, first, second, playable, "rolled");

        if !playable && self.config.auto_pass {
            self.dance.arm(player, now);
        }
        Ok(events)
    }

    fn opening_roll(&mut self, player: Player, now: Instant) -> Outcome {
        if self.dice[player.index()].is_rolled() {
            return Err(Rejection::AlreadyRolled);
        }
        let face = self.roller.roll_die().clamp(1, 6);
        let Some(single) = DiceSet::opening(face) else {
            return Err(Rejection::NoActiveDice);
        };
        self.dice[player.index()] = single;
        let mut events = vec![self.dice_event(player, true)];

        let (Some(zero), Some(one)) = (self.dice[0].opening_value(), self.dice[1].opening_value())
        else {
            return Ok(events);
        };

        if zero == one {
            debug!(face = zero, "opening roll tied");
            for p in Player::BOTH {
                self.dice[p.index()].clear();
                events.push(self.dice_event(p, false));
            }
            return Ok(events);
        }

        let (winner, high, low) = if zero > one {
            (Player::Zero, zero, one)
        } else {
            (Player::One, one, zero)
        };
        let loser = winner.opponent();
        self.dice[loser.index()].clear();
        self.dice[winner.index()] = DiceSet::from_roll(high, low).unwrap_or_default();
        self.turn = Turn::Player(winner);
        let playable = self.check_disable(winner);
        debug!(%winner, high, low, playable, "opening roll decided");
        if !playable && self.config.auto_pass {
            self.dance.arm(winner, now);
        }

        events.push(self.dice_event(loser, false));
        events.push(self.dice_event(winner, true));
        events.push(self.turn_event());
        Ok(events)
    }

    fn move_checker(&mut self, checker: CheckerId, dest: u8) -> Outcome {
        let player = checker.owner();
        self.ensure_turn(player)?;
        if self.cube.pending_offer().is_some() {
            return Err(Rejection::OfferPending);
        }
        let dice = self.dice[player.index()].active_values();
        if dice.is_empty() {
            return Err(Rejection::NoActiveDice);
        }
        let from = self
            .board
            .point_of(checker)
            .ok_or(Rejection::UnknownChecker(checker))?;
        if self.board.on_bar(player) > 0 && from != player.bar_point() {
            return Err(Rejection::MustEnterFromBar);
        }
        let illegal = Rejection::IllegalDestination { from, to: dest };
        let plan = moves::plan_for(&self.board, player, from, dest, &dice).ok_or(illegal.clone())?;

        let mut board = self.board.clone();
        let mut events = Vec::new();
        for step in plan.steps() {
            let outcome = moves::play_step(&mut board, player, *step).ok_or(illegal.clone())?;
            if let Some((hit, slot)) = outcome.hit {
                debug!(%hit, point = step.to, "hit");
                events.push(Outbound::CheckerMoved {
                    checker: hit,
                    point: hit.owner().bar_point(),
                    slot,
                });
            }
            events.push(Outbound::CheckerMoved {
                checker: outcome.moved,
                point: step.to,
                slot: outcome.slot,
            });
        }

        self.board = board;
        for die in plan.dice() {
            self.dice[player.index()].consume(die);
        }
        debug!(%player, from, to = dest, compound = plan.is_compound(), "moved");

        if self.board.borne_off(player) == CHECKERS_PER_PLAYER {
            self.dice[player.index()].clear();
            events.push(self.dice_event(player, false));
            let result = self.bear_off_result(player);
            events.extend(self.finish(result));
            return Ok(events);
        }

        let playable = self.check_disable(player);
        events.push(self.dice_event(player, false));
        if !playable {
            events.extend(self.end_turn(player));
        }
        Ok(events)
    }

    fn pass(&mut self, player: Player) -> Outcome {
        self.check_pass(player)?;
        Ok(self.end_turn(player))
    }

    fn resign_game(&mut self, player: Player) -> Outcome {
        if self.turn == Turn::GameOver {
            return Err(Rejection::GameOver);
        }
        self.resign = Resignation::ResignedBy(player);
        let result = GameResult {
            winner: player.opponent(),
            kind: WinKind::Resignation,
            points: u32::from(self.cube.value()),
        };
        Ok(self.finish(result))
    }

    fn double(&mut self, by: Player) -> Outcome {
        self.check_double(by)?;
        self.cube.double(by)?;
        debug!(%by, value = self.cube.value(), "double offered");
        Ok(vec![self.cube_event()])
    }

    fn accept_double(&mut self) -> Outcome {
        if self.turn == Turn::GameOver {
            return Err(Rejection::GameOver);
        }
        let owner = self.cube.accept()?;
        debug!(%owner, value = self.cube.value(), "double accepted");
        Ok(vec![self.cube_event()])
    }

    fn decline_double(&mut self) -> Outcome {
        if self.turn == Turn::GameOver {
            return Err(Rejection::GameOver);
        }
        let (winner, stake) = self.cube.decline()?;
        self.resign = Resignation::ResignedBy(winner.opponent());
        let mut events = vec![self.cube_event()];
        events.extend(self.finish(GameResult {
            winner,
            kind: WinKind::DoubleDeclined,
            points: u32::from(stake),
        }));
        Ok(events)
    }

    fn set_turn(&mut self, turn: Turn, resign: Resignation) -> Vec<Outbound> {
        self.dance.cancel();
        self.turn = turn;
        self.resign = resign;
        vec![self.turn_event()]
    }

    fn set_dice(&mut self, player: Player, dice: DiceSet) -> Vec<Outbound> {
        self.dice[player.index()] = dice;
        vec![self.dice_event(player, false)]
    }

    fn set_cube(&mut self, cube: CubeSnapshot) -> Outcome {
        self.cube = Cube::from_snapshot(cube)?;
        Ok(vec![self.cube_event()])
    }

    fn load_position(&mut self, snapshot: &Snapshot) -> Outcome {
        self.restore(snapshot)?;
        Ok(vec![Outbound::PositionLoaded(self.to_snapshot())])
    }

    fn new_game(&mut self) -> Vec<Outbound> {
        self.dance.cancel();
        self.board = Board::new();
        self.dice = [DiceSet::default(); 2];
        self.cube = Cube::new();
        self.turn = Turn::OpeningRoll;
        self.resign = Resignation::None;
        self.result = None;
        self.game_num += 1;
        debug!(game_num = self.game_num, "new game");
        vec![Outbound::PositionLoaded(self.to_snapshot())]
    }

    fn back(&mut self, steps: usize) -> Outcome {
        let snapshot = self
            .history
            .back(steps)
            .cloned()
            .ok_or(Rejection::HistoryExhausted)?;
        self.load_position(&snapshot)
    }

    fn forward(&mut self, steps: usize) -> Outcome {
        let snapshot = self
            .history
            .forward(steps)
            .cloned()
            .ok_or(Rejection::HistoryExhausted)?;
        self.load_position(&snapshot)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), Rejection> {
        let board = Board::from_point_array(&snapshot.point)?;
        let cube = Cube::from_snapshot(snapshot.cube)?;

        self.dance.cancel();
        self.board = board;
        self.cube = cube;
        self.turn = snapshot.turn;
        self.resign = snapshot.resign;
        self.dice = snapshot.dice.map(DiceSet::new);
        self.game_num = snapshot.game_num;
        self.score = snapshot.score;
        self.result = None;
        Ok(())
    }

    fn end_turn(&mut self, player: Player) -> Vec<Outbound> {
        self.dance.cancel();
        self.dice[player.index()].clear();
        self.turn = Turn::Player(player.opponent());
        debug!(%player, "turn passed");
        vec![self.dice_event(player, false), self.turn_event()]
    }

    fn finish(&mut self, result: GameResult) -> Vec<Outbound> {
        self.dance.cancel();
        self.turn = Turn::GameOver;
        self.score[result.winner.index()] += result.points;
        self.result = Some(result);
        debug!(winner = %result.winner, kind = ?result.kind, points = result.points, "game over");
        vec![
            self.turn_event(),
            Outbound::GameFinished {
                result,
                score: self.score,
            },
        ]
    }

    fn bear_off_result(&self, winner: Player) -> GameResult {
        let loser = winner.opponent();
        let (kind, multiplier) = if self.board.borne_off(loser) > 0 {
            (WinKind::Single, 1)
        } else if self.board.on_bar(loser) > 0
            || winner
                .home_quadrant()
                .any(|p| self.board.count(p, loser) > 0)
        {
            (WinKind::Backgammon, 3)
        } else {
            (WinKind::Gammon, 2)
        };
        GameResult {
            winner,
            kind,
            points: u32::from(self.cube.value()) * multiplier,
        }
    }

    fn ensure_turn(&self, player: Player) -> Result<(), Rejection> {
        match self.turn {
            Turn::GameOver => Err(Rejection::GameOver),
            Turn::Player(current) if current == player => Ok(()),
            Turn::Player(_) | Turn::OpeningRoll => Err(Rejection::NotYourTurn),
        }
    }

    fn check_roll(&self, player: Player) -> Result<(), Rejection> {
        if self.turn == Turn::OpeningRoll {
            return if self.dice[player.index()].is_rolled() {
                Err(Rejection::AlreadyRolled)
            } else {
                Ok(())
            };
        }
        self.ensure_turn(player)?;
        if self.cube.pending_offer().is_some() {
            return Err(Rejection::OfferPending);
        }
        if self.dice[player.index()].is_rolled() {
            return Err(Rejection::AlreadyRolled);
        }
        if self.board.closes_out(player.opponent()) {
            return Err(Rejection::ClosedOut);
        }
        Ok(())
    }

    fn check_pass(&self, player: Player) -> Result<(), Rejection> {
        self.ensure_turn(player)?;
        if self.cube.pending_offer().is_some() {
            return Err(Rejection::OfferPending);
        }
        let dice = &self.dice[player.index()];
        if dice.has_active() {
            return Err(Rejection::DiceStillPlayable);
        }
        if !dice.is_rolled() && !self.board.closes_out(player.opponent()) {
            return Err(Rejection::MustRollFirst);
        }
        Ok(())
    }

    /// Doubling is only allowed at the start of the turn, before any die is out.
    fn check_double(&self, by: Player) -> Result<(), Rejection> {
        self.ensure_turn(by)?;
        if self.dice.iter().any(|d| d.has_active()) || self.dice[by.index()].is_rolled() {
            return Err(Rejection::CannotDouble);
        }
        self.cube.check_double(by)
    }

    fn record(&mut self) {
        if self.config.record_history {
            let snapshot = self.to_snapshot();
            self.history.record(snapshot);
        }
    }

    fn dice_event(&self, player: Player, rolled: bool) -> Outbound {
        Outbound::DiceSet {
            player,
            dice: self.dice[player.index()].slots(),
            rolled,
        }
    }

    fn cube_event(&self) -> Outbound {
        Outbound::CubeSet(self.cube.to_snapshot())
    }

    fn turn_event(&self) -> Outbound {
        Outbound::TurnChanged {
            turn: self.turn,
            resign: self.resign,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_board_for_test(&mut self, board: Board, turn: Turn) {
        self.board = board;
        self.turn = turn;
        self.dice = [DiceSet::default(); 2];
        self.dance.cancel();
    }

    #[cfg(test)]
    pub(crate) fn set_dice_for_test(&mut self, player: Player, first: u8, second: u8) {
        self.dice[player.index()] = DiceSet::from_roll(first, second).unwrap_or_default();
    }
}
