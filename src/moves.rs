//! Destination resolution for a single checker given the dice left to play.
//!
//! Every function here is pure: boards are only mutated on private clones while
//! probing compound moves.

use crate::board::Board;
use crate::types::{CheckerId, Player};

/// One die applied to one checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: u8,
    pub to: u8,
    pub die: u8,
}

/// What `play_step` did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub moved: CheckerId,
    pub slot: usize,
    /// Opposing blot sent to its bar, with its new slot index.
    pub hit: Option<(CheckerId, usize)>,
}

/// A legal way to get one checker from `source` to a destination.
/// Singles have one step, compound moves two to four.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    source: u8,
    steps: Vec<Step>,
}

impl MovePlan {
    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn destination(&self) -> u8 {
        self.steps.last().map_or(self.source, |step| step.to)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_compound(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn dice(&self) -> impl Iterator<Item = u8> + '_ {
        self.steps.iter().map(|step| step.die)
    }
}

/// Raw, unclamped destination. A bar checker counts from just outside the
/// opponent's home (25 for player 0, 0 for player 1).
pub fn calc_destination(player: Player, source: u8, die: u8) -> i8 {
    let origin = if source == player.bar_point() {
        player.entry_origin()
    } else {
        source as i8
    };
    origin + player.direction() * die as i8
}

/// Landing point for one checker of `player` moving from `from` with `die`,
/// or `None` when that single step is illegal.
///
/// Bearing off needs every checker home. An exact roll always bears off; a
/// larger roll only from the outermost occupied point.
pub fn resolve_step(board: &Board, player: Player, from: u8, die: u8) -> Option<u8> {
    let bar = player.bar_point();
    if from != bar && !(1..=24).contains(&from) {
        return None;
    }
    if board.on_bar(player) > 0 && from != bar {
        return None;
    }
    board.top_of(from, player)?;

    let raw = calc_destination(player, from, die);
    let bearing_off = match player {
        Player::Zero => raw <= 0,
        Player::One => raw >= 25,
    };

    if bearing_off {
        if !board.all_home(player) {
            return None;
        }
        let exact = raw == player.home_point() as i8;
        if !exact && board.has_checker_beyond(player, from) {
            return None;
        }
        return Some(player.home_point());
    }

    let to = raw as u8;
    (!board.is_blocked_for(to, player)).then_some(to)
}

/// Moves the top checker of `player` along `step`, sending a lone opposing
/// checker on the landing point to its bar first.
pub fn play_step(board: &mut Board, player: Player, step: Step) -> Option<StepOutcome> {
    let moved = board.top_of(step.from, player)?;

    let hit = match board.blot_for(step.to, player) {
        Some(blot) if (1..=24).contains(&step.to) => {
            let slot = board.add_checker(blot.owner().bar_point(), blot);
            Some((blot, slot))
        }
        _ => None,
    };

    let slot = board.add_checker(step.to, moved);
    Some(StepOutcome { moved, slot, hit })
}

/// All single and compound plans for the checker on `source`.
///
/// Singles come first, one per distinct destination. Several dice bearing the
/// checker off collapse into one plan using the exact die, or the largest
/// when none is exact. Compound plans follow
/// without deduplication: the first two dice summed (either order), and for
/// doubles the running sums of three and four dice, as long as every
/// intermediate landing was itself legal.
pub fn move_plans(board: &Board, player: Player, source: u8, dice: &[u8]) -> Vec<MovePlan> {
    let mut plans: Vec<MovePlan> = Vec::new();

    let exact = player.pip_distance(source);
    for &die in dice {
        let Some(to) = resolve_step(board, player, source, die) else {
            continue;
        };
        let step = Step { from: source, to, die };
        match plans.iter().position(|plan| plan.destination() == to) {
            None => plans.push(MovePlan {
                source,
                steps: vec![step],
            }),
            // Bearing off: the exact die if there is one, else the largest.
            Some(i) if to == player.home_point() => {
                let kept = plans[i].steps[0].die;
                if u32::from(kept) != exact && (u32::from(die) == exact || die > kept) {
                    plans[i].steps[0] = step;
                }
            }
            Some(_) => {}
        }
    }

    if dice.len() < 2 {
        return plans;
    }

    if dice.iter().all(|&die| die == dice[0]) {
        for n in 2..=dice.len() {
            match walk(board, player, source, &dice[..n]) {
                Some(plan) => plans.push(plan),
                None => break,
            }
        }
    } else {
        let (a, b) = (dice[0], dice[1]);
        if let Some(plan) = walk(board, player, source, &[a, b])
            .or_else(|| walk(board, player, source, &[b, a]))
        {
            plans.push(plan);
        }
    }

    plans
}

/// Points reachable from `source`; see [`move_plans`] for ordering.
pub fn destination_points(board: &Board, player: Player, source: u8, dice: &[u8]) -> Vec<u8> {
    move_plans(board, player, source, dice)
        .iter()
        .map(MovePlan::destination)
        .collect()
}

/// The plan that lands on `dest`, preferring a single die over a compound.
pub fn plan_for(
    board: &Board,
    player: Player,
    source: u8,
    dest: u8,
    dice: &[u8],
) -> Option<MovePlan> {
    move_plans(board, player, source, dice)
        .into_iter()
        .find(|plan| plan.destination() == dest)
}

/// Die values from `dice` that can still be played by some checker, alone
/// or after playing some of the other dice first.
pub fn usable_values(board: &Board, player: Player, dice: &[u8]) -> Vec<u8> {
    let mut usable = Vec::new();
    for (i, &die) in dice.iter().enumerate() {
        if usable.contains(&die) {
            continue;
        }
        let mut others = dice.to_vec();
        others.remove(i);
        if can_use(board, player, die, &others) {
            usable.push(die);
        }
    }
    usable
}

fn can_use(board: &Board, player: Player, die: u8, others: &[u8]) -> bool {
    let sources = board.occupied_by(player);
    if sources
        .iter()
        .any(|&from| resolve_step(board, player, from, die).is_some())
    {
        return true;
    }

    let mut tried = Vec::new();
    for (i, &other) in others.iter().enumerate() {
        if other == die || tried.contains(&other) {
            continue;
        }
        tried.push(other);
        let mut rest = others.to_vec();
        rest.remove(i);

        for &from in &sources {
            let Some(to) = resolve_step(board, player, from, other) else {
                continue;
            };
            let mut next = board.clone();
            if play_step(&mut next, player, Step { from, to, die: other }).is_some()
                && can_use(&next, player, die, &rest)
            {
                return true;
            }
        }
    }

    false
}

fn walk(board: &Board, player: Player, source: u8, dice: &[u8]) -> Option<MovePlan> {
    let mut sim = board.clone();
    let mut from = source;
    let mut steps = Vec::with_capacity(dice.len());

    for &die in dice {
        let to = resolve_step(&sim, player, from, die)?;
        let step = Step { from, to, die };
        play_step(&mut sim, player, step)?;
        steps.push(step);
        from = to;
    }

    Some(MovePlan { source, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_from;
    use crate::types::{BAR_0, BAR_1, HOME_0, HOME_1};

    #[test]
    fn calc_destination_normalizes_bar_and_does_not_clamp() {
        assert_eq!(calc_destination(Player::Zero, BAR_0, 3), 22);
        assert_eq!(calc_destination(Player::One, BAR_1, 3), 3);
        assert_eq!(calc_destination(Player::Zero, 2, 5), -3);
        assert_eq!(calc_destination(Player::One, 23, 6), 29);
    }

    #[test]
    fn initial_position_singles_skip_blocked_points() {
        let board = Board::new();

        // 12 is held by five player-1 checkers; 13 -> 10 -> 9 stays open.
        assert_eq!(destination_points(&board, Player::Zero, 13, &[3, 1]), vec![10, 9]);
    }

    #[test]
    fn compound_requires_an_open_intermediate_point() {
        let board = board_from(&[
            (13, Player::Zero, 1),
            (9, Player::One, 2),
            (11, Player::One, 2),
        ]);

        assert!(destination_points(&board, Player::Zero, 13, &[4, 2]).is_empty());

        let board = board_from(&[(13, Player::Zero, 1), (9, Player::One, 2)]);
        assert_eq!(destination_points(&board, Player::Zero, 13, &[4, 2]), vec![11, 7]);
    }

    #[test]
    fn doubles_add_running_sums_until_blocked() {
        let board = board_from(&[(24, Player::Zero, 1)]);
        assert_eq!(
            destination_points(&board, Player::Zero, 24, &[2, 2, 2, 2]),
            vec![22, 20, 18, 16]
        );

        let board = board_from(&[(24, Player::Zero, 1), (18, Player::One, 2)]);
        assert_eq!(
            destination_points(&board, Player::Zero, 24, &[2, 2, 2, 2]),
            vec![22, 20]
        );
    }

    #[test]
    fn bar_checker_blocks_every_other_source() {
        let board = board_from(&[(BAR_0, Player::Zero, 1), (13, Player::Zero, 5)]);

        assert!(destination_points(&board, Player::Zero, 13, &[3, 1]).is_empty());
        assert_eq!(destination_points(&board, Player::Zero, BAR_0, &[3]), vec![22]);
    }

    #[test]
    fn player_one_enters_from_its_own_bar() {
        let board = board_from(&[(BAR_1, Player::One, 1), (4, Player::Zero, 2)]);

        assert_eq!(destination_points(&board, Player::One, BAR_1, &[4, 5]), vec![5, 9]);
    }

    #[test]
    fn bear_off_with_larger_die_only_from_outermost_point() {
        let board = board_from(&[(3, Player::Zero, 1), (1, Player::Zero, 14)]);
        assert_eq!(destination_points(&board, Player::Zero, 3, &[6]), vec![HOME_0]);

        let board = board_from(&[(3, Player::Zero, 1), (5, Player::Zero, 14)]);
        assert!(destination_points(&board, Player::Zero, 3, &[6]).is_empty());
        assert_eq!(destination_points(&board, Player::Zero, 5, &[5]), vec![HOME_0]);
    }

    #[test]
    fn bear_off_prefers_exact_die_in_either_slot_order() {
        let board = board_from(&[(3, Player::Zero, 1), (1, Player::Zero, 14)]);

        for dice in [[6, 3], [3, 6]] {
            let plan = plan_for(&board, Player::Zero, 3, HOME_0, &dice).unwrap();
            assert_eq!(plan.steps(), &[Step { from: 3, to: HOME_0, die: 3 }]);
        }
    }

    #[test]
    fn bear_off_without_exact_die_uses_the_largest() {
        let board = board_from(&[(3, Player::Zero, 1), (1, Player::Zero, 14)]);

        for dice in [[5, 6], [6, 5]] {
            let plan = plan_for(&board, Player::Zero, 3, HOME_0, &dice).unwrap();
            assert_eq!(plan.dice().collect::<Vec<_>>(), vec![6]);
        }

        let board = board_from(&[(22, Player::One, 1), (24, Player::One, 14)]);
        let plan = plan_for(&board, Player::One, 22, HOME_1, &[4, 5]).unwrap();
        assert_eq!(plan.dice().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn bear_off_needs_all_checkers_home() {
        let board = board_from(&[(3, Player::Zero, 14), (7, Player::Zero, 1)]);

        assert!(destination_points(&board, Player::Zero, 3, &[3]).is_empty());
        assert_eq!(destination_points(&board, Player::Zero, 7, &[1]), vec![6]);
    }

    #[test]
    fn borne_off_checker_cannot_continue_a_compound_move() {
        let board = board_from(&[(2, Player::Zero, 1), (1, Player::Zero, 14)]);

        assert_eq!(destination_points(&board, Player::Zero, 2, &[6, 5]), vec![HOME_0]);
    }

    #[test]
    fn play_step_hits_a_lone_blot() {
        let mut board = board_from(&[(13, Player::Zero, 1), (10, Player::One, 1)]);
        let blot = board.top(10).unwrap();

        let outcome = play_step(&mut board, Player::Zero, Step { from: 13, to: 10, die: 3 }).unwrap();

        assert_eq!(outcome.hit, Some((blot, 0)));
        assert_eq!(board.point_of(blot), Some(BAR_1));
        assert_eq!(board.count(10, Player::Zero), 1);
    }

    #[test]
    fn compound_hits_on_the_way_are_simulated() {
        // The blot on 10 is hit by the first die; the plan still reaches 8.
        let board = board_from(&[(13, Player::Zero, 1), (10, Player::One, 1)]);

        let plan = plan_for(&board, Player::Zero, 13, 8, &[3, 2]).unwrap();

        assert!(plan.is_compound());
        assert_eq!(plan.steps()[0], Step { from: 13, to: 10, die: 3 });
    }

    #[test]
    fn usable_values_look_past_bar_entry() {
        let board = board_from(&[
            (BAR_0, Player::Zero, 1),
            (13, Player::Zero, 1),
            (19, Player::One, 2),
        ]);
        assert_eq!(usable_values(&board, Player::Zero, &[6, 3]), vec![6, 3]);

        let board = board_from(&[(BAR_0, Player::Zero, 2), (19, Player::One, 2)]);
        assert_eq!(usable_values(&board, Player::Zero, &[6, 3]), vec![3]);
    }

    #[test]
    fn nothing_is_usable_against_a_closed_board() {
        let layout: Vec<(u8, Player, usize)> = std::iter::once((BAR_0, Player::Zero, 1))
            .chain((19..=24).map(|p| (p, Player::One, 2)))
            .collect();
        let board = board_from(&layout);

        assert!(usable_values(&board, Player::Zero, &[4, 4, 4, 4]).is_empty());
    }
}
