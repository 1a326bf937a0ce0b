use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const USED_OFFSET: u8 = 10;

/// One die slot: `0` not rolled, `1..=6` usable, `11..=16` already used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Die(u8);

impl Die {
    pub const UNSET: Die = Die(0);

    pub fn active(pips: u8) -> Option<Self> {
        (1..=6).contains(&pips).then_some(Self(pips))
    }

    pub fn is_unset(self) -> bool {
        self.0 == 0
    }

    pub fn is_active(self) -> bool {
        (1..=6).contains(&self.0)
    }

    pub fn is_used(self) -> bool {
        (11..=16).contains(&self.0)
    }

    /// Face value regardless of whether the die was used. `0` when unset.
    pub fn pips(self) -> u8 {
        self.0 % USED_OFFSET
    }

    pub fn disable(&mut self) {
        if self.is_active() {
            self.0 += USED_OFFSET;
        }
    }

    pub fn raw(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Die {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=6 | 11..=16 => Ok(Die(value)),
            other => Err(format!("invalid die value: {other}")),
        }
    }
}

impl From<Die> for u8 {
    fn from(die: Die) -> Self {
        die.0
    }
}

/// The four die slots of one player. Doubles fill all four.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiceSet([Die; 4]);

impl DiceSet {
    pub fn new(slots: [Die; 4]) -> Self {
        Self(slots)
    }

    /// Two rolled dice, expanded to four slots on doubles.
    pub fn from_roll(first: u8, second: u8) -> Option<Self> {
        let a = Die::active(first)?;
        let b = Die::active(second)?;
        Some(if first == second {
            Self([a; 4])
        } else {
            Self([a, b, Die::UNSET, Die::UNSET])
        })
    }

    /// Single die used by the opening roll.
    pub fn opening(pips: u8) -> Option<Self> {
        Some(Self([Die::active(pips)?, Die::UNSET, Die::UNSET, Die::UNSET]))
    }

    pub fn slots(&self) -> [Die; 4] {
        self.0
    }

    /// Face values of the still-usable dice, in slot order.
    pub fn active_values(&self) -> Vec<u8> {
        self.0
            .iter()
            .filter(|die| die.is_active())
            .map(|die| die.pips())
            .collect()
    }

    pub fn has_active(&self) -> bool {
        self.0.iter().any(|die| die.is_active())
    }

    /// Any slot set, used or not.
    pub fn is_rolled(&self) -> bool {
        self.0.iter().any(|die| !die.is_unset())
    }

    /// Marks the first active slot showing `pips` as used.
    pub fn consume(&mut self, pips: u8) -> bool {
        match self.0.iter_mut().find(|die| die.is_active() && die.pips() == pips) {
            Some(die) => {
                die.disable();
                true
            }
            None => false,
        }
    }

    /// Disables every active slot whose value is not in `usable`.
    /// Returns whether anything changed.
    pub fn retain_usable(&mut self, usable: &[u8]) -> bool {
        let mut changed = false;
        for die in self.0.iter_mut() {
            if die.is_active() && !usable.contains(&die.pips()) {
                die.disable();
                changed = true;
            }
        }
        changed
    }

    pub fn opening_value(&self) -> Option<u8> {
        self.0.first().filter(|die| !die.is_unset()).map(|die| die.pips())
    }

    pub fn clear(&mut self) {
        self.0 = [Die::UNSET; 4];
    }

    pub fn raw(&self) -> [u8; 4] {
        self.0.map(Die::raw)
    }
}

/// Source of die faces. Swappable so tests and replays can script rolls.
pub trait DiceRoller: Send {
    fn roll_die(&mut self) -> u8;
}

/// `SmallRng`-backed roller.
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: SmallRng,
}

impl RandomDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl DiceRoller for RandomDice {
    fn roll_die(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}

/// Replays a fixed sequence, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct FixedDice {
    faces: Vec<u8>,
    next: usize,
}

impl FixedDice {
    pub fn new(faces: Vec<u8>) -> Self {
        Self { faces, next: 0 }
    }
}

impl DiceRoller for FixedDice {
    fn roll_die(&mut self) -> u8 {
        if self.faces.is_empty() {
            return 1;
        }
        let face = self.faces[self.next % self.faces.len()];
        self.next += 1;
        face.clamp(1, 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_fill_all_four_slots() {
        let dice = DiceSet::from_roll(4, 4).unwrap();

        assert_eq!(dice.raw(), [4, 4, 4, 4]);
        assert_eq!(dice.active_values(), vec![4, 4, 4, 4]);
    }

    #[test]
    fn consume_disables_one_matching_slot_only() {
        let mut dice = DiceSet::from_roll(3, 3).unwrap();

        assert!(dice.consume(3));
        assert_eq!(dice.raw(), [13, 3, 3, 3]);
        assert!(!dice.consume(5));
    }

    #[test]
    fn retain_usable_marks_the_rest_used() {
        let mut dice = DiceSet::from_roll(6, 2).unwrap();

        assert!(dice.retain_usable(&[2]));
        assert_eq!(dice.raw(), [16, 2, 0, 0]);
        assert!(dice.is_rolled());
        assert!(dice.has_active());
    }

    #[test]
    fn die_rejects_values_outside_tagged_ranges() {
        assert!(Die::try_from(7).is_err());
        assert!(Die::try_from(10).is_err());
        assert!(Die::try_from(17).is_err());
        assert_eq!(Die::try_from(15).unwrap().pips(), 5);
    }

    #[test]
    fn random_dice_stay_in_range_and_are_reproducible() {
        let mut a = RandomDice::from_seed(7);
        let mut b = RandomDice::from_seed(7);

        for _ in 0..200 {
            let face = a.roll_die();
            assert!((1..=6).contains(&face));
            assert_eq!(face, b.roll_die());
        }
    }
}
