use crate::error::{Rejection, SnapshotError};
use crate::types::{CubeSnapshot, Player};

pub const MAX_CUBE_VALUE: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubePosition {
    Centered,
    /// Doubled and waiting for `Player` to take or drop.
    OfferedTo(Player),
    OwnedBy(Player),
}

/// Doubling cube. Only the cube rules live here; whether the turn allows a
/// double is decided by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cube {
    value: u8,
    position: CubePosition,
    /// Wire `accepted` flag while centered. Carries no rule, only round-trips.
    centered_accepted: bool,
}

impl Cube {
    pub fn new() -> Self {
        Self {
            value: 1,
            position: CubePosition::Centered,
            centered_accepted: true,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn position(&self) -> CubePosition {
        self.position
    }

    pub fn pending_offer(&self) -> Option<Player> {
        match self.position {
            CubePosition::OfferedTo(player) => Some(player),
            CubePosition::Centered | CubePosition::OwnedBy(_) => None,
        }
    }

    /// Cube-side checks for `by` turning the cube.
    pub fn check_double(&self, by: Player) -> Result<(), Rejection> {
        match self.position {
            CubePosition::OfferedTo(_) => Err(Rejection::OfferPending),
            CubePosition::OwnedBy(owner) if owner != by => Err(Rejection::CannotDouble),
            _ if self.value >= MAX_CUBE_VALUE => Err(Rejection::CubeAtMaximum),
            _ => Ok(()),
        }
    }

    pub fn double(&mut self, by: Player) -> Result<(), Rejection> {
        self.check_double(by)?;
        self.value *= 2;
        self.position = CubePosition::OfferedTo(by.opponent());
        Ok(())
    }

    /// Returns the new owner.
    pub fn accept(&mut self) -> Result<Player, Rejection> {
        let taker = self.pending_offer().ok_or(Rejection::NoOffer)?;
        self.position = CubePosition::OwnedBy(taker);
        Ok(taker)
    }

    /// Undoes the offer and returns `(doubler, stake)`: the winner and the cube
    /// value the game is settled at.
    pub fn decline(&mut self) -> Result<(Player, u8), Rejection> {
        let decliner = self.pending_offer().ok_or(Rejection::NoOffer)?;
        let doubler = decliner.opponent();
        self.value /= 2;
        self.centered_accepted = true;
        self.position = if self.value == 1 {
            CubePosition::Centered
        } else {
            CubePosition::OwnedBy(doubler)
        };
        Ok((doubler, self.value))
    }

    pub fn to_snapshot(&self) -> CubeSnapshot {
        let (owner, accepted) = match self.position {
            CubePosition::Centered => (None, self.centered_accepted),
            CubePosition::OfferedTo(player) => (Some(player), false),
            CubePosition::OwnedBy(player) => (Some(player), true),
        };
        CubeSnapshot {
            owner,
            value: self.value,
            accepted,
        }
    }

    pub fn from_snapshot(snapshot: CubeSnapshot) -> Result<Self, SnapshotError> {
        let value = snapshot.value;
        if !value.is_power_of_two() || value > MAX_CUBE_VALUE {
            return Err(SnapshotError::CubeValue(value));
        }
        let position = match (snapshot.owner, snapshot.accepted) {
            (None, _) => CubePosition::Centered,
            (Some(player), true) => CubePosition::OwnedBy(player),
            (Some(player), false) => CubePosition::OfferedTo(player),
        };
        Ok(Self {
            value,
            position,
            centered_accepted: snapshot.owner.is_some() || snapshot.accepted,
        })
    }
}

impl Default for Cube {
    fn default() -> Self {
        Self::new()
    }
}
