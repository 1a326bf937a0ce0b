use std::time::Duration;

use web_time::Instant;

use crate::types::Player;

/// Fires a synthesized pass for a player whose roll left no usable die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanceTimer {
    delay: Duration,
    pending: Option<(Player, Instant)>,
}

impl DanceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn arm(&mut self, player: Player, now: Instant) {
        self.pending = Some((player, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<Player> {
        self.pending.map(|(player, _)| player)
    }

    /// Disarms and returns the player once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Player> {
        match self.pending {
            Some((player, deadline)) if now >= deadline => {
                self.pending = None;
                Some(player)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let mut timer = DanceTimer::new(Duration::from_millis(500));
        let start = Instant::now();
        timer.arm(Player::One, start);

        assert_eq!(timer.poll(start + Duration::from_millis(499)), None);
        assert_eq!(timer.poll(start + Duration::from_millis(500)), Some(Player::One));
        assert_eq!(timer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn cancel_suppresses_the_pass() {
        let mut timer = DanceTimer::new(Duration::ZERO);
        let start = Instant::now();
        timer.arm(Player::Zero, start);
        timer.cancel();

        assert_eq!(timer.pending(), None);
        assert_eq!(timer.poll(start + Duration::from_secs(1)), None);
    }
}
