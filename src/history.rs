use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cube::Cube;
use crate::error::HistoryError;
use crate::types::Snapshot;

const MAGIC: &[u8; 4] = b"BGHS";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;

#[derive(Serialize, Deserialize)]
struct Payload {
    history: Vec<Snapshot>,
    fwd_hist: Vec<Snapshot>,
}

/// Undo/redo stack of positions. The last entry of `past` is the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    past: Vec<Snapshot>,
    forward: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            forward: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.past.last()
    }

    /// Pushes a new position and forgets everything that was undone.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.forward.clear();
        if self.past.last() == Some(&snapshot) {
            return;
        }
        self.past.push(snapshot);
        if self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
    }

    /// Steps back `steps` positions (`0` = to the oldest). `None` if already there.
    pub fn back(&mut self, steps: usize) -> Option<&Snapshot> {
        let mut moved = 0;
        while self.past.len() > 1 && (steps == 0 || moved < steps) {
            if let Some(snapshot) = self.past.pop() {
                self.forward.push(snapshot);
            }
            moved += 1;
        }
        if moved == 0 { None } else { self.past.last() }
    }

    /// Re-applies `steps` undone positions (`0` = all of them).
    pub fn forward(&mut self, steps: usize) -> Option<&Snapshot> {
        let mut moved = 0;
        while steps == 0 || moved < steps {
            let Some(snapshot) = self.forward.pop() else {
                break;
            };
            self.past.push(snapshot);
            moved += 1;
        }
        if moved == 0 { None } else { self.past.last() }
    }

    /// Serializes as `magic | version | count | crc32 | forward count | json`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HistoryError> {
        let payload = serde_json::to_vec(&Payload {
            history: self.past.clone(),
            fwd_hist: self.forward.clone(),
        })?;

        let crc = crc32fast::hash(&payload);
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(self.past.len() as u32).to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(self.forward.len() as u32).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    pub fn from_bytes(data: &[u8], limit: usize) -> Result<Self, HistoryError> {
        if data.len() < HEADER_SIZE {
            return Err(HistoryError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if &data[0..4] != MAGIC {
            return Err(HistoryError::Magic);
        }

        let version = read_u32_le(data, 4);
        if version != VERSION {
            return Err(HistoryError::Version {
                expected: VERSION,
                actual: version,
            });
        }

        let count = read_u32_le(data, 8) as usize;
        let expected_crc = read_u32_le(data, 12);
        let forward_count = read_u32_le(data, 16) as usize;
        let payload = &data[HEADER_SIZE..];

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(HistoryError::Crc {
                expected: expected_crc,
                actual: actual_crc,
            });
        }

        let decoded: Payload = serde_json::from_slice(payload)?;
        if decoded.history.len() != count {
            return Err(HistoryError::Count {
                header: count,
                payload: decoded.history.len(),
            });
        }
        if decoded.fwd_hist.len() != forward_count {
            return Err(HistoryError::Count {
                header: forward_count,
                payload: decoded.fwd_hist.len(),
            });
        }

        for snapshot in decoded.history.iter().chain(&decoded.fwd_hist) {
            Board::from_point_array(&snapshot.point)?;
            Cube::from_snapshot(snapshot.cube)?;
        }

        let mut history = Self::new(limit);
        history.past = decoded.history;
        history.forward = decoded.fwd_hist;
        Ok(history)
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameInstance;
    use crate::types::Turn;

    fn snapshot_with_game_num(game_num: u32) -> Snapshot {
        let mut snapshot = GameInstance::new_with_seed(1).to_snapshot();
        snapshot.game_num = game_num;
        snapshot
    }

    fn filled(n: u32) -> History {
        let mut history = History::new(100);
        for i in 0..n {
            history.record(snapshot_with_game_num(i));
        }
        history
    }

    #[test]
    fn back_and_forward_walk_the_stack() {
        let mut history = filled(4);

        assert_eq!(history.back(2).map(|s| s.game_num), Some(1));
        assert_eq!(history.forward_len(), 2);
        assert_eq!(history.forward(1).map(|s| s.game_num), Some(2));
        assert_eq!(history.back(0).map(|s| s.game_num), Some(0));
        assert_eq!(history.back(1), None);
        assert_eq!(history.forward(0).map(|s| s.game_num), Some(3));
        assert_eq!(history.forward(1), None);
    }

    #[test]
    fn record_clears_redo_and_respects_limit() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(snapshot_with_game_num(i));
        }
        assert_eq!(history.len(), 3);

        history.back(1);
        history.record(snapshot_with_game_num(9));

        assert_eq!(history.forward_len(), 0);
        assert_eq!(history.current().map(|s| s.game_num), Some(9));
    }

    #[test]
    fn bytes_round_trip() {
        let mut history = filled(3);
        history.back(1);

        let bytes = history.to_bytes().unwrap();
        let restored = History::from_bytes(&bytes, 100).unwrap();

        assert_eq!(restored, history);
        assert_eq!(restored.current().map(|s| s.turn), Some(Turn::OpeningRoll));
    }

    #[test]
    fn from_bytes_rejects_invalid_magic() {
        let mut bytes = filled(1).to_bytes().unwrap();
        bytes[0] = b'X';

        let err = History::from_bytes(&bytes, 10).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn from_bytes_rejects_unsupported_version() {
        let mut bytes = filled(1).to_bytes().unwrap();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());

        let err = History::from_bytes(&bytes, 10).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn from_bytes_rejects_crc_mismatch() {
        let mut bytes = filled(2).to_bytes().unwrap();
        let last = bytes.len() - 2;
        bytes[last] ^= 0x01;

        let err = History::from_bytes(&bytes, 10).unwrap_err();
        assert!(err.to_string().contains("CRC32"));
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        let err = History::from_bytes(b"BGHS", 10).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }
}
