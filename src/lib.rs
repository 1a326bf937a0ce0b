use serde::Serialize;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

pub mod board;
pub mod config;
pub mod cube;
pub mod dice;
pub mod error;
pub mod events;
pub mod game;
pub mod history;
pub mod logging;
pub mod moves;
pub mod timer;
pub mod types;

use crate::config::EngineConfig;
use crate::dice::RandomDice;
use crate::events::{Inbound, Outbound};
use crate::game::GameInstance;
use crate::history::History;
use crate::types::{CheckerId, Player, Snapshot};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

/// Page-facing handle around one [`GameInstance`].
///
/// Rejected stimuli are logged and come back as an empty event list; only
/// JS value conversion failures are thrown.
#[wasm_bindgen]
pub struct BackgammonEngine {
    game: GameInstance,
    history_limit: usize,
}

#[wasm_bindgen]
impl BackgammonEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<BackgammonEngine, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let seed = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
        Ok(Self::with_seed(config, seed))
    }

    pub fn handle(&mut self, msg: JsValue) -> Result<JsValue, JsValue> {
        let events = match serde_wasm_bindgen::from_value::<Inbound>(msg) {
            Ok(msg) => self.apply(msg),
            Err(err) => {
                warn!(%err, "ignoring unrecognized message");
                Vec::new()
            }
        };
        to_js(&events)
    }

    /// Same as `handle` for a raw `{type, data}` JSON string.
    pub fn handle_json(&mut self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.game.handle_json(text))
    }

    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.game.tick())
    }

    pub fn destination_points(&self, checker: &str) -> Vec<u8> {
        match checker.parse::<CheckerId>() {
            Ok(id) => self.game.destination_points(id),
            Err(err) => {
                debug!(%err, "no destinations for unknown checker");
                Vec::new()
            }
        }
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.game.to_snapshot())
    }

    pub fn load(&mut self, snapshot: JsValue) -> Result<JsValue, JsValue> {
        let snapshot: Snapshot = serde_wasm_bindgen::from_value(snapshot)?;
        to_js(&self.apply(Inbound::LoadPosition(snapshot)))
    }

    pub fn actions(&self, player: u8) -> Result<JsValue, JsValue> {
        to_js(&self.game.actions(to_player(player)?))
    }

    pub fn pip_count(&self, player: u8) -> Result<u32, JsValue> {
        Ok(self.game.pip_count(to_player(player)?))
    }

    pub fn save_history(&self) -> Result<Vec<u8>, JsValue> {
        self.game
            .history()
            .to_bytes()
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn load_history(&mut self, data: &[u8]) -> Result<JsValue, JsValue> {
        let history = History::from_bytes(data, self.history_limit)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let events = self.game.restore_history(history).unwrap_or_else(|rejection| {
            debug!(%rejection, "history rejected");
            Vec::new()
        });
        to_js(&events)
    }
}

impl BackgammonEngine {
    /// Native constructor with a caller-chosen dice seed.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        logging::init(&config.log_filter);
        let history_limit = config.history_limit;
        Self {
            game: GameInstance::new(config, Box::new(RandomDice::from_seed(seed))),
            history_limit,
        }
    }

    pub fn game(&self) -> &GameInstance {
        &self.game
    }

    fn apply(&mut self, msg: Inbound) -> Vec<Outbound> {
        self.game.handle(msg).unwrap_or_else(|rejection| {
            debug!(%rejection, "rejected");
            Vec::new()
        })
    }
}

fn to_player(index: u8) -> Result<Player, JsValue> {
    Player::try_from(index).map_err(|err| JsValue::from_str(&err))
}

/// Plain JSON-shaped JS values: maps become objects, `None` becomes `null`.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}
