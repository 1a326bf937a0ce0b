//! Checks of the JS-facing engine surface.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use ytbg::BackgammonEngine;
use ytbg::events::Outbound;
use ytbg::types::{Actions, Player, Snapshot, Turn};

fn events(value: JsValue) -> Vec<Outbound> {
    serde_wasm_bindgen::from_value(value).unwrap()
}

fn snapshot(engine: &BackgammonEngine) -> Snapshot {
    serde_wasm_bindgen::from_value(engine.snapshot().unwrap()).unwrap()
}

#[wasm_bindgen_test]
fn wasm_ready_reports_true() {
    assert!(ytbg::wasm_ready());
}

#[wasm_bindgen_test]
fn engine_starts_in_opening_roll() {
    let engine = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();

    assert_eq!(engine.pip_count(0).unwrap(), 167);
    assert_eq!(engine.pip_count(1).unwrap(), 167);
    assert_eq!(snapshot(&engine).turn, Turn::OpeningRoll);
    assert!(engine.pip_count(2).is_err());
}

#[wasm_bindgen_test]
fn opening_roll_emits_dice_event() {
    let mut engine = BackgammonEngine::new(JsValue::NULL).unwrap();

    let out = events(engine.handle_json(r#"{"type":"roll","data":{"player":0}}"#).unwrap());

    assert!(matches!(
        out.as_slice(),
        [Outbound::DiceSet { player: Player::Zero, rolled: true, .. }]
    ));
}

#[wasm_bindgen_test]
fn rejected_and_unknown_messages_yield_no_events() {
    let mut engine = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();
    let before = snapshot(&engine);

    assert!(events(engine.handle_json(r#"{"type":"teleport","data":{}}"#).unwrap()).is_empty());
    assert!(events(engine.handle_json(r#"{"type":"pass","data":{"player":1}}"#).unwrap()).is_empty());
    assert!(engine.destination_points("p000").is_empty());
    assert!(engine.destination_points("bogus").is_empty());
    assert_eq!(snapshot(&engine), before);
}

#[wasm_bindgen_test]
fn actions_enable_both_opening_rolls() {
    let engine = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();

    let actions: serde_json::Value =
        serde_wasm_bindgen::from_value(engine.actions(1).unwrap()).unwrap();

    assert_eq!(
        actions,
        serde_json::to_value(Actions {
            can_roll: true,
            ..Actions::default()
        })
        .unwrap()
    );
}

#[wasm_bindgen_test]
fn history_survives_save_and_load() {
    let mut engine = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();
    engine.handle_json(r#"{"type":"roll","data":{"player":1}}"#).unwrap();
    let bytes = engine.save_history().unwrap();

    let mut other = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();
    other.load_history(&bytes).unwrap();

    assert_eq!(snapshot(&other), snapshot(&engine));
    assert!(other.load_history(b"nope").is_err());
}

#[wasm_bindgen_test]
fn logging_writes_to_the_console_without_panicking() {
    ytbg::logging::init("debug");
    let mut engine = BackgammonEngine::new(JsValue::UNDEFINED).unwrap();

    assert!(events(engine.handle_json(r#"{"type":"teleport","data":{}}"#).unwrap()).is_empty());
    assert!(!events(engine.handle_json(r#"{"type":"roll","data":{"player":0}}"#).unwrap()).is_empty());
}
