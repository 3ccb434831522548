pub mod runner;

pub use runner::WheelRunner;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<WheelRunner> = RefCell::new(WheelRunner::new());
}

fn with_runner<R>(f: impl FnOnce(&mut WheelRunner) -> R) -> R {
    RUNNER.with(|cell| f(&mut cell.borrow_mut()))
}

fn install_hooks() {
    console_error_panic_hook::set_once();
    // Already installed on repeat calls.
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js(err: wheel_engine::WheelError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub fn wheel_load_config(json: &str) -> Result<(), JsValue> {
    install_hooks();
    with_runner(|r| r.load_config(json)).map_err(to_js)
}

/// Start a round with a random seed.
#[wasm_bindgen]
pub fn wheel_init(peg_count: u32) -> Result<(), JsValue> {
    let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
    wheel_init_seeded(peg_count, seed)
}

#[wasm_bindgen]
pub fn wheel_init_seeded(peg_count: u32, seed: u64) -> Result<(), JsValue> {
    install_hooks();
    with_runner(|r| r.init(peg_count, seed)).map_err(to_js)?;
    log::info!("prize-wheel: initialized ({} pegs, seed {})", peg_count, seed);
    Ok(())
}

#[wasm_bindgen]
pub fn wheel_spin() -> bool {
    with_runner(|r| r.spin())
}

/// Winning peg index, or -1 while the round is pending.
#[wasm_bindgen]
pub fn wheel_tick(dt: f32) -> i32 {
    with_runner(|r| r.tick(dt))
}

#[wasm_bindgen]
pub fn wheel_shutdown() {
    with_runner(|r| r.shutdown());
}

#[wasm_bindgen]
pub fn wheel_set_debug(enabled: bool) {
    with_runner(|r| r.set_debug(enabled));
}

#[wasm_bindgen]
pub fn wheel_needle_rotation(time: f32) -> f32 {
    with_runner(|r| r.needle_rotation(time))
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn wheel_snapshot_ptr() -> *const f32 {
    with_runner(|r| r.snapshot_ptr())
}

#[wasm_bindgen]
pub fn wheel_snapshot_len() -> u32 {
    with_runner(|r| r.snapshot_len())
}

#[wasm_bindgen]
pub fn wheel_strikes_ptr() -> *const u32 {
    with_runner(|r| r.strikes_ptr())
}

#[wasm_bindgen]
pub fn wheel_strikes_len() -> u32 {
    with_runner(|r| r.strikes_len())
}

#[wasm_bindgen]
pub fn wheel_debug_lines_ptr() -> *const f32 {
    with_runner(|r| r.debug_lines_ptr())
}

#[wasm_bindgen]
pub fn wheel_debug_lines_len() -> u32 {
    with_runner(|r| r.debug_lines_len())
}
