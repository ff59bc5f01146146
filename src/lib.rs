//! Subaru Runner core crate.
//!
//! A 30-second tap-to-accelerate endless runner with persistent
//! meta-progression: player stats and coins, a gacha, a character roster with
//! abilities, and personal / shared leaderboards. Game logic is pure Rust and
//! runs natively under `cargo test`; the browser layer in `web` only draws and
//! forwards input. `start_game()` mounts the canvas and starts the frame loop.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod characters;
pub mod error;
pub mod gacha;
pub mod ranking;
pub mod run;
pub mod scene;
pub mod stats;
pub mod storage;
mod web;

pub use error::{StoreError, StoreResult};
pub use scene::{Game, Screen};
pub use storage::{BrowserStorage, KeyValueStore, MemoryStorage};
pub use web::{register_name, start_game};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless.
    let _ = console_log::init_with_level(log::Level::Info);
}
