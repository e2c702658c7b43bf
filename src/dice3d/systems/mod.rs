//! Bevy systems for the dice table
//!
//! - `setup`: camera, lights, arena visuals, Rapier arena and gravity
//! - `input`: keyboard selection and throw requests
//! - `dice`: request processing, the session tick, and the results panel
//! - `state`: resources and messages shared by the systems

mod dice;
mod input;
mod setup;
pub mod state;

pub use dice::{
    format_results, process_roll_requests, stop_session_on_exit, tick_dice_session,
    update_results_display,
};
pub use input::{die_for_key, handle_roll_input};
pub use setup::{configure_physics, initialize_arena, setup_scene};
pub use state::*;
