//! Dice engine and its Bevy front end
//!
//! - `types` - catalog records, roll handles and outcomes, settings, errors
//! - `meshes` - polyhedron geometry for each die
//! - `physics` - the physics world seam and its backends
//! - `render` - the renderer seam, headless and Bevy implementations
//! - `spawner` - launch state for new dice
//! - `resolver` - reading the settled value
//! - `session` - the per-roll state machine
//! - `session_loop` - the frame-driven loop for stepped worlds
//! - `systems` / `plugin` - Bevy + Rapier integration

pub mod meshes;
pub mod physics;
pub mod plugin;
pub mod render;
pub mod resolver;
pub mod session;
pub mod session_loop;
pub mod spawner;
pub mod systems;
pub mod types;

pub use physics::{
    ArenaWorld, BodyHandle, BodySpec, BodyState, ColliderShape, PhysicsWorld, ScriptedTrace,
    ScriptedWorld, SteppedWorld,
};
pub use plugin::DiceRollPlugin;
pub use render::{DiceRenderer, NullRenderer, VisualHandle};
pub use resolver::{top_face, FaceResolver};
pub use session::{ActiveRoll, ResultListener, RollSession};
pub use session_loop::DiceTable;
pub use spawner::DieSpawner;
pub use types::*;
