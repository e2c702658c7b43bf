use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::physics::RapierBodyRegistry;
use crate::dice3d::render::DieVisualAssets;
use crate::dice3d::systems::*;
use crate::dice3d::types::{DiceType, EngineSettings};

/// Dice table front end. Expects `RapierPhysicsPlugin` to be added by the
/// app.
pub struct DiceRollPlugin {
    pub settings: EngineSettings,
    /// Thrown on the first frame.
    pub initial_dice: Vec<DiceType>,
}

impl Default for DiceRollPlugin {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            initial_dice: Vec::new(),
        }
    }
}

impl Plugin for DiceRollPlugin {
    fn build(&self, app: &mut App) {
        let mut requests = RollRequests::default();
        for kind in &self.initial_dice {
            requests.push(kind.name());
        }

        app.insert_resource(self.settings.clone())
            .insert_resource(DiceSession::new(self.settings.clone()))
            .insert_resource(requests)
            .insert_resource(TimestepMode::Fixed {
                dt: self.settings.fixed_timestep,
                substeps: 1,
            })
            .init_resource::<DiceResults>()
            .init_resource::<SelectedDie>()
            .init_resource::<RapierBodyRegistry>()
            .init_resource::<DieVisualAssets>()
            .add_message::<DieRollCompleted>()
            .add_systems(Startup, (setup_scene, initialize_arena))
            // Requests before the tick so a die spawned this frame is tracked
            // from its first physics step.
            .add_systems(
                Update,
                (
                    configure_physics,
                    handle_roll_input,
                    process_roll_requests,
                    tick_dice_session,
                    update_results_display,
                )
                    .chain(),
            )
            .add_systems(Last, stop_session_on_exit);
    }
}
