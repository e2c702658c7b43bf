//! Roll request, tick, and result systems

use bevy::log::{info, warn};
use bevy::prelude::*;

use super::state::{DiceResults, DiceSession, DieRollCompleted, ResultsText, RollRequests, SelectedDie};
use crate::dice3d::physics::RapierDiceWorld;
use crate::dice3d::render::BevyDiceRenderer;
use crate::dice3d::types::RollOutcome;

/// Drains queued requests into the session. Rejected requests are logged and
/// dropped.
pub fn process_roll_requests(
    mut requests: ResMut<RollRequests>,
    mut dice: ResMut<DiceSession>,
    mut world: RapierDiceWorld,
    mut renderer: BevyDiceRenderer,
) {
    if requests.cancel_all {
        requests.cancel_all = false;
        dice.session.clear(&mut world, &mut renderer);
    }

    if requests.pending.is_empty() {
        return;
    }
    if !dice.is_running() {
        warn!(
            "Dropping {} roll requests: dice session is not running",
            requests.pending.len()
        );
        requests.pending.clear();
        return;
    }

    for identifier in requests.pending.drain(..) {
        // Results arrive through `DieRollCompleted`, so the ticket is not kept.
        if let Err(e) = dice
            .session
            .request_roll(&mut world, &mut renderer, &identifier)
        {
            warn!("Roll request '{}' rejected: {}", identifier, e);
        }
    }
}

pub fn tick_dice_session(
    mut dice: ResMut<DiceSession>,
    mut world: RapierDiceWorld,
    mut renderer: BevyDiceRenderer,
    mut results: ResMut<DiceResults>,
    mut completed: MessageWriter<DieRollCompleted>,
) {
    if !dice.is_running() {
        return;
    }
    for outcome in dice.session.tick(&mut world, &mut renderer) {
        results.record(outcome);
        completed.write(DieRollCompleted { outcome });
    }
}

/// Text shown in the results panel.
pub fn format_results(recent: &[RollOutcome], rolling: usize, selected: &str) -> String {
    let mut text = format!("Selected: {}  (1-7 to change)\n", selected);
    if rolling > 0 {
        text.push_str(&format!("Rolling {} dice...\n", rolling));
    }
    if recent.is_empty() {
        text.push_str("Press SPACE to roll, C to clear");
        return text;
    }

    text.push_str("Results:\n");
    for outcome in recent.iter().take(8) {
        let marker = if outcome.forced { " (forced)" } else { "" };
        text.push_str(&format!(
            "{}: {}{}\n",
            outcome.die_type, outcome.value, marker
        ));
    }
    let total: u32 = recent.iter().take(8).map(|o| o.value).sum();
    text.push_str(&format!("Total: {}", total));
    text
}

pub fn update_results_display(
    results: Res<DiceResults>,
    dice: Res<DiceSession>,
    selected: Res<SelectedDie>,
    mut text_query: Query<&mut Text, With<ResultsText>>,
) {
    if !(results.is_changed() || dice.is_changed() || selected.is_changed()) {
        return;
    }
    let recent: Vec<RollOutcome> = results.recent.iter().copied().collect();
    let content = format_results(&recent, dice.session.active_count(), selected.0.name());
    for mut text in text_query.iter_mut() {
        text.0 = content.clone();
    }
}

/// Ends the session loop with the app.
pub fn stop_session_on_exit(
    mut exit: MessageReader<AppExit>,
    mut dice: ResMut<DiceSession>,
    mut world: RapierDiceWorld,
    mut renderer: BevyDiceRenderer,
) {
    if exit.read().next().is_none() || !dice.is_running() {
        return;
    }
    dice.stop();
    dice.session.shutdown(&mut world, &mut renderer);
    info!("Dice session stopped on exit");
}
