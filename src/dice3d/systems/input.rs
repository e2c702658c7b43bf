//! Keyboard input for picking and throwing dice

use bevy::prelude::*;

use super::state::{RollRequests, SelectedDie};
use crate::dice3d::types::DiceType;

/// Die chosen by a number key, `1` for d4 through `7` for d100.
pub fn die_for_key(key: KeyCode) -> Option<DiceType> {
    let index = match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        _ => return None,
    };
    DiceType::all().get(index).copied()
}

pub fn handle_roll_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut selected: ResMut<SelectedDie>,
    mut requests: ResMut<RollRequests>,
) {
    for key in keyboard.get_just_pressed() {
        if let Some(kind) = die_for_key(*key) {
            selected.0 = kind;
        }
    }

    if keyboard.just_pressed(KeyCode::Space) {
        requests.push(selected.0.name());
    }

    if keyboard.just_pressed(KeyCode::KeyC) {
        requests.cancel_all = true;
    }
}
