//! Resources and messages shared by the dice systems

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::dice3d::session::RollSession;
use crate::dice3d::types::{DiceType, EngineSettings, RollOutcome};

/// Outcomes kept for the results panel.
pub const RESULT_HISTORY: usize = 32;

/// The roll session bound to the app. It runs from arena initialization
/// until `AppExit`.
#[derive(Resource)]
pub struct DiceSession {
    pub session: RollSession,
    running: bool,
}

impl DiceSession {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            session: RollSession::new(settings),
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = self.session.is_initialized();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Roll requests queued by the UI, drained once per frame.
#[derive(Resource, Default, Debug)]
pub struct RollRequests {
    pub pending: Vec<String>,
    pub cancel_all: bool,
}

impl RollRequests {
    pub fn push(&mut self, identifier: impl Into<String>) {
        self.pending.push(identifier.into());
    }
}

/// Most recent outcomes, newest first.
#[derive(Resource, Default, Debug)]
pub struct DiceResults {
    pub recent: VecDeque<RollOutcome>,
}

impl DiceResults {
    pub fn record(&mut self, outcome: RollOutcome) {
        self.recent.push_front(outcome);
        self.recent.truncate(RESULT_HISTORY);
    }
}

/// Die type thrown by the roll key.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDie(pub DiceType);

impl Default for SelectedDie {
    fn default() -> Self {
        Self(DiceType::D20)
    }
}

/// Marker for the results text node.
#[derive(Component)]
pub struct ResultsText;

#[derive(Component)]
pub struct MainCamera;

/// Written once per resolved die.
#[derive(Message, Clone, Copy, Debug)]
pub struct DieRollCompleted {
    pub outcome: RollOutcome,
}
