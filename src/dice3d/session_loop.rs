//! Session loop
//!
//! `DiceTable` owns a stepped world, a renderer, and the roll session, and
//! is driven by the host's per-frame callback. Each running frame advances
//! the world one fixed step and then runs the session tick. The loop only
//! runs between `start` and `stop`, and `destroy` (or drop) releases
//! everything.

use bevy::log::{info, warn};

use crate::dice3d::physics::SteppedWorld;
use crate::dice3d::render::DiceRenderer;
use crate::dice3d::session::RollSession;
use crate::dice3d::types::{
    DiceError, DiceType, EngineSettings, RollHandle, RollOutcome, RollTicket,
};

pub struct DiceTable<W: SteppedWorld, R: DiceRenderer> {
    world: W,
    renderer: R,
    session: RollSession,
    running: bool,
    destroyed: bool,
    frames: u64,
}

impl<W: SteppedWorld, R: DiceRenderer> DiceTable<W, R> {
    /// Builds the arena in `world`. The table starts stopped.
    pub fn create(settings: EngineSettings, mut world: W, renderer: R) -> Result<Self, DiceError> {
        let mut session = RollSession::new(settings);
        session.initialize(&mut world)?;
        Ok(Self {
            world,
            renderer,
            session,
            running: false,
            destroyed: false,
            frames: 0,
        })
    }

    pub fn start(&mut self) {
        if !self.destroyed && !self.running {
            self.running = true;
            info!("Dice table started");
        }
    }

    /// Pauses the loop. In-flight rolls stay where they are.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Dice table stopped after {} frames", self.frames);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One host frame. Returns the outcomes resolved in it; nothing happens
    /// while stopped.
    pub fn on_frame(&mut self) -> Vec<RollOutcome> {
        if !self.running {
            return Vec::new();
        }
        self.frames += 1;
        let dt = self.session.settings().fixed_timestep;
        self.world.step(dt);
        self.session.tick(&mut self.world, &mut self.renderer)
    }

    /// Runs frames until no roll is active or `max_frames` have passed.
    pub fn run_until_idle(&mut self, max_frames: usize) -> Vec<RollOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..max_frames {
            if self.session.active_count() == 0 || !self.running {
                break;
            }
            outcomes.extend(self.on_frame());
        }
        outcomes
    }

    pub fn request_roll(&mut self, identifier: &str) -> Result<RollTicket, DiceError> {
        self.ensure_running()?;
        self.session
            .request_roll(&mut self.world, &mut self.renderer, identifier)
    }

    pub fn request_kind(&mut self, kind: DiceType) -> Result<RollTicket, DiceError> {
        self.ensure_running()?;
        self.session
            .request_kind(&mut self.world, &mut self.renderer, kind)
    }

    fn ensure_running(&self) -> Result<(), DiceError> {
        if self.running {
            Ok(())
        } else {
            warn!("Roll request rejected: dice table is not running");
            Err(DiceError::UninitializedSession)
        }
    }

    pub fn cancel_roll(&mut self, handle: RollHandle) -> Result<(), DiceError> {
        self.session
            .cancel_roll(&mut self.world, &mut self.renderer, handle)
    }

    pub fn set_result_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&RollOutcome) + Send + Sync + 'static,
    {
        self.session.set_result_listener(listener);
    }

    /// Stops the loop, cancels every roll, and tears down the world.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.session.shutdown(&mut self.world, &mut self.renderer);
        self.destroyed = true;
    }

    pub fn session(&self) -> &RollSession {
        &self.session
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<W: SteppedWorld, R: DiceRenderer> Drop for DiceTable<W, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}
