//! Roll session
//!
//! Tracks every die in flight. Each tick samples the body velocities, runs
//! settle detection, and resolves settled dice in the same tick: the value
//! is read, delivered once, and the body and visual are released.
//!
//! The session is generic over its collaborators at each call, so the same
//! state machine drives the headless worlds and the Rapier adapter.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use tokio::sync::oneshot;

use crate::dice3d::physics::{BodyHandle, BodyState, PhysicsWorld};
use crate::dice3d::render::{DiceRenderer, VisualHandle};
use crate::dice3d::resolver::FaceResolver;
use crate::dice3d::spawner::DieSpawner;
use crate::dice3d::types::{
    DiceError, DiceType, DieCatalog, DieDefinition, EngineSettings, RollHandle, RollOutcome,
    RollState, RollTicket, SettlePolicy,
};

/// Called once per resolved die, after the per-roll ticket is fulfilled.
pub type ResultListener = Box<dyn FnMut(&RollOutcome) + Send + Sync>;

/// A die in flight.
#[derive(Debug)]
pub struct ActiveRoll {
    handle: RollHandle,
    def: &'static DieDefinition,
    body: BodyHandle,
    visual: VisualHandle,
    state: RollState,
    calm_ticks: u32,
    ticks: u32,
    sender: Option<oneshot::Sender<RollOutcome>>,
}

impl ActiveRoll {
    pub fn handle(&self) -> RollHandle {
        self.handle
    }

    pub fn definition(&self) -> &'static DieDefinition {
        self.def
    }

    pub fn die_type(&self) -> DiceType {
        self.def.kind
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn visual(&self) -> VisualHandle {
        self.visual
    }

    pub fn state(&self) -> RollState {
        self.state
    }

    /// Consecutive calm samples so far.
    pub fn calm_ticks(&self) -> u32 {
        self.calm_ticks
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    fn advance(&mut self, next: RollState) {
        debug_assert!(self.state.can_advance_to(next));
        if self.state.can_advance_to(next) {
            self.state = next;
        }
    }

    /// Feeds one velocity sample into the settle window. Returns whether the
    /// die has settled. A body reporting exactly zero velocity is asleep and
    /// settles at once.
    fn observe(&mut self, sample: &BodyState, policy: &SettlePolicy) -> bool {
        if sample.is_motionless() {
            self.calm_ticks = policy.window_ticks;
            return true;
        }

        let calm = sample.linear_velocity.length() < policy.linear_threshold
            && sample.angular_velocity.length() < policy.angular_threshold;
        if calm {
            self.calm_ticks += 1;
            debug!(
                "{} {} calm for {}/{} ticks",
                self.def.kind, self.handle, self.calm_ticks, policy.window_ticks
            );
        } else {
            self.calm_ticks = 0;
        }
        self.calm_ticks >= policy.window_ticks
    }
}

pub struct RollSession {
    catalog: &'static DieCatalog,
    settings: EngineSettings,
    spawner: DieSpawner,
    resolver: FaceResolver,
    active: Vec<ActiveRoll>,
    next_handle: u64,
    initialized: bool,
    lanes_used: usize,
    listener: Option<ResultListener>,
}

impl RollSession {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_catalog(DieCatalog::standard(), settings)
    }

    pub fn with_catalog(catalog: &'static DieCatalog, settings: EngineSettings) -> Self {
        // Separate streams so spawning more dice never shifts the values
        // drawn by the statistical resolver.
        let resolver_seed = settings.seed.map(|s| s ^ 0x9e37_79b9_7f4a_7c15);
        Self {
            catalog,
            spawner: DieSpawner::new(settings.launch, settings.arena, settings.seed),
            resolver: FaceResolver::new(resolver_seed),
            settings,
            active: Vec::new(),
            next_handle: 1,
            initialized: false,
            lanes_used: 0,
            listener: None,
        }
    }

    /// Validates the settings and builds the arena in `world`.
    pub fn initialize<W>(&mut self, world: &mut W) -> Result<(), DiceError>
    where
        W: PhysicsWorld + ?Sized,
    {
        if self.initialized {
            return Err(DiceError::AlreadyInitialized);
        }
        self.settings.validate()?;
        world.initialize(&self.settings.arena, self.settings.gravity_vector())?;
        self.initialized = true;
        info!(
            "Dice session initialized ({} die types)",
            self.catalog.iter().count()
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &'static DieCatalog {
        self.catalog
    }

    pub fn set_result_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&RollOutcome) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_result_listener(&mut self) {
        self.listener = None;
    }

    /// Spawns a die by identifier (`"d20"`, `"D6"`, ...).
    pub fn request_roll<W, R>(
        &mut self,
        world: &mut W,
        renderer: &mut R,
        identifier: &str,
    ) -> Result<RollTicket, DiceError>
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        self.ensure_initialized()?;
        let def = self.catalog.resolve(identifier).inspect_err(|e| {
            warn!("Roll request rejected: {}", e);
        })?;
        Ok(self.spawn(def, world, renderer))
    }

    pub fn request_kind<W, R>(
        &mut self,
        world: &mut W,
        renderer: &mut R,
        kind: DiceType,
    ) -> Result<RollTicket, DiceError>
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        self.ensure_initialized()?;
        let def = self
            .catalog
            .get(kind)
            .ok_or_else(|| DiceError::UnknownDieType(kind.name().to_string()))?;
        Ok(self.spawn(def, world, renderer))
    }

    fn ensure_initialized(&self) -> Result<(), DiceError> {
        if self.initialized {
            Ok(())
        } else {
            warn!("Roll request rejected: session is not initialized");
            Err(DiceError::UninitializedSession)
        }
    }

    fn spawn<W, R>(
        &mut self,
        def: &'static DieDefinition,
        world: &mut W,
        renderer: &mut R,
    ) -> RollTicket
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        let lane = self.lanes_used;
        self.lanes_used += 1;

        let (body, visual) = self.spawner.spawn(def, lane, world, renderer);
        let handle = RollHandle(self.next_handle);
        self.next_handle += 1;

        let (sender, receiver) = oneshot::channel();
        self.active.push(ActiveRoll {
            handle,
            def,
            body,
            visual,
            state: RollState::Rolling,
            calm_ticks: 0,
            ticks: 0,
            sender: Some(sender),
        });
        info!("Rolling {} {}", def.kind, handle);

        RollTicket { handle, receiver }
    }

    /// Removes a roll without delivering a result. The ticket's receiver
    /// observes a closed channel.
    pub fn cancel_roll<W, R>(
        &mut self,
        world: &mut W,
        renderer: &mut R,
        handle: RollHandle,
    ) -> Result<(), DiceError>
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        let index = self
            .active
            .iter()
            .position(|r| r.handle == handle)
            .ok_or(DiceError::UnknownRoll(handle))?;
        let roll = self.active.remove(index);
        Self::release(&roll, world, renderer);
        info!("Cancelled {} {}", roll.def.kind, handle);
        Ok(())
    }

    fn release<W, R>(roll: &ActiveRoll, world: &mut W, renderer: &mut R)
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        world.remove_body(roll.body);
        renderer.remove_visual(roll.visual);
    }

    /// One evaluation pass over the active set, then visual sync for the
    /// dice still rolling. Returns the outcomes resolved in this tick, in
    /// spawn order.
    pub fn tick<W, R>(&mut self, world: &mut W, renderer: &mut R) -> Vec<RollOutcome>
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        self.lanes_used = 0;
        let policy = self.settings.settle;
        let mut outcomes = Vec::new();

        let mut i = 0;
        while i < self.active.len() {
            let (sample, settled, timed_out) = {
                let roll = &mut self.active[i];
                roll.ticks += 1;
                let sample = world.query_state(roll.body);
                let settled = sample
                    .as_ref()
                    .is_some_and(|s| roll.observe(s, &policy));
                let timed_out = !settled && roll.ticks >= policy.max_roll_ticks;
                (sample, settled, timed_out)
            };

            if !settled && !timed_out {
                i += 1;
                continue;
            }

            let mut roll = self.active.remove(i);
            if timed_out {
                warn!(
                    "{} {} still rolling after {} ticks, forcing resolution",
                    roll.def.kind, roll.handle, roll.ticks
                );
            }
            roll.advance(RollState::Settled);

            let orientation = sample.map_or(Quat::IDENTITY, |s| s.orientation);
            let (value, resolution) = self.resolver.resolve(roll.def, orientation);
            roll.advance(RollState::Resolved);
            Self::release(&roll, world, renderer);

            let outcome = RollOutcome {
                handle: roll.handle,
                die_type: roll.def.kind,
                value,
                policy: resolution,
                forced: timed_out,
                ticks: roll.ticks,
            };
            if let Some(sender) = roll.sender.take() {
                // The caller may have dropped its ticket.
                let _ = sender.send(outcome);
            }
            if let Some(listener) = self.listener.as_mut() {
                listener(&outcome);
            }
            info!(
                "{} {} rolled {} ({:?}{})",
                outcome.die_type,
                outcome.handle,
                outcome.value,
                outcome.policy,
                if outcome.forced { ", forced" } else { "" }
            );
            outcomes.push(outcome);
        }

        for roll in &self.active {
            if let Some(state) = world.query_state(roll.body) {
                renderer.update_visual(roll.visual, state.position, state.orientation);
            }
        }

        outcomes
    }

    /// Cancels every active roll.
    pub fn clear<W, R>(&mut self, world: &mut W, renderer: &mut R)
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        let count = self.active.len();
        for roll in self.active.drain(..) {
            Self::release(&roll, world, renderer);
        }
        if count > 0 {
            info!("Cleared {} active rolls", count);
        }
    }

    /// Cancels every roll and tears the world down. The session can be
    /// initialized again afterwards.
    pub fn shutdown<W, R>(&mut self, world: &mut W, renderer: &mut R)
    where
        W: PhysicsWorld + ?Sized,
        R: DiceRenderer + ?Sized,
    {
        self.clear(world, renderer);
        if self.initialized {
            world.teardown();
            self.initialized = false;
            info!("Dice session shut down");
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, handle: RollHandle) -> bool {
        self.active.iter().any(|r| r.handle == handle)
    }

    pub fn active_rolls(&self) -> &[ActiveRoll] {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::physics::{ScriptedTrace, ScriptedWorld};
    use crate::dice3d::render::NullRenderer;
    use crate::dice3d::types::SettlePolicy;

    fn session(window: u32) -> (RollSession, ScriptedWorld, NullRenderer) {
        let mut settings = EngineSettings::default().with_seed(42);
        settings.settle = SettlePolicy {
            window_ticks: window,
            ..SettlePolicy::default()
        };
        let mut session = RollSession::new(settings);
        let mut world = ScriptedWorld::new(ScriptedTrace::at_rest());
        session.initialize(&mut world).unwrap();
        (session, world, NullRenderer::new())
    }

    fn sample(speed: f32) -> BodyState {
        BodyState {
            linear_velocity: Vec3::new(speed, 0.0, 0.0),
            angular_velocity: Vec3::ZERO,
            ..BodyState::at_rest(Vec3::ZERO, Quat::IDENTITY)
        }
    }

    #[test]
    fn test_settle_window_resets_on_motion() {
        let (mut session, mut world, mut renderer) = session(3);
        session.request_roll(&mut world, &mut renderer, "d6").unwrap();
        let policy = SettlePolicy {
            window_ticks: 3,
            ..SettlePolicy::default()
        };
        let roll = &mut session.active[0];

        assert!(!roll.observe(&sample(0.01), &policy));
        assert!(!roll.observe(&sample(0.01), &policy));
        assert!(!roll.observe(&sample(2.0), &policy));
        assert_eq!(roll.calm_ticks(), 0);
        assert!(!roll.observe(&sample(0.01), &policy));
        assert!(!roll.observe(&sample(0.01), &policy));
        assert!(roll.observe(&sample(0.01), &policy));
    }

    #[test]
    fn test_motionless_sample_settles_immediately() {
        let (mut session, mut world, mut renderer) = session(10);
        session.request_roll(&mut world, &mut renderer, "d6").unwrap();
        let roll = &mut session.active[0];
        assert!(roll.observe(&sample(0.0), &SettlePolicy::default()));
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (mut session, mut world, _) = session(1);
        assert!(matches!(
            session.initialize(&mut world),
            Err(DiceError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_request_before_initialize_fails() {
        let mut session = RollSession::new(EngineSettings::default());
        let mut world = ScriptedWorld::new(ScriptedTrace::at_rest());
        let mut renderer = NullRenderer::new();
        let err = session
            .request_roll(&mut world, &mut renderer, "d6")
            .unwrap_err();
        assert!(matches!(err, DiceError::UninitializedSession));
        assert_eq!(world.added_count(), 0);
    }

    #[test]
    fn test_dice_in_one_tick_get_distinct_lanes() {
        let (mut session, mut world, mut renderer) = session(1);
        world.set_default_trace(ScriptedTrace::constant(Vec3::X, Vec3::Y));
        for _ in 0..3 {
            session.request_roll(&mut world, &mut renderer, "d8").unwrap();
        }
        let xs: Vec<f32> = world.spawned().iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.5, -1.5]);

        session.tick(&mut world, &mut renderer);
        session.request_roll(&mut world, &mut renderer, "d8").unwrap();
        assert_eq!(world.spawned()[3].position.x, 0.0);
    }

    #[test]
    fn test_cleared_listener_is_not_called() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let (mut session, mut world, mut renderer) = session(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        session.set_result_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.request_roll(&mut world, &mut renderer, "d6").unwrap();
        assert_eq!(session.tick(&mut world, &mut renderer).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        session.clear_result_listener();
        let mut ticket = session.request_roll(&mut world, &mut renderer, "d6").unwrap();
        assert_eq!(session.tick(&mut world, &mut renderer).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ticket.try_outcome().is_some());
    }

    #[test]
    fn test_cancel_unknown_roll() {
        let (mut session, mut world, mut renderer) = session(1);
        let err = session
            .cancel_roll(&mut world, &mut renderer, RollHandle(99))
            .unwrap_err();
        assert!(matches!(err, DiceError::UnknownRoll(RollHandle(99))));
    }

    #[test]
    fn test_shutdown_allows_reinitialize() {
        let (mut session, mut world, mut renderer) = session(1);
        world.set_default_trace(ScriptedTrace::constant(Vec3::X, Vec3::ZERO));
        session.request_roll(&mut world, &mut renderer, "d20").unwrap();
        session.shutdown(&mut world, &mut renderer);
        assert!(!session.is_initialized());
        assert_eq!(session.active_count(), 0);
        assert_eq!(renderer.visual_count(), 0);
        session.initialize(&mut world).unwrap();
    }
}
