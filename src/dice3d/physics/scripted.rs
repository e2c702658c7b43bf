//! Scripted physics world
//!
//! Replays a fixed velocity trace per body instead of simulating. Each step
//! advances every body one frame; the last frame repeats forever. Frame 0 is
//! reported until the first step.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::*;

use super::{BodyHandle, BodySpec, BodyState, PhysicsWorld, SteppedWorld};
use crate::dice3d::types::{ArenaBounds, DiceError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScriptedFrame {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl ScriptedFrame {
    pub const STILL: ScriptedFrame = ScriptedFrame {
        linear: Vec3::ZERO,
        angular: Vec3::ZERO,
    };

    pub fn uniform(speed: f32) -> Self {
        Self {
            linear: Vec3::new(speed, 0.0, 0.0),
            angular: Vec3::new(0.0, speed, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedTrace {
    frames: Vec<ScriptedFrame>,
    orientation: Option<Quat>,
}

impl Default for ScriptedTrace {
    fn default() -> Self {
        Self::at_rest()
    }
}

impl ScriptedTrace {
    /// An empty frame list behaves like `at_rest`.
    pub fn new(frames: Vec<ScriptedFrame>) -> Self {
        let frames = if frames.is_empty() {
            vec![ScriptedFrame::STILL]
        } else {
            frames
        };
        Self {
            frames,
            orientation: None,
        }
    }

    /// Exactly zero velocity from the start.
    pub fn at_rest() -> Self {
        Self::new(vec![ScriptedFrame::STILL])
    }

    /// Never slows down.
    pub fn constant(linear: Vec3, angular: Vec3) -> Self {
        Self::new(vec![ScriptedFrame { linear, angular }])
    }

    /// Speed falls linearly from `speed` to zero over `ticks` frames.
    pub fn decaying(speed: f32, ticks: usize) -> Self {
        let ticks = ticks.max(1);
        let frames = (0..=ticks)
            .map(|i| ScriptedFrame::uniform(speed * (ticks - i) as f32 / ticks as f32))
            .collect();
        Self::new(frames)
    }

    /// Fast for `before` frames, nearly still for `apex` frames (under the
    /// default thresholds but not zero), fast again for `after` frames, then
    /// at rest.
    pub fn with_apex(speed: f32, before: usize, apex: usize, after: usize) -> Self {
        let fast = ScriptedFrame::uniform(speed);
        let hover = ScriptedFrame::uniform(0.01);
        let mut frames = Vec::with_capacity(before + apex + after + 1);
        frames.extend(std::iter::repeat_n(fast, before));
        frames.extend(std::iter::repeat_n(hover, apex));
        frames.extend(std::iter::repeat_n(fast, after));
        frames.push(ScriptedFrame::STILL);
        Self::new(frames)
    }

    /// Pins the body to `orientation` for the whole trace.
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn frame(&self, index: usize) -> ScriptedFrame {
        let last = self.frames.len() - 1;
        self.frames[index.min(last)]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Clone, Debug)]
struct ScriptedBody {
    trace: ScriptedTrace,
    cursor: usize,
    position: Vec3,
    orientation: Quat,
}

impl ScriptedBody {
    fn state(&self) -> BodyState {
        let frame = self.trace.frame(self.cursor);
        BodyState {
            position: self.position,
            orientation: self.trace.orientation.unwrap_or(self.orientation),
            linear_velocity: frame.linear,
            angular_velocity: frame.angular,
        }
    }
}

/// Physics double. New bodies take the next queued trace, or the default.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    default_trace: ScriptedTrace,
    queued: VecDeque<ScriptedTrace>,
    bodies: BTreeMap<u64, ScriptedBody>,
    spawned: Vec<BodySpec>,
    next_id: u64,
    arena: Option<ArenaBounds>,
    gravity: Vec3,
    removed: usize,
    steps: u64,
}

impl ScriptedWorld {
    pub fn new(default_trace: ScriptedTrace) -> Self {
        Self {
            default_trace,
            ..Self::default()
        }
    }

    pub fn initialized(arena: &ArenaBounds, default_trace: ScriptedTrace) -> Self {
        let mut world = Self::new(default_trace);
        world.arena = Some(*arena);
        world.gravity = Vec3::new(0.0, -9.82, 0.0);
        world
    }

    pub fn set_default_trace(&mut self, trace: ScriptedTrace) {
        self.default_trace = trace;
    }

    /// Trace for the next body added.
    pub fn queue_trace(&mut self, trace: ScriptedTrace) {
        self.queued.push_back(trace);
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn arena(&self) -> Option<&ArenaBounds> {
        self.arena.as_ref()
    }

    /// Every spec passed to `add_body`, in order.
    pub fn spawned(&self) -> &[BodySpec] {
        &self.spawned
    }

    pub fn added_count(&self) -> usize {
        self.spawned.len()
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn initialize(&mut self, arena: &ArenaBounds, gravity: Vec3) -> Result<(), DiceError> {
        if self.arena.is_some() {
            return Err(DiceError::AlreadyInitialized);
        }
        self.arena = Some(*arena);
        self.gravity = gravity;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.arena.is_some()
    }

    fn add_body(&mut self, spec: BodySpec) -> BodyHandle {
        let id = self.next_id;
        self.next_id += 1;

        let trace = self
            .queued
            .pop_front()
            .unwrap_or_else(|| self.default_trace.clone());
        self.bodies.insert(
            id,
            ScriptedBody {
                trace,
                cursor: 0,
                position: spec.position,
                orientation: spec.orientation,
            },
        );
        self.spawned.push(spec);
        BodyHandle(id)
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let removed = self.bodies.remove(&handle.0).is_some();
        if removed {
            self.removed += 1;
        }
        removed
    }

    fn query_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle.0).map(ScriptedBody::state)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn teardown(&mut self) {
        self.removed += self.bodies.len();
        self.bodies.clear();
        self.arena = None;
    }
}

impl SteppedWorld for ScriptedWorld {
    fn step(&mut self, dt: f32) {
        self.steps += 1;
        for body in self.bodies.values_mut() {
            let frame = body.trace.frame(body.cursor);
            body.position += frame.linear * dt;
            body.orientation =
                (Quat::from_scaled_axis(frame.angular * dt) * body.orientation).normalize();
            body.cursor += 1;
        }
    }
}
