//! Wash and inject runs: one parameterized timeline driving lever rotation.
//!
//! A run animates a single image's rotation from where it is now to a target,
//! sampled once per frame from the host clock. Wash returns the lever to 0 with
//! a fast-then-slowing exponential ease; inject swings it to a dose-dependent
//! deflection along a logistic S-curve. The engine owns at most one run and
//! drives the drawing side effects from the frames sampled here.

#[cfg(test)]
#[path = "timeline_test.rs"]
mod timeline_test;

use std::collections::BTreeMap;

use crate::config::{DoseResponse, TimelineTuning};
use crate::geom::Point;
use crate::scene::ItemId;

/// Which experiment action a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Wash,
    Inject,
}

/// Progress-to-fraction mapping for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// `1 - e^(-k p)`: fast start, slowing toward the target.
    ExponentialDecay { k: f64 },
    /// `1 / (1 + e^(-s (p - 0.5)))`: S-curve centred on the midpoint.
    Logistic { steepness: f64 },
}

impl Easing {
    /// Eased fraction for `progress` in `[0, 1]`. Out-of-range input is clamped.
    #[must_use]
    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Self::ExponentialDecay { k } => 1.0 - (-k * p).exp(),
            Self::Logistic { steepness } => 1.0 / (1.0 + (-steepness * (p - 0.5)).exp()),
        }
    }
}

/// Caller-selected inputs of an injection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dosing {
    /// Stock concentration of the drug.
    pub baseline: f64,
    /// Volume added to the bath.
    pub volume: f64,
}

impl Dosing {
    #[must_use]
    pub fn new(baseline: f64, volume: f64) -> Self {
        Self { baseline, volume }
    }

    /// Both inputs finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.baseline.is_finite() && self.volume.is_finite() && self.baseline >= 0.0 && self.volume >= 0.0
    }

    #[must_use]
    pub fn dose(&self) -> f64 {
        self.baseline * self.volume
    }
}

/// Everything derived from a [`Dosing`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseOutcome {
    pub dose: f64,
    /// Concentration in the bath after the injection.
    pub concentration: f64,
    pub response_percent: f64,
    /// Lever rotation in degrees; negative deflects counter-clockwise.
    pub target_rotation: f64,
}

/// Hill response in percent: `100 c^n / (EC50^n + c^n)`.
///
/// Zero, negative, and NaN concentrations give no response.
#[must_use]
pub fn response_percent(concentration: f64, ec50: f64, hill_n: f64) -> f64 {
    if concentration.is_nan() || concentration <= 0.0 {
        return 0.0;
    }
    let c = concentration.powf(hill_n);
    100.0 * c / (ec50.powf(hill_n) + c)
}

/// Lever deflection for a response: `-(response / 100) * max_angle`.
#[must_use]
pub fn deflection(response_percent: f64, max_angle_deg: f64) -> f64 {
    -(response_percent / 100.0) * max_angle_deg
}

impl DoseResponse {
    /// Run the dose through the bath and the Hill curve.
    #[must_use]
    pub fn evaluate(&self, dosing: Dosing, max_angle_deg: f64) -> DoseOutcome {
        let dose = dosing.dose();
        let concentration = dose / self.bath_volume;
        let response = response_percent(concentration, self.ec50, self.hill_n);
        DoseOutcome {
            dose,
            concentration,
            response_percent: response,
            target_rotation: deflection(response, max_angle_deg),
        }
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
    /// Dropped before completion (experiment reset, project replaced, lever removed).
    Superseded,
}

/// Result of asking the engine to start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Another run is in progress; the request was ignored.
    Busy,
}

/// One sampled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub elapsed_ms: f64,
    /// Linear progress in `[0, 1]`.
    pub progress: f64,
    pub rotation: f64,
    /// Elapsed time reached the duration; `rotation` is exactly the target.
    pub finished: bool,
}

/// Inject-only bookkeeping carried to completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectDetails {
    pub dosing: Dosing,
    pub outcome: DoseOutcome,
}

/// A single wash or inject animation.
#[derive(Debug, Clone)]
pub struct AnimationRun {
    pub kind: RunKind,
    pub lever_id: ItemId,
    pub start_rotation: f64,
    pub target_rotation: f64,
    pub duration_ms: f64,
    pub easing: Easing,
    /// Pen tip at the moment the run started.
    pub pen_start: Point,
    pub inject: Option<InjectDetails>,
    state: RunState,
    started_at: f64,
    /// Elapsed time frozen by [`Self::pause`].
    paused_elapsed: f64,
    /// Regions drawn on during this run, with their scroll offset at first contact.
    regions: BTreeMap<ItemId, f64>,
}

impl AnimationRun {
    /// Wash back to rest.
    #[must_use]
    pub fn wash(lever_id: impl Into<ItemId>, start_rotation: f64, pen_start: Point, tuning: &TimelineTuning) -> Self {
        Self {
            kind: RunKind::Wash,
            lever_id: lever_id.into(),
            start_rotation,
            target_rotation: 0.0,
            duration_ms: tuning.wash_duration_ms,
            easing: Easing::ExponentialDecay { k: tuning.wash_decay_k },
            pen_start,
            inject: None,
            state: RunState::Idle,
            started_at: 0.0,
            paused_elapsed: 0.0,
            regions: BTreeMap::new(),
        }
    }

    /// Inject toward the dose outcome's deflection.
    #[must_use]
    pub fn inject(
        lever_id: impl Into<ItemId>,
        start_rotation: f64,
        pen_start: Point,
        details: InjectDetails,
        tuning: &TimelineTuning,
    ) -> Self {
        Self {
            kind: RunKind::Inject,
            target_rotation: details.outcome.target_rotation,
            duration_ms: tuning.inject_duration_ms,
            easing: Easing::Logistic { steepness: tuning.inject_steepness },
            inject: Some(details),
            ..Self::wash(lever_id, start_rotation, pen_start, tuning)
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Running or paused.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, RunState::Running | RunState::Paused)
    }

    /// Begin at `now_ms`. Only an idle run can start.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.state != RunState::Idle {
            return false;
        }
        self.started_at = now_ms;
        self.state = RunState::Running;
        true
    }

    /// Elapsed time at `now_ms`, clamped to `[0, duration]`.
    #[must_use]
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        let raw = match self.state {
            RunState::Running => now_ms - self.started_at,
            RunState::Paused => self.paused_elapsed,
            RunState::Completed => self.duration_ms,
            RunState::Idle | RunState::Superseded => 0.0,
        };
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, self.duration_ms.max(0.0)) }
    }

    /// Sample rotation at `now_ms`. A finished frame carries the exact target.
    #[must_use]
    pub fn sample(&self, now_ms: f64) -> Frame {
        let elapsed_ms = self.elapsed(now_ms);
        let progress = if self.duration_ms > 0.0 { elapsed_ms / self.duration_ms } else { 1.0 };
        let finished = progress >= 1.0;
        let rotation = if finished {
            self.target_rotation
        } else {
            self.start_rotation + (self.target_rotation - self.start_rotation) * self.easing.apply(progress)
        };
        Frame { elapsed_ms, progress, rotation, finished }
    }

    /// Freeze elapsed time. Returns whether the run was running.
    pub fn pause(&mut self, now_ms: f64) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        self.paused_elapsed = self.elapsed(now_ms);
        self.state = RunState::Paused;
        tracing::debug!(kind = ?self.kind, elapsed_ms = self.paused_elapsed, "run paused");
        true
    }

    /// Continue from the frozen offset. Returns whether the run was paused.
    pub fn resume(&mut self, now_ms: f64) -> bool {
        if self.state != RunState::Paused {
            return false;
        }
        self.started_at = now_ms - self.paused_elapsed;
        self.state = RunState::Running;
        tracing::debug!(kind = ?self.kind, elapsed_ms = self.paused_elapsed, "run resumed");
        true
    }

    pub fn complete(&mut self) {
        self.state = RunState::Completed;
    }

    pub fn supersede(&mut self) {
        self.state = RunState::Superseded;
    }

    /// Remember a region the pen wrote on. The first call fixes its scroll origin;
    /// returns that origin.
    pub fn touch_region(&mut self, region_id: &str, scroll: f64) -> f64 {
        *self.regions.entry(region_id.to_owned()).or_insert(scroll)
    }

    /// Regions written on so far, in id order.
    pub fn drawn_regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }
}
