//! Top-level engine: pointer and keyboard input, experiment runs, and the
//! per-frame drawing that ties the lever's pen tip to kymograph paper.
//!
//! `EngineCore` owns every piece of state. The host forwards pointer and key
//! events, calls [`EngineCore::tick`] once per animation frame, and applies the
//! returned [`Action`]s to its presentation layer.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use uuid::Uuid;

use crate::config::SimulatorConfig;
use crate::consts::{DEFAULT_PAPER_COLOR, MIN_REGION_SIZE_PX, SCROLL_WIDTH_FACTOR};
use crate::geom::{Point, Rect, Size, angle_of, drag_rotation};
use crate::hit::{Hit, HitKind, hit_test, regions_containing};
use crate::input::{Button, InputState, Key, Modifiers, Placement, Tool, UiState};
use crate::observations::{Observation, ObservationError, ObservationLog};
use crate::project::{ImportError, ProjectDocument};
use crate::scene::{BaseImage, CanonicalImage, DrawableRegion, ItemId, ReorderDirection, Scene, SceneError};
use crate::surface::{StrokeStyle, SurfaceError, SurfaceManager, decode_data_url};
use crate::timeline::{AnimationRun, Dosing, InjectDetails, RunKind, RunState, StartOutcome};
use crate::viewport::Viewport;

/// Actions returned from input handlers and frames for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ImageMoved { id: ItemId, x: f64, y: f64 },
    ImageRotated { id: ItemId, rotation: f64 },
    RegionMoved { id: ItemId, x: f64, y: f64 },
    RegionCreated(DrawableRegion),
    ItemRemoved { id: ItemId },
    PivotPlaced { id: ItemId, pivot: Point },
    PenTipPlaced { id: ItemId, offset: Point },
    SelectionChanged(Option<ItemId>),
    /// Region paper scrolled; `screen_offset` is the presentation scroll position.
    RegionScrolled { id: ItemId, offset: f64, screen_offset: f64 },
    /// Region content to persist, as a PNG data URL.
    SnapshotTaken { region_id: ItemId, data_url: String },
    ObservationRecorded(Observation),
    RunFinished(RunKind),
    RenderNeeded,
}

/// Error returned when an engine action is refused.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("load a base image first")]
    NoBaseImage,
    #[error("add at least one image first")]
    NoSubImages,
    #[error("no image with id {0}")]
    UnknownLever(ItemId),
    #[error("image {0} has no rotation center; place one first")]
    MissingPivot(ItemId),
    #[error("image {0} has no pen tip; place one first")]
    MissingPenTip(ItemId),
    #[error("invalid dosing: baseline {baseline}, volume {volume}")]
    InvalidDosing { baseline: f64, volume: f64 },
    #[error("a run is in progress; wait for it to finish")]
    RunInProgress,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("failed to serialize project: {0}")]
    Export(#[from] serde_json::Error),
}

/// Core engine state.
pub struct EngineCore {
    pub config: SimulatorConfig,
    pub scene: Scene,
    pub viewport: Viewport,
    pub surfaces: SurfaceManager,
    pub ui: UiState,
    pub input: InputState,
    pub run: Option<AnimationRun>,
    pub log: ObservationLog,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let canvas = Size::new(config.default_canvas_width, config.default_canvas_height);
        let mut viewport = Viewport::new(config.viewport_padding, config.viewport_max_height);
        viewport.set_content(canvas);
        Self {
            config,
            scene: Scene::new(canvas),
            viewport,
            surfaces: SurfaceManager::new(),
            ui: UiState::default(),
            input: InputState::default(),
            run: None,
            log: ObservationLog::new(),
        }
    }

    // --- Scene setup ---

    /// Set the base image and refit the viewport to its dimensions.
    pub fn set_base_image(&mut self, base: BaseImage) {
        self.scene.set_base_image(base);
        self.viewport.set_content(self.scene.canvas_size());
    }

    /// Container moved or resized.
    pub fn set_container(&mut self, origin: Point, size: Size) {
        self.viewport.set_container(origin, size);
    }

    /// Add a freshly uploaded asset at the next cascade position.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateId`] if the id is taken.
    pub fn add_uploaded_image(
        &mut self,
        id: impl Into<ItemId>,
        url: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Result<CanonicalImage, SceneError> {
        self.scene.add_uploaded_image(id, url, width, height).cloned()
    }

    /// Add a drawable region and make its surface known.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateId`] if the id is taken.
    pub fn add_region(&mut self, region: DrawableRegion) -> Result<(), SceneError> {
        let id = region.id.clone();
        self.scene.add_region(region)?;
        self.surfaces.register(&id);
        Ok(())
    }

    /// Remove an image or region. A run animating the removed image is dropped.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] if nothing has this id.
    pub fn remove_item(&mut self, id: &str) -> Result<Action, ActionError> {
        if self.scene.image(id).is_some() {
            if self.run.as_ref().is_some_and(|run| run.lever_id == id) {
                self.supersede_run("lever removed");
            }
            self.scene.remove_image(id)?;
        } else {
            self.scene.remove_region(id)?;
            self.surfaces.unregister(id);
        }
        if self.ui.selected_id.as_deref() == Some(id) {
            self.ui.selected_id = None;
        }
        if self.ui.armed.as_ref().is_some_and(|p| p.image_id() == id) {
            self.ui.armed = None;
        }
        self.input = InputState::Idle;
        Ok(Action::ItemRemoved { id: id.to_owned() })
    }

    /// Swap draw order with the neighbour above or below.
    ///
    /// # Errors
    ///
    /// [`ActionError::RunInProgress`] during a run, [`SceneError::UnknownItem`]
    /// if nothing has this id.
    pub fn reorder(&mut self, id: &str, direction: ReorderDirection) -> Result<bool, ActionError> {
        self.ensure_idle()?;
        Ok(self.scene.reorder(id, direction)?)
    }

    /// Numeric position entry. Not clamped.
    ///
    /// # Errors
    ///
    /// [`ActionError::RunInProgress`] during a run, [`SceneError::UnknownItem`]
    /// if no image has this id.
    pub fn set_image_position(&mut self, id: &str, x: f64, y: f64) -> Result<Action, ActionError> {
        self.ensure_idle()?;
        self.scene.set_image_position(id, x, y)?;
        Ok(Action::ImageMoved { id: id.to_owned(), x, y })
    }

    // --- Tool / selection / placement ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
        self.input = InputState::Idle;
    }

    /// Change the selection. Returns a `SelectionChanged` action only on change.
    pub fn select(&mut self, id: Option<ItemId>) -> Vec<Action> {
        if self.ui.selected_id == id {
            return Vec::new();
        }
        self.ui.selected_id.clone_from(&id);
        vec![Action::SelectionChanged(id)]
    }

    /// Arm the next click to place a pivot or pen tip.
    ///
    /// # Errors
    ///
    /// [`ActionError::RunInProgress`] during a run, [`ActionError::UnknownLever`]
    /// if the image does not exist, and [`ActionError::MissingPivot`] when arming
    /// a pen tip on an image with no pivot.
    pub fn arm_placement(&mut self, placement: Placement) -> Result<(), ActionError> {
        self.ensure_idle()?;
        let image = self
            .scene
            .image(placement.image_id())
            .ok_or_else(|| ActionError::UnknownLever(placement.image_id().to_owned()))?;
        if matches!(placement, Placement::PenTip(_)) && image.pivot.is_none() {
            return Err(ActionError::MissingPivot(image.id.clone()));
        }
        self.ui.armed = Some(placement);
        Ok(())
    }

    pub fn disarm_placement(&mut self) {
        self.ui.armed = None;
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        if self.is_running() {
            tracing::debug!("pointer ignored; run in progress");
            return Vec::new();
        }
        let pt = self.viewport.screen_to_canonical(screen_pt);
        if let Some(placement) = self.ui.armed.take() {
            return self.place(placement, pt);
        }
        match self.ui.tool {
            Tool::Region => {
                self.input = InputState::DrawingRegion { anchor: pt, current: pt };
                Vec::new()
            }
            Tool::Move => self.begin_move(pt),
            Tool::Rotate => self.begin_rotate(pt),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.screen_to_canonical(screen_pt);
        match self.input.clone() {
            InputState::Idle => Vec::new(),
            InputState::DraggingImage { id, grab } => match self.scene.move_image(&id, pt.x - grab.x, pt.y - grab.y) {
                Ok(p) => vec![Action::ImageMoved { id, x: p.x, y: p.y }],
                Err(e) => self.abandon_gesture(&e),
            },
            InputState::DraggingRegion { id, grab } => match self.scene.move_region(&id, pt.x - grab.x, pt.y - grab.y)
            {
                Ok(p) => vec![Action::RegionMoved { id, x: p.x, y: p.y }],
                Err(e) => self.abandon_gesture(&e),
            },
            InputState::Rotating { id, pivot, rotation_at_start, angle_at_start } => {
                let rotation = drag_rotation(rotation_at_start, angle_at_start, angle_of(pivot.x, pivot.y, pt.x, pt.y));
                match self.scene.set_rotation(&id, rotation) {
                    Ok(()) => vec![Action::ImageRotated { id, rotation }],
                    Err(e) => self.abandon_gesture(&e),
                }
            }
            InputState::DrawingRegion { anchor, .. } => {
                self.input = InputState::DrawingRegion { anchor, current: pt };
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let pt = self.viewport.screen_to_canonical(screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::DrawingRegion { anchor, .. } => self.finish_region(anchor, pt),
            _ => Vec::new(),
        }
    }

    /// Rectangle of the region being dragged out, for preview rendering.
    #[must_use]
    pub fn region_preview(&self) -> Option<Rect> {
        match &self.input {
            InputState::DrawingRegion { anchor, current } => Some(Rect::from_corners(*anchor, *current)),
            _ => None,
        }
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is_escape() {
            self.ui.armed = None;
            self.input = InputState::Idle;
            return vec![Action::RenderNeeded];
        }
        if self.is_running() {
            return Vec::new();
        }
        let Some(id) = self.ui.selected_id.clone() else {
            return Vec::new();
        };
        if let Some((dx, dy)) = key.arrow_direction() {
            let step = modifiers.nudge_step();
            return self.nudge(&id, dx * step, dy * step);
        }
        if key.is_delete() {
            return match self.remove_item(&id) {
                Ok(action) => vec![action],
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "delete failed");
                    Vec::new()
                }
            };
        }
        Vec::new()
    }

    // --- Region surfaces ---

    /// Allocate a region's surface, optionally from a persisted snapshot, and
    /// replay draws that arrived before it was mounted.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownItem`] for unknown regions, [`SurfaceError`] for
    /// allocation or snapshot decode failures.
    pub fn mount_region(&mut self, id: &str, snapshot_data_url: Option<&str>) -> Result<bool, ActionError> {
        let region = self
            .scene
            .region(id)
            .cloned()
            .ok_or_else(|| SceneError::UnknownItem(id.to_owned()))?;
        let bytes = snapshot_data_url.map(decode_data_url).transpose()?;
        Ok(self.surfaces.mount(&region, bytes.as_deref())?)
    }

    /// Snapshot of a mounted region as a PNG data URL.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Encode`] if encoding fails.
    pub fn snapshot_region(&self, id: &str) -> Result<Option<String>, SurfaceError> {
        self.surfaces.snapshot_data_url(id)
    }

    /// Undo the most recent stroke on a region.
    pub fn undo_last_stroke(&mut self, id: &str) -> bool {
        self.surfaces.undo_last_stroke(id)
    }

    /// Scroll a region's paper. Returns the applied offset as an action.
    pub fn scroll_region(&mut self, id: &str, offset: f64) -> Option<Action> {
        let applied = self.surfaces.scroll_to(id, offset)?;
        Some(self.scrolled(id, applied))
    }

    // --- Experiment runs ---

    /// Whether a run is in progress (running or paused).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(AnimationRun::is_active)
    }

    /// Wash the lever back to rest.
    ///
    /// Returns [`StartOutcome::Busy`] without side effects while another run is active.
    ///
    /// # Errors
    ///
    /// Precondition failures; nothing is mutated.
    pub fn start_wash(&mut self, lever_id: &str, now_ms: f64) -> Result<StartOutcome, ActionError> {
        if self.is_running() {
            tracing::debug!(lever = %lever_id, "wash ignored; run in progress");
            return Ok(StartOutcome::Busy);
        }
        let (rotation, pen) = self.check_lever(lever_id)?;
        let run = AnimationRun::wash(lever_id, rotation, pen, &self.config.timeline);
        Ok(self.begin_run(run, now_ms))
    }

    /// Inject a dose and swing the lever to the resulting deflection.
    ///
    /// Returns [`StartOutcome::Busy`] without side effects while another run is active.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidDosing`] and the lever preconditions; nothing is mutated.
    pub fn start_inject(&mut self, lever_id: &str, dosing: Dosing, now_ms: f64) -> Result<StartOutcome, ActionError> {
        if self.is_running() {
            tracing::debug!(lever = %lever_id, "inject ignored; run in progress");
            return Ok(StartOutcome::Busy);
        }
        if !dosing.is_valid() {
            return Err(ActionError::InvalidDosing { baseline: dosing.baseline, volume: dosing.volume });
        }
        let (rotation, pen) = self.check_lever(lever_id)?;
        let outcome = self.config.dose.evaluate(dosing, self.config.max_angle_deg);
        tracing::debug!(
            dose = outcome.dose,
            concentration = outcome.concentration,
            response = outcome.response_percent,
            target = outcome.target_rotation,
            "dose evaluated"
        );
        let details = InjectDetails { dosing, outcome };
        let run = AnimationRun::inject(lever_id, rotation, pen, details, &self.config.timeline);
        Ok(self.begin_run(run, now_ms))
    }

    pub fn pause(&mut self, now_ms: f64) -> bool {
        self.run.as_mut().is_some_and(|run| run.pause(now_ms))
    }

    pub fn resume(&mut self, now_ms: f64) -> bool {
        self.run.as_mut().is_some_and(|run| run.resume(now_ms))
    }

    /// Advance the active run to `now_ms`: write the lever rotation, trace the
    /// pen tip onto any region it is over, and finish the run at full duration.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let Some(run) = self.run.as_ref() else {
            return Vec::new();
        };
        if run.state() != RunState::Running {
            return Vec::new();
        }
        let frame = run.sample(now_ms);
        let lever_id = run.lever_id.clone();
        let kind = run.kind;

        if let Err(e) = self.scene.set_rotation(&lever_id, frame.rotation) {
            tracing::warn!(lever = %lever_id, error = %e, "lever vanished mid-run");
            self.supersede_run("lever missing");
            return Vec::new();
        }
        let mut actions = vec![Action::ImageRotated { id: lever_id.clone(), rotation: frame.rotation }];
        if kind == RunKind::Inject {
            self.trace_pen(&lever_id, frame.progress, &mut actions);
        }
        if frame.finished {
            self.finish_run(&mut actions);
        }
        actions
    }

    /// Clear every surface, return every image to 0 degrees, and empty the log.
    pub fn reset_experiment(&mut self) {
        self.supersede_run("experiment reset");
        self.surfaces.reset_all();
        self.scene.reset_rotations();
        self.log.clear();
        tracing::info!("experiment reset");
    }

    // --- Observations ---

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        self.log.entries()
    }

    /// Enter a measured response.
    ///
    /// # Errors
    ///
    /// [`ObservationError::UnknownEntry`] for an unknown row.
    pub fn set_response(&mut self, s_no: u32, response: &str) -> Result<(), ObservationError> {
        self.log.set_response(s_no, response)
    }

    pub fn set_max_response(&mut self, max_response: Option<f64>) {
        self.log.set_max_response(max_response);
    }

    // --- Projects ---

    /// Replace the scene with a bootstrap document. On any error the current
    /// scene is left untouched.
    ///
    /// # Errors
    ///
    /// [`ActionError::Import`] for malformed or invalid documents.
    pub fn import_project(&mut self, json: &str) -> Result<(), ActionError> {
        let scene = ProjectDocument::parse(json)?.to_scene()?;
        self.supersede_run("project replaced");
        self.surfaces = SurfaceManager::new();
        for region in scene.regions() {
            self.surfaces.register(&region.id);
        }
        self.scene = scene;
        self.viewport.set_content(self.scene.canvas_size());
        self.ui.selected_id = None;
        self.ui.armed = None;
        self.input = InputState::Idle;
        tracing::info!(items = self.scene.len(), "project imported");
        Ok(())
    }

    /// Serialize the scene as a bootstrap document.
    ///
    /// # Errors
    ///
    /// [`ActionError::NoBaseImage`] when there is nothing to anchor the document.
    pub fn export_project(&self) -> Result<String, ActionError> {
        let doc = ProjectDocument::from_scene(&self.scene).ok_or(ActionError::NoBaseImage)?;
        Ok(doc.to_json()?)
    }

    // --- Internals ---

    fn check_lever(&self, lever_id: &str) -> Result<(f64, Point), ActionError> {
        if self.scene.base_image().is_none() {
            return Err(ActionError::NoBaseImage);
        }
        if self.scene.images().is_empty() {
            return Err(ActionError::NoSubImages);
        }
        let lever = self
            .scene
            .image(lever_id)
            .ok_or_else(|| ActionError::UnknownLever(lever_id.to_owned()))?;
        if lever.pivot.is_none() {
            return Err(ActionError::MissingPivot(lever_id.to_owned()));
        }
        let pen = lever
            .pen_tip()
            .ok_or_else(|| ActionError::MissingPenTip(lever_id.to_owned()))?;
        Ok((lever.rotation, pen))
    }

    fn begin_run(&mut self, mut run: AnimationRun, now_ms: f64) -> StartOutcome {
        run.start(now_ms);
        self.input = InputState::Idle;
        self.ui.armed = None;
        tracing::info!(
            kind = ?run.kind,
            lever = %run.lever_id,
            from = run.start_rotation,
            to = run.target_rotation,
            "run started"
        );
        self.run = Some(run);
        StartOutcome::Started
    }

    fn ensure_idle(&self) -> Result<(), ActionError> {
        if self.is_running() { Err(ActionError::RunInProgress) } else { Ok(()) }
    }

    fn supersede_run(&mut self, reason: &str) {
        if let Some(mut run) = self.run.take() {
            if run.is_active() {
                run.supersede();
                tracing::info!(kind = ?run.kind, lever = %run.lever_id, reason, "run superseded");
            }
        }
    }

    /// Draw the current pen tip on every region containing it, scrolling each
    /// region forward in proportion to progress.
    fn trace_pen(&mut self, lever_id: &str, progress: f64, actions: &mut Vec<Action>) {
        let Some(pen) = self.scene.image(lever_id).and_then(CanonicalImage::pen_tip) else {
            return;
        };
        let budget = self.config.timeline.inject_scroll_budget;
        let hits: Vec<DrawableRegion> = regions_containing(pen, &self.scene).into_iter().cloned().collect();
        for region in hits {
            let Some(run) = self.run.as_mut() else {
                return;
            };
            let origin = run.touch_region(&region.id, self.surfaces.scroll_offset(&region.id));
            let desired = origin + budget * progress;
            if let Err(e) = self.surfaces.grow_if_needed(&region.id, desired + region.width) {
                tracing::warn!(region = %region.id, error = %e, "surface growth failed; skipping frame");
                continue;
            }
            let scroll = self.surfaces.scroll_to(&region.id, desired).unwrap_or(desired);
            let local = pen.sub(Point::new(region.x, region.y));
            self.surfaces
                .draw_segment(&region.id, Point::new(local.x + scroll, local.y), StrokeStyle::injection());
            actions.push(self.scrolled(&region.id, scroll));
        }
    }

    fn finish_run(&mut self, actions: &mut Vec<Action>) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        run.complete();
        match run.kind {
            RunKind::Wash => self.finish_wash(&run, actions),
            RunKind::Inject => self.finish_inject(&run, actions),
        }
        tracing::info!(kind = ?run.kind, lever = %run.lever_id, "run completed");
        actions.push(Action::RunFinished(run.kind));
    }

    /// One straight wash stroke from where the pen started to its rest position,
    /// then a little spacing before the next action.
    fn finish_wash(&mut self, run: &AnimationRun, actions: &mut Vec<Action>) {
        let Some(end) = self.scene.image(&run.lever_id).and_then(|img| img.pen_tip_at(0.0)) else {
            return;
        };
        let nudge = self.config.timeline.wash_scroll_nudge;
        let hits: Vec<DrawableRegion> = regions_containing(end, &self.scene).into_iter().cloned().collect();
        for region in hits {
            let origin = Point::new(region.x, region.y);
            let scroll = self.surfaces.scroll_offset(&region.id);
            let from = run.pen_start.sub(origin);
            let to = end.sub(origin);
            if let Err(e) = self.surfaces.grow_if_needed(&region.id, scroll + nudge + region.width) {
                tracing::warn!(region = %region.id, error = %e, "surface growth failed; skipping wash stroke");
                continue;
            }
            self.surfaces.draw_line(
                &region.id,
                Point::new(from.x + scroll, from.y),
                Point::new(to.x + scroll, to.y),
                StrokeStyle::wash(),
            );
            let applied = self.surfaces.scroll_to(&region.id, scroll + nudge).unwrap_or(scroll + nudge);
            actions.push(self.scrolled(&region.id, applied));
        }
    }

    /// Persist what was drawn and record the observation.
    fn finish_inject(&mut self, run: &AnimationRun, actions: &mut Vec<Action>) {
        let Some(details) = run.inject else {
            return;
        };
        for region_id in run.drawn_regions() {
            match self.surfaces.snapshot_data_url(region_id) {
                Ok(Some(data_url)) => {
                    actions.push(Action::SnapshotTaken { region_id: region_id.to_owned(), data_url });
                }
                Ok(None) => tracing::debug!(region = %region_id, "region not mounted; no snapshot"),
                Err(e) => tracing::warn!(region = %region_id, error = %e, "snapshot failed"),
            }
        }
        let observation = self
            .log
            .record_injection(details.dosing.baseline, details.dosing.volume, details.outcome.concentration)
            .clone();
        actions.push(Action::ObservationRecorded(observation));
    }

    fn scrolled(&self, id: &str, offset: f64) -> Action {
        Action::RegionScrolled {
            id: id.to_owned(),
            offset,
            screen_offset: self.viewport.canonical_dist_to_screen(offset),
        }
    }

    fn begin_move(&mut self, pt: Point) -> Vec<Action> {
        let hit = hit_test(pt, &self.scene);
        let actions = self.select(hit.as_ref().map(|h| h.item_id.clone()));
        match hit {
            Some(Hit { item_id, kind: HitKind::Image }) => {
                if let Some(img) = self.scene.image(&item_id) {
                    let grab = pt.sub(img.top_left());
                    self.input = InputState::DraggingImage { id: item_id, grab };
                }
            }
            Some(Hit { item_id, kind: HitKind::Region }) => {
                if let Some(region) = self.scene.region(&item_id) {
                    let grab = pt.sub(Point::new(region.x, region.y));
                    self.input = InputState::DraggingRegion { id: item_id, grab };
                }
            }
            None => {}
        }
        actions
    }

    fn begin_rotate(&mut self, pt: Point) -> Vec<Action> {
        let Some(Hit { item_id, kind: HitKind::Image }) = hit_test(pt, &self.scene) else {
            return self.select(None);
        };
        let actions = self.select(Some(item_id.clone()));
        let Some(img) = self.scene.image(&item_id) else {
            return actions;
        };
        let Some(pivot) = img.pivot else {
            tracing::debug!(id = %item_id, "rotate ignored; no pivot");
            return actions;
        };
        self.input = InputState::Rotating {
            id: item_id,
            pivot,
            rotation_at_start: img.rotation,
            angle_at_start: angle_of(pivot.x, pivot.y, pt.x, pt.y),
        };
        actions
    }

    fn place(&mut self, placement: Placement, pt: Point) -> Vec<Action> {
        let result = match &placement {
            Placement::Pivot(id) => self
                .scene
                .set_pivot(id, pt.x, pt.y)
                .map(|()| Action::PivotPlaced { id: id.clone(), pivot: pt }),
            Placement::PenTip(id) => {
                let top_left = self.scene.image(id).map_or(pt, CanonicalImage::top_left);
                let offset = pt.sub(top_left);
                self.scene
                    .set_pen_tip_offset(id, offset.x, offset.y)
                    .map(|()| Action::PenTipPlaced { id: id.clone(), offset })
            }
        };
        match result {
            Ok(action) => vec![action],
            Err(e) => {
                tracing::warn!(error = %e, "placement failed");
                Vec::new()
            }
        }
    }

    fn finish_region(&mut self, anchor: Point, end: Point) -> Vec<Action> {
        let rect = Rect::from_corners(anchor, end);
        if rect.width < MIN_REGION_SIZE_PX || rect.height < MIN_REGION_SIZE_PX {
            tracing::debug!(width = rect.width, height = rect.height, "region too small; discarded");
            return Vec::new();
        }
        let region = DrawableRegion {
            id: Uuid::new_v4().to_string(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            scroll_width: rect.width * SCROLL_WIDTH_FACTOR,
            z_index: self.scene.next_z(),
            color: DEFAULT_PAPER_COLOR.to_owned(),
        };
        match self.add_region(region.clone()) {
            Ok(()) => vec![Action::RegionCreated(region)],
            Err(e) => {
                tracing::warn!(error = %e, "region creation failed");
                Vec::new()
            }
        }
    }

    fn nudge(&mut self, id: &str, dx: f64, dy: f64) -> Vec<Action> {
        if self.scene.image(id).is_some() {
            return match self.scene.nudge_image(id, dx, dy) {
                Ok(p) => vec![Action::ImageMoved { id: id.to_owned(), x: p.x, y: p.y }],
                Err(e) => self.abandon_gesture(&e),
            };
        }
        let Some(region) = self.scene.region(id) else {
            return Vec::new();
        };
        let (x, y) = (region.x + dx, region.y + dy);
        match self.scene.move_region(id, x, y) {
            Ok(p) => vec![Action::RegionMoved { id: id.to_owned(), x: p.x, y: p.y }],
            Err(e) => self.abandon_gesture(&e),
        }
    }

    fn abandon_gesture(&mut self, error: &SceneError) -> Vec<Action> {
        tracing::warn!(error = %error, "gesture target missing; gesture cancelled");
        self.input = InputState::Idle;
        Vec::new()
    }
}
