//! Panel registry, time-window propagation and the [`ChartGroup`] façade that
//! routes pointer events to per-panel controllers.

use ahash::AHashMap;

use crate::controller::{Modifiers, PanZoomController, WheelOutcome, ZoomGate};
use crate::models::{WeatherPayload, epoch_ms};
use crate::panel::{Panel, PanelId, PanelKind, RedrawMode, build_panels, series_for};
use crate::scale::TimeWindow;

/// How far back a reset window starts.
pub const RESET_LOOKBACK_MS: f64 = 3.0 * 3_600_000.0;

/// Owns every panel of a meteogram, in display order.
#[derive(Clone, Debug, Default)]
pub struct PanelRegistry {
    panels: Vec<Panel>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a panel, replacing any panel already registered under the same id.
    pub fn register(&mut self, panel: Panel) -> PanelId {
        let id = panel.id();
        match self.panels.iter_mut().find(|p| p.id() == id) {
            Some(slot) => *slot = panel,
            None => self.panels.push(panel),
        }
        id
    }

    pub fn contains(&self, id: PanelId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id() == id)
    }

    pub fn ids(&self) -> Vec<PanelId> {
        self.panels.iter().map(Panel::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Panel> {
        self.panels.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// The window a panel currently shows (configured, else auto-scaled).
    pub fn resolved_window(&self, id: PanelId) -> Option<TimeWindow> {
        self.get(id)?.resolved_time_window()
    }
}

/// Broadcasts one panel's time window to its siblings.
pub struct ViewSynchronizer;

impl ViewSynchronizer {
    /// Give every panel other than `source` exactly `window` and ask each for an
    /// immediate redraw. The source panel is not touched. Returns how many
    /// panels were updated.
    pub fn sync(registry: &mut PanelRegistry, source: PanelId, window: TimeWindow) -> usize {
        let mut updated = 0;
        for panel in registry.iter_mut().filter(|p| p.id() != source) {
            panel.set_time_window(window);
            panel.request_redraw(RedrawMode::Immediate);
            updated += 1;
        }
        updated
    }

    /// Show `[now - 3h, now + horizon]` on every panel, or go back to
    /// auto-scaled bounds when there is no horizon. Returns the window applied.
    pub fn reset(registry: &mut PanelRegistry, now_ms: f64, horizon_hours: Option<u32>) -> Option<TimeWindow> {
        let window = horizon_hours
            .filter(|h| *h > 0)
            .and_then(|h| TimeWindow::new(now_ms - RESET_LOOKBACK_MS, now_ms + f64::from(h) * 3_600_000.0));
        for panel in registry.iter_mut() {
            match window {
                Some(w) => panel.set_time_window(w),
                None => panel.time_axis.clear(),
            }
            panel.request_redraw(RedrawMode::Immediate);
        }
        window
    }
}

/// A set of synchronized panels plus one pan/zoom controller per panel.
#[derive(Clone, Debug, Default)]
pub struct ChartGroup {
    registry: PanelRegistry,
    controllers: AHashMap<PanelId, PanZoomController>,
    gate: ZoomGate,
    horizon_hours: Option<u32>,
}

impl ChartGroup {
    pub fn new(gate: ZoomGate, horizon_hours: Option<u32>) -> Self {
        Self {
            gate,
            horizon_hours: horizon_hours.filter(|h| *h > 0),
            ..Self::default()
        }
    }

    /// All six panels built from `payload`, reset to the configured horizon.
    pub fn from_payload(payload: &WeatherPayload, gate: ZoomGate, horizon_hours: Option<u32>) -> Self {
        let mut group = Self::new(gate, horizon_hours);
        for panel in build_panels(payload) {
            group.add_panel(panel);
        }
        group.reset_now();
        group
    }

    pub fn add_panel(&mut self, panel: Panel) -> PanelId {
        let id = self.registry.register(panel);
        self.controllers.insert(id, PanZoomController::new(self.gate));
        id
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PanelRegistry {
        &mut self.registry
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.registry.get(id)
    }

    pub fn panel_by_kind(&self, kind: PanelKind) -> Option<&Panel> {
        self.registry.get(kind.id())
    }

    pub fn horizon_hours(&self) -> Option<u32> {
        self.horizon_hours
    }

    pub fn zoom_gate(&self) -> ZoomGate {
        self.gate
    }

    pub fn set_zoom_gate(&mut self, gate: ZoomGate) {
        self.gate = gate;
        for c in self.controllers.values_mut() {
            c.set_gate(gate);
        }
    }

    pub fn is_dragging(&self, id: PanelId) -> bool {
        self.controllers.get(&id).is_some_and(PanZoomController::is_dragging)
    }

    /// Commit `window` on the source panel, then propagate it.
    fn commit(&mut self, source: PanelId, window: TimeWindow) {
        if let Some(panel) = self.registry.get_mut(source) {
            panel.set_time_window(window);
            panel.request_redraw(RedrawMode::Immediate);
        }
        ViewSynchronizer::sync(&mut self.registry, source, window);
    }

    /// Returns `false` when the panel is unknown or has no window to drag yet.
    pub fn pointer_down(&mut self, id: PanelId, x: f64) -> bool {
        let Some(window) = self.registry.resolved_window(id) else {
            log::trace!("pointer down on {id} ignored: no panel or no window");
            return false;
        };
        match self.controllers.get_mut(&id) {
            Some(c) => {
                c.pointer_down(x, window);
                c.is_dragging()
            }
            None => false,
        }
    }

    /// Pan the dragged panel so the pointer at `x` follows the grab point, and
    /// bring every sibling along. `plot_width` is the panel's plot-area width in pixels.
    pub fn pointer_move(&mut self, id: PanelId, x: f64, plot_width: f64) -> Option<TimeWindow> {
        let window = self.controllers.get(&id)?.pointer_move(x, plot_width)?;
        self.commit(id, window);
        Some(window)
    }

    pub fn pointer_up(&mut self, id: PanelId) -> bool {
        self.controllers.get_mut(&id).is_some_and(PanZoomController::pointer_up)
    }

    pub fn pointer_leave(&mut self, id: PanelId) -> bool {
        self.controllers.get_mut(&id).is_some_and(PanZoomController::pointer_leave)
    }

    pub fn wheel(&mut self, id: PanelId, delta_y: f64, modifiers: Modifiers) -> WheelOutcome {
        let (Some(controller), Some(window)) = (self.controllers.get(&id), self.registry.resolved_window(id)) else {
            log::trace!("wheel on {id} ignored: no panel or no window");
            return WheelOutcome::IGNORED;
        };
        let outcome = controller.wheel(delta_y, modifiers, window);
        if let Some(w) = outcome.window {
            self.commit(id, w);
        }
        outcome
    }

    /// Reset every panel relative to `now_ms` using the group's horizon. Any
    /// drag in progress ends here; its snapshot would undo the reset.
    pub fn reset(&mut self, now_ms: f64) -> Option<TimeWindow> {
        let cancelled = self
            .controllers
            .values_mut()
            .map(PanZoomController::cancel_drag)
            .filter(|ended| *ended)
            .count();
        if cancelled > 0 {
            log::debug!("reset ended {cancelled} drag session(s)");
        }
        let window = ViewSynchronizer::reset(&mut self.registry, now_ms, self.horizon_hours);
        log::info!("view reset to {window:?}");
        window
    }

    pub fn reset_now(&mut self) -> Option<TimeWindow> {
        self.reset(epoch_ms(chrono::Utc::now()))
    }

    /// Replace every panel's series with data from `payload`. Time bounds, and
    /// any drag in progress, are kept.
    pub fn refresh(&mut self, payload: &WeatherPayload) {
        for panel in self.registry.iter_mut() {
            panel.replace_series(series_for(panel.kind(), payload));
        }
        log::info!("refreshed {} panels", self.registry.len());
    }

    /// Ids of panels with a pending redraw, clearing the requests.
    pub fn take_redraws(&mut self) -> Vec<(PanelId, RedrawMode)> {
        self.registry
            .iter_mut()
            .filter_map(|p| p.take_redraw().map(|m| (p.id(), m)))
            .collect()
    }
}
