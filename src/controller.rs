//! Per-panel pan/zoom state machine.
//!
//! The controller never touches a panel itself: it turns pointer and wheel
//! events into candidate [`TimeWindow`]s, and the caller (see
//! [`ChartGroup`](crate::sync::ChartGroup)) commits them and propagates them.

use std::fmt;
use std::str::FromStr;

use crate::scale::TimeWindow;

/// Window span multiplier for one wheel notch away from the user.
pub const ZOOM_OUT_FACTOR: f64 = 1.1;
/// Window span multiplier for one wheel notch toward the user.
pub const ZOOM_IN_FACTOR: f64 = 0.9;

/// Modifier keys held during a wheel event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    /// Every modifier held; passes any [`ZoomGate`].
    pub const ALL: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        alt: true,
    };
}

/// Whether a wheel event is taken as a zoom gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomGate {
    /// Every wheel event zooms; page scrolling over a panel is suppressed.
    #[default]
    #[serde(alias = "none")]
    Always,
    Ctrl,
    Shift,
    Alt,
}

impl ZoomGate {
    pub fn allows(self, m: Modifiers) -> bool {
        match self {
            ZoomGate::Always => true,
            ZoomGate::Ctrl => m.ctrl,
            ZoomGate::Shift => m.shift,
            ZoomGate::Alt => m.alt,
        }
    }
}

impl fmt::Display for ZoomGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ZoomGate::Always => "none",
            ZoomGate::Ctrl => "ctrl",
            ZoomGate::Shift => "shift",
            ZoomGate::Alt => "alt",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zoom modifier `{0}` (expected none, ctrl, shift or alt)")]
pub struct ParseZoomGateError(String);

impl FromStr for ZoomGate {
    type Err = ParseZoomGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "always" => Ok(ZoomGate::Always),
            "ctrl" | "control" => Ok(ZoomGate::Ctrl),
            "shift" => Ok(ZoomGate::Shift),
            "alt" => Ok(ZoomGate::Alt),
            _ => Err(ParseZoomGateError(s.to_string())),
        }
    }
}

/// Snapshot taken when a drag starts; every move is computed against it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub origin_x: f64,
    pub window_at_start: TimeWindow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Result of a wheel event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelOutcome {
    /// The zoomed window, if the event was handled.
    pub window: Option<TimeWindow>,
    /// The host should not scroll the page for this event.
    pub suppress_default: bool,
}

impl WheelOutcome {
    pub const IGNORED: WheelOutcome = WheelOutcome {
        window: None,
        suppress_default: false,
    };
}

/// Shift a window by `delta` time units.
pub fn pan_window(window: TimeWindow, delta: f64) -> Option<TimeWindow> {
    TimeWindow::new(window.min() + delta, window.max() + delta)
}

/// Scale a window's span by `factor` about its midpoint.
pub fn zoom_window(window: TimeWindow, factor: f64) -> Option<TimeWindow> {
    if !(factor.is_finite() && factor > 0.0) {
        return None;
    }
    let mid = window.midpoint();
    let half = window.span() * factor / 2.0;
    TimeWindow::new(mid - half, mid + half)
}

#[derive(Clone, Debug, Default)]
pub struct PanZoomController {
    state: DragState,
    gate: ZoomGate,
}

impl PanZoomController {
    pub fn new(gate: ZoomGate) -> Self {
        Self {
            state: DragState::Idle,
            gate,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn gate(&self) -> ZoomGate {
        self.gate
    }

    pub fn set_gate(&mut self, gate: ZoomGate) {
        self.gate = gate;
    }

    /// Start a drag at pointer position `x` over a panel currently showing `window`.
    /// A second press while dragging restarts the session.
    pub fn pointer_down(&mut self, x: f64, window: TimeWindow) {
        if !x.is_finite() {
            log::trace!("pointer down at non-finite x ignored");
            return;
        }
        self.state = DragState::Dragging(DragSession {
            origin_x: x,
            window_at_start: window,
        });
    }

    /// The window that follows the pointer to `x`, or `None` when idle or
    /// when the plot width / starting window is unusable.
    pub fn pointer_move(&self, x: f64, plot_width: f64) -> Option<TimeWindow> {
        let DragState::Dragging(session) = self.state else {
            return None;
        };
        if !(x.is_finite() && plot_width.is_finite() && plot_width > 0.0) {
            return None;
        }
        let range = session.window_at_start.span();
        let shift = -((x - session.origin_x) / plot_width) * range;
        pan_window(session.window_at_start, shift)
    }

    /// End the drag. The last moved window was already committed by the caller.
    pub fn pointer_up(&mut self) -> bool {
        self.end_drag()
    }

    /// Leaving the panel ends a drag exactly like releasing the button.
    pub fn pointer_leave(&mut self) -> bool {
        self.end_drag()
    }

    /// Drop any drag in progress, e.g. when the window is replaced from outside.
    pub fn cancel_drag(&mut self) -> bool {
        self.end_drag()
    }

    fn end_drag(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    /// Zoom about the window midpoint: positive `delta_y` zooms out, negative zooms in.
    pub fn wheel(&self, delta_y: f64, modifiers: Modifiers, window: TimeWindow) -> WheelOutcome {
        if !self.gate.allows(modifiers) {
            return WheelOutcome::IGNORED;
        }
        let factor = if delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else if delta_y < 0.0 {
            ZOOM_IN_FACTOR
        } else {
            // zero or NaN delta
            return WheelOutcome::IGNORED;
        };
        WheelOutcome {
            window: zoom_window(window, factor),
            suppress_default: true,
        }
    }
}
