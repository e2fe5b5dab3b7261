use meteogram::models::parse_epoch_ms;
use meteogram::storage::load_payload_json;
use meteogram::{ChartGroup, Modifiers, PanelId, PanelKind, TimeWindow, WeatherPayload, ZoomGate};

const HOUR: f64 = 3_600_000.0;

fn sample_payload() -> WeatherPayload {
    load_payload_json(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample_payload.json")).unwrap()
}

fn t0() -> f64 {
    parse_epoch_ms("2024-05-01T06:00").unwrap()
}

fn group(gate: ZoomGate) -> ChartGroup {
    let mut g = ChartGroup::from_payload(&sample_payload(), gate, Some(24));
    g.reset(t0());
    g
}

fn windows(g: &ChartGroup) -> Vec<Option<TimeWindow>> {
    g.registry().iter().map(|p| p.time_axis.bounds()).collect()
}

fn assert_all_equal(g: &ChartGroup, expected: TimeWindow) {
    for panel in g.registry().iter() {
        assert_eq!(panel.time_axis.bounds(), Some(expected), "panel {}", panel.id());
    }
}

#[test]
fn every_panel_is_registered() {
    let g = group(ZoomGate::Always);
    assert_eq!(g.registry().len(), PanelKind::ALL.len());
    for kind in PanelKind::ALL {
        assert!(g.panel_by_kind(kind).is_some(), "{kind:?} missing");
    }
}

#[test]
fn reset_spans_three_hours_back_and_the_horizon_ahead() {
    let mut g = group(ZoomGate::Always);
    g.wheel(PanelKind::Clouds.id(), 120.0, Modifiers::NONE);
    let w = g.reset(t0()).unwrap();
    assert_eq!(w.min(), t0() - 3.0 * HOUR);
    assert_eq!(w.max(), t0() + 24.0 * HOUR);
    assert_all_equal(&g, w);
}

#[test]
fn reset_without_horizon_falls_back_to_the_data() {
    let mut g = ChartGroup::from_payload(&sample_payload(), ZoomGate::Always, None);
    assert!(g.reset(t0()).is_none());
    assert!(windows(&g).iter().all(Option::is_none));
    let temp = g.panel_by_kind(PanelKind::Temperature).unwrap();
    let w = temp.resolved_time_window().unwrap();
    assert_eq!(w.min(), parse_epoch_ms("2024-05-01T00:00").unwrap());
    assert_eq!(w.max(), parse_epoch_ms("2024-05-01T11:00").unwrap());
}

#[test]
fn dragging_one_panel_moves_all_of_them() {
    let mut g = group(ZoomGate::Always);
    let id = PanelKind::Winds.id();
    let start = g.registry().resolved_window(id).unwrap();

    assert!(g.pointer_down(id, 100.0));
    let moved = g.pointer_move(id, 300.0, 1000.0).unwrap();
    // 20% of the width to the right shows 20% of the span earlier
    let shift = 0.2 * start.span();
    assert!((moved.min() - (start.min() - shift)).abs() < 1e-3);
    assert!((moved.span() - start.span()).abs() < 1e-3);
    assert_all_equal(&g, moved);

    // back to the grab point restores the exact start window
    let back = g.pointer_move(id, 100.0, 1000.0).unwrap();
    assert_eq!(back, start);
    assert_all_equal(&g, start);
    assert!(g.pointer_up(id));
    assert!(!g.is_dragging(id));
}

#[test]
fn moves_after_release_do_nothing() {
    let mut g = group(ZoomGate::Always);
    let id = PanelKind::Temperature.id();
    g.pointer_down(id, 10.0);
    g.pointer_up(id);
    let before = windows(&g);
    assert!(g.pointer_move(id, 500.0, 1000.0).is_none());
    assert_eq!(windows(&g), before);
}

#[test]
fn leaving_the_panel_ends_the_drag() {
    let mut g = group(ZoomGate::Always);
    let id = PanelKind::Vfr.id();
    g.pointer_down(id, 10.0);
    assert!(g.pointer_leave(id));
    assert!(g.pointer_move(id, 500.0, 1000.0).is_none());
}

#[test]
fn zoom_out_grows_and_zoom_in_shrinks_about_the_midpoint() {
    let mut g = group(ZoomGate::Always);
    let id = PanelKind::Precipitation.id();
    let start = g.registry().resolved_window(id).unwrap();

    let mut span = start.span();
    for _ in 0..3 {
        let out = g.wheel(id, 120.0, Modifiers::NONE);
        assert!(out.suppress_default);
        let w = out.window.unwrap();
        assert!(w.span() > span);
        assert!((w.midpoint() - start.midpoint()).abs() < 1.0);
        span = w.span();
    }
    for _ in 0..6 {
        let w = g.wheel(id, -120.0, Modifiers::NONE).window.unwrap();
        assert!(w.span() < span);
        assert!((w.midpoint() - start.midpoint()).abs() < 1.0);
        span = w.span();
    }
    let last = g.registry().resolved_window(id).unwrap();
    assert_all_equal(&g, last);
}

#[test]
fn gated_zoom_needs_its_modifier() {
    let mut g = group(ZoomGate::Ctrl);
    let id = PanelKind::Temperature.id();
    let before = windows(&g);

    let ignored = g.wheel(id, 120.0, Modifiers::NONE);
    assert!(ignored.window.is_none());
    assert!(!ignored.suppress_default);
    assert_eq!(windows(&g), before);

    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    assert!(g.wheel(id, 120.0, ctrl).window.is_some());
    assert_ne!(windows(&g), before);
}

#[test]
fn unknown_panels_are_ignored() {
    let mut g = group(ZoomGate::Always);
    let ghost = PanelId::new("ghost");
    let before = windows(&g);
    assert!(!g.pointer_down(ghost, 1.0));
    assert!(g.pointer_move(ghost, 2.0, 100.0).is_none());
    assert!(g.wheel(ghost, 120.0, Modifiers::NONE).window.is_none());
    assert_eq!(windows(&g), before);
}

#[test]
fn refresh_keeps_the_view() {
    let mut g = group(ZoomGate::Always);
    let id = PanelKind::SurfaceWind.id();
    g.wheel(id, -120.0, Modifiers::NONE);
    let zoomed = g.registry().resolved_window(id).unwrap();
    g.take_redraws();

    g.refresh(&WeatherPayload::default());
    assert_all_equal(&g, zoomed);
    assert!(g.registry().iter().all(|p| p.series.iter().all(|s| s.points.is_empty())));
    assert_eq!(g.take_redraws().len(), PanelKind::ALL.len());
}
