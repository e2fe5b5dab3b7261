use std::fs;

use meteogram::models::parse_epoch_ms;
use meteogram::overlay::default_plugins;
use meteogram::storage::load_payload_json;
use meteogram::viz::{self, Gutters, render_panel_rgb};
use meteogram::{ChartGroup, MeteogramError, Modifiers, PanelKind, WeatherPayload, ZoomGate};

fn sample_group() -> ChartGroup {
    let payload =
        load_payload_json(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample_payload.json")).unwrap();
    let mut g = ChartGroup::from_payload(&payload, ZoomGate::Always, Some(24));
    g.reset(parse_epoch_ms("2024-05-01T06:00").unwrap());
    g
}

#[test]
fn svg_contains_every_panel() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("meteogram.svg");
    viz::render_group_to_file(&sample_group(), &out, 1000, 220).unwrap();

    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.starts_with("<svg"));
    for kind in PanelKind::ALL {
        assert!(svg.contains(kind.title()), "missing caption {}", kind.title());
    }
}

#[test]
fn png_is_written_after_zooming() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("meteogram.png");
    let mut g = sample_group();
    g.wheel(PanelKind::Temperature.id(), -120.0, Modifiers::NONE);
    viz::render_group_to_file(&g, &out, 800, 200).unwrap();
    let meta = fs::metadata(&out).unwrap();
    assert!(meta.len() > 0);
}

#[test]
fn empty_payload_still_renders_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.svg");
    let g = ChartGroup::from_payload(&WeatherPayload::default(), ZoomGate::Always, None);
    viz::render_group_to_file(&g, &out, 600, 120).unwrap();
    assert!(fs::read_to_string(&out).unwrap().contains("no data"));
}

#[test]
fn zero_sized_canvas_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = viz::render_group_to_file(&sample_group(), dir.path().join("x.png"), 0, 200).unwrap_err();
    assert!(matches!(err, MeteogramError::Empty(_)));
}

#[test]
fn panel_buffer_matches_its_size_and_plot_area() {
    let g = sample_group();
    let panel = g.panel_by_kind(PanelKind::Winds).unwrap();
    let gutters = Gutters::for_panels(g.registry().iter());
    let (buf, mapper) = render_panel_rgb(panel, gutters, &default_plugins(), 640, 180).unwrap();
    assert_eq!(buf.len(), 640 * 180 * 3);

    let mapper = mapper.unwrap();
    let area = mapper.area();
    assert!(area.left >= f64::from(gutters.left));
    assert!(area.right <= 640.0 - f64::from(gutters.right));
    assert!(area.width() > 0.0 && area.height() > 0.0);
    assert_eq!(mapper.time_window(), panel.resolved_time_window().unwrap());
}

#[test]
fn stacked_panels_share_plot_edges() {
    let g = sample_group();
    let gutters = Gutters::for_panels(g.registry().iter());
    let plugins = default_plugins();
    let areas: Vec<_> = g
        .registry()
        .iter()
        .map(|p| render_panel_rgb(p, gutters, &plugins, 700, 160).unwrap().1.unwrap().area())
        .collect();
    for a in &areas[1..] {
        assert_eq!(a.left, areas[0].left);
        assert_eq!(a.right, areas[0].right);
    }
}
