use meteogram::glyph::{BarbShape, RecordingSurface, Shape, cloud_alpha, draw_wind_barb};
use meteogram::models::parse_epoch_ms;
use meteogram::overlay::{GlyphOverlay, PanelPlugin, draw_overlays};
use meteogram::panel::Panel;
use meteogram::storage::load_payload_json;
use meteogram::{CoordinateMapper, PanelKind, PlotArea, Point, TimeWindow, WeatherPayload};

const HOUR: f64 = 3_600_000.0;

fn sample_payload() -> WeatherPayload {
    load_payload_json(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample_payload.json")).unwrap()
}

fn area() -> PlotArea {
    PlotArea::new(60.0, 20.0, 1060.0, 220.0)
}

/// Mapper for `panel` over `[06:00 - 3h, 06:00 + 24h]`.
fn mapper_for(panel: &Panel) -> CoordinateMapper {
    let t0 = parse_epoch_ms("2024-05-01T06:00").unwrap();
    let window = TimeWindow::new(t0 - 3.0 * HOUR, t0 + 24.0 * HOUR).unwrap();
    CoordinateMapper::new(area(), window, panel.resolved_value_axes())
}

fn clip_of(shape: &Shape) -> Option<PlotArea> {
    match shape {
        Shape::Fill { clip, .. } | Shape::Stroke { clip, .. } | Shape::Text { clip, .. } => *clip,
    }
}

#[test]
fn barb_decomposition_table() {
    let cases = [
        (0.0, (0, 0, 0)),
        (2.9, (0, 0, 0)),
        (5.0, (0, 0, 1)),
        (10.0, (0, 1, 0)),
        (47.0, (0, 4, 1)),
        (50.0, (1, 0, 0)),
        (62.0, (1, 1, 0)),
        (155.0, (3, 0, 1)),
    ];
    for (speed, counts) in cases {
        assert_eq!(BarbShape::decompose(speed).counts(), counts, "speed {speed}");
    }
}

#[test]
fn barb_for_calm_is_a_circle_only() {
    let mut s = RecordingSurface::new();
    let shape = draw_wind_barb(&mut s, Point::new(50.0, 50.0), 1.0, 90.0).unwrap();
    assert_eq!(shape, BarbShape::Calm);
    assert_eq!(s.strokes().count(), 1);
    assert_eq!(s.fills().count(), 0);
    assert_eq!(s.depth(), 0);
}

#[test]
fn cloud_alpha_endpoints() {
    assert!((cloud_alpha(0.0) - 0.1).abs() < 1e-12);
    assert!((cloud_alpha(50.0) - 0.55).abs() < 1e-12);
    assert!((cloud_alpha(100.0) - 1.0).abs() < 1e-12);
    assert!((cloud_alpha(250.0) - 1.0).abs() < 1e-12);
}

#[test]
fn winds_overlay_draws_only_anchors_inside_the_plot() {
    let payload = sample_payload();
    let panel = Panel::from_payload(PanelKind::Winds, &payload);
    let mapper = mapper_for(&panel);
    let mut s = RecordingSurface::new();

    let stats = draw_overlays(&panel, &mapper, &mut s);
    // 03:00 through 11:00 are visible, three layers each
    assert_eq!(stats.drawn, 27);
    assert_eq!(stats.skipped_outside, 9);
    assert_eq!(stats.failed, 0);
    assert!(!s.shapes().is_empty());
    assert!(s.shapes().iter().all(|shape| clip_of(shape) == Some(area())));
    assert_eq!(s.depth(), 0);
}

#[test]
fn cloud_panel_draws_blobs_and_base_labels() {
    let payload = sample_payload();
    let panel = Panel::from_payload(PanelKind::Clouds, &payload);
    let mapper = mapper_for(&panel);
    let mut s = RecordingSurface::new();

    GlyphOverlay.after_datasets_draw(&panel, &mapper, &mut s);
    let labels: Vec<String> = s
        .texts()
        .filter_map(|t| match t {
            Shape::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    // cloud bases at 03:00..11:00 in tens of feet; 05:00 has none
    assert_eq!(labels, ["250", "400", "600", "300", "180", "90", "70", "220"]);
    // two layers per visible hour; the 08:00 layer at 0% still draws faintly
    assert_eq!(s.fills().count(), 18);
}

#[test]
fn vfr_labels_sit_on_their_row() {
    let payload = sample_payload();
    let panel = Panel::from_payload(PanelKind::Vfr, &payload);
    let mapper = mapper_for(&panel);
    let mut s = RecordingSurface::new();

    let stats = draw_overlays(&panel, &mapper, &mut s);
    assert_eq!(stats.drawn, 9);
    let row = area().top + 0.65 * area().height();
    for t in s.texts() {
        let Shape::Text { at, .. } = t else { unreachable!() };
        assert!((at.y - row).abs() < 1e-9);
        assert!(area().contains(*at));
    }
}
