/*!
 * Desktop viewer for meteogram - synchronized, pan/zoomable weather panels
 *
 * - Drag any panel to pan every panel in time
 * - Wheel over a panel to zoom every panel (optionally only with a modifier held)
 * - Hover a panel to read the samples under the pointer
 * - "Reset view" returns to the last three hours plus the configured horizon
 * - Data is re-fetched in the background on the configured interval
 *
 * Platform support: Windows, macOS, Linux
 */

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use meteogram::overlay::{PanelPlugin, default_plugins};
use meteogram::readout::readout_at_px;
use meteogram::viz::{Gutters, render_panel_rgb};
use meteogram::{
    ChartGroup, Client, CoordinateMapper, Modifiers, PanelId, RedrawMode, ViewerConfig, WeatherPayload,
    ZoomGate,
};
use meteogram::{storage, viz};

#[derive(Parser, Debug)]
#[command(name = "meteogram-gui", version, about = "Interactive meteogram viewer")]
struct Args {
    /// Config file (default: <config dir>/meteogram/config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend endpoint (overrides `source_url` from the config).
    #[arg(long)]
    url: Option<String>,
    /// Show a saved weather document instead of polling the backend.
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Modifier required for wheel zoom: none, ctrl, shift or alt.
    #[arg(long)]
    zoom_modifier: Option<ZoomGate>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = ViewerConfig::load_or_default(args.config.as_deref())?;
    if let Some(url) = args.url {
        cfg.source_url = url;
    }
    if let Some(gate) = args.zoom_modifier {
        cfg.zoom_modifier = gate;
    }
    let initial = args.input.as_deref().map(storage::load_payload_json).transpose()?;
    let polling = args.input.is_none();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 900.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Meteogram"),
        ..Default::default()
    };

    eframe::run_native(
        "Meteogram",
        options,
        Box::new(move |_cc| Ok(Box::new(MeteogramApp::new(cfg, initial, polling)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

/// How far (in points) from the pointer a sample is still picked up by the hover readout.
const HOVER_SNAP_PT: f32 = 24.0;

/// Rendered pixels of one panel plus the mapper its interaction is measured against.
struct PanelView {
    texture: egui::TextureHandle,
    mapper: Option<CoordinateMapper>,
    size_px: [usize; 2],
}

struct MeteogramApp {
    cfg: ViewerConfig,
    group: ChartGroup,
    plugins: Vec<Box<dyn PanelPlugin>>,
    views: AHashMap<PanelId, PanelView>,
    /// Panels to re-render on this frame.
    dirty: AHashSet<PanelId>,
    /// Panels to re-render on the next frame.
    deferred: AHashSet<PanelId>,

    polling: bool,
    last_fetch: Option<Instant>,
    fetch_receiver: Option<mpsc::Receiver<Result<WeatherPayload, String>>>,
    status_message: String,
    error_message: String,
}

impl MeteogramApp {
    fn new(cfg: ViewerConfig, initial: Option<WeatherPayload>, polling: bool) -> Self {
        let group = match &initial {
            Some(payload) => ChartGroup::from_payload(payload, cfg.zoom_modifier, cfg.horizon()),
            None => ChartGroup::from_payload(&WeatherPayload::default(), cfg.zoom_modifier, cfg.horizon()),
        };
        let status_message = if initial.is_some() {
            "Loaded weather document".to_string()
        } else {
            String::new()
        };
        Self {
            cfg,
            group,
            plugins: default_plugins(),
            views: AHashMap::new(),
            dirty: AHashSet::new(),
            deferred: AHashSet::new(),
            polling,
            last_fetch: None,
            fetch_receiver: None,
            status_message,
            error_message: String::new(),
        }
    }

    fn fetch_due(&self) -> bool {
        self.polling
            && self.fetch_receiver.is_none()
            && self
                .last_fetch
                .is_none_or(|t| t.elapsed() >= self.cfg.refresh_interval())
    }

    fn start_fetch(&mut self) {
        let (sender, receiver) = mpsc::channel();
        self.fetch_receiver = Some(receiver);
        self.last_fetch = Some(Instant::now());
        self.status_message = format!("Fetching {} ...", self.cfg.source_url);
        let url = self.cfg.source_url.clone();

        thread::spawn(move || {
            let result = Client::new(url)
                .and_then(|c| c.fetch_payload())
                .map_err(|e| format!("{e:#}"));
            let _ = sender.send(result);
        });
    }

    fn check_fetch_result(&mut self) {
        if let Some(receiver) = &self.fetch_receiver
            && let Ok(result) = receiver.try_recv()
        {
            self.fetch_receiver = None;
            match result {
                Ok(payload) => {
                    // bounds and any drag in progress survive a refresh
                    self.group.refresh(&payload);
                    self.status_message = format!(
                        "Updated {}",
                        chrono::Local::now().format("%H:%M:%S")
                    );
                    self.error_message.clear();
                }
                Err(error) => {
                    log::warn!("refresh failed: {error}");
                    self.error_message = error;
                    self.status_message.clear();
                }
            }
        }
    }

    fn collect_redraws(&mut self) {
        self.dirty.extend(self.deferred.drain());
        for (id, mode) in self.group.take_redraws() {
            match mode {
                RedrawMode::Immediate => {
                    self.dirty.insert(id);
                }
                RedrawMode::Deferred => {
                    self.deferred.insert(id);
                }
            }
        }
    }

    fn render_panel(&mut self, ctx: &egui::Context, id: PanelId, size_px: [usize; 2], gutters: Gutters) {
        let Some(panel) = self.group.panel(id) else {
            return;
        };
        let rendered = render_panel_rgb(panel, gutters, &self.plugins, size_px[0] as u32, size_px[1] as u32);
        let (buf, mapper) = match rendered {
            Ok(r) => r,
            Err(e) => {
                log::error!("rendering {id} failed: {e}");
                self.error_message = format!("Rendering {id} failed: {e}");
                return;
            }
        };
        let image = egui::ColorImage::from_rgb(size_px, &buf);
        match self.views.get_mut(&id) {
            Some(view) => {
                view.texture.set(image, egui::TextureOptions::LINEAR);
                view.mapper = mapper;
                view.size_px = size_px;
            }
            None => {
                let texture = ctx.load_texture(id.as_str(), image, egui::TextureOptions::LINEAR);
                self.views.insert(
                    id,
                    PanelView {
                        texture,
                        mapper,
                        size_px,
                    },
                );
            }
        }
    }

    /// Feed this frame's pointer and wheel input on one panel into the group.
    fn handle_input(&mut self, ui: &egui::Ui, id: PanelId, response: &egui::Response, ppp: f32) {
        let Some(plot_width) = self
            .views
            .get(&id)
            .and_then(|v| v.mapper.as_ref())
            .map(|m| m.area().width())
        else {
            return;
        };
        let local_x = |pos: egui::Pos2| f64::from((pos.x - response.rect.min.x) * ppp);

        // egui reports the drag only once the pointer passed its threshold; grab
        // from where the button went down
        if response.drag_started()
            && let Some(pos) = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos())
        {
            self.group.pointer_down(id, local_x(pos));
        }
        if response.dragged()
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.group.pointer_move(id, local_x(pos), plot_width);
        }
        if response.drag_stopped() {
            self.group.pointer_up(id);
        }
        if self.group.is_dragging(id) && !response.contains_pointer() {
            self.group.pointer_leave(id);
        }

        if !self.group.is_dragging(id)
            && let Some(pos) = response.hover_pos()
        {
            let readout = self
                .views
                .get(&id)
                .and_then(|v| v.mapper.as_ref())
                .zip(self.group.panel(id))
                .and_then(|(mapper, panel)| {
                    readout_at_px(panel, mapper, local_x(pos), f64::from(HOVER_SNAP_PT * ppp))
                });
            if let Some(readout) = readout {
                response.clone().on_hover_ui_at_pointer(|ui| {
                    ui.strong(readout.title());
                    for line in readout.lines() {
                        ui.label(line);
                    }
                });
            }
        }

        if response.hovered() {
            let (scroll, m) = ui.input(|i| (i.raw_scroll_delta.y, i.modifiers));
            if scroll != 0.0 {
                let modifiers = Modifiers {
                    ctrl: m.ctrl || m.command,
                    shift: m.shift,
                    alt: m.alt,
                };
                // egui reports scrolling up as positive; zoom-out is positive here
                let outcome = self.group.wheel(id, -f64::from(scroll), modifiers);
                if outcome.suppress_default {
                    ui.ctx().input_mut(|i| {
                        i.raw_scroll_delta = egui::Vec2::ZERO;
                        i.smooth_scroll_delta = egui::Vec2::ZERO;
                    });
                }
            }
        }
    }

    fn export_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name("meteogram.csv")
            .save_file()
        {
            match storage::export_csv(self.group.registry().iter(), &path) {
                Ok(rows) => self.status_message = format!("Saved {rows} rows to {}", path.display()),
                Err(e) => self.error_message = format!("Export failed: {e:#}"),
            }
        }
    }

    fn save_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "svg"])
            .set_file_name("meteogram.png")
            .save_file()
        {
            match viz::render_group_to_file(&self.group, &path, self.cfg.panel_width, self.cfg.panel_height) {
                Ok(()) => self.status_message = format!("Saved image to {}", path.display()),
                Err(e) => self.error_message = format!("Saving image failed: {e}"),
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.group.reset_now();
            }
            if self.polling
                && ui
                    .add_enabled(self.fetch_receiver.is_none(), egui::Button::new("Refresh now"))
                    .clicked()
            {
                self.start_fetch();
            }
            if ui.button("Export CSV...").clicked() {
                self.export_csv();
            }
            if ui.button("Save image...").clicked() {
                self.save_image();
            }

            ui.separator();
            let mut gate = self.group.zoom_gate();
            egui::ComboBox::from_label("Zoom with wheel +")
                .selected_text(gate.to_string())
                .show_ui(ui, |ui| {
                    for g in [ZoomGate::Always, ZoomGate::Ctrl, ZoomGate::Shift, ZoomGate::Alt] {
                        ui.selectable_value(&mut gate, g, g.to_string());
                    }
                });
            if gate != self.group.zoom_gate() {
                self.group.set_zoom_gate(gate);
            }

            if self.fetch_receiver.is_some() {
                ui.spinner();
            }
        });
        if !self.status_message.is_empty() {
            ui.label(&self.status_message);
        }
        if !self.error_message.is_empty() {
            ui.colored_label(egui::Color32::RED, &self.error_message);
        }
    }
}

impl eframe::App for MeteogramApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_fetch_result();
        if self.fetch_due() {
            self.start_fetch();
        }
        if self.fetch_receiver.is_some() {
            ctx.request_repaint();
        } else if self.polling {
            ctx.request_repaint_after(self.cfg.refresh_interval());
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let ppp = ctx.pixels_per_point();
                let width_px = (ui.available_width() * ppp).round().max(1.0) as usize;
                let height_px = self.cfg.panel_height.max(1) as usize;
                let size_px = [width_px, height_px];
                let gutters = Gutters::for_panels(self.group.registry().iter());

                self.collect_redraws();
                for id in self.group.registry().ids() {
                    let stale = self.views.get(&id).is_none_or(|v| v.size_px != size_px);
                    if stale || self.dirty.remove(&id) {
                        self.render_panel(ctx, id, size_px, gutters);
                    }
                    let Some(view) = self.views.get(&id) else {
                        continue;
                    };
                    let size = egui::vec2(width_px as f32 / ppp, height_px as f32 / ppp);
                    let response = ui.add(
                        egui::Image::new((view.texture.id(), size)).sense(egui::Sense::click_and_drag()),
                    );
                    self.handle_input(ui, id, &response, ppp);
                }
                // input on one panel moved the others; paint them on the next frame
                if self.group.registry().iter().any(|p| p.pending_redraw().is_some())
                    || !self.deferred.is_empty()
                {
                    ctx.request_repaint();
                }
            });
        });
    }
}
