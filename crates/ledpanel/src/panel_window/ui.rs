//! egui panel: device controls above, paint canvas below.

use std::time::Duration;

use eframe::egui;
use ledpanel_lib::color::Rgb;
use ledpanel_lib::config::Config;
use ledpanel_lib::panel::Panel;
use ledpanel_lib::render::DisplayList;
use ledpanel_lib::state::{ColorMode, Control, Pattern};
use ledpanel_lib::transport::Transport;

use super::{fit_scale, paint_display_list, pointer_event, to_color32};

/// How often to wake up and drain transport events while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct PanelApp {
    panel: Panel,
    transport: Transport,
    frame: DisplayList,
    endpoint: String,
    reconnect_delay_ms: u64,
    /// Set once the startup clear has been sent.
    loaded: bool,
}

impl PanelApp {
    pub fn new(config: Config, cc: &eframe::CreationContext<'_>) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        let corner_radius = egui::CornerRadius::same(4);
        style.visuals.widgets.noninteractive.corner_radius = corner_radius;
        style.visuals.widgets.inactive.corner_radius = corner_radius;
        style.visuals.widgets.active.corner_radius = corner_radius;
        style.visuals.widgets.hovered.corner_radius = corner_radius;
        cc.egui_ctx.set_style(style);

        let panel = Panel::from_config(&config);
        let mut frame = DisplayList::new();
        panel.render(&mut frame);

        let transport = Transport::connect(config.transport_options());
        log::info!("connecting to {}", transport.url());

        Self {
            panel,
            transport,
            frame,
            endpoint: config.endpoint(),
            reconnect_delay_ms: config.reconnect_delay_ms,
            loaded: false,
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.transport.try_event() {
            let opened = matches!(event, ledpanel_lib::transport::TransportEvent::Opened);
            self.panel.handle_event(event);
            if opened {
                if !self.loaded {
                    self.loaded = true;
                    self.panel.load(&self.transport, &mut self.frame);
                }
                self.panel.request_sync(&self.transport);
            }
        }
    }

    fn set(&mut self, control: Control) {
        self.panel.set(control, &self.transport);
    }

    fn connection_row(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.panel.is_connected() {
                ui.colored_label(egui::Color32::from_rgb(80, 200, 120), "● Connected");
            } else {
                ui.colored_label(
                    egui::Color32::from_rgb(220, 90, 80),
                    format!("○ Disconnected, retrying every {} ms", self.reconnect_delay_ms),
                );
            }
            ui.weak(self.endpoint.as_str());
            if let Some(status) = &self.panel.state().status {
                ui.label(format!("Status: {status}"));
            }
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let state = self.panel.state().clone();

        section_frame(ui, "Device", |ui| {
            egui::Grid::new("device_grid")
                .num_columns(2)
                .min_col_width(80.0)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Power");
                    let mut on = state.on;
                    let label = if on { "On" } else { "Off" };
                    if ui.checkbox(&mut on, label).changed() {
                        self.set(Control::On(on));
                    }
                    ui.end_row();

                    ui.label("Pattern");
                    let selected = Pattern::from_index(state.pattern)
                        .map_or_else(|| format!("{} (unknown)", state.pattern), |p| p.to_string());
                    let mut picked = None;
                    egui::ComboBox::from_id_salt("pattern_combo")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for pattern in Pattern::ALL {
                                let is_current = pattern.index() == state.pattern;
                                if ui.selectable_label(is_current, pattern.name()).clicked() {
                                    picked = Some(pattern);
                                }
                            }
                        });
                    if let Some(pattern) = picked {
                        self.set(Control::Pattern(pattern.index()));
                    }
                    ui.end_row();

                    ui.label("Brightness");
                    let mut brightness = state.brightness;
                    if ui.add(egui::Slider::new(&mut brightness, 0..=255)).changed() {
                        self.set(Control::Brightness(brightness));
                    }
                    ui.end_row();
                });
        });

        section_frame(ui, "Color", |ui| {
            egui::Grid::new("color_grid")
                .num_columns(2)
                .min_col_width(80.0)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Mode");
                    let mut mode = self.panel.color_mode();
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut mode, ColorMode::Rgb, "RGB");
                        ui.radio_value(&mut mode, ColorMode::Hsl, "HSL");
                    });
                    if mode != self.panel.color_mode() {
                        self.panel.set_color_mode(mode);
                    }
                    ui.end_row();

                    ui.label("Color");
                    let mut rgb = [state.color.r, state.color.g, state.color.b];
                    ui.horizontal(|ui| {
                        if ui.color_edit_button_srgb(&mut rgb).changed() {
                            self.set(Control::Color(Rgb::from(rgb)));
                        }
                        ui.monospace(Rgb::from(rgb).to_hex());
                    });
                    ui.end_row();

                    ui.label("Hue");
                    let mut hue = state.hue;
                    if ui.add(egui::Slider::new(&mut hue, 0..=360).suffix("°")).changed() {
                        self.set(Control::Hue(hue));
                    }
                    ui.end_row();

                    ui.label("Saturation");
                    let mut saturation = state.saturation;
                    if ui
                        .add(egui::Slider::new(&mut saturation, 0..=100).suffix("%"))
                        .changed()
                    {
                        self.set(Control::Saturation(saturation));
                    }
                    ui.end_row();

                    ui.label("Brush");
                    let brush = state.active_color(self.panel.color_mode()).resolve();
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(40.0, 16.0), egui::Sense::hover());
                    ui.painter()
                        .rect_filled(swatch, egui::CornerRadius::same(2), to_color32(brush));
                    ui.end_row();
                });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Canvas").strong().size(14.0));
            if ui.button("Clear").clicked() {
                self.panel.clear(&self.transport, &mut self.frame);
            }
            ui.weak(format!("{} painted", self.panel.grid().painted_count()));
        });
        ui.add_space(4.0);

        let backing = self.panel.surface_size();
        let scale = fit_scale(backing, ui.available_size());
        let display = egui::vec2(backing.0 as f32 * scale, backing.1 as f32 * scale);
        let (rect, response) = ui.allocate_exact_size(display, egui::Sense::click_and_drag());

        let (pressed, released, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        if let Some(pos) = pos
            && rect.contains(pos)
        {
            let event = pointer_event(pos, rect);
            if pressed && response.hovered() {
                self.panel.pointer_down(&event, &mut self.frame);
            } else if self.panel.is_painting() {
                self.panel.pointer_move(&event, &mut self.frame);
            }
        }
        if released && self.panel.is_painting() {
            self.panel.pointer_up(&self.transport);
        }

        paint_display_list(&ui.painter_at(rect), rect, scale, &self.frame);
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.connection_row(ui);
            self.controls(ui);
            ui.add_space(8.0);
            self.canvas(ui);
        });

        ctx.request_repaint_after(POLL_INTERVAL);
    }
}

/// Render a section with a title and grouped frame that spans the full width.
fn section_frame(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.add_space(6.0);
    ui.label(egui::RichText::new(title).strong().size(14.0));
    ui.add_space(2.0);
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
}
