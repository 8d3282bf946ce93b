//! Panel window — egui front end for the device controls and paint canvas.
//!
//! The window owns a [`Panel`](ledpanel_lib::panel::Panel) and a
//! [`Transport`](ledpanel_lib::transport::Transport). Every frame it drains
//! transport events, draws the controls, and replays the panel's
//! [`DisplayList`](ledpanel_lib::render::DisplayList) onto the egui painter.

use eframe::egui;
use ledpanel_lib::color::Rgb;
use ledpanel_lib::config::Config;
use ledpanel_lib::pointer::PointerEvent;
use ledpanel_lib::render::{DisplayList, DrawOp};

mod ui;

/// Width reserved for the window chrome around the canvas.
const WINDOW_MARGIN: f32 = 32.0;
/// Height of the control sections above the canvas.
const CONTROLS_HEIGHT: f32 = 300.0;

/// Open the panel window and block until it is closed.
///
/// Must be called from the main thread (eframe/winit requirement).
pub fn run(config: Config) -> Result<(), eframe::Error> {
    let size = config.grid_size();
    let backing = (size.width * config.cell_size, size.height * config.cell_size);
    let inner = [
        (backing.0 as f32 + WINDOW_MARGIN).min(1280.0),
        (backing.1 as f32 + CONTROLS_HEIGHT).min(960.0),
    ];

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(inner)
            .with_min_inner_size([480.0, 420.0])
            .with_title("LedPanel")
            .with_icon(crate::icon::app_icon()),
        ..Default::default()
    };
    eframe::run_native(
        "LedPanel",
        options,
        Box::new(move |cc| Ok(Box::new(ui::PanelApp::new(config, cc)))),
    )
}

pub(crate) fn to_color32(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

/// Largest scale `<= 1` at which `backing` fits into `available`.
pub(crate) fn fit_scale(backing: (u32, u32), available: egui::Vec2) -> f32 {
    if backing.0 == 0 || backing.1 == 0 {
        return 1.0;
    }
    let sx = available.x / backing.0 as f32;
    let sy = available.y / backing.1 as f32;
    sx.min(sy).clamp(0.05, 1.0)
}

/// Translate a screen position over the on-screen canvas `rect`.
pub(crate) fn pointer_event(pos: egui::Pos2, rect: egui::Rect) -> PointerEvent {
    let offset = pos - rect.min;
    PointerEvent {
        offset_x: f64::from(offset.x),
        offset_y: f64::from(offset.y),
        client_width: f64::from(rect.width()),
        client_height: f64::from(rect.height()),
    }
}

/// Replay a recorded frame onto `painter`, scaling backing pixels into `rect`.
pub(crate) fn paint_display_list(painter: &egui::Painter, rect: egui::Rect, scale: f32, list: &DisplayList) {
    let at = |x: u32, y: u32| rect.min + egui::vec2(x as f32 * scale, y as f32 * scale);
    for op in list.ops() {
        match *op {
            DrawOp::Clear => {
                painter.rect_filled(rect, egui::CornerRadius::ZERO, egui::Color32::BLACK);
            }
            DrawOp::Fill { rect: r, color } => {
                let cell = egui::Rect::from_min_max(at(r.x, r.y), at(r.x + r.width, r.y + r.height));
                painter.rect_filled(cell, egui::CornerRadius::ZERO, to_color32(color));
            }
            DrawOp::Line {
                from,
                to,
                color,
                width,
            } => {
                let stroke = egui::Stroke::new((width as f32 * scale).max(1.0), to_color32(color));
                painter.line_segment([at(from.0, from.1), at(to.0, to.1)], stroke);
            }
        }
    }
}
