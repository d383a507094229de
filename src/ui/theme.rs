use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

pub const BG_PANEL: Color32 = Color32::from_rgb(6, 6, 8);
pub const BG_WIDGET: Color32 = Color32::from_rgb(16, 16, 20);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(28, 28, 36);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(170, 170, 174);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(105, 105, 112);

// the two anaglyph filter colors
pub const ACCENT_RED: Color32 = Color32::from_rgb(205, 45, 45);
pub const ACCENT_CYAN: Color32 = Color32::from_rgb(40, 190, 200);

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(46, 172, 35);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(190, 130, 40);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(60, 40, 50, 77);

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.extreme_bg_color = Color32::BLACK;
    visuals.warn_fg_color = ACCENT_ORANGE;
    visuals.error_fg_color = ACCENT_RED;
    visuals.selection.bg_fill = ACCENT_CYAN.gamma_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT_CYAN);
    visuals.slider_trailing_fill = true;

    for widget in [
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(4.0);
    }
    visuals.widgets.inactive.bg_fill = BG_WIDGET;
    visuals.widgets.inactive.weak_bg_fill = BG_WIDGET;
    visuals.widgets.hovered.bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.hovered.weak_bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT_CYAN);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, ACCENT_RED);

    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.slider_width = 180.0;
    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
