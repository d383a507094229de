use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::math::ParameterDomain;
use crate::media::{DecodedImage, ResourceState};
use crate::renderer::RenderSession;
use crate::ui::state::UiState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub rebuild_mesh: Option<ParameterDomain>,
    pub reset_view: bool,
    pub redraw: bool,
}

pub struct MediaStatus<'a> {
    pub texture: &'a ResourceState<DecodedImage>,
    pub camera: &'a ResourceState<String>,
}

pub fn draw_side_panel(
    ctx: &Context,
    state: &mut UiState,
    session: &mut RenderSession,
    media: &MediaStatus,
) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(280.0)
        .default_width(300.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Anaglyph").color(ACCENT_RED).strong());
                    ui.heading(RichText::new("Surface").color(ACCENT_CYAN).strong());
                });
                ui.label(RichText::new("Red/cyan stereo viewer").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                section_header(ui, "STEREO");
                actions.redraw |= stereo_sliders(ui, session);
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "DOMAIN");
                if let Some(domain) = domain_editor(ui, state) {
                    actions.rebuild_mesh = Some(domain);
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "SCENE");
                scene_readout(ui, session);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Reset view").clicked() {
                        actions.reset_view = true;
                    }
                    ui.checkbox(&mut state.show_help, "Help");
                });
                ui.add_space(16.0);

                section_header(ui, "MEDIA");
                resource_row(ui, "Texture", media.texture);
                resource_row(ui, "Camera", media.camera);
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn stereo_sliders(ui: &mut Ui, session: &mut RenderSession) -> bool {
    let sliders = &mut session.sliders;
    let mut changed = false;
    egui::Grid::new("stereo_sliders").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
        ui.label("Eye separation");
        changed |= ui.add(egui::Slider::new(&mut sliders.eye_separation, 0.0..=1.0).step_by(0.01)).changed();
        ui.end_row();

        ui.label("Field of view");
        changed |= ui.add(egui::Slider::new(&mut sliders.field_of_view, 0.1..=2.5).step_by(0.01)).changed();
        ui.end_row();

        ui.label("Near clipping");
        changed |= ui.add(egui::Slider::new(&mut sliders.near_clipping, 0.1..=20.0).step_by(0.1)).changed();
        ui.end_row();

        ui.label("Convergence");
        changed |= ui.add(egui::Slider::new(&mut sliders.convergence, 1.0..=50.0).step_by(0.1)).changed();
        ui.end_row();
    });
    changed
}

const BOUND_RANGE: std::ops::RangeInclusive<f64> = -100.0..=100.0;

fn domain_editor(ui: &mut Ui, state: &mut UiState) -> Option<ParameterDomain> {
    let draft = &mut state.domain;
    let mut changed = false;

    egui::Grid::new("domain").num_columns(4).spacing([8.0, 4.0]).show(ui, |ui| {
        ui.label("u");
        changed |= ui.add(egui::DragValue::new(&mut draft.u_range.0).speed(0.05).range(BOUND_RANGE)).changed();
        ui.label("to");
        changed |= ui.add(egui::DragValue::new(&mut draft.u_range.1).speed(0.05).range(BOUND_RANGE)).changed();
        ui.end_row();

        ui.label("v");
        changed |= ui.add(egui::DragValue::new(&mut draft.v_range.0).speed(0.05).range(BOUND_RANGE)).changed();
        ui.label("to");
        changed |= ui.add(egui::DragValue::new(&mut draft.v_range.1).speed(0.05).range(BOUND_RANGE)).changed();
        ui.end_row();
    });
    ui.horizontal(|ui| {
        ui.label("Step");
        changed |= ui
            .add(egui::DragValue::new(&mut draft.step).speed(0.005).range(0.005..=1.0))
            .changed();
    });
    state.domain_dirty |= changed;

    let mut applied = None;
    ui.add_space(6.0);
    let (fill, text) = if state.domain_dirty {
        (ACCENT_GREEN, Color32::BLACK)
    } else {
        (BG_WIDGET, TEXT_MUTED)
    };
    let button = egui::Button::new(RichText::new("Rebuild mesh").color(text))
        .fill(fill)
        .min_size(egui::vec2(ui.available_width(), 28.0));
    if ui.add_enabled(state.domain_dirty, button).clicked() {
        match state.domain.to_domain() {
            Ok(domain) => applied = Some(domain),
            Err(e) => {
                log::warn!("Rejected domain: {}", e);
                state.domain_error = Some(e.to_string());
            }
        }
    }

    if let Some(err) = &state.domain_error {
        ui.add_space(6.0);
        egui::Frame::default()
            .fill(Color32::from_rgb(40, 15, 15))
            .stroke(egui::Stroke::new(1.0, ACCENT_RED))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(err).color(ACCENT_RED).size(11.0));
            });
    }

    applied
}

fn scene_readout(ui: &mut Ui, session: &RenderSession) {
    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
    let point = session.interaction.point;
    egui::Grid::new("scene").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
        ui.label(RichText::new("Vertices").color(TEXT_MUTED));
        ui.label(format!("{}", session.mesh.vertex_count()));
        ui.end_row();

        ui.label(RichText::new("Point").color(TEXT_MUTED));
        ui.label(format!("({:.2}, {:.2})", point.u, point.v));
        ui.end_row();

        ui.label(RichText::new("Point step").color(TEXT_MUTED));
        ui.label(format!("{:.3}", session.interaction.step()));
        ui.end_row();

        ui.label(RichText::new("Light phase").color(TEXT_MUTED));
        ui.label(format!("{:.2}", session.interaction.light_phase));
        ui.end_row();
    });
    ui.style_mut().override_font_id = None;
}

fn resource_row<T>(ui: &mut Ui, name: &str, state: &ResourceState<T>) {
    let color = if state.is_ready() {
        ACCENT_GREEN
    } else if state.is_pending() {
        ACCENT_ORANGE
    } else {
        ACCENT_RED
    };
    ui.horizontal(|ui| {
        ui.label(RichText::new(name).color(TEXT_MUTED));
        ui.label(RichText::new(state.label()).color(color));
    });
    if let Some(err) = state.error() {
        ui.label(RichText::new(err).color(TEXT_MUTED).size(10.0).italics());
    }
}

pub fn draw_help_overlay(ctx: &Context) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new("LMB+Drag - Rotate | Left/Right - Move light").color(TEXT_MUTED));
                    ui.label(RichText::new("W/S - Point v | A/D - Point u").color(TEXT_MUTED));
                });
        });
}
