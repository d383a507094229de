use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::config::{AnaglyphConfig, AppConfig, StereoConfig};
use crate::error::DomainError;
use crate::interaction::InteractionState;
use crate::math::{EllipticTorus, Mesh, ParameterDomain, StereoCamera, StereoParameters, Tessellator};
use crate::renderer::backend::{ColorMask, ModelId, RenderBackend, ShaderUniforms, TextureSlot};
use crate::renderer::trackball::Trackball;

const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

const MONO_FOV: f32 = PI / 8.0;
const MONO_ASPECT: f32 = 1.0;
const MONO_NEAR: f32 = 8.0;
const MONO_FAR: f32 = 12.0;

const UNLIT: f32 = 0.0;
const LIT: f32 = 10.0;

pub const NEAR_CLIPPING_ADJUST: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoSliders {
    pub eye_separation: f32,
    pub field_of_view: f32,
    pub near_clipping: f32,
    pub convergence: f32,
}

impl From<&StereoConfig> for StereoSliders {
    fn from(config: &StereoConfig) -> Self {
        Self {
            eye_separation: config.eye_separation,
            field_of_view: config.field_of_view,
            near_clipping: config.near_clipping,
            convergence: config.convergence,
        }
    }
}

impl StereoSliders {
    pub fn write_into(&self, params: &mut StereoParameters) {
        params.eye_separation = self.eye_separation;
        params.fov = self.field_of_view;
        params.near = self.near_clipping - NEAR_CLIPPING_ADJUST;
        params.convergence = self.convergence;
    }
}

pub struct RenderSession {
    pub surface: EllipticTorus,
    pub derivative_delta: f64,
    pub domain: ParameterDomain,
    pub mesh: Mesh,
    pub background: Mesh,
    pub stereo: StereoCamera,
    pub sliders: StereoSliders,
    pub interaction: InteractionState,
    pub trackball: Trackball,
    pub anaglyph: AnaglyphConfig,
    mesh_revision: u64,
}

impl RenderSession {
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let surface = EllipticTorus::new(config.surface.shape());
        let domain = config.surface.domain();
        let derivative_delta = config.surface.derivative_delta;
        let mesh = Tessellator::new(&surface, derivative_delta).tessellate(&domain)?;

        let stereo = StereoCamera::new(StereoParameters {
            convergence: config.stereo.convergence,
            eye_separation: config.stereo.eye_separation,
            aspect_ratio: config.stereo.aspect_ratio,
            fov: config.stereo.field_of_view,
            near: config.stereo.near_clipping,
            far: config.stereo.far_clipping,
        });

        Ok(Self {
            surface,
            derivative_delta,
            domain,
            mesh,
            background: Mesh::background_quad(),
            stereo,
            sliders: StereoSliders::from(&config.stereo),
            interaction: InteractionState::new(&config.interaction, domain.step),
            trackball: Trackball::default(),
            anaglyph: config.anaglyph,
            mesh_revision: 0,
        })
    }

    pub fn rebuild_mesh(&mut self, domain: ParameterDomain) -> Result<(), DomainError> {
        let mesh = Tessellator::new(&self.surface, self.derivative_delta).tessellate(&domain)?;
        log::info!(
            "Rebuilt surface mesh: {} vertices (step {})",
            mesh.vertex_count(),
            domain.step
        );
        self.mesh = mesh;
        self.domain = domain;
        self.interaction.set_step(domain.step);
        self.mesh_revision += 1;
        Ok(())
    }

    pub fn mesh_revision(&self) -> u64 {
        self.mesh_revision
    }

    fn highlighted_offset(&self) -> [f32; 2] {
        let p = self.interaction.point;
        [self.surface.x(p.u, p.v) as f32, self.surface.y(p.u, p.v) as f32]
    }

    pub fn draw_frame<B: RenderBackend>(&mut self, backend: &mut B) {
        backend.clear(CLEAR_COLOR);

        let projection = Mat4::perspective_rh_gl(MONO_FOV, MONO_ASPECT, MONO_NEAR, MONO_FAR);
        let view = self.trackball.view_matrix();

        let world = world_matrix(view);
        let background_view = background_matrix();

        let model_view_projection = projection * world;
        let world_inverse_transpose = world.inverse().transpose();

        let mut uniforms = ShaderUniforms {
            model_view_projection: model_view_projection.to_cols_array_2d(),
            model_view: background_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            w_matrix: world.to_cols_array_2d(),
            w_inverse_transpose: world_inverse_transpose.to_cols_array_2d(),
            view_world_position: [0.0, 0.0, 0.0],
            l: UNLIT,
            light_world_position: self.interaction.light_world_position().to_array(),
            _pad0: 0.0,
            light_dir: [0.0, -1.0, 0.0],
            _pad1: 0.0,
            color: [1.0, 1.0, 1.0, 1.0],
            f_scale: [1.0, 1.0],
            f_point: self.highlighted_offset(),
        };

        self.sliders.write_into(&mut self.stereo.params);
        self.stereo.apply_left_frustum();
        let second_pass_projection = self.stereo.projection_matrix();
        self.stereo.apply_right_frustum();
        let first_pass_projection = self.stereo.projection_matrix();

        backend.bind_texture(TextureSlot::Camera);
        backend.set_uniforms(&uniforms);
        backend.draw_triangle_strip(ModelId::Background, self.background.vertex_count());

        uniforms.l = LIT;
        uniforms.model_view = world.to_cols_array_2d();
        backend.bind_texture(TextureSlot::Surface);

        uniforms.projection = first_pass_projection.to_cols_array_2d();
        backend.set_uniforms(&uniforms);
        backend.set_color_mask(self.anaglyph.first_pass_mask);
        backend.draw_triangle_strip(ModelId::Surface, self.mesh.vertex_count());

        backend.clear_depth();
        uniforms.projection = second_pass_projection.to_cols_array_2d();
        backend.set_uniforms(&uniforms);
        backend.set_color_mask(self.anaglyph.second_pass_mask);
        backend.draw_triangle_strip(ModelId::Surface, self.mesh.vertex_count());

        backend.set_color_mask(ColorMask::ALL);
    }
}

pub fn world_matrix(view: Mat4) -> Mat4 {
    let rotate_to_point_zero = Mat4::from_axis_angle(Vec3::new(0.707, 0.707, 0.0).normalize(), 0.7);
    let translate_to_point_zero = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
    translate_to_point_zero * (rotate_to_point_zero * view)
}

pub fn background_matrix() -> Mat4 {
    let rotate_to_center = Mat4::from_axis_angle(Vec3::Z, PI);
    let translate_to_center = Mat4::from_translation(Vec3::new(2.0, 2.0, -10.0));
    let enlarge = Mat4::from_scale(Vec3::new(4.0, 4.5, 1.0));
    translate_to_center * (enlarge * (rotate_to_center * Mat4::IDENTITY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::stereo::{Eye, Frustum};
    use crate::renderer::backend::recording::{Call, RecordingBackend};

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.surface.step = 0.5;
        config
    }

    fn session() -> RenderSession {
        RenderSession::from_config(&config()).unwrap()
    }

    #[test]
    fn frame_issues_background_then_two_masked_surface_passes() {
        let mut session = session();
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        assert_eq!(backend.calls.first(), Some(&Call::Clear(CLEAR_COLOR)));
        assert_eq!(backend.calls.last(), Some(&Call::ColorMask(ColorMask::ALL)));
        assert_eq!(
            backend.calls.iter().filter(|c| **c == Call::ClearDepth).count(),
            1
        );

        let draws = backend.draws();
        assert_eq!(draws.len(), 3);

        let (model, count, uniforms, mask, texture) = draws[0];
        assert_eq!(model, ModelId::Background);
        assert_eq!(count, 6);
        assert_eq!(uniforms.l, UNLIT);
        assert_eq!(mask, ColorMask::ALL);
        assert_eq!(texture, Some(TextureSlot::Camera));

        let surface_count = session.mesh.vertex_count();
        assert_eq!(surface_count, 13 * 13 * 2);
        for (i, expected_mask) in [(1, ColorMask::RED), (2, ColorMask::GREEN_BLUE)] {
            let (model, count, uniforms, mask, texture) = draws[i];
            assert_eq!(model, ModelId::Surface);
            assert_eq!(count, surface_count);
            assert_eq!(uniforms.l, LIT);
            assert_eq!(mask, expected_mask);
            assert_eq!(texture, Some(TextureSlot::Surface));
        }
    }

    #[test]
    fn depth_is_cleared_between_the_eye_passes() {
        let mut session = session();
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        let draw_positions: Vec<usize> = backend
            .calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::Draw(ModelId::Surface, _)))
            .map(|(i, _)| i)
            .collect();
        let clear_depth = backend
            .calls
            .iter()
            .position(|c| *c == Call::ClearDepth)
            .unwrap();
        assert!(draw_positions[0] < clear_depth && clear_depth < draw_positions[1]);
    }

    #[test]
    fn eye_projections_come_from_sliders() {
        let mut session = session();
        session.sliders = StereoSliders {
            eye_separation: 0.2,
            field_of_view: 0.6,
            near_clipping: 4.0,
            convergence: 9.0,
        };
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        let params = session.stereo.params;
        assert_eq!(params.near, 4.0 - NEAR_CLIPPING_ADJUST);
        assert_eq!(params.eye_separation, 0.2);
        assert_eq!(params.convergence, 9.0);
        assert_eq!(params.aspect_ratio, 1.3);

        let draws = backend.draws();
        let first = Mat4::from_cols_array_2d(&draws[1].2.projection);
        let second = Mat4::from_cols_array_2d(&draws[2].2.projection);
        assert_eq!(first, Frustum::for_eye(&params, Eye::Right).matrix());
        assert_eq!(second, Frustum::for_eye(&params, Eye::Left).matrix());
    }

    #[test]
    fn background_uses_mono_projection_and_own_transform() {
        let mut session = session();
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        let background = backend.draws()[0].2;
        let mono = Mat4::perspective_rh_gl(MONO_FOV, MONO_ASPECT, MONO_NEAR, MONO_FAR);
        assert_eq!(Mat4::from_cols_array_2d(&background.projection), mono);
        assert_eq!(Mat4::from_cols_array_2d(&background.model_view), background_matrix());

        let surface = backend.draws()[1].2;
        let world = world_matrix(Mat4::IDENTITY);
        assert_eq!(Mat4::from_cols_array_2d(&surface.model_view), world);
        assert_eq!(Mat4::from_cols_array_2d(&surface.w_matrix), world);
        assert_eq!(Mat4::from_cols_array_2d(&surface.model_view_projection), mono * world);
    }

    #[test]
    fn world_inverse_transpose_undoes_rotation() {
        let mut session = session();
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        let u = backend.draws()[1].2;
        let world = Mat4::from_cols_array_2d(&u.w_matrix);
        let wit = Mat4::from_cols_array_2d(&u.w_inverse_transpose);
        assert!((wit.transpose() * world).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn light_and_highlight_follow_interaction() {
        let mut session = session();
        session
            .interaction
            .handle_key(crate::interaction::InteractionKey::LightForward);
        let mut backend = RecordingBackend::default();
        session.draw_frame(&mut backend);

        let u = backend.draws()[1].2;
        assert_eq!(u.light_world_position, session.interaction.light_world_position().to_array());
        assert_eq!(u.light_dir, [0.0, -1.0, 0.0]);
        assert_eq!(u.f_scale, [1.0, 1.0]);

        let p = session.interaction.point;
        assert_eq!(
            u.f_point,
            [session.surface.x(p.u, p.v) as f32, session.surface.y(p.u, p.v) as f32]
        );
    }

    #[test]
    fn background_quad_lands_in_mono_depth_range() {
        let m = Mat4::perspective_rh_gl(MONO_FOV, MONO_ASPECT, MONO_NEAR, MONO_FAR) * background_matrix();
        let clip = m * glam::Vec4::new(0.5, 0.5, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!((-1.0..=1.0).contains(&ndc_z));
    }

    #[test]
    fn failed_rebuild_keeps_previous_mesh() {
        let mut session = session();
        let before = session.mesh.clone();
        let bad = ParameterDomain {
            step: 0.0,
            ..session.domain
        };
        assert!(session.rebuild_mesh(bad).is_err());
        assert_eq!(session.mesh, before);
        assert_eq!(session.mesh_revision(), 0);

        let finer = ParameterDomain {
            step: 0.25,
            ..session.domain
        };
        session.rebuild_mesh(finer).unwrap();
        assert_eq!(session.mesh_revision(), 1);
        assert_eq!(session.interaction.step(), 0.25);
        assert_eq!(session.mesh.vertex_count() as usize, finer.expected_vertex_count());
    }
}
