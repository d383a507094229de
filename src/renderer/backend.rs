use bytemuck::{Pod, Zeroable};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl ColorMask {
    pub const ALL: Self = Self::new(true, true, true, true);
    pub const RED: Self = Self::new(true, false, false, false);
    pub const GREEN_BLUE: Self = Self::new(false, true, true, false);

    pub const fn new(red: bool, green: bool, blue: bool, alpha: bool) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    Surface,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Camera,
    Surface,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShaderUniforms {
    pub model_view_projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub w_matrix: [[f32; 4]; 4],
    pub w_inverse_transpose: [[f32; 4]; 4],
    pub view_world_position: [f32; 3],
    pub l: f32,
    pub light_world_position: [f32; 3],
    pub _pad0: f32,
    pub light_dir: [f32; 3],
    pub _pad1: f32,
    pub color: [f32; 4],
    pub f_scale: [f32; 2],
    pub f_point: [f32; 2],
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

pub trait RenderBackend {
    fn clear(&mut self, color: [f64; 4]);

    fn clear_depth(&mut self);

    fn set_color_mask(&mut self, mask: ColorMask);

    fn bind_texture(&mut self, slot: TextureSlot);

    fn set_uniforms(&mut self, uniforms: &ShaderUniforms);

    fn draw_triangle_strip(&mut self, model: ModelId, vertex_count: u32);
}
