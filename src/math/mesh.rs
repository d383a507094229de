#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
}

impl Mesh {
    pub fn with_capacity(vertex_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            texcoords: Vec::with_capacity(vertex_count * 2),
        }
    }

    pub fn push(&mut self, position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) {
        self.vertices.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.texcoords.extend_from_slice(&texcoord);
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / 3) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn background_quad() -> Self {
        Self {
            vertices: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0,
                0.0, 0.0,
            ],
            normals: [0.0, 0.0, -1.0].repeat(6),
            texcoords: vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
        }
    }
}
