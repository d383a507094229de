pub mod mesh;
pub mod stereo;
pub mod surface;
pub mod tessellator;

pub use mesh::Mesh;
pub use stereo::{StereoCamera, StereoParameters};
pub use surface::EllipticTorus;
pub use tessellator::{ParameterDomain, Tessellator};
