pub mod backend;
pub mod frame;
pub mod gpu;
pub mod texture;
pub mod trackball;

pub use backend::{ModelId, TextureSlot};
pub use frame::RenderSession;
pub use gpu::GpuState;
