pub mod camera;
pub mod resource;
pub mod texture_loader;

pub use camera::CameraFeed;
pub use resource::{DecodedImage, ResourceState};
pub use texture_loader::TextureLoader;
