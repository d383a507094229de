use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not get a graphics context: {0}")]
    ContextUnavailable(String),

    #[error("shader program failed to build: {0}")]
    ShaderCompile(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid surface domain: {0}")]
    Domain(#[from] DomainError),

    #[error("surface frame unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::ContextUnavailable(_) => {
                "Sorry, could not get a graphics context.".to_string()
            }
            other => format!("Sorry, could not initialize the graphics context: {}", other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("step must be positive and finite, got {0}")]
    NonPositiveStep(f64),

    #[error("domain bounds must be finite")]
    NonFiniteBound,

    #[error("{axis} range is empty (from > to)")]
    EmptyRange { axis: char },

    #[error("step {step} is lost against {axis} bound magnitude")]
    StepTooSmall { axis: char, step: f64 },

    #[error("domain would emit {count} vertices, limit is {limit}")]
    TooManyVertices { count: f64, limit: usize },
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("no capture device configured")]
    NoCaptureDevice,

    #[error("cannot open capture directory {path}: {source}")]
    CaptureDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("capture directory {0} contains no frames")]
    EmptyCaptureDirectory(PathBuf),

    #[error("loader thread exited without a result")]
    LoaderExited,
}
