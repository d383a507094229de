use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::math::surface::{DEFAULT_DERIVATIVE_DELTA, ShapeConstants};
use crate::math::tessellator::ParameterDomain;
use crate::renderer::backend::ColorMask;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub surface: SurfaceConfig,
    pub stereo: StereoConfig,
    pub interaction: InteractionConfig,
    pub anaglyph: AnaglyphConfig,
    pub media: MediaConfig,
    pub tick_hz: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            surface: SurfaceConfig::default(),
            stereo: StereoConfig::default(),
            interaction: InteractionConfig::default(),
            anaglyph: AnaglyphConfig::default(),
            media: MediaConfig::default(),
            tick_hz: 20.0,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Anaglyph Surface".to_string(),
            width: 1300,
            height: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub u_from: f64,
    pub u_to: f64,
    pub v_from: f64,
    pub v_to: f64,
    pub step: f64,
    pub derivative_delta: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            a: 2.0,
            b: 3.0,
            c: 2.0,
            d: 4.0,
            u_from: 0.0,
            u_to: TAU,
            v_from: 0.0,
            v_to: TAU,
            step: 0.1,
            derivative_delta: DEFAULT_DERIVATIVE_DELTA,
        }
    }
}

impl SurfaceConfig {
    pub fn shape(&self) -> ShapeConstants {
        ShapeConstants {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
        }
    }

    pub fn domain(&self) -> ParameterDomain {
        ParameterDomain {
            u_from: self.u_from,
            u_to: self.u_to,
            v_from: self.v_from,
            v_to: self.v_to,
            step: self.step,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub eye_separation: f32,
    pub field_of_view: f32,
    pub near_clipping: f32,
    pub convergence: f32,
    pub aspect_ratio: f32,
    pub far_clipping: f32,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            eye_separation: 0.1,
            field_of_view: 0.5,
            near_clipping: 5.0,
            convergence: 10.0,
            aspect_ratio: 1.3,
            far_clipping: 20000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub point_u: f64,
    pub point_v: f64,
    pub light_phase: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            point_u: 200.0,
            point_v: 200.0,
            light_phase: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AnaglyphConfig {
    pub first_pass_mask: ColorMask,
    pub second_pass_mask: ColorMask,
}

impl Default for AnaglyphConfig {
    fn default() -> Self {
        Self {
            first_pass_mask: ColorMask::RED,
            second_pass_mask: ColorMask::GREEN_BLUE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub texture_path: Option<PathBuf>,
    pub camera_directory: Option<PathBuf>,
    pub camera_fps: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            texture_path: None,
            camera_directory: None,
            camera_fps: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.surface.b, 3.0);
        assert_eq!(config.surface.c, 2.0);
        assert_eq!(config.surface.d, 4.0);
        assert_eq!(config.tick_hz, 20.0);
        assert_eq!(config.anaglyph.first_pass_mask, ColorMask::RED);
        assert!(config.media.texture_path.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "surface": { "a": 1.5, "step": 0.5 },
                "stereo": { "convergence": 12.0 },
                "anaglyph": { "second_pass_mask": { "red": false, "green": true, "blue": true, "alpha": false } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.surface.a, 1.5);
        assert_eq!(config.surface.step, 0.5);
        assert_eq!(config.surface.u_to, TAU);
        assert_eq!(config.stereo.convergence, 12.0);
        assert_eq!(config.stereo.aspect_ratio, 1.3);
        assert_eq!(config.anaglyph.second_pass_mask, ColorMask::GREEN_BLUE);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("anaglyph-surface-missing-config.json");
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing-config"));
    }

    #[test]
    fn no_path_means_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.interaction.point_u, 200.0);
    }
}
