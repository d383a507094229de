use std::path::Path;

use crate::error::MediaError;

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> ResourceState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ResourceState::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceState::Pending => "loading",
            ResourceState::Ready(_) => "ready",
            ResourceState::Failed(_) => "unavailable",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResourceState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn open(path: &Path, flip_rows: bool) -> Result<Self, MediaError> {
        let mut rgba = image::open(path)?.to_rgba8();
        if flip_rows {
            image::imageops::flip_vertical_in_place(&mut rgba);
        }
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("anaglyph-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn write_two_row_png(path: &Path) {
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.save(path).unwrap();
    }

    pub fn write_solid_png(path: &Path, width: u32, height: u32, value: u8) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([value, value, value, 255]))
            .save(path)
            .unwrap();
    }

    pub fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn flipping_puts_bottom_row_first() {
        let dir = scratch_dir("flip");
        let path = dir.join("rows.png");
        write_two_row_png(&path);

        let upright = DecodedImage::open(&path, false).unwrap();
        assert_eq!((upright.width, upright.height), (1, 2));
        assert_eq!(&upright.pixels[0..4], &[255, 0, 0, 255]);

        let flipped = DecodedImage::open(&path, true).unwrap();
        assert_eq!(&flipped.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&flipped.pixels[4..8], &[255, 0, 0, 255]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = DecodedImage::open(Path::new("/definitely/not/here.png"), true).unwrap_err();
        assert!(matches!(err, MediaError::Image(_)));
    }

    #[test]
    fn state_labels() {
        let pending: ResourceState<u8> = ResourceState::Pending;
        assert!(pending.is_pending());
        assert_eq!(pending.label(), "loading");
        assert_eq!(ResourceState::Ready(1u8).label(), "ready");

        let failed: ResourceState<u8> = ResourceState::Failed("nope".into());
        assert_eq!(failed.error(), Some("nope"));
        assert!(!failed.is_ready());
    }
}
