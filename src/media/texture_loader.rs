use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, TryRecvError};

use crate::error::MediaError;
use crate::media::resource::{DecodedImage, ResourceState};

pub struct TextureLoader {
    state: ResourceState<DecodedImage>,
    rx: Option<Receiver<Result<DecodedImage, MediaError>>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn spawn(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            log::info!("No surface texture configured");
            return Self {
                state: ResourceState::Failed("no texture configured".into()),
                rx: None,
                thread_handle: None,
            };
        };

        let (tx, rx) = channel::bounded(1);
        let thread_handle = thread::spawn(move || {
            let _ = tx.send(DecodedImage::open(&path, true));
        });

        Self {
            state: ResourceState::Pending,
            rx: Some(rx),
            thread_handle: Some(thread_handle),
        }
    }

    pub fn state(&self) -> &ResourceState<DecodedImage> {
        &self.state
    }

    pub fn poll(&mut self) -> Option<&DecodedImage> {
        let rx = self.rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(MediaError::LoaderExited),
        };

        self.rx = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        match result {
            Ok(image) => {
                log::info!("Surface texture ready ({}x{})", image.width, image.height);
                self.state = ResourceState::Ready(image);
            }
            Err(e) => {
                log::warn!("Surface texture failed to load: {}", e);
                self.state = ResourceState::Failed(e.to_string());
            }
        }

        match &self.state {
            ResourceState::Ready(image) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::resource::test_support::*;

    #[test]
    fn no_path_fails_immediately() {
        let mut loader = TextureLoader::spawn(None);
        assert!(loader.state().error().is_some());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn loads_and_flips_on_worker() {
        let dir = scratch_dir("texture-loader");
        let path = dir.join("surface.png");
        write_two_row_png(&path);

        let mut loader = TextureLoader::spawn(Some(path));
        assert!(loader.state().is_pending());

        let mut delivered = None;
        assert!(wait_until(|| {
            if let Some(image) = loader.poll() {
                delivered = Some(image.clone());
            }
            !loader.state().is_pending()
        }));

        let image = delivered.unwrap();
        assert_eq!((image.width, image.height), (1, 2));
        assert_eq!(&image.pixels[0..4], &[0, 0, 255, 255]);
        assert!(loader.state().is_ready());
        // handed out once only
        assert!(loader.poll().is_none());

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unreadable_image_ends_failed() {
        let dir = scratch_dir("texture-broken");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut loader = TextureLoader::spawn(Some(path));
        assert!(wait_until(|| {
            loader.poll();
            !loader.state().is_pending()
        }));
        assert!(loader.state().error().is_some());

        std::fs::remove_dir_all(dir).unwrap();
    }
}
