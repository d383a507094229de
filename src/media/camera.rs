use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::MediaError;
use crate::media::resource::{DecodedImage, ResourceState};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub trait FrameSource: Send {
    fn describe(&self) -> String;

    fn next_frame(&mut self) -> Result<DecodedImage, MediaError>;
}

pub struct DirectorySource {
    directory: PathBuf,
    frames: Vec<PathBuf>,
    cursor: usize,
}

impl DirectorySource {
    pub fn open(directory: &Path) -> Result<Self, MediaError> {
        let entries = std::fs::read_dir(directory).map_err(|source| MediaError::CaptureDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(MediaError::EmptyCaptureDirectory(directory.to_path_buf()));
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            frames,
            cursor: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for DirectorySource {
    fn describe(&self) -> String {
        format!("{} ({} frames)", self.directory.display(), self.frame_count())
    }

    fn next_frame(&mut self) -> Result<DecodedImage, MediaError> {
        let path = &self.frames[self.cursor];
        self.cursor = (self.cursor + 1) % self.frames.len();
        DecodedImage::open(path, false)
    }
}

type Acquire = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>, MediaError> + Send>;

pub struct CameraFeed {
    state: ResourceState<String>,
    latest: Arc<Mutex<Option<DecodedImage>>>,
    rx_acquired: Option<Receiver<Result<String, MediaError>>>,
    tx_stop: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl CameraFeed {
    pub fn start(directory: Option<PathBuf>, fps: f64) -> Self {
        Self::with_source(
            Box::new(move || match directory {
                Some(dir) => DirectorySource::open(&dir).map(|s| Box::new(s) as Box<dyn FrameSource>),
                None => Err(MediaError::NoCaptureDevice),
            }),
            fps,
        )
    }

    pub fn with_source(acquire: Acquire, fps: f64) -> Self {
        let (tx_acquired, rx_acquired) = channel::bounded(1);
        let (tx_stop, rx_stop) = channel::bounded::<()>(1);
        let latest = Arc::new(Mutex::new(None));

        let interval = Duration::from_secs_f64(1.0 / fps.clamp(1.0, 240.0));
        let latest_clone = Arc::clone(&latest);
        let thread_handle = thread::spawn(move || {
            camera_thread(acquire, interval, tx_acquired, rx_stop, latest_clone);
        });

        Self {
            state: ResourceState::Pending,
            latest,
            rx_acquired: Some(rx_acquired),
            tx_stop: Some(tx_stop),
            thread_handle: Some(thread_handle),
        }
    }

    pub fn state(&self) -> &ResourceState<String> {
        &self.state
    }

    pub fn poll(&mut self) -> Option<DecodedImage> {
        if let Some(rx) = &self.rx_acquired {
            let acquired = match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(MediaError::LoaderExited)),
            };
            if let Some(result) = acquired {
                self.rx_acquired = None;
                self.state = match result {
                    Ok(description) => {
                        log::info!("Camera ready: {}", description);
                        ResourceState::Ready(description)
                    }
                    Err(e) => {
                        log::error!("Camera unavailable, continuing without background: {}", e);
                        ResourceState::Failed(e.to_string())
                    }
                };
            }
        }

        if self.state.is_ready() {
            self.latest.lock().take()
        } else {
            None
        }
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.tx_stop.take();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn camera_thread(
    acquire: Acquire,
    interval: Duration,
    tx_acquired: Sender<Result<String, MediaError>>,
    rx_stop: Receiver<()>,
    latest: Arc<Mutex<Option<DecodedImage>>>,
) {
    let mut source = match acquire() {
        Ok(source) => source,
        Err(e) => {
            let _ = tx_acquired.send(Err(e));
            return;
        }
    };
    let _ = tx_acquired.send(Ok(source.describe()));

    loop {
        match source.next_frame() {
            Ok(frame) => *latest.lock() = Some(frame),
            Err(e) => log::warn!("Dropped camera frame: {}", e),
        }

        match rx_stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
