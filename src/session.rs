use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioOutput, AudioTrack, WavPlayer};
use crate::capture::{CameraSource, FrameSource, SeekableSource, VideoSource};
use crate::clock::{Clock, SystemClock, DEFAULT_PLAYBACK_OFFSET};
use crate::detector::{CascadeDetector, DetectorParams, FaceDetect, DEFAULT_CASCADE};
use crate::display::{HighguiWindow, Layout, Surface, MAIN_WINDOW, PREVIEW_WINDOW};
use crate::menu::{run_menu, MenuOutcome};
use crate::playback::{run_playback, PlaybackOutcome};

pub const POLL_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
    pub camera_index: i32,
    pub cascade: String,
    pub detector: DetectorParams,
    pub offset: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_path: PathBuf::from("hell.wav"),
            video_path: PathBuf::from("hell.mp4"),
            camera_index: 0,
            cascade: DEFAULT_CASCADE.to_owned(),
            detector: DetectorParams::default(),
            offset: DEFAULT_PLAYBACK_OFFSET,
        }
    }
}

/// Everything a session drives, already opened.
pub struct SessionParts {
    pub camera: Box<dyn FrameSource>,
    pub video: Box<dyn SeekableSource>,
    pub detector: Box<dyn FaceDetect>,
    pub window: Box<dyn Surface>,
    pub preview: Box<dyn Surface>,
    pub audio: Box<dyn AudioOutput>,
    pub clock: Box<dyn Clock>,
}

/// How the program ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Main window closed, from either screen.
    Closed,
    /// `q` pressed on the menu.
    Quit,
    /// Camera stopped delivering frames on the menu.
    CameraLost,
    /// Video ran out of frames.
    Finished { frames: usize },
}

pub struct Session {
    pub(crate) camera: Box<dyn FrameSource>,
    pub(crate) video: Box<dyn SeekableSource>,
    pub(crate) detector: Box<dyn FaceDetect>,
    pub(crate) window: Box<dyn Surface>,
    pub(crate) preview: Box<dyn Surface>,
    pub(crate) audio: Box<dyn AudioOutput>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) layout: Layout,
    pub(crate) offset: Duration,
    pub(crate) poll_timeout: Duration,
    torn_down: bool,
}

impl Session {
    /// Opens assets and devices, failing before any window appears if one is missing.
    pub fn open(config: &PlayerConfig) -> anyhow::Result<Self> {
        let track = AudioTrack::load(&config.audio_path)?;
        let audio = WavPlayer::new(track)?;
        let video = VideoSource::open(&config.video_path)?;
        let camera = CameraSource::new(config.camera_index)?;
        let detector = CascadeDetector::new(&config.cascade, config.detector)?;

        let window = HighguiWindow::new(MAIN_WINDOW)?;
        let preview = HighguiWindow::new(PREVIEW_WINDOW)?;

        let parts = SessionParts {
            camera: Box::new(camera),
            video: Box::new(video),
            detector: Box::new(detector),
            window: Box::new(window),
            preview: Box::new(preview),
            audio: Box::new(audio),
            clock: Box::new(SystemClock),
        };
        Ok(Self::from_parts(parts, config.offset))
    }

    /// Window geometry comes from the video's native resolution.
    pub fn from_parts(parts: SessionParts, offset: Duration) -> Self {
        let layout = Layout::new(parts.video.frame_size());
        tracing::info!(width = layout.width, height = layout.height, "session ready");
        Self {
            camera: parts.camera,
            video: parts.video,
            detector: parts.detector,
            window: parts.window,
            preview: parts.preview,
            audio: parts.audio,
            clock: parts.clock,
            layout,
            offset,
            poll_timeout: POLL_TIMEOUT,
            torn_down: false,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Menu, then playback if started, then teardown on every path.
    pub fn run(&mut self) -> anyhow::Result<Exit> {
        let result = self.run_screens();
        self.teardown();
        result
    }

    fn run_screens(&mut self) -> anyhow::Result<Exit> {
        let exit = match run_menu(self)? {
            MenuOutcome::Start => {
                tracing::info!("start clicked");
                self.preview.close()?;
                match run_playback(self)? {
                    PlaybackOutcome::Finished { frames } => Exit::Finished { frames },
                    PlaybackOutcome::Closed { frames } => {
                        tracing::info!(frames, "window closed during playback");
                        Exit::Closed
                    }
                }
            }
            MenuOutcome::Closed => Exit::Closed,
            MenuOutcome::Quit => Exit::Quit,
            MenuOutcome::CameraLost => Exit::CameraLost,
        };
        tracing::info!(?exit, "leaving");
        Ok(exit)
    }

    /// Releases everything. Keeps going past individual failures and only
    /// does the work once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let steps = [
            ("camera", self.camera.release()),
            ("video", self.video.release()),
            ("audio", self.audio.stop()),
            ("preview", self.preview.close()),
            ("window", self.window.close()),
        ];
        for (resource, result) in steps {
            if let Err(err) = result {
                tracing::warn!(resource, %err, "failed to release");
            }
        }
        tracing::info!("session torn down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
