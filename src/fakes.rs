//! In-memory stand-ins for the devices a [`Session`](crate::Session) drives.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use opencv::core;
use opencv::prelude::*;

use crate::audio::AudioOutput;
use crate::capture::{FrameSource, SeekableSource};
use crate::clock::Clock;
use crate::detector::{FaceBox, FaceDetect};
use crate::display::{ChannelOrder, Surface, UiEvent};
use crate::session::SessionParts;

pub const WIDTH: i32 = 160;
pub const HEIGHT: i32 = 120;

pub fn solid_frame(value: f64) -> Mat {
    Mat::new_rows_cols_with_default(HEIGHT, WIDTH, core::CV_8UC3, core::Scalar::all(value))
        .unwrap()
}

/// Shared log so tests can look at what happened after the session took ownership.
#[derive(Default)]
pub struct Journal {
    pub presented_main: Cell<usize>,
    pub presented_preview: Cell<usize>,
    pub main_frames: RefCell<Vec<Mat>>,
    pub seeks: RefCell<Vec<Duration>>,
    pub camera_reads: Cell<usize>,
    pub video_reads: Cell<usize>,
    pub audio_started: Cell<usize>,
    pub audio_stopped: Cell<usize>,
    pub camera_released: Cell<usize>,
    pub video_released: Cell<usize>,
    pub main_closed: Cell<usize>,
    pub preview_closed: Cell<usize>,
}

/// Hands out `frames` solid frames, then reports no frame forever.
pub struct FakeCamera {
    pub remaining: Option<usize>,
    pub journal: Rc<Journal>,
}

impl FrameSource for FakeCamera {
    fn read_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        self.journal.camera_reads.set(self.journal.camera_reads.get() + 1);
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(left) => {
                *left -= 1;
                Ok(Some(solid_frame(0.0)))
            }
            None => Ok(Some(solid_frame(0.0))),
        }
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.journal
            .camera_released
            .set(self.journal.camera_released.get() + 1);
        Ok(())
    }
}

/// Decodes successfully until read number `fail_on` (1 based).
pub struct FakeVideo {
    pub fail_on: usize,
    pub journal: Rc<Journal>,
}

impl FrameSource for FakeVideo {
    fn read_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        let call = self.journal.video_reads.get() + 1;
        self.journal.video_reads.set(call);
        if call >= self.fail_on {
            return Ok(None);
        }
        Ok(Some(solid_frame(90.0)))
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.journal
            .video_released
            .set(self.journal.video_released.get() + 1);
        Ok(())
    }
}

impl SeekableSource for FakeVideo {
    fn seek(&mut self, position: Duration) -> anyhow::Result<()> {
        self.journal.seeks.borrow_mut().push(position);
        Ok(())
    }

    fn frame_size(&self) -> core::Size {
        core::Size::new(WIDTH, HEIGHT)
    }
}

/// Returns the scripted results in order, repeating the last one. An empty
/// script fails every call.
pub struct FakeDetector {
    pub script: VecDeque<Vec<FaceBox>>,
}

impl FakeDetector {
    pub fn always(faces: Vec<FaceBox>) -> Self {
        Self {
            script: VecDeque::from([faces]),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }
}

impl FaceDetect for FakeDetector {
    fn detect(&mut self, _frame: &Mat) -> anyhow::Result<Vec<FaceBox>> {
        match self.script.len() {
            0 => anyhow::bail!("detector failed"),
            1 => Ok(self.script.front().cloned().unwrap_or_default()),
            _ => Ok(self.script.pop_front().unwrap_or_default()),
        }
    }
}

pub struct FakeSurface {
    pub main: bool,
    /// One batch of events per poll, empty once exhausted.
    pub events: VecDeque<Vec<UiEvent>>,
    pub journal: Rc<Journal>,
}

impl Surface for FakeSurface {
    fn present(&mut self, frame: &Mat) -> anyhow::Result<()> {
        if self.main {
            self.journal
                .presented_main
                .set(self.journal.presented_main.get() + 1);
            self.journal.main_frames.borrow_mut().push(frame.clone());
        } else {
            self.journal
                .presented_preview
                .set(self.journal.presented_preview.get() + 1);
        }
        Ok(())
    }

    fn poll_events(&mut self, _timeout: Duration) -> anyhow::Result<Vec<UiEvent>> {
        Ok(self.events.pop_front().unwrap_or_default())
    }

    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Bgr
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let counter = if self.main {
            &self.journal.main_closed
        } else {
            &self.journal.preview_closed
        };
        counter.set(counter.get() + 1);
        Ok(())
    }
}

pub struct FakeAudio {
    pub journal: Rc<Journal>,
}

impl AudioOutput for FakeAudio {
    fn play(&mut self) -> anyhow::Result<()> {
        self.journal
            .audio_started
            .set(self.journal.audio_started.get() + 1);
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.journal
            .audio_stopped
            .set(self.journal.audio_stopped.get() + 1);
        Ok(())
    }
}

/// Moves forward by `step` every time it is read.
pub struct SteppingClock {
    pub current: Cell<Instant>,
    pub step: Duration,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            current: Cell::new(Instant::now()),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }
}

pub struct Rig {
    pub camera_frames: Option<usize>,
    pub video_fail_on: usize,
    pub detector: FakeDetector,
    pub main_events: Vec<Vec<UiEvent>>,
    pub preview_events: Vec<Vec<UiEvent>>,
    pub clock_step: Duration,
}

impl Default for Rig {
    fn default() -> Self {
        Self {
            camera_frames: None,
            video_fail_on: usize::MAX,
            detector: FakeDetector::always(Vec::new()),
            main_events: Vec::new(),
            preview_events: Vec::new(),
            clock_step: Duration::from_millis(40),
        }
    }
}

impl Rig {
    pub fn build(self) -> (SessionParts, Rc<Journal>) {
        let journal = Rc::new(Journal::default());
        let parts = SessionParts {
            camera: Box::new(FakeCamera {
                remaining: self.camera_frames,
                journal: Rc::clone(&journal),
            }),
            video: Box::new(FakeVideo {
                fail_on: self.video_fail_on,
                journal: Rc::clone(&journal),
            }),
            detector: Box::new(self.detector),
            window: Box::new(FakeSurface {
                main: true,
                events: self.main_events.into(),
                journal: Rc::clone(&journal),
            }),
            preview: Box::new(FakeSurface {
                main: false,
                events: self.preview_events.into(),
                journal: Rc::clone(&journal),
            }),
            audio: Box::new(FakeAudio {
                journal: Rc::clone(&journal),
            }),
            clock: Box::new(SteppingClock::new(self.clock_step)),
        };
        (parts, journal)
    }
}
