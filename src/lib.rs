use std::path::PathBuf;

use opencv::imgproc;
use opencv::prelude::*;
use thiserror::Error;

pub mod audio;
pub mod capture;
pub mod clock;
pub mod detector;
pub mod display;
pub mod menu;
pub mod playback;
pub mod session;

#[cfg(test)]
mod fakes;

pub use capture::{CameraSource, FrameSource, SeekableSource, VideoSource};
pub use detector::{CascadeDetector, DetectorParams, FaceBox, FaceDetect};
pub use session::{Exit, PlayerConfig, Session, SessionParts};

pub fn convert_to_grayscale(image: &Mat) -> anyhow::Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

/// Startup failures, reported to the user before any window opens.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Asset not found: {}", .0.display())]
    MissingAsset(PathBuf),
    #[error("Unable to open camera {0}")]
    CameraUnavailable(i32),
    #[error("Unable to open video {}", .0.display())]
    VideoUnavailable(PathBuf),
    #[error("Video {} reports unusable size {width}x{height}", .path.display())]
    InvalidVideo {
        path: PathBuf,
        width: i32,
        height: i32,
    },
    #[error("Unable to decode audio {}", .path.display())]
    Audio {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("No audio output device available")]
    NoAudioDevice,
    #[error("Unable to query audio output formats")]
    AudioDevice(#[from] cpal::SupportedStreamConfigsError),
    #[error("Audio output cannot play {channels} channel(s) at {sample_rate} Hz as f32")]
    UnsupportedAudioFormat { channels: u16, sample_rate: u32 },
}
