use std::path::Path;
use std::time::Duration;

use opencv::prelude::*;
use opencv::{core, videoio};

use crate::PlayerError;

/// Anything that hands out frames one at a time.
pub trait FrameSource {
    /// `Ok(None)` means the source had nothing to give, which ends whichever
    /// loop is reading it.
    fn read_frame(&mut self) -> anyhow::Result<Option<Mat>>;

    fn release(&mut self) -> anyhow::Result<()>;
}

pub trait SeekableSource: FrameSource {
    fn seek(&mut self, position: Duration) -> anyhow::Result<()>;

    /// Native (width, height) of the stream.
    fn frame_size(&self) -> core::Size;
}

fn read_non_empty(capture: &mut videoio::VideoCapture) -> anyhow::Result<Option<Mat>> {
    let mut frame = Mat::default();
    if !capture.read(&mut frame)? || frame.empty() {
        return Ok(None);
    }
    Ok(Some(frame))
}

pub struct CameraSource {
    capture: videoio::VideoCapture,
    index: i32,
}

impl CameraSource {
    pub fn new(index: i32) -> Result<Self, PlayerError> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|_| PlayerError::CameraUnavailable(index))?;
        let opened = videoio::VideoCapture::is_opened(&capture).unwrap_or(false);
        if !opened {
            return Err(PlayerError::CameraUnavailable(index));
        }
        tracing::info!(index, "opened camera");
        Ok(Self { capture, index })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        let frame = read_non_empty(&mut self.capture)?;
        if frame.is_none() {
            tracing::debug!(index = self.index, "camera returned no frame");
        }
        Ok(frame)
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.capture.release()?;
        Ok(())
    }
}

pub struct VideoSource {
    capture: videoio::VideoCapture,
    size: core::Size,
}

impl VideoSource {
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::MissingAsset(path.to_path_buf()));
        }
        let unavailable = || PlayerError::VideoUnavailable(path.to_path_buf());
        let file_name = path.to_str().ok_or_else(unavailable)?;
        let capture = videoio::VideoCapture::from_file(file_name, videoio::CAP_ANY)
            .map_err(|_| unavailable())?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(unavailable());
        }

        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|_| unavailable())? as i32;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|_| unavailable())? as i32;
        if width <= 0 || height <= 0 {
            return Err(PlayerError::InvalidVideo {
                path: path.to_path_buf(),
                width,
                height,
            });
        }
        tracing::info!(?path, width, height, "opened video");

        Ok(Self {
            capture,
            size: core::Size { width, height },
        })
    }
}

impl FrameSource for VideoSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        read_non_empty(&mut self.capture)
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.capture.release()?;
        Ok(())
    }
}

impl SeekableSource for VideoSource {
    fn seek(&mut self, position: Duration) -> anyhow::Result<()> {
        // backends that cannot seek report false, the read that follows still decides
        let accepted = self
            .capture
            .set(videoio::CAP_PROP_POS_MSEC, position.as_secs_f64() * 1000.0)?;
        if !accepted {
            tracing::trace!(?position, "video backend ignored seek");
        }
        Ok(())
    }

    fn frame_size(&self) -> core::Size {
        self.size
    }
}
