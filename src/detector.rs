use opencv::prelude::*;
use opencv::{core, imgproc, objdetect, types};

/// Asset looked up through OpenCV's sample data search path.
pub const DEFAULT_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";

/// Axis aligned face rectangle in camera frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<core::Rect> for FaceBox {
    fn from(rect: core::Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl From<FaceBox> for core::Rect {
    fn from(face: FaceBox) -> Self {
        core::Rect::new(face.x, face.y, face.width, face.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: i32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 30,
        }
    }
}

pub trait FaceDetect {
    /// Takes a colour camera frame, returns every face found in it.
    fn detect(&mut self, frame: &Mat) -> anyhow::Result<Vec<FaceBox>>;
}

pub struct CascadeDetector {
    classifier: objdetect::CascadeClassifier,
    params: DetectorParams,
}

impl CascadeDetector {
    pub fn new(cascade: &str, params: DetectorParams) -> anyhow::Result<Self> {
        let xml = core::find_file_def(cascade)?;
        let classifier = objdetect::CascadeClassifier::new(&xml)?;
        if classifier.empty()? {
            anyhow::bail!("Cascade {} loaded but contains no stages", xml);
        }
        tracing::debug!(%xml, ?params, "loaded face cascade");
        Ok(Self { classifier, params })
    }
}

impl FaceDetect for CascadeDetector {
    fn detect(&mut self, frame: &Mat) -> anyhow::Result<Vec<FaceBox>> {
        // classifier only accepts single channel intensity data
        let gray = crate::convert_to_grayscale(frame)?;
        let mut faces = types::VectorOfRect::new();

        self.classifier.detect_multi_scale(
            &gray,
            &mut faces,
            self.params.scale_factor,
            self.params.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            core::Size {
                width: self.params.min_size,
                height: self.params.min_size,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(faces.into_iter().map(FaceBox::from).collect())
    }
}

/// Draws a green outline per face, used for the live preview.
pub fn draw_face_boxes(frame: &mut Mat, faces: &[FaceBox]) -> anyhow::Result<()> {
    for face in faces {
        imgproc::rectangle(
            frame,
            core::Rect::from(*face),
            core::Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}
