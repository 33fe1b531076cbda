use clap::Parser;
use face_cue_player::capture::{CameraSource, FrameSource};
use face_cue_player::detector::{
    draw_face_boxes, CascadeDetector, DetectorParams, FaceDetect, DEFAULT_CASCADE,
};
use face_cue_player::display::{HighguiWindow, Surface, UiEvent, PREVIEW_WINDOW};
use face_cue_player::session::POLL_TIMEOUT;

/// Live face detection preview, for checking camera and cascade setup.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Args = Args::parse();

    let mut window = HighguiWindow::new(PREVIEW_WINDOW)?;
    let mut camera_source = CameraSource::new(args.camera)?;
    let mut detector = CascadeDetector::new(DEFAULT_CASCADE, DetectorParams::default())?;

    while let Some(mut frame) = camera_source.read_frame()? {
        let faces = detector.detect(&frame)?;
        draw_face_boxes(&mut frame, &faces)?;
        window.present(&frame)?;

        let events = window.poll_events(POLL_TIMEOUT)?;
        if events.contains(&UiEvent::Close) || events.contains(&UiEvent::Key('q')) {
            break;
        }
    }

    camera_source.release()?;
    window.close()?;
    Ok(())
}
