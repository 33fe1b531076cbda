use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use face_cue_player::detector::DEFAULT_CASCADE;
use face_cue_player::{PlayerConfig, Session};

#[derive(Parser, Debug)]
#[command(about = "Waits for a face and a click, then plays the video")]
struct Args {
    /// Audio track played alongside the video.
    #[clap(long, default_value = "hell.wav")]
    audio: PathBuf,

    /// Video file to play.
    #[clap(long, default_value = "hell.mp4")]
    video: PathBuf,

    /// Camera device index.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,

    /// Milliseconds the video lags behind the audio clock.
    #[clap(long, default_value_t = 120)]
    offset_ms: u64,

    /// Haar cascade, resolved through OpenCV's data search path.
    #[clap(long, default_value = DEFAULT_CASCADE)]
    cascade: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Args = Args::parse();

    let config = PlayerConfig {
        audio_path: args.audio,
        video_path: args.video,
        camera_index: args.camera,
        cascade: args.cascade,
        offset: Duration::from_millis(args.offset_ms),
        ..Default::default()
    };

    let mut session = Session::open(&config)?;
    let exit = session.run()?;
    tracing::info!(?exit, "done");
    Ok(())
}
