use crate::clock::playback_position;
use crate::display::{draw_presence_marker, orient_for_display, to_channel_order, UiEvent};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished { frames: usize },
    Closed { frames: usize },
}

/// A missing camera frame during playback just means no face this time round.
fn face_visible(session: &mut Session) -> anyhow::Result<bool> {
    let frame = match session.camera.read_frame() {
        Ok(Some(frame)) => frame,
        Ok(None) => return Ok(false),
        Err(err) => {
            tracing::debug!(%err, "camera read failed during playback");
            return Ok(false);
        }
    };
    Ok(!session.detector.detect(&frame)?.is_empty())
}

/// Plays the video against the wall clock with the audio running, marking
/// frames where the camera currently sees a face.
pub fn run_playback(session: &mut Session) -> anyhow::Result<PlaybackOutcome> {
    let order = session.window.channel_order();
    let layout = session.layout;

    session.audio.play()?;
    let start = session.clock.now();
    tracing::info!(offset = ?session.offset, "playback started");

    let mut frames = 0;
    loop {
        let wall = session.clock.now().saturating_duration_since(start);
        let position = playback_position(wall, session.offset);

        let decoded = session
            .video
            .seek(position)
            .and_then(|_| session.video.read_frame());
        let frame = match decoded {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(frames, ?position, "video finished");
                return Ok(PlaybackOutcome::Finished { frames });
            }
            Err(err) => {
                tracing::debug!(%err, frames, ?position, "video decode failed");
                return Ok(PlaybackOutcome::Finished { frames });
            }
        };

        let frame = to_channel_order(frame, order)?;
        let mut canvas = orient_for_display(&frame)?;
        if face_visible(session)? {
            draw_presence_marker(&mut canvas, &layout, order)?;
        }
        session.window.present(&canvas)?;
        frames += 1;
        tracing::trace!(frames, ?position, "rendered frame");

        let events = session.window.poll_events(session.poll_timeout)?;
        if events.contains(&UiEvent::Close) {
            return Ok(PlaybackOutcome::Closed { frames });
        }
    }
}
