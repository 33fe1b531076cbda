use crate::detector::draw_face_boxes;
use crate::display::UiEvent;
use crate::session::Session;

pub const QUIT_KEY: char = 'q';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Start,
    Closed,
    Quit,
    CameraLost,
}

/// Live detection preview next to the start button, until something ends it.
pub fn run_menu(session: &mut Session) -> anyhow::Result<MenuOutcome> {
    let button = session.layout.start_button();
    let canvas = session.layout.menu_canvas(session.window.channel_order())?;

    loop {
        let mut frame = match session.camera.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(MenuOutcome::CameraLost),
            Err(err) => {
                tracing::debug!(%err, "camera read failed");
                return Ok(MenuOutcome::CameraLost);
            }
        };

        let faces = session.detector.detect(&frame)?;
        tracing::trace!(faces = faces.len(), "menu frame");
        draw_face_boxes(&mut frame, &faces)?;
        session.preview.present(&frame)?;

        session.window.present(&canvas)?;

        for event in session.window.poll_events(session.poll_timeout)? {
            match event {
                UiEvent::Close => return Ok(MenuOutcome::Closed),
                UiEvent::MouseDown { x, y } if button.contains(x, y) => {
                    return Ok(MenuOutcome::Start)
                }
                UiEvent::MouseDown { x, y } => tracing::trace!(x, y, "click outside button"),
                UiEvent::Key(QUIT_KEY) => return Ok(MenuOutcome::Quit),
                UiEvent::Key(_) => {}
            }
        }
        // the preview only contributes key presses
        let preview_events = session.preview.poll_events(session.poll_timeout)?;
        if preview_events.contains(&UiEvent::Key(QUIT_KEY)) {
            return Ok(MenuOutcome::Quit);
        }
    }
}
