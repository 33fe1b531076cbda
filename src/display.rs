use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opencv::prelude::*;
use opencv::{core, highgui, imgproc};

pub const MAIN_WINDOW: &str = "Video Playback";
pub const PREVIEW_WINDOW: &str = "Webcam Feed - Face Detection";

const BUTTON_WIDTH: i32 = 100;
const BUTTON_HEIGHT: i32 = 50;
const MARKER_SIZE: i32 = 50;
const MARKER_THICKNESS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Close,
    MouseDown { x: i32, y: i32 },
    Key(char),
}

/// Byte order of the colour channels a surface expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

impl ChannelOrder {
    pub fn red(self) -> core::Scalar {
        match self {
            ChannelOrder::Bgr => core::Scalar::new(0.0, 0.0, 255.0, 0.0),
            ChannelOrder::Rgb => core::Scalar::new(255.0, 0.0, 0.0, 0.0),
        }
    }

    pub fn green(self) -> core::Scalar {
        core::Scalar::new(0.0, 255.0, 0.0, 0.0)
    }
}

/// Something frames are rendered onto and user input comes out of.
pub trait Surface {
    fn present(&mut self, frame: &Mat) -> anyhow::Result<()>;

    /// Waits up to `timeout` and drains whatever input arrived.
    fn poll_events(&mut self, timeout: Duration) -> anyhow::Result<Vec<UiEvent>>;

    fn channel_order(&self) -> ChannelOrder;

    fn close(&mut self) -> anyhow::Result<()>;
}

/// Lifecycle of a highgui window. `imshow` brings a window back even after
/// the user closed it, so presenting always makes it live again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowState {
    /// Created but nothing shown yet.
    Created,
    Shown,
    /// Closed by the user since the last present.
    Gone,
    /// Destroyed by us.
    Destroyed,
}

impl WindowState {
    fn presented(self) -> Self {
        WindowState::Shown
    }

    /// New state after a poll, and whether the poll should report `Close`.
    fn polled(self, visible: bool) -> (Self, bool) {
        match self {
            WindowState::Shown if !visible => (WindowState::Gone, true),
            state => (state, false),
        }
    }

    /// Whether the window still has to be destroyed.
    fn needs_destroy(self) -> bool {
        matches!(self, WindowState::Created | WindowState::Shown)
    }
}

pub struct HighguiWindow {
    name: String,
    events: Arc<Mutex<VecDeque<UiEvent>>>,
    state: WindowState,
}

impl HighguiWindow {
    pub fn new(name: &str) -> anyhow::Result<Self> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;

        let events = Arc::new(Mutex::new(VecDeque::new()));
        let sink = Arc::clone(&events);
        highgui::set_mouse_callback(
            name,
            Some(Box::new(move |event: i32, x: i32, y: i32, _flags: i32| {
                if event == highgui::EVENT_LBUTTONDOWN {
                    if let Ok(mut queue) = sink.lock() {
                        queue.push_back(UiEvent::MouseDown { x, y });
                    }
                }
            })),
        )?;

        Ok(Self {
            name: name.to_owned(),
            events,
            state: WindowState::Created,
        })
    }

    fn is_visible(&self) -> bool {
        // some backends error out once the window is gone
        highgui::get_window_property(&self.name, highgui::WND_PROP_VISIBLE)
            .map(|visible| visible >= 1.0)
            .unwrap_or(false)
    }
}

impl Surface for HighguiWindow {
    fn present(&mut self, frame: &Mat) -> anyhow::Result<()> {
        highgui::imshow(&self.name, frame)?;
        self.state = self.state.presented();
        Ok(())
    }

    fn poll_events(&mut self, timeout: Duration) -> anyhow::Result<Vec<UiEvent>> {
        let millis = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let key = highgui::wait_key(millis)?;

        let mut events: Vec<UiEvent> = match self.events.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        if key >= 0 {
            if let Some(c) = char::from_u32((key & 0xFF) as u32) {
                events.push(UiEvent::Key(c));
            }
        }
        let (state, closed) = self.state.polled(self.is_visible());
        self.state = state;
        if closed {
            events.push(UiEvent::Close);
        }
        Ok(events)
    }

    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Bgr
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let needs_destroy = self.state.needs_destroy();
        self.state = WindowState::Destroyed;
        if needs_destroy {
            highgui::destroy_window(&self.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub rect: core::Rect,
    pub label: String,
}

impl Button {
    pub fn centered(center: core::Point, width: i32, height: i32, label: &str) -> Self {
        Self {
            rect: core::Rect::new(center.x - width / 2, center.y - height / 2, width, height),
            label: label.to_owned(),
        }
    }

    /// Left and top edges are inside, right and bottom edges are not.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.rect.x
            && x < self.rect.x + self.rect.width
            && y >= self.rect.y
            && y < self.rect.y + self.rect.height
    }

    pub fn draw(&self, canvas: &mut Mat, order: ChannelOrder) -> anyhow::Result<()> {
        imgproc::rectangle(
            canvas,
            self.rect,
            order.green(),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let font = imgproc::FONT_HERSHEY_SIMPLEX;
        let scale = 1.0;
        let thickness = 2;
        let mut baseline = 0;
        let text = imgproc::get_text_size(&self.label, font, scale, thickness, &mut baseline)?;
        let origin = core::Point::new(
            self.rect.x + (self.rect.width - text.width) / 2,
            self.rect.y + (self.rect.height + text.height) / 2,
        );
        imgproc::put_text(
            canvas,
            &self.label,
            origin,
            font,
            scale,
            core::Scalar::all(0.0),
            thickness,
            imgproc::LINE_AA,
            false,
        )?;
        Ok(())
    }
}

/// Fixed screen geometry derived from the video's native resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
}

impl Layout {
    pub fn new(size: core::Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }

    pub fn center(&self) -> core::Point {
        core::Point::new(self.width / 2, self.height / 2)
    }

    pub fn start_button(&self) -> Button {
        Button::centered(self.center(), BUTTON_WIDTH, BUTTON_HEIGHT, "Start")
    }

    /// Where the face indicator goes during playback. Never depends on where
    /// the face actually is.
    pub fn presence_marker(&self) -> core::Rect {
        let center = self.center();
        core::Rect::new(
            center.x - MARKER_SIZE / 2,
            center.y - MARKER_SIZE / 2,
            MARKER_SIZE,
            MARKER_SIZE,
        )
    }

    pub fn blank_canvas(&self) -> anyhow::Result<Mat> {
        Ok(Mat::new_rows_cols_with_default(
            self.height,
            self.width,
            core::CV_8UC3,
            core::Scalar::all(0.0),
        )?)
    }

    pub fn menu_canvas(&self, order: ChannelOrder) -> anyhow::Result<Mat> {
        let mut canvas = self.blank_canvas()?;
        self.start_button().draw(&mut canvas, order)?;
        Ok(canvas)
    }
}

pub fn draw_presence_marker(
    canvas: &mut Mat,
    layout: &Layout,
    order: ChannelOrder,
) -> anyhow::Result<()> {
    imgproc::rectangle(
        canvas,
        layout.presence_marker(),
        order.red(),
        MARKER_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;
    Ok(())
}

/// Decoders hand out BGR.
pub fn to_channel_order(frame: Mat, order: ChannelOrder) -> anyhow::Result<Mat> {
    match order {
        ChannelOrder::Bgr => Ok(frame),
        ChannelOrder::Rgb => {
            let mut rgb = Mat::default();
            imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;
            Ok(rgb)
        }
    }
}

/// Axis swap into the column major surface layout, then a clockwise quarter
/// turn and a horizontal mirror. The three together leave the picture upright.
pub fn orient_for_display(frame: &Mat) -> anyhow::Result<Mat> {
    let mut swapped = Mat::default();
    core::transpose(frame, &mut swapped)?;
    let mut rotated = Mat::default();
    core::rotate(&swapped, &mut rotated, core::ROTATE_90_CLOCKWISE)?;
    let mut mirrored = Mat::default();
    core::flip(&rotated, &mut mirrored, 1)?;
    Ok(mirrored)
}
