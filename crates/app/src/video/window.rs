use finger_core::model::{HAND_CONNECTIONS, Hand};
use finger_core::quiz::Overlay;
use opencv::core::{Mat, Point, Scalar};
use opencv::highgui;
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_AA};
use opencv::prelude::*;
use services::{Control, DisplayError, FrameSink};
use tracing::debug;

use super::backend;

pub const WINDOW_TITLE: &str = "Finger Counter";

const QUIT_KEY: u8 = b'q';
const KEY_WAIT_MS: i32 = 10;

/// BGR colours.
const BLUE: (f64, f64, f64) = (255.0, 0.0, 0.0);
const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

fn scalar((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// The on-screen video window with hand skeletons and quiz text.
pub struct Window;

impl Window {
    /// # Errors
    ///
    /// Returns `DisplayError::Backend` if the window cannot be created.
    pub fn open() -> Result<Self, DisplayError> {
        highgui::named_window(WINDOW_TITLE, highgui::WINDOW_AUTOSIZE)
            .map_err(|err| DisplayError::Backend(backend(err)))?;
        Ok(Self)
    }

    fn draw(frame: &mut Mat, hands: &[Hand], overlay: &Overlay) -> opencv::Result<()> {
        let (width, height) = (frame.cols() as f32, frame.rows() as f32);
        let to_pixel = |index: usize, hand: &Hand| {
            let lm = hand.landmark(index);
            Point::new((lm.x * width) as i32, (lm.y * height) as i32)
        };

        for hand in hands {
            for (a, b) in HAND_CONNECTIONS {
                imgproc::line(
                    frame,
                    to_pixel(a, hand),
                    to_pixel(b, hand),
                    scalar(WHITE),
                    2,
                    LINE_AA,
                    0,
                )?;
            }
            for index in 0..hand.landmarks().len() {
                imgproc::circle(frame, to_pixel(index, hand), 4, scalar(RED), -1, LINE_AA, 0)?;
            }
        }

        text(frame, &overlay.total_label(), 70, BLUE)?;
        text(frame, &overlay.prompt, 150, GREEN)?;
        if let Some(message) = overlay.correct_message() {
            text(frame, message, 250, GREEN)?;
        }
        Ok(())
    }
}

fn text(frame: &mut Mat, content: &str, y: i32, colour: (f64, f64, f64)) -> opencv::Result<()> {
    imgproc::put_text(
        frame,
        content,
        Point::new(10, y),
        FONT_HERSHEY_SIMPLEX,
        2.0,
        scalar(colour),
        2,
        LINE_AA,
        false,
    )
}

impl FrameSink for Window {
    type Frame = Mat;

    fn present(
        &mut self,
        mut frame: Mat,
        hands: &[Hand],
        overlay: &Overlay,
    ) -> Result<Control, DisplayError> {
        Self::draw(&mut frame, hands, overlay).map_err(|err| DisplayError::Backend(backend(err)))?;
        highgui::imshow(WINDOW_TITLE, &frame).map_err(|err| DisplayError::Backend(backend(err)))?;

        let key = highgui::wait_key(KEY_WAIT_MS)
            .map_err(|err| DisplayError::Backend(backend(err)))?;
        if key & 0xFF == i32::from(QUIT_KEY) {
            return Ok(Control::Quit);
        }
        Ok(Control::Continue)
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Err(err) = highgui::destroy_all_windows() {
            debug!(error = %err, "closing windows failed");
        }
    }
}
