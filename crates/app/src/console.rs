use finger_core::model::Hand;
use finger_core::quiz::Overlay;
use services::{Control, DisplayError, FrameSink, ReplayFrame};
use tracing::info;

/// Headless display for replays: logs the overlay whenever it changes.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    last: Option<Overlay>,
}

impl ConsoleSink {
    fn changed(&self, overlay: &Overlay) -> bool {
        self.last.as_ref() != Some(overlay)
    }
}

impl FrameSink for ConsoleSink {
    type Frame = ReplayFrame;

    fn present(
        &mut self,
        frame: ReplayFrame,
        hands: &[Hand],
        overlay: &Overlay,
    ) -> Result<Control, DisplayError> {
        if self.changed(overlay) {
            info!(
                line = frame.line,
                hands = hands.len(),
                "{} | {}{}",
                overlay.total_label(),
                overlay.prompt,
                overlay
                    .correct_message()
                    .map(|msg| format!(" | {msg}"))
                    .unwrap_or_default()
            );
            self.last = Some(overlay.clone());
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(total: u32, show_correct: bool) -> Overlay {
        Overlay {
            total_fingers: total,
            prompt: "2 + 2 = ?".into(),
            show_correct,
            advanced: false,
        }
    }

    #[test]
    fn tracks_only_changes() {
        let mut sink = ConsoleSink::default();
        let frame = ReplayFrame {
            line: 1,
            hands: Vec::new(),
            error: None,
        };

        assert!(sink.changed(&overlay(4, false)));
        let control = sink.present(frame, &[], &overlay(4, false)).unwrap();
        assert_eq!(control, Control::Continue);
        assert!(!sink.changed(&overlay(4, false)));
        assert!(sink.changed(&overlay(4, true)));
    }
}
