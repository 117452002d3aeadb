// shared/src/controller.rs
//
// Dashboard controller: the socket handle, the series buffer and the button flags, plus the
// mapping from server frames and button clicks onto them. No DOM and no real socket here; the
// frontend wires the callbacks of whatever connection it opened into these handlers.

use crate::controls::{ControlState, RunState};
use crate::protocol::{decode_inbound, Command, Inbound, ProtocolError, ServerMsg};
use crate::series::{Point, SeriesBuffer};

/// Outbound half of the connection as the controller sees it.
pub trait CommandSink {
    fn send_text(&self, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("websocket not connected")]
    NotConnected,
    #[error("websocket send failed: {0}")]
    Transport(String),
}

/// What a single inbound frame did to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// `restart` is accepted but changes nothing.
    Restart,
    Controls(ControlState),
    Appended(Point),
    Ignored(String),
}

/// A user-facing message the shell shows in a blocking dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
}

pub struct DashboardController<S> {
    sink: Option<S>,
    open: bool,
    series: SeriesBuffer,
    controls: ControlState,
}

impl<S> Default for DashboardController<S> {
    fn default() -> Self {
        Self {
            sink: None,
            open: false,
            series: SeriesBuffer::new(),
            controls: ControlState::default(),
        }
    }
}

impl<S: CommandSink> DashboardController<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the controller the socket it should send clicks on.
    pub fn attach(&mut self, sink: S) {
        self.sink = Some(sink);
    }

    pub fn on_open(&mut self) {
        self.open = true;
    }

    pub fn on_message(&mut self, text: &str) -> Result<Applied, ProtocolError> {
        let applied = match decode_inbound(text)? {
            Inbound::Known(ServerMsg::Restart) => Applied::Restart,
            Inbound::Known(ServerMsg::Play) => {
                self.controls = ControlState::running();
                Applied::Controls(self.controls)
            }
            Inbound::Known(ServerMsg::Pause) => {
                self.controls = ControlState::paused();
                Applied::Controls(self.controls)
            }
            Inbound::Known(ServerMsg::Step { data }) => Applied::Appended(self.series.push(data)),
            Inbound::Unknown(action) => Applied::Ignored(action),
        };
        Ok(applied)
    }

    /// Transport error. Only produces the alert; series and flags are left alone.
    pub fn on_error(&mut self, detail: Option<&str>) -> Alert {
        Alert {
            message: format!("WebSocket error: {}", detail.unwrap_or("undefined")),
        }
    }

    pub fn on_close(&mut self) {
        self.open = false;
        self.sink = None;
    }

    /// Fire-and-forget: one literal text frame per click, whatever the button flags say.
    pub fn click(&self, cmd: Command) -> Result<(), SendError> {
        let sink = self.sink.as_ref().ok_or(SendError::NotConnected)?;
        sink.send_text(cmd.as_str())
    }

    pub fn series(&self) -> &SeriesBuffer {
        &self.series
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    pub fn run_state(&self) -> RunState {
        self.controls.run_state()
    }

    pub fn is_connected(&self) -> bool {
        self.sink.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl CommandSink for RecordingSink {
        fn send_text(&self, text: &str) -> Result<(), SendError> {
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn connected() -> (DashboardController<RecordingSink>, Rc<RefCell<Vec<String>>>) {
        let sink = RecordingSink::default();
        let sent = sink.sent.clone();
        let mut c = DashboardController::new();
        c.attach(sink);
        c.on_open();
        (c, sent)
    }

    #[test]
    fn step_frames_build_the_series_in_order() {
        let (mut c, _) = connected();
        let values = [12.0, 40.0, 3.0, 3.0, 77.5];
        for v in values {
            let applied = c
                .on_message(&format!(r#"{{"action":"step","data":{v}}}"#))
                .unwrap();
            assert!(matches!(applied, Applied::Appended(_)));
        }

        let got: Vec<(u64, f64)> = c.series().points().iter().map(|p| (p.index, p.value)).collect();
        let want: Vec<(u64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u64, *v))
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn play_is_idempotent_from_any_state() {
        for prior in [r#"{"action":"pause"}"#, r#"{"action":"play"}"#, r#"{"action":"restart"}"#] {
            let (mut c, _) = connected();
            c.on_message(prior).unwrap();
            c.on_message(r#"{"action":"play"}"#).unwrap();
            c.on_message(r#"{"action":"play"}"#).unwrap();

            let flags = c.controls();
            assert!(!flags.play);
            assert!(flags.pause);
            assert!(!flags.step);
            assert_eq!(c.run_state(), RunState::Running);
        }
    }

    #[test]
    fn pause_enables_play_and_step() {
        for prior in [r#"{"action":"play"}"#, r#"{"action":"pause"}"#] {
            let (mut c, _) = connected();
            c.on_message(prior).unwrap();
            let applied = c.on_message(r#"{"action":"pause"}"#).unwrap();

            assert_eq!(applied, Applied::Controls(ControlState::paused()));
            let flags = c.controls();
            assert!(flags.play);
            assert!(!flags.pause);
            assert!(flags.step);
        }
    }

    #[test]
    fn restart_changes_nothing() {
        let (mut c, _) = connected();
        c.on_message(r#"{"action":"play"}"#).unwrap();
        c.on_message(r#"{"action":"step","data":5}"#).unwrap();
        let before = (c.series().clone(), c.controls());

        assert_eq!(c.on_message(r#"{"action":"restart"}"#).unwrap(), Applied::Restart);
        assert_eq!((c.series().clone(), c.controls()), before);
    }

    #[test]
    fn unknown_and_malformed_frames_leave_state_alone() {
        let (mut c, _) = connected();
        c.on_message(r#"{"action":"step","data":1}"#).unwrap();
        c.on_message(r#"{"action":"pause"}"#).unwrap();
        let before = (c.series().clone(), c.controls());

        assert_eq!(
            c.on_message(r#"{"action":"solve","data":2}"#).unwrap(),
            Applied::Ignored("solve".to_string())
        );
        assert!(c.on_message("{ action: 'restart' }").is_err());
        assert!(c.on_message(r#"{"action":"step"}"#).is_err());
        assert!(c.on_message("").is_err());

        assert_eq!((c.series().clone(), c.controls()), before);
    }

    #[test]
    fn each_click_sends_exactly_one_literal_frame() {
        for cmd in Command::ALL {
            let (c, sent) = connected();
            c.click(cmd).unwrap();
            assert_eq!(*sent.borrow(), vec![cmd.as_str().to_string()]);
        }
    }

    #[test]
    fn clicks_ignore_the_visual_flags() {
        let (mut c, sent) = connected();
        c.on_message(r#"{"action":"play"}"#).unwrap();
        c.click(Command::Play).unwrap();
        c.click(Command::Step).unwrap();
        assert_eq!(*sent.borrow(), vec!["play".to_string(), "step".to_string()]);
    }

    #[test]
    fn click_without_socket_is_an_error() {
        let c: DashboardController<RecordingSink> = DashboardController::new();
        assert_eq!(c.click(Command::Step), Err(SendError::NotConnected));
    }

    #[test]
    fn transport_error_yields_one_alert_and_no_state_change() {
        let (mut c, sent) = connected();
        c.on_message(r#"{"action":"step","data":9}"#).unwrap();
        c.on_message(r#"{"action":"play"}"#).unwrap();
        let before = (c.series().clone(), c.controls());

        let alert = c.on_error(None);
        assert_eq!(alert.message, "WebSocket error: undefined");
        assert_eq!(
            c.on_error(Some("connection refused")).message,
            "WebSocket error: connection refused"
        );

        assert_eq!((c.series().clone(), c.controls()), before);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn close_detaches_without_touching_the_plot() {
        let (mut c, _) = connected();
        c.on_message(r#"{"action":"step","data":3}"#).unwrap();
        c.on_close();

        assert!(!c.is_connected());
        assert!(!c.is_open());
        assert_eq!(c.series().len(), 1);
        assert_eq!(c.click(Command::Play), Err(SendError::NotConnected));
    }
}
