use crate::protocol::Command;

/// What the dashboard looks like it is doing. Derived from the button flags, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Enabled flags for the four command buttons (`true` = enabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub restart: bool,
    pub play: bool,
    pub pause: bool,
    pub step: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            restart: true,
            play: true,
            pause: true,
            step: true,
        }
    }
}

impl ControlState {
    /// After a `play` frame: only pause (and restart) stay clickable-looking.
    pub fn running() -> Self {
        Self {
            restart: true,
            play: false,
            pause: true,
            step: false,
        }
    }

    /// After a `pause` frame.
    pub fn paused() -> Self {
        Self {
            restart: true,
            play: true,
            pause: false,
            step: true,
        }
    }

    pub fn is_enabled(&self, cmd: Command) -> bool {
        match cmd {
            Command::Restart => self.restart,
            Command::Play => self.play,
            Command::Pause => self.pause,
            Command::Step => self.step,
        }
    }

    pub fn run_state(&self) -> RunState {
        if *self == Self::running() {
            RunState::Running
        } else if *self == Self::paused() {
            RunState::Paused
        } else {
            RunState::Idle
        }
    }
}
