// frontend/src/dashboard/mod.rs
//
// The whole page: the step chart in #graph and the four control buttons. Socket events are fed
// into a `DashboardController` held in a signal; rendering reads the controller back out.

macro_rules! log {
    ($($t:tt)*) => {{
        let s = format!($($t)*);
        crate::dashboard::log(&s);
    }}
}

mod chart;
mod connection;

use dioxus::prelude::*;
use satview_shared::{
    Applied, Command, ControlState, DashboardController, RunState, DEFAULT_ENDPOINT,
};

use connection::WsSender;

pub type Controller = DashboardController<WsSender>;

#[component]
pub fn Dashboard() -> Element {
    let controller = use_signal(Controller::new);

    // one socket per page load
    use_hook(move || {
        spawn(async move {
            if let Err(e) = connection::connect(DEFAULT_ENDPOINT, controller).await {
                log!("[WS] {e}");
            }
        });
    });

    let click = move |cmd: Command| {
        if let Err(e) = controller.read().click(cmd) {
            log!("[UI] {cmd} not sent: {e}");
        }
    };

    let ctl = controller.read();
    let flags = ctl.controls();
    let status = status_text(
        ctl.is_connected(),
        ctl.is_open(),
        ctl.run_state(),
        ctl.series().len(),
    );

    rsx! {
        div { style: "max-width:1100px; margin:0 auto; padding:20px; display:flex; flex-direction:column; gap:8px;",
            div { style: "display:flex; justify-content:space-between; align-items:baseline;",
                h2 { style: "margin:0; font-weight:600;", "Solver trail per conflict" }
                span { style: "color:#94a3b8; font-size:12px;",
                    "{status}"
                }
            }

            div { id: "graph",
                {chart::series_chart(ctl.series(), 360.0)}
            }

            div { class: "controls",
                for cmd in Command::ALL {
                    button {
                        key: "{cmd}",
                        class: "{button_class(cmd, flags)}",
                        onclick: move |_| click(cmd),
                        "{button_label(cmd)}"
                    }
                }
            }
        }
    }
}

/// Header line: the socket first, then what the solver looks like it is doing.
fn status_text(connected: bool, open: bool, run: RunState, steps: usize) -> String {
    if !connected {
        return "not connected".to_string();
    }
    if !open {
        return "connecting".to_string();
    }
    let run = match run {
        RunState::Idle => "idle",
        RunState::Running => "running",
        RunState::Paused => "paused",
    };
    format!("{run} · {steps} steps")
}

/// `button <cmd>`, plus `disabled` when the flag is off. The flag is visual only.
fn button_class(cmd: Command, flags: ControlState) -> String {
    if flags.is_enabled(cmd) {
        format!("button {cmd}")
    } else {
        format!("button {cmd} disabled")
    }
}

fn button_label(cmd: Command) -> &'static str {
    match cmd {
        Command::Restart => "Restart",
        Command::Play => "Play",
        Command::Pause => "Pause",
        Command::Step => "Step",
    }
}

/// Feed one text frame to the controller. Bad frames are logged and dropped.
fn handle_frame(text: &str, mut controller: Signal<Controller>) {
    match controller.write().on_message(text) {
        Ok(Applied::Ignored(action)) => log!("[WS] ignoring action {action:?}"),
        Ok(_) => {}
        Err(e) => log!("[WS] bad frame {text:?}: {e}"),
    }
}

fn log(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&msg.into());

    #[cfg(not(target_arch = "wasm32"))]
    println!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_class_follows_flags() {
        let running = ControlState::running();
        assert_eq!(button_class(Command::Play, running), "button play disabled");
        assert_eq!(button_class(Command::Pause, running), "button pause");
        assert_eq!(button_class(Command::Step, running), "button step disabled");
        assert_eq!(button_class(Command::Restart, running), "button restart");

        let paused = ControlState::paused();
        assert_eq!(button_class(Command::Play, paused), "button play");
        assert_eq!(button_class(Command::Pause, paused), "button pause disabled");
        assert_eq!(button_class(Command::Step, paused), "button step");
    }

    #[test]
    fn status_shows_socket_then_run_state() {
        assert_eq!(status_text(false, false, RunState::Idle, 0), "not connected");
        assert_eq!(status_text(true, false, RunState::Idle, 0), "connecting");
        assert_eq!(status_text(true, true, RunState::Idle, 0), "idle · 0 steps");
        assert_eq!(
            status_text(true, true, ControlState::running().run_state(), 12),
            "running · 12 steps"
        );
        assert_eq!(
            status_text(true, true, ControlState::paused().run_state(), 12),
            "paused · 12 steps"
        );
    }

    #[test]
    fn everything_enabled_before_the_first_frame() {
        for cmd in Command::ALL {
            assert!(!button_class(cmd, ControlState::default()).contains("disabled"));
        }
    }
}
