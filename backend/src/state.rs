use satview_shared::{Command, ServerMsg};
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    /// Commands from dashboards → solver task (restart, play, pause, step)
    pub cmd_tx: mpsc::Sender<Command>,

    /// Solver frames → every connected dashboard
    pub ws_tx: broadcast::Sender<ServerMsg>,

    /// Built dashboard (index.html, wasm bundle, css)
    pub static_dir: PathBuf,
}
