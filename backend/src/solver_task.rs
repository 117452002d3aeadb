use crate::dimacs;
use crate::solver::Solver;
use crate::state::AppState;
use satview_shared::{Command, ServerMsg};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// The solver plus whether it is free-running.
struct SolverRun {
    solver: Solver,
    playing: bool,
    cnf_path: PathBuf,
    tx: broadcast::Sender<ServerMsg>,
}

impl SolverRun {
    fn new(cnf_path: PathBuf, tx: broadcast::Sender<ServerMsg>) -> Self {
        Self {
            solver: Solver::new(),
            playing: false,
            cnf_path,
            tx,
        }
    }

    fn broadcast(&self, msg: ServerMsg) {
        // no receivers is fine: nobody has the dashboard open
        let _ = self.tx.send(msg);
    }

    /// Reload the formula and start over.
    fn restart(&mut self) {
        let cnf = match dimacs::load_path(&self.cnf_path) {
            Ok(cnf) => cnf,
            Err(e) => {
                tracing::error!("restart failed: {e:#}");
                self.playing = false;
                self.broadcast(ServerMsg::Pause);
                return;
            }
        };

        let mut solver = Solver::from_cnf(&cnf);
        let ok = solver.simplify();
        tracing::info!(
            vars = solver.num_vars(),
            clauses = solver.num_clauses(),
            path = %self.cnf_path.display(),
            "solver restarted"
        );
        self.solver = solver;
        self.broadcast(ServerMsg::Restart);

        if !ok {
            tracing::warn!("formula is unsatisfiable at the top level; pausing");
            self.playing = false;
            self.broadcast(ServerMsg::Pause);
        }
    }

    /// One conflict. The trail size is reported before undoing all decisions.
    fn step(&mut self) -> bool {
        if !self.solver.step() {
            if self.solver.is_ok() {
                tracing::info!(learnts = self.solver.num_learnts(), "model found");
            } else {
                tracing::info!(learnts = self.solver.num_learnts(), "formula proven unsatisfiable");
            }
            return false;
        }

        let trail = self.solver.trail_size();
        self.broadcast(ServerMsg::Step { data: trail as f64 });
        self.solver.backtrack();
        true
    }

    fn handle(&mut self, cmd: Command) {
        tracing::debug!(%cmd, "command");
        match cmd {
            Command::Restart => self.restart(),
            Command::Play => {
                self.playing = true;
                self.broadcast(ServerMsg::Play);
            }
            Command::Pause => {
                self.playing = false;
                self.broadcast(ServerMsg::Pause);
            }
            Command::Step => {
                self.step();
            }
        }
    }
}

pub async fn solver_task(
    state: Arc<AppState>,
    cnf_path: PathBuf,
    tick: Duration,
    mut rx: mpsc::Receiver<Command>,
) {
    let mut run = SolverRun::new(cnf_path, state.ws_tx.clone());
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    run.restart();

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                run.handle(cmd);
            }
            _ = ticker.tick(), if run.playing => {
                if !run.step() {
                    run.restart();
                }
            }
        }
    }

    tracing::info!("command channel closed; solver task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_cnf(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("t.cnf");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn drain(rx: &mut broadcast::Receiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn play_pause_restart_are_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = broadcast::channel(64);
        let mut run = SolverRun::new(write_cnf(&dir, "p cnf 2 1\n1 2 0\n"), tx);

        run.handle(Command::Restart);
        run.handle(Command::Play);
        assert!(run.playing);
        run.handle(Command::Pause);
        assert!(!run.playing);

        assert_eq!(
            drain(&mut rx),
            vec![ServerMsg::Restart, ServerMsg::Play, ServerMsg::Pause]
        );
    }

    #[test]
    fn step_reports_trail_size_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = broadcast::channel(64);
        let body = "p cnf 3 8\n\
                    1 2 3 0\n1 2 -3 0\n1 -2 3 0\n1 -2 -3 0\n\
                    -1 2 3 0\n-1 2 -3 0\n-1 -2 3 0\n-1 -2 -3 0\n";
        let mut run = SolverRun::new(write_cnf(&dir, body), tx);
        run.restart();
        drain(&mut rx);

        run.handle(Command::Step);
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        let ServerMsg::Step { data } = frames[0] else {
            panic!("expected a step frame, got {frames:?}");
        };
        assert!(data >= 1.0);
        // the first learnt clause is binary, so nothing is fixed at level 0
        assert_eq!(run.solver.num_learnts(), 1);
        assert_eq!(run.solver.trail_size(), 0);
    }

    #[test]
    fn unsat_formula_pauses_on_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = broadcast::channel(64);
        let mut run = SolverRun::new(write_cnf(&dir, "p cnf 1 2\n1 0\n-1 0\n"), tx);
        run.playing = true;
        run.restart();

        assert!(!run.playing);
        assert_eq!(drain(&mut rx), vec![ServerMsg::Restart, ServerMsg::Pause]);
    }

    #[test]
    fn missing_file_pauses_dashboards() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = broadcast::channel(64);
        let mut run = SolverRun::new(dir.path().join("absent.cnf"), tx);
        run.playing = true;
        run.restart();

        assert!(!run.playing);
        assert_eq!(drain(&mut rx), vec![ServerMsg::Pause]);
    }
}
