use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_CNF_PATH: &str = "./data/pigeonhole-7-6.cnf";
const DEFAULT_STATIC_DIR: &str = "./frontend/dist/public";
const DEFAULT_TICK_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// DIMACS file reloaded on every restart. Plain or gzip.
    pub cnf_path: PathBuf,
    pub static_dir: PathBuf,
    /// Delay between solver steps while playing.
    pub tick: Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_raw = get("SATVIEW_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("SATVIEW_BIND is not a socket address: {bind_raw:?}"))?;

        let tick_ms = match get("SATVIEW_TICK_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("SATVIEW_TICK_MS is not a number: {raw:?}"))?,
            None => DEFAULT_TICK_MS,
        }
        .clamp(1, 1_000);

        Ok(Self {
            bind,
            cnf_path: get("SATVIEW_CNF")
                .unwrap_or_else(|| DEFAULT_CNF_PATH.to_string())
                .into(),
            static_dir: get("SATVIEW_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
            tick: Duration::from_millis(tick_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind.port(), satview_shared::DEFAULT_PORT);
        assert_eq!(cfg.cnf_path, PathBuf::from(DEFAULT_CNF_PATH));
        assert_eq!(cfg.tick, Duration::from_millis(50));
    }

    #[test]
    fn overrides_and_clamps() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("SATVIEW_BIND", "127.0.0.1:9100"),
            ("SATVIEW_TICK_MS", "0"),
            ("SATVIEW_CNF", "/tmp/x.cnf.gz"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind.port(), 9100);
        assert_eq!(cfg.tick, Duration::from_millis(1));
        assert_eq!(cfg.cnf_path, PathBuf::from("/tmp/x.cnf.gz"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(ServerConfig::from_lookup(lookup(&[("SATVIEW_BIND", "localhost")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("SATVIEW_TICK_MS", "fast")])).is_err());
    }
}
