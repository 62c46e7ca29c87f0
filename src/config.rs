//! Session configuration.
//!
//! The hosting glue hands the raw agent options string (everything after
//! `=` in `-agentpath:...=`) to [`SessionConfig::from_options`]. Options are
//! comma-separated `key=value` pairs:
//!
//! - `socket=<path>` — control socket path.
//! - `poll_ms=<millis>` — dispatcher connection-poll interval.
//! - `preload=<jar>:<entry.Class>` — jar to load right after attach.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SOCKET_NAME: &str = "classweave.sock";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Resolved configuration for one agent session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Well-known local address of the command channel.
    pub socket_path: PathBuf,
    /// How long the dispatcher blocks per connection poll. Bounds shutdown
    /// latency: the loop re-checks the running flag after each poll.
    pub poll_interval: Duration,
    /// Optional jar loaded immediately after attach.
    pub preload: Option<Preload>,
}

#[derive(Debug, Clone)]
pub struct Preload {
    pub path: PathBuf,
    pub entry_class: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            socket_path: default_socket_path(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            preload: None,
        }
    }
}

/// `$XDG_RUNTIME_DIR/classweave.sock`, falling back to `/tmp`.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(DEFAULT_SOCKET_NAME)
}

impl SessionConfig {
    /// Parse the agent options string. Unknown keys are ignored so newer
    /// controllers can pass options older agents don't know about.
    pub fn from_options(options: &str) -> Self {
        let mut config = SessionConfig::default();

        for pair in options.split(',').filter(|s| !s.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "socket" => config.socket_path = PathBuf::from(value),
                "poll_ms" => {
                    if let Ok(ms) = value.parse::<u64>() {
                        config.poll_interval = Duration::from_millis(ms);
                    }
                }
                "preload" => {
                    if let Some((jar, entry)) = value.rsplit_once(':') {
                        config.preload = Some(Preload {
                            path: PathBuf::from(jar),
                            entry_class: entry.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_give_defaults() {
        let config = SessionConfig::from_options("");
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(config.preload.is_none());
    }

    #[test]
    fn parses_all_keys() {
        let config = SessionConfig::from_options(
            "socket=/run/cw.sock,poll_ms=50,preload=/opt/patch.jar:com.example.Patch",
        );
        assert_eq!(config.socket_path, PathBuf::from("/run/cw.sock"));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        let preload = config.preload.expect("preload parsed");
        assert_eq!(preload.path, PathBuf::from("/opt/patch.jar"));
        assert_eq!(preload.entry_class, "com.example.Patch");
    }

    #[test]
    fn ignores_unknown_and_malformed_pairs() {
        let config = SessionConfig::from_options("verbose,color=auto,poll_ms=abc");
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
