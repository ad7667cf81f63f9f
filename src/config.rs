// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::combat::CombatPolicy;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing room snapshot JSON files.
    pub rooms_dir: PathBuf,
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Stop after this many ticks. `None` runs until interrupted.
    pub max_ticks: Option<u64>,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    pub combat: CombatPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rooms_dir: PathBuf::from("data/rooms"),
            tick_interval: Duration::from_millis(500),
            max_ticks: None,
            seed: None,
            combat: CombatPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `ROOMS_DIR` - Path to room snapshots (default: `data/rooms`)
    /// - `TICK_MS` - Milliseconds per tick (default: 500)
    /// - `MAX_TICKS` - Stop after this many ticks (default: unlimited)
    /// - `AI_SEED` - RNG seed (default: entropy)
    /// - `PARRY_COUNTER` - Set to `true` to let parries strike back
    ///
    /// CLI flags take precedence: `--rooms <DIR>`, `--tick-ms <MS>`,
    /// `--max-ticks <N>`, `--seed <N>`, `--parry-counter`.
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let rooms_dir = Self::parse_cli_value(args, "--rooms")
            .or_else(|| env("ROOMS_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.rooms_dir);

        let tick_interval = Self::parse_cli_value(args, "--tick-ms")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("TICK_MS").and_then(|v| v.parse().ok()))
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let max_ticks = Self::parse_cli_value(args, "--max-ticks")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("MAX_TICKS").and_then(|v| v.parse().ok()));

        let seed = Self::parse_cli_value(args, "--seed")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("AI_SEED").and_then(|v| v.parse().ok()));

        let parry_counter = args.contains(&"--parry-counter".to_string())
            || env("PARRY_COUNTER")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false);

        Config {
            rooms_dir,
            tick_interval,
            max_ticks,
            seed,
            combat: CombatPolicy { parry_counter },
        }
    }

    /// Parse a CLI flag value like `--tick-ms 250`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
