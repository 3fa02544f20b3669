//! Log severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity, most severe first.
///
/// The numeric order is fixed: `fatal=0 .. telemetry=6`. `Ord` follows
/// declaration order, so `Fatal < Telemetry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
    Telemetry,
}

impl Level {
    /// Lowercase name, as used on the wire and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Verbose => "verbose",
            Level::Telemetry => "telemetry",
        }
    }

    /// True when a sink configured at threshold `self` should emit `level`.
    ///
    /// A threshold admits its own level and everything more severe. The
    /// default threshold is [`Level::Telemetry`], which admits everything.
    pub fn admits(&self, level: Level) -> bool {
        level <= *self
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized level names.
#[derive(Debug, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "verbose" => Ok(Level::Verbose),
            "telemetry" => Ok(Level::Telemetry),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}
