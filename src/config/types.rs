//! Configuration types.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::blocks::{BlocksCommand, DEFAULT_PROGRAM};

/// Client configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksConfig {
    /// Invocation prefix placed before the blocks-mode arguments.
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    /// How long to wait after SIGTERM before killing the peer.
    #[serde(default = "default_terminate_timeout_ms")]
    pub terminate_timeout_ms: u64,
    /// Extra environment variables for the peer process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_command() -> Vec<String> {
    vec![DEFAULT_PROGRAM.to_string()]
}

fn default_terminate_timeout_ms() -> u64 {
    2000
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            terminate_timeout_ms: default_terminate_timeout_ms(),
            env: HashMap::new(),
        }
    }
}

impl BlocksConfig {
    /// Grace period for terminating the peer.
    #[must_use]
    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }

    /// Build the launch command described by this config.
    #[must_use]
    pub fn to_command(&self) -> BlocksCommand {
        self.env.iter().fold(
            BlocksCommand::with_prefix(self.command.iter().cloned()),
            |command, (key, value)| command.env(key, value),
        )
    }
}
