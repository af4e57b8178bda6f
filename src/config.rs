//! Bot configuration loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server hostname.
    pub server: String,
    /// Server port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect over TLS.
    #[serde(default)]
    pub secure: bool,
    /// Desired nick.
    pub nick: String,
    /// Optional authentication block.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Character that triggers command parsing in channels (default: `,`).
    #[serde(default = "default_command_char")]
    pub command_char: char,
    /// Nicks whose chat messages are dropped before any hook runs.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Nicks allowed to use operator-level commands.
    #[serde(default)]
    pub ops: Vec<String>,
    /// Channels to join after registration.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Liveness timeout in seconds (default: 300). A peer silent for
    /// longer than this is considered dead.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    /// Maximum reconnect attempts before giving up (default: 10).
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Message sent with QUIT on deliberate shutdown.
    #[serde(default)]
    pub quit_msg: String,
    /// Cap on concurrently executing dispatch tasks (default: 64).
    /// The read loop waits for a free slot rather than spawning unboundedly.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// When true, registering a command whose name or alias collides with
    /// an existing one is a startup error instead of being resolved by
    /// registration order.
    #[serde(default)]
    pub strict_commands: bool,
}

/// Authentication block.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Authentication mechanism.
    #[serde(rename = "type")]
    pub kind: AuthKind,
    /// Account name.
    pub user: String,
    /// Account password.
    pub pass: String,
}

/// Supported authentication mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// SASL PLAIN during capability negotiation.
    Sasl,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::Invalid("server must not be empty".into()));
        }
        if self.nick.is_empty() {
            return Err(ConfigError::Invalid("nick must not be empty".into()));
        }
        if self.ping_timeout == 0 {
            return Err(ConfigError::Invalid("ping_timeout must be positive".into()));
        }
        Ok(())
    }

    /// Whether a nick is on the operator list (case-insensitive).
    pub fn is_operator(&self, nick: &str) -> bool {
        self.ops.iter().any(|op| op.eq_ignore_ascii_case(nick))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            secure: false,
            nick: "basalt".to_string(),
            auth: None,
            command_char: default_command_char(),
            ignore: Vec::new(),
            ops: Vec::new(),
            channels: Vec::new(),
            ping_timeout: default_ping_timeout(),
            retries: default_retries(),
            quit_msg: String::new(),
            max_in_flight: default_max_in_flight(),
            strict_commands: false,
        }
    }
}

fn default_port() -> u16 {
    6667
}

fn default_command_char() -> char {
    ','
}

fn default_ping_timeout() -> u64 {
    300
}

fn default_retries() -> u32 {
    10
}

fn default_max_in_flight() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            server = "irc.example.net"
            nick = "basalt"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 6667);
        assert_eq!(config.command_char, ',');
        assert_eq!(config.ping_timeout, 300);
        assert_eq!(config.retries, 10);
        assert!(!config.secure);
        assert!(config.auth.is_none());
        assert!(config.ignore.is_empty());
        assert!(!config.strict_commands);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r##"
            server = "irc.example.net"
            port = 6697
            secure = true
            nick = "basalt"
            command_char = "!"
            ignore = ["spammer"]
            ops = ["Admin"]
            channels = ["#basalt", "#test"]
            ping_timeout = 60
            retries = 3
            quit_msg = "bye"

            [auth]
            type = "sasl"
            user = "basalt"
            pass = "hunter2"
            "##,
        )
        .unwrap();
        assert!(config.secure);
        assert_eq!(config.command_char, '!');
        assert_eq!(config.channels, vec!["#basalt", "#test"]);
        let auth = config.auth.unwrap();
        assert_eq!(auth.kind, AuthKind::Sasl);
        assert_eq!(auth.pass, "hunter2");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = \"irc.example.net\"\nnick = \"basalt\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server, "irc.example.net");
    }

    #[test]
    fn test_missing_nick_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("server = \"irc.example.net\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_server_fails_validation() {
        let config = Config {
            server: String::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_is_operator_case_insensitive() {
        let config = Config {
            ops: vec!["Admin".to_string()],
            ..Config::default()
        };
        assert!(config.is_operator("admin"));
        assert!(!config.is_operator("nobody"));
    }
}
