//! Session descriptors: what to connect to, independent of any running process.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Separator between a session namespace and its label
pub const SESSION_ID_SEPARATOR: char = '/';

/// Unique, human-meaningful session identifier
///
/// Ids are built from a namespace and a label (`tree/web-01`), with a numeric
/// suffix appended by the registry when the label collides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Combines a namespace and a label into an id
    #[must_use]
    pub fn combine(namespace: &str, label: &str) -> Self {
        if namespace.is_empty() {
            Self(label.to_string())
        } else {
            Self(format!("{namespace}{SESSION_ID_SEPARATOR}{label}"))
        }
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id with a numeric disambiguator appended
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection protocol understood by the terminal program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Secure shell
    #[default]
    Ssh,
    /// Telnet
    Telnet,
    /// BSD rlogin
    Rlogin,
    /// Raw TCP socket
    Raw,
    /// Local serial line (host is the device, port the speed)
    Serial,
    /// Local shell through the terminal's cygterm bridge
    LocalShell,
}

impl Protocol {
    /// All protocols, in menu order
    pub const ALL: [Self; 6] = [
        Self::Ssh,
        Self::Telnet,
        Self::Rlogin,
        Self::Raw,
        Self::Serial,
        Self::LocalShell,
    ];

    /// Lowercase identifier used in config files and on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Telnet => "telnet",
            Self::Rlogin => "rlogin",
            Self::Raw => "raw",
            Self::Serial => "serial",
            Self::LocalShell => "localshell",
        }
    }

    /// Default port (baud rate for serial lines)
    #[must_use]
    pub const fn default_port(&self) -> u32 {
        match self {
            Self::Ssh => 22,
            Self::Telnet => 23,
            Self::Rlogin => 513,
            Self::Raw | Self::LocalShell => 0,
            Self::Serial => 9600,
        }
    }

    /// Whether the protocol talks to a network host
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Ssh | Self::Telnet | Self::Rlogin | Self::Raw)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssh => write!(f, "SSH"),
            Self::Telnet => write!(f, "Telnet"),
            Self::Rlogin => write!(f, "Rlogin"),
            Self::Raw => write!(f, "Raw"),
            Self::Serial => write!(f, "Serial"),
            Self::LocalShell => write!(f, "Local shell"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "telnet" => Ok(Self::Telnet),
            "rlogin" => Ok(Self::Rlogin),
            "raw" => Ok(Self::Raw),
            "serial" => Ok(Self::Serial),
            "localshell" | "local" | "cygterm" => Ok(Self::LocalShell),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

/// Login credentials; the password never leaves memory through serde
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password, only ever supplied at runtime
    #[serde(skip)]
    pub password: Option<SecretString>,
}

impl Credentials {
    /// Credentials with only a username
    #[must_use]
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: None,
        }
    }

    /// Adds a password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }
}

/// Connection definition for one terminal session
///
/// Descriptors are shared read-only (`Arc`) once a session is running;
/// changing connection parameters means registering a new descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Registry-assigned id; empty until registered
    #[serde(default)]
    pub id: SessionId,
    /// Display name (panel title)
    pub name: String,
    /// Host name, serial device, or shell command
    pub host: String,
    /// Port, or line speed for serial sessions
    #[serde(default)]
    pub port: u32,
    /// Protocol
    #[serde(default)]
    pub protocol: Protocol,
    /// Login credentials
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Name of a saved terminal configuration to load first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_config: Option<String>,
}

impl Default for SessionId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl SessionDescriptor {
    /// Creates a descriptor using the protocol's default port
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            id: SessionId::default(),
            name: name.into(),
            host: host.into(),
            port: protocol.default_port(),
            protocol,
            credentials: Credentials::default(),
            saved_config: None,
        }
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    /// Sets the credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the saved configuration reference
    #[must_use]
    pub fn with_saved_config(mut self, name: impl Into<String>) -> Self {
        self.saved_config = Some(name.into());
        self
    }

    /// Title shown on the session's panel
    #[must_use]
    pub fn title(&self) -> &str {
        if self.name.is_empty() {
            &self.host
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_builds_namespaced_id() {
        assert_eq!(SessionId::combine("tree", "web").as_str(), "tree/web");
        assert_eq!(SessionId::combine("", "web").as_str(), "web");
        assert_eq!(
            SessionId::combine("ConnectBar", "db").with_suffix(2).as_str(),
            "ConnectBar/db-2"
        );
    }

    #[test]
    fn protocol_parse_and_ports() {
        assert_eq!("SSH".parse::<Protocol>(), Ok(Protocol::Ssh));
        assert_eq!("cygterm".parse::<Protocol>(), Ok(Protocol::LocalShell));
        assert!("rdp".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Rlogin.default_port(), 513);
        assert_eq!(Protocol::Serial.default_port(), 9600);
        for protocol in Protocol::ALL {
            assert_eq!(protocol.as_str().parse::<Protocol>(), Ok(protocol));
        }
    }

    #[test]
    fn password_is_not_serialized() {
        let descriptor = SessionDescriptor::new("web", "web.example.com", Protocol::Ssh)
            .with_credentials(Credentials::user("ops").with_password("hunter2"));
        let toml = toml::to_string(&descriptor).unwrap();
        assert!(toml.contains("ops"));
        assert!(!toml.contains("hunter2"));
    }

    #[test]
    fn title_falls_back_to_host() {
        let descriptor = SessionDescriptor::new("", "10.0.0.1", Protocol::Telnet);
        assert_eq!(descriptor.title(), "10.0.0.1");
        assert_eq!(descriptor.port, 23);
    }
}
