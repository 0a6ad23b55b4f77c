//! Transports and connection parameters.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The mechanism used to reach the database server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// TCP/IP, also over loopback.
    Tcp,
    /// A Unix domain socket.
    Socket,
    /// A Windows named pipe.
    NamedPipe,
    /// Windows shared memory.
    SharedMemory,
}

impl Transport {
    /// All transports, in the order they are benchmarked by default.
    pub const ALL: [Transport; 4] = [
        Transport::Tcp,
        Transport::SharedMemory,
        Transport::NamedPipe,
        Transport::Socket,
    ];
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::Tcp => "TCP",
            Transport::Socket => "Socket",
            Transport::NamedPipe => "Named Pipe",
            Transport::SharedMemory => "Shared Memory",
        })
    }
}

/// Where and as whom to connect, independent of the transport.
#[derive(Debug)]
pub struct ConnectTarget {
    /// Host name or IP address for TCP connections.
    pub host: Option<String>,
    /// Port for TCP connections.
    pub port: Option<u16>,
    /// Path of the Unix socket, or name of the named pipe.
    pub socket: Option<String>,
    /// User name.
    pub user: String,
    /// Password of `user`.
    pub password: SecretString,
    /// Default database, if any.
    pub database: Option<String>,
}

impl ConnectTarget {
    /// Creates a target for `user` with all other settings left to the backend's defaults.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: None,
            port: None,
            socket: None,
            user: user.into(),
            password: SecretString::from(password.into()),
            database: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn password_is_redacted() {
        let target = ConnectTarget::new("root", "hunter2");

        assert_eq!(target.password.expose_secret(), "hunter2");
        assert!(!format!("{target:?}").contains("hunter2"));
    }

    #[test]
    fn display_names() {
        let names: Vec<_> = Transport::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["TCP", "Shared Memory", "Named Pipe", "Socket"]);
    }
}
