//! # Connection lifecycle states.

/// Lifecycle state of a resilient broker connection.
///
/// ```text
/// Disconnected ──► Connecting ──► Connected
///      ▲               │              │ (fault signal)
///      └───────────────┴──────────────┘
///                      │
///                  Disposed (terminal, from any state)
/// ```
///
/// `Disposed` is terminal: no further transition is permitted once entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No live connection; `try_connect` may be attempted.
    Disconnected = 0,
    /// A `try_connect` attempt is in progress.
    Connecting = 1,
    /// The underlying connection is established.
    Connected = 2,
    /// The connection owner disposed it; terminal.
    Disposed = 3,
}

impl ConnectionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disposed,
        }
    }

    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disposed => "disposed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_roundtrip() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Disposed,
        ] {
            assert_eq!(ConnectionState::from_u8(state as u8), state);
        }
    }
}
