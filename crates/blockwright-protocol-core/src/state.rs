/// The state of a Minecraft protocol connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Status,
    Login,
    Configuration,
    Play,
    /// Socket closed or a fatal protocol error occurred. Terminal; no further
    /// transitions are legal from here.
    Closed,
}

impl ConnectionState {
    pub fn from_handshake_next(next: i32) -> Option<Self> {
        match next {
            1 => Some(ConnectionState::Status),
            2 => Some(ConnectionState::Login),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_next_maps_known_values() {
        assert_eq!(ConnectionState::from_handshake_next(1), Some(ConnectionState::Status));
        assert_eq!(ConnectionState::from_handshake_next(2), Some(ConnectionState::Login));
        assert_eq!(ConnectionState::from_handshake_next(3), None);
    }

    #[test]
    fn closed_is_terminal_and_distinct() {
        assert_ne!(ConnectionState::Closed, ConnectionState::Play);
    }
}
