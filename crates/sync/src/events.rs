use salon_core::RoomId;

/// Emitted once per room session when a room-scoped read answered with a 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLost {
    pub room: RoomId,
    /// Endpoint whose response revoked access.
    pub endpoint: &'static str,
    /// Page the client navigates to.
    pub redirect_to: String,
}

