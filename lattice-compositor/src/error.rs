use crate::client::ConnectionId;
use lattice_core::protocol::ProtocolError;

/// Errors returned to the code driving a [`crate::Display`].
///
/// Protocol errors are also posted to the offending connection before they
/// are returned here; the display itself stays usable in every case.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Protocol error on {connection}: {source}")]
    Protocol {
        connection: ConnectionId,
        #[source]
        source: ProtocolError,
    },
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),
    #[error("Unknown window: {0}")]
    UnknownWindow(lattice_core::protocol::WindowId),
    #[error("Window id space exhausted")]
    WindowIdsExhausted,
}
