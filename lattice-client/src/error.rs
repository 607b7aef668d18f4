use lattice_core::protocol::{ErrorCode, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The compositor posted a fatal error; the connection is closed.
    #[error("Protocol error on object {object}: {code:?}: {message}")]
    Protocol {
        object: ObjectId,
        code: ErrorCode,
        message: String,
    },
    #[error("Connection to the compositor is closed")]
    Disconnected,
}
