use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("room identifier must not be empty")]
    EmptyRoom,

    #[error("signal carries neither a description nor a candidate")]
    EmptySignal,

    #[error("signal carries both a description and a candidate")]
    AmbiguousSignal,
}
