use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    EmptyId(&'static str),
    VolumeOutOfRange(i64),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::EmptyId(kind) => write!(f, "{kind} cannot be empty"),
            ModelError::VolumeOutOfRange(level) => {
                write!(f, "volume {level} is outside 0-100")
            }
        }
    }
}

impl std::error::Error for ModelError {}
