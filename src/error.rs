use thiserror::Error;

use crate::roster::PlayerId;
use crate::rotation::LINE_SIZE;

/// Errors surfaced to the caller of the line engine.
///
/// Every variant is recoverable: the operation that produced it has left the
/// roster, history and rotation state exactly as they were.
#[derive(Error, Debug)]
pub enum LineCallerError {
    #[error("line already has {LINE_SIZE} players")]
    LineFull,

    #[error("player {0} is not in the current line")]
    NotInLine(PlayerId),

    #[error("player {0} cannot be put on the line")]
    NotEligible(PlayerId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("invalid player: {0}")]
    InvalidPlayer(String),

    #[error("malformed import: {0}")]
    MalformedImport(String),

    #[error("unsupported schema version {0}")]
    UnsupportedSchemaVersion(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LineCallerError>;
