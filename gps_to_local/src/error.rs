use std::{fmt, io, path::PathBuf};

/// Error that possible during sentence decoding
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Not starting with `$`, not ASCII, or too short to carry a sentence type
    MalformedSentence,
    TooLong {
        len: usize,
    },
    InvalidChecksum {
        expect: u8,
        got: u8,
    },
    InvalidField {
        sentence: &'static str,
        field: &'static str,
    },
    UnsupportedSentence(String),
    /// The receiver reported no position fix
    NoFix,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedSentence => f.write_str("Malformed NMEA sentence"),
            DecodeError::TooLong { len } => {
                write!(f, "NMEA sentence too long: {} bytes", len)
            },
            DecodeError::InvalidChecksum { expect, got } => write!(
                f,
                "Not valid sentence's checksum, expect {:02X}, got {:02X}",
                expect, got
            ),
            DecodeError::InvalidField { sentence, field } => {
                write!(f, "Invalid field {} of sentence {}", field, sentence)
            },
            DecodeError::UnsupportedSentence(kind) => {
                write!(f, "Unsupported sentence type {}", kind)
            },
            DecodeError::NoFix => f.write_str("No position fix"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A transform between two frames could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    UnknownFrame(String),
    /// A live frame on the path has not received any update yet
    NoData(String),
    Stale {
        frame: String,
        age_us: i64,
    },
    /// An update carried a rotation that is not a usable quaternion
    InvalidTransform(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::UnknownFrame(frame) => write!(f, "Unknown frame '{}'", frame),
            FrameError::NoData(frame) => {
                write!(f, "No transform received yet for frame '{}'", frame)
            },
            FrameError::Stale { frame, age_us } => write!(
                f,
                "Transform of frame '{}' is stale ({} us old)",
                frame, age_us
            ),
            FrameError::InvalidTransform(frame) => {
                write!(f, "Invalid transform received for frame '{}'", frame)
            },
        }
    }
}

impl std::error::Error for FrameError {}

/// The configured frame tree is not usable
#[derive(Debug, Clone, PartialEq)]
pub enum FrameConfigError {
    /// A frame the pipeline works with is not part of the tree
    MissingFrame(String),
    MissingParent(String),
    UnknownParent { frame: String, parent: String },
    Cycle(String),
    InvalidRotation(String),
    /// More than one frame follows the same update channel
    SharedChannel(String),
}

impl fmt::Display for FrameConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameConfigError::MissingFrame(frame) => {
                write!(f, "Frame '{}' is not configured", frame)
            },
            FrameConfigError::MissingParent(frame) => {
                write!(f, "Frame '{}' has no 'relative_to'", frame)
            },
            FrameConfigError::UnknownParent { frame, parent } => write!(
                f,
                "Frame '{}' is relative to undefined frame '{}'",
                frame, parent
            ),
            FrameConfigError::Cycle(frame) => {
                write!(f, "Frame '{}' is part of a cycle", frame)
            },
            FrameConfigError::InvalidRotation(frame) => write!(
                f,
                "Frame '{}' has an invalid initial rotation, expected 'rpy' or a non-zero 'quat'",
                frame
            ),
            FrameConfigError::SharedChannel(channel) => {
                write!(f, "Channel '{}' updates more than one frame", channel)
            },
        }
    }
}

impl std::error::Error for FrameConfigError {}

#[derive(Debug)]
pub enum TransportError {
    Io(io::Error),
    Json(serde_json::Error),
    UnknownChannel(String),
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Json(error)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "Transport I/O error: {}", e),
            TransportError::Json(e) => write!(f, "Invalid message encoding: {}", e),
            TransportError::UnknownChannel(channel) => {
                write!(f, "Unknown channel '{}'", channel)
            },
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Json(e) => Some(e),
            TransportError::UnknownChannel(_) => None,
        }
    }
}

/// Fatal conditions detected while initializing, before any fix is served
#[derive(Debug)]
pub enum StartupError {
    ConfigUnavailable {
        path: PathBuf,
        source: io::Error,
    },
    ConfigInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    FrameSystem(FrameConfigError),
    MountingOffset {
        from: String,
        to: String,
        source: FrameError,
    },
    Transport(TransportError),
    /// Rebroadcast rate that does not give a usable period [Hz]
    InvalidRate(f64),
}

impl From<FrameConfigError> for StartupError {
    fn from(error: FrameConfigError) -> Self {
        StartupError::FrameSystem(error)
    }
}

impl From<TransportError> for StartupError {
    fn from(error: TransportError) -> Self {
        StartupError::Transport(error)
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::ConfigUnavailable { path, .. } => {
                write!(f, "Error reading configuration {}", path.display())
            },
            StartupError::ConfigInvalid { path, .. } => {
                write!(f, "Error parsing configuration {}", path.display())
            },
            StartupError::FrameSystem(e) => write!(f, "Error getting frames: {}", e),
            StartupError::MountingOffset { from, to, .. } => write!(
                f,
                "Error getting transformation from {} to {}",
                from, to
            ),
            StartupError::Transport(e) => write!(f, "Error getting transport: {}", e),
            StartupError::InvalidRate(hz) => {
                write!(f, "Invalid global-to-local publish rate {} Hz", hz)
            },
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::ConfigUnavailable { source, .. } => Some(source),
            StartupError::ConfigInvalid { source, .. } => Some(source),
            StartupError::FrameSystem(e) => Some(e),
            StartupError::MountingOffset { source, .. } => Some(source),
            StartupError::Transport(e) => Some(e),
            StartupError::InvalidRate(_) => None,
        }
    }
}
