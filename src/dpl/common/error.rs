use std::fmt;

use thiserror::Error;

/// Opaque status code returned by the native libraries. Zero is success,
/// everything else is vendor-defined and passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum DplError {
    #[error("Failed to load native library {name}: {source}")]
    LibraryLoad {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol {name} not found in native library: {source}")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("{call} failed ({code})")]
    Native { call: &'static str, code: StatusCode },

    #[error("{call} failed ({code})")]
    Utility { call: &'static str, code: i32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Not available: {0}")]
    NotInitialized(&'static str),

    #[error("Invalid playback file header: {0}")]
    InvalidFileHeader(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DplError>;

/// Turns a DPL status into a `Result`, logging failures with their hex code.
pub(crate) fn check(call: &'static str, code: u32) -> Result<()> {
    let code = StatusCode(code);
    if code.is_ok() {
        Ok(())
    } else {
        tracing::error!(call, %code, "native call failed");
        Err(DplError::Native { call, code })
    }
}

/// Utility-library flavour of [`check`]; that library reports signed codes.
pub(crate) fn check_utility(call: &'static str, code: i32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        tracing::error!(call, code, "utility call failed");
        Err(DplError::Utility { call, code })
    }
}
