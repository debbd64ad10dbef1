//! Error related data structures to be shared and used.
//!
//! This module contains the [`Error`] enum, which is used to represent
//! errors that can occur within the Monoboy domain.

use std::{
    fmt::{self, Display, Formatter},
    io,
};

/// Top level enum for error handling within Monoboy.
///
/// Most of the time, you will want to use the `CustomError` variant
/// to provide a more detailed error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    RomSize,
    RomType,
    InvalidOpcode(u16, u8),
    InvalidParameter(String),
    IoError(String),
    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::RomSize => String::from("Invalid ROM size"),
            Error::RomType => String::from("Unsupported ROM type"),
            Error::InvalidOpcode(pc, opcode) => {
                format!("Invalid opcode 0x{:02x} at 0x{:04x}", opcode, pc)
            }
            Error::InvalidParameter(message) => format!("Invalid parameter: {}", message),
            Error::IoError(message) => format!("I/O error: {}", message),
            Error::CustomError(message) => String::from(message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_description() {
        assert_eq!(Error::RomSize.description(), "Invalid ROM size");
        assert_eq!(
            Error::InvalidOpcode(0x0100, 0xd3).description(),
            "Invalid opcode 0xd3 at 0x0100"
        );
        assert_eq!(
            Error::CustomError(String::from("problem")).description(),
            "problem"
        );
    }

    #[test]
    fn test_from_io_error() {
        let error: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(error, Error::IoError(String::from("missing")));
    }
}
