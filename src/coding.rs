// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Encode/Decode traits for the on-disk cluster format, mirroring
// lsm-tree's `coding.rs`: a small trait pair instead of pulling in a
// general-purpose serialization framework for a format this fixed.

use std::io::{Read, Write};

/// Error during serialization of a cluster.
#[derive(Debug)]
pub enum EncodeError {
    /// I/O error writing to the destination.
    Io(std::io::Error),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "EncodeError({e})"),
        }
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
        }
    }
}

/// Error during deserialization of a cluster.
#[derive(Debug)]
pub enum DecodeError {
    /// I/O error reading from the source.
    Io(std::io::Error),
    /// Fewer bytes were available than a fixed-size cluster requires.
    ShortRead { expected: usize, got: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "DecodeError({e})"),
            Self::ShortRead { expected, got } => {
                write!(f, "short read: expected {expected} bytes, got {got}")
            }
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ShortRead { .. } => None,
        }
    }
}

/// Trait for types with a fixed-size, byte-exact on-disk representation.
pub trait Encode {
    /// Serializes into a writer.
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError>;
}

/// Trait for types that can be read back from their on-disk representation.
pub trait Decode {
    /// Deserializes from a reader.
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError>
    where
        Self: Sized;
}
