use crate::definitions::Address;
use std::error;
use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MemoryError {
    OutOfRange(Address),
    CapacityMismatch { expected: usize, actual: usize },
    Poisoned,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutOfRange(a) => write!(f, "Illegal memory address: {}", a),
            Self::CapacityMismatch { expected, actual } => write!(
                f,
                "Memory image has {} words, but the memory holds {}",
                actual, expected
            ),
            Self::Poisoned => write!(f, "Memory lock was poisoned by a panicking thread"),
        }
    }
}

impl error::Error for MemoryError {}
