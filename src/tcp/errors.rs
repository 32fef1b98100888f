use thiserror::Error;
use crate::packet::errors::HeaderError;
use crate::tcp::state::{TCPEvent, TCPState};
use crate::tcp::wrap32::Wrap32;

#[derive(Error, Debug)]
pub enum TcpError {
    #[error("Header error: {0}")]
    HeaderError(#[from] HeaderError), // Wrapper around HeaderError

    #[error("Invalid state: {event} not accepted in {state}")]
    InvalidState {
        state: TCPState,
        event: TCPEvent,
    },

    #[error("Invalid ACK number: {expected} != {got}")]
    InvalidAckNumber {
        expected: Wrap32,
        got: Wrap32,
    },

    #[error("Entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error), // Cannot pick an initial sequence number
}

impl TcpError {
    /// Only a missing entropy source is unrecoverable.
    /// Everything else means the offending frame or segment is dropped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TcpError::Entropy(_))
    }
}

// -- Unit tests --
