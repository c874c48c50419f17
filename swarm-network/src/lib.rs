//! Swarm networking layer
//!
//! This crate provides the remote calls participants exchange, the transport
//! abstraction they are sent over, and the bootstrap join flow that grows a
//! quorum one sibling at a time.

pub mod error;
pub mod message;
pub mod participant;
pub mod transport;

pub use error::{NetworkError, NetworkResult};
pub use message::{procedures, RemoteCall};
pub use participant::Participant;
pub use transport::{Message, Transport, ZeroNetwork};
