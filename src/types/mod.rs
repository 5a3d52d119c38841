//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod address;
mod port;
mod target;

pub use address::TransportAddress;
pub use port::{Port, PortError, PortRange, PortSpec};
pub use target::{reverse_lookup, ScanTarget, TargetError, TargetSpec};
