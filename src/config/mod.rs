//! Configuration management for hunt.
//!
//! Provides XDG-compliant storage of scan settings.

mod settings;

pub use settings::{BannerPattern, Paths, ScanSettings};
