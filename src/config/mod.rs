//! Configuration module
//!
//! Italo has a single configuration file: the secrets descriptor holding
//! the HALO client credentials (secrets.rs).

pub mod secrets;

pub use secrets::Secrets;
