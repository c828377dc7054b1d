//! Manifest configuration: the declarative TOML description of desired
//! applications.
mod manifest;

pub use manifest::{Manifest, ManifestApp};
