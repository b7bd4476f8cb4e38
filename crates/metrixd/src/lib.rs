//! Top-level facade crate for metrixd.
//!
//! Re-exports core types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use metrixd_core::*;
}

pub mod exporter {
    pub use metrixd_exporter::*;
}
