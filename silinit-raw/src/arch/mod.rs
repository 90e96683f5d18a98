//! Generation-specific register definitions
//!
//! Each AMD silicon generation has different data fabric register offsets,
//! fabric node numbering and core MSR defaults. This module provides
//! generation-specific definitions organized by core family.
//!
//! ## Supported Generations
//!
//! - **Zen4** (`zen4` feature) - Family 19h Genoa/Bergamo/Siena, DF4
//! - Zen5 - Coming soon

#[cfg(feature = "zen4")]
pub mod zen4;
