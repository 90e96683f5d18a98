//! AMD Zen4 (Family 19h Genoa) register definitions
//!
//! ## Blocks
//!
//! - **DF** (Data Fabric) - fabric topology, indirect access, PIE RAS
//! - **CCX** (Core Complex) - per-core MSR defaults and AP sync list
//!
//! ## References
//!
//! - Processor Programming Reference (PPR) for AMD Family 19h Model 11h

pub mod ccx;
pub mod df;
