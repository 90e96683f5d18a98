//! # silinit-raw
//!
//! Register definitions for AMD data fabric (DF) and core complex (CCX)
//! silicon initialization.
//!
//! This crate provides type-safe abstractions over fabric and MSR register
//! layouts, the generation-independent data fabric vocabulary (device types,
//! device maps, component locations) and per-generation constant tables.
//! It performs no I/O; register transport lives in `silinit`.
//!
//! ## Features
//!
//! Select the target silicon generation via feature flags:
//! - `zen4` (default) - Family 19h Genoa/Bergamo data fabric (DF4) and CCX definitions
//!
//! ## Usage
//!
//! ```ignore
//! use silinit_raw::current_arch::df;
//! use silinit_raw::{FabricInstance, RegisterLayout};
//!
//! let ficaa = df::FabricIndirectConfigAccessAddress::for_register(
//!     df::SYSTEM_CFG,
//!     FabricInstance::Instance(0x20),
//! );
//! let raw = ficaa.to_raw();
//! ```

pub mod arch;
pub mod ccx;
pub mod fabric;
pub mod register;

pub use fabric::{
    ComponentLocation, ComponentType, DeviceId, DeviceMap, FabricDeviceType, FabricError,
    FabricInstance, FABRIC_REG_ACC_BC,
};
pub use register::{FabricRegister, RegisterLayout};

// Export current architecture based on feature flag
#[cfg(feature = "zen4")]
pub use arch::zen4 as current_arch;
