pub mod cpuid;
pub mod roles;
pub mod sim;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use roles::{AlwaysPrimary, ApicRole, CcxRoles};
pub use sim::{AccessRecord, SimRegisterFile};
pub use transport::{FabricAccess, MsrAccess, PciAddress, PciConfigAccess};
