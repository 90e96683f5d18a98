pub mod boot_pass;

pub use boot_pass::{BootPass, BootReport, CcxReport, RootBridgeEntry};
