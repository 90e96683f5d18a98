//! Per-generation operation tables
//!
//! Each silicon generation provides one [`DfXfer`] and one [`CcxXfer`]
//! implementation. Slots a generation does not override keep the default
//! body, which reports [`NotSupported`]; callers treat that as "not
//! applicable for this generation" and skip.

use std::sync::Arc;

use silinit_raw::{ComponentLocation, DeviceMap, FabricRegister};

use super::SiliconGeneration;
use crate::common::{FabricAccess, MsrAccess};
use crate::config::CcxInputBlock;

/// Status of an operation table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Operation table lookup aborted")]
    Aborted,

    #[error("Invalid parameter to operation table lookup")]
    InvalidParameter,

    #[error("No silicon generation installed")]
    NotInstalled,

    #[error("No operation table for {0}")]
    NoTable(SiliconGeneration),
}

/// An operation slot the generation leaves unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not supported by this generation")]
pub struct NotSupported(pub &'static str);

pub type OpResult<T> = std::result::Result<T, NotSupported>;

/// Component-location table plus the optional side values computed with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentLocationMap {
    pub locations: &'static [ComponentLocation],
    /// Number of locations, when requested
    pub count: Option<u32>,
    /// Fabric ID of IOS0, when requested
    pub phys_ios0_fabric_id: Option<u32>,
}

/// Registers touched by the PIE RAS sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieRasRegisters {
    pub hwa_status_low: FabricRegister,
    pub hwa_mask_low: FabricRegister,
    pub hwa_mask_low_default: u32,
}

/// Data fabric topology primitives
pub trait DfXfer: Send + Sync {
    fn generation(&self) -> SiliconGeneration;

    fn number_of_processors_present(&self, _fabric: &dyn FabricAccess) -> OpResult<u32> {
        Err(NotSupported("number_of_processors_present"))
    }

    fn number_of_dies_on_socket(&self, _socket: u32) -> OpResult<u32> {
        Err(NotSupported("number_of_dies_on_socket"))
    }

    fn number_of_root_bridges_on_die(&self, _socket: u32) -> OpResult<u32> {
        Err(NotSupported("number_of_root_bridges_on_die"))
    }

    fn host_bridge_bus_base(
        &self,
        _fabric: &dyn FabricAccess,
        _socket: u32,
        _index: u32,
    ) -> OpResult<u32> {
        Err(NotSupported("host_bridge_bus_base"))
    }

    fn host_bridge_bus_limit(
        &self,
        _fabric: &dyn FabricAccess,
        _socket: u32,
        _index: u32,
    ) -> OpResult<u32> {
        Err(NotSupported("host_bridge_bus_limit"))
    }

    fn phys_root_bridge_number(&self, _index: u32) -> OpResult<u32> {
        Err(NotSupported("phys_root_bridge_number"))
    }

    fn die_system_offset(&self, _fabric: &dyn FabricAccess, _socket: u32) -> OpResult<u32> {
        Err(NotSupported("die_system_offset"))
    }

    fn device_number_of_die(&self, _socket: u32) -> OpResult<u32> {
        Err(NotSupported("device_number_of_die"))
    }

    fn get_device_map_on_die(&self) -> OpResult<&'static [DeviceMap]> {
        Err(NotSupported("get_device_map_on_die"))
    }

    fn find_component_location_map(
        &self,
        _fabric: &dyn FabricAccess,
        _want_count: bool,
        _want_phys_ios0: bool,
    ) -> OpResult<ComponentLocationMap> {
        Err(NotSupported("find_component_location_map"))
    }

    fn pie_ras_registers(&self) -> OpResult<PieRasRegisters> {
        Err(NotSupported("pie_ras_registers"))
    }

    /// Program the fabric watchdog counter select on one socket (broadcast)
    fn program_fabric_watchdog(
        &self,
        _fabric: &dyn FabricAccess,
        _socket: u32,
        _wdt_cnt_sel: u8,
    ) -> OpResult<()> {
        Err(NotSupported("program_fabric_watchdog"))
    }
}

/// Core complex operations
pub trait CcxXfer: Send + Sync {
    fn generation(&self) -> SiliconGeneration;

    fn enable_smee(&self, _msr: &dyn MsrAccess, _enable: bool) -> OpResult<()> {
        Err(NotSupported("enable_smee"))
    }

    fn enable_cpb(&self, _msr: &dyn MsrAccess, _enable: u8) -> OpResult<()> {
        Err(NotSupported("enable_cpb"))
    }

    /// Base misc MSR path; the AVIC group is applied by the caller
    fn set_misc_msrs(&self, _msr: &dyn MsrAccess, _input: &CcxInputBlock) -> OpResult<()> {
        Err(NotSupported("set_misc_msrs"))
    }

    /// MSR addresses and synchronized bit masks replayed on APs
    fn ap_msr_sync_list(&self) -> OpResult<&'static [(u32, u64)]> {
        Err(NotSupported("ap_msr_sync_list"))
    }
}

/// Resolves the active generation's operation tables
///
/// Callers resolve on every use; a resolved table is a snapshot that stays
/// valid even if the source installs another generation meanwhile.
pub trait XferSource: Send + Sync {
    fn df_xfer(&self) -> Result<Arc<dyn DfXfer>, DispatchError>;

    fn ccx_xfer(&self) -> Result<Arc<dyn CcxXfer>, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl DfXfer for Bare {
        fn generation(&self) -> SiliconGeneration {
            SiliconGeneration::Zen5
        }
    }

    impl CcxXfer for Bare {
        fn generation(&self) -> SiliconGeneration {
            SiliconGeneration::Zen5
        }
    }

    #[test]
    fn test_unset_slots_report_not_supported() {
        assert_eq!(
            DfXfer::number_of_dies_on_socket(&Bare, 0),
            Err(NotSupported("number_of_dies_on_socket"))
        );
        assert_eq!(
            Bare.ap_msr_sync_list(),
            Err(NotSupported("ap_msr_sync_list"))
        );
        assert!(Bare.pie_ras_registers().is_err());
    }

    #[test]
    fn test_dispatch_error_messages() {
        assert_eq!(
            DispatchError::NoTable(SiliconGeneration::Zen5).to_string(),
            "No operation table for Zen5"
        );
    }
}
