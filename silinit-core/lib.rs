// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod ccx;
pub mod common;
pub mod config;
pub mod context;
pub mod df;
pub mod dispatch;
pub mod error;
pub mod orchestrator;

pub use ccx::{
    ccx_capture_misc_msrs, ccx_enable_smee, ccx_initialize_cpb, ccx_prepare_ap_launch_data,
    ccx_set_misc_msrs, ccx_sync_misc_msrs, ApLaunchGlobalData, ApMsrSyncEntry, Outcome,
};
pub use config::{BootConfig, CcxInputBlock, DfInputBlock, SimTopology};
pub use context::SilContext;
pub use df::{
    df_find_component_location_map, df_get_device_map_on_die, df_get_number_of_system_dies,
    df_get_root_bridge_info, fabric_pie_ras_init, find_device_type_entry_in_map,
    IndirectFabricAccess, RasSweepSummary, RootBridgeInfo, RootBridgeQuery, XferDieDevices,
};
pub use dispatch::{RevisionRegistry, SiliconGeneration, XferSource};
pub use error::{Result, SilError};
pub use orchestrator::{BootPass, BootReport};
