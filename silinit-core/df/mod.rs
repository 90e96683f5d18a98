//! Data fabric: register access, topology resolution and the PIE RAS sweep

pub mod ras;
pub mod register_acc;
pub mod topology;
pub mod zen4;

pub use ras::{fabric_pie_ras_init, RasControlInstanceList, RasSweepSummary};
pub use register_acc::{DieDeviceLookup, IndirectFabricAccess, XferDieDevices};
pub use topology::{
    df_find_component_location_map, df_get_device_map_on_die, df_get_number_of_system_dies,
    df_get_root_bridge_info, find_device_type_entry_in_map, host_bridge_system_fabric_id,
    RootBridgeInfo, RootBridgeQuery,
};
pub use zen4::DfXferZen4;
