//! Fabric topology queries
//!
//! Every query resolves the DF operation table afresh, combines the
//! generation's static device maps with live fabric register reads, and is
//! read-only: repeating a query against unchanged hardware gives the same
//! answer.

use serde::Serialize;

use silinit_raw::{ComponentType, DeviceMap, FabricDeviceType};

use crate::context::SilContext;
use crate::dispatch::{ComponentLocationMap, DfXfer};
use crate::error::{Result, SilError};

/// Which root bridge fields a caller wants computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootBridgeQuery {
    pub system_fabric_id: bool,
    pub bus_number_base: bool,
    pub bus_number_limit: bool,
    pub physical_root_bridge_number: bool,
    pub has_fch_device: bool,
    pub has_system_mgmt_unit: bool,
}

impl RootBridgeQuery {
    pub fn all() -> Self {
        Self {
            system_fabric_id: true,
            bus_number_base: true,
            bus_number_limit: true,
            physical_root_bridge_number: true,
            has_fch_device: true,
            has_system_mgmt_unit: true,
        }
    }
}

/// Root bridge descriptor; fields that were not requested stay `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RootBridgeInfo {
    pub system_fabric_id: Option<u32>,
    pub bus_number_base: Option<u32>,
    pub bus_number_limit: Option<u32>,
    pub physical_root_bridge_number: Option<u32>,
    pub has_fch_device: Option<bool>,
    pub has_system_mgmt_unit: Option<bool>,
}

/// First device map of the given type on a die; no table means no map
pub fn find_device_type_entry_in_map(
    ctx: &SilContext,
    device_type: FabricDeviceType,
) -> Option<&'static DeviceMap> {
    let df = crate::resolve_xfer!(ctx, df_xfer, "find_device_type_entry_in_map", return None);
    let maps = crate::slot_or!(df.get_device_map_on_die(), return None);
    find_in(maps, device_type)
}

fn find_in(maps: &'static [DeviceMap], device_type: FabricDeviceType) -> Option<&'static DeviceMap> {
    maps.iter().find(|map| map.device_type == device_type)
}

/// The generation's per-die device map table
pub fn df_get_device_map_on_die(ctx: &SilContext) -> Result<&'static [DeviceMap]> {
    let df = ctx.xfer.df_xfer()?;
    Ok(df.get_device_map_on_die()?)
}

/// The generation's component-location table, plus optional side values
///
/// Side values not asked for are not computed; in particular no register is
/// read unless `want_phys_ios0` is set.
pub fn df_find_component_location_map(
    ctx: &SilContext,
    want_count: bool,
    want_phys_ios0: bool,
) -> Result<ComponentLocationMap> {
    let df = ctx.xfer.df_xfer()?;
    Ok(df.find_component_location_map(ctx.fabric, want_count, want_phys_ios0)?)
}

/// Total dies over all present sockets
pub fn df_get_number_of_system_dies(ctx: &SilContext) -> Result<u32> {
    let df = ctx.xfer.df_xfer()?;
    let sockets = df.number_of_processors_present(ctx.fabric)?;

    let mut dies = 0;
    for socket in 0..sockets {
        dies += df.number_of_dies_on_socket(socket)?;
    }
    Ok(dies)
}

fn system_fabric_id_with(
    ctx: &SilContext,
    df: &dyn DfXfer,
    socket: u32,
    index: u32,
) -> Result<u32> {
    let maps = df.get_device_map_on_die()?;
    let ios = find_in(maps, FabricDeviceType::Ios)
        .ok_or(SilError::MissingDeviceMap(FabricDeviceType::Ios))?;
    // Bridges past the map's populated entries read a zeroed node
    let fabric_id = match ios.ids.get(index as usize) {
        Some(node) => node.fabric_id,
        None => {
            tracing::warn!(
                "Root bridge {} has no IOS map entry ({} listed), using fabric ID 0",
                index,
                ios.count()
            );
            0
        }
    };
    Ok(fabric_id + df.die_system_offset(ctx.fabric, socket)?)
}

/// System-wide fabric ID of the I/O switch behind root bridge `index`
pub fn host_bridge_system_fabric_id(ctx: &SilContext, socket: u32, index: u32) -> Result<u32> {
    let df = ctx.xfer.df_xfer()?;
    system_fabric_id_with(ctx, df.as_ref(), socket, index)
}

fn hosts_component(
    ctx: &SilContext,
    df: &dyn DfXfer,
    socket: u32,
    die: u32,
    system_fabric_id: u32,
    role: fn(ComponentType) -> bool,
) -> Result<bool> {
    let map = df.find_component_location_map(ctx.fabric, false, false)?;
    let offset = df.die_system_offset(ctx.fabric, socket)?;

    Ok(map.locations.iter().any(|location| {
        location.socket == socket
            && location.die == die
            && role(location.component)
            && location.ioms_fabric_id + offset == system_fabric_id
    }))
}

/// Describe root bridge `index` of `socket`/`die`
///
/// Bounds are checked in socket, die, index order against the table's own
/// counts; a violation is reported before anything else is computed.
pub fn df_get_root_bridge_info(
    ctx: &SilContext,
    socket: u32,
    die: u32,
    index: u32,
    query: RootBridgeQuery,
) -> Result<RootBridgeInfo> {
    let df = ctx.xfer.df_xfer()?;

    let sockets = df.number_of_processors_present(ctx.fabric)?;
    if socket >= sockets {
        return Err(SilError::out_of_range("socket", socket, sockets));
    }
    let dies = df.number_of_dies_on_socket(socket)?;
    if die >= dies {
        return Err(SilError::out_of_range("die", die, dies));
    }
    let bridges = df.number_of_root_bridges_on_die(socket)?;
    if index >= bridges {
        return Err(SilError::out_of_range("root bridge index", index, bridges));
    }

    let mut info = RootBridgeInfo::default();

    let needs_fabric_id =
        query.system_fabric_id || query.has_fch_device || query.has_system_mgmt_unit;
    let system_fabric_id = if needs_fabric_id {
        Some(system_fabric_id_with(ctx, df.as_ref(), socket, index)?)
    } else {
        None
    };

    if query.system_fabric_id {
        info.system_fabric_id = system_fabric_id;
    }
    if query.bus_number_base {
        info.bus_number_base = Some(df.host_bridge_bus_base(ctx.fabric, socket, index)?);
    }
    if query.bus_number_limit {
        info.bus_number_limit = Some(df.host_bridge_bus_limit(ctx.fabric, socket, index)?);
    }
    if query.physical_root_bridge_number {
        info.physical_root_bridge_number = Some(df.phys_root_bridge_number(index)?);
    }
    if let Some(fabric_id) = system_fabric_id {
        if query.has_fch_device {
            info.has_fch_device = Some(hosts_component(
                ctx,
                df.as_ref(),
                socket,
                die,
                fabric_id,
                ComponentType::is_fch,
            )?);
        }
        if query.has_system_mgmt_unit {
            info.has_system_mgmt_unit = Some(hosts_component(
                ctx,
                df.as_ref(),
                socket,
                die,
                fabric_id,
                ComponentType::is_smu,
            )?);
        }
    }

    tracing::debug!(
        "Root bridge {}/{}/{}: {:?}",
        socket,
        die,
        index,
        info
    );
    Ok(info)
}
