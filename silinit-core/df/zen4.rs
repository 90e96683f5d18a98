// Zen4 (DF4) data fabric operation table

use silinit_raw::current_arch::df::{
    cfg_address_map, CfgAddressMap, DfGlobalCtrl, FabricBlockInstanceInformation3,
    SystemCfg, SystemFabricIdMask1, CFG_ADDRESS_MAP_COUNT, COMPONENT_LOCATION,
    DEFAULT_HWA_MASK_LOW, DEVICE_MAP, DF_GLOBAL_CTRL, DF_PCI_DEVICE_BASE, DIES_PER_SOCKET,
    FABRIC_BLOCK_INSTANCE_INFORMATION3, HARDWARE_ASSERT_MASK_LOW, HARDWARE_ASSERT_STATUS_LOW,
    IOS0_INSTANCE_ID, IOS_IDS, PHYS_ROOT_BRIDGE_NUMBER, SYSTEM_CFG, SYSTEM_FABRIC_ID_MASK1,
};
use silinit_raw::{DeviceMap, FabricInstance, RegisterLayout};

use crate::common::FabricAccess;
use crate::dispatch::{
    ComponentLocationMap, DfXfer, NotSupported, OpResult, PieRasRegisters, SiliconGeneration,
};

pub struct DfXferZen4;

impl DfXferZen4 {
    fn host_bridge_system_fabric_id(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        index: u32,
    ) -> Option<u32> {
        let ios = IOS_IDS.get(index as usize)?;
        Some(ios.fabric_id + self.socket_offset(fabric, socket))
    }

    fn socket_offset(&self, fabric: &dyn FabricAccess, socket: u32) -> u32 {
        let mask1 = SystemFabricIdMask1::from_raw(fabric.read(
            socket,
            SYSTEM_FABRIC_ID_MASK1,
            FabricInstance::Broadcast,
        ));
        socket << mask1.socket_id_shift
    }

    /// First enabled CfgAddressMap entry routing to the given host bridge
    fn bus_map_for(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        index: u32,
    ) -> Option<CfgAddressMap> {
        let fabric_id = self.host_bridge_system_fabric_id(fabric, socket, index)?;

        let found = (0..CFG_ADDRESS_MAP_COUNT)
            .map(|i| {
                CfgAddressMap::from_raw(fabric.read(
                    socket,
                    cfg_address_map(i),
                    FabricInstance::Broadcast,
                ))
            })
            .find(|map| map.read_enable && map.dst_fabric_id as u32 == fabric_id);

        if found.is_none() {
            tracing::debug!(
                "No bus range routes to fabric ID 0x{:X} on socket {}",
                fabric_id,
                socket
            );
        }
        found
    }
}

impl DfXfer for DfXferZen4 {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen4
    }

    fn number_of_processors_present(&self, fabric: &dyn FabricAccess) -> OpResult<u32> {
        let cfg = SystemCfg::from_raw(fabric.read(0, SYSTEM_CFG, FabricInstance::Broadcast));
        Ok(if cfg.other_socket_present { 2 } else { 1 })
    }

    fn number_of_dies_on_socket(&self, _socket: u32) -> OpResult<u32> {
        Ok(DIES_PER_SOCKET)
    }

    fn number_of_root_bridges_on_die(&self, _socket: u32) -> OpResult<u32> {
        Ok(IOS_IDS.len() as u32)
    }

    fn host_bridge_bus_base(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        index: u32,
    ) -> OpResult<u32> {
        Ok(self
            .bus_map_for(fabric, socket, index)
            .map_or(0, |map| map.bus_num_base as u32))
    }

    fn host_bridge_bus_limit(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        index: u32,
    ) -> OpResult<u32> {
        Ok(self
            .bus_map_for(fabric, socket, index)
            .map_or(0, |map| map.bus_num_limit as u32))
    }

    fn phys_root_bridge_number(&self, index: u32) -> OpResult<u32> {
        Ok(PHYS_ROOT_BRIDGE_NUMBER
            .get(index as usize)
            .copied()
            .unwrap_or(index))
    }

    fn die_system_offset(&self, fabric: &dyn FabricAccess, socket: u32) -> OpResult<u32> {
        Ok(self.socket_offset(fabric, socket))
    }

    fn device_number_of_die(&self, socket: u32) -> OpResult<u32> {
        Ok(DF_PCI_DEVICE_BASE + socket)
    }

    fn get_device_map_on_die(&self) -> OpResult<&'static [DeviceMap]> {
        Ok(&DEVICE_MAP)
    }

    fn find_component_location_map(
        &self,
        fabric: &dyn FabricAccess,
        want_count: bool,
        want_phys_ios0: bool,
    ) -> OpResult<ComponentLocationMap> {
        let phys_ios0_fabric_id = want_phys_ios0.then(|| {
            let info = FabricBlockInstanceInformation3::from_raw(fabric.read(
                0,
                FABRIC_BLOCK_INSTANCE_INFORMATION3,
                FabricInstance::Instance(IOS0_INSTANCE_ID),
            ));
            info.block_fabric_id as u32
        });

        Ok(ComponentLocationMap {
            locations: &COMPONENT_LOCATION,
            count: want_count.then_some(COMPONENT_LOCATION.len() as u32),
            phys_ios0_fabric_id,
        })
    }

    fn pie_ras_registers(&self) -> OpResult<PieRasRegisters> {
        Ok(PieRasRegisters {
            hwa_status_low: HARDWARE_ASSERT_STATUS_LOW,
            hwa_mask_low: HARDWARE_ASSERT_MASK_LOW,
            hwa_mask_low_default: DEFAULT_HWA_MASK_LOW,
        })
    }

    fn program_fabric_watchdog(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        wdt_cnt_sel: u8,
    ) -> OpResult<()> {
        let mut ctrl =
            DfGlobalCtrl::from_raw(fabric.read(socket, DF_GLOBAL_CTRL, FabricInstance::Broadcast));
        ctrl.wdt_cnt_sel = wdt_cnt_sel;
        if let Err(e) = ctrl.validate() {
            tracing::warn!("Socket {}: {}, watchdog left unchanged", socket, e);
            return Err(NotSupported("program_fabric_watchdog"));
        }
        fabric.write(
            socket,
            DF_GLOBAL_CTRL,
            FabricInstance::Broadcast,
            ctrl.to_raw(),
        );
        tracing::debug!(
            "Socket {}: {} WDTCntSel = {}",
            socket,
            DF_GLOBAL_CTRL,
            wdt_cnt_sel
        );
        Ok(())
    }
}
