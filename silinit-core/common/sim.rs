//! In-memory register file standing in for MSR and PCI configuration space
//!
//! Models just enough of the data fabric for a boot pass to run on a host:
//! broadcast registers per DF device, per-instance registers reached through
//! the FICAA3/FICAD3 pair, and write-one-to-clear status registers.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use silinit_raw::current_arch::df::{
    cfg_address_map, CfgAddressMap, FabricBlockInstanceInformation3,
    FabricIndirectConfigAccessAddress, SystemCfg, SystemFabricIdMask1, CFG_ADDRESS_MAP_COUNT,
    DF_PCI_DEVICE_BASE, FABRIC_BLOCK_INSTANCE_INFORMATION3, FICAA3, FICAD3_LO,
    HARDWARE_ASSERT_STATUS_LOW, IOS0_INSTANCE_ID, IOS_IDS, MAX_SOCKETS, SYSTEM_CFG,
    SYSTEM_FABRIC_ID_MASK1,
};
use silinit_raw::{FabricRegister, RegisterLayout};

use crate::common::{MsrAccess, PciAddress, PciConfigAccess};
use crate::config::SimTopology;
use crate::df::register_acc::df_config_address;

/// One register access, in issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessRecord {
    MsrRead { address: u32, value: u64 },
    MsrWrite { address: u32, value: u64 },
    PciRead { address: PciAddress, value: u32 },
    PciWrite { address: PciAddress, value: u32 },
}

impl AccessRecord {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            AccessRecord::MsrWrite { .. } | AccessRecord::PciWrite { .. }
        )
    }
}

#[derive(Default)]
struct SimState {
    msrs: HashMap<u32, u64>,
    pci: HashMap<PciAddress, u32>,
    /// Last FICAA3 value per DF device
    ficaa: HashMap<u8, u32>,
    /// Per-instance fabric registers keyed by (DF device, register, instance)
    instances: HashMap<(u8, FabricRegister, u8), u32>,
    write_one_to_clear: HashSet<FabricRegister>,
    log: Vec<AccessRecord>,
}

fn is_df_device(addr: PciAddress) -> bool {
    let device = addr.device as u32;
    addr.segment == 0
        && addr.bus == 0
        && (DF_PCI_DEVICE_BASE..DF_PCI_DEVICE_BASE + MAX_SOCKETS).contains(&device)
}

fn fabric_register(addr: PciAddress) -> FabricRegister {
    FabricRegister::at(addr.function, addr.register)
}

impl SimState {
    fn merge(&self, register: FabricRegister, current: u32, value: u32) -> u32 {
        if self.write_one_to_clear.contains(&register) {
            current & !value
        } else {
            value
        }
    }

    fn read_broadcast(&self, addr: PciAddress) -> u32 {
        self.pci.get(&addr).copied().unwrap_or(0)
    }

    /// A broadcast write reaches every instance of the register
    fn write_broadcast(&mut self, addr: PciAddress, value: u32) {
        if !is_df_device(addr) {
            self.pci.insert(addr, value);
            return;
        }

        let register = fabric_register(addr);
        let merged = self.merge(register, self.read_broadcast(addr), value);
        self.pci.insert(addr, merged);

        let w1c = self.write_one_to_clear.contains(&register);
        for ((device, reg, _), slot) in self.instances.iter_mut() {
            if *device == addr.device && *reg == register {
                *slot = if w1c { *slot & !value } else { value };
            }
        }
    }

    fn selected(&self, device: u8) -> FabricIndirectConfigAccessAddress {
        FabricIndirectConfigAccessAddress::from_raw(self.ficaa.get(&device).copied().unwrap_or(0))
    }

    fn read_indirect(&self, device: u8) -> u32 {
        let ficaa = self.selected(device);
        let register = ficaa.register();
        let broadcast = self.read_broadcast(df_config_address(device as u32, register));

        if ficaa.cfg_reg_inst_acc_en {
            self.instances
                .get(&(device, register, ficaa.cfg_reg_inst_id))
                .copied()
                .unwrap_or(broadcast)
        } else {
            broadcast
        }
    }

    fn write_indirect(&mut self, device: u8, value: u32) {
        let ficaa = self.selected(device);
        let register = ficaa.register();
        let broadcast_addr = df_config_address(device as u32, register);

        if ficaa.cfg_reg_inst_acc_en {
            let key = (device, register, ficaa.cfg_reg_inst_id);
            let current = self
                .instances
                .get(&key)
                .copied()
                .unwrap_or_else(|| self.read_broadcast(broadcast_addr));
            let merged = self.merge(register, current, value);
            self.instances.insert(key, merged);
        } else {
            self.write_broadcast(broadcast_addr, value);
        }
    }
}

/// Simulated MSR and PCI configuration space with an access log
#[derive(Default)]
pub struct SimRegisterFile {
    state: Mutex<SimState>,
}

impl SimRegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register file describing a Zen4 platform of the given shape
    pub fn from_topology(topology: &SimTopology) -> Self {
        let sim = Self::new();
        sim.mark_write_one_to_clear(HARDWARE_ASSERT_STATUS_LOW);

        let shift = topology.socket_id_shift as u32;
        let mask1 = SystemFabricIdMask1 {
            socket_id_shift: topology.socket_id_shift,
            ..Default::default()
        };

        for socket in 0..topology.sockets {
            let system_cfg = SystemCfg {
                my_socket_id: socket as u8,
                other_socket_present: topology.sockets > 1,
                ..Default::default()
            };
            sim.set_fabric(socket, SYSTEM_CFG, None, system_cfg.to_raw());
            sim.set_fabric(socket, SYSTEM_FABRIC_ID_MASK1, None, mask1.to_raw());

            let ios0 = FabricBlockInstanceInformation3 {
                block_fabric_id: (IOS_IDS[0].fabric_id + (socket << shift)) as u16,
            };
            sim.set_fabric(
                socket,
                FABRIC_BLOCK_INSTANCE_INFORMATION3,
                Some(IOS0_INSTANCE_ID),
                ios0.to_raw(),
            );
        }

        // PCI bus ranges split evenly over all root bridges, replicated on every DF
        let per_socket = IOS_IDS.len() as u32;
        let bridges = (topology.sockets * per_socket).clamp(1, CFG_ADDRESS_MAP_COUNT);
        let buses = 256 / bridges;
        for n in 0..bridges {
            let owner = n / per_socket;
            let ios = IOS_IDS[(n % per_socket) as usize];
            let map = CfgAddressMap {
                read_enable: true,
                write_enable: true,
                dst_fabric_id: ((ios.fabric_id + (owner << shift)) & 0x3FF) as u16,
                bus_num_base: (n * buses) as u8,
                bus_num_limit: ((n + 1) * buses - 1) as u8,
            };
            for socket in 0..topology.sockets {
                sim.set_fabric(socket, cfg_address_map(n), None, map.to_raw());
            }
        }

        for preset in &topology.registers {
            sim.set_fabric(
                preset.socket,
                FabricRegister::at(preset.function, preset.offset),
                preset.instance,
                preset.value,
            );
        }
        for preset in &topology.msrs {
            sim.set_msr(preset.address, preset.value);
        }

        tracing::info!(
            "Simulated {} socket(s), {} root bridge(s), socket ID shift {}",
            topology.sockets,
            bridges,
            shift
        );
        sim
    }

    pub fn mark_write_one_to_clear(&self, register: FabricRegister) {
        self.state.lock().write_one_to_clear.insert(register);
    }

    /// Seed a fabric register without logging; `None` is the broadcast copy
    pub fn set_fabric(
        &self,
        socket: u32,
        register: FabricRegister,
        instance: Option<u8>,
        value: u32,
    ) {
        let device = (DF_PCI_DEVICE_BASE + socket) as u8;
        let mut state = self.state.lock();
        match instance {
            Some(id) => {
                state.instances.insert((device, register, id), value);
            }
            None => {
                state
                    .pci
                    .insert(df_config_address(device as u32, register), value);
            }
        }
    }

    /// Current fabric register value; instances fall back to the broadcast copy
    pub fn fabric_value(
        &self,
        socket: u32,
        register: FabricRegister,
        instance: Option<u8>,
    ) -> u32 {
        let device = (DF_PCI_DEVICE_BASE + socket) as u8;
        let state = self.state.lock();
        let broadcast = state.read_broadcast(df_config_address(device as u32, register));
        match instance {
            Some(id) => state
                .instances
                .get(&(device, register, id))
                .copied()
                .unwrap_or(broadcast),
            None => broadcast,
        }
    }

    pub fn set_msr(&self, address: u32, value: u64) {
        self.state.lock().msrs.insert(address, value);
    }

    pub fn msr_value(&self, address: u32) -> u64 {
        self.state.lock().msrs.get(&address).copied().unwrap_or(0)
    }

    pub fn accesses(&self) -> Vec<AccessRecord> {
        self.state.lock().log.clone()
    }

    pub fn writes(&self) -> Vec<AccessRecord> {
        self.state
            .lock()
            .log
            .iter()
            .filter(|record| record.is_write())
            .copied()
            .collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

impl MsrAccess for SimRegisterFile {
    fn read_msr(&self, addr: u32) -> u64 {
        let mut state = self.state.lock();
        let value = state.msrs.get(&addr).copied().unwrap_or(0);
        state.log.push(AccessRecord::MsrRead {
            address: addr,
            value,
        });
        tracing::debug!("MSR read: 0x{:08x} = 0x{:016x}", addr, value);
        value
    }

    fn write_msr(&self, addr: u32, value: u64) {
        let mut state = self.state.lock();
        state.msrs.insert(addr, value);
        state.log.push(AccessRecord::MsrWrite {
            address: addr,
            value,
        });
        tracing::debug!("MSR write: 0x{:08x} <- 0x{:016x}", addr, value);
    }
}

impl PciConfigAccess for SimRegisterFile {
    fn read_pci_config32(&self, addr: PciAddress) -> u32 {
        let mut state = self.state.lock();
        let value = if is_df_device(addr) && fabric_register(addr) == FICAD3_LO {
            state.read_indirect(addr.device)
        } else {
            state.read_broadcast(addr)
        };
        state.log.push(AccessRecord::PciRead {
            address: addr,
            value,
        });
        tracing::debug!("PCI read: {} = 0x{:08x}", addr, value);
        value
    }

    fn write_pci_config32(&self, addr: PciAddress, value: u32) {
        let mut state = self.state.lock();
        state.log.push(AccessRecord::PciWrite {
            address: addr,
            value,
        });
        tracing::debug!("PCI write: {} <- 0x{:08x}", addr, value);

        if is_df_device(addr) && fabric_register(addr) == FICAA3 {
            state.ficaa.insert(addr.device, value);
            state.pci.insert(addr, value);
        } else if is_df_device(addr) && fabric_register(addr) == FICAD3_LO {
            state.write_indirect(addr.device, value);
        } else {
            state.write_broadcast(addr, value);
        }
    }
}
