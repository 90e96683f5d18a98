//! Data fabric (DF4) register definitions for Zen4
//!
//! The data fabric exposes its configuration registers on PCI bus 0,
//! device `0x18 + socket`, functions 0-7. Broadcast reads and writes go
//! straight to that function/offset; per-instance access goes through the
//! FICAA3/FICAD3 indirect register pair on function 4.
//!
//! ## References
//!
//! - Processor Programming Reference (PPR) for AMD Family 19h Model 11h, DF chapter

use crate::fabric::{
    ComponentLocation, ComponentType, DeviceId, DeviceMap, FabricDeviceType, FabricInstance,
};
use crate::register::{FabricRegister, RegisterLayout};

/// PCI device number of the socket 0 data fabric
pub const DF_PCI_DEVICE_BASE: u32 = 0x18;

/// Maximum sockets supported by the platform
pub const MAX_SOCKETS: u32 = 2;

/// Largest SocketIdShift keeping every system fabric ID within DstFabricID
pub const MAX_SOCKET_ID_SHIFT: u8 = 9;

/// Dies per socket (a single I/O die)
pub const DIES_PER_SOCKET: u32 = 1;

/// Number of CfgAddressMap (PCI bus range) registers
pub const CFG_ADDRESS_MAP_COUNT: u32 = 8;

/// Largest value accepted by DfGlobalCtrl[WDTCntSel]
pub const WDT_CNT_SEL_MAX: u8 = 7;

/// Hardware assert mask applied during PIE RAS init (bits 0-7 stay unmasked)
pub const DEFAULT_HWA_MASK_LOW: u32 = 0xFFFF_FF00;

/// Instance ID of the first I/O switch
pub const IOS0_INSTANCE_ID: u8 = 0x20;

/// Register locations
pub const SYSTEM_CFG: FabricRegister = FabricRegister::at(1, 0x200);
pub const SYSTEM_FABRIC_ID_MASK0: FabricRegister = FabricRegister::at(1, 0x208);
pub const SYSTEM_FABRIC_ID_MASK1: FabricRegister = FabricRegister::at(1, 0x20C);
pub const CFG_ADDRESS_MAP0: FabricRegister = FabricRegister::at(0, 0xC80);
pub const FABRIC_BLOCK_INSTANCE_INFORMATION3: FabricRegister = FabricRegister::at(0, 0x050);
pub const DF_GLOBAL_CTRL: FabricRegister = FabricRegister::at(3, 0x044);
pub const HARDWARE_ASSERT_STATUS_LOW: FabricRegister = FabricRegister::at(6, 0x1E0);
pub const HARDWARE_ASSERT_MASK_LOW: FabricRegister = FabricRegister::at(6, 0x1E8);
pub const FICAA3: FabricRegister = FabricRegister::at(4, 0x05C);
pub const FICAD3_LO: FabricRegister = FabricRegister::at(4, 0x098);
pub const FICAD3_HI: FabricRegister = FabricRegister::at(4, 0x09C);

/// CfgAddressMap register for a given map index
pub fn cfg_address_map(index: u32) -> FabricRegister {
    CFG_ADDRESS_MAP0.indexed(index, 4)
}

/// SystemCfg register layout
///
/// | Bits  | Field                |
/// |-------|----------------------|
/// | 1-0   | my_die_type          |
/// | 7-4   | my_die_id            |
/// | 11-8  | my_socket_id         |
/// | 12    | other_socket_present |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemCfg {
    pub my_die_type: u8,
    pub my_die_id: u8,
    pub my_socket_id: u8,
    pub other_socket_present: bool,
}

impl RegisterLayout for SystemCfg {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        (self.my_die_type as u32 & 0x3)
            | ((self.my_die_id as u32 & 0xF) << 4)
            | ((self.my_socket_id as u32 & 0xF) << 8)
            | (if self.other_socket_present { 1 << 12 } else { 0 })
    }

    fn from_raw(value: u32) -> Self {
        Self {
            my_die_type: (value & 0x3) as u8,
            my_die_id: ((value >> 4) & 0xF) as u8,
            my_socket_id: ((value >> 8) & 0xF) as u8,
            other_socket_present: (value & (1 << 12)) != 0,
        }
    }
}

/// SystemFabricIdMask1 register layout
///
/// | Bits  | Field           |
/// |-------|-----------------|
/// | 3-0   | node_id_shift   |
/// | 11-8  | socket_id_shift |
/// | 31-16 | socket_id_mask  |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemFabricIdMask1 {
    pub node_id_shift: u8,
    pub socket_id_shift: u8,
    pub socket_id_mask: u16,
}

impl RegisterLayout for SystemFabricIdMask1 {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        (self.node_id_shift as u32 & 0xF)
            | ((self.socket_id_shift as u32 & 0xF) << 8)
            | ((self.socket_id_mask as u32) << 16)
    }

    fn from_raw(value: u32) -> Self {
        Self {
            node_id_shift: (value & 0xF) as u8,
            socket_id_shift: ((value >> 8) & 0xF) as u8,
            socket_id_mask: (value >> 16) as u16,
        }
    }
}

/// CfgAddressMap register layout (PCI bus range routed to a fabric node)
///
/// | Bits  | Field          |
/// |-------|----------------|
/// | 0     | read_enable    |
/// | 1     | write_enable   |
/// | 13-4  | dst_fabric_id  |
/// | 23-16 | bus_num_base   |
/// | 31-24 | bus_num_limit  |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CfgAddressMap {
    pub read_enable: bool,
    pub write_enable: bool,
    pub dst_fabric_id: u16,
    pub bus_num_base: u8,
    pub bus_num_limit: u8,
}

impl RegisterLayout for CfgAddressMap {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        (if self.read_enable { 1 } else { 0 })
            | (if self.write_enable { 1 << 1 } else { 0 })
            | ((self.dst_fabric_id as u32 & 0x3FF) << 4)
            | ((self.bus_num_base as u32) << 16)
            | ((self.bus_num_limit as u32) << 24)
    }

    fn from_raw(value: u32) -> Self {
        Self {
            read_enable: (value & 1) != 0,
            write_enable: (value & (1 << 1)) != 0,
            dst_fabric_id: ((value >> 4) & 0x3FF) as u16,
            bus_num_base: ((value >> 16) & 0xFF) as u8,
            bus_num_limit: ((value >> 24) & 0xFF) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.dst_fabric_id > 0x3FF {
            return Err("DstFabricID must fit in 10 bits");
        }
        if self.bus_num_base > self.bus_num_limit {
            return Err("Bus base must not exceed bus limit");
        }
        Ok(())
    }
}

/// FabricBlockInstanceInformation3 layout (only the block fabric ID is used)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FabricBlockInstanceInformation3 {
    /// Bits 11-0
    pub block_fabric_id: u16,
}

impl RegisterLayout for FabricBlockInstanceInformation3 {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        self.block_fabric_id as u32 & 0xFFF
    }

    fn from_raw(value: u32) -> Self {
        Self {
            block_fabric_id: (value & 0xFFF) as u16,
        }
    }
}

/// DfGlobalCtrl layout; bits outside the watchdog select are carried through untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DfGlobalCtrl {
    /// Bits 26-24
    pub wdt_cnt_sel: u8,
    pub other_bits: u32,
}

impl DfGlobalCtrl {
    const WDT_CNT_SEL_MASK: u32 = 0x7 << 24;
}

impl RegisterLayout for DfGlobalCtrl {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        (self.other_bits & !Self::WDT_CNT_SEL_MASK) | ((self.wdt_cnt_sel as u32 & 0x7) << 24)
    }

    fn from_raw(value: u32) -> Self {
        Self {
            wdt_cnt_sel: ((value >> 24) & 0x7) as u8,
            other_bits: value & !Self::WDT_CNT_SEL_MASK,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.wdt_cnt_sel > WDT_CNT_SEL_MAX {
            return Err("WDTCntSel must be in range 0-7");
        }
        Ok(())
    }
}

/// HardwareAssertStatusLow: one write-one-to-clear bit per hardware assert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardwareAssertStatusLow {
    pub asserted: u32,
}

impl HardwareAssertStatusLow {
    pub fn any_asserted(&self) -> bool {
        self.asserted != 0
    }
}

impl RegisterLayout for HardwareAssertStatusLow {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        self.asserted
    }

    fn from_raw(value: u32) -> Self {
        Self { asserted: value }
    }
}

/// FICAA3 (fabric indirect config access address) layout
///
/// | Bits  | Field                  |
/// |-------|------------------------|
/// | 0     | cfg_reg_inst_acc_en    |
/// | 10-2  | ind_cfg_acc_reg_num    |
/// | 13-11 | ind_cfg_acc_func_num   |
/// | 14    | sixty_four_bit_reg_en  |
/// | 23-16 | cfg_reg_inst_id        |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FabricIndirectConfigAccessAddress {
    pub cfg_reg_inst_acc_en: bool,
    pub ind_cfg_acc_reg_num: u16,
    pub ind_cfg_acc_func_num: u8,
    pub sixty_four_bit_reg_en: bool,
    pub cfg_reg_inst_id: u8,
}

impl FabricIndirectConfigAccessAddress {
    /// Address word selecting `register` on a single instance
    pub fn for_register(register: FabricRegister, instance: FabricInstance) -> Self {
        let (enable, id) = match instance {
            FabricInstance::Instance(id) => (true, id),
            FabricInstance::Broadcast => (false, 0),
        };
        Self {
            cfg_reg_inst_acc_en: enable,
            ind_cfg_acc_reg_num: register.register_number(),
            ind_cfg_acc_func_num: register.function,
            sixty_four_bit_reg_en: false,
            cfg_reg_inst_id: id,
        }
    }

    /// Register the address word points at
    pub fn register(&self) -> FabricRegister {
        FabricRegister::at(self.ind_cfg_acc_func_num, self.ind_cfg_acc_reg_num << 2)
    }
}

impl RegisterLayout for FabricIndirectConfigAccessAddress {
    type Raw = u32;

    fn to_raw(&self) -> u32 {
        (if self.cfg_reg_inst_acc_en { 1 } else { 0 })
            | ((self.ind_cfg_acc_reg_num as u32 & 0x1FF) << 2)
            | ((self.ind_cfg_acc_func_num as u32 & 0x7) << 11)
            | (if self.sixty_four_bit_reg_en { 1 << 14 } else { 0 })
            | ((self.cfg_reg_inst_id as u32) << 16)
    }

    fn from_raw(value: u32) -> Self {
        Self {
            cfg_reg_inst_acc_en: (value & 1) != 0,
            ind_cfg_acc_reg_num: ((value >> 2) & 0x1FF) as u16,
            ind_cfg_acc_func_num: ((value >> 11) & 0x7) as u8,
            sixty_four_bit_reg_en: (value & (1 << 14)) != 0,
            cfg_reg_inst_id: ((value >> 16) & 0xFF) as u8,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.ind_cfg_acc_reg_num > 0x1FF {
            return Err("Indirect register number must fit in 9 bits");
        }
        if self.ind_cfg_acc_func_num > 7 {
            return Err("Indirect function number must be in range 0-7");
        }
        Ok(())
    }
}

/// Coherent slaves (memory channels), in hardware order
pub static CS_IDS: [DeviceId; 16] = [
    DeviceId::new(0x00, 0x00),
    DeviceId::new(0x01, 0x01),
    DeviceId::new(0x02, 0x02),
    DeviceId::new(0x03, 0x03),
    DeviceId::new(0x04, 0x04),
    DeviceId::new(0x05, 0x05),
    DeviceId::new(0x06, 0x06),
    DeviceId::new(0x07, 0x07),
    DeviceId::new(0x08, 0x08),
    DeviceId::new(0x09, 0x09),
    DeviceId::new(0x0A, 0x0A),
    DeviceId::new(0x0B, 0x0B),
    DeviceId::new(0x0C, 0x0C),
    DeviceId::new(0x0D, 0x0D),
    DeviceId::new(0x0E, 0x0E),
    DeviceId::new(0x0F, 0x0F),
];

/// Cache-coherent masters (one per CCD link)
pub static CCM_IDS: [DeviceId; 8] = [
    DeviceId::new(0x10, 0x10),
    DeviceId::new(0x11, 0x11),
    DeviceId::new(0x12, 0x12),
    DeviceId::new(0x13, 0x13),
    DeviceId::new(0x14, 0x14),
    DeviceId::new(0x15, 0x15),
    DeviceId::new(0x16, 0x16),
    DeviceId::new(0x17, 0x17),
];

/// I/O switches, one per root bridge
pub static IOS_IDS: [DeviceId; 4] = [
    DeviceId::new(0x20, 0x20),
    DeviceId::new(0x21, 0x21),
    DeviceId::new(0x22, 0x22),
    DeviceId::new(0x23, 0x23),
];

pub static PIE_IDS: [DeviceId; 1] = [DeviceId::new(0x30, 0x30)];

pub static CAKE_IDS: [DeviceId; 2] = [DeviceId::new(0x38, 0x38), DeviceId::new(0x39, 0x39)];

/// Per-die device map table
pub static DEVICE_MAP: [DeviceMap; 5] = [
    DeviceMap::new(FabricDeviceType::Cs, &CS_IDS),
    DeviceMap::new(FabricDeviceType::Ccm, &CCM_IDS),
    DeviceMap::new(FabricDeviceType::Ios, &IOS_IDS),
    DeviceMap::new(FabricDeviceType::Pie, &PIE_IDS),
    DeviceMap::new(FabricDeviceType::Cake, &CAKE_IDS),
];

/// FCH and SMU live behind IOS2 of die 0 on each socket
pub static COMPONENT_LOCATION: [ComponentLocation; 4] = [
    ComponentLocation::new(0, 0, 0x22, ComponentType::PrimaryFch),
    ComponentLocation::new(1, 0, 0x22, ComponentType::SecondaryFch),
    ComponentLocation::new(0, 0, 0x22, ComponentType::PrimarySmu),
    ComponentLocation::new(1, 0, 0x22, ComponentType::SecondarySmu),
];

/// Physical root bridge number of each logical IOS index
pub static PHYS_ROOT_BRIDGE_NUMBER: [u32; 4] = [2, 0, 3, 1];
