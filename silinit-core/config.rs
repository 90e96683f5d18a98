use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::df::ras::RasControlInstanceList;
use crate::dispatch::SiliconGeneration;
use crate::error::{Result, SilError};

/// `fabric_wdt_cnt_sel` value leaving the watchdog at its hardware default
pub const WDT_CNT_SEL_AUTO: u8 = 0xFF;

/// Raw terminator of host-supplied instance ID lists
pub const INSTANCE_LIST_TERMINAL: u32 = 0xFFFF_FFFF;

/// Data fabric input block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfInputBlock {
    /// DfGlobalCtrl watchdog counter select, `0xFF` = leave as is
    pub fabric_wdt_cnt_sel: u8,
    /// Fabric instances whose PIE RAS status is checked after the die sweep
    pub glbl_ctrl_instance_ids: Vec<u32>,
}

impl Default for DfInputBlock {
    fn default() -> Self {
        Self {
            fabric_wdt_cnt_sel: WDT_CNT_SEL_AUTO,
            glbl_ctrl_instance_ids: Vec::new(),
        }
    }
}

impl DfInputBlock {
    /// Watchdog counter select to program, if any
    pub fn wdt_cnt_sel(&self) -> Option<u8> {
        (self.fabric_wdt_cnt_sel != WDT_CNT_SEL_AUTO).then_some(self.fabric_wdt_cnt_sel)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(sel) = self.wdt_cnt_sel() {
            if sel > silinit_raw::current_arch::df::WDT_CNT_SEL_MAX {
                return Err(SilError::out_of_range(
                    "fabric_wdt_cnt_sel",
                    sel as u32,
                    silinit_raw::current_arch::df::WDT_CNT_SEL_MAX as u32,
                ));
            }
        }
        RasControlInstanceList::from_raw_terminated(&self.glbl_ctrl_instance_ids)?;
        Ok(())
    }
}

/// Core complex input block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcxInputBlock {
    pub enable_smee: bool,
    /// Nonzero enables core performance boost
    pub cpb_enable: u8,
    pub enable_svm_avic: bool,
    pub enable_svm_x2avic: bool,
    pub enable_mca_status_wr: bool,
    pub tsc_freq_sel: bool,
}

/// A fabric register value seeded into the simulated register file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRegister {
    pub socket: u32,
    pub function: u8,
    pub offset: u16,
    /// Instance ID, or broadcast when absent
    #[serde(default)]
    pub instance: Option<u8>,
    pub value: u32,
}

/// An MSR value seeded into the simulated register file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetMsr {
    pub address: u32,
    pub value: u64,
}

/// Shape of the simulated platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimTopology {
    pub sockets: u32,
    /// SystemFabricIdMask1[SocketIdShift]
    pub socket_id_shift: u8,
    pub registers: Vec<PresetRegister>,
    pub msrs: Vec<PresetMsr>,
}

impl Default for SimTopology {
    fn default() -> Self {
        Self {
            sockets: 1,
            socket_id_shift: 8,
            registers: Vec::new(),
            msrs: Vec::new(),
        }
    }
}

impl SimTopology {
    pub fn validate(&self) -> Result<()> {
        let max = silinit_raw::current_arch::df::MAX_SOCKETS;
        if self.sockets == 0 || self.sockets > max {
            return Err(SilError::ConfigError(format!(
                "sockets must be in range 1-{max}, got {}",
                self.sockets
            )));
        }
        let max_shift = silinit_raw::current_arch::df::MAX_SOCKET_ID_SHIFT;
        if self.socket_id_shift > max_shift {
            return Err(SilError::ConfigError(format!(
                "socket_id_shift must be at most {max_shift}, got {}",
                self.socket_id_shift
            )));
        }
        if let Some(preset) = self.registers.iter().find(|r| r.socket >= self.sockets) {
            return Err(SilError::ConfigError(format!(
                "preset register {:#x}:{:#x} targets socket {}, only {} present",
                preset.function, preset.offset, preset.socket, self.sockets
            )));
        }
        Ok(())
    }
}

/// Inputs of one boot pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub generation: SiliconGeneration,
    pub df: DfInputBlock,
    pub ccx: CcxInputBlock,
    pub topology: SimTopology,
}

impl BootConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: BootConfig = serde_json::from_str(&text)?;
        tracing::info!("Loaded boot configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.df.validate()?;
        self.topology.validate()
    }
}
