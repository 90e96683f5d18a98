// Zen4 core complex operation table

use silinit_raw::ccx::msr::{MSR_HWCR, MSR_SYS_CFG};
use silinit_raw::ccx::{Hwcr, HWCR_CPB_DIS, HWCR_MC_STATUS_WR_EN, HWCR_TSC_FREQ_SEL, SYS_CFG_SMEE};
use silinit_raw::current_arch::ccx::{AP_MSR_SYNC_LIST, DE_CFG_LFENCE_SERIALIZING, MSR_DE_CFG};
use silinit_raw::RegisterLayout;

use crate::common::MsrAccess;
use crate::config::CcxInputBlock;
use crate::dispatch::{CcxXfer, OpResult, SiliconGeneration};

/// Set or clear `bit` of `addr` without touching the other bits
fn update_bit(msr: &dyn MsrAccess, addr: u32, bit: u64, set: bool) -> u64 {
    msr.msr_and_then_or(addr, !bit, if set { bit } else { 0 })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CcxXferZen4;

impl CcxXfer for CcxXferZen4 {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen4
    }

    fn enable_smee(&self, msr: &dyn MsrAccess, enable: bool) -> OpResult<()> {
        update_bit(msr, MSR_SYS_CFG, SYS_CFG_SMEE, enable);
        Ok(())
    }

    fn enable_cpb(&self, msr: &dyn MsrAccess, enable: u8) -> OpResult<()> {
        update_bit(msr, MSR_HWCR, HWCR_CPB_DIS, enable == 0);
        Ok(())
    }

    fn set_misc_msrs(&self, msr: &dyn MsrAccess, input: &CcxInputBlock) -> OpResult<()> {
        let mut or_mask = 0;
        if input.tsc_freq_sel {
            or_mask |= HWCR_TSC_FREQ_SEL;
        }
        if input.enable_mca_status_wr {
            or_mask |= HWCR_MC_STATUS_WR_EN;
        }
        let hwcr = msr.msr_and_then_or(
            MSR_HWCR,
            !(HWCR_TSC_FREQ_SEL | HWCR_MC_STATUS_WR_EN),
            or_mask,
        );
        if let Err(e) = Hwcr::from_raw(hwcr).validate() {
            tracing::warn!("HWCR 0x{:016x}: {}", hwcr, e);
        }

        msr.msr_or(MSR_DE_CFG, DE_CFG_LFENCE_SERIALIZING);
        Ok(())
    }

    fn ap_msr_sync_list(&self) -> OpResult<&'static [(u32, u64)]> {
        Ok(&AP_MSR_SYNC_LIST)
    }
}
