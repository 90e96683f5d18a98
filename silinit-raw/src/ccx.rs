//! Architectural AMD core MSRs shared by all supported generations
//!
//! ## References
//!
//! - AMD64 Architecture Programmer's Manual, Volume 2: System Programming
//! - Processor Programming Reference (PPR) for AMD Family 19h

use crate::register::RegisterLayout;

/// MSR addresses
pub mod msr {
    /// System Configuration (SYS_CFG)
    pub const MSR_SYS_CFG: u32 = 0xC001_0010;

    /// Hardware Configuration (HWCR)
    pub const MSR_HWCR: u32 = 0xC001_0015;

    /// CPUID Fn8000_000A EDX override (SVM feature identifiers)
    pub const MSR_CPUID_SVM_FEATURES: u32 = 0xC001_10DD;
}

/// SYS_CFG[SMEE]: secure memory encryption enable
pub const SYS_CFG_SMEE: u64 = 1 << 23;

/// HWCR[McStatusWrEn]: MCA status registers writable
pub const HWCR_MC_STATUS_WR_EN: u64 = 1 << 18;

/// HWCR[TscFreqSel]: TSC increments at the P0 frequency
pub const HWCR_TSC_FREQ_SEL: u64 = 1 << 24;

/// HWCR[CpbDis]: core performance boost disable
pub const HWCR_CPB_DIS: u64 = 1 << 25;

/// SVM feature: advanced virtual interrupt controller
pub const SVM_FEATURE_AVIC: u64 = 1 << 13;

/// SVM feature: x2APIC mode AVIC
pub const SVM_FEATURE_X2AVIC: u64 = 1 << 18;

/// Terminal address of an AP MSR sync list at the host table interface
pub const CPU_LIST_TERMINAL: u32 = 0xFFFF_FFFF;

/// Hardware Configuration register layout (subset programmed during init)
///
/// ## Register Format
///
/// | Bits | Field          | Description                       |
/// |------|----------------|-----------------------------------|
/// | 0    | smm_lock       | SMM code lock                     |
/// | 18   | mc_status_wr_en| MCA status write enable           |
/// | 24   | tsc_freq_sel   | TSC frequency select              |
/// | 25   | cpb_dis        | Core performance boost disable    |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hwcr {
    pub smm_lock: bool,
    pub mc_status_wr_en: bool,
    pub tsc_freq_sel: bool,
    pub cpb_dis: bool,
}

impl RegisterLayout for Hwcr {
    type Raw = u64;

    fn to_raw(&self) -> u64 {
        (if self.smm_lock { 1 } else { 0 })
            | (if self.mc_status_wr_en { HWCR_MC_STATUS_WR_EN } else { 0 })
            | (if self.tsc_freq_sel { HWCR_TSC_FREQ_SEL } else { 0 })
            | (if self.cpb_dis { HWCR_CPB_DIS } else { 0 })
    }

    fn from_raw(value: u64) -> Self {
        Self {
            smm_lock: (value & 1) != 0,
            mc_status_wr_en: (value & HWCR_MC_STATUS_WR_EN) != 0,
            tsc_freq_sel: (value & HWCR_TSC_FREQ_SEL) != 0,
            cpb_dis: (value & HWCR_CPB_DIS) != 0,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.smm_lock {
            return Err("SMM lock must not be set during core init");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hwcr_fields_map_to_ppr_bits() {
        let hwcr = Hwcr {
            tsc_freq_sel: true,
            cpb_dis: true,
            ..Default::default()
        };

        assert_eq!(hwcr.to_raw(), (1 << 24) | (1 << 25));
        assert!(Hwcr::from_raw(1 << 18).mc_status_wr_en);
        assert!(hwcr.validate().is_ok());
    }

    #[test]
    fn test_hwcr_smm_lock_is_rejected() {
        let hwcr = Hwcr::from_raw(1);
        assert!(hwcr.validate().is_err());
    }
}
