//! Core complex MSR definitions for Zen4

/// Decode Configuration (DE_CFG)
pub const MSR_DE_CFG: u32 = 0xC001_1029;

/// DE_CFG[LfenceSerializing]: LFENCE is dispatch serializing
pub const DE_CFG_LFENCE_SERIALIZING: u64 = 1 << 1;

/// Load-Store Configuration (LS_CFG)
pub const MSR_LS_CFG: u32 = 0xC001_1020;

/// Instruction Cache Configuration (IC_CFG)
pub const MSR_IC_CFG: u32 = 0xC001_1021;

/// Combined Unit Configuration 3 (CU_CFG3)
pub const MSR_CU_CFG3: u32 = 0xC001_102B;

/// MSRs whose BSP values are replayed on every AP, with the bits that are synchronized
pub static AP_MSR_SYNC_LIST: [(u32, u64); 4] = [
    (MSR_LS_CFG, 0xFFFF_FFFF_FFFF_FFFF),
    (MSR_IC_CFG, 0xFFFF_FFFF_FFFF_FFFF),
    (MSR_DE_CFG, DE_CFG_LFENCE_SERIALIZING),
    (MSR_CU_CFG3, 0xFFFF_FFFF_FFFF_FFFF),
];
