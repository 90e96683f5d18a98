//! Core complex MSR configuration
//!
//! Every entry point resolves the CCX operation table when called and turns
//! into a no-op when the table is unavailable or the generation leaves the
//! operation unset. None of them keep state between calls.

pub mod zen4;

use serde::Serialize;

use silinit_raw::ccx::msr::MSR_CPUID_SVM_FEATURES;
use silinit_raw::ccx::{CPU_LIST_TERMINAL, SVM_FEATURE_AVIC, SVM_FEATURE_X2AVIC};

use crate::config::CcxInputBlock;
use crate::context::SilContext;

pub use zen4::CcxXferZen4;

/// What a CCX entry point ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Another thread of the compute unit owns the register
    NotPrimary,
    NotSupported,
    Unavailable,
}

/// An MSR whose BSP value is replayed on the APs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApMsrSyncEntry {
    pub msr_addr: u32,
    pub data: u64,
    /// Bits of `data` that are synchronized
    pub mask: u64,
}

/// Data the BSP hands to every AP it launches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApLaunchGlobalData {
    pub ap_msr_sync_list: Vec<ApMsrSyncEntry>,
}

impl ApLaunchGlobalData {
    /// Build from a host table, stopping at the first `CPU_LIST_TERMINAL` address
    pub fn from_raw_terminated(raw: &[ApMsrSyncEntry]) -> Self {
        Self {
            ap_msr_sync_list: raw
                .iter()
                .take_while(|entry| entry.msr_addr != CPU_LIST_TERMINAL)
                .copied()
                .collect(),
        }
    }

    /// Entries for a generation's `(address, mask)` list, data not yet captured
    pub fn from_sync_list(list: &[(u32, u64)]) -> Self {
        Self {
            ap_msr_sync_list: list
                .iter()
                .map(|&(msr_addr, mask)| ApMsrSyncEntry {
                    msr_addr,
                    data: 0,
                    mask,
                })
                .collect(),
        }
    }

    fn entries(&self) -> impl Iterator<Item = &ApMsrSyncEntry> {
        self.ap_msr_sync_list
            .iter()
            .take_while(|entry| entry.msr_addr != CPU_LIST_TERMINAL)
    }
}

/// Set or clear secure memory encryption on the executing core
pub fn ccx_enable_smee(ctx: &SilContext, enable: bool) -> Outcome {
    if !ctx.roles.is_compute_unit_primary() {
        return Outcome::NotPrimary;
    }
    let ccx = crate::resolve_xfer!(ctx, ccx_xfer, "ccx_enable_smee", return Outcome::Unavailable);
    crate::slot_or!(ccx.enable_smee(ctx.msr, enable), return Outcome::NotSupported);

    tracing::debug!("SMEE {}", if enable { "enabled" } else { "disabled" });
    Outcome::Applied
}

/// Enable core performance boost when `enable` is nonzero, disable it otherwise
pub fn ccx_initialize_cpb(ctx: &SilContext, enable: u8) -> Outcome {
    if !ctx.roles.is_compute_unit_primary() {
        return Outcome::NotPrimary;
    }
    let ccx = crate::resolve_xfer!(ctx, ccx_xfer, "ccx_initialize_cpb", return Outcome::Unavailable);
    crate::slot_or!(ccx.enable_cpb(ctx.msr, enable), return Outcome::NotSupported);

    tracing::debug!("Core performance boost enable = {}", enable);
    Outcome::Applied
}

/// Program the generation's miscellaneous MSRs, plus the AVIC group if asked
pub fn ccx_set_misc_msrs(ctx: &SilContext, input: &CcxInputBlock) -> Outcome {
    let ccx = crate::resolve_xfer!(ctx, ccx_xfer, "ccx_set_misc_msrs", return Outcome::Unavailable);
    crate::slot_or!(ccx.set_misc_msrs(ctx.msr, input), return Outcome::NotSupported);

    if input.enable_svm_avic {
        let mut features = SVM_FEATURE_AVIC;
        if input.enable_svm_x2avic {
            features |= SVM_FEATURE_X2AVIC;
        }
        ctx.msr.msr_or(MSR_CPUID_SVM_FEATURES, features);
        tracing::debug!("SVM AVIC advertised (x2AVIC: {})", input.enable_svm_x2avic);
    }
    Outcome::Applied
}

/// Replay the captured BSP MSR values on the executing AP
pub fn ccx_sync_misc_msrs(ctx: &SilContext, data: &ApLaunchGlobalData) -> Outcome {
    let _ccx = crate::resolve_xfer!(ctx, ccx_xfer, "ccx_sync_misc_msrs", return Outcome::Unavailable);

    let mut synced = 0;
    for entry in data.entries() {
        ctx.msr
            .msr_and_then_or(entry.msr_addr, !entry.mask, entry.data & entry.mask);
        synced += 1;
    }
    tracing::debug!("Synchronized {} MSR(s)", synced);
    Outcome::Applied
}

/// Fill `data` from the executing BSP's current MSR values
pub fn ccx_capture_misc_msrs(ctx: &SilContext, data: &mut ApLaunchGlobalData) -> Outcome {
    let _ccx =
        crate::resolve_xfer!(ctx, ccx_xfer, "ccx_capture_misc_msrs", return Outcome::Unavailable);

    for entry in data
        .ap_msr_sync_list
        .iter_mut()
        .take_while(|entry| entry.msr_addr != CPU_LIST_TERMINAL)
    {
        entry.data = ctx.msr.read_msr(entry.msr_addr);
    }
    Outcome::Applied
}

/// The AP launch data for the installed generation, captured on this thread
pub fn ccx_prepare_ap_launch_data(ctx: &SilContext) -> Option<ApLaunchGlobalData> {
    let ccx = crate::resolve_xfer!(ctx, ccx_xfer, "ccx_prepare_ap_launch_data", return None);
    let list = crate::slot_or!(ccx.ap_msr_sync_list(), return None);

    let mut data = ApLaunchGlobalData::from_sync_list(list);
    ccx_capture_misc_msrs(ctx, &mut data);
    Some(data)
}
