//! PIE RAS initialization sweep
//!
//! Runs in two phases. The die sweep clears latched hardware asserts,
//! programs the assert mask and optionally the fabric watchdog on every die
//! in ascending socket then die order. The instance walk then checks each
//! fabric instance the host listed and clears whatever is still asserted.

use serde::Serialize;

use silinit_raw::current_arch::df::HardwareAssertStatusLow;
use silinit_raw::{FabricInstance, RegisterLayout, FABRIC_REG_ACC_BC};

use crate::config::{DfInputBlock, INSTANCE_LIST_TERMINAL};
use crate::context::SilContext;
use crate::dispatch::PieRasRegisters;
use crate::error::{Result, SilError};

/// Fabric instances whose RAS status is checked after the die sweep
///
/// Holds an explicit-length list; an empty list means no work. The
/// terminated form only exists at the host table interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasControlInstanceList {
    ids: Vec<u8>,
}

impl RasControlInstanceList {
    /// Build from a host table, stopping at the first `0xFFFFFFFF`
    pub fn from_raw_terminated(raw: &[u32]) -> Result<Self> {
        let ids = raw
            .iter()
            .take_while(|id| **id != INSTANCE_LIST_TERMINAL)
            .map(|&id| match FabricInstance::try_from(id) {
                Ok(FabricInstance::Instance(inst)) => Ok(inst),
                _ => Err(SilError::out_of_range(
                    "glbl_ctrl_instance_id",
                    id,
                    FABRIC_REG_ACC_BC as u32,
                )),
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Self { ids })
    }

    pub fn iter(&self) -> impl Iterator<Item = FabricInstance> + '_ {
        self.ids.iter().map(|&id| FabricInstance::Instance(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What one sweep touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RasSweepSummary {
    pub dies_visited: u32,
    pub hwa_cleared: u32,
    pub wdt_programmed: u32,
    pub instances_visited: u32,
    pub corrective_writes: u32,
}

/// Initialize PIE RAS on every present die, then walk the control instances
///
/// Input errors are reported before any register is touched. A missing DF
/// table degrades to an empty summary.
pub fn fabric_pie_ras_init(ctx: &SilContext, input: &DfInputBlock) -> Result<RasSweepSummary> {
    input.validate()?;
    let instances = RasControlInstanceList::from_raw_terminated(&input.glbl_ctrl_instance_ids)?;
    let wdt_cnt_sel = input.wdt_cnt_sel();

    let mut summary = RasSweepSummary::default();
    let df = crate::resolve_xfer!(ctx, df_xfer, "fabric_pie_ras_init", return Ok(summary));
    let ras = crate::slot_or!(df.pie_ras_registers().map(Some), None);

    let sockets = crate::slot_or!(df.number_of_processors_present(ctx.fabric), return Ok(summary));
    for socket in 0..sockets {
        let dies = crate::slot_or!(df.number_of_dies_on_socket(socket), continue);
        for die in 0..dies {
            summary.dies_visited += 1;

            if let Some(regs) = &ras {
                if clear_die_asserts(ctx, socket, regs) {
                    summary.hwa_cleared += 1;
                }
            }

            if let Some(sel) = wdt_cnt_sel {
                if df.program_fabric_watchdog(ctx.fabric, socket, sel).is_ok() {
                    summary.wdt_programmed += 1;
                }
            }

            tracing::debug!("PIE RAS init done on socket {} die {}", socket, die);
        }
    }

    if let Some(regs) = &ras {
        for instance in instances.iter() {
            summary.instances_visited += 1;
            let status =
                HardwareAssertStatusLow::from_raw(ctx.fabric.read(0, regs.hwa_status_low, instance));
            if status.any_asserted() {
                tracing::warn!(
                    "Hardware assert 0x{:08x} latched on {}, clearing",
                    status.asserted,
                    instance
                );
                ctx.fabric
                    .write(0, regs.hwa_status_low, instance, status.to_raw());
                summary.corrective_writes += 1;
            }
        }
    } else if !instances.is_empty() {
        tracing::debug!("No PIE RAS registers, {} instance(s) skipped", instances.len());
    }

    tracing::info!(
        "PIE RAS init: {} die(s), {} instance(s), {} corrective write(s)",
        summary.dies_visited,
        summary.instances_visited,
        summary.corrective_writes
    );
    Ok(summary)
}

/// Clear latched asserts and program the default mask; true if any were latched
fn clear_die_asserts(ctx: &SilContext, socket: u32, regs: &PieRasRegisters) -> bool {
    let bc = FabricInstance::Broadcast;
    let raw = ctx.fabric.read(socket, regs.hwa_status_low, bc);
    let status = HardwareAssertStatusLow::from_raw(raw);
    if status.any_asserted() {
        ctx.fabric
            .write(socket, regs.hwa_status_low, bc, status.to_raw());
    }
    ctx.fabric
        .write(socket, regs.hwa_mask_low, bc, regs.hwa_mask_low_default);
    status.any_asserted()
}
