// One silicon initialization pass over every present socket

use serde::Serialize;

use crate::ccx::{
    ccx_enable_smee, ccx_initialize_cpb, ccx_prepare_ap_launch_data, ccx_set_misc_msrs, Outcome,
};
use crate::config::BootConfig;
use crate::context::SilContext;
use crate::df::{
    df_find_component_location_map, df_get_number_of_system_dies, df_get_root_bridge_info,
    fabric_pie_ras_init, RasSweepSummary, RootBridgeInfo, RootBridgeQuery,
};
use crate::dispatch::SiliconGeneration;
use crate::error::{Result, SilError};

#[derive(Debug, Clone, Serialize)]
pub struct RootBridgeEntry {
    pub socket: u32,
    pub die: u32,
    pub index: u32,
    #[serde(flatten)]
    pub info: RootBridgeInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct CcxReport {
    pub smee: Outcome,
    pub cpb: Outcome,
    pub misc_msrs: Outcome,
    /// Entries in the AP MSR sync list captured on the BSP
    pub ap_sync_entries: Option<usize>,
}

/// Everything a boot pass resolved and programmed
#[derive(Debug, Clone, Serialize)]
pub struct BootReport {
    pub generation: SiliconGeneration,
    pub system_dies: Option<u32>,
    pub phys_ios0_fabric_id: Option<u32>,
    pub root_bridges: Vec<RootBridgeEntry>,
    pub ras: RasSweepSummary,
    pub ccx: CcxReport,
}

/// Table missing or slot unset: the step is skipped, not failed
fn is_degraded(e: &SilError) -> bool {
    matches!(e, SilError::Unavailable(_) | SilError::NotSupported(_))
}

/// Runs topology discovery, PIE RAS init and CCX configuration in order
pub struct BootPass {
    config: BootConfig,
}

impl BootPass {
    pub fn new(config: BootConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    pub fn run(&self, ctx: &SilContext) -> Result<BootReport> {
        let span = tracing::info_span!("boot_pass", generation = %self.config.generation);
        let _enter = span.enter();

        self.config.df.validate()?;
        tracing::info!("Starting boot pass");

        let mut report = BootReport {
            generation: self.config.generation,
            system_dies: None,
            phys_ios0_fabric_id: None,
            root_bridges: Vec::new(),
            ras: RasSweepSummary::default(),
            ccx: CcxReport {
                smee: Outcome::Unavailable,
                cpb: Outcome::Unavailable,
                misc_msrs: Outcome::Unavailable,
                ap_sync_entries: None,
            },
        };

        match self.discover_topology(ctx, &mut report) {
            Ok(()) => {}
            Err(e) if is_degraded(&e) => tracing::warn!("Topology discovery skipped: {}", e),
            Err(e) => return Err(e),
        }

        report.ras = fabric_pie_ras_init(ctx, &self.config.df)?;

        let ccx = &self.config.ccx;
        report.ccx = CcxReport {
            smee: ccx_enable_smee(ctx, ccx.enable_smee),
            cpb: ccx_initialize_cpb(ctx, ccx.cpb_enable),
            misc_msrs: ccx_set_misc_msrs(ctx, ccx),
            ap_sync_entries: ccx_prepare_ap_launch_data(ctx)
                .map(|data| data.ap_msr_sync_list.len()),
        };

        tracing::info!(
            "Boot pass complete: {} root bridge(s), {} corrective RAS write(s)",
            report.root_bridges.len(),
            report.ras.corrective_writes
        );
        Ok(report)
    }

    fn discover_topology(&self, ctx: &SilContext, report: &mut BootReport) -> Result<()> {
        report.system_dies = Some(df_get_number_of_system_dies(ctx)?);
        report.phys_ios0_fabric_id =
            df_find_component_location_map(ctx, false, true)?.phys_ios0_fabric_id;

        let df = ctx.xfer.df_xfer()?;
        let sockets = df.number_of_processors_present(ctx.fabric)?;
        for socket in 0..sockets {
            let dies = df.number_of_dies_on_socket(socket)?;
            let bridges = df.number_of_root_bridges_on_die(socket)?;
            for die in 0..dies {
                for index in 0..bridges {
                    let info =
                        df_get_root_bridge_info(ctx, socket, die, index, RootBridgeQuery::all())?;
                    report.root_bridges.push(RootBridgeEntry {
                        socket,
                        die,
                        index,
                        info,
                    });
                }
            }
        }
        Ok(())
    }
}
