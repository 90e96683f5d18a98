//! Test doubles shared by the unit tests

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use silinit_raw::current_arch::df::{
    DEFAULT_HWA_MASK_LOW, DF_GLOBAL_CTRL, HARDWARE_ASSERT_MASK_LOW, HARDWARE_ASSERT_STATUS_LOW,
};
use silinit_raw::{
    ComponentLocation, DeviceId, DeviceMap, FabricDeviceType, FabricInstance, FabricRegister,
};

use crate::ccx::zen4::CcxXferZen4;
use crate::common::{FabricAccess, MsrAccess, PciAddress, PciConfigAccess};
use crate::config::CcxInputBlock;
use crate::df::register_acc::DieDeviceLookup;
use crate::dispatch::{
    CcxXfer, ComponentLocationMap, DfXfer, DispatchError, OpResult, PieRasRegisters,
    SiliconGeneration, XferSource,
};

/// Leak a vector into a `'static` slice, as the static tables are
pub fn leak<T>(items: Vec<T>) -> &'static [T] {
    Box::leak(items.into_boxed_slice())
}

/// Device map of `count` nodes with fabric/instance IDs `base..base + count`
pub fn device_map(device_type: FabricDeviceType, base: u32, count: u32) -> DeviceMap {
    let ids = (base..base + count)
        .map(|id| DeviceId::new(id, id))
        .collect();
    DeviceMap::new(device_type, leak(ids))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricOp {
    Read {
        socket: u32,
        register: FabricRegister,
        instance: FabricInstance,
    },
    Write {
        socket: u32,
        register: FabricRegister,
        instance: FabricInstance,
        value: u32,
    },
}

/// Fabric transport recording every access
///
/// Reads consume scripted values first (per register and instance, any
/// socket), then fall back to the last value set or written.
#[derive(Default)]
pub struct RecordingFabric {
    values: Mutex<HashMap<(u32, FabricRegister, FabricInstance), u32>>,
    scripted: Mutex<HashMap<(FabricRegister, FabricInstance), VecDeque<u32>>>,
    ops: Mutex<Vec<FabricOp>>,
}

impl RecordingFabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, socket: u32, register: FabricRegister, instance: FabricInstance, value: u32) {
        self.values
            .lock()
            .insert((socket, register, instance), value);
    }

    pub fn script(
        &self,
        register: FabricRegister,
        instance: FabricInstance,
        values: impl IntoIterator<Item = u32>,
    ) {
        self.scripted
            .lock()
            .entry((register, instance))
            .or_default()
            .extend(values);
    }

    pub fn ops(&self) -> Vec<FabricOp> {
        self.ops.lock().clone()
    }

    pub fn writes(&self) -> Vec<FabricOp> {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, FabricOp::Write { .. }))
            .copied()
            .collect()
    }

    pub fn reads_of(&self, register: FabricRegister) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, FabricOp::Read { register: r, .. } if *r == register))
            .count()
    }
}

impl FabricAccess for RecordingFabric {
    fn read(&self, socket: u32, register: FabricRegister, instance: FabricInstance) -> u32 {
        self.ops.lock().push(FabricOp::Read {
            socket,
            register,
            instance,
        });
        if let Some(value) = self
            .scripted
            .lock()
            .get_mut(&(register, instance))
            .and_then(VecDeque::pop_front)
        {
            return value;
        }
        self.values
            .lock()
            .get(&(socket, register, instance))
            .copied()
            .unwrap_or(0)
    }

    fn write(&self, socket: u32, register: FabricRegister, instance: FabricInstance, value: u32) {
        self.ops.lock().push(FabricOp::Write {
            socket,
            register,
            instance,
            value,
        });
        self.values
            .lock()
            .insert((socket, register, instance), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsrOp {
    Read(u32),
    Write(u32, u64),
}

/// MSR transport recording every access
#[derive(Default)]
pub struct RecordingMsr {
    values: Mutex<HashMap<u32, u64>>,
    ops: Mutex<Vec<MsrOp>>,
}

impl RecordingMsr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, addr: u32, value: u64) {
        self.values.lock().insert(addr, value);
    }

    pub fn value(&self, addr: u32) -> u64 {
        self.values.lock().get(&addr).copied().unwrap_or(0)
    }

    pub fn ops(&self) -> Vec<MsrOp> {
        self.ops.lock().clone()
    }

    pub fn writes(&self) -> Vec<(u32, u64)> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                MsrOp::Write(addr, value) => Some((*addr, *value)),
                MsrOp::Read(_) => None,
            })
            .collect()
    }
}

impl MsrAccess for RecordingMsr {
    fn read_msr(&self, addr: u32) -> u64 {
        self.ops.lock().push(MsrOp::Read(addr));
        self.value(addr)
    }

    fn write_msr(&self, addr: u32, value: u64) {
        self.ops.lock().push(MsrOp::Write(addr, value));
        self.set(addr, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PciOp {
    Read(PciAddress),
    Write(PciAddress, u32),
}

/// PCI configuration transport recording every access
#[derive(Default)]
pub struct RecordingPci {
    values: Mutex<HashMap<PciAddress, u32>>,
    ops: Mutex<Vec<PciOp>>,
}

impl RecordingPci {
    pub fn set(&self, addr: PciAddress, value: u32) {
        self.values.lock().insert(addr, value);
    }

    pub fn ops(&self) -> Vec<PciOp> {
        self.ops.lock().clone()
    }
}

impl PciConfigAccess for RecordingPci {
    fn read_pci_config32(&self, addr: PciAddress) -> u32 {
        self.ops.lock().push(PciOp::Read(addr));
        self.values.lock().get(&addr).copied().unwrap_or(0)
    }

    fn write_pci_config32(&self, addr: PciAddress, value: u32) {
        self.ops.lock().push(PciOp::Write(addr, value));
        self.values.lock().insert(addr, value);
    }
}

/// Die lookup counting how often it is consulted
#[derive(Default)]
pub struct CountingDieLookup {
    calls: AtomicUsize,
}

impl CountingDieLookup {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DieDeviceLookup for CountingDieLookup {
    fn device_number_of_die(&self, socket: u32) -> u32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        0x18 + socket
    }
}

/// DF table answering topology primitives from plain fields
pub struct ScriptedDfXfer {
    pub processors: u32,
    pub dies: u32,
    pub root_bridges: u32,
    pub bus_base: u32,
    pub bus_limit: u32,
    pub phys_root_bridge: u32,
    /// `die_system_offset(socket) = socket * socket_offset`
    pub socket_offset: u32,
    pub device_maps: &'static [DeviceMap],
    pub locations: &'static [ComponentLocation],
    pub phys_ios0_fabric_id: u32,
    pub ras: Option<PieRasRegisters>,
    pub(crate) calls: Mutex<Vec<&'static str>>,
}

impl ScriptedDfXfer {
    /// One socket, one die, four IOS nodes at 0x20..0x24
    pub fn new() -> Self {
        Self {
            processors: 1,
            dies: 1,
            root_bridges: 4,
            bus_base: 0,
            bus_limit: 0,
            phys_root_bridge: 0,
            socket_offset: 0x100,
            device_maps: leak(vec![device_map(FabricDeviceType::Ios, 0x20, 4)]),
            locations: &[],
            phys_ios0_fabric_id: 0x20,
            ras: Some(PieRasRegisters {
                hwa_status_low: HARDWARE_ASSERT_STATUS_LOW,
                hwa_mask_low: HARDWARE_ASSERT_MASK_LOW,
                hwa_mask_low_default: DEFAULT_HWA_MASK_LOW,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_device_maps(mut self, maps: Vec<DeviceMap>) -> Self {
        self.device_maps = leak(maps);
        self
    }

    pub fn with_locations(mut self, locations: Vec<ComponentLocation>) -> Self {
        self.locations = leak(locations);
        self
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }
}

impl DfXfer for ScriptedDfXfer {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen4
    }

    fn number_of_processors_present(&self, _fabric: &dyn FabricAccess) -> OpResult<u32> {
        self.record("number_of_processors_present");
        Ok(self.processors)
    }

    fn number_of_dies_on_socket(&self, _socket: u32) -> OpResult<u32> {
        self.record("number_of_dies_on_socket");
        Ok(self.dies)
    }

    fn number_of_root_bridges_on_die(&self, _socket: u32) -> OpResult<u32> {
        self.record("number_of_root_bridges_on_die");
        Ok(self.root_bridges)
    }

    fn host_bridge_bus_base(
        &self,
        _fabric: &dyn FabricAccess,
        _socket: u32,
        _index: u32,
    ) -> OpResult<u32> {
        self.record("host_bridge_bus_base");
        Ok(self.bus_base)
    }

    fn host_bridge_bus_limit(
        &self,
        _fabric: &dyn FabricAccess,
        _socket: u32,
        _index: u32,
    ) -> OpResult<u32> {
        self.record("host_bridge_bus_limit");
        Ok(self.bus_limit)
    }

    fn phys_root_bridge_number(&self, _index: u32) -> OpResult<u32> {
        self.record("phys_root_bridge_number");
        Ok(self.phys_root_bridge)
    }

    fn die_system_offset(&self, _fabric: &dyn FabricAccess, socket: u32) -> OpResult<u32> {
        self.record("die_system_offset");
        Ok(socket * self.socket_offset)
    }

    fn device_number_of_die(&self, socket: u32) -> OpResult<u32> {
        self.record("device_number_of_die");
        Ok(0x18 + socket)
    }

    fn get_device_map_on_die(&self) -> OpResult<&'static [DeviceMap]> {
        self.record("get_device_map_on_die");
        Ok(self.device_maps)
    }

    fn find_component_location_map(
        &self,
        _fabric: &dyn FabricAccess,
        want_count: bool,
        want_phys_ios0: bool,
    ) -> OpResult<ComponentLocationMap> {
        self.record("find_component_location_map");
        Ok(ComponentLocationMap {
            locations: self.locations,
            count: want_count.then_some(self.locations.len() as u32),
            phys_ios0_fabric_id: want_phys_ios0.then_some(self.phys_ios0_fabric_id),
        })
    }

    fn pie_ras_registers(&self) -> OpResult<PieRasRegisters> {
        self.record("pie_ras_registers");
        self.ras
            .ok_or(crate::dispatch::NotSupported("pie_ras_registers"))
    }

    fn program_fabric_watchdog(
        &self,
        fabric: &dyn FabricAccess,
        socket: u32,
        wdt_cnt_sel: u8,
    ) -> OpResult<()> {
        self.record("program_fabric_watchdog");
        let current = fabric.read(socket, DF_GLOBAL_CTRL, FabricInstance::Broadcast);
        fabric.write(
            socket,
            DF_GLOBAL_CTRL,
            FabricInstance::Broadcast,
            (current & !(0x7 << 24)) | ((wdt_cnt_sel as u32) << 24),
        );
        Ok(())
    }
}

/// CCX table delegating to the Zen4 implementation while recording calls
#[derive(Default)]
pub struct ScriptedCcxXfer {
    pub(crate) calls: Mutex<Vec<&'static str>>,
}

impl ScriptedCcxXfer {
    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }
}

impl CcxXfer for ScriptedCcxXfer {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen4
    }

    fn enable_smee(&self, msr: &dyn MsrAccess, enable: bool) -> OpResult<()> {
        self.calls.lock().push("enable_smee");
        CcxXferZen4.enable_smee(msr, enable)
    }

    fn enable_cpb(&self, msr: &dyn MsrAccess, enable: u8) -> OpResult<()> {
        self.calls.lock().push("enable_cpb");
        CcxXferZen4.enable_cpb(msr, enable)
    }

    fn set_misc_msrs(&self, msr: &dyn MsrAccess, input: &CcxInputBlock) -> OpResult<()> {
        self.calls.lock().push("set_misc_msrs");
        CcxXferZen4.set_misc_msrs(msr, input)
    }

    fn ap_msr_sync_list(&self) -> OpResult<&'static [(u32, u64)]> {
        self.calls.lock().push("ap_msr_sync_list");
        CcxXferZen4.ap_msr_sync_list()
    }
}

/// Tables leaving every slot unset
pub struct BareXfer;

impl DfXfer for BareXfer {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen5
    }
}

impl CcxXfer for BareXfer {
    fn generation(&self) -> SiliconGeneration {
        SiliconGeneration::Zen5
    }
}

/// Table source returning fixed tables or a fixed failure status
pub struct MockXferSource {
    df: Option<Arc<dyn DfXfer>>,
    ccx: Option<Arc<dyn CcxXfer>>,
    status: Option<DispatchError>,
    resolutions: AtomicUsize,
}

impl MockXferSource {
    pub fn new(df: Option<Arc<dyn DfXfer>>, ccx: Option<Arc<dyn CcxXfer>>) -> Self {
        Self {
            df,
            ccx,
            status: None,
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn with_df(df: Arc<dyn DfXfer>) -> Self {
        Self::new(Some(df), None)
    }

    pub fn with_ccx(ccx: Arc<dyn CcxXfer>) -> Self {
        Self::new(None, Some(ccx))
    }

    pub fn failing(status: DispatchError) -> Self {
        Self {
            status: Some(status),
            ..Self::new(None, None)
        }
    }

    /// Number of table lookups served so far
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl XferSource for MockXferSource {
    fn df_xfer(&self) -> Result<Arc<dyn DfXfer>, DispatchError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.status {
            return Err(status);
        }
        self.df.clone().ok_or(DispatchError::Aborted)
    }

    fn ccx_xfer(&self) -> Result<Arc<dyn CcxXfer>, DispatchError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.status {
            return Err(status);
        }
        self.ccx.clone().ok_or(DispatchError::Aborted)
    }
}
