//! Data fabric register access over PCI configuration space
//!
//! Broadcast accesses go straight to the socket's DF device. Instance
//! accesses program FICAA3 with the target register and instance, then move
//! the data through FICAD3_LO on the DF device of the die.

use silinit_raw::current_arch::df::{
    FabricIndirectConfigAccessAddress, DF_PCI_DEVICE_BASE, FICAA3, FICAD3_LO,
};
use silinit_raw::{FabricInstance, FabricRegister, RegisterLayout};

use crate::common::{FabricAccess, PciAddress, PciConfigAccess};
use crate::dispatch::XferSource;

/// PCI device number of the DF serving a socket's die
pub trait DieDeviceLookup {
    fn device_number_of_die(&self, socket: u32) -> u32;
}

impl<T: DieDeviceLookup + ?Sized> DieDeviceLookup for &T {
    fn device_number_of_die(&self, socket: u32) -> u32 {
        (**self).device_number_of_die(socket)
    }
}

/// Die device numbers taken from the installed DF operation table
///
/// The table is resolved on every lookup. Without a table, or with the slot
/// unset, the socket's broadcast device is used.
#[derive(Clone, Copy)]
pub struct XferDieDevices<'a> {
    xfer: &'a dyn XferSource,
}

impl<'a> XferDieDevices<'a> {
    pub fn new(xfer: &'a dyn XferSource) -> Self {
        Self { xfer }
    }
}

impl DieDeviceLookup for XferDieDevices<'_> {
    fn device_number_of_die(&self, socket: u32) -> u32 {
        let fallback = DF_PCI_DEVICE_BASE + socket;
        let df = match self.xfer.df_xfer() {
            Ok(df) => df,
            Err(e) => {
                tracing::warn!(
                    "DF device of socket {}: operation table unavailable: {}, using 0x{:x}",
                    socket,
                    e,
                    fallback
                );
                return fallback;
            }
        };
        crate::slot_or!(df.device_number_of_die(socket), fallback)
    }
}

/// PCI configuration address of `register` on DF device `device`
pub fn df_config_address(device: u32, register: FabricRegister) -> PciAddress {
    PciAddress::new(0, 0, device as u8, register.function, register.offset)
}

pub struct IndirectFabricAccess<P, D> {
    pci: P,
    dies: D,
}

impl<P: PciConfigAccess, D: DieDeviceLookup> IndirectFabricAccess<P, D> {
    pub fn new(pci: P, dies: D) -> Self {
        Self { pci, dies }
    }

    fn broadcast_address(socket: u32, register: FabricRegister) -> PciAddress {
        df_config_address(DF_PCI_DEVICE_BASE + socket, register)
    }

    /// Point FICAA3 of `device` at `register` on instance `id`
    fn select_instance(&self, device: u32, register: FabricRegister, id: u8) {
        let ficaa =
            FabricIndirectConfigAccessAddress::for_register(register, FabricInstance::Instance(id));
        self.pci
            .write_pci_config32(df_config_address(device, FICAA3), ficaa.to_raw());
    }
}

impl<P: PciConfigAccess, D: DieDeviceLookup> FabricAccess for IndirectFabricAccess<P, D> {
    fn read(&self, socket: u32, register: FabricRegister, instance: FabricInstance) -> u32 {
        match instance {
            FabricInstance::Broadcast => {
                let value = self
                    .pci
                    .read_pci_config32(Self::broadcast_address(socket, register));
                tracing::debug!(
                    "DF read: socket {} {} BC = 0x{:08x}",
                    socket,
                    register,
                    value
                );
                value
            }
            FabricInstance::Instance(id) => {
                let device = self.dies.device_number_of_die(socket);
                self.select_instance(device, register, id);
                let value = self
                    .pci
                    .read_pci_config32(df_config_address(device, FICAD3_LO));
                tracing::debug!(
                    "DF read: socket {} {} {} = 0x{:08x}",
                    socket,
                    register,
                    instance,
                    value
                );
                value
            }
        }
    }

    fn write(&self, socket: u32, register: FabricRegister, instance: FabricInstance, value: u32) {
        tracing::debug!(
            "DF write: socket {} {} {} <- 0x{:08x}",
            socket,
            register,
            instance,
            value
        );
        match instance {
            FabricInstance::Broadcast => {
                self.pci
                    .write_pci_config32(Self::broadcast_address(socket, register), value);
            }
            FabricInstance::Instance(id) => {
                let device = self.dies.device_number_of_die(socket);
                self.select_instance(device, register, id);
                self.pci
                    .write_pci_config32(df_config_address(device, FICAD3_LO), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::mock::{
        BareXfer, CountingDieLookup, MockXferSource, PciOp, RecordingPci, ScriptedDfXfer,
    };
    use crate::dispatch::DispatchError;
    use std::sync::Arc;
    use silinit_raw::current_arch::df::{HARDWARE_ASSERT_STATUS_LOW, SYSTEM_CFG};

    #[test]
    fn test_broadcast_read_skips_die_lookup() {
        let pci = RecordingPci::default();
        pci.set(df_config_address(0x19, SYSTEM_CFG), 0x1000);
        let dies = CountingDieLookup::default();
        let fabric = IndirectFabricAccess::new(&pci, &dies);

        assert_eq!(fabric.read(1, SYSTEM_CFG, FabricInstance::Broadcast), 0x1000);
        assert_eq!(dies.calls(), 0);
        assert_eq!(
            pci.ops(),
            vec![PciOp::Read(PciAddress::new(0, 0, 0x19, 1, 0x200))]
        );
    }

    #[test]
    fn test_instance_read_uses_indirect_pair() {
        let pci = RecordingPci::default();
        pci.set(df_config_address(0x18, FICAD3_LO), 0x4);
        let dies = CountingDieLookup::default();
        let fabric = IndirectFabricAccess::new(&pci, &dies);

        let value = fabric.read(
            0,
            HARDWARE_ASSERT_STATUS_LOW,
            FabricInstance::Instance(0x21),
        );

        assert_eq!(value, 0x4);
        assert_eq!(dies.calls(), 1);

        let ops = pci.ops();
        assert_eq!(ops.len(), 2);
        match ops[0] {
            PciOp::Write(addr, raw) => {
                assert_eq!(addr, PciAddress::new(0, 0, 0x18, 4, 0x5C));
                let ficaa = FabricIndirectConfigAccessAddress::from_raw(raw);
                assert!(ficaa.cfg_reg_inst_acc_en);
                assert_eq!(ficaa.cfg_reg_inst_id, 0x21);
                assert_eq!(ficaa.register(), HARDWARE_ASSERT_STATUS_LOW);
            }
            other => panic!("expected FICAA write, got {other:?}"),
        }
        assert_eq!(ops[1], PciOp::Read(PciAddress::new(0, 0, 0x18, 4, 0x98)));
    }

    #[test]
    fn test_instance_write_goes_through_ficad() {
        let pci = RecordingPci::default();
        let dies = CountingDieLookup::default();
        let fabric = IndirectFabricAccess::new(&pci, &dies);

        fabric.write(
            1,
            HARDWARE_ASSERT_STATUS_LOW,
            FabricInstance::Instance(0x20),
            0x3,
        );

        assert_eq!(dies.calls(), 1);
        let ops = pci.ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[1],
            PciOp::Write(PciAddress::new(0, 0, 0x19, 4, 0x98), 0x3)
        );
    }

    #[test]
    fn test_die_devices_resolve_table_on_every_lookup() {
        let df = Arc::new(ScriptedDfXfer::new());
        let source = MockXferSource::with_df(df.clone());
        let pci = RecordingPci::default();
        let fabric = IndirectFabricAccess::new(&pci, XferDieDevices::new(&source));

        fabric.read(1, HARDWARE_ASSERT_STATUS_LOW, FabricInstance::Instance(0x21));
        fabric.write(1, HARDWARE_ASSERT_STATUS_LOW, FabricInstance::Instance(0x21), 0x1);
        fabric.read(1, SYSTEM_CFG, FabricInstance::Broadcast);

        assert_eq!(source.resolutions(), 2);
        assert_eq!(df.calls_to("device_number_of_die"), 2);
        assert_eq!(
            pci.ops()[1],
            PciOp::Read(PciAddress::new(0, 0, 0x19, 4, 0x98))
        );
    }

    #[test]
    fn test_die_devices_fall_back_to_broadcast_device() {
        let source = MockXferSource::failing(DispatchError::NotInstalled);
        let dies = XferDieDevices::new(&source);
        assert_eq!(dies.device_number_of_die(1), 0x19);
        assert_eq!(source.resolutions(), 1);

        let bare = MockXferSource::with_df(Arc::new(BareXfer));
        let dies = XferDieDevices::new(&bare);
        assert_eq!(dies.device_number_of_die(0), 0x18);
    }
}
