//! Register transport capabilities consumed by the initialization code
//!
//! Hardware access is injected: the host supplies MSR and PCI configuration
//! access, and fabric access is layered on top of PCI (see
//! [`crate::df::register_acc`]). Transports are trusted to complete; they
//! report no errors at this layer.

use serde::Serialize;
use silinit_raw::{FabricInstance, FabricRegister};

/// Model-specific register access on the executing thread
pub trait MsrAccess {
    fn read_msr(&self, addr: u32) -> u64;

    fn write_msr(&self, addr: u32, value: u64);

    /// `value = (value & and_mask) | or_mask`, returns the written value
    fn msr_and_then_or(&self, addr: u32, and_mask: u64, or_mask: u64) -> u64 {
        let value = (self.read_msr(addr) & and_mask) | or_mask;
        self.write_msr(addr, value);
        value
    }

    fn msr_or(&self, addr: u32, or_mask: u64) -> u64 {
        self.msr_and_then_or(addr, u64::MAX, or_mask)
    }

    fn msr_and(&self, addr: u32, and_mask: u64) -> u64 {
        self.msr_and_then_or(addr, and_mask, 0)
    }
}

/// Address of a 32-bit register in PCI configuration space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PciAddress {
    pub segment: u8,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub register: u16,
}

impl PciAddress {
    pub const fn new(segment: u8, bus: u8, device: u8, function: u8, register: u16) -> Self {
        Self {
            segment,
            bus,
            device,
            function,
            register,
        }
    }

    /// Packed form used by host PCI libraries:
    /// register[11:0], function[14:12], device[19:15], bus[27:20], segment[31:28]
    pub fn value(&self) -> u32 {
        (self.register as u32 & 0xFFF)
            | ((self.function as u32 & 0x7) << 12)
            | ((self.device as u32 & 0x1F) << 15)
            | ((self.bus as u32) << 20)
            | ((self.segment as u32 & 0xF) << 28)
    }

    pub fn from_value(value: u32) -> Self {
        Self {
            segment: ((value >> 28) & 0xF) as u8,
            bus: ((value >> 20) & 0xFF) as u8,
            device: ((value >> 15) & 0x1F) as u8,
            function: ((value >> 12) & 0x7) as u8,
            register: (value & 0xFFF) as u16,
        }
    }
}

impl std::fmt::Display for PciAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X}:{:02X}:{:02X}.{}+0x{:03X}",
            self.segment, self.bus, self.device, self.function, self.register
        )
    }
}

/// PCI configuration space access
pub trait PciConfigAccess {
    fn read_pci_config32(&self, addr: PciAddress) -> u32;

    fn write_pci_config32(&self, addr: PciAddress, value: u32);
}

/// Data fabric register access on one socket, broadcast or per instance
pub trait FabricAccess {
    fn read(&self, socket: u32, register: FabricRegister, instance: FabricInstance) -> u32;

    fn write(&self, socket: u32, register: FabricRegister, instance: FabricInstance, value: u32);
}

impl<T: MsrAccess + ?Sized> MsrAccess for &T {
    fn read_msr(&self, addr: u32) -> u64 {
        (**self).read_msr(addr)
    }

    fn write_msr(&self, addr: u32, value: u64) {
        (**self).write_msr(addr, value)
    }
}

impl<T: PciConfigAccess + ?Sized> PciConfigAccess for &T {
    fn read_pci_config32(&self, addr: PciAddress) -> u32 {
        (**self).read_pci_config32(addr)
    }

    fn write_pci_config32(&self, addr: PciAddress, value: u32) {
        (**self).write_pci_config32(addr, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapMsr {
        regs: Mutex<HashMap<u32, u64>>,
    }

    impl MsrAccess for MapMsr {
        fn read_msr(&self, addr: u32) -> u64 {
            self.regs.lock().get(&addr).copied().unwrap_or(0)
        }

        fn write_msr(&self, addr: u32, value: u64) {
            self.regs.lock().insert(addr, value);
        }
    }

    #[test]
    fn test_msr_read_modify_write_helpers() {
        let msr = MapMsr::default();
        msr.write_msr(0x10, 0xF0);

        assert_eq!(msr.msr_and_then_or(0x10, !0x30, 0x01), 0xC1);
        assert_eq!(msr.msr_or(0x10, 0x100), 0x1C1);
        assert_eq!(msr.msr_and(0x10, 0xFF), 0xC1);
        assert_eq!(msr.read_msr(0x10), 0xC1);
    }

    #[test]
    fn test_pci_address_packing() {
        let addr = PciAddress::new(0, 0, 0x18, 4, 0x5C);
        let value = addr.value();

        assert_eq!(value & 0xFFF, 0x5C);
        assert_eq!((value >> 12) & 0x7, 4);
        assert_eq!((value >> 15) & 0x1F, 0x18);
        assert_eq!(PciAddress::from_value(value), addr);
        assert_eq!(addr.to_string(), "0000:00:18.4+0x05C");
    }
}
