//! Generation-independent data fabric vocabulary
//!
//! Every supported generation describes its fabric with the same building
//! blocks: device types, per-die device maps and a component-location table
//! naming which I/O switch hosts the FCH and SMU.

/// Raw instance selector meaning "all instances" at the hardware interface
pub const FABRIC_REG_ACC_BC: u8 = 0xFF;

/// Errors raised when decoding raw fabric values
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FabricError {
    #[error("Unknown fabric device type {0}")]
    UnknownDeviceType(u32),

    #[error("Unknown component type {0}")]
    UnknownComponentType(u32),

    #[error("Instance ID 0x{0:X} does not fit the fabric instance selector")]
    InstanceOutOfRange(u32),
}

/// Which fabric instances a register access targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FabricInstance {
    /// Broadcast to (or read from) all instances at once
    Broadcast,
    /// A single fabric node, addressed through indirect access
    Instance(u8),
}

impl FabricInstance {
    /// Decode the raw hardware selector
    pub fn from_raw(value: u8) -> Self {
        if value == FABRIC_REG_ACC_BC {
            FabricInstance::Broadcast
        } else {
            FabricInstance::Instance(value)
        }
    }

    /// Encode as the raw hardware selector
    pub fn to_raw(self) -> u8 {
        match self {
            FabricInstance::Broadcast => FABRIC_REG_ACC_BC,
            FabricInstance::Instance(id) => id,
        }
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self, FabricInstance::Broadcast)
    }
}

impl TryFrom<u32> for FabricInstance {
    type Error = FabricError;

    /// Instance IDs travel as `u32` in host tables; only `0..0xFF` name a node
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(FABRIC_REG_ACC_BC) | Err(_) => Err(FabricError::InstanceOutOfRange(value)),
            Ok(id) => Ok(FabricInstance::Instance(id)),
        }
    }
}

impl std::fmt::Display for FabricInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FabricInstance::Broadcast => write!(f, "BC"),
            FabricInstance::Instance(id) => write!(f, "inst 0x{id:02X}"),
        }
    }
}

/// Fabric device types, in hardware enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FabricDeviceType {
    Ccm,
    Gcm,
    Ncm,
    Iom,
    Ios,
    Cs,
    Ncs,
    Tcdx,
    Pie,
    Spf,
    Llc,
    Cake,
    Cnli,
    Pfx,
    Acm,
}

impl FabricDeviceType {
    pub const ALL: [FabricDeviceType; 15] = [
        FabricDeviceType::Ccm,
        FabricDeviceType::Gcm,
        FabricDeviceType::Ncm,
        FabricDeviceType::Iom,
        FabricDeviceType::Ios,
        FabricDeviceType::Cs,
        FabricDeviceType::Ncs,
        FabricDeviceType::Tcdx,
        FabricDeviceType::Pie,
        FabricDeviceType::Spf,
        FabricDeviceType::Llc,
        FabricDeviceType::Cake,
        FabricDeviceType::Cnli,
        FabricDeviceType::Pfx,
        FabricDeviceType::Acm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FabricDeviceType::Ccm => "CCM",
            FabricDeviceType::Gcm => "GCM",
            FabricDeviceType::Ncm => "NCM",
            FabricDeviceType::Iom => "IOM",
            FabricDeviceType::Ios => "IOS",
            FabricDeviceType::Cs => "CS",
            FabricDeviceType::Ncs => "NCS",
            FabricDeviceType::Tcdx => "TCDX",
            FabricDeviceType::Pie => "PIE",
            FabricDeviceType::Spf => "SPF",
            FabricDeviceType::Llc => "LLC",
            FabricDeviceType::Cake => "CAKE",
            FabricDeviceType::Cnli => "CNLI",
            FabricDeviceType::Pfx => "PFX",
            FabricDeviceType::Acm => "ACM",
        }
    }
}

impl TryFrom<u32> for FabricDeviceType {
    type Error = FabricError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(FabricError::UnknownDeviceType(value))
    }
}

/// One fabric node: its system-visible fabric ID and its instance ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceId {
    pub fabric_id: u32,
    pub instance_id: u32,
}

impl DeviceId {
    pub const fn new(fabric_id: u32, instance_id: u32) -> Self {
        Self {
            fabric_id,
            instance_id,
        }
    }
}

/// All nodes of one device type on a die, in hardware order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMap {
    pub device_type: FabricDeviceType,
    pub ids: &'static [DeviceId],
}

impl DeviceMap {
    pub const fn new(device_type: FabricDeviceType, ids: &'static [DeviceId]) -> Self {
        Self { device_type, ids }
    }

    /// Number of nodes of this type; zero is a valid count
    pub fn count(&self) -> u32 {
        self.ids.len() as u32
    }
}

/// Singleton roles a fabric node can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    PrimaryFch,
    SecondaryFch,
    PrimarySmu,
    SecondarySmu,
}

impl ComponentType {
    pub fn is_fch(self) -> bool {
        matches!(self, ComponentType::PrimaryFch | ComponentType::SecondaryFch)
    }

    pub fn is_smu(self) -> bool {
        matches!(self, ComponentType::PrimarySmu | ComponentType::SecondarySmu)
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = FabricError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ComponentType::PrimaryFch),
            1 => Ok(ComponentType::SecondaryFch),
            2 => Ok(ComponentType::PrimarySmu),
            3 => Ok(ComponentType::SecondarySmu),
            other => Err(FabricError::UnknownComponentType(other)),
        }
    }
}

/// Physical location of a singleton component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentLocation {
    pub socket: u32,
    pub die: u32,
    /// Die-local fabric ID of the I/O switch hosting the component
    pub ioms_fabric_id: u32,
    pub component: ComponentType,
}

impl ComponentLocation {
    pub const fn new(socket: u32, die: u32, ioms_fabric_id: u32, component: ComponentType) -> Self {
        Self {
            socket,
            die,
            ioms_fabric_id,
            component,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_selector_edges() {
        assert_eq!(FabricInstance::from_raw(0xFF), FabricInstance::Broadcast);
        assert_eq!(FabricInstance::from_raw(0), FabricInstance::Instance(0));
        assert_eq!(FabricInstance::Broadcast.to_raw(), FABRIC_REG_ACC_BC);
        assert!(FabricInstance::try_from(0xFFu32).is_err());
        assert!(FabricInstance::try_from(0x100u32).is_err());
        assert_eq!(
            FabricInstance::try_from(0x21u32),
            Ok(FabricInstance::Instance(0x21))
        );
    }

    #[test]
    fn test_device_type_decoding() {
        assert_eq!(FabricDeviceType::try_from(4), Ok(FabricDeviceType::Ios));
        assert_eq!(
            FabricDeviceType::try_from(99),
            Err(FabricError::UnknownDeviceType(99))
        );
    }

    #[test]
    fn test_empty_device_map_has_zero_count() {
        let map = DeviceMap::new(FabricDeviceType::Ios, &[]);
        assert_eq!(map.count(), 0);
    }

    #[test]
    fn test_component_roles() {
        assert!(ComponentType::SecondaryFch.is_fch());
        assert!(!ComponentType::SecondaryFch.is_smu());
        assert!(ComponentType::PrimarySmu.is_smu());
    }
}
