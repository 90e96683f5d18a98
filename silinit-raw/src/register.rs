//! Generic register abstractions for type-safe fabric and MSR programming

/// Trait for register layouts that can be converted to/from raw register values
///
/// Data fabric registers are 32 bits wide, MSRs are 64 bits wide; `Raw`
/// names the width of the register the layout describes.
///
/// # Example
///
/// ```ignore
/// use silinit_raw::register::RegisterLayout;
///
/// #[derive(Debug, Default)]
/// struct MyControl {
///     enable: bool,
///     threshold: u8,
/// }
///
/// impl RegisterLayout for MyControl {
///     type Raw = u32;
///
///     fn to_raw(&self) -> u32 {
///         (if self.enable { 1 } else { 0 })
///             | ((self.threshold as u32) << 8)
///     }
///
///     fn from_raw(value: u32) -> Self {
///         Self {
///             enable: (value & 1) != 0,
///             threshold: ((value >> 8) & 0xFF) as u8,
///         }
///     }
/// }
/// ```
pub trait RegisterLayout: Sized {
    /// Raw register width (`u32` for fabric registers, `u64` for MSRs)
    type Raw: Copy;

    /// Convert this register layout to a raw register value
    fn to_raw(&self) -> Self::Raw;

    /// Parse a raw register value into this register layout
    fn from_raw(value: Self::Raw) -> Self;

    /// Validate that the register values are within acceptable ranges
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}

/// Location of a data fabric register inside the DF PCI configuration space
///
/// Fabric registers are addressed by PCI function and byte offset; the
/// socket and the instance selector are supplied at access time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FabricRegister {
    /// DF PCI function (0-7)
    pub function: u8,
    /// Byte offset, dword aligned
    pub offset: u16,
}

impl FabricRegister {
    /// Create a register location
    pub const fn at(function: u8, offset: u16) -> Self {
        Self { function, offset }
    }

    /// Location of the `index`-th register of a register array with `stride` bytes per entry
    pub const fn indexed(self, index: u32, stride: u16) -> Self {
        Self {
            function: self.function,
            offset: self.offset + (index as u16) * stride,
        }
    }

    /// Dword register number as used by indirect access
    pub const fn register_number(&self) -> u16 {
        self.offset >> 2
    }
}

impl std::fmt::Display for FabricRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}x{:03X}", self.function, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_register_offset() {
        let base = FabricRegister::at(0, 0xC80);
        let third = base.indexed(3, 4);
        assert_eq!(third.function, 0);
        assert_eq!(third.offset, 0xC8C);
        assert_eq!(third.register_number(), 0xC8C >> 2);
    }

    #[test]
    fn test_register_display() {
        assert_eq!(FabricRegister::at(4, 0x5C).to_string(), "F4x05C");
    }
}
