//! Thread role within a compute unit
//!
//! Some core MSRs are shared by the threads of a compute unit and must be
//! programmed once, by the compute-unit primary thread.

pub trait CcxRoles {
    fn is_compute_unit_primary(&self) -> bool;
}

/// Every caller is the primary (single-threaded compute units, simulation)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPrimary;

impl CcxRoles for AlwaysPrimary {
    fn is_compute_unit_primary(&self) -> bool {
        true
    }
}

/// Role derived from the APIC ID and the number of threads per compute unit
#[derive(Debug, Clone, Copy)]
pub struct ApicRole {
    pub apic_id: u32,
    pub threads_per_compute_unit: u32,
}

impl CcxRoles for ApicRole {
    fn is_compute_unit_primary(&self) -> bool {
        self.threads_per_compute_unit <= 1 || self.apic_id % self.threads_per_compute_unit == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apic_role() {
        let primary = ApicRole {
            apic_id: 4,
            threads_per_compute_unit: 2,
        };
        let sibling = ApicRole {
            apic_id: 5,
            threads_per_compute_unit: 2,
        };

        assert!(primary.is_compute_unit_primary());
        assert!(!sibling.is_compute_unit_primary());
        assert!(AlwaysPrimary.is_compute_unit_primary());
    }
}
