// Silicon generation detection

use serde::{Deserialize, Serialize};

use crate::common::cpuid;

crate::enum_with_data! {
    /// Hardware family whose operation tables drive a boot pass
    #[derive(Serialize, Deserialize)]
    pub enum SiliconGeneration: u32 {
        Zen4 => ("Zen4", 0x19),
        Zen5 => ("Zen5", 0x1A),
    }
    impl cpu_family -> u32
}

impl SiliconGeneration {
    /// Decode a CPUID Fn0000_0001 EAX signature
    pub fn from_cpuid_signature(eax: u32) -> Option<Self> {
        let (family, model) = cpuid::family_model(eax);

        let generation = match (family, model) {
            // Genoa, Storm Peak / Raphael, Phoenix / Bergamo, Siena
            (0x19, 0x10..=0x1F) | (0x19, 0x60..=0x7F) | (0x19, 0xA0..=0xAF) => {
                SiliconGeneration::Zen4
            }
            (0x1A, _) => SiliconGeneration::Zen5,
            _ => {
                tracing::debug!(
                    "CPU family {:X} model {:X} is not a supported generation",
                    family,
                    model
                );
                return None;
            }
        };

        Some(generation)
    }

    /// Detect the generation of the executing processor
    pub fn detect() -> Option<Self> {
        let eax = cpuid::processor_signature();
        let generation = Self::from_cpuid_signature(eax);
        tracing::info!("CPUID signature 0x{:08X} -> {:?}", eax, generation);
        generation
    }
}

impl Default for SiliconGeneration {
    fn default() -> Self {
        SiliconGeneration::Zen4
    }
}
