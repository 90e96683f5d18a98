#[cfg(target_arch = "x86_64")]
pub fn cpuid(eax: u32, ecx: u32) -> (u32, u32, u32, u32) {
    let mut ebx: u32;
    let mut edx: u32;
    let mut eax_out = eax;
    let mut ecx_out = ecx;

    unsafe {
        std::arch::asm!(
            "mov {0:r}, rbx",
            "cpuid",
            "xchg {0:r}, rbx",
            out(reg) ebx,
            inout("eax") eax_out,
            inout("ecx") ecx_out,
            out("edx") edx,
            options(nostack, preserves_flags)
        );
    }

    (eax_out, ebx, ecx_out, edx)
}

#[cfg(not(target_arch = "x86_64"))]
pub fn cpuid(_eax: u32, _ecx: u32) -> (u32, u32, u32, u32) {
    (0, 0, 0, 0)
}

/// Processor signature from CPUID Fn0000_0001 EAX
pub fn processor_signature() -> u32 {
    cpuid(1, 0).0
}

/// Display family and model of a processor signature
pub fn family_model(eax: u32) -> (u32, u32) {
    let model = (eax >> 4) & 0xF;
    let family = (eax >> 8) & 0xF;
    let extended_model = (eax >> 16) & 0xF;
    let extended_family = (eax >> 20) & 0xFF;

    let display_family = if family == 0xF {
        family + extended_family
    } else {
        family
    };

    let display_model = if family == 0xF {
        (extended_model << 4) | model
    } else {
        model
    };

    (display_family, display_model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_model_of_genoa() {
        assert_eq!(family_model(0x00A1_0F11), (0x19, 0x11));
    }

    #[test]
    fn test_family_model_of_turin() {
        assert_eq!(family_model(0x00B0_0F21), (0x1A, 0x02));
    }
}
