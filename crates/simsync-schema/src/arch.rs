//! Mach-O slice enumeration and device compatibility.

use crate::device::{Device, DeviceKind};
use goblin::mach::cputype::{CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_X86, CPU_TYPE_X86_64};
use goblin::mach::Mach;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const CPU_SUBTYPE_MASK: u32 = 0xff00_0000;
const CPU_SUBTYPE_ARM_V7: u32 = 9;
const CPU_SUBTYPE_ARM_V7S: u32 = 11;
const CPU_SUBTYPE_ARM64E: u32 = 2;

#[derive(Debug, Error)]
pub enum ArchError {
    #[error("could not read binary at '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("binary at '{path}' is not a Mach-O executable: {reason}")]
    NotMachO { path: String, reason: String },
    #[error(
        "binary at '{path}' does not contain a compatible architecture for {device}: \
         expected one of [{required}] but found [{found}]"
    )]
    Incompatible {
        path: String,
        device: String,
        required: String,
        found: String,
    },
}

/// One CPU slice of a (possibly universal) executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    I386,
    X86_64,
    Armv7,
    Armv7s,
    Arm64,
    Arm64e,
    Other { cputype: u32, subtype: u32 },
}

impl Arch {
    pub fn from_cpu(cputype: u32, cpusubtype: u32) -> Self {
        let subtype = cpusubtype & !CPU_SUBTYPE_MASK;
        match cputype {
            CPU_TYPE_X86 => Self::I386,
            CPU_TYPE_X86_64 => Self::X86_64,
            CPU_TYPE_ARM64 if subtype == CPU_SUBTYPE_ARM64E => Self::Arm64e,
            CPU_TYPE_ARM64 => Self::Arm64,
            CPU_TYPE_ARM if subtype == CPU_SUBTYPE_ARM_V7 => Self::Armv7,
            CPU_TYPE_ARM if subtype == CPU_SUBTYPE_ARM_V7S => Self::Armv7s,
            _ => Self::Other { cputype, subtype },
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I386 => f.write_str("i386"),
            Self::X86_64 => f.write_str("x86_64"),
            Self::Armv7 => f.write_str("armv7"),
            Self::Armv7s => f.write_str("armv7s"),
            Self::Arm64 => f.write_str("arm64"),
            Self::Arm64e => f.write_str("arm64e"),
            Self::Other { cputype, subtype } => write!(f, "cpu{cputype}/{subtype}"),
        }
    }
}

/// Enumerate the slices in a Mach-O image, thin or fat.
pub fn parse_arches(bytes: &[u8]) -> Result<Vec<Arch>, String> {
    let mach = Mach::parse(bytes).map_err(|e| e.to_string())?;
    let mut arches = Vec::new();
    match mach {
        Mach::Binary(macho) => {
            arches.push(Arch::from_cpu(macho.header.cputype, macho.header.cpusubtype));
        }
        Mach::Fat(multi) => {
            for fat_arch in multi.iter_arches() {
                let fat_arch = fat_arch.map_err(|e| e.to_string())?;
                let arch = Arch::from_cpu(fat_arch.cputype, fat_arch.cpusubtype);
                if !arches.contains(&arch) {
                    arches.push(arch);
                }
            }
        }
    }
    Ok(arches)
}

pub fn binary_arches(binary: &Path) -> Result<Vec<Arch>, ArchError> {
    let bytes = std::fs::read(binary).map_err(|source| ArchError::Unreadable {
        path: binary.display().to_string(),
        source,
    })?;
    parse_arches(&bytes).map_err(|reason| ArchError::NotMachO {
        path: binary.display().to_string(),
        reason,
    })
}

/// Whether any slice can run on a device of the given kind.
///
/// An i386 slice runs on every simulator regardless of host.
pub fn is_compatible(arches: &[Arch], kind: DeviceKind) -> bool {
    if kind.is_simulator() && arches.contains(&Arch::I386) {
        return true;
    }
    arches.iter().any(|a| kind.required_arches().contains(a))
}

/// Fail unless the executable has at least one slice runnable on `device`.
/// Returns the slices found.
pub fn expect_compatible_arch(binary: &Path, device: &Device) -> Result<Vec<Arch>, ArchError> {
    let arches = binary_arches(binary)?;
    debug!(
        "{} has slices [{}], {} requires [{}]",
        binary.display(),
        join_arches(&arches),
        device.instruments_identifier,
        join_arches(device.kind.required_arches())
    );
    if is_compatible(&arches, device.kind) {
        Ok(arches)
    } else {
        Err(ArchError::Incompatible {
            path: binary.display().to_string(),
            device: device.instruments_identifier.clone(),
            required: join_arches(device.kind.required_arches()),
            found: join_arches(&arches),
        })
    }
}

fn join_arches(arches: &[Arch]) -> String {
    arches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
