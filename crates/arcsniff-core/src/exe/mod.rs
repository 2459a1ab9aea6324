//! New Executable and Portable Executable header parsing.
//!
//! Only the handful of fields needed to describe a program are read: the
//! Windows version it expects, the CPU it targets and, for PE, the link
//! timestamp. Every read is bounds checked through [`ByteSource`], so a
//! truncated or hostile header yields [`WindowsHeader::none`] rather than a
//! panic.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::magic::window::{self, ByteSource};

/// Offset of `e_lfanew`, the pointer to the new-style header.
const E_LFANEW: u64 = 0x3c;

const NE_TARGET_OS: u64 = 0x36;
const NE_MINOR: u64 = 0x3e;
const NE_MAJOR: u64 = 0x3f;

const PE_MACHINE: u64 = 4;
const PE_TIMESTAMP: u64 = 8;
const PE_OPTIONAL: u64 = 24;
const OPT_OS_MAJOR: u64 = 40;
const OPT_OS_MINOR: u64 = 42;

const PE32_MAGIC: u16 = 0x010b;
const PE32_PLUS_MAGIC: u16 = 0x020b;

/// Executable header family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExeKind {
    /// Not an MZ executable, or the header is truncated
    #[default]
    Unknown,
    /// MZ executable with no recognised new-style header
    Dos,
    /// 16-bit New Executable
    Ne,
    /// Portable Executable
    Pe,
}

/// Target operating system byte of an NE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeTarget {
    /// Unset or unrecognised
    #[default]
    Unknown,
    /// OS/2
    Os2,
    /// Windows 2.x and 3.x (286 mode)
    Win286,
    /// European MS-DOS 4.x
    Dos4,
    /// Windows 386
    Win386,
}

impl NeTarget {
    fn from_byte(b: u8) -> Self {
        match b {
            1 => NeTarget::Os2,
            2 => NeTarget::Win286,
            3 => NeTarget::Dos4,
            4 => NeTarget::Win386,
            _ => NeTarget::Unknown,
        }
    }
}

/// Decoded NE or PE header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowsHeader {
    /// Header family
    pub kind: ExeKind,
    /// Major version of the expected Windows (NE) or OS (PE)
    pub major: u16,
    /// Minor version of the expected Windows (NE) or OS (PE)
    pub minor: u16,
    /// COFF machine type, zero for NE
    pub machine: u16,
    /// True for PE32+ (64-bit) optional headers
    pub pe32_plus: bool,
    /// Link time in seconds since the Unix epoch, zero for NE
    pub timestamp: u32,
    /// NE target operating system
    pub ne_target: NeTarget,
}

impl WindowsHeader {
    /// The "no match" record.
    pub fn none() -> Self {
        Self::default()
    }

    fn dos() -> Self {
        Self {
            kind: ExeKind::Dos,
            ..Self::default()
        }
    }

    /// True for NE and PE headers.
    pub fn is_windows(&self) -> bool {
        matches!(self.kind, ExeKind::Ne | ExeKind::Pe)
    }

    /// Friendly name of the operating system version the program expects.
    pub fn os_name(&self) -> Option<&'static str> {
        match self.kind {
            ExeKind::Ne => match self.ne_target {
                NeTarget::Os2 => Some("OS/2"),
                NeTarget::Dos4 => Some("MS-DOS 4"),
                _ => Some(match (self.major, self.minor) {
                    (2, _) => "Windows 2",
                    (3, 0) => "Windows 3.0",
                    (3, 10) | (3, 1) => "Windows 3.1",
                    (3, 11) => "Windows for Workgroups 3.11",
                    (3, _) => "Windows 3",
                    (4, _) => "Windows 95",
                    _ => "Windows",
                }),
            },
            ExeKind::Pe => Some(match (self.major, self.minor) {
                (3, 10) => "Windows NT 3.1",
                (3, 50) => "Windows NT 3.5",
                (3, 51) => "Windows NT 3.51",
                (4, 0) => "Windows 95 or NT 4",
                (4, 10) => "Windows 98",
                (4, 90) => "Windows ME",
                (5, 0) => "Windows 2000",
                (5, 1) => "Windows XP",
                (5, 2) => "Windows XP x64 or Server 2003",
                (6, 0) => "Windows Vista",
                (6, 1) => "Windows 7",
                (6, 2) => "Windows 8",
                (6, 3) => "Windows 8.1",
                (10, 0) => "Windows 10",
                _ => "Windows",
            }),
            ExeKind::Dos => Some("MS-DOS"),
            ExeKind::Unknown => None,
        }
    }

    /// CPU architecture name for the COFF machine type.
    pub fn machine_name(&self) -> Option<&'static str> {
        match self.kind {
            ExeKind::Ne | ExeKind::Dos => Some("x86 (16-bit)"),
            ExeKind::Pe => Some(match self.machine {
                0x014c => "Intel 386",
                0x0162 => "MIPS R3000",
                0x0166 => "MIPS R4000",
                0x0184 => "Alpha AXP",
                0x01c0 => "ARM",
                0x01c4 => "ARM Thumb-2",
                0x01f0 => "PowerPC",
                0x0200 => "Intel Itanium",
                0x8664 => "AMD64",
                0xaa64 => "ARM64",
                _ => "unknown",
            }),
            ExeKind::Unknown => None,
        }
    }

    /// PE link time. `None` for NE headers and zeroed timestamps.
    pub fn compiled(&self) -> Option<SystemTime> {
        if self.kind != ExeKind::Pe || self.timestamp == 0 {
            return None;
        }
        UNIX_EPOCH.checked_add(Duration::from_secs(u64::from(self.timestamp)))
    }
}

impl fmt::Display for WindowsHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ExeKind::Unknown => f.write_str("not an executable"),
            ExeKind::Dos => f.write_str("MS-DOS executable"),
            ExeKind::Ne => write!(
                f,
                "NE executable for {} ({}.{})",
                self.os_name().unwrap_or("Windows"),
                self.major,
                self.minor
            ),
            ExeKind::Pe => write!(
                f,
                "{} executable for {} on {}",
                if self.pe32_plus { "PE32+" } else { "PE32" },
                self.os_name().unwrap_or("Windows"),
                self.machine_name().unwrap_or("unknown"),
            ),
        }
    }
}

/// Parse the NE or PE header of an MZ executable.
pub fn parse(r: &dyn ByteSource) -> WindowsHeader {
    if !window::starts_with(r, b"MZ") && !window::starts_with(r, b"ZM") {
        return WindowsHeader::none();
    }
    let Some(lfanew) = window::u32_le(r, E_LFANEW) else {
        return WindowsHeader::none();
    };
    let lfanew = u64::from(lfanew);
    if lfanew == 0 {
        return WindowsHeader::dos();
    }

    if window::equals_at(r, lfanew, b"PE\x00\x00") {
        return parse_pe(r, lfanew).unwrap_or_else(WindowsHeader::none);
    }
    if window::equals_at(r, lfanew, b"NE") {
        return parse_ne(r, lfanew).unwrap_or_else(WindowsHeader::none);
    }
    WindowsHeader::dos()
}

fn parse_ne(r: &dyn ByteSource, ne: u64) -> Option<WindowsHeader> {
    let target = window::array::<1>(r, ne + NE_TARGET_OS)?[0];
    let minor = window::array::<1>(r, ne + NE_MINOR)?[0];
    let major = window::array::<1>(r, ne + NE_MAJOR)?[0];
    Some(WindowsHeader {
        kind: ExeKind::Ne,
        major: u16::from(major),
        minor: u16::from(minor),
        ne_target: NeTarget::from_byte(target),
        ..WindowsHeader::default()
    })
}

fn parse_pe(r: &dyn ByteSource, pe: u64) -> Option<WindowsHeader> {
    let machine = window::u16_le(r, pe + PE_MACHINE)?;
    let timestamp = window::u32_le(r, pe + PE_TIMESTAMP)?;
    let opt = pe + PE_OPTIONAL;
    let pe32_plus = match window::u16_le(r, opt)? {
        PE32_MAGIC => false,
        PE32_PLUS_MAGIC => true,
        _ => return None,
    };
    let major = window::u16_le(r, opt + OPT_OS_MAJOR)?;
    let minor = window::u16_le(r, opt + OPT_OS_MINOR)?;
    Some(WindowsHeader {
        kind: ExeKind::Pe,
        major,
        minor,
        machine,
        pe32_plus,
        timestamp,
        ne_target: NeTarget::Unknown,
    })
}
