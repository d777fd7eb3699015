//! The Windows subsystem required to run the image — the `subsystem` field of
//! [`OptionalHeader`](crate::header::optional_header::OptionalHeader).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Unknown,
    Native,
    WindowsGui,
    WindowsCui,
    Os2Cui,
    PosixCui,
    NativeWindows,
    WindowsCeGui,
    EfiApplication,
    EfiBootServiceDriver,
    EfiRuntimeDriver,
    EfiRom,
    Xbox,
    WindowsBootApplication,
    Other(u16),
}

impl Subsystem {
    /// An unknown subsystem
    pub const IMAGE_SUBSYSTEM_UNKNOWN: u16 = 0x0000;
    /// Device drivers and native Windows processes
    pub const IMAGE_SUBSYSTEM_NATIVE: u16 = 0x0001;
    /// The Windows graphical user interface (GUI) subsystem
    pub const IMAGE_SUBSYSTEM_WINDOWS_GUI: u16 = 0x0002;
    /// The Windows character subsystem
    pub const IMAGE_SUBSYSTEM_WINDOWS_CUI: u16 = 0x0003;
    /// The OS/2 character subsystem
    pub const IMAGE_SUBSYSTEM_OS2_CUI: u16 = 0x0005;
    /// The Posix character subsystem
    pub const IMAGE_SUBSYSTEM_POSIX_CUI: u16 = 0x0007;
    /// Native Win9x driver
    pub const IMAGE_SUBSYSTEM_NATIVE_WINDOWS: u16 = 0x0008;
    /// Windows CE
    pub const IMAGE_SUBSYSTEM_WINDOWS_CE_GUI: u16 = 0x0009;
    /// An Extensible Firmware Interface (EFI) application
    pub const IMAGE_SUBSYSTEM_EFI_APPLICATION: u16 = 0x000A;
    /// An EFI driver with boot services
    pub const IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER: u16 = 0x000B;
    /// An EFI driver with run-time services
    pub const IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER: u16 = 0x000C;
    /// An EFI ROM image
    pub const IMAGE_SUBSYSTEM_EFI_ROM: u16 = 0x000D;
    /// XBOX
    pub const IMAGE_SUBSYSTEM_XBOX: u16 = 0x000E;
    /// Windows boot application.
    pub const IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION: u16 = 0x0010;
}

impl From<u16> for Subsystem {
    fn from(value: u16) -> Self {
        match value {
            Self::IMAGE_SUBSYSTEM_UNKNOWN => Self::Unknown,
            Self::IMAGE_SUBSYSTEM_NATIVE => Self::Native,
            Self::IMAGE_SUBSYSTEM_WINDOWS_GUI => Self::WindowsGui,
            Self::IMAGE_SUBSYSTEM_WINDOWS_CUI => Self::WindowsCui,
            Self::IMAGE_SUBSYSTEM_OS2_CUI => Self::Os2Cui,
            Self::IMAGE_SUBSYSTEM_POSIX_CUI => Self::PosixCui,
            Self::IMAGE_SUBSYSTEM_NATIVE_WINDOWS => Self::NativeWindows,
            Self::IMAGE_SUBSYSTEM_WINDOWS_CE_GUI => Self::WindowsCeGui,
            Self::IMAGE_SUBSYSTEM_EFI_APPLICATION => Self::EfiApplication,
            Self::IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER => Self::EfiBootServiceDriver,
            Self::IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER => Self::EfiRuntimeDriver,
            Self::IMAGE_SUBSYSTEM_EFI_ROM => Self::EfiRom,
            Self::IMAGE_SUBSYSTEM_XBOX => Self::Xbox,
            Self::IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION => Self::WindowsBootApplication,
            other => Self::Other(other),
        }
    }
}

impl From<Subsystem> for u16 {
    fn from(value: Subsystem) -> Self {
        match value {
            Subsystem::Unknown => Subsystem::IMAGE_SUBSYSTEM_UNKNOWN,
            Subsystem::Native => Subsystem::IMAGE_SUBSYSTEM_NATIVE,
            Subsystem::WindowsGui => Subsystem::IMAGE_SUBSYSTEM_WINDOWS_GUI,
            Subsystem::WindowsCui => Subsystem::IMAGE_SUBSYSTEM_WINDOWS_CUI,
            Subsystem::Os2Cui => Subsystem::IMAGE_SUBSYSTEM_OS2_CUI,
            Subsystem::PosixCui => Subsystem::IMAGE_SUBSYSTEM_POSIX_CUI,
            Subsystem::NativeWindows => Subsystem::IMAGE_SUBSYSTEM_NATIVE_WINDOWS,
            Subsystem::WindowsCeGui => Subsystem::IMAGE_SUBSYSTEM_WINDOWS_CE_GUI,
            Subsystem::EfiApplication => Subsystem::IMAGE_SUBSYSTEM_EFI_APPLICATION,
            Subsystem::EfiBootServiceDriver => Subsystem::IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER,
            Subsystem::EfiRuntimeDriver => Subsystem::IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER,
            Subsystem::EfiRom => Subsystem::IMAGE_SUBSYSTEM_EFI_ROM,
            Subsystem::Xbox => Subsystem::IMAGE_SUBSYSTEM_XBOX,
            Subsystem::WindowsBootApplication => {
                Subsystem::IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION
            }
            Subsystem::Other(v) => v,
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unknown => "unknown",
            Self::Native => "native",
            Self::WindowsGui => "Windows GUI",
            Self::WindowsCui => "Windows console",
            Self::Os2Cui => "OS/2 console",
            Self::PosixCui => "Posix console",
            Self::NativeWindows => "native Win9x driver",
            Self::WindowsCeGui => "Windows CE GUI",
            Self::EfiApplication => "EFI application",
            Self::EfiBootServiceDriver => "EFI boot service driver",
            Self::EfiRuntimeDriver => "EFI runtime driver",
            Self::EfiRom => "EFI ROM",
            Self::Xbox => "Xbox",
            Self::WindowsBootApplication => "Windows boot application",
            Self::Other(_) => "unrecognized",
        };
        f.write_str(text)
    }
}
