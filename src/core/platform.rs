//! Platform suffix and cache key derivation

use std::fmt;

use crate::core::model::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Darwin,
    Linux,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm64,
    Amd64,
}

/// OS/architecture pair a cache key is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Map Rust's target names onto the names used in cache keys
    pub fn from_parts(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" | "darwin" => Os::Darwin,
            "windows" | "win32" => Os::Windows,
            _ => Os::Linux,
        };
        let arch = match arch {
            "aarch64" | "arm64" => Arch::Arm64,
            _ => Arch::Amd64,
        };
        Self { os, arch }
    }

    /// The platform this binary runs on
    pub fn current() -> Self {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self.os {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
            Os::Windows => "windows",
        };
        let arch = match self.arch {
            Arch::Arm64 => "arm64",
            Arch::Amd64 => "amd64",
        };
        write!(f, "{}-{}", os, arch)
    }
}

/// Flags that turn the platform suffix off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuffixFlags {
    pub no_platform: bool,
    pub cross_os_archive: bool,
}

impl SuffixFlags {
    pub fn suppressed(&self) -> bool {
        self.no_platform || self.cross_os_archive
    }
}

/// `-{os}-{arch}`, or empty when suppressed
pub fn platform_suffix(platform: Platform, flags: SuffixFlags) -> String {
    if flags.suppressed() {
        return String::new();
    }
    format!("-{}", platform)
}

impl CacheConfig {
    pub fn derive(
        workspace: impl Into<String>,
        key: &str,
        platform: Platform,
        flags: SuffixFlags,
    ) -> Self {
        let platform_suffix = platform_suffix(platform, flags);
        Self {
            workspace: workspace.into(),
            full_key: format!("{}{}", key, platform_suffix),
            platform_suffix,
        }
    }
}
