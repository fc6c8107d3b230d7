//! Host platform identification and capabilities.

use serde::{Deserialize, Serialize};

/// Operating system family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// macOS.
    Darwin,
    /// Linux.
    Linux,
    /// Anything else.
    Other,
}

impl Os {
    /// Get the current OS.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// What the host can do, decided once at startup and handed to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Operating system family.
    pub os: Os,
    /// Whether the installation locator can be downloaded and queried.
    pub locator_detection: bool,
}

impl HostCapabilities {
    /// Capabilities of the machine this process runs on.
    #[must_use]
    pub fn current() -> Self {
        Self::for_os(Os::current())
    }

    /// Capabilities implied by an OS family.
    ///
    /// Only Windows hosts carry Visual Studio installations to locate.
    #[must_use]
    pub fn for_os(os: Os) -> Self {
        Self {
            os,
            locator_detection: os == Os::Windows,
        }
    }

    /// Whether installation-locator detection is meaningful on this host.
    #[must_use]
    pub fn platform_supports_locator_detection(&self) -> bool {
        self.locator_detection
    }
}
