//! Install gatekeeping error taxonomy.
//!
//! Every pipeline failure is terminal for that task's run; there is no
//! retry logic here. Callers surface the category and message to the user
//! or to an orchestrator that may retry under different install flags.
//!
//! [`InstallError`] has one variant per distinct failure so that tests
//! and callers can match precisely; [`ErrorCategory`] is the coarser
//! taxonomy shared with the trust evaluator. Two situations historically
//! shared a single "version newer" code: installing below the device's
//! minimum version floor, and a blocked downgrade. They stay separate
//! variants here and only merge at the category level.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trust::TrustError;

/// Coarse error taxonomy shared by the pipeline and the trust evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Nothing matched, e.g. no device GUID overlaps the component.
    NotFound,
    /// The operation is understood but not permitted for this device.
    NotSupported,
    /// The component metadata is incomplete or malformed.
    InvalidFile,
    /// The daemon's own state is inconsistent.
    Internal,
    /// The candidate version is ordered before a required version.
    VersionNewer,
    /// The candidate version is already installed.
    VersionSame,
}

impl ErrorCategory {
    /// Stable identifier for logs and external surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::NotSupported => "not-supported",
            Self::InvalidFile => "invalid-file",
            Self::Internal => "internal",
            Self::VersionNewer => "version-newer",
            Self::VersionSame => "version-same",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requirement-validation failure.
///
/// Messages carry the device name and ID where the original diagnostics
/// did, so they can be surfaced to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// No GUID provided by the component matches the device.
    #[error("No supported devices found")]
    NoMatchingGuid,

    /// The device demands a pre-flash version check but the component
    /// does not declare one.
    #[error("device requires firmware with a version check: no firmware requirement")]
    MissingVersionCheckRequirement,

    /// The component requires an update protocol the device lacks.
    #[error("Device {device} does not support {protocol}, only {supported}")]
    ProtocolUnsupported {
        /// Device name.
        device: String,
        /// The protocol the component requires.
        protocol: String,
        /// The device's supported protocols, joined by `|`.
        supported: String,
    },

    /// The device is locked.
    #[error("Device {device} [{id}] is locked")]
    DeviceLocked {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
    },

    /// Installing would move the device to a different firmware branch.
    #[error("Device {device} [{id}] would switch firmware branch from {current} to {target}")]
    BranchSwitchBlocked {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
        /// The branch the device is on.
        current: String,
        /// The branch the component belongs to.
        target: String,
    },

    /// The device does not currently accept updates.
    #[error("Device {device} [{id}] does not currently allow updates")]
    NotUpdatable {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
    },

    /// An online install was requested for an offline-only device.
    #[error("Device {device} [{id}] only allows offline updates")]
    OfflineOnly {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
    },

    /// The device has no known firmware version to compare against.
    #[error("Device {device} [{id}] has no firmware version")]
    NoDeviceVersion {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
    },

    /// The component has no releases at all.
    #[error("{device} [{id}] has no firmware update metadata")]
    NoReleases {
        /// Device name.
        device: String,
        /// Device ID.
        id: String,
    },

    /// The selected release does not declare a version.
    #[error("Release has no firmware version")]
    ReleaseMissingVersion,

    /// The component declares version formats but the device's format is
    /// unknown.
    #[error("release version format '{declared}' but no device version format")]
    NoDeviceVersionFormat {
        /// The declared formats, joined by `;`.
        declared: String,
    },

    /// The device's version format is not among the formats the component
    /// declares.
    #[error(
        "Firmware version formats were different, device was '{device_format}' and release is '{declared}'"
    )]
    VersionFormatMismatch {
        /// The device's version format name.
        device_format: String,
        /// The declared formats, joined by `;`.
        declared: String,
    },

    /// The device's current firmware is below its declared minimum.
    #[error(
        "Specified firmware is older than the minimum required version '{version} < {lowest}'"
    )]
    BelowMinimumVersion {
        /// The device's current version.
        version: String,
        /// The device's minimum version floor.
        lowest: String,
    },

    /// The device only accepts strictly newer versions.
    #[error("Device only supports version upgrades")]
    UpgradesOnly,

    /// The release version is already installed.
    #[error("Specified firmware is already installed '{version}'")]
    AlreadyInstalled {
        /// The release version.
        version: String,
    },

    /// The release is a downgrade and downgrades are not allowed.
    #[error("Specified firmware is older than installed '{new} < {old}'")]
    DowngradeBlocked {
        /// The release version.
        new: String,
        /// The installed version.
        old: String,
    },

    /// The trust evaluator failed fatally.
    #[error(transparent)]
    Verification(#[from] TrustError),
}

impl InstallError {
    /// Maps the failure to its coarse category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoMatchingGuid => ErrorCategory::NotFound,
            Self::MissingVersionCheckRequirement
            | Self::ProtocolUnsupported { .. }
            | Self::DeviceLocked { .. }
            | Self::BranchSwitchBlocked { .. }
            | Self::NotUpdatable { .. }
            | Self::OfflineOnly { .. }
            | Self::NoDeviceVersionFormat { .. }
            | Self::VersionFormatMismatch { .. }
            | Self::UpgradesOnly => ErrorCategory::NotSupported,
            Self::NoReleases { .. } | Self::ReleaseMissingVersion => ErrorCategory::InvalidFile,
            Self::NoDeviceVersion { .. } => ErrorCategory::Internal,
            Self::BelowMinimumVersion { .. } | Self::DowngradeBlocked { .. } => {
                ErrorCategory::VersionNewer
            }
            Self::AlreadyInstalled { .. } => ErrorCategory::VersionSame,
            Self::Verification(err) => err.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_are_stable() {
        assert_eq!(ErrorCategory::NotFound.as_str(), "not-found");
        assert_eq!(ErrorCategory::VersionNewer.to_string(), "version-newer");
    }

    #[test]
    fn both_version_floor_failures_share_a_category() {
        let below = InstallError::BelowMinimumVersion {
            version: "1.0.0".into(),
            lowest: "1.2.0".into(),
        };
        let downgrade = InstallError::DowngradeBlocked {
            new: "1.0.0".into(),
            old: "2.0.0".into(),
        };
        assert_eq!(below.category(), ErrorCategory::VersionNewer);
        assert_eq!(downgrade.category(), ErrorCategory::VersionNewer);
        assert_ne!(below, downgrade);
    }

    #[test]
    fn verification_errors_keep_their_category() {
        let err = InstallError::from(TrustError::new(
            ErrorCategory::InvalidFile,
            "truncated signature blob",
        ));
        assert_eq!(err.category(), ErrorCategory::InvalidFile);
        assert_eq!(err.to_string(), "truncated signature blob");
    }

    #[test]
    fn messages_carry_device_diagnostics() {
        let err = InstallError::DeviceLocked {
            device: "Example Drive".into(),
            id: "dev-1".into(),
        };
        assert_eq!(err.to_string(), "Device Example Drive [dev-1] is locked");
    }
}
