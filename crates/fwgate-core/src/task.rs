//! Install tasks and the requirement-validation pipeline.
//!
//! One [`InstallTask`] pairs a candidate release's component metadata
//! with a target device. Before any flashing is considered, the task must
//! pass [`InstallTask::check_requirements`]: an ordered sequence of
//! compatibility, safety, and trust checks. The first failing check
//! aborts the run with a specific [`InstallError`].
//!
//! A successful run produces a [`ValidatedTask`] carrying the two derived
//! facts the daemon needs afterwards: the trust flags adopted from the
//! evaluator and whether the install is a downgrade. Keeping those on a
//! separate type makes reading them before validation a compile error
//! rather than a documented precondition.
//!
//! # Check Ordering
//!
//! The checks run strictly in this order, and the order is part of the
//! contract (callers and users see the *first* applicable failure):
//!
//! 1. GUID intersection between component provides and device GUIDs.
//! 2. Pre-flash version-check requirement (if the device demands one).
//! 3. Update-protocol compatibility (FORCE downgrades to a warning).
//! 4. Device lock state (never bypassable).
//! 5. Firmware-branch agreement (unless `ALLOW_BRANCH_SWITCH`).
//! 6. Device updatability (never bypassable).
//! 7. Offline-only restriction (FORCE downgrades to a warning).
//! 8. Device firmware version presence (never bypassable).
//! 9. Release presence (never bypassable).
//! 10. Release version presence (never bypassable).
//! 11. Version-format agreement (skipped under FORCE or
//!     `ALLOW_BRANCH_SWITCH`).
//! 12. Minimum-version floor (FORCE downgrades to a warning).
//! 13. Version comparison: reinstall and downgrade policy.
//! 14. Trust evaluation.
//!
//! # Concurrency
//!
//! The pipeline is a pure synchronous computation over borrowed,
//! immutable inputs; distinct tasks may validate concurrently. The only
//! external call is the injected trust evaluator.

use std::cmp::Ordering;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::authorization::{resolve_tier, AuthorizationTier};
use crate::device::{Device, DeviceFlags};
use crate::error::InstallError;
use crate::metadata::Component;
use crate::trust::{TrustEvaluator, TrustFlags};
use crate::version::{compare, formats_to_string, parse_for_format, VersionFormat};

/// Name used for an absent branch in diagnostics and comparisons.
const DEFAULT_BRANCH: &str = "default";

bitflags! {
    /// Caller-supplied modifiers for a validation run.
    ///
    /// `FORCE` downgrades most `NotSupported` failures to warnings. It
    /// never bypasses the lock check, the updatable check, the presence
    /// of a device firmware version, or the presence of a release.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InstallFlags: u32 {
        /// Ignore soft compatibility failures, with a logged warning.
        const FORCE = 1 << 0;
        /// The update will be staged for offline application.
        const OFFLINE = 1 << 1;
        /// Permit installing a version older than the current one.
        const ALLOW_OLDER = 1 << 2;
        /// Permit reinstalling the currently installed version.
        const ALLOW_REINSTALL = 1 << 3;
        /// Permit switching to a different firmware branch.
        const ALLOW_BRANCH_SWITCH = 1 << 4;
    }
}

/// A candidate (device, component) pairing awaiting validation.
#[derive(Debug, Clone, Copy)]
pub struct InstallTask<'a> {
    device: &'a Device,
    component: Component<'a>,
}

impl<'a> InstallTask<'a> {
    /// Creates a task that may or may not turn out to be valid.
    #[must_use]
    pub const fn new(device: &'a Device, component: Component<'a>) -> Self {
        Self { device, component }
    }

    /// The target device.
    #[must_use]
    pub const fn device(&self) -> &'a Device {
        self.device
    }

    /// The candidate component metadata.
    #[must_use]
    pub const fn component(&self) -> Component<'a> {
        self.component
    }

    /// Orders tasks by their device's sequencing order, ascending.
    ///
    /// Used to sequence sibling tasks of a composite device so children
    /// and parents flash deterministically.
    #[must_use]
    pub fn cmp_by_order(&self, other: &Self) -> Ordering {
        self.device.order().cmp(&other.device.order())
    }

    /// Runs the requirement-validation pipeline.
    ///
    /// On success the returned [`ValidatedTask`] carries the adopted
    /// trust flags and the downgrade determination. On failure nothing is
    /// derived; the task itself is unchanged and may be re-validated with
    /// different flags.
    ///
    /// # Errors
    ///
    /// Returns the first failing check's [`InstallError`]; see the module
    /// docs for the ordering.
    pub fn check_requirements(
        &self,
        flags: InstallFlags,
        trust: &dyn TrustEvaluator,
    ) -> Result<ValidatedTask<'a>, InstallError> {
        let device = self.device;
        let component = self.component;

        // 1. Does this component provide a GUID the device has?
        let guids = component.flashed_firmware_guids();
        if !guids.iter().any(|guid| device.has_guid(guid)) {
            return Err(InstallError::NoMatchingGuid);
        }

        // 2. Device demands a pre-flash version check.
        if device.has_flag(DeviceFlags::VERSION_CHECK_REQUIRED)
            && !component.has_bare_firmware_requirement()
        {
            return Err(InstallError::MissingVersionCheckRequirement);
        }

        // 3. Does the update protocol match?
        if let Some(protocol) = component.update_protocol() {
            if !device.protocols().is_empty() && !device.has_protocol(protocol) {
                if flags.contains(InstallFlags::FORCE) {
                    tracing::warn!(
                        device = device.name(),
                        protocol,
                        "ignoring unsupported update protocol"
                    );
                } else {
                    return Err(InstallError::ProtocolUnsupported {
                        device: device.name().to_string(),
                        protocol: protocol.to_string(),
                        supported: device.protocols().join("|"),
                    });
                }
            }
        }

        // 4. A locked device must be unlocked first; FORCE cannot help.
        if device.has_flag(DeviceFlags::LOCKED) {
            return Err(InstallError::DeviceLocked {
                device: device.name().to_string(),
                id: device.id().to_string(),
            });
        }

        // 5. Crossing firmware branches needs explicit opt-in.
        let branch_new = component.branch();
        let branch_old = device.branch();
        if !flags.contains(InstallFlags::ALLOW_BRANCH_SWITCH) && branch_old != branch_new {
            return Err(InstallError::BranchSwitchBlocked {
                device: device.name().to_string(),
                id: device.id().to_string(),
                current: branch_old.unwrap_or(DEFAULT_BRANCH).to_string(),
                target: branch_new.unwrap_or(DEFAULT_BRANCH).to_string(),
            });
        }

        // 6. No update abilities; FORCE cannot help.
        if !device.has_flag(DeviceFlags::UPDATABLE) {
            return Err(InstallError::NotUpdatable {
                device: device.name().to_string(),
                id: device.id().to_string(),
            });
        }

        // 7. Online install against an offline-only device.
        if !flags.contains(InstallFlags::OFFLINE) && device.has_flag(DeviceFlags::ONLY_OFFLINE) {
            if flags.contains(InstallFlags::FORCE) {
                tracing::warn!(
                    device = device.name(),
                    "ignoring offline-only restriction for online install"
                );
            } else {
                return Err(InstallError::OfflineOnly {
                    device: device.name().to_string(),
                    id: device.id().to_string(),
                });
            }
        }

        // 8. Without a current version there is nothing to compare
        //    against; FORCE cannot help.
        let Some(version) = device.version() else {
            return Err(InstallError::NoDeviceVersion {
                device: device.name().to_string(),
                id: device.id().to_string(),
            });
        };

        // 9. The first release in document order is the candidate.
        let Some(release) = component.first_release() else {
            return Err(InstallError::NoReleases {
                device: device.name().to_string(),
                id: device.id().to_string(),
            });
        };

        // 10. The release must declare a version.
        let Some(version_release_raw) = release.version() else {
            return Err(InstallError::ReleaseMissingVersion);
        };

        let format = device.version_format();

        // 11. Version-format agreement. Skipped entirely under FORCE or a
        //     branch switch, where format drift is expected.
        if !flags.intersects(InstallFlags::FORCE | InstallFlags::ALLOW_BRANCH_SWITCH) {
            let declared = component.declared_version_formats();
            if !declared.is_empty() {
                check_version_formats(format, &declared)?;
            }
        }

        // 12. Minimum-version floor. This compares the device's *current*
        //     version against its own floor, not the candidate release;
        //     see the quirk note in DESIGN.md.
        if let Some(lowest) = device.version_lowest() {
            if compare(lowest, version, format) == Ordering::Greater {
                if flags.contains(InstallFlags::FORCE) {
                    tracing::warn!(
                        device = device.name(),
                        version,
                        lowest,
                        "ignoring minimum-version floor"
                    );
                } else {
                    return Err(InstallError::BelowMinimumVersion {
                        version: version.to_string(),
                        lowest: lowest.to_string(),
                    });
                }
            }
        }

        // 13. Compare the device version against the (decoded) release
        //     version.
        let version_release = if format == VersionFormat::Plain {
            version_release_raw.to_string()
        } else {
            parse_for_format(version_release_raw, format)
        };
        let vercmp = compare(version, &version_release, format);
        tracing::debug!(
            device = device.name(),
            version,
            release = %version_release,
            ordering = ?vercmp,
            "compared device and release versions"
        );

        if device.has_flag(DeviceFlags::ONLY_VERSION_UPGRADE) && vercmp != Ordering::Less {
            return Err(InstallError::UpgradesOnly);
        }
        if vercmp == Ordering::Equal && !flags.contains(InstallFlags::ALLOW_REINSTALL) {
            return Err(InstallError::AlreadyInstalled {
                version: version_release,
            });
        }
        let is_downgrade = vercmp == Ordering::Greater;
        if is_downgrade
            && !flags.intersects(InstallFlags::ALLOW_OLDER | InstallFlags::ALLOW_BRANCH_SWITCH)
        {
            return Err(InstallError::DowngradeBlocked {
                new: version_release,
                old: version.to_string(),
            });
        }

        // 14. Trust evaluation. "Not supported" means no signature
        //     infrastructure exists for this release and is non-fatal;
        //     everything else propagates unmodified.
        let trust_flags = match trust.evaluate(&release) {
            Ok(adopted) => adopted,
            Err(err) if err.is_not_supported() => {
                tracing::warn!(
                    device = device.name(),
                    error = %err,
                    "ignoring verification"
                );
                TrustFlags::empty()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(ValidatedTask {
            device,
            component,
            trust_flags,
            is_downgrade,
        })
    }
}

/// Checks the device's version format against the component's declared
/// formats.
fn check_version_formats(
    device_format: VersionFormat,
    declared: &[&str],
) -> Result<(), InstallError> {
    if device_format == VersionFormat::Unknown {
        return Err(InstallError::NoDeviceVersionFormat {
            declared: formats_to_string(declared),
        });
    }
    if declared
        .iter()
        .any(|name| VersionFormat::from_name(name) == device_format)
    {
        return Ok(());
    }
    Err(InstallError::VersionFormatMismatch {
        device_format: device_format.as_str().to_string(),
        declared: formats_to_string(declared),
    })
}

/// A task that has passed every requirement check.
///
/// Only this type exposes the derived facts, so they cannot be read from
/// a task that has not validated successfully.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedTask<'a> {
    device: &'a Device,
    component: Component<'a>,
    trust_flags: TrustFlags,
    is_downgrade: bool,
}

impl<'a> ValidatedTask<'a> {
    /// The target device.
    #[must_use]
    pub const fn device(&self) -> &'a Device {
        self.device
    }

    /// The candidate component metadata.
    #[must_use]
    pub const fn component(&self) -> Component<'a> {
        self.component
    }

    /// Trust flags adopted from the evaluator, empty if verification was
    /// unavailable.
    #[must_use]
    pub const fn trust_flags(&self) -> TrustFlags {
        self.trust_flags
    }

    /// Whether the install moves the device to an older version.
    #[must_use]
    pub const fn is_downgrade(&self) -> bool {
        self.is_downgrade
    }

    /// Resolves the authorization tier for this install.
    #[must_use]
    pub fn authorization_tier(&self) -> AuthorizationTier {
        resolve_tier(
            self.device.has_flag(DeviceFlags::INTERNAL),
            self.is_downgrade,
            self.trust_flags.contains(TrustFlags::PAYLOAD),
        )
    }

    /// Orders validated tasks by their device's sequencing order,
    /// ascending.
    #[must_use]
    pub fn cmp_by_order(&self, other: &Self) -> Ordering {
        self.device.order().cmp(&other.device.order())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::metadata::MemoryNode;

    fn device_with_order(order: i32) -> Device {
        Device::builder("d", format!("dev-{order}"))
            .order(order)
            .build()
    }

    #[test]
    fn tasks_order_by_device_order() {
        let first = device_with_order(-1);
        let second = device_with_order(3);
        let root = MemoryNode::new("component");
        let component = Component::new(&root);
        let a = InstallTask::new(&first, component);
        let b = InstallTask::new(&second, component);
        assert_eq!(a.cmp_by_order(&b), Ordering::Less);
        assert_eq!(b.cmp_by_order(&a), Ordering::Greater);
        assert_eq!(a.cmp_by_order(&a), Ordering::Equal);
    }

    proptest! {
        /// The task comparator is a total preorder consistent with the
        /// device order field alone.
        #[test]
        fn comparator_is_consistent_with_order(orders in proptest::collection::vec(-100i32..100, 2..8)) {
            let devices: Vec<Device> = orders.iter().map(|&o| device_with_order(o)).collect();
            let root = MemoryNode::new("component");
            let component = Component::new(&root);
            let mut tasks: Vec<InstallTask<'_>> =
                devices.iter().map(|d| InstallTask::new(d, component)).collect();
            tasks.sort_by(InstallTask::cmp_by_order);
            for pair in tasks.windows(2) {
                prop_assert!(pair[0].device().order() <= pair[1].device().order());
            }
        }
    }
}
