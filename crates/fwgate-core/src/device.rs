//! Read-only device view consumed by the validation pipeline.
//!
//! The daemon's device abstraction owns the live state (enumeration,
//! capability discovery, version probing); the gatekeeping core only ever
//! reads it. [`Device`] is that read-only view: capability flags, the GUID
//! set a component must intersect, the protocols the device speaks, and
//! its version state.
//!
//! Instances are immutable after construction. Use [`DeviceBuilder`] to
//! assemble one.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::version::VersionFormat;

bitflags! {
    /// Capability flags the pipeline consults.
    ///
    /// The daemon tracks more flags than these; only the ones that alter
    /// install gatekeeping are modelled here.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DeviceFlags: u32 {
        /// The device can currently accept firmware updates.
        const UPDATABLE = 1 << 0;
        /// The device is locked and must be unlocked before flashing.
        const LOCKED = 1 << 1;
        /// Updates may only be staged for offline (next-boot) application.
        const ONLY_OFFLINE = 1 << 2;
        /// The device is internal (non-removable); stricter authorization
        /// applies than for hotplug devices.
        const INTERNAL = 1 << 3;
        /// The component must declare a pre-flash version verification
        /// requirement before this device accepts it.
        const VERSION_CHECK_REQUIRED = 1 << 4;
        /// The device firmware can only move forward, never sideways or
        /// back.
        const ONLY_VERSION_UPGRADE = 1 << 5;
    }
}

/// Immutable snapshot of the device state the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    name: String,
    id: String,
    flags: DeviceFlags,
    guids: BTreeSet<String>,
    protocols: Vec<String>,
    branch: Option<String>,
    version: Option<String>,
    version_lowest: Option<String>,
    version_format: VersionFormat,
    order: i32,
}

impl Device {
    /// Starts building a device with the given diagnostic name and ID.
    #[must_use]
    pub fn builder(name: impl Into<String>, id: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::new(name, id)
    }

    /// Human-readable device name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable device identifier, used in error messages.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All capability flags.
    #[must_use]
    pub const fn flags(&self) -> DeviceFlags {
        self.flags
    }

    /// Returns `true` if the device has every flag in `flags` set.
    #[must_use]
    pub const fn has_flag(&self, flags: DeviceFlags) -> bool {
        self.flags.contains(flags)
    }

    /// The set of GUIDs this device answers to.
    #[must_use]
    pub const fn guids(&self) -> &BTreeSet<String> {
        &self.guids
    }

    /// Returns `true` if `guid` is one of the device's GUIDs.
    #[must_use]
    pub fn has_guid(&self, guid: &str) -> bool {
        self.guids.contains(guid)
    }

    /// Update protocols the device supports. An empty list means the
    /// device is unconstrained.
    #[must_use]
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// Returns `true` if the device supports the given update protocol.
    #[must_use]
    pub fn has_protocol(&self, protocol: &str) -> bool {
        self.protocols.iter().any(|p| p == protocol)
    }

    /// The firmware branch the device is pinned to, if any. Absent means
    /// the default branch.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// The current firmware version, if known.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The lowest firmware version the device may run, if declared.
    #[must_use]
    pub fn version_lowest(&self) -> Option<&str> {
        self.version_lowest.as_deref()
    }

    /// The numbering scheme the device reports versions in.
    #[must_use]
    pub const fn version_format(&self) -> VersionFormat {
        self.version_format
    }

    /// Sequencing order relative to sibling devices. Lower orders flash
    /// first.
    #[must_use]
    pub const fn order(&self) -> i32 {
        self.order
    }
}

/// Builder for [`Device`].
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    /// Creates a builder for a device with no flags, GUIDs, or version
    /// state.
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            device: Device {
                name: name.into(),
                id: id.into(),
                flags: DeviceFlags::empty(),
                guids: BTreeSet::new(),
                protocols: Vec::new(),
                branch: None,
                version: None,
                version_lowest: None,
                version_format: VersionFormat::Unknown,
                order: 0,
            },
        }
    }

    /// Adds capability flags.
    #[must_use]
    pub fn flags(mut self, flags: DeviceFlags) -> Self {
        self.device.flags |= flags;
        self
    }

    /// Adds a GUID.
    #[must_use]
    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        self.device.guids.insert(guid.into());
        self
    }

    /// Adds a supported update protocol.
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.device.protocols.push(protocol.into());
        self
    }

    /// Pins the device to a firmware branch.
    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.device.branch = Some(branch.into());
        self
    }

    /// Sets the current firmware version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.device.version = Some(version.into());
        self
    }

    /// Sets the minimum firmware version floor.
    #[must_use]
    pub fn version_lowest(mut self, version: impl Into<String>) -> Self {
        self.device.version_lowest = Some(version.into());
        self
    }

    /// Sets the version numbering scheme.
    #[must_use]
    pub fn version_format(mut self, format: VersionFormat) -> Self {
        self.device.version_format = format;
        self
    }

    /// Sets the sequencing order.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.device.order = order;
        self
    }

    /// Finalises the device.
    #[must_use]
    pub fn build(self) -> Device {
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_empty() {
        let device = Device::builder("Example Drive", "dev-1").build();
        assert_eq!(device.name(), "Example Drive");
        assert_eq!(device.id(), "dev-1");
        assert!(device.flags().is_empty());
        assert!(device.guids().is_empty());
        assert!(device.protocols().is_empty());
        assert_eq!(device.branch(), None);
        assert_eq!(device.version(), None);
        assert_eq!(device.version_lowest(), None);
        assert_eq!(device.version_format(), VersionFormat::Unknown);
        assert_eq!(device.order(), 0);
    }

    #[test]
    fn guid_membership() {
        let device = Device::builder("d", "1")
            .guid("aabbccdd")
            .guid("11223344")
            .build();
        assert!(device.has_guid("aabbccdd"));
        assert!(device.has_guid("11223344"));
        assert!(!device.has_guid("deadbeef"));
    }

    #[test]
    fn protocol_membership_preserves_order() {
        let device = Device::builder("d", "1")
            .protocol("com.example.dfu")
            .protocol("com.example.flashrom")
            .build();
        assert!(device.has_protocol("com.example.dfu"));
        assert!(!device.has_protocol("com.example.uf2"));
        assert_eq!(device.protocols().len(), 2);
        assert_eq!(device.protocols()[0], "com.example.dfu");
    }

    #[test]
    fn flags_accumulate_across_calls() {
        let device = Device::builder("d", "1")
            .flags(DeviceFlags::UPDATABLE)
            .flags(DeviceFlags::INTERNAL)
            .build();
        assert!(device.has_flag(DeviceFlags::UPDATABLE));
        assert!(device.has_flag(DeviceFlags::INTERNAL));
        assert!(!device.has_flag(DeviceFlags::LOCKED));
    }
}
