//! Gatekeeping core for a firmware-update daemon.
//!
//! Before any flashing occurs, every candidate (device, release) pairing
//! must pass a sequence of compatibility, safety, and trust checks. This
//! crate owns that logic and nothing else: no downloading, no device
//! enumeration, no flashing.
//!
//! # Pipeline
//!
//! Callers build one [`task::InstallTask`] per pairing and run
//! [`task::InstallTask::check_requirements`]. A failing check yields an
//! [`error::InstallError`] with a specific [`error::ErrorCategory`]; a
//! passing run yields a [`task::ValidatedTask`] exposing the adopted
//! trust flags, the downgrade determination, and the resolved
//! [`authorization::AuthorizationTier`]. Tasks are then sequenced by
//! device order before execution.
//!
//! # External Collaborators
//!
//! - The device abstraction is consumed read-only via [`device::Device`].
//! - Component metadata is consumed through the minimal
//!   [`metadata::MetadataNode`] tree interface.
//! - Signature inspection is injected through the
//!   [`trust::TrustEvaluator`] trait.
//!
//! # Example
//!
//! ```
//! use fwgate_core::device::{Device, DeviceFlags};
//! use fwgate_core::metadata::{Component, MemoryNode};
//! use fwgate_core::task::{InstallFlags, InstallTask};
//! use fwgate_core::trust::UnavailableTrustEvaluator;
//! use fwgate_core::version::VersionFormat;
//!
//! let device = Device::builder("Example Drive", "dev-1")
//!     .flags(DeviceFlags::UPDATABLE)
//!     .guid("aabbccdd")
//!     .version("1.0.0")
//!     .version_format(VersionFormat::Plain)
//!     .build();
//!
//! let metadata = MemoryNode::new("component")
//!     .with_child(MemoryNode::new("provides").with_child(
//!         MemoryNode::new("firmware")
//!             .with_attr("type", "flashed")
//!             .with_text("aabbccdd"),
//!     ))
//!     .with_child(MemoryNode::new("releases").with_child(
//!         MemoryNode::new("release").with_attr("version", "2.0.0"),
//!     ));
//!
//! let task = InstallTask::new(&device, Component::new(&metadata));
//! let validated = task
//!     .check_requirements(InstallFlags::empty(), &UnavailableTrustEvaluator)
//!     .expect("requirements hold");
//! assert!(!validated.is_downgrade());
//! ```

pub mod authorization;
pub mod device;
pub mod error;
pub mod metadata;
pub mod task;
pub mod trust;
pub mod version;

pub use authorization::{resolve_tier, AuthorizationTier};
pub use device::{Device, DeviceBuilder, DeviceFlags};
pub use error::{ErrorCategory, InstallError};
pub use metadata::{Component, MemoryNode, MetadataNode, Release};
pub use task::{InstallFlags, InstallTask, ValidatedTask};
pub use trust::{TrustError, TrustEvaluator, TrustFlags, UnavailableTrustEvaluator};
pub use version::VersionFormat;
