//! Authorization-tier resolution.
//!
//! Once a task has passed validation, the daemon asks an external
//! authorization subsystem for approval. Which privilege level it asks
//! for depends on three facts: whether the device is internal or
//! hotplug, whether the install is a downgrade, and whether the payload
//! is trusted. Removable devices get relaxed tiers; downgrades always
//! dominate trust.
//!
//! The resolver is a pure decision table. Its output is an opaque
//! identifier; this crate attaches no meaning to it beyond the mapping.

use serde::{Deserialize, Serialize};

/// The privilege level required to approve an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum AuthorizationTier {
    /// Downgrade on a removable device.
    DowngradeHotplug,
    /// Trusted-payload update on a removable device.
    UpdateHotplugTrusted,
    /// Update on a removable device.
    UpdateHotplug,
    /// Downgrade on an internal device.
    DowngradeInternal,
    /// Trusted-payload update on an internal device.
    UpdateInternalTrusted,
    /// Update on an internal device.
    UpdateInternal,
}

impl AuthorizationTier {
    /// The opaque action identifier consumed by the authorization
    /// subsystem.
    #[must_use]
    pub const fn action_id(self) -> &'static str {
        match self {
            Self::DowngradeHotplug => "downgrade-hotplug",
            Self::UpdateHotplugTrusted => "update-hotplug-trusted",
            Self::UpdateHotplug => "update-hotplug",
            Self::DowngradeInternal => "downgrade-internal",
            Self::UpdateInternalTrusted => "update-internal-trusted",
            Self::UpdateInternal => "update-internal",
        }
    }
}

impl std::fmt::Display for AuthorizationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action_id())
    }
}

/// Resolves the authorization tier for an install.
///
/// Downgrade takes precedence over payload trust on both localities.
#[must_use]
pub const fn resolve_tier(
    internal: bool,
    is_downgrade: bool,
    payload_trusted: bool,
) -> AuthorizationTier {
    if !internal {
        if is_downgrade {
            return AuthorizationTier::DowngradeHotplug;
        }
        if payload_trusted {
            return AuthorizationTier::UpdateHotplugTrusted;
        }
        return AuthorizationTier::UpdateHotplug;
    }
    if is_downgrade {
        return AuthorizationTier::DowngradeInternal;
    }
    if payload_trusted {
        return AuthorizationTier::UpdateInternalTrusted;
    }
    AuthorizationTier::UpdateInternal
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn full_decision_table() {
        let table = [
            (false, true, false, AuthorizationTier::DowngradeHotplug),
            (false, true, true, AuthorizationTier::DowngradeHotplug),
            (false, false, true, AuthorizationTier::UpdateHotplugTrusted),
            (false, false, false, AuthorizationTier::UpdateHotplug),
            (true, true, false, AuthorizationTier::DowngradeInternal),
            (true, true, true, AuthorizationTier::DowngradeInternal),
            (true, false, true, AuthorizationTier::UpdateInternalTrusted),
            (true, false, false, AuthorizationTier::UpdateInternal),
        ];
        for (internal, downgrade, trusted, expected) in table {
            assert_eq!(
                resolve_tier(internal, downgrade, trusted),
                expected,
                "internal={internal} downgrade={downgrade} trusted={trusted}"
            );
        }
    }

    #[test]
    fn action_ids_are_distinct() {
        let tiers = [
            AuthorizationTier::DowngradeHotplug,
            AuthorizationTier::UpdateHotplugTrusted,
            AuthorizationTier::UpdateHotplug,
            AuthorizationTier::DowngradeInternal,
            AuthorizationTier::UpdateInternalTrusted,
            AuthorizationTier::UpdateInternal,
        ];
        for (i, a) in tiers.iter().enumerate() {
            for b in &tiers[i + 1..] {
                assert_ne!(a.action_id(), b.action_id());
            }
        }
    }

    proptest! {
        /// The resolver is a pure function: same inputs, same tier.
        #[test]
        fn resolver_is_deterministic(
            internal in any::<bool>(),
            downgrade in any::<bool>(),
            trusted in any::<bool>(),
        ) {
            prop_assert_eq!(
                resolve_tier(internal, downgrade, trusted),
                resolve_tier(internal, downgrade, trusted)
            );
        }

        /// Downgrade dominates trust on both localities.
        #[test]
        fn downgrade_dominates_trust(internal in any::<bool>(), trusted in any::<bool>()) {
            let tier = resolve_tier(internal, true, trusted);
            prop_assert!(matches!(
                tier,
                AuthorizationTier::DowngradeHotplug | AuthorizationTier::DowngradeInternal
            ));
        }
    }
}
