//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use serde::{Deserialize, Serialize};

// Computation settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpfConfig {
    // Maximum number of entries kept in the SPF log.
    pub spf_log_max_size: usize,
    // Only accept alternates that are downstream of the computing node.
    pub strict_downstream: bool,
    // Search remote alternates for destinations without a local one.
    pub rlfa_enabled: bool,
}

// ===== impl SpfConfig =====

impl Default for SpfConfig {
    fn default() -> SpfConfig {
        SpfConfig {
            spf_log_max_size: 32,
            strict_downstream: false,
            rlfa_enabled: true,
        }
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spf_config_defaults() {
        let config: SpfConfig = toml::from_str("").unwrap();
        assert_eq!(config, SpfConfig::default());

        let config: SpfConfig =
            toml::from_str("strict_downstream = true").unwrap();
        assert!(config.strict_downstream);
        assert!(config.rlfa_enabled);
        assert_eq!(config.spf_log_max_size, 32);

        assert!(toml::from_str::<SpfConfig>("unknown = 1").is_err());
    }
}
