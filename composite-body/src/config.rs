// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Destruction tuning
//!
//! # Environment Configuration
//!
//! [`FissionConfig::from_env`] starts from the defaults and applies:
//!
//! ```bash
//! export COMPOSITE_BODY_ROOT_LOSS=largest-branch   # lowest-slot | largest-branch | destroy
//! export COMPOSITE_BODY_FIXTURE_HEALTH=250
//! ```
//!
//! Deserialized configurations go through the same range checks as the
//! builder methods: fixture health must be positive and contact damage must
//! not be negative.

use crate::error::ConfigError;
use crate::fission::RootLossPolicy;
use serde::{Deserialize, Serialize};

/// Environment variable selecting the root loss policy
pub const ROOT_LOSS_ENV: &str = "COMPOSITE_BODY_ROOT_LOSS";

/// Environment variable overriding the starting fixture health
pub const FIXTURE_HEALTH_ENV: &str = "COMPOSITE_BODY_FIXTURE_HEALTH";

/// Configuration for fixture health and fission behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFissionConfig")]
pub struct FissionConfig {
    /// Health of a freshly revived fixture
    pub fixture_health: i32,
    /// Health removed from each fixture per allowed contact
    pub contact_damage: i32,
    /// What happens when the root slot is destroyed
    pub root_loss: RootLossPolicy,
    /// Whether to log every fission at info level
    pub log_fission_events: bool,
}

impl Default for FissionConfig {
    fn default() -> Self {
        FissionConfig {
            fixture_health: 100,
            contact_damage: 1,
            root_loss: RootLossPolicy::PromoteLowestSlot,
            log_fission_events: true,
        }
    }
}

/// Unchecked wire form of [`FissionConfig`]
#[derive(Deserialize)]
#[serde(default)]
struct RawFissionConfig {
    fixture_health: i32,
    contact_damage: i32,
    root_loss: RootLossPolicy,
    log_fission_events: bool,
}

impl Default for RawFissionConfig {
    fn default() -> Self {
        let config = FissionConfig::default();
        RawFissionConfig {
            fixture_health: config.fixture_health,
            contact_damage: config.contact_damage,
            root_loss: config.root_loss,
            log_fission_events: config.log_fission_events,
        }
    }
}

impl TryFrom<RawFissionConfig> for FissionConfig {
    type Error = ConfigError;

    fn try_from(raw: RawFissionConfig) -> Result<Self, Self::Error> {
        let config = FissionConfig {
            fixture_health: raw.fixture_health,
            contact_damage: raw.contact_damage,
            root_loss: raw.root_loss,
            log_fission_events: raw.log_fission_events,
        };
        config.validate()?;
        Ok(config)
    }
}

impl FissionConfig {
    /// Create a configuration with custom health and root loss policy
    ///
    /// # Panics
    ///
    /// Panics if `fixture_health` is not positive.
    pub fn new(fixture_health: i32, root_loss: RootLossPolicy) -> Self {
        FissionConfig::default()
            .with_fixture_health(fixture_health)
            .with_root_loss(root_loss)
    }

    /// Set the starting health of fixtures
    pub fn with_fixture_health(mut self, health: i32) -> Self {
        assert!(health > 0, "Fixture health must be positive");
        self.fixture_health = health;
        self
    }

    /// Set the damage dealt per contact
    pub fn with_contact_damage(mut self, damage: i32) -> Self {
        assert!(damage >= 0, "Contact damage must not be negative");
        self.contact_damage = damage;
        self
    }

    /// Set the root loss policy
    pub fn with_root_loss(mut self, policy: RootLossPolicy) -> Self {
        self.root_loss = policy;
        self
    }

    /// Disable info-level fission logging
    pub fn without_fission_logging(mut self) -> Self {
        self.log_fission_events = false;
        self
    }

    /// Check that every setting is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixture_health <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "fixture_health",
                expected: "positive",
                value: self.fixture_health,
            });
        }
        if self.contact_damage < 0 {
            return Err(ConfigError::OutOfRange {
                field: "contact_damage",
                expected: "zero or more",
                value: self.contact_damage,
            });
        }
        Ok(())
    }

    /// Defaults overridden by `COMPOSITE_BODY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    ///
    /// `lookup` receives the environment variable names; missing keys keep
    /// their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = FissionConfig::default();

        if let Some(value) = lookup(ROOT_LOSS_ENV) {
            config.root_loss = RootLossPolicy::from_name(&value).ok_or(ConfigError::InvalidValue {
                key: ROOT_LOSS_ENV,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(FIXTURE_HEALTH_ENV) {
            config.fixture_health = match value.trim().parse::<i32>() {
                Ok(health) if health > 0 => health,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: FIXTURE_HEALTH_ENV,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}
