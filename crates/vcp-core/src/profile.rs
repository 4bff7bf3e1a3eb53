//! Monitor profiles and the registry that names them.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};

/// One monitor the tool knows how to toggle.
///
/// `source_a` and `source_b` are the two VCP input-source codes the monitor
/// flips between. `match_height` picks the monitor's logical display out of
/// all attached displays (compared against the bottom edge of its rect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorProfile {
    pub name: String,
    pub source_a: u32,
    pub source_b: u32,
    pub match_height: i32,
}

impl MonitorProfile {
    pub fn new(name: impl Into<String>, source_a: u32, source_b: u32, match_height: i32) -> Self {
        Self {
            name: name.into(),
            source_a,
            source_b,
            match_height,
        }
    }

    /// The value to write given the value currently reported by the monitor.
    ///
    /// Only `source_a` is recognised; any other reading (including values
    /// outside the profile) is treated as "currently B", so the result is
    /// always one of the two configured values.
    pub fn next_source(&self, current: u32) -> u32 {
        if current == self.source_a {
            self.source_b
        } else {
            self.source_a
        }
    }

    /// Label a reading as `A`, `B` or `?` for status output.
    pub fn classify(&self, value: u32) -> &'static str {
        if value == self.source_a {
            "A"
        } else if value == self.source_b {
            "B"
        } else {
            "?"
        }
    }
}

/// Ordered, read-only set of profiles with unique names.
///
/// Built once at startup from the config and passed by reference to
/// whatever needs it.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<MonitorProfile>,
}

impl ProfileRegistry {
    pub fn new(profiles: Vec<MonitorProfile>) -> Result<Self, RegistryError> {
        for (i, p) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|q| q.name == p.name) {
                return Err(RegistryError::DuplicateProfile(p.name.clone()));
            }
            if p.source_a == p.source_b {
                return Err(RegistryError::IdenticalSources {
                    name: p.name.clone(),
                    value: p.source_a,
                });
            }
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, name: &str) -> Result<&MonitorProfile, RegistryError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| RegistryError::UnknownProfile {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Profiles in configuration order.
    pub fn iter(&self) -> std::slice::Iter<'_, MonitorProfile> {
        self.profiles.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProfileRegistry {
    type Item = &'a MonitorProfile;
    type IntoIter = std::slice::Iter<'a, MonitorProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
