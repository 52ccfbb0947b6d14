//! Named profiles with one-level inheritance from the `default` profile.
//!
//! `sources`, `processors` and `routes` are YAML mappings from a profile
//! name to a body whose fields are all optional. Every profile other than
//! `default` fills each missing field from `default`; `default` itself has
//! no fallback. Document order is kept so routes can be matched first-wins.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

use crate::constants::DEFAULT_PROFILE_NAME;

/// A raw profile body whose fields can be inherited.
pub trait Profile: Clone + Default {
    /// Field-wise `self.field.or(default.field)`.
    fn inherit(&self, default: &Self) -> Self;
}

/// Fill an unset optional field from the default profile.
pub(crate) fn inherit_field<T: Clone>(own: &Option<T>, default: &Option<T>) -> Option<T> {
    own.clone().or_else(|| default.clone())
}

/// Order-preserving `name -> profile` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedProfiles<P> {
    entries: Vec<(String, P)>,
}

impl<P> Default for NamedProfiles<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P> NamedProfiles<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a profile, replacing any earlier one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, profile: P) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = profile,
            None => self.entries.push((name, profile)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> FromIterator<(String, P)> for NamedProfiles<P> {
    fn from_iter<I: IntoIterator<Item = (String, P)>>(iter: I) -> Self {
        let mut profiles = Self::new();
        for (name, profile) in iter {
            profiles.insert(name, profile);
        }
        profiles
    }
}

/// Resolve inheritance for every profile.
///
/// Runs once at load time; the result contains no unresolved fields other
/// than those `default` leaves unset too.
pub fn resolve_profiles<P: Profile>(profiles: &NamedProfiles<P>) -> NamedProfiles<P> {
    let default = profiles.get(DEFAULT_PROFILE_NAME).cloned().unwrap_or_default();

    profiles
        .iter()
        .map(|(name, profile)| {
            let resolved = if name == DEFAULT_PROFILE_NAME {
                profile.clone()
            } else {
                profile.inherit(&default)
            };
            (name.to_string(), resolved)
        })
        .collect()
}

impl<'de, P> Deserialize<'de> for NamedProfiles<P>
where
    P: Deserialize<'de> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(NamedProfilesVisitor(PhantomData))
    }
}

struct NamedProfilesVisitor<P>(PhantomData<P>);

impl<'de, P> Visitor<'de> for NamedProfilesVisitor<P>
where
    P: Deserialize<'de> + Default,
{
    type Value = NamedProfiles<P>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping of profile names to profiles")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        // `routes:` with nothing under it
        Ok(NamedProfiles::new())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut profiles = NamedProfiles::new();
        while let Some((name, profile)) = map.next_entry::<String, Option<P>>()? {
            if profiles.contains(&name) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate profile '{}'",
                    name
                )));
            }
            // A bare `name:` key declares a profile that inherits everything.
            profiles.entries.push((name, profile.unwrap_or_default()));
        }
        Ok(profiles)
    }
}
