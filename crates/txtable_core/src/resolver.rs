//! Plugin artifact resolution.
//!
//! Transactional tables do not need this; it is the lookup interface for
//! code that layers plugin-based extensions on top of them. Only an
//! in-memory catalogue ships here.

use crate::error::{ResolverError, ResolverResult};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A dotted artifact version such as `1.10.2` or `2.0.0-SNAPSHOT`.
///
/// Numeric components compare numerically. A version with a `-qualifier`
/// sorts before the same version without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactVersion {
    raw: String,
    numbers: Vec<u64>,
    qualifier: Option<String>,
}

impl ArtifactVersion {
    /// Parses a version.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Invalid`] if a dotted component is not a
    /// number.
    pub fn parse(raw: &str) -> ResolverResult<Self> {
        let (base, qualifier) = match raw.split_once('-') {
            Some((base, qualifier)) => (base, Some(qualifier.to_string())),
            None => (raw, None),
        };
        let numbers = base
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| ResolverError::invalid(format!("bad artifact version '{raw}'")))
            })
            .collect::<ResolverResult<Vec<_>>>()?;
        Ok(Self {
            raw: raw.to_string(),
            numbers,
            qualifier,
        })
    }

    /// Returns the version as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for ArtifactVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers
            .cmp(&other.numbers)
            .then_with(|| match (&self.qualifier, &other.qualifier) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ArtifactVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Identifies an artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactId {
    /// Artifact name.
    pub name: String,
    /// Artifact version.
    pub version: ArtifactVersion,
}

impl ArtifactId {
    /// Creates an artifact id, parsing the version.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Invalid`] for a malformed version.
    pub fn new(name: impl Into<String>, version: &str) -> ResolverResult<Self> {
        Ok(Self {
            name: name.into(),
            version: ArtifactVersion::parse(version)?,
        })
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// A plugin class offered by an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Plugin type, such as `"sink"`.
    pub plugin_type: String,
    /// Plugin name within its type.
    pub name: String,
    /// Entry point class or symbol.
    pub class_name: String,
    /// The artifact that provides the plugin.
    pub artifact: ArtifactId,
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlugin {
    /// Where the providing artifact can be loaded from.
    pub location: String,
    /// The selected plugin.
    pub descriptor: PluginDescriptor,
}

/// Chooses one artifact among those offering a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArtifactSelector {
    /// The highest version.
    #[default]
    Latest,
    /// The artifact with exactly this version.
    Exact(String),
}

impl ArtifactSelector {
    /// Picks a candidate. Candidates are keyed by artifact, so iteration
    /// runs from the lowest version to the highest.
    #[must_use]
    pub fn select<'a>(
        &self,
        candidates: &'a BTreeMap<ArtifactId, PluginDescriptor>,
    ) -> Option<&'a PluginDescriptor> {
        match self {
            Self::Latest => candidates.values().next_back(),
            Self::Exact(version) => candidates
                .iter()
                .find(|(id, _)| id.version.as_str() == version)
                .map(|(_, plugin)| plugin),
        }
    }
}

/// Finds the artifact that provides a plugin.
pub trait ArtifactResolver {
    /// Resolves a plugin by type and name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::PluginNotExists`] if no artifact offers the
    /// plugin or the selector rejects every candidate.
    fn resolve(
        &self,
        plugin_type: &str,
        plugin_name: &str,
        selector: &ArtifactSelector,
    ) -> ResolverResult<ResolvedPlugin>;
}

/// An in-memory plugin catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticArtifactResolver {
    plugins: Vec<PluginDescriptor>,
    locations: BTreeMap<ArtifactId, String>,
}

impl StaticArtifactResolver {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an artifact and where it is stored.
    pub fn add_artifact(&mut self, artifact: ArtifactId, location: impl Into<String>) {
        self.locations.insert(artifact, location.into());
    }

    /// Registers a plugin.
    pub fn add_plugin(&mut self, plugin: PluginDescriptor) {
        self.plugins.push(plugin);
    }

    /// Returns where an artifact is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NotFound`] for an unknown artifact.
    pub fn artifact_location(&self, artifact: &ArtifactId) -> ResolverResult<&str> {
        self.locations
            .get(artifact)
            .map(String::as_str)
            .ok_or_else(|| ResolverError::NotFound {
                artifact: artifact.to_string(),
            })
    }
}

impl ArtifactResolver for StaticArtifactResolver {
    fn resolve(
        &self,
        plugin_type: &str,
        plugin_name: &str,
        selector: &ArtifactSelector,
    ) -> ResolverResult<ResolvedPlugin> {
        let not_exists = || ResolverError::PluginNotExists {
            plugin_type: plugin_type.to_string(),
            plugin_name: plugin_name.to_string(),
        };

        let candidates: BTreeMap<ArtifactId, PluginDescriptor> = self
            .plugins
            .iter()
            .filter(|p| p.plugin_type == plugin_type && p.name == plugin_name)
            .map(|p| (p.artifact.clone(), p.clone()))
            .collect();
        let selected = selector.select(&candidates).ok_or_else(not_exists)?;

        // A plugin whose artifact is gone does not exist for callers
        let location = match self.artifact_location(&selected.artifact) {
            Ok(location) => location.to_string(),
            Err(ResolverError::NotFound { .. }) => return Err(not_exists()),
            Err(other) => return Err(other),
        };

        debug!(
            plugin_type,
            plugin_name,
            artifact = %selected.artifact,
            "resolved plugin"
        );
        Ok(ResolvedPlugin {
            location,
            descriptor: selected.clone(),
        })
    }
}
