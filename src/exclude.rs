//! Exclusion rules applied during artifact selection
//!
//! An [`ExcludeSpec`] is a pure predicate over `(group, module, artifact)`
//! candidates. Verdicts depend only on the rule and the candidate.

use crate::error::{ResolveError, ResolveResult};
use crate::model::{ArtifactName, ModuleId};
use std::fmt;
use std::str::FromStr;

/// A name pattern, either exact or the `*` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Any,
    Exact(String),
}

impl Pattern {
    pub fn parse(value: &str) -> Self {
        if value == "*" {
            Self::Any
        } else {
            Self::Exact(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == value,
        }
    }

    fn matches_optional(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Exact(expected), Some(value)) => expected == value,
            (Self::Exact(_), None) => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Exact(value) => write!(f, "{}", value),
        }
    }
}

/// Pattern over the artifacts of matching modules
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPattern {
    pub group: Pattern,
    pub module: Pattern,
    pub name: Pattern,
    pub extension: Pattern,
    pub classifier: Pattern,
}

impl ArtifactPattern {
    fn matches(&self, module: &ModuleId, artifact: &ArtifactName) -> bool {
        self.group.matches(&module.group)
            && self.module.matches(&module.name)
            && self.name.matches(&artifact.name)
            && self.extension.matches(&artifact.extension)
            && self.classifier.matches_optional(artifact.classifier.as_deref())
    }
}

/// A module or artifact to test against an exclusion
#[derive(Debug, Clone, Copy)]
pub struct ExcludeCandidate<'a> {
    pub module: &'a ModuleId,
    pub artifact: Option<&'a ArtifactName>,
}

/// Immutable exclusion predicate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExcludeSpec {
    #[default]
    Nothing,
    Everything,
    Group(String),
    Module(String),
    GroupModule {
        group: String,
        module: String,
    },
    Artifact(ArtifactPattern),
    AnyOf(Vec<ExcludeSpec>),
    AllOf(Vec<ExcludeSpec>),
    Not(Box<ExcludeSpec>),
}

impl ExcludeSpec {
    /// Exclude every artifact of the given module whose name matches
    pub fn artifact(group: &str, module: &str, name: &str) -> Self {
        Self::Artifact(ArtifactPattern {
            group: Pattern::parse(group),
            module: Pattern::parse(module),
            name: Pattern::parse(name),
            extension: Pattern::Any,
            classifier: Pattern::Any,
        })
    }

    /// Union of specs, simplified
    pub fn any_of(specs: impl IntoIterator<Item = ExcludeSpec>) -> Self {
        let mut members = Vec::new();
        for spec in specs {
            match spec {
                Self::Nothing => {}
                Self::Everything => return Self::Everything,
                Self::AnyOf(nested) => {
                    for inner in nested {
                        push_unique(&mut members, inner);
                    }
                }
                other => push_unique(&mut members, other),
            }
        }
        match members.len() {
            0 => Self::Nothing,
            1 => members.remove(0),
            _ => Self::AnyOf(members),
        }
    }

    /// Intersection of specs, simplified
    pub fn all_of(specs: impl IntoIterator<Item = ExcludeSpec>) -> Self {
        let mut members = Vec::new();
        for spec in specs {
            match spec {
                Self::Everything => {}
                Self::Nothing => return Self::Nothing,
                Self::AllOf(nested) => {
                    for inner in nested {
                        push_unique(&mut members, inner);
                    }
                }
                other => push_unique(&mut members, other),
            }
        }
        match members.len() {
            0 => Self::Everything,
            1 => members.remove(0),
            _ => Self::AllOf(members),
        }
    }

    /// Negation of a spec, simplified
    #[allow(clippy::should_implement_trait)]
    pub fn not(spec: ExcludeSpec) -> Self {
        match spec {
            Self::Nothing => Self::Everything,
            Self::Everything => Self::Nothing,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Evaluate the predicate against a candidate
    pub fn excludes(&self, candidate: ExcludeCandidate<'_>) -> bool {
        match self {
            Self::Nothing => false,
            Self::Everything => true,
            Self::Group(group) => candidate.module.group == *group,
            Self::Module(module) => candidate.module.name == *module,
            Self::GroupModule { group, module } => {
                candidate.module.group == *group && candidate.module.name == *module
            }
            Self::Artifact(pattern) => candidate
                .artifact
                .is_some_and(|artifact| pattern.matches(candidate.module, artifact)),
            Self::AnyOf(specs) => specs.iter().any(|spec| spec.excludes(candidate)),
            Self::AllOf(specs) => specs.iter().all(|spec| spec.excludes(candidate)),
            // Artifact rules never decide a whole module, negated or not
            Self::Not(spec) if candidate.artifact.is_none() && spec.has_artifact_rules() => false,
            Self::Not(spec) => !spec.excludes(candidate),
        }
    }

    /// Whether any part of this spec matches on artifact coordinates
    pub fn has_artifact_rules(&self) -> bool {
        match self {
            Self::Artifact(_) => true,
            Self::AnyOf(specs) | Self::AllOf(specs) => specs.iter().any(Self::has_artifact_rules),
            Self::Not(spec) => spec.has_artifact_rules(),
            Self::Nothing
            | Self::Everything
            | Self::Group(_)
            | Self::Module(_)
            | Self::GroupModule { .. } => false,
        }
    }

    /// Whether a whole module is excluded
    ///
    /// Artifact rules, and negations over them, never exclude a module.
    pub fn excludes_module(&self, module: &ModuleId) -> bool {
        self.excludes(ExcludeCandidate {
            module,
            artifact: None,
        })
    }

    /// Whether one artifact of a module is excluded
    pub fn excludes_artifact(&self, module: &ModuleId, artifact: &ArtifactName) -> bool {
        self.excludes(ExcludeCandidate {
            module,
            artifact: Some(artifact),
        })
    }
}

fn push_unique(members: &mut Vec<ExcludeSpec>, spec: ExcludeSpec) {
    if !members.contains(&spec) {
        members.push(spec);
    }
}

impl FromStr for ExcludeSpec {
    type Err = ResolveError;

    /// Parse `group[:module[:artifact[:ext[:classifier]]]]`
    fn from_str(s: &str) -> ResolveResult<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() > 5 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(ResolveError::InvalidExclude(s.to_string()));
        }

        let spec = match parts.as_slice() {
            ["*"] | ["*", "*"] => Self::Everything,
            [group] | [group, "*"] => Self::Group(group.to_string()),
            ["*", module] => Self::Module(module.to_string()),
            [group, module] => Self::GroupModule {
                group: group.to_string(),
                module: module.to_string(),
            },
            [group, module, rest @ ..] => Self::Artifact(ArtifactPattern {
                group: Pattern::parse(group),
                module: Pattern::parse(module),
                name: Pattern::parse(rest[0]),
                extension: rest.get(1).map_or(Pattern::Any, |e| Pattern::parse(e)),
                classifier: rest.get(2).map_or(Pattern::Any, |c| Pattern::parse(c)),
            }),
            [] => return Err(ResolveError::InvalidExclude(s.to_string())),
        };
        Ok(spec)
    }
}

impl fmt::Display for ExcludeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, op: &str, specs: &[ExcludeSpec]| {
            let parts: Vec<String> = specs.iter().map(ToString::to_string).collect();
            write!(f, "{}({})", op, parts.join(", "))
        };
        match self {
            Self::Nothing => write!(f, "nothing"),
            Self::Everything => write!(f, "everything"),
            Self::Group(group) => write!(f, "group {}", group),
            Self::Module(module) => write!(f, "module {}", module),
            Self::GroupModule { group, module } => write!(f, "module {}:{}", group, module),
            Self::Artifact(p) => write!(
                f,
                "artifact {}:{}:{}:{}:{}",
                p.group, p.module, p.name, p.extension, p.classifier
            ),
            Self::AnyOf(specs) => join(f, "anyOf", specs),
            Self::AllOf(specs) => join(f, "allOf", specs),
            Self::Not(spec) => write!(f, "not({})", spec),
        }
    }
}
