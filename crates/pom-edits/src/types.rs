//! Domain types for pom.xml edits.

use pom_core::PomError;
use std::fmt;
use std::str::FromStr;

/// Maven artifact coordinates.
///
/// Parsed from `groupId:artifactId[:version]` or a bare `artifactId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
}

impl Coordinates {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            artifact_id: artifact_id.into(),
            version: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group_id) = &self.group_id {
            write!(f, "{group_id}:")?;
        }
        f.write_str(&self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

impl FromStr for Coordinates {
    type Err = PomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PomError::InvalidCoordinates {
            coordinates: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [artifact_id] => Ok(Self {
                group_id: None,
                artifact_id: (*artifact_id).to_string(),
                version: None,
            }),
            [group_id, artifact_id] => Ok(Self::new(*group_id, *artifact_id)),
            [group_id, artifact_id, version] => {
                Ok(Self::new(*group_id, *artifact_id).with_version(*version))
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let c: Coordinates = "org.apache.commons:commons-lang3:3.14.0".parse().unwrap();
        assert_eq!(c.group_id.as_deref(), Some("org.apache.commons"));
        assert_eq!(c.artifact_id, "commons-lang3");
        assert_eq!(c.version.as_deref(), Some("3.14.0"));
        assert_eq!(c.to_string(), "org.apache.commons:commons-lang3:3.14.0");
    }

    #[test]
    fn test_parse_without_version() {
        let c: Coordinates = "junit:junit".parse().unwrap();
        assert_eq!(c, Coordinates::new("junit", "junit"));
    }

    #[test]
    fn test_parse_artifact_only() {
        let c: Coordinates = " maven-jar-plugin ".parse().unwrap();
        assert_eq!(c.group_id, None);
        assert_eq!(c.artifact_id, "maven-jar-plugin");
        assert_eq!(c.to_string(), "maven-jar-plugin");
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "a::b", "g:a:v:extra", ":a", "g:"] {
            let result = input.parse::<Coordinates>();
            assert!(
                matches!(result, Err(PomError::InvalidCoordinates { .. })),
                "{input:?} should be rejected"
            );
        }
    }
}
