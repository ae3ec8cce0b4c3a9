//! Appfile data model.
//!
//! An Appfile declares what a project is (application name and type), where
//! it deploys (infrastructure targets), and which of those targets is
//! active. Parsing and dependency resolution are external collaborators;
//! the compiled result arrives here as a [`crate::graph::Compiled`].

use serde::{Deserialize, Serialize};

/// A declarative project description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appfile {
    /// Stable identity; two appfiles describe the same vertex iff their ids
    /// match.
    pub id: String,
    pub application: Application,
    pub project: Project,
    /// Every infrastructure target the project knows about.
    #[serde(default)]
    pub infrastructure: Vec<Infrastructure>,
}

impl Appfile {
    /// The infrastructure block selected by `project.infrastructure`, if
    /// one is configured.
    pub fn active_infrastructure(&self) -> Option<&Infrastructure> {
        self.infrastructure
            .iter()
            .find(|infra| infra.name == self.project.infrastructure)
    }
}

/// The application section of an Appfile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    /// Application type, e.g. `ruby` or `go`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// The project section of an Appfile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    /// Name of the active infrastructure target.
    pub infrastructure: String,
}

/// One infrastructure target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Infrastructure {
    pub name: String,
    /// Infrastructure type, e.g. `aws`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider subtype selecting the app implementation, e.g. `simple`.
    pub flavor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appfile() -> Appfile {
        Appfile {
            id: "app-1".to_string(),
            application: Application {
                name: "web".to_string(),
                kind: "ruby".to_string(),
            },
            project: Project {
                name: "web project".to_string(),
                infrastructure: "aws".to_string(),
            },
            infrastructure: vec![Infrastructure {
                name: "aws".to_string(),
                kind: "aws".to_string(),
                flavor: "simple".to_string(),
            }],
        }
    }

    #[test]
    fn test_active_infrastructure_finds_named_block() {
        let file = appfile();
        let infra = file.active_infrastructure().expect("active infra");
        assert_eq!(infra.kind, "aws");
        assert_eq!(infra.flavor, "simple");
    }

    #[test]
    fn test_active_infrastructure_missing_returns_none() {
        let mut file = appfile();
        file.project.infrastructure = "gcp".to_string();
        assert!(file.active_infrastructure().is_none());
    }

    #[test]
    fn test_appfile_round_trips_through_json() {
        let file = appfile();
        let raw = serde_json::to_string(&file).expect("encode");
        let back: Appfile = serde_json::from_str(&raw).expect("decode");
        assert_eq!(back.id, file.id);
        assert_eq!(back.application.kind, "ruby");
        assert_eq!(back.infrastructure.len(), 1);
    }
}
