use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// The modules of the host build, as handed to `resolve`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct BuildModel {
    #[serde(default)]
    pub modules: Vec<BuildModule>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildModule {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<Coordinate>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub repositories: Vec<PublishRepository>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Publication {
    pub name: String,
    pub coordinate: Coordinate,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PublishRepository {
    pub name: String,
    pub url: String,
}

/// The rewritten model plus the packages recorded on the way, input of `triggers`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub branch: String,
    pub model: BuildModel,
    #[serde(default)]
    pub used_packages: BTreeSet<String>,
    #[serde(default)]
    pub published_packages: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_defaults() {
        let model: BuildModel =
            serde_json::from_str(r#"{"modules": [{"name": "app"}]}"#).unwrap();
        assert_eq!(model.modules.len(), 1);
        let module = &model.modules[0];
        assert_eq!(module.name, "app");
        assert!(module.dependencies.is_empty());
        assert!(module.repositories.is_empty());
    }

    #[test]
    fn test_module_with_dependencies() {
        let model: BuildModel = serde_json::from_str(
            r#"{"modules": [{
                "name": "app",
                "group": "org.example",
                "version": "1.0.0",
                "dependencies": [{"group": "org.example", "artifact": "lib", "version": "1.0.0-BRANCHED"}],
                "publications": [{"name": "maven", "coordinate": {"group": "org.example", "artifact": "app", "version": "1.0.0"}}]
            }]}"#,
        )
        .unwrap();
        let module = &model.modules[0];
        assert_eq!(
            module.dependencies[0],
            Coordinate::new("org.example", "lib", "1.0.0-BRANCHED")
        );
        assert_eq!(module.publications[0].name, "maven");
    }
}
