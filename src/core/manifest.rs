use serde::{Deserialize, Serialize};

/// Manifest schema version understood by the downstream patcher.
pub const API_VERSION: &str = "v1alpha1";

/// Architecture used when the report does not say otherwise.
pub const DEFAULT_ARCH: &str = "amd64";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub api_version: String,
    pub metadata: Metadata,
    pub updates: Vec<UpdatePackage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub os: OsMetadata,
    pub config: Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsMetadata {
    #[serde(rename = "type")]
    pub os_type: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackage {
    pub name: String,
    pub installed_version: String,
    pub fixed_version: String,
    #[serde(rename = "vulnerabilityID")]
    pub vulnerability_id: String,
}

impl UpdateManifest {
    pub fn new(os: OsMetadata, arch: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            metadata: Metadata {
                os,
                config: Config { arch: arch.into() },
            },
            updates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_updates_serialize_as_array() {
        let manifest = UpdateManifest::new(
            OsMetadata {
                os_type: "alpine".to_string(),
                version: "3.19".to_string(),
            },
            DEFAULT_ARCH,
        );
        let v = serde_json::to_value(&manifest).expect("serialize");
        assert_eq!(v["updates"], serde_json::json!([]));
        assert_eq!(v["apiVersion"], "v1alpha1");
        assert_eq!(v["metadata"]["os"]["type"], "alpine");
        assert_eq!(v["metadata"]["config"]["arch"], "amd64");
    }

    #[test]
    fn keys_are_emitted_in_schema_order() {
        let mut manifest = UpdateManifest::new(
            OsMetadata {
                os_type: "ubuntu".to_string(),
                version: "22.04".to_string(),
            },
            DEFAULT_ARCH,
        );
        manifest.updates.push(UpdatePackage {
            name: "openssl".to_string(),
            installed_version: "1.1.1".to_string(),
            fixed_version: "1.1.2".to_string(),
            vulnerability_id: "CVE-2023-0001".to_string(),
        });
        let s = serde_json::to_string(&manifest).expect("serialize");
        assert_eq!(
            s,
            r#"{"apiVersion":"v1alpha1","metadata":{"os":{"type":"ubuntu","version":"22.04"},"config":{"arch":"amd64"}},"updates":[{"name":"openssl","installedVersion":"1.1.1","fixedVersion":"1.1.2","vulnerabilityID":"CVE-2023-0001"}]}"#
        );
    }
}
