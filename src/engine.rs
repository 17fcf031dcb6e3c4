use std::path::Path;

use anyhow::Result;

use crate::core::{DEFAULT_ARCH, OsMetadata, UpdateManifest, UpdatePackage};
use crate::wiz::{self, WizReport};

pub const EMPTY_REPORT_MESSAGE: &str =
    "wiz report appears empty or malformed (no OS info or vulnerabilities)";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Written to `metadata.config.arch`; the report itself has no say.
    pub default_arch: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_arch: DEFAULT_ARCH.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    opts: EngineOptions,
}

impl Engine {
    pub fn new(opts: EngineOptions) -> Self {
        Self { opts }
    }

    /// Reads the report at `path` and converts it.
    pub fn parse(&self, path: &Path) -> Result<UpdateManifest> {
        let report = wiz::read_report(path)?;
        self.convert(&report)
    }

    pub fn convert(&self, report: &WizReport) -> Result<UpdateManifest> {
        if report.is_empty() {
            return Err(crate::exit::validation(EMPTY_REPORT_MESSAGE));
        }

        let mut manifest = UpdateManifest::new(
            OsMetadata {
                os_type: report.os_name().to_string(),
                version: report.os_version().to_string(),
            },
            self.opts.default_arch.as_str(),
        );

        manifest.updates = report
            .fixable()
            .map(|v| UpdatePackage {
                name: v.package_name.clone(),
                installed_version: v.installed_version.clone(),
                fixed_version: v.fixed_version.clone(),
                vulnerability_id: v.cve_id.clone(),
            })
            .collect();

        log::debug!(
            "kept {} of {} vulnerabilities with a fixed version",
            manifest.updates.len(),
            report.vulnerability_count()
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::{ExitCode, code_of};
    use crate::wiz::{WizOs, WizVulnerability};

    fn vuln(name: &str, installed: &str, fixed: &str, cve: &str) -> WizVulnerability {
        WizVulnerability {
            package_name: name.to_string(),
            installed_version: installed.to_string(),
            fixed_version: fixed.to_string(),
            cve_id: cve.to_string(),
        }
    }

    fn report(os: &str, vulns: Vec<WizVulnerability>) -> WizReport {
        WizReport {
            os: WizOs {
                name: os.to_string(),
                version: "1.0".to_string(),
            },
            vulnerabilities: vulns,
        }
    }

    #[test]
    fn converts_example_report() {
        let input = report(
            "ubuntu",
            vec![
                vuln("openssl", "1.1.1", "1.1.2", "CVE-2023-0001"),
                vuln("curl", "7.0", "", "CVE-2023-0002"),
            ],
        );
        let manifest = Engine::new(EngineOptions::default())
            .convert(&input)
            .expect("convert");

        assert_eq!(manifest.api_version, "v1alpha1");
        assert_eq!(manifest.metadata.os.os_type, "ubuntu");
        assert_eq!(manifest.metadata.os.version, "1.0");
        assert_eq!(manifest.metadata.config.arch, "amd64");
        assert_eq!(
            manifest.updates,
            vec![UpdatePackage {
                name: "openssl".to_string(),
                installed_version: "1.1.1".to_string(),
                fixed_version: "1.1.2".to_string(),
                vulnerability_id: "CVE-2023-0001".to_string(),
            }]
        );
    }

    #[test]
    fn filter_keeps_order_and_duplicates() {
        let input = report(
            "debian",
            vec![
                vuln("c", "1", "2", "CVE-3"),
                vuln("x", "1", "", "CVE-X"),
                vuln("a", "1", "2", "CVE-1"),
                vuln("c", "1", "2", "CVE-3"),
                vuln("y", "", "", ""),
            ],
        );
        let manifest = Engine::new(EngineOptions::default())
            .convert(&input)
            .expect("convert");
        let ids: Vec<&str> = manifest
            .updates
            .iter()
            .map(|u| u.vulnerability_id.as_str())
            .collect();
        assert_eq!(ids, vec!["CVE-3", "CVE-1", "CVE-3"]);
    }

    #[test]
    fn empty_report_is_rejected() {
        let err = Engine::new(EngineOptions::default())
            .convert(&WizReport::default())
            .expect_err("empty report");
        assert_eq!(code_of(&err), ExitCode::Validation);
        assert_eq!(err.to_string(), EMPTY_REPORT_MESSAGE);
    }

    #[test]
    fn os_without_vulnerabilities_yields_no_updates() {
        let manifest = Engine::new(EngineOptions::default())
            .convert(&report("alpine", vec![]))
            .expect("convert");
        assert!(manifest.updates.is_empty());
    }

    #[test]
    fn vulnerabilities_without_os_are_accepted() {
        let manifest = Engine::new(EngineOptions::default())
            .convert(&report("", vec![vuln("zlib", "1.2", "1.3", "CVE-9")]))
            .expect("convert");
        assert_eq!(manifest.metadata.os.os_type, "");
        assert_eq!(manifest.updates.len(), 1);
    }

    #[test]
    fn all_unfixed_yields_empty_updates() {
        let manifest = Engine::new(EngineOptions::default())
            .convert(&report("", vec![vuln("zlib", "1.2", "", "CVE-9")]))
            .expect("convert");
        assert!(manifest.updates.is_empty());
    }

    #[test]
    fn arch_falls_back_to_configured_default() {
        let engine = Engine::new(EngineOptions {
            default_arch: "arm64".to_string(),
        });
        let manifest = engine.convert(&report("alpine", vec![])).expect("convert");
        assert_eq!(manifest.metadata.config.arch, "arm64");
    }

    #[test]
    fn architecture_in_report_is_ignored() {
        let input = wiz::parse_report(
            br#"{"os":{"name":"ubuntu","version":"22.04"},"architecture":"arm64","vulnerabilities":[]}"#,
        )
        .expect("parse");
        let manifest = Engine::new(EngineOptions::default())
            .convert(&input)
            .expect("convert");
        assert_eq!(manifest.metadata.config.arch, "amd64");
    }

    #[test]
    fn conversion_is_deterministic() {
        let input = report(
            "ubuntu",
            vec![
                vuln("openssl", "1.1.1", "1.1.2", "CVE-2023-0001"),
                vuln("curl", "7.0", "", "CVE-2023-0002"),
            ],
        );
        let engine = Engine::new(EngineOptions::default());
        let a = serde_json::to_vec(&engine.convert(&input).expect("convert")).expect("json");
        let b = serde_json::to_vec(&engine.convert(&input).expect("convert")).expect("json");
        assert_eq!(a, b);
    }
}
