//! Input side of the converter: the Wiz scanner report.
//!
//! The report layout is provisional until a real Wiz sample is available, so
//! everything that knows about it lives here. The engine only talks to the
//! accessors on [`WizReport`].
//!
//! Keys are matched case-insensitively. A repeated key is applied in document
//! order: objects merge into what was already read, strings and arrays are
//! replaced, and `null` leaves the current value alone.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizReport {
    pub os: WizOs,
    pub vulnerabilities: Vec<WizVulnerability>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizOs {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizVulnerability {
    pub package_name: String,
    pub installed_version: String,
    pub fixed_version: String,
    pub cve_id: String,
}

impl WizReport {
    /// True when the report has neither OS info nor vulnerabilities.
    pub fn is_empty(&self) -> bool {
        self.os.name.is_empty() && self.vulnerabilities.is_empty()
    }

    pub fn os_name(&self) -> &str {
        &self.os.name
    }

    pub fn os_version(&self) -> &str {
        &self.os.version
    }

    pub fn vulnerability_count(&self) -> usize {
        self.vulnerabilities.len()
    }

    /// Vulnerabilities with a known fixed version, in report order.
    pub fn fixable(&self) -> impl Iterator<Item = &WizVulnerability> {
        self.vulnerabilities.iter().filter(|v| v.is_fixable())
    }
}

impl WizVulnerability {
    pub fn is_fixable(&self) -> bool {
        !self.fixed_version.is_empty()
    }
}

pub fn read_report(path: &Path) -> Result<WizReport> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read report: {}", path.display()))
        .map_err(crate::exit::io_err)?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    parse_report(&bytes)
        .with_context(|| format!("failed to parse report: {}", path.display()))
        .map_err(crate::exit::parse_err)
}

pub fn parse_report(bytes: &[u8]) -> Result<WizReport> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Objects whose fields can be filled in one key at a time.
trait MergeFields {
    const EXPECTING: &'static str;

    fn merge_field<'de, A>(&mut self, key: &str, map: &mut A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>;
}

impl MergeFields for WizReport {
    const EXPECTING: &'static str = "a report object";

    fn merge_field<'de, A>(&mut self, key: &str, map: &mut A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        if key_is(key, "os") {
            map.next_value_seed(MergeInto(&mut self.os))
        } else if key_is(key, "vulnerabilities") {
            if let Some(vulnerabilities) = map.next_value::<Option<Vec<WizVulnerability>>>()? {
                self.vulnerabilities = vulnerabilities;
            }
            Ok(())
        } else {
            map.next_value::<IgnoredAny>().map(|_| ())
        }
    }
}

impl MergeFields for WizOs {
    const EXPECTING: &'static str = "an os object";

    fn merge_field<'de, A>(&mut self, key: &str, map: &mut A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        if key_is(key, "name") {
            merge_string(map, &mut self.name)
        } else if key_is(key, "version") {
            merge_string(map, &mut self.version)
        } else {
            map.next_value::<IgnoredAny>().map(|_| ())
        }
    }
}

impl MergeFields for WizVulnerability {
    const EXPECTING: &'static str = "a vulnerability object";

    fn merge_field<'de, A>(&mut self, key: &str, map: &mut A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        if key_is(key, "packageName") {
            merge_string(map, &mut self.package_name)
        } else if key_is(key, "installedVersion") {
            merge_string(map, &mut self.installed_version)
        } else if key_is(key, "fixedVersion") {
            merge_string(map, &mut self.fixed_version)
        } else if key_is(key, "cveId") {
            merge_string(map, &mut self.cve_id)
        } else {
            map.next_value::<IgnoredAny>().map(|_| ())
        }
    }
}

impl<'de> Deserialize<'de> for WizReport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut report = Self::default();
        MergeInto(&mut report).deserialize(deserializer)?;
        Ok(report)
    }
}

impl<'de> Deserialize<'de> for WizVulnerability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut vulnerability = Self::default();
        MergeInto(&mut vulnerability).deserialize(deserializer)?;
        Ok(vulnerability)
    }
}

struct MergeInto<'a, T>(&'a mut T);

impl<'de, T: MergeFields> DeserializeSeed<'de> for MergeInto<'_, T> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, T: MergeFields> Visitor<'de> for MergeInto<'_, T> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(key) = map.next_key::<String>()? {
            self.0.merge_field(&key, &mut map)?;
        }
        Ok(())
    }
}

fn merge_string<'de, A>(map: &mut A, slot: &mut String) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
{
    if let Some(value) = map.next_value::<Option<String>>()? {
        *slot = value;
    }
    Ok(())
}

fn key_is(key: &str, name: &str) -> bool {
    key.chars()
        .flat_map(char::to_lowercase)
        .eq(name.chars().flat_map(char::to_lowercase))
}
