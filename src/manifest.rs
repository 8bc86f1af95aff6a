//! Reading and rewriting the package manifest (`Cargo.toml`)

use serde::Deserialize;
use std::fs;
use std::path::Path;
use toml_edit::{value, DocumentMut};

use crate::error::{ReleaseError, Result};

/// `[package] name` and `version` of the project being released
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

#[derive(Deserialize)]
struct ManifestFile {
    package: Option<PackageInfo>,
}

/// Read the package name and version from a manifest file
pub fn read_package_info(path: &Path) -> Result<PackageInfo> {
    let text = fs::read_to_string(path).map_err(|e| {
        ReleaseError::manifest(format!("Cannot read {}: {}", path.display(), e))
    })?;
    parse_package_info(&text)
        .map_err(|e| ReleaseError::manifest(format!("{}: {}", path.display(), e)))
}

/// Parse the package name and version from manifest text
pub fn parse_package_info(text: &str) -> Result<PackageInfo> {
    let manifest: ManifestFile =
        toml::from_str(text).map_err(|e| ReleaseError::manifest(e.to_string()))?;
    manifest
        .package
        .ok_or_else(|| ReleaseError::manifest("missing [package] section with name and version"))
}

/// Replace `[package] version` in manifest text, keeping everything else as written
pub fn set_package_version(text: &str, version: &str) -> Result<String> {
    let mut doc: DocumentMut = text
        .parse()
        .map_err(|e: toml_edit::TomlError| ReleaseError::manifest(e.to_string()))?;

    let package = doc
        .get_mut("package")
        .and_then(|item| item.as_table_like_mut())
        .ok_or_else(|| ReleaseError::manifest("missing [package] table"))?;

    let Some(existing) = package.get_mut("version") else {
        return Err(ReleaseError::manifest("[package] has no version field"));
    };
    if !existing.is_str() {
        // `version.workspace = true` and friends are not ours to rewrite
        return Err(ReleaseError::manifest(
            "[package] version is not a plain string",
        ));
    }

    // keep the original trailing comment and spacing around the value
    let decor = existing.as_value().map(|v| v.decor().clone());
    let mut replacement = value(version);
    if let (Some(decor), Some(new_value)) = (decor, replacement.as_value_mut()) {
        *new_value.decor_mut() = decor;
    }
    *existing = replacement;

    Ok(doc.to_string())
}

/// Rewrite the version in the manifest file in place
pub fn write_package_version(path: &Path, version: &str) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|e| {
        ReleaseError::manifest(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let updated = set_package_version(&text, version)?;
    fs::write(path, updated).map_err(|e| {
        ReleaseError::manifest(format!("Cannot write {}: {}", path.display(), e))
    })
}
