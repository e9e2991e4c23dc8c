//! Find out which version of the SDK the current project depends on.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use hypertune::SDK_NAME;
use semver::VersionReq;

const MANIFEST_FILE: &str = "Cargo.toml";

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// How a manifest declares the SDK dependency.
#[derive(Debug, PartialEq)]
enum DependencySpec {
    Version(String),
    /// `hypertune = { workspace = true }`
    Workspace,
    /// A `path` or `git` dependency without a version.
    Unversioned,
}

/// Resolve the SDK version from the nearest `Cargo.toml` at or above `start_dir`.
pub fn resolve_sdk_version(start_dir: &Path) -> Result<String> {
    let Some((manifest_path, manifest)) = find_manifest(start_dir, |_| true)? else {
        bail!(
            "{MANIFEST_FILE} file not found, please run the command from a directory containing \
             a {MANIFEST_FILE} file or specify --sdkVersion manually"
        );
    };

    let spec = package_dependency(&manifest).ok_or_else(|| {
        anyhow!(
            "{} doesn't contain {SDK_NAME} dependency",
            manifest_path.display()
        )
    })?;

    let requirement = match spec {
        DependencySpec::Version(requirement) => requirement,
        DependencySpec::Unversioned => bail!(
            "{SDK_NAME} dependency in {} doesn't specify a version, please specify --sdkVersion \
             manually",
            manifest_path.display()
        ),
        DependencySpec::Workspace => {
            let member_dir = manifest_path.parent().unwrap_or(start_dir);
            workspace_requirement(member_dir)?
        }
    };

    log::debug!(
        target: "hypertune_gen",
        "found {SDK_NAME} = {requirement:?} in {}",
        manifest_path.display()
    );
    version_from_requirement(&requirement)
}

/// Find the `[workspace.dependencies]` entry for the SDK in the manifest of `member_dir` or one
/// above it. A root package can be its own workspace.
fn workspace_requirement(member_dir: &Path) -> Result<String> {
    let Some((workspace_path, workspace)) = find_manifest(member_dir, |manifest| {
        manifest
            .get("workspace")
            .and_then(|w| w.get("dependencies"))
            .is_some()
    })?
    else {
        bail!("{SDK_NAME} is inherited from the workspace, but no workspace {MANIFEST_FILE} was found");
    };

    let dependencies = workspace
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(toml::Value::as_table);
    match dependencies.and_then(find_in_table) {
        Some(DependencySpec::Version(requirement)) => Ok(requirement),
        Some(_) => bail!(
            "{SDK_NAME} dependency in {} doesn't specify a version, please specify --sdkVersion \
             manually",
            workspace_path.display()
        ),
        None => bail!(
            "{} doesn't contain {SDK_NAME} workspace dependency",
            workspace_path.display()
        ),
    }
}

/// Walk up from `start_dir` and return the first manifest accepted by `accept`. Manifests that
/// can't be read are skipped.
fn find_manifest(
    start_dir: &Path,
    accept: impl Fn(&toml::Table) -> bool,
) -> Result<Option<(PathBuf, toml::Table)>> {
    for dir in start_dir.ancestors() {
        let path = dir.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                log::warn!(target: "hypertune_gen", "skipping {}: {err}", path.display());
                continue;
            }
        };
        let manifest: toml::Table = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if accept(&manifest) {
            return Ok(Some((path, manifest)));
        }
    }
    Ok(None)
}

/// Look for the SDK in every dependency table of a package manifest, including target-specific
/// ones.
fn package_dependency(manifest: &toml::Table) -> Option<DependencySpec> {
    let targets = manifest
        .get("target")
        .and_then(toml::Value::as_table)
        .into_iter()
        .flat_map(|targets| targets.values())
        .filter_map(toml::Value::as_table);

    std::iter::once(manifest)
        .chain(targets)
        .flat_map(|table| DEPENDENCY_TABLES.iter().filter_map(move |name| table.get(*name)))
        .filter_map(toml::Value::as_table)
        .find_map(find_in_table)
}

/// Find the SDK in a single dependency table. Renamed dependencies
/// (`alias = { package = "hypertune", ... }`) count too.
fn find_in_table(dependencies: &toml::Table) -> Option<DependencySpec> {
    dependencies.iter().find_map(|(name, value)| {
        let package = value
            .get("package")
            .and_then(toml::Value::as_str)
            .unwrap_or(name.as_str());
        (package == SDK_NAME).then(|| dependency_spec(value))
    })
}

fn dependency_spec(value: &toml::Value) -> DependencySpec {
    match value {
        toml::Value::String(requirement) => DependencySpec::Version(requirement.clone()),
        toml::Value::Table(table) => {
            if table.get("workspace").and_then(toml::Value::as_bool) == Some(true) {
                return DependencySpec::Workspace;
            }
            match table.get("version").and_then(toml::Value::as_str) {
                Some(requirement) => DependencySpec::Version(requirement.to_owned()),
                None => DependencySpec::Unversioned,
            }
        }
        _ => DependencySpec::Unversioned,
    }
}

/// Turn a Cargo version requirement into the version it names: `"^1.2"` becomes `"1.2.0"`.
fn version_from_requirement(requirement: &str) -> Result<String> {
    let req = VersionReq::parse(requirement)
        .with_context(|| format!("invalid {SDK_NAME} version requirement {requirement:?}"))?;
    let Some(comparator) = req.comparators.first() else {
        bail!("{SDK_NAME} version requirement {requirement:?} doesn't name a version, please specify --sdkVersion manually");
    };

    let mut version = format!(
        "{}.{}.{}",
        comparator.major,
        comparator.minor.unwrap_or(0),
        comparator.patch.unwrap_or(0)
    );
    if !comparator.pre.is_empty() {
        version.push('-');
        version.push_str(comparator.pre.as_str());
    }
    Ok(version)
}
