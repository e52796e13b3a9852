//! Package assembly.
//!
//! Stages the installable package in `build_lib`: the compiled extension the
//! build tool left in the output directory, the interpreter sources of every
//! declared package, bundled data files, and a `.dist-info` directory
//! carrying the package metadata.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::platform::OsFamily;
use crate::core::manifest::PackageMetadata;
use crate::core::project::Project;
use crate::util::fs::{copy_file, ensure_dir, glob_files, relative_path, write_string};

/// Everything placed in `build_lib` by [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembledPackage {
    /// The compiled extension
    pub artifact: PathBuf,
    /// Copied sources and data files, in `build_lib`
    pub files: Vec<PathBuf>,
    pub dist_info: PathBuf,
}

/// Assemble the package for the current host.
pub fn assemble(project: &Project, artifact_dir: &Path) -> Result<AssembledPackage> {
    assemble_for(project, artifact_dir, OsFamily::current())
}

/// Assemble the package, locating the artifact by the loading convention of `os`.
pub fn assemble_for(
    project: &Project,
    artifact_dir: &Path,
    os: OsFamily,
) -> Result<AssembledPackage> {
    let manifest = project.manifest();
    let artifact = find_artifact(artifact_dir, &manifest.extension.name, os)?;
    tracing::debug!("found native extension at {}", artifact.display());

    let build_lib = project.build_lib();
    ensure_dir(&build_lib)?;

    let mut files = Vec::new();
    for package in &manifest.package.packages {
        let dir = project.root().join(package);
        if !dir.is_dir() {
            tracing::warn!("package directory `{}` does not exist", dir.display());
            continue;
        }
        let sources = glob_files(project.root(), &[format!("{}/*.py", package)])?;
        files.extend(stage(project.root(), &build_lib, &sources)?);
    }

    for (package, patterns) in &manifest.package.data {
        let patterns: Vec<String> = patterns
            .iter()
            .map(|p| format!("{}/{}", package, p))
            .collect();
        let data = glob_files(project.root(), &patterns)?;
        if data.is_empty() {
            tracing::warn!("no data files matched for `{}`", package);
        }
        files.extend(stage(project.root(), &build_lib, &data)?);
    }

    let dist_info = build_lib.join(format!(
        "{}-{}.dist-info",
        manifest.package.name, manifest.package.version
    ));
    write_string(&dist_info.join("METADATA"), &render_metadata(&manifest.package))?;
    if !manifest.package.entry_points.is_empty() {
        write_string(
            &dist_info.join("entry_points.txt"),
            &render_entry_points(&manifest.package),
        )?;
    }

    Ok(AssembledPackage {
        artifact,
        files,
        dist_info,
    })
}

/// Find the compiled extension `name` in `dir`.
///
/// Matches `lib<name>.*` or `<name>.*` ending in one of the platform's
/// loadable suffixes, so interpreter-tagged names such as
/// `triton.cpython-311-x86_64-linux-gnu.so` are accepted.
pub fn find_artifact(dir: &Path, name: &str, os: OsFamily) -> Result<PathBuf> {
    let suffixes = os.extension_suffixes();
    let prefixes = [format!("lib{}.", name), format!("{}.", name)];

    let mut candidates = Vec::new();
    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let prefixed = prefixes.iter().any(|p| file_name.starts_with(p.as_str()));
            let loadable = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| suffixes.contains(&ext));
            if prefixed && loadable {
                candidates.push(path);
            }
        }
    }

    candidates.sort();
    match candidates.into_iter().next() {
        Some(path) => Ok(path),
        None => {
            let expected: Vec<String> = suffixes
                .iter()
                .flat_map(|s| [format!("lib{}.{}", name, s), format!("{}.{}", name, s)])
                .collect();
            bail!(
                "native extension not found in `{}`\nexpected one of: {}",
                dir.display(),
                expected.join(", ")
            )
        }
    }
}

fn stage(root: &Path, build_lib: &Path, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut placed = Vec::with_capacity(sources.len());
    for src in sources {
        let dst = build_lib.join(relative_path(root, src));
        copy_file(src, &dst)?;
        placed.push(dst);
    }
    Ok(placed)
}

/// Core metadata in the `METADATA` header format.
pub fn render_metadata(package: &PackageMetadata) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Metadata-Version: 2.1");
    let _ = writeln!(out, "Name: {}", package.name);
    let _ = writeln!(out, "Version: {}", package.version);
    if let Some(ref summary) = package.description {
        let _ = writeln!(out, "Summary: {}", summary);
    }
    if let Some(ref homepage) = package.homepage {
        let _ = writeln!(out, "Home-page: {}", homepage);
    }
    if let Some(ref url) = package.download_url {
        let _ = writeln!(out, "Download-URL: {}", url);
    }
    if !package.authors.is_empty() {
        let _ = writeln!(out, "Author: {}", package.authors.join(", "));
    }
    if let Some(ref license) = package.license {
        let _ = writeln!(out, "License: {}", license);
    }
    if !package.keywords.is_empty() {
        let _ = writeln!(out, "Keywords: {}", package.keywords.join(","));
    }
    for classifier in &package.classifiers {
        let _ = writeln!(out, "Classifier: {}", classifier);
    }
    for requirement in &package.install_requires {
        let _ = writeln!(out, "Requires-Dist: {}", requirement);
    }

    out
}

/// `entry_points.txt`: one INI section per group.
pub fn render_entry_points(package: &PackageMetadata) -> String {
    let mut out = String::new();
    for (group, specs) in &package.entry_points {
        let _ = writeln!(out, "[{}]", group);
        for spec in specs {
            let (name, target) = spec.split_once('=').unwrap_or((spec, ""));
            let _ = writeln!(out, "{} = {}", name.trim(), target.trim());
        }
        let _ = writeln!(out);
    }
    out
}
