//! Test fixtures for common test scenarios.
//!
//! The sample project mirrors a real extension package: a CMake project at
//! the root, an interpreter package with sub-packages, bundled C sources as
//! package data, and a compiled extension installed under `triton/_C`.

use std::path::{Path, PathBuf};

use crate::builder::platform::OsFamily;
use crate::core::manifest::Manifest;
use crate::core::project::MANIFEST_NAME;

/// Manifest text of the sample project.
pub const SAMPLE_MANIFEST: &str = r#"[package]
name = "triton"
version = "1.0.0"
authors = ["Philippe Tillet"]
description = "A language and compiler for custom Deep Learning operations"
license = "MIT"
keywords = ["Compiler", "Deep Learning"]
homepage = "https://github.com/ptillet/triton/"
classifiers = ["Development Status :: 3 - Alpha", "Programming Language :: Python :: 3.6"]
packages = ["triton", "triton/_C", "triton/ops", "triton/ops/blocksparse"]
install_requires = ["numpy", "torch"]

[package.data]
"triton/ops" = ["*.c"]
"triton/ops/blocksparse" = ["*.c"]

[package.entry_points]
console_scripts = ["triton-info = triton.tools:main"]

[extension]
name = "triton"
path = "triton/_C"
"#;

/// Sources and data files of the sample project, relative to its root.
const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "CMakeLists.txt",
        "cmake_minimum_required(VERSION 3.6)\nproject(triton)\n",
    ),
    ("triton/__init__.py", "from .kernel import *\n"),
    ("triton/kernel.py", "def kernel():\n    pass\n"),
    ("triton/_C/__init__.py", ""),
    ("triton/ops/__init__.py", "from .matmul import matmul\n"),
    ("triton/ops/matmul.py", "def matmul(a, b):\n    pass\n"),
    ("triton/ops/matmul.c", "__global__ void matmul() {}\n"),
    ("triton/ops/README.md", "not shipped\n"),
    ("triton/ops/blocksparse/__init__.py", ""),
    ("triton/ops/blocksparse/softmax.c", "__global__ void softmax() {}\n"),
];

/// The sample manifest, parsed.
pub fn sample_manifest() -> Manifest {
    Manifest::parse(SAMPLE_MANIFEST).expect("sample manifest is valid")
}

/// Write the sample project under `root`; returns the manifest path.
pub fn write_sample_project(root: &Path) -> PathBuf {
    for (rel, contents) in SAMPLE_FILES {
        write_file(&root.join(rel), contents);
    }

    let manifest_path = root.join(MANIFEST_NAME);
    write_file(&manifest_path, SAMPLE_MANIFEST);
    manifest_path
}

/// Drop a fake compiled extension named `name` into `dir` for `os`.
pub fn write_fake_artifact(dir: &Path, name: &str, os: OsFamily) -> PathBuf {
    let suffix = os.extension_suffixes()[0];
    let file_name = match os {
        OsFamily::Windows => format!("{}.{}", name, suffix),
        _ => format!("lib{}.{}", name, suffix),
    };
    let path = dir.join(file_name);
    write_file(&path, "\x7fELF");
    path
}

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }
    std::fs::write(path, contents).expect("write fixture file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_project_layout() {
        let tmp = TempDir::new().unwrap();
        let manifest = write_sample_project(tmp.path());

        assert!(manifest.is_file());
        assert!(tmp.path().join("CMakeLists.txt").is_file());
        assert!(tmp.path().join("triton/ops/blocksparse/softmax.c").is_file());
        assert_eq!(Manifest::load(&manifest).unwrap(), sample_manifest());
    }
}
