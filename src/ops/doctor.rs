//! Build environment health checks.
//!
//! The `doctor` command runs the same probes as a build, without building:
//!
//! ```bash
//! anvil doctor           # Quick check
//! anvil doctor --verbose # Paths, versions and environment
//! ```
//!
//! ## Checks Performed
//!
//! - CMake availability and, on Windows, its minimum version
//! - Interpreter include directory
//! - Accelerator SDK include directory (advisory; a build still attempts to
//!   configure without it)
//! - Sub-build cache state for each build mode

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::builder::accelerator::{AcceleratorContext, AcceleratorKind, SdkRoots, ACCELERATOR_ENV};
use crate::builder::cache::{cache_dir_in, BuildMode};
use crate::builder::interpreter::HostInterpreter;
use crate::builder::platform::HostPlatform;
use crate::builder::toolchain::{locate_cmake, Prober};
use crate::util::config::Config;
use crate::util::fs::dir_size;
use crate::util::process::Executor;

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool or directory (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        DoctorReport::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run every check against `host` with accelerator signal `signal`.
pub fn doctor(
    executor: &dyn Executor,
    config: &Config,
    host: HostPlatform,
    signal: Option<&str>,
) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report.environment.insert("os".to_string(), host.os.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report
        .environment
        .insert("pointer width".to_string(), host.pointer_width.to_string());
    report.environment.insert(
        "cores".to_string(),
        host.available_cores
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    );
    report.environment.insert(
        ACCELERATOR_ENV.to_string(),
        signal.unwrap_or("(unset)").to_string(),
    );

    report.add(check_cmake(executor, config, host));

    let (check, include_dir) = check_interpreter(executor, config);
    report.add(check);

    report.add(check_accelerator(config, signal, include_dir.as_deref()));

    let cache_root = config
        .cache
        .root
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    for mode in BuildMode::ALL {
        report.add(check_cache(&cache_root, mode));
    }

    report.total_duration = start.elapsed();
    report
}

fn check_cmake(executor: &dyn Executor, config: &Config, host: HostPlatform) -> CheckResult {
    let start = Instant::now();

    let result = locate_cmake(config.toolchain.cmake.as_deref())
        .and_then(|program| Prober::new(executor, host).probe(&program));

    let check = match result {
        Ok(info) => {
            let version = info
                .version
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown version".to_string());
            CheckResult::pass("CMake", "build tool found")
                .with_path(info.program)
                .with_version(version)
        }
        Err(e) => CheckResult::fail("CMake", e.to_string()),
    };

    check.with_duration(start.elapsed())
}

fn check_interpreter(executor: &dyn Executor, config: &Config) -> (CheckResult, Option<PathBuf>) {
    let start = Instant::now();

    match HostInterpreter::detect(executor, config.python.executable.as_deref()) {
        Ok(interp) if interp.include_dir.is_dir() => (
            CheckResult::pass("Interpreter headers", interp.executable.display().to_string())
                .with_path(interp.include_dir.clone())
                .with_duration(start.elapsed()),
            Some(interp.include_dir),
        ),
        Ok(interp) => (
            CheckResult::fail(
                "Interpreter headers",
                format!(
                    "include directory {} does not exist (install the interpreter's development headers)",
                    interp.include_dir.display()
                ),
            )
            .with_path(interp.include_dir.clone())
            .with_duration(start.elapsed()),
            Some(interp.include_dir),
        ),
        Err(e) => (
            CheckResult::fail("Interpreter headers", e.to_string()).with_duration(start.elapsed()),
            None,
        ),
    }
}

fn check_accelerator(
    config: &Config,
    signal: Option<&str>,
    interpreter_include: Option<&Path>,
) -> CheckResult {
    let roots = SdkRoots::new(
        config.accelerator.cuda_root.as_deref(),
        config.accelerator.rocm_root.as_deref(),
    );
    let ctx = AcceleratorContext::resolve(
        signal,
        &roots,
        interpreter_include.unwrap_or(Path::new("")),
    );

    let name = match ctx.kind {
        AcceleratorKind::Rocm => "ROCm headers",
        AcceleratorKind::Cuda => "CUDA headers",
        AcceleratorKind::None => "CUDA headers (default)",
    };

    let Some(include) = ctx.sdk_include().map(Path::to_path_buf) else {
        return CheckResult::fail(name, "no SDK include directory resolved").optional();
    };

    let check = if include.is_dir() {
        CheckResult::pass(name, format!("backend: {}", ctx.kind))
    } else {
        CheckResult::fail(
            name,
            format!(
                "{} does not exist; configure will fail unless CMake finds the SDK elsewhere",
                include.display()
            ),
        )
    };

    check.with_path(include).optional()
}

fn check_cache(root: &Path, mode: BuildMode) -> CheckResult {
    let dir = cache_dir_in(root, mode);
    let name = format!("{} sub-build cache", mode);

    let message = if dir.is_dir() {
        format!(
            "present ({:.1} MiB); the next build reuses it",
            dir_size(&dir) as f64 / (1024.0 * 1024.0)
        )
    } else {
        "not yet built; the first build will be slow".to_string()
    };

    CheckResult::pass(name, message).with_path(dir).optional()
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Anvil Doctor");
    let _ = writeln!(output, "============\n");

    if verbose {
        let _ = writeln!(output, "Environment:");
        for (key, value) in &report.environment {
            let _ = writeln!(output, "  {}: {}", key, value);
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nError: {} required check(s) failed. `anvil build` will not succeed.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed. Anvil is ready to build.");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::platform::OsFamily;
    use crate::test_support::{MockExecutor, MockProcessOutput};
    use std::io;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.toolchain.cmake = Some(PathBuf::from("cmake"));
        config.python.executable = Some(PathBuf::from("python3"));
        config.cache.root = Some(tmp.path().join("cache"));
        config.accelerator.cuda_root = Some(tmp.path().join("cuda"));
        config
    }

    fn linux() -> HostPlatform {
        HostPlatform::new(OsFamily::Linux, 64, Some(8))
    }

    #[test]
    fn test_check_result_optional() {
        let result = CheckResult::pass("test", "passed").optional();
        assert!(result.passed);
        assert!(!result.required);
    }

    #[test]
    fn test_doctor_report_required_failed() {
        let mut report = DoctorReport::new();
        report.add(CheckResult::pass("check1", "ok"));
        report.add(CheckResult::fail("check2", "missing"));
        report.add(CheckResult::fail("check3", "missing").optional());

        assert!(!report.all_required_passed());
        assert_eq!(report.required_failed_count(), 1);
        assert_eq!(report.failed_count(), 2);
    }

    #[test]
    fn test_doctor_healthy_environment() {
        let tmp = TempDir::new().unwrap();
        let include = tmp.path().join("include/python3.11");
        std::fs::create_dir_all(&include).unwrap();
        std::fs::create_dir_all(tmp.path().join("cuda/include")).unwrap();
        std::fs::create_dir_all(tmp.path().join("cache/llvm-release")).unwrap();

        let exec = MockExecutor::new();
        exec.expect("cmake --version", MockProcessOutput::success("cmake version 3.27.4"));
        exec.expect_prefix(
            "python3 -c",
            MockProcessOutput::success(include.display().to_string()),
        );

        let report = doctor(&exec, &config_in(&tmp), linux(), Some("cuda"));

        assert!(report.all_required_passed(), "{}", format_report(&report, true));
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.checks[0].version.as_deref(), Some("3.27.4"));

        let text = format_report(&report, true);
        assert!(text.contains("[OK] CUDA headers"));
        assert!(text.contains("present (0.0 MiB); the next build reuses it"));
        assert!(text.contains("not yet built"));
        assert!(text.contains("ANVIL_GPU_BACKEND: cuda"));
    }

    #[test]
    fn test_doctor_missing_sdk_is_advisory() {
        let tmp = TempDir::new().unwrap();
        let include = tmp.path().join("include");
        std::fs::create_dir_all(&include).unwrap();

        let exec = MockExecutor::new();
        exec.expect("cmake --version", MockProcessOutput::success("cmake version 3.27.4"));
        exec.expect_prefix(
            "python3 -c",
            MockProcessOutput::success(include.display().to_string()),
        );

        let report = doctor(&exec, &config_in(&tmp), linux(), Some("rocm"));
        let sdk = report
            .checks
            .iter()
            .find(|c| c.name == "ROCm headers")
            .unwrap();

        assert!(!sdk.passed);
        assert!(!sdk.required);
        assert!(report.all_required_passed());
    }

    #[test]
    fn test_doctor_missing_cmake_fails() {
        let tmp = TempDir::new().unwrap();
        let exec = MockExecutor::new();
        exec.expect_spawn_error("cmake", io::ErrorKind::NotFound);
        exec.expect_spawn_error("python3", io::ErrorKind::NotFound);

        let report = doctor(&exec, &config_in(&tmp), linux(), None);

        assert!(!report.all_required_passed());
        assert_eq!(report.required_failed_count(), 2);

        let text = format_report(&report, false);
        assert!(text.contains("[!!] CMake"));
        assert!(text.contains("`cmake` must be installed"), "{}", text);
        assert!(text.contains("[!!] CUDA headers (default)"));
    }
}
