//! Implementation of `anvil clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::cache::BuildMode;
use crate::core::project::Project;
use crate::ops::ext_build::build_cache;
use crate::util::config::Config;
use crate::util::fs::remove_dir_all_if_exists;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Also remove the sub-build caches of every mode
    pub all: bool,
}

/// Remove build output. Returns the directories that existed and were removed.
///
/// The sub-build caches are shared across runs and survive unless `all` is set.
pub fn clean(project: &Project, config: &Config, options: &CleanOptions) -> Result<Vec<PathBuf>> {
    let cache = build_cache(project, config);
    let scratch = cache.configuration(config.mode()).scratch_dir;

    let mut targets = vec![scratch, project.build_lib()];
    if options.all {
        targets.extend(BuildMode::ALL.iter().map(|mode| cache.cache_dir(*mode)));
    }

    let mut removed = Vec::new();
    for dir in targets {
        if remove_dir_all_if_exists(&dir)? {
            tracing::debug!("removed {}", dir.display());
            removed.push(dir);
        }
    }

    Ok(removed)
}
