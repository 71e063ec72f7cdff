use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeDirError {
    #[error("neither the configured home_dir nor the platform home variable ({var}) is available")]
    PlatformHomeMissing { var: &'static str },

    #[error("home_dir '{path}' cannot be expanded: platform home variable {var} is not set")]
    TildeUnresolved { path: String, var: &'static str },

    #[error("failed to create home_dir '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

#[cfg(target_os = "windows")]
const PLATFORM_HOME_VAR: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const PLATFORM_HOME_VAR: &str = "HOME";

fn platform_home() -> Option<PathBuf> {
    env::var_os(PLATFORM_HOME_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Resolve the service home directory to an absolute path.
///
/// - `configured = None` → `<platform home>/<default_subdir>`
/// - `~` or `~/x` → expanded against the platform home
/// - relative paths → joined with the current working directory
///
/// With `create = true` the directory (and its parents) is created.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured {
        None => platform_home()
            .ok_or(HomeDirError::PlatformHomeMissing {
                var: PLATFORM_HOME_VAR,
            })?
            .join(default_subdir),
        Some(raw) => expand(&raw)?,
    };

    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        env::current_dir()
            .map_err(HomeDirError::CurrentDir)?
            .join(resolved)
    };

    if create {
        std::fs::create_dir_all(&absolute).map_err(|source| HomeDirError::Create {
            path: absolute.to_string_lossy().to_string(),
            source,
        })?;
    }

    Ok(absolute)
}

fn expand(raw: &str) -> Result<PathBuf, HomeDirError> {
    let rest = match raw.strip_prefix('~') {
        Some(rest) => rest,
        None => return Ok(PathBuf::from(raw)),
    };
    let home = platform_home().ok_or_else(|| HomeDirError::TildeUnresolved {
        path: raw.to_string(),
        var: PLATFORM_HOME_VAR,
    })?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(Path::new(rest)))
    }
}
