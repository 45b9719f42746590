//! PowerShell resources embedded at compile time.

use include_dir::{include_dir, Dir};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SqlCiError};

/// Embedded resources directory.
static RESOURCES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// Directory, relative to the working directory, the resources land in.
pub const STAGING_DIR: &str = "PowerShell";

/// The script the interpreter runs.
pub const RUNNER_SCRIPT: &str = "SqlChangeAutomationRunner.ps1";

/// Scripts the runner dot-sources from its own directory.
pub const COMPANION_SCRIPTS: [&str; 2] = ["PowershellGallery.ps1", "SqlCi.ps1"];

/// Names of every bundled script, runner first.
pub fn bundled_scripts() -> impl Iterator<Item = &'static str> {
    std::iter::once(RUNNER_SCRIPT).chain(COMPANION_SCRIPTS)
}

/// Contents of one bundled script.
pub fn contents(name: &str) -> Option<&'static [u8]> {
    RESOURCES_DIR
        .get_file(Path::new(STAGING_DIR).join(name))
        .map(|file| file.contents())
}

/// Write every bundled script into `<working_dir>/PowerShell/`.
///
/// Existing copies are overwritten. Returns the staged paths, runner first.
pub fn stage(working_dir: &Path) -> Result<Vec<PathBuf>> {
    let target_dir = working_dir.join(STAGING_DIR);
    fs::create_dir_all(&target_dir).map_err(|source| SqlCiError::StagingIo {
        path: target_dir.clone(),
        source,
    })?;

    let mut staged = Vec::new();
    for name in bundled_scripts() {
        let bytes = contents(name).ok_or_else(|| SqlCiError::ResourceNotFound {
            resource: name.to_string(),
            checked: vec![format!("bundled resources/{}/{}", STAGING_DIR, name)],
        })?;

        let target = target_dir.join(name);
        write_file(&target, bytes).map_err(|source| SqlCiError::StagingIo {
            path: target.clone(),
            source,
        })?;

        tracing::debug!("Staged {}", target.display());
        staged.push(target);
    }

    Ok(staged)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn every_script_is_embedded() {
        for name in bundled_scripts() {
            assert!(contents(name).is_some(), "{} is not embedded", name);
        }
    }

    #[test]
    fn stage_writes_all_scripts() {
        let temp = TempDir::new().unwrap();
        let staged = stage(temp.path()).unwrap();

        assert_eq!(staged.len(), 3);
        assert_eq!(staged[0], temp.path().join("PowerShell").join(RUNNER_SCRIPT));
        for path in &staged {
            assert!(path.is_file());
        }
    }

    #[test]
    fn stage_overwrites_stale_copies() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("PowerShell");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(RUNNER_SCRIPT), "stale").unwrap();

        stage(temp.path()).unwrap();

        let staged = fs::read(dir.join(RUNNER_SCRIPT)).unwrap();
        assert_eq!(staged, contents(RUNNER_SCRIPT).unwrap());
    }

    #[test]
    fn stage_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let first = stage(temp.path()).unwrap();
        let second = stage(temp.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stage_fails_when_target_is_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("PowerShell"), "not a directory").unwrap();

        let err = stage(temp.path()).unwrap_err();
        assert!(matches!(err, SqlCiError::StagingIo { .. }));
    }
}
