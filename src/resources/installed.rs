//! Discovery of an installed `sqlci.ps1`.

use std::path::PathBuf;

use crate::error::{Result, SqlCiError};

/// Script name of an installed runner.
pub const INSTALLED_SCRIPT: &str = "sqlci.ps1";

/// Product directory under a Program Files root.
const PRODUCT_DIR: [&str; 2] = ["Red Gate", "DLM Automation 2"];

/// Candidate locations, in lookup order, given an environment lookup.
///
/// Each entry pairs the variable it came from with the resulting path, or
/// `None` when the variable is not set.
pub fn candidates<F>(lookup: F) -> Vec<(&'static str, Option<PathBuf>)>
where
    F: Fn(&str) -> Option<String>,
{
    let home = lookup("DLMAS_HOME").map(|home| PathBuf::from(home).join(INSTALLED_SCRIPT));
    let program_files = |var: &'static str| {
        lookup(var).map(|root| {
            PRODUCT_DIR
                .iter()
                .fold(PathBuf::from(root), |path, part| path.join(part))
                .join(INSTALLED_SCRIPT)
        })
    };

    vec![
        ("DLMAS_HOME", home),
        ("ProgramFiles", program_files("ProgramFiles")),
        ("ProgramFiles(X86)", program_files("ProgramFiles(X86)")),
    ]
}

/// Find the first candidate that is an existing file.
pub fn find_with<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut checked = Vec::new();

    for (var, candidate) in candidates(lookup) {
        match candidate {
            Some(path) if path.is_file() => return Ok(path),
            Some(path) => checked.push(path.display().to_string()),
            None => checked.push(format!("${} (not set)", var)),
        }
    }

    Err(SqlCiError::ResourceNotFound {
        resource: INSTALLED_SCRIPT.to_string(),
        checked,
    })
}

/// Find an installed runner using the process environment.
pub fn find() -> Result<PathBuf> {
    find_with(|var| std::env::var(var).ok())
}
