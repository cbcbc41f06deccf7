//! `resolve` command: show where specifiers point.

use anyhow::{Result, bail};
use dynreload::fingerprint::compute_file_hash;
use dynreload::{ReloadError, Reloader, log};
use std::io::{self, Write};
use std::path::Path;

pub fn run(reloader: &Reloader, specifiers: &[String]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let mut failed = 0;

    for specifier in specifiers {
        match reloader.resolve(specifier) {
            Ok(resolved) => {
                writeln!(stdout, "{}", describe(&resolved.path))?;
            }
            Err(ReloadError::ModuleNotFound { specifier, tried }) => {
                failed += 1;
                log!("error"; "module not found: {}", specifier);
                for candidate in tried {
                    eprintln!("- {}", candidate.display());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    stdout.flush()?;
    if failed > 0 {
        bail!("{} of {} specifier(s) did not resolve", failed, specifiers.len());
    }
    Ok(())
}

/// `<path>  <hash>`, with `-` for a file that could not be read.
fn describe(path: &Path) -> String {
    let hash = compute_file_hash(path);
    if hash.is_empty() {
        format!("{}  -", path.display())
    } else {
        format!("{}  {}", path.display(), hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynreload::fingerprint::ContentHash;
    use tempfile::TempDir;

    #[test]
    fn test_describe() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("util.json");
        std::fs::write(&path, "{}").unwrap();

        let hash = ContentHash::of(b"{}");
        assert_eq!(describe(&path), format!("{}  {}", path.display(), hash));
        assert_eq!(
            describe(&dir.path().join("gone.json")),
            format!("{}  -", dir.path().join("gone.json").display())
        );
    }
}
