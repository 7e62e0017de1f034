//! Post-link staging: shared runtime libraries in, object files out.

use crate::platform::Platform;
use crate::{BuildError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Copy every shared library (`*.dll` or `*.so`, per `platform`) found
/// directly in `dirs` into `out_dir`. Missing directories are skipped.
///
/// Returns the staged destination paths.
pub fn stage_shared_libs(dirs: &[PathBuf], out_dir: &Path, platform: Platform) -> Result<Vec<PathBuf>> {
    let extension = platform.shared_lib_extension();
    let mut staged = Vec::new();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping shared library directory");
                continue;
            }
        };

        let mut libs: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
            .collect();
        libs.sort();

        if libs.is_empty() {
            warn!(dir = %dir.display(), "no *.{} files to stage", extension);
        }

        for lib in libs {
            let Some(name) = lib.file_name() else {
                continue;
            };
            let dest = out_dir.join(name);
            std::fs::copy(&lib, &dest).map_err(|source| BuildError::Write {
                path: dest.clone(),
                source,
            })?;
            debug!(from = %lib.display(), to = %dest.display(), "staged");
            staged.push(dest);
        }
    }

    Ok(staged)
}

/// Delete intermediate object files. Objects that were never produced are
/// skipped.
///
/// Returns the paths actually removed.
pub fn remove_objects(objects: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::with_capacity(objects.len());

    for object in objects {
        match std::fs::remove_file(object) {
            Ok(()) => removed.push(object.clone()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(object = %object.display(), "object file not found");
            }
            Err(source) => {
                return Err(BuildError::Write {
                    path: object.clone(),
                    source,
                })
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_matches_platform_extension() {
        let dir = TempDir::new().unwrap();
        let vendor = dir.path().join("vendor");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&vendor).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        for name in ["libSDL2.so", "libGLEW.so", "SDL2.dll", "README"] {
            std::fs::write(vendor.join(name), name).unwrap();
        }

        let staged = stage_shared_libs(
            &[vendor.clone(), dir.path().join("missing")],
            &out,
            Platform::Linux,
        )
        .unwrap();

        assert_eq!(staged, vec![out.join("libGLEW.so"), out.join("libSDL2.so")]);
        assert!(!out.join("SDL2.dll").exists());

        let staged = stage_shared_libs(&[vendor], &out, Platform::Windows).unwrap();
        assert_eq!(staged, vec![out.join("SDL2.dll")]);
    }

    #[test]
    fn test_remove_objects_skips_missing() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.c.o");
        let b = dir.path().join("b.c.o");
        std::fs::write(&a, b"").unwrap();

        let removed = remove_objects(&[a.clone(), b]).unwrap();

        assert_eq!(removed, vec![a.clone()]);
        assert!(!a.exists());
    }
}
