//! File system primitives shared by the render pipeline: path containment
//! checks, lexical path cleaning, content hashing and atomic file copies.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Reports whether `path` lies within `dir`, including `dir` itself.
///
/// Comparison is component-wise, so `/tmp/foobar` is not contained in
/// `/tmp/foo`. Both arguments must be absolute, lexically cleaned paths.
pub fn contained_in_dir(path: &Path, dir: &Path) -> bool {
    path == dir || path.starts_with(dir)
}

/// Lexically normalizes a path: drops `.` components and resolves `..`
/// against preceding components without touching the file system.
///
/// Joining untrusted relative paths onto a root and then checking
/// containment requires this: `Path::starts_with` does not resolve `..`.
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for comp in path.components() {
        match comp {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(comp.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(c) => out.push(c),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }

    out
}

/// Resolves a path to an absolute, lexically cleaned form without touching
/// the file system.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Ok(lexical_clean(&abs))
}

/// Converts a relative path to a forward-slash string, regardless of the
/// host separator.
pub fn rel_slash(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Streams a file through SHA-256 and returns the digest. Used only for
/// content equality comparisons.
pub fn sha256_file(path: &Path) -> Result<[u8; 32]> {
    let mut f = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut f, &mut hasher)?;

    Ok(hasher.finalize().into())
}

/// Sets unix permission bits on a path; a no-op elsewhere.
#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Copies `src` onto `dst` atomically: the content is streamed into a
/// sibling temp file which is renamed into place after the source file's
/// permission bits are applied. The temp file is removed on any failure.
pub fn atomic_copy_file(src: &Path, dst: &Path) -> Result<()> {
    let mut src_file = fs::File::open(src)?;
    let perms = src_file.metadata()?.permissions();

    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".stencil-tmp-")
        .tempfile_in(dir)?;

    io::copy(&mut src_file, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), perms)?;

    tmp.persist(dst).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn contained_in_dir_matches_the_directory_itself() {
        assert!(contained_in_dir(Path::new("/tmp/foo"), Path::new("/tmp/foo")));
    }

    #[test]
    fn contained_in_dir_matches_children() {
        assert!(contained_in_dir(
            Path::new("/tmp/foo/bar.txt"),
            Path::new("/tmp/foo")
        ));
    }

    #[test]
    fn contained_in_dir_rejects_shared_prefix_siblings() {
        assert!(!contained_in_dir(
            Path::new("/tmp/foobar/evil.txt"),
            Path::new("/tmp/foo")
        ));
    }

    #[test]
    fn contained_in_dir_rejects_parents() {
        assert!(!contained_in_dir(
            Path::new("/tmp/evil.txt"),
            Path::new("/tmp/foo")
        ));
    }

    #[test]
    fn lexical_clean_resolves_dot_dot() {
        assert_eq!(
            lexical_clean(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(lexical_clean(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(lexical_clean(Path::new("a/../b")), PathBuf::from("b"));
        assert_eq!(lexical_clean(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(lexical_clean(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn rel_slash_joins_components() {
        assert_eq!(rel_slash(Path::new("sub/deep.txt")), "sub/deep.txt");
        assert_eq!(rel_slash(Path::new("top.txt")), "top.txt");
    }

    #[test]
    fn sha256_file_distinguishes_content() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();
        fs::write(&c, "different").unwrap();

        assert_eq!(sha256_file(&a).unwrap(), sha256_file(&b).unwrap());
        assert_ne!(sha256_file(&a).unwrap(), sha256_file(&c).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn atomic_copy_replaces_and_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, "fresh").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o600)).unwrap();
        fs::write(&dst, "stale").unwrap();

        atomic_copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "fresh");
        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
