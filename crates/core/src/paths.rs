//! Filesystem probing and path normalization.
//!
//! These helpers never fail: an empty path simply does not exist, and
//! normalizing an empty set yields an empty set.

use std::path::{Path, PathBuf};

/// Substring that marks this tool's own working area.
///
/// Directories whose path contains it are never cleaned.
pub const BUILD_AREA_MARKER: &str = "build";

/// Substring that marks intermediate-output directories nested under a
/// binary-output directory.
pub const OBJ_MARKER: &str = "obj";

/// Exclusions applied to binary-output (`bin`) directories.
pub const BIN_EXCLUDES: &[&str] = &[BUILD_AREA_MARKER, OBJ_MARKER];

/// Exclusions applied to intermediate-output (`obj`) directories.
pub const OBJ_EXCLUDES: &[&str] = &[BUILD_AREA_MARKER];

/// Returns true if `path` is non-empty and names an existing regular file.
#[must_use]
pub fn exists(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_file()
}

/// Like [`exists`], for an optional path. `None` is never present.
#[must_use]
pub fn exists_opt(path: Option<&Path>) -> bool {
    path.is_some_and(exists)
}

/// Keep only the directories whose string form contains none of `excludes`.
///
/// Matching is a case-sensitive substring test; surviving entries keep
/// their input order.
#[must_use]
pub fn normalize<P>(directories: impl IntoIterator<Item = P>, excludes: &[&str]) -> Vec<P>
where
    P: AsRef<Path>,
{
    directories
        .into_iter()
        .filter(|dir| {
            let text = dir.as_ref().to_string_lossy();
            !excludes.iter().any(|needle| text.contains(needle))
        })
        .collect()
}

/// Normalize directories relative to `root`, returning absolute paths.
///
/// The exclusion test runs against the path relative to `root`, so the
/// location of the working directory itself never causes an exclusion.
/// Paths outside `root` are tested as given.
#[must_use]
pub fn normalize_under(root: &Path, directories: &[PathBuf], excludes: &[&str]) -> Vec<PathBuf> {
    let relative: Vec<&Path> = directories
        .iter()
        .map(|dir| dir.strip_prefix(root).unwrap_or(dir))
        .collect();

    normalize(relative, excludes)
        .into_iter()
        .map(|rel| root.join(rel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_exists_empty_path() {
        assert!(!exists(Path::new("")));
        assert!(!exists_opt(None));
    }

    #[test]
    fn test_exists_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!exists(&tmp.path().join("nope.exe")));
    }

    #[test]
    fn test_exists_directory_is_not_a_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!exists(tmp.path()));
    }

    #[test]
    fn test_exists_regular_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("nuget.exe");
        std::fs::write(&file, b"MZ").unwrap();
        assert!(exists(&file));
        assert!(exists_opt(Some(&file)));
    }

    #[test]
    fn test_normalize_empty() {
        let out: Vec<PathBuf> = normalize(Vec::<PathBuf>::new(), &["build"]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_normalize_bin_excludes_nested_obj() {
        let dirs = vec![
            PathBuf::from("src/Foo/bin"),
            PathBuf::from("src/Foo/obj/bin"),
            PathBuf::from("build/tmp/bin"),
        ];
        let out = normalize(dirs, BIN_EXCLUDES);
        assert_eq!(out, vec![PathBuf::from("src/Foo/bin")]);
    }

    #[test]
    fn test_normalize_is_case_sensitive() {
        let dirs = vec![PathBuf::from("Build/bin"), PathBuf::from("build/bin")];
        let out = normalize(dirs, &["build"]);
        assert_eq!(out, vec![PathBuf::from("Build/bin")]);
    }

    #[test]
    fn test_normalize_under_ignores_root_location() {
        let root = Path::new("/home/ci/build-agent/work");
        let dirs = vec![
            root.join("src/Foo/bin"),
            root.join("build/tmp/bin"),
        ];
        let out = normalize_under(root, &dirs, OBJ_EXCLUDES);
        assert_eq!(out, vec![root.join("src/Foo/bin")]);
    }

    proptest! {
        #[test]
        fn prop_normalize_keeps_exactly_non_matching_in_order(
            dirs in proptest::collection::vec("[a-z/]{0,12}(build)?[a-z/]{0,6}", 0..20)
        ) {
            let out = normalize(dirs.clone(), &["build"]);
            let expected: Vec<String> = dirs
                .into_iter()
                .filter(|d| !d.contains("build"))
                .collect();
            prop_assert_eq!(out, expected);
        }
    }
}
