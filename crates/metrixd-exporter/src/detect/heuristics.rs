//! Filesystem fallbacks for container detection.
//!
//! Every check is a single local read. Missing or unreadable files mean "no
//! match".

use std::fs;
use std::path::Path;

/// Sentinel file exists and is not a directory.
pub fn sentinel_present(path: &Path) -> bool {
    fs::metadata(path).map(|m| !m.is_dir()).unwrap_or(false)
}

/// Runtime marker file is readable and has non-blank contents.
pub fn runtime_marker_present(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

/// First marker found in the cgroup membership file, if any.
pub fn cgroup_marker<'a>(path: &Path, markers: &'a [String]) -> Option<&'a str> {
    let content = fs::read_to_string(path).ok()?;
    markers
        .iter()
        .map(String::as_str)
        .find(|m| content.contains(m))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["docker".into(), "kubepods".into()]
    }

    #[test]
    fn sentinel_rejects_directories_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!sentinel_present(dir.path()));
        assert!(!sentinel_present(&dir.path().join("missing")));

        let file = dir.path().join(".dockerenv");
        fs::write(&file, "").unwrap();
        assert!(sentinel_present(&file));
    }

    #[test]
    fn runtime_marker_needs_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("container");

        fs::write(&file, "  \n").unwrap();
        assert!(!runtime_marker_present(&file));

        fs::write(&file, "podman\n").unwrap();
        assert!(runtime_marker_present(&file));
    }

    #[test]
    fn cgroup_marker_reports_first_configured_match() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cgroup");
        fs::write(&file, "0::/kubepods/besteffort/pod1/docker-abc\n").unwrap();

        assert_eq!(cgroup_marker(&file, &markers()), Some("docker"));

        fs::write(&file, "0::/init.scope\n").unwrap();
        assert_eq!(cgroup_marker(&file, &markers()), None);
        assert_eq!(cgroup_marker(&dir.path().join("missing"), &markers()), None);
    }
}
