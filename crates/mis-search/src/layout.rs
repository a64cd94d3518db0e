use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::model::{Container, ContainerId};

fn sanitize_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new("[^A-Za-z0-9._-]").unwrap())
}

fn run_number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(.*?)(\d+)$").unwrap())
}

/// Identifier of one invocation of the search, used to scope run logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        RunId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk layout of search artifacts
///
/// - cache/<instance>/<container>.json - Durable feasibility cache per unit
/// - runs/<run>/<instance>/<container>/ - Per-resolution run logs
///
/// Path segments are escaped without loss, so distinct instance names or
/// container ids never resolve to the same file.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Root directory of all output
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Escape a name into a single filesystem-safe path segment.
    ///
    /// Bytes outside `[A-Za-z0-9._-]` become `~XX`. The empty name and the
    /// dot names are escaped too, so the mapping is injective.
    pub fn sanitize_segment(segment: &str) -> String {
        match segment {
            "" => "~".to_string(),
            "." => "~2E".to_string(),
            ".." => "~2E~2E".to_string(),
            _ => sanitize_regex()
                .replace_all(segment, |caps: &Captures<'_>| {
                    caps[0].bytes().map(|b| format!("~{:02X}", b)).collect::<String>()
                })
                .into_owned(),
        }
    }

    pub fn cache_root(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn runs_root(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// Stable location of the feasibility cache of one unit.
    ///
    /// The path does not depend on the run, so later runs resume from it.
    pub fn cache_path(&self, instance: &str, container: &ContainerId) -> PathBuf {
        self.cache_root()
            .join(Self::sanitize_segment(instance))
            .join(format!("{}.json", Self::sanitize_segment(container.as_str())))
    }

    /// Directory holding the run logs of one unit within one run.
    pub fn unit_run_dir(&self, run: &RunId, instance: &str, container: &ContainerId) -> PathBuf {
        self.runs_root()
            .join(Self::sanitize_segment(run.as_str()))
            .join(Self::sanitize_segment(instance))
            .join(Self::sanitize_segment(container.as_str()))
    }

    /// `<L>x<W>-<R>.json`
    pub fn resolution_log_path(&self, unit_dir: &Path, container: &Container, resolution: u64) -> PathBuf {
        unit_dir.join(format!("{}-{}.json", container.size_label(), resolution))
    }

    /// `<L>x<W>-<R>-pruned.json`
    pub fn pruned_log_path(&self, unit_dir: &Path, container: &Container, resolution: u64) -> PathBuf {
        unit_dir.join(format!("{}-{}-pruned.json", container.size_label(), resolution))
    }

    /// Serialize `value` as pretty JSON and atomically replace `path`.
    ///
    /// The data goes to a temporary file in the target directory first and
    /// is renamed into place, so readers never observe a partial file.
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let data = serde_json::to_vec_pretty(value)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read a file if it exists
    ///
    /// # Returns
    /// * `Ok(Some(data))` - File was found and read
    /// * `Ok(None)` - File doesn't exist
    /// * `Err(e)` - IO error occurred
    pub fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove stored feasibility caches, for one instance or all of them.
    ///
    /// # Returns
    /// Number of cache files removed
    pub fn clear_caches(&self, instance: Option<&str>) -> io::Result<usize> {
        let target = match instance {
            Some(name) => self.cache_root().join(Self::sanitize_segment(name)),
            None => self.cache_root(),
        };
        if !target.exists() {
            return Ok(0);
        }

        let removed = WalkDir::new(&target)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();

        fs::remove_dir_all(&target)?;
        Ok(removed)
    }

    /// Next free run identifier for `prefix`.
    ///
    /// Scans `runs/` for directories named `<prefix><n>` and returns
    /// `<prefix><max n + 1>`, starting at 1.
    pub fn next_run_id(&self, prefix: &str) -> io::Result<RunId> {
        let runs = self.runs_root();
        let mut highest = 0u64;

        if runs.is_dir() {
            for entry in fs::read_dir(&runs)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if let Some(caps) = run_number_regex().captures(&name) {
                    if &caps[1] == Self::sanitize_segment(prefix) {
                        if let Ok(n) = caps[2].parse::<u64>() {
                            highest = highest.max(n);
                        }
                    }
                }
            }
        }

        Ok(RunId(format!("{}{}", prefix, highest + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(OutputLayout::sanitize_segment("n15/inst 1"), "n15~2Finst~201");
        assert_eq!(OutputLayout::sanitize_segment("MAIN3"), "MAIN3");
        assert_eq!(OutputLayout::sanitize_segment("m-1.a_b"), "m-1.a_b");
        assert_eq!(OutputLayout::sanitize_segment("~"), "~7E");
        assert_eq!(OutputLayout::sanitize_segment("é"), "~C3~A9");
        assert_eq!(OutputLayout::sanitize_segment(".."), "~2E~2E");
        assert_eq!(OutputLayout::sanitize_segment(""), "~");
    }

    #[test]
    fn test_distinct_ids_get_distinct_paths() {
        let layout = OutputLayout::new("/out");
        let ids = ["m 1", "m-1", "m~201", "m/1", "", "_", ".", "~2E"];
        let paths: std::collections::HashSet<PathBuf> = ids
            .iter()
            .map(|id| layout.cache_path("inst", &ContainerId::new(*id)))
            .collect();
        assert_eq!(paths.len(), ids.len());
    }

    #[test]
    fn test_cache_path_is_run_independent() {
        let layout = OutputLayout::new("/out");
        let id = ContainerId::new("1");
        assert_eq!(
            layout.cache_path("inst", &id),
            PathBuf::from("/out/cache/inst/1.json")
        );
        assert_eq!(
            layout.unit_run_dir(&RunId::new("MAIN2"), "inst", &id),
            PathBuf::from("/out/runs/MAIN2/inst/1")
        );
    }

    #[test]
    fn test_log_file_names() {
        let layout = OutputLayout::new("/out");
        let container = Container::new("1", 10.0, 20.0);
        let dir = PathBuf::from("/out/runs/r/i/1");
        assert_eq!(
            layout.resolution_log_path(&dir, &container, 5),
            dir.join("10x20-5.json")
        );
        assert_eq!(
            layout.pruned_log_path(&dir, &container, 5),
            dir.join("10x20-5-pruned.json")
        );
    }

    #[test]
    fn test_write_json_replaces_atomically() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path());
        let path = temp.path().join("nested/dir/file.json");

        layout.write_json(&path, &vec![1, 2, 3]).unwrap();
        layout.write_json(&path, &vec![4]).unwrap();

        let data = layout.read(&path).unwrap().unwrap();
        let parsed: Vec<i32> = serde_json::from_slice(&data).unwrap();
        assert_eq!(parsed, vec![4]);

        // No temporary files left behind
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_next_run_id() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path());
        assert_eq!(layout.next_run_id("MAIN").unwrap().as_str(), "MAIN1");

        fs::create_dir_all(layout.runs_root().join("MAIN1")).unwrap();
        fs::create_dir_all(layout.runs_root().join("MAIN7")).unwrap();
        fs::create_dir_all(layout.runs_root().join("CLI9")).unwrap();
        assert_eq!(layout.next_run_id("MAIN").unwrap().as_str(), "MAIN8");
        assert_eq!(layout.next_run_id("CLI").unwrap().as_str(), "CLI10");
    }

    #[test]
    fn test_clear_caches() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path());
        let id = ContainerId::new("1");
        layout.write_json(&layout.cache_path("a", &id), &1).unwrap();
        layout.write_json(&layout.cache_path("b", &id), &1).unwrap();

        assert_eq!(layout.clear_caches(Some("a")).unwrap(), 1);
        assert!(!layout.cache_path("a", &id).exists());
        assert!(layout.cache_path("b", &id).exists());

        assert_eq!(layout.clear_caches(None).unwrap(), 1);
        assert_eq!(layout.clear_caches(None).unwrap(), 0);
    }
}
