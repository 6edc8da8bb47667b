//! Stock footage catalog.
//!
//! Building an index never fails: unreadable directories, missing manifests
//! and missing files are skipped with a log line, and an empty index is a
//! normal result.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use walkdir::WalkDir;

use reel_models::Series;

use crate::probe::MediaProber;

/// Container extensions treated as stock footage (matched case-insensitively).
pub const STOCK_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "webm"];

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// Lowercase alphanumeric tokens of `text`.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    TOKEN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tags derived from a file's stem.
pub fn filename_tags(path: &Path) -> BTreeSet<String> {
    path.file_stem()
        .map(|s| tokenize(&s.to_string_lossy()))
        .unwrap_or_default()
}

/// Whether `path` has a supported stock extension.
pub fn is_stock_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STOCK_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// A footage file eligible for keyword selection.
#[derive(Debug, Clone)]
pub struct StockCandidate {
    path: PathBuf,
    name: String,
    tags: BTreeSet<String>,
    duration: OnceCell<f64>,
}

impl StockCandidate {
    pub fn new(path: impl Into<PathBuf>, tags: impl IntoIterator<Item = String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            name,
            tags: tags.into_iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect(),
            duration: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, used for tie-breaking.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Duration in seconds, probed on first use and cached. An unprobeable
    /// file reports 0.
    pub async fn duration(&self, prober: &dyn MediaProber) -> f64 {
        *self
            .duration
            .get_or_init(|| async {
                match prober.duration(&self.path).await {
                    Ok(d) => d,
                    Err(e) => {
                        debug!(path = %self.path.display(), error = %e, "Could not probe stock clip");
                        0.0
                    }
                }
            })
            .await
    }
}

/// Where candidates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockSource {
    /// Directory scanned recursively
    Library(PathBuf),
    /// Manifest file of `path` or `path | tag1, tag2` lines
    Manifest(PathBuf),
}

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: PathBuf,
    /// Explicit tags, if the line carried any
    pub tags: Option<Vec<String>>,
}

/// Parse manifest text. `#` comments and blank lines are skipped; relative
/// paths resolve against `base_dir`.
pub fn parse_manifest(content: &str, base_dir: &Path) -> Vec<ManifestEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|line| {
            let (path, tags) = match line.split_once('|') {
                Some((p, t)) => {
                    let tags: Vec<String> = t
                        .split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect();
                    (p.trim(), (!tags.is_empty()).then_some(tags))
                }
                None => (line, None),
            };
            if path.is_empty() {
                return None;
            }
            let path = PathBuf::from(path);
            let path = if path.is_absolute() { path } else { base_dir.join(path) };
            Some(ManifestEntry { path, tags })
        })
        .collect()
}

/// Read-only catalog of stock candidates for one episode.
#[derive(Debug, Clone, Default)]
pub struct StockIndex {
    candidates: Vec<StockCandidate>,
}

impl StockIndex {
    /// Build from the given sources. Untagged files get filename tokens plus
    /// the series default tags; duplicates (by resolved path) are dropped.
    pub fn build(sources: &[StockSource], series: Series) -> Self {
        let defaults: Vec<String> = series.default_tags().iter().map(|t| t.to_string()).collect();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        let mut add = |path: PathBuf, tags: Option<Vec<String>>| {
            let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(key.clone()) {
                return;
            }
            let tags = match tags {
                Some(explicit) => explicit,
                None => filename_tags(&path).into_iter().chain(defaults.iter().cloned()).collect(),
            };
            candidates.push(StockCandidate::new(key, tags));
        };

        for source in sources {
            match source {
                StockSource::Library(dir) => {
                    if !dir.is_dir() {
                        debug!(dir = %dir.display(), "Stock library not found");
                        continue;
                    }
                    for entry in WalkDir::new(dir).follow_links(true).into_iter().filter_map(|e| e.ok()) {
                        if entry.file_type().is_file() && is_stock_file(entry.path()) {
                            add(entry.path().to_path_buf(), None);
                        }
                    }
                }
                StockSource::Manifest(file) => {
                    let content = match std::fs::read_to_string(file) {
                        Ok(c) => c,
                        Err(e) => {
                            warn!(manifest = %file.display(), error = %e, "Could not read stock manifest");
                            continue;
                        }
                    };
                    let base = file.parent().unwrap_or_else(|| Path::new("."));
                    for entry in parse_manifest(&content, base) {
                        if entry.path.is_file() {
                            add(entry.path, entry.tags);
                        } else {
                            warn!(path = %entry.path.display(), "Manifest entry missing, skipped");
                        }
                    }
                }
            }
        }

        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = candidates.len(), "Built stock index");
        Self { candidates }
    }

    pub fn from_candidates(mut candidates: Vec<StockCandidate>) -> Self {
        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        Self { candidates }
    }

    pub fn candidates(&self) -> &[StockCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};
    use crate::probe::VideoInfo;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tokenize() {
        let tags = tokenize("Matrix_Rotation-3D.clip");
        assert!(tags.contains("matrix"));
        assert!(tags.contains("rotation"));
        assert!(tags.contains("3d"));
        assert!(tags.contains("clip"));
    }

    #[test]
    fn test_scan_library_with_series_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("city_night.MP4"), b"x").unwrap();
        fs::write(dir.path().join("nested/ocean.mov"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let index = StockIndex::build(
            &[StockSource::Library(dir.path().to_path_buf())],
            Series::LinearAlgebra,
        );
        assert_eq!(index.len(), 2);

        let city = index.candidates().iter().find(|c| c.name() == "city_night.MP4").unwrap();
        assert!(city.tags().contains("city"));
        assert!(city.tags().contains("night"));
        assert!(city.tags().contains("vector"));
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        let manifest = dir.path().join("stock.txt");
        fs::write(&manifest, "a.mp4 | custom\n").unwrap();

        let index = StockIndex::build(
            &[
                StockSource::Library(dir.path().to_path_buf()),
                StockSource::Library(dir.path().to_path_buf()),
                StockSource::Manifest(manifest),
            ],
            Series::General,
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_manifest_parsing() {
        let content = "# stock\n\nclips/a.mp4 | Vector, Arrow \n/abs/b.mov\nc.mp4 |  \n";
        let entries = parse_manifest(content, Path::new("/lib"));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, PathBuf::from("/lib/clips/a.mp4"));
        assert_eq!(entries[0].tags, Some(vec!["vector".to_string(), "arrow".to_string()]));
        assert_eq!(entries[1].path, PathBuf::from("/abs/b.mov"));
        assert_eq!(entries[1].tags, None);
        assert_eq!(entries[2].tags, None);
    }

    #[test]
    fn test_manifest_tags_replace_derived_tags() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("city.mp4"), b"x").unwrap();
        let manifest = dir.path().join("stock.txt");
        fs::write(&manifest, "city.mp4 | graph\nmissing.mp4\n").unwrap();

        let index = StockIndex::build(&[StockSource::Manifest(manifest)], Series::MultiAgent);
        assert_eq!(index.len(), 1);
        let tags: Vec<_> = index.candidates()[0].tags().iter().cloned().collect();
        assert_eq!(tags, vec!["graph"]);
    }

    #[test]
    fn test_missing_sources_yield_empty_index() {
        let index = StockIndex::build(
            &[
                StockSource::Library(PathBuf::from("/nonexistent/stock")),
                StockSource::Manifest(PathBuf::from("/nonexistent/list.txt")),
            ],
            Series::General,
        );
        assert!(index.is_empty());
    }

    struct CountingProber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaProber for CountingProber {
        async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
            Err(MediaError::FileNotFound(path.to_path_buf()))
        }

        async fn duration(&self, _path: &Path) -> MediaResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(7.5)
        }
    }

    #[tokio::test]
    async fn test_duration_is_probed_once() {
        let prober = CountingProber { calls: AtomicUsize::new(0) };
        let candidate = StockCandidate::new("/stock/a.mp4", vec![]);
        assert!((candidate.duration(&prober).await - 7.5).abs() < 1e-9);
        assert!((candidate.duration(&prober).await - 7.5).abs() < 1e-9);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    }
}
