//! Keyword scoring against the stock index.
//!
//! A keyword hits a candidate when it equals or is a substring of one of the
//! candidate's tags, or is a substring of its lowercase file name. Ties go to
//! the lexicographically smallest file name, then the smallest path.

use std::cmp::Ordering;

use super::index::{tokenize, StockCandidate, StockIndex};
use crate::probe::MediaProber;

fn normalized(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn hits(candidate: &StockCandidate, keyword: &str) -> bool {
    candidate.tags().iter().any(|t| t.contains(keyword)) || candidate.name().to_lowercase().contains(keyword)
}

/// Number of keywords that hit `candidate`.
pub fn score(candidate: &StockCandidate, keywords: &[String]) -> usize {
    normalized(keywords).iter().filter(|k| hits(candidate, k)).count()
}

fn by_score_then_name(a: &(usize, &StockCandidate), b: &(usize, &StockCandidate)) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| a.1.name().cmp(b.1.name()))
        .then_with(|| a.1.path().cmp(b.1.path()))
}

/// Every candidate with its score, best first.
pub fn ranked<'a>(index: &'a StockIndex, keywords: &[String]) -> Vec<(usize, &'a StockCandidate)> {
    let keywords = normalized(keywords);
    let mut scored: Vec<_> = index
        .candidates()
        .iter()
        .map(|c| (keywords.iter().filter(|k| hits(c, k)).count(), c))
        .collect();
    scored.sort_by(by_score_then_name);
    scored
}

/// Highest-scoring candidate with a positive score.
pub fn best_match<'a>(index: &'a StockIndex, keywords: &[String]) -> Option<&'a StockCandidate> {
    if normalized(keywords).is_empty() {
        return None;
    }
    ranked(index, keywords)
        .into_iter()
        .next()
        .filter(|(score, _)| *score > 0)
        .map(|(_, c)| c)
}

/// Episode-level pre-selection from free-text cues.
///
/// Scores are tag/token overlaps with the cue words. Equal scores prefer the
/// longer clip (probed once per candidate), then the smaller name.
pub async fn select_for_cues<'a>(
    index: &'a StockIndex,
    cues: &[&str],
    limit: usize,
    prober: &dyn MediaProber,
) -> Vec<&'a StockCandidate> {
    let words = cues.iter().flat_map(|c| tokenize(c)).collect::<std::collections::BTreeSet<_>>();
    let mut scored = Vec::with_capacity(index.len());
    for candidate in index.candidates() {
        let score = candidate.tags().intersection(&words).count();
        scored.push((score, candidate.duration(prober).await, candidate));
    }
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.total_cmp(&a.1))
            .then_with(|| a.2.name().cmp(b.2.name()))
            .then_with(|| a.2.path().cmp(b.2.path()))
    });
    scored.into_iter().take(limit).map(|(_, _, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};
    use crate::probe::VideoInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;

    /// Durations keyed by file name; unknown files fail to probe.
    struct LengthProber(HashMap<&'static str, f64>);

    #[async_trait]
    impl MediaProber for LengthProber {
        async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
            Err(MediaError::FileNotFound(path.to_path_buf()))
        }

        async fn duration(&self, path: &Path) -> MediaResult<f64> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            self.0
                .get(name)
                .copied()
                .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))
        }
    }

    fn candidate(path: &str, tags: &[&str]) -> StockCandidate {
        StockCandidate::new(path, tags.iter().map(|t| t.to_string()))
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn index() -> StockIndex {
        StockIndex::from_candidates(vec![
            candidate("/s/b_vectors.mp4", &["vector", "arrow"]),
            candidate("/s/a_vectors.mp4", &["vector", "field"]),
            candidate("/s/city.mp4", &["city", "night"]),
            candidate("/s/matrix_grid.mp4", &["matrix", "grid", "vector"]),
        ])
    }

    #[test]
    fn test_score_counts_substring_and_member_hits() {
        let c = candidate("/s/matrix_grid.mp4", &["matrix", "eigenvectors"]);
        assert_eq!(score(&c, &kw(&["Matrix", "vector", "grid", "ocean"])), 3);
    }

    #[test]
    fn test_best_match_prefers_score() {
        let index = index();
        let best = best_match(&index, &kw(&["matrix", "vector"])).unwrap();
        assert_eq!(best.name(), "matrix_grid.mp4");
    }

    #[test]
    fn test_ties_go_to_smallest_name() {
        let index = index();
        for _ in 0..3 {
            let best = best_match(&index, &kw(&["vector"])).unwrap();
            assert_eq!(best.name(), "a_vectors.mp4");
        }
    }

    #[test]
    fn test_no_positive_match_is_none() {
        let index = index();
        assert!(best_match(&index, &kw(&["ocean"])).is_none());
        assert!(best_match(&index, &[]).is_none());
        assert!(best_match(&index, &kw(&["  "])).is_none());
        assert!(best_match(&StockIndex::default(), &kw(&["vector"])).is_none());
    }

    #[tokio::test]
    async fn test_select_for_cues_fills_with_zero_scores() {
        let index = index();
        let prober = LengthProber(HashMap::new());
        let picked = select_for_cues(&index, &["A night in the city", "grid search"], 3, &prober).await;
        let names: Vec<_> = picked.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["city.mp4", "matrix_grid.mp4", "a_vectors.mp4"]);
    }

    #[tokio::test]
    async fn test_select_for_cues_prefers_longer_clip_on_equal_score() {
        let index = index();
        let prober = LengthProber(HashMap::from([("a_vectors.mp4", 4.0), ("b_vectors.mp4", 9.5)]));
        let picked = select_for_cues(&index, &["vector field arrow"], 2, &prober).await;
        let names: Vec<_> = picked.iter().map(|c| c.name()).collect();
        // a_vectors and b_vectors both score 2; the longer one wins despite its name.
        assert_eq!(names, vec!["b_vectors.mp4", "a_vectors.mp4"]);
    }
}
