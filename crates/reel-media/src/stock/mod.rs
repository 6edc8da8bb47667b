//! Stock footage index and keyword matching.

pub mod index;
pub mod matcher;

pub use index::{parse_manifest, ManifestEntry, StockCandidate, StockIndex, StockSource};
pub use matcher::{best_match, ranked, score, select_for_cues};
