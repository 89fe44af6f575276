//! Operator workflows
//!
//! This module handles the two actions behind the GUI buttons:
//! - Finding image records under a source directory (search.rs)
//! - Relocating them to a network directory (transfer.rs)
//! - Copying the files with the host's native tool (mover.rs)
//!
//! Workflows never touch GUI state. They return reports that the
//! application applies in its `update` function.

pub mod mover;
pub mod search;
pub mod transfer;

pub use mover::CopyTool;
pub use search::SearchReport;
pub use transfer::{TransferPlan, TransferReport};

/// "1 image", "3 images"
pub(crate) fn count_noun(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Share of `done` in `total` as a rounded percentage
pub(crate) fn percent(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (done as f32 / total as f32 * 100.0).round()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_noun() {
        assert_eq!(count_noun(0, "image", "images"), "0 images");
        assert_eq!(count_noun(1, "study", "studies"), "1 study");
        assert_eq!(count_noun(2, "study", "studies"), "2 studies");
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(1, 3), 33.0);
        assert_eq!(percent(2, 3), 67.0);
        assert_eq!(percent(0, 0), 0.0);
    }
}
