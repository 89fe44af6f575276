use crate::error::ItaloError;
use crate::halo::ImageService;
use crate::state::{paths, ImageRecord, MatchSet};

use super::count_noun;

/// Result of a search, handed back to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub source_dir: String,
    pub matches: MatchSet,
}

impl SearchReport {
    /// Status line, e.g. "FOUND: 3 images in 2 studies at [StudyA | StudyB]."
    pub fn status(&self) -> String {
        let studies = self.matches.studies();
        let mut status = format!(
            "FOUND: {} in {}",
            count_noun(self.matches.len(), "image", "images"),
            count_noun(studies.len(), "study", "studies"),
        );
        if !studies.is_empty() {
            let names: Vec<&str> = studies.into_iter().collect();
            status.push_str(&format!(" at [{}]", names.join(" | ")));
        }
        status.push('.');
        status
    }

    pub fn progress(&self) -> f32 {
        if self.matches.is_empty() {
            0.0
        } else {
            100.0
        }
    }
}

/// Keep only records whose file sits directly in `dir`.
///
/// The server's text search also returns images in subdirectories and
/// sibling directories sharing the prefix.
pub fn exact_directory_matches(
    records: impl IntoIterator<Item = ImageRecord>,
    dir: &str,
) -> MatchSet {
    let dir = paths::trim_separators(dir);
    records
        .into_iter()
        .filter(|record| paths::parent_dir(&record.location) == dir)
        .collect()
}

/// Find all images stored directly in `source_dir`
pub async fn search<S>(service: &S, source_dir: &str) -> Result<SearchReport, ItaloError>
where
    S: ImageService + ?Sized,
{
    let source_dir = paths::trim_separators(source_dir.trim());
    tracing::info!(source_dir, "searching images");

    let records = service.search_images(source_dir).await?;
    let candidates = records.len();
    let matches = exact_directory_matches(records, source_dir);

    tracing::info!(
        candidates,
        matches = matches.len(),
        studies = matches.studies().len(),
        "search complete"
    );

    Ok(SearchReport {
        source_dir: source_dir.to_string(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{record, MockService};

    fn study_a_service() -> MockService {
        MockService::with_records(vec![
            record("1", "/data/studyA/slide1.svs", "StudyA"),
            record("2", "/data/studyA/slide2.svs", "StudyA"),
            record("3", "/data/studyA/slide3.svs", "StudyB"),
            record("4", "/data/studyA/old/slide4.svs", "StudyA"),
            record("5", "/data/studyAB/slide5.svs", "StudyC"),
        ])
    }

    #[tokio::test]
    async fn test_search_reports_studies() {
        let service = study_a_service();
        let report = search(&service, "/data/studyA").await.unwrap();

        assert_eq!(
            report.status(),
            "FOUND: 3 images in 2 studies at [StudyA | StudyB]."
        );
        assert_eq!(report.progress(), 100.0);
    }

    #[tokio::test]
    async fn test_matches_sit_directly_in_source_dir() {
        let service = study_a_service();
        let report = search(&service, "/data/studyA/").await.unwrap();

        assert_eq!(report.source_dir, "/data/studyA");
        assert_eq!(report.matches.len(), 3);
        for image in report.matches.records() {
            assert_eq!(paths::parent_dir(&image.location), "/data/studyA");
        }
        assert_eq!(service.searches.lock().unwrap()[0], "/data/studyA");
    }

    #[tokio::test]
    async fn test_empty_search() {
        let service = study_a_service();
        let report = search(&service, "/data/studyZ").await.unwrap();

        assert_eq!(report.status(), "FOUND: 0 images in 0 studies.");
        assert_eq!(report.progress(), 0.0);
    }

    #[test]
    fn test_singular_phrasing() {
        let matches = exact_directory_matches(
            vec![record("1", r"\\srv\share\a.svs", "StudyA")],
            r"\\srv\share",
        );
        let report = SearchReport {
            source_dir: r"\\srv\share".to_string(),
            matches,
        };
        assert_eq!(report.status(), "FOUND: 1 image in 1 study at [StudyA].");
    }
}
