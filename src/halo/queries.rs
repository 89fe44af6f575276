//! GraphQL documents for the HALO API and the shapes of their responses.

use serde::{Deserialize, Serialize};

use super::LocationChange;
use crate::error::ItaloError;
use crate::state::ImageRecord;

/// Server limit of nodes per page
pub const MAX_NODES: u32 = 100;

pub const IMAGE_SEARCH: &str = r#"
query ImageSearch($text: String!, $first: Int, $after: Cursor) {
  imageSearch(text: $text, first: $first, after: $after) {
    totalCount
    edges {
      node {
        result {
          id
          imageStudies {
            study {
              ancestors {
                ancestor {
                  name
                }
              }
              name
            }
          }
          location
        }
      }
      cursor
    }
    pageInfo {
      endCursor
      hasNextPage
    }
  }
}
"#;

pub const CHANGE_IMAGE_LOCATION: &str = r#"
mutation changeImageLocation($input: ChangeImageLocationInput!) {
  changeImageLocation(input: $input) {
    mutated {
      node {
        id
        location
      }
    }
    failed {
      error
    }
  }
}
"#;

#[derive(Debug, Clone, Serialize)]
pub struct SearchVariables<'a> {
    pub text: &'a str,
    pub first: u32,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeLocationVariables<'a> {
    pub input: ChangeLocationInput<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLocationInput<'a> {
    pub image_id: &'a str,
    pub new_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub image_search: SearchPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub total_count: usize,
    #[serde(default)]
    pub edges: Vec<SearchEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct SearchEdge {
    pub node: SearchNode,
}

#[derive(Debug, Deserialize)]
pub struct SearchNode {
    pub result: Option<ImageResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub id: String,
    #[serde(default)]
    pub image_studies: Vec<ImageStudy>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageStudy {
    pub study: Study,
}

#[derive(Debug, Deserialize)]
pub struct Study {
    #[serde(default)]
    pub ancestors: Vec<StudyAncestor>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StudyAncestor {
    pub ancestor: Named,
}

#[derive(Debug, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLocationData {
    pub change_image_location: ChangeLocationPayload,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLocationPayload {
    #[serde(default)]
    pub mutated: Vec<MutatedEdge>,
    #[serde(default)]
    pub failed: Vec<FailedEdge>,
}

#[derive(Debug, Deserialize)]
pub struct MutatedEdge {
    pub node: MutatedNode,
}

#[derive(Debug, Deserialize)]
pub struct MutatedNode {
    pub id: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct FailedEdge {
    pub error: Option<String>,
}

impl Study {
    /// Study hierarchy from the root ancestor down, e.g. "/Lab/Project/StudyA".
    /// HALO lists ancestors nearest-first.
    pub fn hierarchy(&self) -> String {
        let mut path = String::new();
        for parent in self.ancestors.iter().rev() {
            path.push('/');
            path.push_str(&parent.ancestor.name);
        }
        path.push('/');
        path.push_str(&self.name);
        path
    }
}

impl ImageResult {
    /// Convert into an image record. Results without a location are skipped.
    pub fn into_record(self) -> Option<ImageRecord> {
        let location = self.location?;
        let study = self
            .image_studies
            .first()
            .map(|entry| entry.study.hierarchy())
            .unwrap_or_default();
        Some(ImageRecord {
            id: self.id,
            location,
            study,
        })
    }
}

/// Collects the pages of one `imageSearch`
#[derive(Debug, Default)]
pub struct SearchPages {
    records: Vec<ImageRecord>,
    seen: usize,
    cursor: Option<String>,
}

impl SearchPages {
    /// Take in one page and return the cursor to continue from, or `None`
    /// once the last page has arrived.
    ///
    /// A page announcing more results must carry a new end cursor, and the
    /// last page must bring the edge count up to `totalCount`.
    pub fn absorb(&mut self, page: SearchPage) -> Result<Option<String>, ItaloError> {
        self.seen += page.edges.len();
        self.records.extend(
            page.edges
                .into_iter()
                .filter_map(|edge| edge.node.result)
                .filter_map(ImageResult::into_record),
        );

        if page.page_info.has_next_page {
            let cursor = page.page_info.end_cursor.ok_or_else(|| {
                ItaloError::RejectedRequest("search page carried no end cursor".to_string())
            })?;
            if self.cursor.as_deref() == Some(cursor.as_str()) {
                return Err(ItaloError::RejectedRequest(format!(
                    "search cursor {} did not advance",
                    cursor
                )));
            }
            self.cursor = Some(cursor.clone());
            return Ok(Some(cursor));
        }

        if self.seen != page.total_count {
            return Err(ItaloError::RejectedRequest(format!(
                "search returned {} of {} images",
                self.seen, page.total_count
            )));
        }
        Ok(None)
    }

    pub fn into_records(self) -> Vec<ImageRecord> {
        self.records
    }
}

impl ChangeLocationPayload {
    /// Outcome for `image_id`: its mutated location, if listed, and the
    /// errors of every failed edge.
    pub fn into_change(self, image_id: &str) -> LocationChange {
        let location = self
            .mutated
            .into_iter()
            .map(|edge| edge.node)
            .find(|node| node.id == image_id)
            .map(|node| node.location);
        let errors = self
            .failed
            .into_iter()
            .map(|failed| failed.error.unwrap_or_else(|| "unknown error".to_string()))
            .collect();

        LocationChange {
            image_id: image_id.to_string(),
            location,
            errors,
        }
    }
}
