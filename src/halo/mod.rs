//! HALO remote service module
//!
//! This module handles everything that talks to the HALO server:
//! - Credential exchange and the authenticated session (session.rs)
//! - GraphQL documents and response shapes (queries.rs)
//!
//! Workflows only see the [`ImageService`] trait, so they can run
//! against an in-memory service in tests.

pub mod queries;
pub mod session;

use async_trait::async_trait;

use crate::error::ItaloError;
use crate::state::ImageRecord;

pub use session::Session;

/// Outcome of one `changeImageLocation` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub image_id: String,
    /// Location reported back by the server, if the record was mutated
    pub location: Option<String>,
    /// Errors reported for this record
    pub errors: Vec<String>,
}

impl LocationChange {
    /// A change succeeded when the server reported no error for it
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Operations the workflows need from the image database
#[async_trait]
pub trait ImageService: Send + Sync {
    /// All images whose location contains `text`
    async fn search_images(&self, text: &str) -> Result<Vec<ImageRecord>, ItaloError>;

    /// Point one image record at a new file location
    async fn change_location(
        &self,
        image_id: &str,
        new_location: &str,
    ) -> Result<LocationChange, ItaloError>;
}
