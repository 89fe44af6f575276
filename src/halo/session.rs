//! Credential exchange and authenticated GraphQL session.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::queries::{
    ChangeLocationData, ChangeLocationInput, ChangeLocationVariables, SearchData, SearchPages,
    SearchVariables, CHANGE_IMAGE_LOCATION, IMAGE_SEARCH, MAX_NODES,
};
use super::{ImageService, LocationChange};
use crate::config::Secrets;
use crate::error::ItaloError;
use crate::state::ImageRecord;

/// Access token issued by the HALO identity server
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Credentials {
    /// Instant at which a token issued at `now` stops being valid.
    /// Lifetimes outside chrono's range count as no expiry.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let lifetime = TimeDelta::try_seconds(self.expires_in?)?;
        now.checked_add_signed(lifetime)
    }
}

/// Identity and GraphQL endpoints of one HALO server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: Url,
    pub graphql: Url,
}

impl Endpoints {
    pub fn for_server(server_name: &str) -> Result<Self, ItaloError> {
        let parse = |url: String| {
            Url::parse(&url).map_err(|err| ItaloError::InvalidAddress(format!("{}: {}", url, err)))
        };
        Ok(Self {
            token: parse(format!("https://{}/idsrv/connect/token", server_name))?,
            graphql: parse(format!("https://{}/graphql", server_name))?,
        })
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T, ItaloError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|err| err.message).collect();
            return Err(ItaloError::RejectedRequest(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| ItaloError::RejectedRequest("response carried no data".to_string()))
    }
}

/// Authenticated connection to the HALO GraphQL API.
///
/// Opened for one workflow invocation and dropped at its end.
pub struct Session {
    client: Client,
    endpoint: Url,
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Load the secrets at `secrets_path` and open a session with them
    pub async fn connect(secrets_path: &Path) -> Result<Self, ItaloError> {
        let secrets = Secrets::load(secrets_path)?;
        Self::open(&secrets).await
    }

    /// Exchange the client credentials for an access token
    pub async fn open(secrets: &Secrets) -> Result<Self, ItaloError> {
        let endpoints = Endpoints::for_server(&secrets.server_name)?;
        let client = build_client()?;
        let credentials = request_credentials(&client, &endpoints.token, secrets).await?;

        let expires_at = credentials.expires_at(Utc::now());
        tracing::info!(
            server = %secrets.server_name,
            token_type = ?credentials.token_type,
            ?expires_at,
            "session opened"
        );

        Ok(Self {
            client,
            endpoint: endpoints.graphql,
            token: credentials.access_token,
            expires_at,
        })
    }

    /// Whether the access token has outlived its lifetime
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Run one GraphQL operation and decode its `data` member
    pub async fn execute<V, T>(&self, query: &str, variables: V) -> Result<T, ItaloError>
    where
        V: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        if self.is_expired() {
            return Err(ItaloError::RejectedRequest("access token expired".to_string()));
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?
            .error_for_status()?;
        let body: GraphQlResponse<T> = response.json().await?;
        body.into_data()
    }
}

#[async_trait]
impl ImageService for Session {
    async fn search_images(&self, text: &str) -> Result<Vec<ImageRecord>, ItaloError> {
        let mut variables = SearchVariables {
            text,
            first: MAX_NODES,
            after: None,
        };
        let mut pages = SearchPages::default();

        loop {
            let data: SearchData = self.execute(IMAGE_SEARCH, variables.clone()).await?;
            match pages.absorb(data.image_search)? {
                Some(cursor) => variables.after = Some(cursor),
                None => break,
            }
        }

        let records = pages.into_records();
        tracing::debug!(text, count = records.len(), "image search finished");
        Ok(records)
    }

    async fn change_location(
        &self,
        image_id: &str,
        new_location: &str,
    ) -> Result<LocationChange, ItaloError> {
        let variables = ChangeLocationVariables {
            input: ChangeLocationInput {
                image_id,
                new_location,
            },
        };
        let data: ChangeLocationData = self.execute(CHANGE_IMAGE_LOCATION, variables).await?;
        Ok(data.change_image_location.into_change(image_id))
    }
}

fn build_client() -> Result<Client, ItaloError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("italo/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| ItaloError::InvalidAddress(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(6 * 60 * 60))
        .build()
        .map_err(ItaloError::from)
}

/// POST the client credentials to the identity server
pub async fn request_credentials(
    client: &Client,
    token_url: &Url,
    secrets: &Secrets,
) -> Result<Credentials, ItaloError> {
    let form = [
        ("client_id", secrets.client_name.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("grant_type", secrets.grant_type.as_str()),
        ("scope", secrets.client_scope.as_str()),
    ];
    let response = client
        .post(token_url.clone())
        .form(&form)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}
