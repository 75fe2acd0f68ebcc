//! Twitter API v2 client.

use crate::error::ProviderError;
use crate::posts::{PostGraph, PostLookup, UserLookup};

use serde::de::DeserializeOwned;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const POST_EXPANSIONS: &str = "referenced_tweets.id,author_id";

/// Bearer-token authenticated client for the Twitter API v2.
#[derive(Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, bearer_token)
    }

    /// Point the client at another API host (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, operation, "twitter api returned an error status");
            return Err(ProviderError::Api {
                operation,
                payload: format!("{status}: {body}"),
            });
        }

        serde_json::from_str(&body).map_err(|error| {
            ProviderError::Request(format!("failed to decode {operation} response: {error}"))
        })
    }
}

impl PostGraph for TwitterClient {
    async fn fetch_post_with_expansions(&self, post_id: &str) -> Result<PostLookup, ProviderError> {
        self.get(
            "singleTweet",
            &format!("/2/tweets/{post_id}"),
            &[("expansions", POST_EXPANSIONS)],
        )
        .await
    }

    async fn fetch_user(&self, author_id: &str) -> Result<UserLookup, ProviderError> {
        self.get("user", &format!("/2/users/{author_id}"), &[]).await
    }
}
