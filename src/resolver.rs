//! Context resolution: turns a post id into the posts it quotes and replies to.

use crate::cache::ContextCache;
use crate::error::ProviderError;
use crate::posts::{PostContext, PostGraph, PostReference, Relation};

use std::collections::HashMap;
use std::sync::Arc;

/// Resolves post context through the post graph, memoizing results.
pub struct ContextResolver<P: PostGraph> {
    graph: Arc<P>,
    cache: ContextCache,
}

impl<P: PostGraph> ContextResolver<P> {
    pub fn new(graph: Arc<P>, cache: ContextCache) -> Self {
        Self { graph, cache }
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Resolve the quoted and replied-to posts of `post_id`.
    ///
    /// Successful resolutions are cached, including empty ones. A failure
    /// leaves the post cache untouched.
    pub async fn resolve(&self, post_id: &str) -> Result<Arc<PostContext>, ProviderError> {
        if let Some(context) = self.cache.posts.get(post_id) {
            tracing::trace!(post_id, "post context cache hit");
            return Ok(context);
        }

        let lookup = self.graph.fetch_post_with_expansions(post_id).await?;
        if let Some(errors) = lookup.errors {
            return Err(ProviderError::Api {
                operation: "singleTweet",
                payload: raw_payload(errors),
            });
        }

        let references = lookup
            .data
            .and_then(|data| data.referenced_posts)
            .unwrap_or_default();
        let included = lookup
            .includes
            .and_then(|includes| includes.posts)
            .unwrap_or_default();

        let mut context = PostContext::default();
        if references.is_empty() || included.is_empty() {
            tracing::debug!(post_id, "post has no referenced posts or expansion data");
            let context = Arc::new(context);
            self.cache.posts.set(post_id, context.clone());
            return Ok(context);
        }

        let author_by_post: HashMap<&str, &str> = included
            .iter()
            .filter_map(|post| Some((post.id.as_str(), post.author_id.as_deref()?)))
            .collect();

        for reference in &references {
            let relation: Relation = reference.relation.parse()?;

            let already_seen = context
                .quotes
                .iter()
                .chain(&context.replies)
                .any(|seen| seen.id == reference.id);
            if already_seen {
                continue;
            }

            let Some(author_id) = author_by_post.get(reference.id.as_str()) else {
                tracing::warn!(
                    post_id,
                    referenced_id = %reference.id,
                    "referenced post has no author in expansion data, skipping"
                );
                continue;
            };

            let username = self.username(author_id).await?;
            let entry = PostReference {
                id: reference.id.clone(),
                username,
            };
            match relation {
                Relation::Quoted => context.quotes.push(entry),
                Relation::RepliedTo => context.replies.push(entry),
            }
        }

        tracing::debug!(
            post_id,
            quotes = context.quotes.len(),
            replies = context.replies.len(),
            "resolved post context"
        );

        let context = Arc::new(context);
        self.cache.posts.set(post_id, context.clone());
        Ok(context)
    }

    async fn username(&self, author_id: &str) -> Result<String, ProviderError> {
        if let Some(username) = self.cache.usernames.get(author_id) {
            return Ok(username);
        }

        let lookup = self.graph.fetch_user(author_id).await?;
        if let Some(errors) = lookup.errors {
            return Err(ProviderError::Api {
                operation: "user",
                payload: raw_payload(errors),
            });
        }
        let Some(user) = lookup.data else {
            return Err(ProviderError::Api {
                operation: "user",
                payload: format!("no data returned for user {author_id}"),
            });
        };

        self.cache.usernames.set(author_id, user.username.clone());
        Ok(user.username)
    }
}

fn raw_payload(errors: Vec<serde_json::Value>) -> String {
    serde_json::Value::Array(errors).to_string()
}
