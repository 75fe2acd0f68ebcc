//! Post graph: the data model for post context and the provider trait that
//! fetches it.

pub mod twitter;

pub use twitter::TwitterClient;

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// A referenced post together with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    pub id: String,
    pub username: String,
}

impl PostReference {
    pub fn url(&self) -> String {
        crate::extract::status_url(&self.username, &self.id)
    }
}

/// Everything known about the posts one source post points at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContext {
    /// Posts the source post quotes.
    pub quotes: Vec<PostReference>,
    /// Posts the source post replies to.
    pub replies: Vec<PostReference>,
}

impl PostContext {
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty() && self.replies.is_empty()
    }
}

/// How a referenced post relates to the post that references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Quoted,
    RepliedTo,
}

impl std::str::FromStr for Relation {
    type Err = ProviderError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "quoted" => Ok(Relation::Quoted),
            "replied_to" => Ok(Relation::RepliedTo),
            other => Err(ProviderError::UnknownRelation {
                relation: other.to_string(),
            }),
        }
    }
}

/// Provider response for a post fetched with referenced-post and author
/// expansions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostLookup {
    #[serde(default)]
    pub data: Option<PostData>,
    #[serde(default)]
    pub includes: Option<Includes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostData {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, rename = "referenced_tweets")]
    pub referenced_posts: Option<Vec<ReferencedPost>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencedPost {
    pub id: String,
    /// Raw relation tag, e.g. `quoted` or `replied_to`.
    #[serde(rename = "type")]
    pub relation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Includes {
    #[serde(default, rename = "tweets")]
    pub posts: Option<Vec<IncludedPost>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludedPost {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
}

/// Provider response for a user lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLookup {
    #[serde(default)]
    pub data: Option<UserData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
}

/// Source of post and user data.
///
/// Implementations report transport failures as `Err`. API-level errors come
/// back inside the lookup's `errors` field and are judged by the resolver.
pub trait PostGraph: Send + Sync + 'static {
    /// Fetch a post with its referenced posts and their authors expanded.
    fn fetch_post_with_expansions(
        &self,
        post_id: &str,
    ) -> impl std::future::Future<Output = Result<PostLookup, ProviderError>> + Send;

    /// Fetch a user by id.
    fn fetch_user(
        &self,
        author_id: &str,
    ) -> impl std::future::Future<Output = Result<UserLookup, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_expanded_lookup() {
        let lookup: PostLookup = serde_json::from_value(json!({
            "data": {
                "id": "111",
                "text": "look at this",
                "author_id": "1",
                "referenced_tweets": [{"type": "quoted", "id": "222"}]
            },
            "includes": {
                "tweets": [{"id": "222", "author_id": "2", "text": "original"}],
                "users": [{"id": "1", "username": "alice"}]
            }
        }))
        .expect("lookup should deserialize");

        let data = lookup.data.expect("data present");
        let referenced = data.referenced_posts.expect("references present");
        assert_eq!(referenced[0].id, "222");
        assert_eq!(referenced[0].relation, "quoted");

        let included = lookup.includes.and_then(|i| i.posts).expect("includes present");
        assert_eq!(included[0].author_id.as_deref(), Some("2"));
        assert!(lookup.errors.is_none());
    }

    #[test]
    fn deserializes_error_lookup() {
        let lookup: PostLookup = serde_json::from_value(json!({
            "errors": [{"title": "Not Found Error", "detail": "Could not find tweet"}]
        }))
        .expect("lookup should deserialize");
        assert!(lookup.data.is_none());
        assert_eq!(lookup.errors.map(|e| e.len()), Some(1));
    }

    #[test]
    fn parses_relation_tags() {
        assert_eq!("quoted".parse::<Relation>().ok(), Some(Relation::Quoted));
        assert_eq!("replied_to".parse::<Relation>().ok(), Some(Relation::RepliedTo));
        assert!(matches!(
            "retweeted".parse::<Relation>(),
            Err(ProviderError::UnknownRelation { relation }) if relation == "retweeted"
        ));
    }
}
