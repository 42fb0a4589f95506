use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Session Contract (GET /me) ---

/// MeResponse
///
/// The session status returned by the identity endpoint. This is the latest revision of
/// the contract (with `points`, `level` and `admin`).
///
/// Optional fields: an absent key and an explicit `null` both decode to `None`, and `None`
/// is never read as `false`. `authenticated` follows the same rule, so a payload without
/// it is unauthenticated. Only a literal `true` authenticates.
///
/// Only `authenticated` decides the gate. Every other field decodes leniently: a value of
/// the wrong shape (a fractional `points`, a string `admin`) becomes `None` instead of
/// failing the whole payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct MeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub authenticated: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional, as = "Option<f64>")]
    pub user_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional, as = "Option<f64>")]
    pub points: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional, as = "Option<f64>")]
    pub level: Option<i64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub admin: Option<bool>,
}

/// lenient
///
/// Decodes any JSON value and keeps it only if it fits `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl MeResponse {
    /// is_authenticated
    ///
    /// True only when the endpoint sent `"authenticated": true`.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated == Some(true)
    }

    /// current_user
    ///
    /// Derives the per-navigation user annotation (id, username, email).
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// CurrentUser
///
/// The subset of `MeResponse` attached to an allowed navigation so downstream pages can
/// read the current user without fetching `/me` a second time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct CurrentUser {
    #[ts(as = "Option<f64>")]
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// PublicRuntimeConfig
///
/// The public half of the runtime configuration, served to the browser (GET /config).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PublicRuntimeConfig {
    pub api_base: String,
}

// --- Search ---

/// SearchResponse
///
/// One search hit. Canonical shape is the revision that carries `post_id` and `title`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SearchResponse {
    #[ts(type = "number")]
    pub post_id: i64,
    pub title: String,
    pub message: String,
    pub image_url: String,
    pub video_url: String,
}

/// StreamSearchEvent
///
/// A single server-sent event from the streaming search feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct StreamSearchEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub event: Option<String>,
    pub data: String,
}

// --- Posts ---

/// Recipe
///
/// The recipe body embedded in posts. Media URLs are nullable on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Recipe {
    pub title: String,
    pub message: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// Post
///
/// A post as it appears in the paginated public feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Post {
    #[ts(type = "number")]
    pub id: i64,
    pub recipe: Recipe,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub username: String,
    pub date_posted: String,
}

/// MyPost
///
/// Compact listing entry for the current user's own posts, including hidden ones.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct MyPost {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub hidden: bool,
}

/// PostDetail
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct PostDetail {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub user_id: i64,
    pub username: String,
    pub recipe: Recipe,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub hidden: bool,
    pub date_posted: String,
}

/// PostsResponse
///
/// One page of the post feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct PostsResponse {
    #[ts(type = "number")]
    pub page: u64,
    #[ts(type = "number")]
    pub page_size: u64,
    #[ts(type = "number")]
    pub total_pages: u64,
    #[ts(type = "number")]
    pub total_items: u64,
    pub items: Vec<Post>,
}

/// RatingResponse
///
/// Result of submitting a rating, including the rater's updated points and level.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct RatingResponse {
    pub message: String,
    #[ts(type = "number")]
    pub post_id: i64,
    pub image_url: String,
    pub rating: f64,
    #[ts(type = "number")]
    pub user_points: i64,
    #[ts(type = "number")]
    pub user_level: i64,
    pub level_up: bool,
}
