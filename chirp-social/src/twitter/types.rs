use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `1.1/search/tweets.json`; only the statuses are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Status>,
}

/// One entry of a timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    #[serde(alias = "full_text")]
    pub text: String,
    pub created_at: String,
    pub user: User,

    // Only present when the status carries native media.
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub screen_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub media_url: String,
}

/// Body of `1.1/lists/memberships.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMemberships {
    pub lists: Vec<TwitterList>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterList {
    pub name: String,
}

impl Status {
    /// Media attached to this status, in API order.
    pub fn media(&self) -> &[Media] {
        self.extended_entities
            .as_ref()
            .map(|e| e.media.as_slice())
            .unwrap_or_default()
    }
}

/// Pull statuses out of either a timeline array or a search response object.
pub fn statuses_from_value(body: &Value) -> serde_json::Result<Vec<Status>> {
    match body {
        Value::Object(obj) if obj.contains_key("statuses") => {
            serde_json::from_value::<SearchResponse>(body.clone()).map(|r| r.statuses)
        }
        _ => serde_json::from_value(body.clone()),
    }
}
