//! Twitter REST v1.1 integration surface.
//!
//! [`TwitterClient`] signs requests with the user's OAuth 1.0a credentials and
//! forwards every successful JSON body to the [`ResponseHandler`] it was built
//! with. The [`handlers`] module ships the handlers the `chirp` binary uses,
//! and [`types`] holds the typed payloads those handlers decode.
pub mod client;
pub mod error;
pub mod handlers;
pub mod types;

pub use client::{
    BASE_URL, DEFAULT_COUNT, LIST_MEMBERSHIPS_PATH, SEARCH_PATH, TwitterClient,
    USER_TIMELINE_PATH, search_query,
};
pub use error::{Result, TwitterError};
pub use handlers::{
    DEFAULT_IMAGES_DIR, FnHandler, ImageDownloader, ListDisplay, ResponseHandler, TimelineDisplay,
};
