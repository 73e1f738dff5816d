//! Social network clients used by chirp.
//!
//! Only the Twitter REST v1.1 client is implemented; see [`twitter`].
pub mod twitter;
