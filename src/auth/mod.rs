// Standalone credential utilities. Nothing in the HTTP surface calls them
// yet; the extractor and token helpers are ready for routes to opt in.
#![allow(dead_code)]

pub(crate) mod extractors;
pub mod jwt;
pub mod password;
