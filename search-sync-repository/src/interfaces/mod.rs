//! Interface definitions for the search engine client.
//!
//! This module defines the abstract `SearchClient` trait that allows for
//! dependency injection and swappable transports.

mod search_client;

pub use search_client::SearchClient;
