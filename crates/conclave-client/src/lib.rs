//! # conclave-client
//!
//! The supervisor's view of the specialist fleet: discover which
//! endpoint serves which tool, call it with retry/backoff, normalize
//! whatever shape comes back (spec.md §4.6).
//!
//! | Module | Contents |
//! |---|---|
//! | [`descriptor_cache`] | `name -> endpoint` map built at startup |
//! | [`retry`] | Exponential backoff with jitter |
//! | [`client`] | `McpClient` |

pub mod client;
pub mod descriptor_cache;
pub mod retry;

pub use client::McpClient;
