//! Prompt management for the avatar knowledge base service.
//!
//! The server half ([`features::prompts`]) proxies create, list and update
//! calls to the vendor API. The client half ([`client`]) keeps a cached,
//! optimistically updated view of the same prompts for a UI.

pub mod client;
pub mod core;
pub mod features;
pub mod shared;
