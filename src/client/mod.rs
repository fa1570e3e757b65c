//! Client-side state for UIs that manage prompts through the proxy.
//!
//! [`PromptsStore`] is created explicitly and shared with `Arc`; tests build
//! their own instances over a scripted [`PromptsApi`].

pub mod api;
pub mod errors;
pub mod store;

pub use api::{ApiFailure, CreateOutcome, HttpPromptsApi, PromptsApi};
pub use errors::StoreOperation;
pub use store::{PromptsStore, StoreSnapshot};
