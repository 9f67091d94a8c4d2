//! Thin per-service API wrappers.
//!
//! Each wrapper is one function per external endpoint composed on
//! [`gleaner_client::RequestClient`]: record-shape decoding, pagination or
//! chunking where the service requires it, nothing else. Service handles are
//! constructed once and passed by reference into the gather stages.

mod citations;
mod code_search;
mod registry;

pub use citations::{CitationRecord, CitationResults, Citations};
pub use code_search::{CodeSearch, Contributor, Repo, RepoSearchPage};
pub use registry::{Registry, RegistryEndpoint, SearchMeta, SearchResults};
