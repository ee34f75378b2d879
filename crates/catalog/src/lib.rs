//! Artifact catalog.
//!
//! The catalog is one JSON document holding an ordered list of artifact
//! records. A single actor task owns the document: every mutation is
//! re-read, applied and fully rewritten in turn, so concurrent request
//! handlers never lose each other's updates.
//!
//! # Lookups
//!
//! - **Exact**: [`Catalog::get`] by stored file name
//! - **Fragment**: [`Catalog::find_by_name_fragment`], exact base name
//!   first, then the first record whose name contains the fragment
//! - **Status**: [`Catalog::compression_status`], which follows a
//!   derivative's `parent` back to its source

pub mod catalog;
pub mod document;
pub mod error;
pub mod types;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use types::ArtifactRecord;
