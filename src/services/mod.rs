//! Graph construction services.
//!
//! Everything here works on in-memory graphs only; the store is reached
//! through [`crate::sync`] and [`crate::repositories`].

mod builder;
mod linker;
mod normalizer;
mod similarity;

pub use builder::CanonicalEntityBuilder;
pub use linker::{InterGraphLinker, LinkTemplate};
pub use normalizer::AttributeNormalizer;
pub use similarity::{jaccard, similarity_edges, SimilarityOptions};
