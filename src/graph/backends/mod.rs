//! Store backends.
//!
//! Each backend implements the traits from [`crate::graph::traits`]:
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | Neo4j (Bolt) | [`neo4j`] | Production target |
//! | Recording | [`recording`] | Dry runs and tests |

pub mod neo4j;
pub mod recording;
