//! Remote store abstraction.
//!
//! The pipeline talks to the graph database only through a small trait
//! hierarchy, so batch synchronization can be exercised against the
//! in-process [`RecordingClient`](backends::recording::RecordingClient)
//! and deployed against Neo4j unchanged.
//!
//! - [`CypherExecutor`] - Run a parameterized statement
//! - [`Transaction`] - Commit/rollback
//! - [`GraphClient`] - Transaction creation
//!
//! ```ignore
//! use sidb_network::graph::{GraphClient, QueryExt, Transaction};
//!
//! let txn = client.begin().await?;
//! txn.query("UNWIND $nodes AS node MERGE (n:Node {id: node.id})")
//!     .param("nodes", rows)?
//!     .run()
//!     .await?;
//! txn.commit().await?;
//! ```

mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{run_in_transaction, CypherExecutor, GraphClient, Transaction};

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::cypher;
