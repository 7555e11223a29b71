//! Macro for inline statements with named parameters.

/// Builds a [`Query`](crate::graph::Query) with named parameters.
///
/// Parameter serialization is fallible, so the parameterized form uses `?`
/// and must be called from a function returning `Result<_, AppError>`.
///
/// ```ignore
/// let rows = cypher!(client, "MATCH (n:Node {id: $id}) RETURN n.name AS name", id = node_id)
///     .fetch_all()
///     .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value)?)+
    };
}
