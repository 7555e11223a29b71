//! Domain models for the property graph.

mod category;
mod descriptor;
mod edge;
mod node;
mod value;

pub use category::Category;
pub use descriptor::{DescriptorValue, Location, QueryDescriptor, QueryKind};
pub use edge::{Edge, EdgeKey, EDGE_FIELDS, EDGE_IDENTITY_FIELDS};
pub use node::{Node, NODE_FIELDS};
pub use value::{record_from_json, Property, RawRecord, RawValue};
