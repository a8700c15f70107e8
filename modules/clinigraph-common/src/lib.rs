pub mod types;
pub mod vocabulary;

pub use types::{
    AttributeValue, Attributes, CoverageStatus, ExtractionMeta, GraphDocument, GraphEdge,
    GraphNode, GraphStats, RiskCoverage, RiskProjection,
};
pub use vocabulary::{EdgeType, NodeType};
