use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors at the feed-ingestion edge. Nothing inside the core itself errors:
/// parse failures and resolution misses are plain data, and malformed fields
/// inside an otherwise well-shaped record decode to sentinels.
#[derive(Error, Debug, Diagnostic)]
pub enum TopologyError {
    #[error("node record is not an object-shaped value")]
    #[diagnostic(
        code(topology::invalid_node_record),
        help("the feed delivered a node payload that could not be decoded as a record")
    )]
    InvalidNodeRecord(#[source] serde_json::Error),

    #[error("map record is not an object-shaped value")]
    #[diagnostic(
        code(topology::invalid_map_record),
        help("the feed delivered a map payload that could not be decoded as a record")
    )]
    InvalidMapRecord(#[source] serde_json::Error),
}

/// Rendering of a partial parse for the query editor: the grammar matched a
/// prefix of the query but left trailing text it does not recognize.
#[derive(Error, Debug, Diagnostic)]
#[error("query has unrecognized trailing text")]
#[diagnostic(
    code(query::trailing_text),
    help("the highlighted suffix is not part of any recognized query clause")
)]
pub struct TrailingText {
    #[source_code]
    pub src: NamedSource<String>,
    #[label("not recognized")]
    pub span: SourceSpan,
}
