use crate::volumes::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read input file `{path}`")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot find `{0}` collection in input file")]
    MissingCollection(&'static str),

    #[error("malformed input document\n{0}")]
    Document(ParseError),

    #[error("malformed entry {index} of `{collection}`\n{source}")]
    Entry {
        collection: &'static str,
        index: usize,
        source: ParseError,
    },

    #[error("entry {index} is out of range for `{collection}` with {count} entries")]
    OutOfRange {
        collection: &'static str,
        index: usize,
        count: usize,
    },

    #[error("channel identifier {chid} is beyond the limit of {limit} channels")]
    ChannelOutOfRange { chid: u32, limit: usize },

    #[error("failed to write output record")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize output record")]
    Serialize(#[from] serde_json::Error),
}
