//! Notedex - Retrieval Engine for Study Material
//!
//! Notedex indexes the extracted text of uploaded study documents so that a
//! surrounding assistant service can answer questions from them. It splits
//! text into overlapping chunks, embeds chunks and queries into two
//! independent vector spaces (text chunks and image descriptions), keeps
//! both collections in a durable on-disk store partitioned by document, and
//! serves filtered top-k cosine retrieval to its caller.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod retrieval;
pub mod store;

pub use error::{NotedexError, Result};
