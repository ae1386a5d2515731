//! iconmine-core: extraction of ICON timer tables from model run logs.
//!
//! A log file is read whole; [`TableLocator`] slices out the timer tables,
//! [`TableNormalizer`] tokenizes their rows and drops malformed ones, and
//! [`RowMapper`] coerces each row into a [`TimingRecord`]. [`LogMiner`]
//! stamps the records with the run's timestamp and experiment name and hands
//! them to a [`DocumentSink`].

pub mod config;
pub mod error;
pub mod extract;
pub mod locator;
pub mod mapper;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod sink;
pub mod storage;
pub mod tokenizer;

pub use config::{MinerConfig, Patterns};
pub use error::{MineError, Result};
pub use extract::{MetadataExtractor, TimestampExtractor};
pub use locator::TableLocator;
pub use mapper::RowMapper;
pub use models::{CellValue, Table, TimingDocument, TimingRecord, COLUMNS};
pub use normalizer::TableNormalizer;
pub use pipeline::{LogMiner, MineSummary, MinedLog};
pub use sink::{DocumentSink, JsonLinesSink, MemorySink};
pub use tokenizer::Tokenizer;
