//! The mining pipeline: log text → tables → records → documents → sink.
//!
//! `LogMiner` owns the compiled [`Patterns`] and wires the extraction
//! components together. Everything below [`LogMiner::mine_text`] is pure;
//! file and sink I/O happen in the directory-level methods.

use std::path::Path;

use tracing::{error, info, warn};

use crate::config::{MinerConfig, Patterns};
use crate::error::{MineError, Result};
use crate::extract::{MetadataExtractor, TimestampExtractor};
use crate::locator::TableLocator;
use crate::mapper::RowMapper;
use crate::models::{TimingDocument, TimingRecord};
use crate::normalizer::TableNormalizer;
use crate::sink::DocumentSink;
use crate::storage;
use crate::tokenizer::Tokenizer;

/// Everything mined from one log text.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedLog {
    pub experiment: String,
    pub time_stamp: chrono::NaiveDateTime,
    /// Tables that kept at least one valid row.
    pub tables: usize,
    pub documents: Vec<TimingDocument>,
}

/// Counters for a mining pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MineSummary {
    pub directories: usize,
    /// Log files that produced documents.
    pub files: usize,
    /// Log files without a timer table.
    pub skipped_files: usize,
    /// Log files that could not be read.
    pub failed_files: usize,
    pub indexed: usize,
    pub rejected: usize,
}

impl std::ops::AddAssign for MineSummary {
    fn add_assign(&mut self, other: Self) {
        self.directories += other.directories;
        self.files += other.files;
        self.skipped_files += other.skipped_files;
        self.failed_files += other.failed_files;
        self.indexed += other.indexed;
        self.rejected += other.rejected;
    }
}

pub struct LogMiner {
    patterns: Patterns,
}

impl LogMiner {
    pub fn new(config: &MinerConfig) -> Result<Self> {
        Ok(Self::from_patterns(config.compile()?))
    }

    pub fn from_patterns(patterns: Patterns) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Records of every table row in `text`, or `None` when the text holds
    /// no timer table. Rows after the stop sentinel are not mapped.
    pub fn records(&self, text: &str) -> Option<(usize, Vec<TimingRecord>)> {
        let tables = TableLocator::new(&self.patterns).locate_tables(text)?;
        let tables =
            TableNormalizer::new(Tokenizer::new(self.patterns.leading_marker)).normalize(tables);
        let mapper = RowMapper::new();
        let sentinel = self.patterns.stop_sentinel.as_deref();

        let mut records = vec![];
        for table in &tables {
            for row in table.rows() {
                if sentinel.is_some() && row.first().map(String::as_str) == sentinel {
                    break;
                }
                records.push(mapper.map_row(row));
            }
        }
        Some((tables.len(), records))
    }

    /// Mine one log text into documents stamped with the run's latest
    /// timestamp and experiment name.
    pub fn mine_text(&self, text: &str) -> Option<MinedLog> {
        let (tables, records) = self.records(text)?;
        let time_stamp = TimestampExtractor::new(&self.patterns).latest_timestamp(text);
        let experiment = MetadataExtractor::new(&self.patterns).extract_experiment_name(text);

        let documents = records
            .into_iter()
            .map(|record| TimingDocument {
                record,
                time_stamp,
                experiment: experiment.clone(),
            })
            .collect();

        Some(MinedLog {
            experiment,
            time_stamp,
            tables,
            documents,
        })
    }

    pub fn mine_file(&self, path: &Path) -> Result<Option<MinedLog>> {
        info!(file = %path.display(), "Processing file");
        let text = storage::read_logfile(path)?;
        Ok(self.mine_text(&text))
    }

    /// Hand every document to the sink. A document the store refuses as a
    /// bad request is logged and skipped; any other sink error aborts the
    /// batch. Returns `(indexed, rejected)`.
    pub fn ingest(
        &self,
        documents: &[TimingDocument],
        sink: &mut dyn DocumentSink,
    ) -> Result<(usize, usize)> {
        let mut indexed = 0;
        let mut rejected = 0;
        for document in documents {
            match sink.index(document) {
                Ok(()) => indexed += 1,
                Err(MineError::BadRequest(reason)) => {
                    error!(
                        name = ?document.record.name,
                        experiment = %document.experiment,
                        reason = %reason,
                        "Document rejected by the store"
                    );
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok((indexed, rejected))
    }

    /// Mine every log file directly inside `dir`. Unreadable files are
    /// logged and counted; they do not stop the batch. A sink failure does.
    pub fn mine_directory(&self, dir: &Path, sink: &mut dyn DocumentSink) -> Result<MineSummary> {
        info!(directory = %dir.display(), "Processing files in directory");
        let mut summary = MineSummary {
            directories: 1,
            ..Default::default()
        };

        for file in storage::list_log_files(dir, &self.patterns.log_file_prefix)? {
            match self.mine_file(&file) {
                Ok(Some(mined)) => {
                    let (indexed, rejected) = self.ingest(&mined.documents, sink)?;
                    info!(
                        file = %file.display(),
                        experiment = %mined.experiment,
                        tables = mined.tables,
                        indexed,
                        rejected,
                        "Mined file"
                    );
                    summary.files += 1;
                    summary.indexed += indexed;
                    summary.rejected += rejected;
                }
                Ok(None) => {
                    warn!(file = %file.display(), "No timer table, skipping file");
                    summary.skipped_files += 1;
                }
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Failed to read log file");
                    summary.failed_files += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Mine every directory under `root` not yet listed in `state_file`.
    /// With `record_state`, each directory is appended to the state file once
    /// its batch completes; a directory whose batch failed stays unlisted.
    pub fn mine_tree(
        &self,
        root: &Path,
        state_file: &Path,
        record_state: bool,
        sink: &mut dyn DocumentSink,
    ) -> Result<MineSummary> {
        let processed = storage::load_processed_dirs(state_file)?;
        let mut summary = MineSummary::default();

        for dir in storage::find_log_dirs(root, &self.patterns.log_file_prefix)? {
            if processed.contains(&dir) {
                info!(directory = %dir.display(), "Already mined, skipping");
                continue;
            }
            match self.mine_directory(&dir, sink) {
                Ok(dir_summary) => {
                    summary += dir_summary;
                    if record_state {
                        storage::mark_processed(state_file, &dir)?;
                    }
                }
                Err(e) => error!(directory = %dir.display(), error = %e, "Failed to mine directory"),
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use crate::sink::MemorySink;

    const HEADER: &str = "name   # calls  t_min  min rank  t_avg  t_max  max rank  total min (s)  total min rank  total max (s)  total max rank  total avg (s)  # PEs";

    fn log_text(rows: &[&str]) -> String {
        let mut lines = vec![
            "SLURM_JOB_NAME=check.mch_bench_r19b08_kenda1.run".to_string(),
            "Sun 15 Oct 2023 01:18:54 PM CEST".to_string(),
            HEADER.to_string(),
            "             (s)     (s)     (s)".to_string(),
            "-".repeat(80),
        ];
        lines.extend(rows.iter().map(|r| r.to_string()));
        lines.push("-".repeat(165));
        lines.push("Sun 15 Oct 2023 01:35:10 PM CEST".to_string());
        lines.join("\n")
    }

    struct RejectingSink {
        calls: usize,
    }

    impl DocumentSink for RejectingSink {
        fn index(&mut self, _document: &TimingDocument) -> Result<()> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                Err(MineError::BadRequest("mapper_parsing_exception".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_mine_text_end_to_end() {
        let text = log_text(&[
            " L total      1   15m16s  0  15m16s  15m16s  3  15m16s  0  15m16s  3  15m16s  4",
            " L nh_solve 130   0.143s  3   0.15s  0.163s  1  19.63s  2  20.99s  0  20.27s  4",
            " L physics   65   -0.0s   1    2.5s    3.0s  2   1m05s  0   70.5s  1   68.0s  4",
        ]);
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        let mined = miner.mine_text(&text).unwrap();

        assert_eq!(mined.tables, 1);
        assert_eq!(mined.experiment, "check.mch_bench_r19b08_kenda1.run");
        assert_eq!(mined.time_stamp.to_string(), "2023-10-15 13:35:10");
        assert_eq!(mined.documents.len(), 3);
        for doc in &mined.documents {
            assert!(doc.record.name.as_ref().and_then(CellValue::as_str).is_some());
            assert_eq!(doc.record.populated(), 13);
        }
        assert_eq!(mined.documents[0].record.t_avg, Some(CellValue::Float(916.0)));
        assert_eq!(mined.documents[2].record.t_min, Some(CellValue::Int(0)));
        assert_eq!(mined.documents[2].record.total_min, Some(CellValue::Float(65.0)));
    }

    #[test]
    fn test_stop_sentinel_ends_table() {
        let text = log_text(&[
            "total     1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
            "wrt_output 1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
            "after     1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
        ]);
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        assert_eq!(miner.mine_text(&text).unwrap().documents.len(), 1);

        let miner = LogMiner::new(&MinerConfig::default().with_stop_sentinel(None)).unwrap();
        assert_eq!(miner.mine_text(&text).unwrap().documents.len(), 3);
    }

    #[test]
    fn test_text_without_table_yields_none() {
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        assert!(miner.mine_text("nothing to see here").is_none());
    }

    #[test]
    fn test_rejected_documents_do_not_stop_ingest() {
        let text = log_text(&[
            "a  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
            "b  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
            "c  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
        ]);
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        let mined = miner.mine_text(&text).unwrap();
        let mut sink = RejectingSink { calls: 0 };
        assert_eq!(miner.ingest(&mined.documents, &mut sink).unwrap(), (1, 2));
        assert_eq!(sink.calls, 3);
    }

    struct UnreachableSink;

    impl DocumentSink for UnreachableSink {
        fn index(&mut self, _document: &TimingDocument) -> Result<()> {
            Err(MineError::Sink("connection refused".to_string()))
        }
    }

    #[test]
    fn test_transport_failure_stops_ingest() {
        let text = log_text(&[
            "a  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
            "b  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0",
        ]);
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        let mined = miner.mine_text(&text).unwrap();
        let err = miner.ingest(&mined.documents, &mut UnreachableSink).unwrap_err();
        assert!(matches!(err, MineError::Sink(_)));
    }

    #[test]
    fn test_memory_sink_receives_documents() {
        let text = log_text(&["a  1  2.0  0  2.0  2.0  0  2.0  0  2.0  0  2.0"]);
        let miner = LogMiner::new(&MinerConfig::default()).unwrap();
        let mined = miner.mine_text(&text).unwrap();
        let mut sink = MemorySink::new();
        assert_eq!(miner.ingest(&mined.documents, &mut sink).unwrap(), (1, 0));
        assert_eq!(sink.documents[0].experiment, "check.mch_bench_r19b08_kenda1.run");
    }

    #[test]
    fn test_summary_add_assign() {
        let mut total = MineSummary::default();
        total += MineSummary {
            directories: 1,
            files: 2,
            indexed: 5,
            ..Default::default()
        };
        total += MineSummary {
            directories: 1,
            rejected: 1,
            ..Default::default()
        };
        assert_eq!(total.directories, 2);
        assert_eq!(total.files, 2);
        assert_eq!(total.indexed, 5);
        assert_eq!(total.rejected, 1);
    }
}
