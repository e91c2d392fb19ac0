//! The CSV artifact. Downstream tooling reads it by column name and position, the header is
//! fixed to `date,tx_count,start_block,end_block`.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;

use crate::block_range::BlockNumber;

use super::DayEstimate;

pub const CSV_HEADER: [&str; 4] = ["date", "tx_count", "start_block", "end_block"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read or write day estimates csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to access day estimates file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected csv header {found:?}, expected {CSV_HEADER:?}")]
    InvalidHeader { found: Vec<String> },
    #[error("line {line}: start block {start_block} is after end block {end_block}")]
    InvalidBlockRange {
        line: u64,
        start_block: BlockNumber,
        end_block: BlockNumber,
    },
}

/// Writes rows as they come in and flushes after each one, so an interrupted run still leaves
/// every day estimated so far on disk.
pub struct DayEstimateWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl<W: Write> DayEstimateWriter<W> {
    pub fn new(inner: W) -> Result<Self, StoreError> {
        // Header written by hand so an empty run still produces a well formed file.
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, estimate: &DayEstimate) -> Result<(), StoreError> {
        self.writer.serialize(estimate)?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W, StoreError> {
        self.writer
            .into_inner()
            .map_err(|err| StoreError::Io(err.into_error()))
    }
}

impl DayEstimateWriter<File> {
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::new(File::create(path)?)
    }
}

pub fn write_day_estimates<W: Write>(inner: W, estimates: &[DayEstimate]) -> Result<(), StoreError> {
    let mut writer = DayEstimateWriter::new(inner)?;
    for estimate in estimates {
        writer.write(estimate)?;
    }
    Ok(())
}

pub fn read_day_estimates<R: Read>(inner: R) -> Result<Vec<DayEstimate>, StoreError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(inner);

    let headers = reader.headers()?.clone();
    if headers.iter().ne(CSV_HEADER) {
        return Err(StoreError::InvalidHeader {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut estimates = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let estimate: DayEstimate = record.deserialize(Some(&headers))?;
        if estimate.start_block > estimate.end_block {
            return Err(StoreError::InvalidBlockRange {
                line: record.position().map_or(0, |position| position.line()),
                start_block: estimate.start_block,
                end_block: estimate.end_block,
            });
        }
        estimates.push(estimate);
    }

    Ok(estimates)
}

pub fn read_day_estimates_from_path(path: &Path) -> Result<Vec<DayEstimate>, StoreError> {
    read_day_estimates(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};
    use test_context::{test_context, TestContext};

    use crate::series;

    use super::*;

    struct TestCsvDir {
        dir: TempDir,
    }

    impl TestContext for TestCsvDir {
        fn setup() -> Self {
            Self {
                dir: tempdir().unwrap(),
            }
        }
    }

    fn day(date: &str, tx_count: u64, start_block: i32, end_block: i32) -> DayEstimate {
        DayEstimate {
            date: date.parse::<NaiveDate>().unwrap(),
            tx_count: Some(tx_count),
            start_block,
            end_block,
        }
    }

    #[test]
    fn writes_exact_columns_test() {
        let mut buffer = Vec::new();
        write_day_estimates(
            &mut buffer,
            &[day("2025-01-01", 1_234_567, 21525891, 21533047)],
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "date,tx_count,start_block,end_block\n2025-01-01,1234567,21525891,21533047\n"
        );
    }

    #[test]
    fn empty_run_still_has_header_test() {
        let mut buffer = Vec::new();
        write_day_estimates(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "date,tx_count,start_block,end_block\n"
        );
    }

    #[test]
    fn rejects_unexpected_header_test() {
        let csv = "day,count\n2025-01-01,5\n";
        let result = read_day_estimates(csv.as_bytes());
        assert!(matches!(result, Err(StoreError::InvalidHeader { .. })));
    }

    #[test]
    fn rejects_malformed_date_test() {
        let csv = "date,tx_count,start_block,end_block\n2025-13-01,5,1,2\n";
        let result = read_day_estimates(csv.as_bytes());
        assert!(matches!(result, Err(StoreError::Csv(_))));
    }

    #[test]
    fn rejects_reversed_block_range_test() {
        let csv = "date,tx_count,start_block,end_block\n\
                   2025-01-01,5,1,2\n\
                   2025-01-02,5,300,299\n";
        let result = read_day_estimates(csv.as_bytes());
        assert!(matches!(
            result,
            Err(StoreError::InvalidBlockRange {
                line: 3,
                start_block: 300,
                end_block: 299,
            })
        ));
    }

    #[test]
    fn reads_single_block_day_test() {
        let csv = "date,tx_count,start_block,end_block\n2025-01-01,150,7,7\n";
        let estimates = read_day_estimates(csv.as_bytes()).unwrap();
        assert_eq!(estimates, vec![day("2025-01-01", 150, 7, 7)]);
    }

    #[test]
    fn reads_missing_tx_count_as_none_test() {
        let csv = "date,tx_count,start_block,end_block\n2025-01-01,,1,2\n";
        let estimates = read_day_estimates(csv.as_bytes()).unwrap();
        assert_eq!(estimates[0].tx_count, None);
    }

    #[test_context(TestCsvDir)]
    #[test]
    fn series_round_trip_test(ctx: &mut TestCsvDir) {
        let path = ctx.dir.path().join("outputs").join("eth_transaction_data.csv");
        let estimates = vec![
            day("2025-01-03", 1_210_000, 300, 399),
            day("2025-01-01", 1_100_000, 100, 199),
            day("2025-01-04", 980_000, 400, 499),
        ];

        let mut writer = DayEstimateWriter::create(&path).unwrap();
        for estimate in &estimates {
            writer.write(estimate).unwrap();
        }
        assert_eq!(writer.rows_written(), 3);
        drop(writer);

        let original = series::build(estimates.iter().cloned().map(Into::into)).unwrap();
        let reread = series::build(
            read_day_estimates_from_path(&path)
                .unwrap()
                .into_iter()
                .map(Into::into),
        )
        .unwrap();

        let pairs = |series: &series::DailySeries| {
            series
                .days()
                .iter()
                .map(|day| (day.date, day.tx_count))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&original), pairs(&reread));
        assert_eq!(reread.len(), 3);
    }
}
