//! Many-image evaluation on a fixed-size worker pool.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::answer_key::{derive_answer_key, AnswerKey, BaseReferenceError};
use crate::io::{load_image, OmrIoError, ResultTable};
use crate::reader::{FormResult, ParamOverrides, SheetError, SheetReader};

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Reference(#[from] BaseReferenceError),
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Io(#[from] OmrIoError),
}

/// One image to evaluate.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchJob {
    pub image: PathBuf,
    pub overrides: ParamOverrides,
}

impl BatchJob {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            overrides: ParamOverrides::default(),
        }
    }
}

/// Outcome for one job: a result, or the error that replaced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub image: PathBuf,
    pub result: Option<FormResult>,
    pub error: Option<String>,
}

impl ResultRow {
    fn failed(image: PathBuf, err: &SheetError) -> Self {
        Self {
            image,
            result: None,
            error: Some(err.to_string()),
        }
    }

    /// Failed rows report `false`: the markers were never located.
    pub fn marker_ok(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.marker_ok)
    }

    pub fn suspicious(&self) -> bool {
        self.result.as_ref().is_none_or(FormResult::suspicious)
    }

    pub fn student_no_ok(&self) -> bool {
        self.result.as_ref().is_some_and(FormResult::student_no_ok)
    }

    /// Values for the table's output columns, zeroed for failed rows.
    pub fn cells(&self) -> [String; 11] {
        let flag = |b: bool| if b { "1" } else { "0" }.to_string();
        let r = self.result.as_ref();
        let count = |f: fn(&FormResult) -> u32| r.map_or(0, f).to_string();
        [
            count(|r| r.correct),
            count(|r| r.wrong),
            count(|r| r.blank),
            count(|r| r.multi),
            r.map_or(0.0, |r| r.net).to_string(),
            flag(self.marker_ok()),
            flag(self.student_no_ok()),
            flag(self.suspicious()),
            r.and_then(|r| r.student_no.clone()).unwrap_or_default(),
            r.map(FormResult::answer_string).unwrap_or_default(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Aggregate over a finished batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub failed: usize,
    pub suspicious: usize,
}

impl BatchSummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        Self {
            rows: rows.len(),
            failed: rows.iter().filter(|r| r.result.is_none()).count(),
            suspicious: rows.iter().filter(|r| r.suspicious()).count(),
        }
    }
}

/// Evaluates jobs on `workers` threads, returning rows in job order.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    reader: SheetReader,
    workers: usize,
}

impl BatchRunner {
    /// `workers == 0` uses one thread per core.
    pub fn new(reader: SheetReader, workers: usize) -> Self {
        Self { reader, workers }
    }

    pub fn reader(&self) -> &SheetReader {
        &self.reader
    }

    /// Derive the key from the image at `reference`.
    pub fn answer_key(&self, reference: &Path) -> Result<AnswerKey, BaseReferenceError> {
        let img = load_image(reference).map_err(BaseReferenceError::Unusable)?;
        derive_answer_key(&self.reader, &img.view())
    }

    /// Evaluate a single job; per-image failures become flagged rows.
    pub fn run_one(&self, key: &AnswerKey, job: &BatchJob) -> ResultRow {
        let evaluated = load_image(&job.image).and_then(|img| {
            if job.overrides.is_empty() {
                self.reader.evaluate(&img.view(), Some(key))
            } else {
                let params = job.overrides.apply(self.reader.params());
                self.reader.evaluate_with(&img.view(), Some(key), &params)
            }
        });

        match evaluated {
            Ok(result) => ResultRow {
                image: job.image.clone(),
                result: Some(result),
                error: None,
            },
            Err(err) => {
                log::warn!("{}: {err}", job.image.display());
                ResultRow::failed(job.image.clone(), &err)
            }
        }
    }

    /// Evaluate every job. The key is shared read-only by all workers.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, key, jobs), fields(jobs = jobs.len(), workers = self.workers))
    )]
    pub fn run(&self, key: &AnswerKey, jobs: &[BatchJob]) -> Result<Vec<ResultRow>, BatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let rows: Vec<ResultRow> =
            pool.install(|| jobs.par_iter().map(|job| self.run_one(key, job)).collect());

        let summary = BatchSummary::from_rows(&rows);
        log::info!(
            "batch done: {} rows, {} failed, {} suspicious",
            summary.rows,
            summary.failed,
            summary.suspicious
        );
        Ok(rows)
    }

    /// Reference image plus CSV table in, filled CSV table out.
    pub fn run_table(
        &self,
        reference: &Path,
        table_in: &Path,
        table_out: &Path,
    ) -> Result<BatchSummary, BatchError> {
        let key = self.answer_key(reference)?;
        let mut table = ResultTable::read(table_in)?;
        let jobs = table.jobs()?;
        let rows = self.run(&key, &jobs)?;
        table.fill(&rows);
        table.write(table_out)?;
        Ok(BatchSummary::from_rows(&rows))
    }
}
