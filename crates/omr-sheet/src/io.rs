//! JSON configuration, image loading and the CSV result table.

use std::fs;
use std::path::{Path, PathBuf};

use omr_core::PixelImage;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::batch::{BatchJob, ResultRow};
use crate::layout::{generate_layout, FormConfig, Layout, LayoutError};
use crate::reader::{OmrParams, ParamOverrides, SheetError};

#[derive(thiserror::Error, Debug)]
pub enum OmrIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("result table has no `{0}` column")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid `{column}` value {value:?}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Form geometry plus reader tunables, as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmrConfig {
    pub form: FormConfig,
    pub params: OmrParams,
}

impl OmrConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OmrIoError> {
        read_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OmrIoError> {
        write_json(self, path)
    }

    /// Validated layout for `form`.
    pub fn layout(&self) -> Result<Layout, LayoutError> {
        self.form.validate()?;
        Ok(generate_layout(&self.form))
    }
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, OmrIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<(), OmrIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Decode an image file of any format the `image` crate supports.
pub fn load_image(path: impl AsRef<Path>) -> Result<PixelImage, SheetError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| SheetError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PixelImage::from_dynamic(&img))
}

pub const IMAGE_COLUMN: &str = "image";

/// Columns written by [`ResultTable::fill`], in order.
pub const OUTPUT_COLUMNS: [&str; 11] = [
    "correct",
    "wrong",
    "blank",
    "multi",
    "net",
    "marker_ok",
    "student_no_ok",
    "suspicious",
    "student_no",
    "answers",
    "error",
];

/// A CSV table with one sheet image per row.
///
/// Unknown columns pass through untouched; output columns are appended when
/// missing and overwritten otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Relative image paths resolve against this directory.
    pub base_dir: PathBuf,
}

impl ResultTable {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, OmrIoError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self {
            headers,
            rows,
            base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), OmrIoError> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    fn column_or_insert(&mut self, name: &str) -> usize {
        self.column(name).unwrap_or_else(|| {
            self.headers.push(name.to_string());
            self.headers.len() - 1
        })
    }

    /// One job per row, in row order.
    pub fn jobs(&self) -> Result<Vec<BatchJob>, OmrIoError> {
        let image_col = self
            .column(IMAGE_COLUMN)
            .ok_or(OmrIoError::MissingColumn(IMAGE_COLUMN))?;

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw = row.get(image_col).map(|s| s.trim()).unwrap_or_default();
                let image = Path::new(raw);
                let image = if image.is_absolute() {
                    image.to_path_buf()
                } else {
                    self.base_dir.join(image)
                };
                Ok(BatchJob {
                    image,
                    overrides: self.overrides(i, row)?,
                })
            })
            .collect()
    }

    fn overrides(&self, row_idx: usize, row: &[String]) -> Result<ParamOverrides, OmrIoError> {
        Ok(ParamOverrides {
            fill_threshold: self.parse_cell(row_idx, row, "fill_threshold")?,
            roi_scale: self.parse_cell(row_idx, row, "roi_scale")?,
            mask_ratio: self.parse_cell(row_idx, row, "mask_ratio")?,
            block_size: self.parse_cell(row_idx, row, "block_size")?,
        })
    }

    fn parse_cell<T: std::str::FromStr>(
        &self,
        row_idx: usize,
        row: &[String],
        column: &'static str,
    ) -> Result<Option<T>, OmrIoError> {
        let Some(cell) = self.column(column).and_then(|c| row.get(c)) else {
            return Ok(None);
        };
        let cell = cell.trim();
        if cell.is_empty() {
            return Ok(None);
        }
        cell.parse().map(Some).map_err(|_| OmrIoError::InvalidValue {
            row: row_idx + 1,
            column,
            value: cell.to_string(),
        })
    }

    /// Write `results` into the output columns; `results[i]` fills row `i`.
    pub fn fill(&mut self, results: &[ResultRow]) {
        let cols: Vec<usize> = OUTPUT_COLUMNS
            .iter()
            .map(|name| self.column_or_insert(name))
            .collect();
        let width = self.headers.len();

        for (row, res) in self.rows.iter_mut().zip(results) {
            if row.len() < width {
                row.resize(width, String::new());
            }
            for (col, value) in cols.iter().zip(res.cells()) {
                row[*col] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("omr.json");
        let mut cfg = OmrConfig::default();
        cfg.form.question_count = 20;
        cfg.params.classify.fill_threshold = 0.25;
        cfg.write_json(&path).expect("write");
        assert_eq!(OmrConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: OmrConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, OmrConfig::default());
        assert_eq!(cfg.layout().expect("layout").questions.len(), 30);
    }

    #[test]
    fn jobs_resolve_paths_and_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("runs.csv");
        let mut f = fs::File::create(&path).expect("create");
        writeln!(f, "id,image,fill_threshold,block_size").expect("write");
        writeln!(f, "a,scan1.png,0.3,15").expect("write");
        writeln!(f, "b,/abs/scan2.png,,").expect("write");
        drop(f);

        let table = ResultTable::read(&path).expect("read");
        let jobs = table.jobs().expect("jobs");
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].image, dir.path().join("scan1.png"));
        assert_eq!(jobs[0].overrides.fill_threshold, Some(0.3));
        assert_eq!(jobs[0].overrides.block_size, Some(15));
        assert_eq!(jobs[0].overrides.roi_scale, None);
        assert_eq!(jobs[1].image, PathBuf::from("/abs/scan2.png"));
        assert!(jobs[1].overrides.is_empty());
    }

    #[test]
    fn bad_override_names_the_row() {
        let table = ResultTable {
            headers: vec!["image".into(), "roi_scale".into()],
            rows: vec![vec!["x.png".into(), "big".into()]],
            base_dir: PathBuf::new(),
        };
        match table.jobs() {
            Err(OmrIoError::InvalidValue { row, column, .. }) => {
                assert_eq!((row, column), (1, "roi_scale"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_image_column_is_an_error() {
        let table = ResultTable {
            headers: vec!["path".into()],
            rows: Vec::new(),
            base_dir: PathBuf::new(),
        };
        assert!(matches!(
            table.jobs(),
            Err(OmrIoError::MissingColumn("image"))
        ));
    }
}
