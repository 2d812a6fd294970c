use std::path::Path;

use image::DynamicImage;

use crate::core::PixelImage;
use crate::sheet::{
    self, derive_answer_key, render_sheet, AnswerKey, BaseReferenceError, FormResult,
    LayoutError, OmrConfig, RenderParams, SheetError, SheetMarks, SheetReader,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum OmrError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Reference(#[from] BaseReferenceError),
    #[error(transparent)]
    Key(#[from] sheet::KeyParseError),
    #[error(transparent)]
    Io(#[from] sheet::OmrIoError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Validated layout plus reader for `cfg`.
pub fn reader_from_config(cfg: &OmrConfig) -> Result<SheetReader, OmrError> {
    Ok(SheetReader::new(cfg.layout()?, cfg.params.clone()))
}

/// Evaluate a decoded image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(reader, img, key), fields(width = img.width(), height = img.height()))
)]
pub fn evaluate_image(
    reader: &SheetReader,
    img: &DynamicImage,
    key: Option<&AnswerKey>,
) -> Result<FormResult, SheetError> {
    let pixels = PixelImage::from_dynamic(img);
    reader.evaluate(&pixels.view(), key)
}

/// Decode and evaluate the image at `path`.
pub fn evaluate_path(
    reader: &SheetReader,
    path: impl AsRef<Path>,
    key: Option<&AnswerKey>,
) -> Result<FormResult, SheetError> {
    let pixels = sheet::load_image(path)?;
    reader.evaluate(&pixels.view(), key)
}

/// Derive an answer key from the reference sheet at `path`.
pub fn key_from_reference(
    reader: &SheetReader,
    path: impl AsRef<Path>,
) -> Result<AnswerKey, BaseReferenceError> {
    let pixels = sheet::load_image(path).map_err(BaseReferenceError::Unusable)?;
    derive_answer_key(reader, &pixels.view())
}

/// Render a sheet for `cfg` and save it; the format follows the extension.
pub fn render_to_file(
    cfg: &OmrConfig,
    marks: &SheetMarks,
    params: &RenderParams,
    path: impl AsRef<Path>,
) -> Result<(), OmrError> {
    let layout = cfg.layout()?;
    let img = render_sheet(&layout, marks, &cfg.params.rectify, params);
    img.save(path)?;
    Ok(())
}
