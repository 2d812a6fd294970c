use omr_core::{binarize, BinaryImage, PixelImageView};
use omr_markers::MarkerDetector;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::classify::classify;
use super::rectify::rectify;
use super::result::{FormResult, QuestionResult};
use super::score::score_question;
use super::student_id::read_student_number;
use super::{OmrParams, SheetError};
use crate::answer_key::AnswerKey;
use crate::layout::Layout;

/// Evaluates sheet images against one layout.
///
/// Holds no per-image state; a single reader can be shared across threads.
#[derive(Clone, Debug)]
pub struct SheetReader {
    layout: Layout,
    params: OmrParams,
}

impl SheetReader {
    pub fn new(layout: Layout, params: OmrParams) -> Self {
        Self { layout, params }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn params(&self) -> &OmrParams {
        &self.params
    }

    /// Evaluate with the reader's own parameters.
    pub fn evaluate(
        &self,
        image: &PixelImageView<'_>,
        key: Option<&AnswerKey>,
    ) -> Result<FormResult, SheetError> {
        self.evaluate_with(image, key, &self.params)
    }

    /// Evaluate with explicit parameters (used for per-row overrides).
    ///
    /// Steps: grayscale, binarize, detect markers, rectify the color image,
    /// binarize again in layout space, score, classify and grade.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image, key, params), fields(width = image.width, height = image.height))
    )]
    pub fn evaluate_with(
        &self,
        image: &PixelImageView<'_>,
        key: Option<&AnswerKey>,
        params: &OmrParams,
    ) -> Result<FormResult, SheetError> {
        let gray = image.to_gray();
        let binary = binarize(&gray.view(), &params.binarize);
        let detection = MarkerDetector::new(params.marker).detect(&binary)?;
        log::debug!("markers at {:?}", detection.corners.quad());

        let rectified = rectify(
            image,
            &detection.corners,
            self.layout.width,
            self.layout.height,
            &params.rectify,
        )?;
        let rect_gray = rectified.image.view().to_gray();
        let rect_binary = binarize(&rect_gray.view(), &params.binarize);

        let questions = self.grade_questions(&rect_binary, key, params);
        let student_no = self.layout.student_id.as_ref().and_then(|block| {
            read_student_number(&rect_binary, block, params.classify.fill_threshold)
        });

        let result =
            FormResult::from_questions(questions, detection.corners, student_no, params.penalty);
        log::debug!(
            "sheet: correct={} wrong={} blank={} multi={}",
            result.correct,
            result.wrong,
            result.blank,
            result.multi
        );
        Ok(result)
    }

    fn grade_questions(
        &self,
        binary: &BinaryImage,
        key: Option<&AnswerKey>,
        params: &OmrParams,
    ) -> Vec<QuestionResult> {
        self.layout
            .questions
            .iter()
            .map(|q| {
                let scores = score_question(binary, q, &params.score);
                let classification = classify(&scores, &params.classify);
                let grade = key.and_then(|k| classification.grade(k.get(q.number)));
                QuestionResult {
                    number: q.number,
                    classification,
                    grade,
                    scores,
                }
            })
            .collect()
    }
}
