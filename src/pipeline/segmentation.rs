//! Question segmentation pipeline.
//!
//! Takes a corrected page image plus the recognized text lines and produces
//! one cropped, parsed record per question. Image access is limited to the
//! final full-width crops; everything before that is lexical.

use image::{imageops, RgbImage};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::core::{ExamScanError, ScanResult};
use crate::domain::{LineRecord, Question, SegmentedQuestion};
use crate::segmentation::assembler::QUESTION_GAP;
use crate::segmentation::{ContentParser, QuestionAssembler};

/// Vertical margin added above and below a question's text range when
/// cropping, in pixels.
const CROP_MARGIN: i32 = 10;

/// Fallback crop height when a question's range collapses to nothing.
const FALLBACK_WINDOW: i32 = 100;

/// Splits corrected pages into per-question records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentationPipeline {
    parser: ContentParser,
}

impl SegmentationPipeline {
    /// Creates a segmentation pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments one page.
    ///
    /// `lines` must be sorted by `y0` ascending; unsorted input is re-sorted
    /// with a warning. Questions whose vertical range stays empty even after
    /// the fallback window are dropped, never failing the page.
    pub fn split(
        &self,
        image: &RgbImage,
        lines: &[LineRecord],
    ) -> ScanResult<Vec<SegmentedQuestion>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExamScanError::invalid_image(format!(
                "segmentation input is {width}x{height}"
            )));
        }

        let sorted;
        let lines = if lines.windows(2).all(|pair| pair[0].y0 <= pair[1].y0) {
            lines
        } else {
            warn!("text lines arrived unsorted, re-sorting by y0");
            let mut copy = lines.to_vec();
            copy.sort_by_key(|line| line.y0);
            sorted = copy;
            &sorted
        };

        let mut assembler = QuestionAssembler::new();
        for line in lines {
            assembler.push(line);
        }
        let mut questions = assembler.finish(height as i32);
        debug!(questions = questions.len(), "page assembled");

        // Crop bounds follow index order, not discovery order: each question
        // ends where the next-numbered one starts, and the highest-numbered
        // question runs to the page bottom. A lower-numbered question found
        // further down the page gets a collapsed range here and takes the
        // fallback window in crop_question.
        let count = questions.len();
        for i in 0..count {
            let y1 = if i + 1 < count {
                questions[i + 1].y0 - QUESTION_GAP
            } else {
                height as i32
            };
            questions[i].y1 = y1;
        }

        let mut segmented = Vec::with_capacity(questions.len());
        for question in questions {
            match self.crop_question(image, &question) {
                Some(record) => segmented.push(record),
                None => warn!(
                    index = question.index,
                    y0 = question.y0,
                    y1 = question.y1,
                    "question range unusable, dropped"
                ),
            }
        }
        Ok(segmented)
    }

    /// Segments a batch of pages in parallel.
    pub fn split_batch(
        &self,
        pages: &[(RgbImage, Vec<LineRecord>)],
    ) -> ScanResult<Vec<Vec<SegmentedQuestion>>> {
        pages
            .par_iter()
            .map(|(image, lines)| self.split(image, lines))
            .collect()
    }

    /// Crops one question's full-width band and parses its content.
    fn crop_question(&self, image: &RgbImage, question: &Question) -> Option<SegmentedQuestion> {
        let (width, height) = image.dimensions();
        let height = height as i32;

        let mut y0 = (question.y0 - CROP_MARGIN).max(0);
        let mut y1 = (question.y1 + CROP_MARGIN).min(height);
        if y1 <= y0 {
            // Collapsed range (overlapping line boxes, single-line question
            // at the page edge); take a fixed window below the start.
            y0 = question.y0.max(0);
            y1 = (y0 + FALLBACK_WINDOW).min(height);
        }
        if y1 <= y0 {
            return None;
        }

        let band = imageops::crop_imm(image, 0, y0 as u32, width, (y1 - y0) as u32).to_image();

        let ocr_text = question.raw_lines.join("\n");
        let parsed = self.parser.parse(&ocr_text);

        Some(SegmentedQuestion {
            index: question.index,
            image: band,
            ocr_text,
            stem: parsed.stem,
            options: parsed.options,
            question_type: question.question_type,
            y0,
            y1,
        })
    }
}
