use std::fmt;

use serde::{Deserialize, Serialize};

use super::params::ClassifyParams;
use super::score::ChoiceScore;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Blank,
    Marked,
    Multiple,
}

/// Marked option compared against the answer key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Correct,
    Wrong,
}

/// Decision for one question.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: ResponseStatus,
    /// `None` exactly when `status` is `Blank`.
    pub marked: Option<char>,
    /// Largest fill ratio over the question's choices.
    pub max_score: f32,
    /// Passed the blank guard but nothing reached the fill threshold, with
    /// the maximum above `ambiguous_frac · fill_threshold`.
    pub ambiguous: bool,
}

impl Classification {
    pub fn blank(max_score: f32) -> Self {
        Self {
            status: ResponseStatus::Blank,
            marked: None,
            max_score,
            ambiguous: false,
        }
    }

    /// Grade against the key entry; blanks and unknown keys stay ungraded.
    pub fn grade(&self, key: Option<char>) -> Option<Grade> {
        let (marked, key) = (self.marked?, key?);
        Some(if marked == key {
            Grade::Correct
        } else {
            Grade::Wrong
        })
    }

    /// `A`, `A*` for a multiple mark, `-` for blank.
    pub fn display(&self) -> DisplayMark {
        DisplayMark(*self)
    }
}

pub struct DisplayMark(Classification);

impl fmt::Display for DisplayMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0.status, self.0.marked) {
            (ResponseStatus::Multiple, Some(c)) => write!(f, "{c}*"),
            (_, Some(c)) => write!(f, "{c}"),
            (_, None) => f.write_str("-"),
        }
    }
}

/// Highest score; exact ties go to the smaller label.
fn strongest<'a>(scores: impl Iterator<Item = &'a ChoiceScore>) -> Option<&'a ChoiceScore> {
    scores.fold(None::<&ChoiceScore>, |best, s| match best {
        Some(b) if b.score > s.score || (b.score == s.score && b.label <= s.label) => Some(b),
        _ => Some(s),
    })
}

/// Turn one question's fill ratios into a blank/marked/multiple decision.
pub fn classify(scores: &[ChoiceScore], params: &ClassifyParams) -> Classification {
    let finite = || scores.iter().filter(|s| s.score.is_finite());
    let Some(top) = strongest(finite()) else {
        return Classification::blank(0.0);
    };
    let max_score = top.score;

    if max_score < params.blank_guard {
        return Classification::blank(max_score);
    }

    let filled = finite().filter(|s| s.score >= params.fill_threshold).count();
    match filled {
        0 => {
            let ambiguous = max_score >= params.ambiguous_frac * params.fill_threshold;
            let salvaged = params.salvage_threshold.is_some_and(|t| max_score > t);
            Classification {
                status: if salvaged {
                    ResponseStatus::Marked
                } else {
                    ResponseStatus::Blank
                },
                marked: salvaged.then_some(top.label),
                max_score,
                ambiguous,
            }
        }
        1 => Classification {
            status: ResponseStatus::Marked,
            marked: Some(top.label),
            max_score,
            ambiguous: false,
        },
        _ => Classification {
            status: ResponseStatus::Multiple,
            marked: Some(top.label),
            max_score,
            ambiguous: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f32]) -> Vec<ChoiceScore> {
        values
            .iter()
            .enumerate()
            .map(|(i, &score)| ChoiceScore {
                label: char::from(b'A' + i as u8),
                score,
            })
            .collect()
    }

    fn params() -> ClassifyParams {
        ClassifyParams::default()
    }

    #[test]
    fn one_strong_choice_is_marked() {
        let c = classify(&row(&[0.9, 0.1, 0.1, 0.1, 0.1]), &params());
        assert_eq!(c.status, ResponseStatus::Marked);
        assert_eq!(c.marked, Some('A'));
        assert_eq!(c.max_score, 0.9);
    }

    #[test]
    fn all_below_guard_is_blank() {
        let c = classify(&row(&[0.17, 0.05, 0.0, 0.1, 0.12]), &params());
        assert_eq!(c.status, ResponseStatus::Blank);
        assert_eq!(c.marked, None);
        assert!(!c.ambiguous);
    }

    #[test]
    fn two_filled_choices_are_multiple() {
        let c = classify(&row(&[0.9, 0.85, 0.1, 0.1, 0.1]), &params());
        assert_eq!(c.status, ResponseStatus::Multiple);
        assert_eq!(c.marked, Some('A'));
        assert_eq!(c.display().to_string(), "A*");
    }

    #[test]
    fn multiple_tie_goes_to_first_label() {
        let c = classify(&row(&[0.1, 0.7, 0.3, 0.7, 0.1]), &params());
        assert_eq!(c.status, ResponseStatus::Multiple);
        assert_eq!(c.marked, Some('B'));
    }

    #[test]
    fn salvage_takes_argmax_between_guard_and_threshold() {
        let c = classify(&row(&[0.05, 0.19, 0.1, 0.0, 0.0]), &params());
        assert_eq!(c.status, ResponseStatus::Marked);
        assert_eq!(c.marked, Some('B'));
        assert!(c.ambiguous);
    }

    #[test]
    fn disabled_salvage_leaves_blank() {
        let p = ClassifyParams {
            salvage_threshold: None,
            ..params()
        };
        let c = classify(&row(&[0.05, 0.19, 0.1, 0.0, 0.0]), &p);
        assert_eq!(c.status, ResponseStatus::Blank);
        assert_eq!(c.display().to_string(), "-");
        assert!(c.ambiguous);
    }

    #[test]
    fn faint_row_under_salvage_floor_is_blank() {
        let p = ClassifyParams {
            blank_guard: 0.0,
            ..params()
        };
        let c = classify(&row(&[0.04, 0.03]), &p);
        assert_eq!(c.status, ResponseStatus::Blank);
        assert_eq!(c.marked, None);
        assert_eq!(c.max_score, 0.04);
        assert!(!c.ambiguous);
    }

    #[test]
    fn empty_row_is_blank() {
        let c = classify(&[], &params());
        assert_eq!(c.status, ResponseStatus::Blank);
        assert_eq!(c.max_score, 0.0);
    }

    #[test]
    fn grading() {
        let marked = classify(&row(&[0.9, 0.1]), &params());
        assert_eq!(marked.grade(Some('A')), Some(Grade::Correct));
        assert_eq!(marked.grade(Some('B')), Some(Grade::Wrong));
        assert_eq!(marked.grade(None), None);

        let multi = classify(&row(&[0.9, 0.8]), &params());
        assert_eq!(multi.grade(Some('A')), Some(Grade::Correct));
        assert_eq!(multi.grade(Some('B')), Some(Grade::Wrong));

        let blank = classify(&row(&[0.0, 0.0]), &params());
        assert_eq!(blank.grade(Some('A')), None);
    }
}
