use std::collections::BTreeMap;

use omr_markers::Corners;
use serde::{Deserialize, Serialize};

use super::classify::{Classification, Grade, ResponseStatus};
use super::score::ChoiceScore;

/// Per-question outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub number: u32,
    pub classification: Classification,
    /// `None` for blanks and questions missing from the key.
    pub grade: Option<Grade>,
    pub scores: Vec<ChoiceScore>,
}

/// Why a result deserves a human look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuspicionReason {
    MultipleMarks { question: u32 },
    AmbiguousMark { question: u32, score: f32 },
    StudentNumberUnreadable,
}

/// Evaluation of one sheet image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormResult {
    pub correct: u32,
    pub wrong: u32,
    pub blank: u32,
    pub multi: u32,
    /// `correct - wrong * penalty`.
    pub net: f32,
    pub marker_ok: bool,
    pub corners: Option<Corners>,
    pub questions: Vec<QuestionResult>,
    /// Marked option per non-blank question.
    pub answers: BTreeMap<u32, char>,
    /// Digits with `?` for unreadable columns; `None` without a student block.
    pub student_no: Option<String>,
    pub reasons: Vec<SuspicionReason>,
}

impl FormResult {
    /// Tally counts and suspicion reasons from per-question results.
    pub(crate) fn from_questions(
        questions: Vec<QuestionResult>,
        corners: Corners,
        student_no: Option<String>,
        penalty: f32,
    ) -> Self {
        let mut out = FormResult {
            correct: 0,
            wrong: 0,
            blank: 0,
            multi: 0,
            net: 0.0,
            marker_ok: true,
            corners: Some(corners),
            questions: Vec::new(),
            answers: BTreeMap::new(),
            student_no,
            reasons: Vec::new(),
        };

        for q in &questions {
            let c = &q.classification;
            match c.status {
                ResponseStatus::Blank => out.blank += 1,
                ResponseStatus::Multiple => {
                    out.multi += 1;
                    out.reasons
                        .push(SuspicionReason::MultipleMarks { question: q.number });
                }
                ResponseStatus::Marked => {}
            }
            match q.grade {
                Some(Grade::Correct) => out.correct += 1,
                Some(Grade::Wrong) => out.wrong += 1,
                None => {}
            }
            if c.ambiguous {
                out.reasons.push(SuspicionReason::AmbiguousMark {
                    question: q.number,
                    score: c.max_score,
                });
            }
            if let Some(m) = c.marked {
                out.answers.insert(q.number, m);
            }
        }

        if out.student_no.as_deref().is_some_and(|s| !super::student_id::is_readable(s)) {
            out.reasons.push(SuspicionReason::StudentNumberUnreadable);
        }

        out.net = out.correct as f32 - out.wrong as f32 * penalty;
        out.questions = questions;
        out
    }

    pub fn suspicious(&self) -> bool {
        !self.marker_ok || !self.reasons.is_empty()
    }

    /// No student block counts as readable.
    pub fn student_no_ok(&self) -> bool {
        self.student_no
            .as_deref()
            .is_none_or(super::student_id::is_readable)
    }

    /// Display marks in question order, comma separated (`A,B*,-`).
    pub fn answer_string(&self) -> String {
        self.questions
            .iter()
            .map(|q| q.classification.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn question(&self, number: u32) -> Option<&QuestionResult> {
        self.questions.iter().find(|q| q.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn corners() -> Corners {
        let p = Point2::new(0.0, 0.0);
        Corners {
            top_left: p,
            top_right: p,
            bottom_left: p,
            bottom_right: p,
        }
    }

    fn q(number: u32, status: ResponseStatus, marked: Option<char>, grade: Option<Grade>) -> QuestionResult {
        QuestionResult {
            number,
            classification: Classification {
                status,
                marked,
                max_score: 0.5,
                ambiguous: false,
            },
            grade,
            scores: Vec::new(),
        }
    }

    #[test]
    fn counts_and_net() {
        let questions = vec![
            q(1, ResponseStatus::Marked, Some('A'), Some(Grade::Correct)),
            q(2, ResponseStatus::Marked, Some('C'), Some(Grade::Wrong)),
            q(3, ResponseStatus::Multiple, Some('B'), Some(Grade::Wrong)),
            q(4, ResponseStatus::Blank, None, None),
            q(5, ResponseStatus::Marked, Some('D'), None),
        ];
        let r = FormResult::from_questions(questions, corners(), Some("12".into()), 0.25);
        assert_eq!((r.correct, r.wrong, r.blank, r.multi), (1, 2, 1, 1));
        assert_eq!(r.net, 0.5);
        assert_eq!(r.answers.len(), 4);
        assert_eq!(r.answers.get(&3), Some(&'B'));
        assert_eq!(r.answer_string(), "A,C,B*,-,D");
        assert_eq!(r.reasons, vec![SuspicionReason::MultipleMarks { question: 3 }]);
        assert!(r.suspicious());
        assert!(r.student_no_ok());
    }

    #[test]
    fn salvaged_mark_is_graded_and_flagged() {
        use crate::reader::{classify, ClassifyParams};

        let scores: Vec<ChoiceScore> = [('A', 0.19), ('B', 0.02), ('C', 0.0)]
            .into_iter()
            .map(|(label, score)| ChoiceScore { label, score })
            .collect();
        let classification = classify(&scores, &ClassifyParams::default());
        let grade = classification.grade(Some('A'));
        let questions = vec![QuestionResult {
            number: 4,
            classification,
            grade,
            scores,
        }];

        let r = FormResult::from_questions(questions, corners(), None, 0.25);
        assert_eq!((r.correct, r.blank), (1, 0));
        assert_eq!(r.answers.get(&4), Some(&'A'));
        assert_eq!(
            r.reasons,
            vec![SuspicionReason::AmbiguousMark {
                question: 4,
                score: 0.19
            }]
        );
        assert!(r.suspicious());
    }

    #[test]
    fn unreadable_student_number_is_suspicious() {
        let questions = vec![q(1, ResponseStatus::Marked, Some('A'), None)];
        let r = FormResult::from_questions(questions, corners(), Some("1?".into()), 0.25);
        assert_eq!(r.reasons, vec![SuspicionReason::StudentNumberUnreadable]);
        assert!(!r.student_no_ok());

        let clean = FormResult::from_questions(Vec::new(), corners(), None, 0.25);
        assert!(!clean.suspicious());
        assert!(clean.student_no_ok());
    }
}
