//! Answer keys and their derivation from a reference sheet.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use omr_core::PixelImageView;
use serde::{Deserialize, Serialize};

use crate::reader::{FormResult, SheetError, SheetReader};

/// Correct option per question number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub answers: BTreeMap<u32, char>,
}

impl AnswerKey {
    pub fn get(&self, question: u32) -> Option<char> {
        self.answers.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Key from an evaluated sheet; multiple marks contribute their
    /// strongest option.
    pub fn from_result(result: &FormResult) -> Self {
        Self {
            answers: result.answers.clone(),
        }
    }
}

impl FromIterator<(u32, char)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (u32, char)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (q, c)) in self.answers.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{q}:{c}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid answer entry {entry:?}, expected <question>:<option>")]
pub struct KeyParseError {
    pub entry: String,
}

/// Parses `1:A,2:C` (whitespace around entries is ignored).
impl FromStr for AnswerKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|entry| {
                let bad = || KeyParseError {
                    entry: entry.to_string(),
                };
                let (q, opt) = entry.split_once(':').ok_or_else(bad)?;
                let q: u32 = q.trim().parse().map_err(|_| bad())?;
                let mut chars = opt.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => Ok((q, c.to_ascii_uppercase())),
                    _ => Err(bad()),
                }
            })
            .collect()
    }
}

/// The reference sheet cannot provide a key; fatal for a whole batch.
#[derive(thiserror::Error, Debug)]
pub enum BaseReferenceError {
    #[error("reference sheet is unusable: {0}")]
    Unusable(#[source] SheetError),
    #[error("reference sheet has blank questions: {blank:?}")]
    Incomplete { blank: Vec<u32> },
}

/// Run the reader once over the reference image and take its marks as the
/// key. Every question must be answered.
pub fn derive_answer_key(
    reader: &SheetReader,
    reference: &PixelImageView<'_>,
) -> Result<AnswerKey, BaseReferenceError> {
    let result = reader
        .evaluate(reference, None)
        .map_err(BaseReferenceError::Unusable)?;

    let blank: Vec<u32> = result
        .questions
        .iter()
        .filter(|q| q.classification.marked.is_none())
        .map(|q| q.number)
        .collect();
    if !blank.is_empty() {
        return Err(BaseReferenceError::Incomplete { blank });
    }

    let key = AnswerKey::from_result(&result);
    log::info!("answer key derived for {} questions", key.len());
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entry_list() {
        let key: AnswerKey = "1:A, 2:c ,10:E,".parse().expect("parse");
        assert_eq!(key.get(1), Some('A'));
        assert_eq!(key.get(2), Some('C'));
        assert_eq!(key.get(10), Some('E'));
        assert_eq!(key.get(3), None);
        assert_eq!(key.to_string(), "1:A,2:C,10:E");
    }

    #[test]
    fn rejects_malformed_entries() {
        for bad in ["1A", "x:A", "1:AB", "1:"] {
            let err = bad.parse::<AnswerKey>().unwrap_err();
            assert_eq!(err.entry, bad);
        }
    }

    #[test]
    fn json_shape() {
        let key: AnswerKey = [(1, 'B'), (2, 'D')].into_iter().collect();
        let json = serde_json::to_string(&key).expect("json");
        assert_eq!(json, r#"{"answers":{"1":"B","2":"D"}}"#);
        let back: AnswerKey = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, key);
    }
}
