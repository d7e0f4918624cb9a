//! Extraction of question records from generator-produced quiz text.
//!
//! Each question is written as
//! `((<ordinal>. <question>*<label>) <text>*<label>) <text>...))/box(<ordinal><LETTER>)`.
//! Spans are read left to right; anything between them is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::{AnswerKey, AnswerKeyIssue, OptionRecord, QuestionRecord};

const OPTION_SEPARATOR: char = '*';
const LABEL_SEPARATOR: &str = ") ";

static QUESTION_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\((.*?)\)\)\s*/box\(([0-9]+[A-Za-z])\)").expect("question span pattern is valid")
});

/// Parses every well-formed question span in `raw`, in order of appearance.
///
/// Malformed spans are skipped. An empty result means nothing usable was found;
/// callers decide whether that is a failure.
#[must_use]
pub fn parse_quiz(raw: &str) -> Vec<QuestionRecord> {
    QUESTION_SPAN
        .captures_iter(raw)
        .enumerate()
        .filter_map(|(span_index, captures)| {
            let body = captures.get(1)?.as_str();
            let marker = captures.get(2)?.as_str();
            let record = parse_span(body, marker);
            if record.is_none() {
                debug!(span_index, "skipping quiz span without prompt or options");
            }
            record
        })
        .collect()
}

/// Answer-key defects across a parsed sequence, as `(index, issue)` pairs.
///
/// Positions are the 1-based order of the records, not the ordinals the
/// generator wrote.
#[must_use]
pub fn answer_key_issues(questions: &[QuestionRecord]) -> Vec<(usize, AnswerKeyIssue)> {
    questions
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            question
                .answer_key_issue(index + 1)
                .map(|issue| (index, issue))
        })
        .collect()
}

fn parse_span(body: &str, marker: &str) -> Option<QuestionRecord> {
    let mut segments = body.split(OPTION_SEPARATOR);
    let prompt = question_text(segments.next()?);
    if prompt.is_empty() {
        return None;
    }

    let options: Vec<OptionRecord> = segments.filter_map(parse_option).collect();
    if options.is_empty() {
        return None;
    }

    Some(QuestionRecord::new(
        prompt,
        options,
        AnswerKey::from_marker(marker),
    ))
}

/// Drops a leading ordinal such as `1.` from the preamble.
fn question_text(preamble: &str) -> String {
    let text = match preamble.split_once('.') {
        Some((_, rest)) => rest,
        None => preamble,
    };
    text.trim().to_string()
}

fn parse_option(line: &str) -> Option<OptionRecord> {
    if !line.contains(')') {
        return None;
    }
    // Text after the first `) ` is kept whole, including later `) ` pairs.
    let (label, text) = line
        .split_once(LABEL_SEPARATOR)
        .or_else(|| line.split_once(')'))?;
    Some(OptionRecord::new(label.trim(), text.trim()))
}
