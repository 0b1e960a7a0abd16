// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Write;

use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;

use crate::db::Database;
use crate::error::Fallible;
use crate::types::attempt::QuizAttempt;

/// QR image services, tried in order. The payload is appended to each.
pub const QR_PROVIDERS: [&str; 3] = [
    "https://api.qrserver.com/v1/create-qr-code/?size=220x220&data=",
    "https://quickchart.io/qr?size=220&text=",
    "https://chart.googleapis.com/chart?cht=qr&chs=220x220&chl=",
];

const APP_NAME: &str = "Tajweed Quiz";

#[derive(Clone, Debug, PartialEq)]
pub struct SectionScore {
    pub key: String,
    pub title: String,
    pub correct: usize,
    pub total: usize,
}

/// A one-word verdict for a percentage score.
pub fn grade_label(score: u8) -> &'static str {
    match score {
        90..=u8::MAX => "Excellent",
        75..=89 => "Very good",
        50..=74 => "Good",
        _ => "Needs practice",
    }
}

/// The text encoded in the report's QR code.
pub fn qr_payload(attempt: &QuizAttempt, trainee: Option<&str>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{APP_NAME}");
    if let Some(name) = trainee {
        let _ = writeln!(text, "Name: {name}");
    }
    let _ = writeln!(text, "Date: {}", attempt.date.local_display());
    let _ = writeln!(
        text,
        "Score: {}% ({}/{})",
        attempt.score, attempt.correct_count, attempt.questions_count
    );
    let _ = write!(text, "Attempt: {}", attempt.id);
    text
}

/// The QR payload for an attempt, computed once and then read back from the
/// store so that the code stays stable if the trainee renames themselves.
pub fn cached_qr_payload(
    db: &Database,
    attempt: &QuizAttempt,
    trainee: Option<&str>,
) -> Fallible<String> {
    let key = format!("tajweed_qr_{}", attempt.id);
    if let Some(payload) = db.get(&key)? {
        return Ok(payload);
    }
    let payload = qr_payload(attempt, trainee);
    if !db.put_if_revision(&key, &payload, 0)? {
        // Another request stored one first.
        if let Some(stored) = db.get(&key)? {
            return Ok(stored);
        }
    }
    Ok(payload)
}

/// Image URLs for the payload, one per provider, in fallback order.
pub fn qr_image_urls(payload: &str) -> Vec<String> {
    let encoded = utf8_percent_encode(payload, NON_ALPHANUMERIC).to_string();
    QR_PROVIDERS
        .iter()
        .map(|base| format!("{base}{encoded}"))
        .collect()
}

/// Correct and total counts per section, in the order sections first
/// appear in the quiz.
pub fn section_breakdown(attempt: &QuizAttempt) -> Vec<SectionScore> {
    let mut scores: Vec<SectionScore> = Vec::new();
    for (i, question) in attempt.questions.iter().enumerate() {
        let correct = question.is_correct(attempt.answers.get(i).copied().flatten());
        let entry = match scores.iter().position(|s| s.key == question.section_key) {
            Some(position) => &mut scores[position],
            None => {
                scores.push(SectionScore {
                    key: question.section_key.clone(),
                    title: question.section_title.clone(),
                    correct: 0,
                    total: 0,
                });
                let last = scores.len() - 1;
                &mut scores[last]
            }
        };
        entry.total += 1;
        if correct {
            entry.correct += 1;
        }
    }
    scores
}

/// A plain-text rendition of the report, for download.
pub fn text_report(attempt: &QuizAttempt, trainee: Option<&str>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{APP_NAME} report");
    let _ = writeln!(text, "==================");
    if let Some(name) = trainee {
        let _ = writeln!(text, "Trainee: {name}");
    }
    let _ = writeln!(text, "Date: {}", attempt.date.local_display());
    let _ = writeln!(
        text,
        "Score: {}% ({}/{}), {}",
        attempt.score,
        attempt.correct_count,
        attempt.questions_count,
        grade_label(attempt.score)
    );
    let _ = writeln!(text);
    for section in section_breakdown(attempt) {
        let _ = writeln!(
            text,
            "{}: {}/{}",
            section.title, section.correct, section.total
        );
    }
    for (i, flat) in attempt.questions.iter().enumerate() {
        let question = &flat.question;
        let chosen = attempt.answers.get(i).copied().flatten();
        let mark = if flat.is_correct(chosen) { "✓" } else { "✗" };
        let _ = writeln!(text);
        let _ = writeln!(text, "{}. {} {}", i + 1, mark, question.question);
        let chosen_text = chosen
            .and_then(|c| question.option(c))
            .unwrap_or("(no answer)");
        let _ = writeln!(text, "   Your answer: {chosen_text}");
        let _ = writeln!(
            text,
            "   Correct answer: {}",
            question.correct_option().unwrap_or("?")
        );
        if !question.explain.is_empty() {
            let _ = writeln!(text, "   {}", question.explain);
        }
    }
    text
}
