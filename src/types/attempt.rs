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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Visitor;

use crate::types::question::FlatQuestion;
use crate::types::timestamp::Timestamp;

/// A time-based attempt identifier: milliseconds since the epoch.
///
/// Older histories stored the identifier as a string, so deserialization
/// accepts both JSON numbers and numeric strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AttemptId(i64);

impl AttemptId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Loose equality against a client-supplied identifier: compares as
    /// strings first, then as numbers.
    pub fn matches(self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if self.0.to_string() == candidate {
            return true;
        }
        match candidate.parse::<f64>() {
            Ok(number) => number == self.0 as f64,
            Err(_) => false,
        }
    }
}

impl Display for AttemptId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AttemptId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

struct AttemptIdVisitor;

impl Visitor<'_> for AttemptIdVisitor {
    type Value = AttemptId;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "an attempt id as a number or a numeric string")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<AttemptId, E> {
        Ok(AttemptId(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<AttemptId, E> {
        i64::try_from(v)
            .map(AttemptId)
            .map_err(|_| E::custom("attempt id out of range"))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<AttemptId, E> {
        if v.fract() == 0.0 {
            Ok(AttemptId(v as i64))
        } else {
            Err(E::custom("attempt id is not an integer"))
        }
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<AttemptId, E> {
        v.trim()
            .parse::<i64>()
            .map(AttemptId)
            .map_err(|_| E::custom(format!("invalid attempt id `{v}`")))
    }
}

impl<'de> Deserialize<'de> for AttemptId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AttemptIdVisitor)
    }
}

/// One completed quiz run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub date: Timestamp,
    pub questions_count: usize,
    pub correct_count: usize,
    /// Percentage, 0 to 100.
    pub score: u8,
    pub questions: Vec<FlatQuestion>,
    /// Selected option per question, aligned with `questions`.
    pub answers: Vec<Option<u8>>,
}
