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

use std::collections::HashSet;

use rand::Rng;

use crate::types::question::FlatQuestion;

/// The sections a quiz draws from, in allocation order. A bank without one
/// of these sections contributes nothing for it.
pub const GROUPS: [&str; 3] = ["section1", "section2", "section3"];

/// A uniformly random permutation of `0..n` (Fisher–Yates).
pub fn shuffle_indices<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        indices.swap(i, j);
    }
    indices
}

/// Split `desired` slots across the groups. The first `desired % 3` groups
/// get one extra slot.
pub fn allocate(desired: usize) -> [usize; GROUPS.len()] {
    let per_group = desired / GROUPS.len();
    let remainder = desired % GROUPS.len();
    let mut allocation = [per_group; GROUPS.len()];
    for slot in allocation.iter_mut().take(remainder) {
        *slot += 1;
    }
    allocation
}

/// Draw a stratified random quiz of at most `desired` questions.
///
/// A group smaller than its allocation contributes everything it has; the
/// shortfall is not made up from the other groups, so the quiz can come out
/// shorter than requested.
pub fn sample<R: Rng + ?Sized>(
    questions: &[FlatQuestion],
    desired: usize,
    rng: &mut R,
) -> Vec<FlatQuestion> {
    let allocation = allocate(desired);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut picked: Vec<&FlatQuestion> = Vec::with_capacity(desired.min(questions.len()));
    for (group, wanted) in GROUPS.iter().zip(allocation) {
        let members: Vec<&FlatQuestion> = questions
            .iter()
            .filter(|q| q.section_key == *group)
            .collect();
        let before = picked.len();
        for i in shuffle_indices(members.len(), rng) {
            if picked.len() - before == wanted {
                break;
            }
            let candidate = members[i];
            if seen.insert(candidate.id()) {
                picked.push(candidate);
            }
        }
        let taken = picked.len() - before;
        if taken < wanted {
            log::debug!("Group {group} has {taken} of {wanted} requested questions");
        }
    }
    shuffle_indices(picked.len(), rng)
        .into_iter()
        .map(|i| picked[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::error::Fallible;
    use crate::helper::SAMPLE_BANK;
    use crate::normalize::normalize;
    use crate::types::question::Question;
    use crate::types::question::QuestionBank;

    fn sample_questions() -> Fallible<Vec<FlatQuestion>> {
        let bank = QuestionBank::from_json(SAMPLE_BANK)?;
        Ok(normalize(Some(&bank)).questions)
    }

    fn count_in(quiz: &[FlatQuestion], group: &str) -> usize {
        quiz.iter().filter(|q| q.section_key == group).count()
    }

    #[test]
    fn test_shuffle_indices_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..20 {
            let mut indices = shuffle_indices(n, &mut rng);
            indices.sort();
            assert_eq!(indices, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_shuffle_indices_reaches_every_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        for _ in 0..600 {
            seen.insert(shuffle_indices(3, &mut rng));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_allocate() {
        assert_eq!(allocate(0), [0, 0, 0]);
        assert_eq!(allocate(1), [1, 0, 0]);
        assert_eq!(allocate(2), [1, 1, 0]);
        assert_eq!(allocate(10), [4, 3, 3]);
        assert_eq!(allocate(30), [10, 10, 10]);
    }

    #[test]
    fn test_no_duplicates_and_bounded_length() -> Fallible<()> {
        let questions = sample_questions()?;
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for desired in 1..=questions.len() {
                let quiz = sample(&questions, desired, &mut rng);
                assert!(quiz.len() <= desired);
                let ids: HashSet<&str> = quiz.iter().map(|q| q.id()).collect();
                assert_eq!(ids.len(), quiz.len());
            }
        }
        Ok(())
    }

    #[test]
    fn test_balanced_across_sections() -> Fallible<()> {
        let questions = sample_questions()?;
        let mut rng = StdRng::seed_from_u64(3);
        let quiz = sample(&questions, 6, &mut rng);
        assert_eq!(quiz.len(), 6);
        for group in GROUPS {
            assert_eq!(count_in(&quiz, group), 2);
        }
        Ok(())
    }

    #[test]
    fn test_shortfall_is_not_redistributed() -> Fallible<()> {
        let questions = sample_questions()?;
        let mut rng = StdRng::seed_from_u64(5);
        // Allocation is [4, 3, 3] but the groups hold 3, 2 and 2.
        let quiz = sample(&questions, 10, &mut rng);
        assert_eq!(quiz.len(), 7);
        assert_eq!(count_in(&quiz, "section1"), 3);
        assert_eq!(count_in(&quiz, "section2"), 2);
        assert_eq!(count_in(&quiz, "section3"), 2);
        Ok(())
    }

    #[test]
    fn test_huge_count_takes_everything() -> Fallible<()> {
        let questions = sample_questions()?;
        let mut rng = StdRng::seed_from_u64(1);
        let quiz = sample(&questions, usize::MAX, &mut rng);
        assert_eq!(quiz.len(), 7);
        Ok(())
    }

    #[test]
    fn test_other_sections_are_ignored() {
        let questions = vec![FlatQuestion {
            section_key: "appendix".to_string(),
            section_title: "Appendix".to_string(),
            subsection_key: "misc".to_string(),
            question: Question {
                id: "z".to_string(),
                ..Question::default()
            },
        }];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample(&questions, 3, &mut rng).is_empty());
    }

    #[test]
    fn test_keeps_section_tags() -> Fallible<()> {
        let questions = sample_questions()?;
        let mut rng = StdRng::seed_from_u64(9);
        for q in sample(&questions, 7, &mut rng) {
            assert!(!q.section_title.is_empty());
            assert!(!q.subsection_key.is_empty());
        }
        Ok(())
    }
}
