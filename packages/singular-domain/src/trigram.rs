//! Trigram similarity with `pg_trgm` semantics.
//!
//! Text is lower-cased and split into words on non-alphanumeric characters. Each word is padded
//! with two leading blanks and one trailing blank before its 3-character windows are collected.

use std::collections::BTreeSet;

pub fn trigrams(text: &str) -> BTreeSet<String> {
	let mut out = BTreeSet::new();

	for word in text.split(|c: char| !c.is_alphanumeric()).filter(|word| !word.is_empty()) {
		let padded: Vec<char> =
			"  ".chars().chain(word.chars().flat_map(char::to_lowercase)).chain([' ']).collect();

		for window in padded.windows(3) {
			out.insert(window.iter().collect());
		}
	}

	out
}

/// Shared trigrams over the union of both sets, `0.0` when neither side has any.
pub fn similarity(left: &str, right: &str) -> f32 {
	let left = trigrams(left);
	let right = trigrams(right);
	let shared = left.intersection(&right).count();
	let union = left.len() + right.len() - shared;

	if union == 0 {
		return 0.0;
	}

	shared as f32 / union as f32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pads_words_like_pg_trgm() {
		let grams: Vec<String> = trigrams("Cat").into_iter().collect();

		assert_eq!(grams, vec!["  c", " ca", "at ", "cat"]);
	}

	#[test]
	fn splits_on_punctuation_and_deduplicates() {
		let grams = trigrams("a-a");

		assert_eq!(grams.len(), 2);
		assert!(grams.contains("  a"));
		assert!(grams.contains(" a "));
	}

	#[test]
	fn prefix_query_scores_against_multi_word_title() {
		let score = similarity("proj", "Project Alpha");

		assert!((score - 4.0 / 15.0).abs() < 1e-6, "Unexpected score: {score}");
	}

	#[test]
	fn identical_text_scores_one_and_disjoint_scores_zero() {
		assert_eq!(similarity("Alpha", "alpha"), 1.0);
		assert_eq!(similarity("alpha", "zzz"), 0.0);
	}

	#[test]
	fn empty_inputs_score_zero() {
		assert_eq!(similarity("", ""), 0.0);
		assert_eq!(similarity("--", "alpha"), 0.0);
	}
}
