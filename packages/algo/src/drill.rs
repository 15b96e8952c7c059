//! Drill Planning
//!
//! Pure selection logic behind drill generation: ranking question types by
//! recent error frequency and deriving the difficulty window drill items are
//! drawn from. Querying events and items is the caller's job.

use std::collections::HashMap;

use crate::types::DifficultyBand;

/// Most question types targeted by one drill
pub const MAX_TARGET_TYPES: usize = 5;

/// Default number of items per drill
pub const DEFAULT_ITEM_COUNT: usize = 10;

/// Difficulty range stored on a drill when the request left it unset
pub const DEFAULT_DIFFICULTY_RANGE: [DifficultyBand; 3] = [
    DifficultyBand::D2,
    DifficultyBand::D3,
    DifficultyBand::D4,
];

/// Band number assumed for a user with no skill states yet
pub const DEFAULT_AVERAGE_BAND_NUMBER: f64 = 2.0;

/// Rank question types by error frequency, most frequent first.
///
/// `occurrences` holds one question type id per recent error event. Ties
/// break lexicographically by id so the ranking is deterministic regardless
/// of event order. At most [`MAX_TARGET_TYPES`] ids are returned.
pub fn rank_error_types(occurrences: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for type_id in occurrences {
        *counts.entry(type_id.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(MAX_TARGET_TYPES);
    ranked.into_iter().map(|(id, _)| id.to_string()).collect()
}

/// Average the one-based band numbers of the user's current skill bands.
/// No states yields [`DEFAULT_AVERAGE_BAND_NUMBER`].
pub fn average_band_number(bands: &[DifficultyBand]) -> f64 {
    if bands.is_empty() {
        return DEFAULT_AVERAGE_BAND_NUMBER;
    }
    bands.iter().map(|b| f64::from(b.band_number())).sum::<f64>() / bands.len() as f64
}

/// Difficulty window for drill selection.
///
/// The rounded one-based average is used directly as a zero-based window
/// center, so the window sits one band above the average: an average of 2
/// (a D2 user) yields [D2, D3, D4], matching the stored default range. The
/// window is clamped to the band table at both ends.
pub fn band_window(average_band_number: f64) -> Vec<DifficultyBand> {
    let last = DifficultyBand::ALL.len() as i64 - 1;
    let base = average_band_number.round() as i64;
    let start = (base - 1).clamp(0, last) as usize;
    let end = (base + 1).clamp(0, last) as usize;
    DifficultyBand::ALL[start..=end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ranking_orders_by_frequency() {
        let occurrences = ids(&[
            "RW_EOI",
            "RW_IA_INF",
            "RW_EOI",
            "RW_CS_PURPOSE",
            "RW_EOI",
            "RW_IA_INF",
        ]);
        assert_eq!(
            rank_error_types(&occurrences),
            ids(&["RW_EOI", "RW_IA_INF", "RW_CS_PURPOSE"])
        );
    }

    #[test]
    fn test_ranking_breaks_ties_by_id() {
        let occurrences = ids(&["RW_IA_INF", "RW_EOI", "RW_CS_PURPOSE", "RW_EOI", "RW_IA_INF"]);
        assert_eq!(
            rank_error_types(&occurrences),
            ids(&["RW_EOI", "RW_IA_INF", "RW_CS_PURPOSE"])
        );
    }

    #[test]
    fn test_ranking_is_insensitive_to_event_order() {
        let forward = ids(&["A", "B", "B", "C", "C", "C"]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(rank_error_types(&forward), rank_error_types(&backward));
    }

    #[test]
    fn test_ranking_caps_at_five_types() {
        let occurrences = ids(&["T1", "T2", "T3", "T4", "T5", "T6", "T7"]);
        let ranked = rank_error_types(&occurrences);
        assert_eq!(ranked.len(), MAX_TARGET_TYPES);
        assert_eq!(ranked, ids(&["T1", "T2", "T3", "T4", "T5"]));
    }

    #[test]
    fn test_ranking_of_empty_input() {
        assert!(rank_error_types(&[]).is_empty());
    }

    #[test]
    fn test_average_band_defaults_without_states() {
        assert_eq!(average_band_number(&[]), DEFAULT_AVERAGE_BAND_NUMBER);
        let bands = [DifficultyBand::D2, DifficultyBand::D4];
        assert_eq!(average_band_number(&bands), 3.0);
    }

    #[test]
    fn test_default_window_matches_stored_default_range() {
        let window = band_window(DEFAULT_AVERAGE_BAND_NUMBER);
        assert_eq!(window, DEFAULT_DIFFICULTY_RANGE.to_vec());
    }

    #[test]
    fn test_window_sits_one_band_above_the_average() {
        assert_eq!(
            band_window(3.0),
            vec![DifficultyBand::D3, DifficultyBand::D4, DifficultyBand::D5]
        );
    }

    #[test]
    fn test_window_clamps_at_the_table_ends() {
        assert_eq!(
            band_window(1.0),
            vec![DifficultyBand::D1, DifficultyBand::D2, DifficultyBand::D3]
        );
        assert_eq!(band_window(4.0), vec![DifficultyBand::D4, DifficultyBand::D5]);
        assert_eq!(band_window(5.0), vec![DifficultyBand::D5]);
    }

    #[test]
    fn test_window_rounds_the_average() {
        assert_eq!(band_window(4.4), vec![DifficultyBand::D4, DifficultyBand::D5]);
        assert_eq!(band_window(4.5), vec![DifficultyBand::D5]);
    }
}
