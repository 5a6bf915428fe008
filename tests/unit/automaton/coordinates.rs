//! Tests for the word to pixel bijection

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use wfa_codec::automaton::alphabet::{Symbol, Word};
    use wfa_codec::automaton::coordinates::Coordinates;

    // Tests single symbols land in their quadrant of a 2x2 grid
    // Verified by swapping row and column offsets
    #[test]
    fn test_single_symbol_positions() {
        assert_eq!(Coordinates::from_word(&Word::single(Symbol::Zero)), Coordinates::new(0, 1));
        assert_eq!(Coordinates::from_word(&Word::single(Symbol::One)), Coordinates::new(1, 1));
        assert_eq!(Coordinates::from_word(&Word::single(Symbol::Two)), Coordinates::new(0, 0));
        assert_eq!(Coordinates::from_word(&Word::single(Symbol::Three)), Coordinates::new(1, 0));
    }

    // Tests the first symbol picks the coarsest quadrant
    // Verified by weighting the last symbol most
    #[test]
    fn test_first_symbol_is_coarsest() {
        let word: Word = "10".parse().expect("valid word");
        assert_eq!(Coordinates::from_word(&word), Coordinates::new(2, 3));
    }

    // Tests every word maps to a distinct pixel and back
    // Verified by reversing the bit order in to_word
    #[test]
    fn test_round_trip_is_bijective() {
        for depth in 0..=4 {
            let side = 1_usize << depth;
            let mut seen = HashSet::new();

            for word in Word::all_of_length(depth) {
                let position = Coordinates::from(&word);
                assert!(position.x < side && position.y < side);
                assert!(seen.insert(position), "collision at depth {depth}");
                assert_eq!(position.to_word(depth).expect("inside grid"), word);
            }
            assert_eq!(seen.len(), side * side);
        }
    }

    // Tests concatenated halves agree with the whole word
    // Verified by shifting the suffix instead of the prefix
    #[test]
    fn test_concatenated_matches_concat() {
        for prefix in Word::all_of_length(2) {
            for suffix in Word::all_of_length(1) {
                let expected = Coordinates::from_word(&prefix.concat(&suffix));
                let combined = Coordinates::concatenated(
                    Coordinates::from_word(&prefix),
                    Coordinates::from_word(&suffix),
                    suffix.len(),
                );
                assert_eq!(combined, expected);
            }
        }
    }

    // Tests positions outside the grid are rejected
    // Verified by comparing against side + 1
    #[test]
    fn test_to_word_out_of_range() {
        assert!(Coordinates::new(4, 0).to_word(2).is_err());
        assert!(Coordinates::new(0, 4).to_word(2).is_err());
        assert!(Coordinates::new(3, 3).to_word(2).is_ok());
    }
}
