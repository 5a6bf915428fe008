//! Tests for quadrant symbols and words

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use wfa_codec::automaton::alphabet::{Symbol, Word};

    // Tests labels convert both ways and reject values above three
    // Verified by accepting label 4
    #[test]
    fn test_symbol_labels() {
        for symbol in Symbol::ALL {
            let label = symbol.index() as u8;
            assert_eq!(Symbol::try_from(label).expect("valid label"), symbol);
        }
        assert!(Symbol::try_from(4).is_err());
    }

    // Tests offsets are distinct and invert through from_offset
    // Verified by giving two symbols the same offset
    #[test]
    fn test_symbol_offsets() {
        let offsets: HashSet<_> = Symbol::ALL.iter().map(|s| s.offset()).collect();
        assert_eq!(offsets.len(), 4);

        for symbol in Symbol::ALL {
            let (row, col) = symbol.offset();
            assert_eq!(Symbol::from_offset(row == 1, col == 1), symbol);
        }
        assert_eq!(Symbol::Zero.offset(), (0, 1));
    }

    // Tests append, prepend and concatenation order
    // Verified by appending in prepended
    #[test]
    fn test_word_building() {
        let word = Word::single(Symbol::One).appended(Symbol::Two);
        assert_eq!(word.to_string(), "12");
        assert_eq!(word.prepended(Symbol::Three).to_string(), "312");

        let joined = word.concat(&Word::single(Symbol::Zero));
        assert_eq!(joined.symbols(), &[Symbol::One, Symbol::Two, Symbol::Zero]);
        assert_eq!(joined.len(), 3);
        assert!(Word::new().is_empty());
    }

    // Tests the textual form parses back and rejects other digits
    // Verified by parsing base ten digits
    #[test]
    fn test_word_from_str() {
        let word: Word = "0312".parse().expect("valid word");
        assert_eq!(word.to_string(), "0312");
        assert!("0142".parse::<Word>().is_err());
        assert!("".parse::<Word>().expect("empty word").is_empty());
    }

    // Tests enumeration yields every word of a length exactly once
    // Verified by stopping one level early
    #[test]
    fn test_all_of_length() {
        assert_eq!(Word::all_of_length(0), vec![Word::new()]);

        let words = Word::all_of_length(3);
        assert_eq!(words.len(), 64);
        assert!(words.iter().all(|w| w.len() == 3));

        let unique: HashSet<_> = words.iter().cloned().collect();
        assert_eq!(unique.len(), 64);
    }
}
