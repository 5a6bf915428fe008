//! Tests for transition construction and display

#[cfg(test)]
mod tests {
    use wfa_codec::automaton::alphabet::Symbol;
    use wfa_codec::automaton::transition::Transition;

    // Tests fields and the textual form
    // Verified by printing the label before the target
    #[test]
    fn test_transition_display() {
        let transition = Transition::new(6, 7, Symbol::Two, 0.5);

        assert_eq!(transition.from, 6);
        assert_eq!(transition.to, 7);
        assert_eq!(transition.label, Symbol::Two);
        assert_eq!(transition.to_string(), "6, 7, 2, 0.5");
    }
}
