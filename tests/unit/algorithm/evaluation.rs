//! Tests for meet-in-the-middle evaluation against direct chain products

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use wfa_codec::algorithm::evaluation::{
        Half, combine, create_base_images, evaluate_word, expand, render, tree_nodes,
    };
    use wfa_codec::automaton::alphabet::Word;
    use wfa_codec::automaton::coordinates::Coordinates;
    use wfa_codec::automaton::base::{base_final_distribution, base_matrices};
    use wfa_codec::io::progress::ProgressCounter;
    use wfa_codec::math::linalg::{Matrix, Vector};

    struct RandomAutomaton {
        initial: Vector,
        matrices: [Matrix; 4],
        final_distribution: Vector,
    }

    fn random_automaton(states: usize, seed: u64) -> RandomAutomaton {
        let mut rng = StdRng::seed_from_u64(seed);
        let vector = |rng: &mut StdRng| {
            Vector::from((0..states).map(|_| rng.random_range(-1.0..1.0)).collect::<Vec<_>>())
        };
        let initial = vector(&mut rng);
        let final_distribution = vector(&mut rng);
        let matrices = std::array::from_fn(|_| {
            Matrix::from(Array2::from_shape_fn((states, states), |_| {
                rng.random_range(-0.5..0.5)
            }))
        });
        RandomAutomaton {
            initial,
            matrices,
            final_distribution,
        }
    }

    // Tests node counts of full quadtrees
    // Verified by counting the root as a node
    #[test]
    fn test_tree_nodes() {
        assert_eq!(tree_nodes(0), 0);
        assert_eq!(tree_nodes(1), 4);
        assert_eq!(tree_nodes(2), 20);
        assert_eq!(tree_nodes(3), 84);
    }

    // Tests every word of the requested length is produced once
    // Verified by emitting interior nodes too
    #[test]
    fn test_expand_enumerates_words() {
        let automaton = random_automaton(3, 1);
        let progress = ProgressCounter::silent(1000);

        let results = expand(
            &automaton.initial,
            &automaton.matrices,
            3,
            Half::First,
            &progress,
        )
        .expect("dimensions agree");

        assert_eq!(results.len(), 64);
        let addresses: HashSet<String> = results.iter().map(|r| r.address.to_string()).collect();
        assert_eq!(addresses.len(), 64);
        assert!(results.iter().all(|r| r.address.len() == 3));
        assert_eq!(progress.completed(), 64);
    }

    // Tests an empty expansion returns the seed itself
    // Verified by requiring at least one symbol
    #[test]
    fn test_expand_length_zero() {
        let automaton = random_automaton(2, 2);
        let results = expand(
            &automaton.final_distribution,
            &automaton.matrices,
            0,
            Half::Second,
            &ProgressCounter::silent(1),
        )
        .expect("dimensions agree");

        assert_eq!(results.len(), 1);
        assert!(results[0].address.is_empty());
        assert_eq!(results[0].value, automaton.final_distribution);
    }

    // Tests suffix vectors prepend symbols and multiply on the left
    // Verified by appending suffix symbols
    #[test]
    fn test_second_half_products() {
        let automaton = random_automaton(3, 3);
        let results = expand(
            &automaton.final_distribution,
            &automaton.matrices,
            2,
            Half::Second,
            &ProgressCounter::silent(1),
        )
        .expect("dimensions agree");

        for result in results {
            let direct = result
                .address
                .symbols()
                .iter()
                .rev()
                .try_fold(automaton.final_distribution.clone(), |column, symbol| {
                    automaton.matrices[symbol.index()].multiply_vector(&column)
                })
                .expect("dimensions agree");
            let error = direct.square_error(&result.value).expect("same length");
            assert!(error < 1e-20, "{} differs by {error}", result.address);
        }
    }

    // Tests every split point renders the same image as direct evaluation
    // Verified by swapping prefix and suffix coordinates
    #[test]
    fn test_render_matches_direct_evaluation() {
        let automaton = random_automaton(4, 4);
        let power = 3;

        for suffix_len in 0..=power {
            let grid = render(
                &automaton.initial,
                &automaton.matrices,
                &automaton.final_distribution,
                power,
                suffix_len,
                &ProgressCounter::silent(1),
            )
            .expect("dimensions agree");
            assert_eq!(grid.dim(), (8, 8));

            for ((row, col), value) in grid.indexed_iter() {
                let word = Coordinates::new(row, col)
                    .to_word(power)
                    .expect("inside the grid");
                let expected = evaluate_word(
                    &automaton.initial,
                    &automaton.matrices,
                    &word,
                    &automaton.final_distribution,
                )
                .expect("dimensions agree");
                assert!(
                    (value - expected).abs() < 1e-12,
                    "split {suffix_len}, pixel ({row}, {col}): {value} vs {expected}"
                );
            }
        }
    }

    // Tests combine rejects words addressing pixels outside the grid
    // Verified by silently dropping out-of-range pixels
    #[test]
    fn test_combine_out_of_range() {
        let automaton = random_automaton(2, 5);
        let progress = ProgressCounter::silent(1);
        let first = expand(&automaton.initial, &automaton.matrices, 1, Half::First, &progress)
            .expect("dimensions agree");
        let second = expand(
            &automaton.final_distribution,
            &automaton.matrices,
            1,
            Half::Second,
            &progress,
        )
        .expect("dimensions agree");

        assert!(combine(&first, &second, 4, &progress).is_ok());
        assert!(combine(&first, &second, 2, &progress).is_err());
    }

    // Tests the empty word evaluates to initial times final
    // Verified by applying a matrix for the empty word
    #[test]
    fn test_evaluate_empty_word() {
        let automaton = random_automaton(3, 6);
        let value = evaluate_word(
            &automaton.initial,
            &automaton.matrices,
            &Word::new(),
            &automaton.final_distribution,
        )
        .expect("dimensions agree");
        let expected = automaton
            .initial
            .dot(&automaton.final_distribution)
            .expect("same length");
        assert!((value - expected).abs() < 1e-15);
    }

    // Tests basis images have the requested size and the constant image
    // Verified by rendering with the wrong final distribution
    #[test]
    fn test_create_base_images() {
        let images = create_base_images(2).expect("basis renders");

        assert_eq!(images.len(), 6);
        assert!(images.iter().all(|image| image.size() == 4));
        assert!(images[0].values().iter().all(|v| (v - 1.0).abs() < 1e-12));

        let single = create_base_images(0).expect("basis renders");
        for (image, weight) in single.iter().zip(base_final_distribution().to_vec()) {
            assert_eq!(image.size(), 1);
            assert!((image.average() - weight).abs() < 1e-12);
        }
        assert_eq!(base_matrices().len(), 4);
    }
}
