//! Tests for state images, quadrant extraction and the reproduction pyramid

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use std::collections::HashMap;
    use wfa_codec::automaton::alphabet::{Symbol, Word};
    use wfa_codec::automaton::coordinates::Coordinates;
    use wfa_codec::automaton::state::{State, StateImage};

    fn numbered(size: usize) -> StateImage {
        StateImage::new(Array2::from_shape_fn((size, size), |(r, c)| (r * size + c) as f64))
            .expect("square grid")
    }

    // Tests non-square grids are rejected
    // Verified by removing the squareness check
    #[test]
    fn test_image_must_be_square() {
        assert!(StateImage::new(Array2::zeros((2, 3))).is_err());
    }

    // Tests quadrants follow the symbol offsets
    // Verified by swapping the Zero and Two offsets
    #[test]
    fn test_quadrant_offsets() {
        let image = numbered(4);

        let zero = image.quadrant(Symbol::Zero).expect("even size");
        assert_eq!(zero.values(), &array![[2.0, 3.0], [6.0, 7.0]]);

        let three = image.quadrant(Symbol::Three).expect("even size");
        assert_eq!(three.values(), &array![[8.0, 9.0], [12.0, 13.0]]);
    }

    // Tests single pixels cannot be split
    // Verified by allowing size one
    #[test]
    fn test_quadrant_of_pixel_fails() {
        assert!(numbered(1).quadrant(Symbol::One).is_err());
    }

    // Tests flattening is row-major
    // Verified by flattening column-major
    #[test]
    fn test_to_vector_row_major() {
        assert_eq!(numbered(2).to_vector().to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    // Tests splitting down to pixels lands every pixel at its word's position
    // Verified by swapping the Zero and One offsets in quadrant extraction only
    #[test]
    fn test_quadrants_agree_with_coordinates() {
        fn split(image: &StateImage, word: &Word, found: &mut HashMap<Coordinates, f64>) {
            if image.size() == 1 {
                let previous = found.insert(
                    Coordinates::from_word(word),
                    image.get(0, 0).expect("single pixel"),
                );
                assert!(previous.is_none(), "word {word} collides");
                return;
            }
            for symbol in Symbol::ALL {
                let quadrant = image.quadrant(symbol).expect("even size");
                split(&quadrant, &word.appended(symbol), found);
            }
        }

        let image = numbered(8);
        let mut found = HashMap::new();
        split(&image, &Word::new(), &mut found);

        assert_eq!(found.len(), 64);
        for (position, value) in found {
            assert_eq!(image.get(position.x, position.y), Some(value));
        }
    }

    // Tests the mean of a patch
    // Verified by summing instead of averaging
    #[test]
    fn test_average() {
        assert!((numbered(4).average() - 7.5).abs() < 1e-12);
    }

    // Tests a committed pyramid answers every level and defines the average
    // Verified by averaging the patch even when a pyramid exists
    #[test]
    fn test_commit_pyramid() {
        let mut state = State::new(7, numbered(2));
        assert!(!state.is_processed());
        assert!(state.image_with_size(2).is_err());
        assert!((state.average_intensity() - 1.5).abs() < 1e-12);

        let pixel = StateImage::new(array![[0.25]]).expect("square grid");
        let square = StateImage::new(array![[0.0, 0.5], [0.25, 0.25]]).expect("square grid");
        state
            .commit(vec![pixel.clone(), square.clone()])
            .expect("levels double from one");

        assert!(state.is_processed());
        assert_eq!(state.pyramid_sizes(), vec![1, 2]);
        assert_eq!(state.image_with_size(2).expect("committed"), &square);
        assert_eq!(state.image_with_size(1).expect("committed"), &pixel);
        assert!(state.image_with_size(4).is_err());
        assert!((state.average_intensity() - 0.25).abs() < 1e-12);
        assert_eq!(state.image(), &numbered(2));
        assert_eq!(state.highest_resolution(), 2);
        assert_eq!(state.id(), 7);
    }

    // Tests pyramids with missing or misordered levels are rejected
    // Verified by checking only the pyramid length
    #[test]
    fn test_commit_rejects_bad_pyramids() {
        let pixel = StateImage::new(array![[0.25]]).expect("square grid");
        let square = StateImage::new(Array2::zeros((2, 2))).expect("square grid");

        let mut state = State::new(7, numbered(2));
        assert!(state.commit(vec![pixel.clone()]).is_err());
        assert!(state.commit(vec![square.clone(), pixel.clone()]).is_err());
        assert!(!state.is_processed());

        let mut odd = State::new(8, numbered(3));
        assert!(odd.commit(vec![pixel, square]).is_err());
    }
}
