//! Tests for decode planning and plane reconstruction

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use wfa_codec::algorithm::decoder::{DecodePlan, Decoder};
    use wfa_codec::algorithm::encoder::encode_image;
    use wfa_codec::automaton::wfa::{ColorRepresentation, Resolution, Wfa};
    use wfa_codec::io::configuration::EncoderConfig;
    use wfa_codec::io::image::concatenate_planes;
    use wfa_codec::io::progress::ProgressCounter;
    use wfa_codec::math::linalg::Vector;

    fn flat_wfa(resolution: Resolution, values: [f64; 3]) -> Wfa {
        let side = resolution.side();
        let planes = values.map(|value| Array2::from_elem((side, side), value));
        encode_image(
            concatenate_planes(&planes),
            resolution,
            EncoderConfig::default(),
            &(),
        )
        .expect("search succeeds")
    }

    // Tests depths are clamped and split into halves
    // Verified by rounding the suffix length down
    #[test]
    fn test_decode_plan() {
        let resolution = Resolution::new(8, 8);

        let full = DecodePlan::new(resolution, 0);
        assert_eq!((full.power, full.depth, full.suffix_len), (3, 3, 2));
        assert_eq!(full.prefix_len(), 1);
        assert_eq!(full.side(), 8);
        assert_eq!(full.shrink_ratio(), 1);
        assert_eq!(full.total_work(resolution), 3 * 4 + 16 + 3 * 64 + 64);

        let shallow = DecodePlan::new(resolution, 1);
        assert_eq!((shallow.depth, shallow.suffix_len), (1, 1));
        assert_eq!(shallow.prefix_len(), 2);
        assert_eq!(shallow.shrink_ratio(), 4);

        assert_eq!(DecodePlan::new(resolution, 9), full);
        assert_eq!(DecodePlan::new(resolution, 3), full);
    }

    // Tests a single-pixel raster decodes without splitting words
    // Verified by subtracting the suffix from a zero power
    #[test]
    fn test_decode_plan_single_pixel() {
        let plan = DecodePlan::new(Resolution::new(1, 1), 4);
        assert_eq!((plan.power, plan.depth, plan.suffix_len), (0, 0, 0));
        assert_eq!(plan.side(), 1);
        assert_eq!(plan.shrink_ratio(), 1);
    }

    // Tests flat planes are reproduced at every depth
    // Verified by taking the planes from the wrong quadrants
    #[test]
    fn test_flat_planes() {
        let resolution = Resolution::new(4, 4);
        let decoder = Decoder::new(flat_wfa(resolution, [0.2, 0.5, 0.9])).expect("root exists");

        for depth in [0, 1, 2] {
            let planes = decoder
                .reconstruct_planes(depth, &ProgressCounter::silent(1))
                .expect("consistent automaton");
            let side = decoder.plan(depth).side() / decoder.plan(depth).shrink_ratio();
            for (plane, expected) in planes.iter().zip([0.2, 0.5, 0.9]) {
                assert_eq!(plane.dim(), (side, side));
                assert!(
                    plane.iter().all(|v| (v - expected).abs() < 1e-9),
                    "depth {depth}: expected {expected}"
                );
            }
        }
    }

    // Tests the raster is cropped to the original size and shrinks with depth
    // Verified by skipping the crop
    #[test]
    fn test_to_image_resolution() {
        let resolution = Resolution::new(3, 2);
        let decoder = Decoder::new(flat_wfa(resolution, [1.0, 0.5, 0.0])).expect("root exists");

        let image = decoder.to_image(0, &()).expect("consistent automaton");
        assert_eq!(image.dimensions(), (3, 2));
        assert!(image.pixels().all(|p| p.0 == [255, 127, 0]));

        assert_eq!(decoder.output_resolution(1), Resolution::new(1, 1));
        let small = decoder.to_image(1, &()).expect("consistent automaton");
        assert_eq!(small.dimensions(), (1, 1));
    }

    // Tests loaded automata without a root state are rejected
    // Verified by defaulting the initial distribution to state zero
    #[test]
    fn test_decoder_requires_root() {
        let wfa = Wfa::from_parts(
            ColorRepresentation::Rgb,
            Resolution::new(2, 2),
            Vector::from(vec![1.0; 3]),
            Vec::new(),
        )
        .expect("no transitions to check");
        assert!(Decoder::new(wfa).is_err());
    }

    // Tests dense matrices are built once for all labels
    // Verified by building only the first label
    #[test]
    fn test_decoder_matrices() {
        let wfa = flat_wfa(Resolution::new(2, 2), [0.5, 0.5, 0.5]);
        let states = wfa.number_of_states();
        let decoder = Decoder::new(wfa).expect("root exists");

        assert_eq!(decoder.wfa().number_of_states(), states);
        assert!(decoder.matrices().iter().all(|m| m.shape() == (states, states)));
    }
}
