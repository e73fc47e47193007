//! Behavioural tests for the `fourier_shift` algorithm through its descriptor.

use clap::Command;
use rstest::{fixture, rstest};
use starfish_core::{AlgorithmDescriptor, AlgorithmError, ImageStack, StackShape};
use starfish_registration_fourier::{DESCRIPTOR, FourierShiftError, FourierShiftRegistration};
use starfish_test_support::images::{brightest_pixel, gaussian_spots, roll};
use tempfile::TempDir;

const SIZE: usize = 24;

/// Round offsets relative to round zero.
const OFFSETS: [(isize, isize); 3] = [(0, 0), (2, -3), (-4, 1)];

fn spot_images() -> (Vec<f32>, Vec<f32>) {
    let primary = gaussian_spots(SIZE, SIZE, &[(6.0, 7.0)], 1.2);
    let secondary = gaussian_spots(SIZE, SIZE, &[(15.0, 17.0)], 1.2);
    let bright = primary.iter().zip(&secondary).map(|(p, s)| p + 0.6 * s).collect();
    let dim = primary.iter().zip(&secondary).map(|(p, s)| 0.5 * p + 0.2 * s).collect();
    (bright, dim)
}

#[fixture]
fn misaligned_stack() -> ImageStack {
    let (reference, dim) = spot_images();
    let mut values = Vec::new();
    for (dy, dx) in OFFSETS {
        values.extend(roll(&reference, SIZE, SIZE, dy, dx));
        values.extend(roll(&dim, SIZE, SIZE, dy, dx));
    }
    ImageStack::from_tiles(StackShape::new(OFFSETS.len(), 2, SIZE, SIZE), values)
        .expect("valid stack")
}

fn parse(args: &[&str]) -> clap::error::Result<clap::ArgMatches> {
    let command = DESCRIPTOR.declare_arguments(Command::new(DESCRIPTOR.name()));
    command.try_get_matches_from(std::iter::once(DESCRIPTOR.name()).chain(args.iter().copied()))
}

#[rstest]
fn descriptor_exposes_the_algorithm_name() {
    assert_eq!(DESCRIPTOR.name(), "fourier_shift");
    assert!(!DESCRIPTOR.about().is_empty());
}

#[rstest]
fn defaults_need_no_flags() {
    let matches = parse(&[]).expect("no flags are required");
    let algorithm = DESCRIPTOR
        .from_parsed_arguments(&matches)
        .expect("defaults construct");
    assert_eq!(
        format!("{algorithm:?}"),
        format!(
            "{:?}",
            FourierShiftRegistration {
                upsampling: 1,
                reference_stack: None
            }
        )
    );
}

#[rstest]
#[case::zero_upsampling(&["--upsampling", "0"])]
#[case::missing_reference(&["--reference-stack", "/no/such/reference"])]
fn invalid_flags_fail_while_parsing(#[case] args: &[&str]) {
    assert!(parse(args).is_err());
}

#[rstest]
fn rounds_are_aligned_to_round_zero(mut misaligned_stack: ImageStack) {
    let matches = parse(&[]).expect("parses");
    let algorithm = DESCRIPTOR.from_parsed_arguments(&matches).expect("constructs");
    algorithm.run(&mut misaligned_stack).expect("registration succeeds");

    let anchor = brightest_pixel(misaligned_stack.tile(0, 0).expect("tile"), SIZE);
    for round in 1..OFFSETS.len() {
        for channel in 0..2 {
            let tile = misaligned_stack.tile(round, channel).expect("tile");
            assert_eq!(brightest_pixel(tile, SIZE), anchor, "round {round} channel {channel}");
        }
    }
}

#[rstest]
fn register_reports_the_correction_per_round(mut misaligned_stack: ImageStack) {
    let algorithm = FourierShiftRegistration {
        upsampling: 1,
        reference_stack: None,
    };
    let shifts = algorithm.register(&mut misaligned_stack).expect("registers");
    let corrections: Vec<(f64, f64)> = shifts.iter().map(|s| (s.dy, s.dx)).collect();
    assert_eq!(corrections, [(0.0, 0.0), (-2.0, 3.0), (4.0, -1.0)]);
}

#[rstest]
fn external_reference_stack_is_used(mut misaligned_stack: ImageStack) {
    let dir = TempDir::new().expect("temp dir");
    let (reference, _) = spot_images();
    let shifted = roll(&reference, SIZE, SIZE, 1, 1);
    ImageStack::from_tiles(StackShape::new(1, 1, SIZE, SIZE), shifted)
        .expect("valid reference")
        .write(dir.path())
        .expect("write reference");

    let algorithm = FourierShiftRegistration {
        upsampling: 1,
        reference_stack: Some(dir.path().to_path_buf()),
    };
    let shifts = algorithm.register(&mut misaligned_stack).expect("registers");
    assert_eq!((shifts[0].dy, shifts[0].dx), (1.0, 1.0));
}

#[rstest]
fn mismatched_reference_geometry_is_an_algorithm_error(mut misaligned_stack: ImageStack) {
    let dir = TempDir::new().expect("temp dir");
    ImageStack::zeros(StackShape::new(1, 1, SIZE / 2, SIZE))
        .expect("valid reference")
        .write(dir.path())
        .expect("write reference");
    let algorithm = FourierShiftRegistration {
        upsampling: 1,
        reference_stack: Some(dir.path().to_path_buf()),
    };

    let err = algorithm
        .register(&mut misaligned_stack.clone())
        .expect_err("geometry differs");
    assert!(matches!(err, FourierShiftError::GeometryMismatch { .. }));

    let err = starfish_core::RegistrationAlgorithm::run(&algorithm, &mut misaligned_stack)
        .expect_err("run wraps the failure");
    assert!(matches!(
        err,
        AlgorithmError::Failed {
            algorithm: "fourier_shift",
            ..
        }
    ));
}
