//! Clap-derived algorithms driven through the registry and a stack on disk.

use std::sync::Arc;

use clap::{Args, Command};
use rstest::rstest;
use starfish_core::{
    AlgorithmDescriptor, AlgorithmError, AlgorithmRegistry, ClapAlgorithm, ImageStack,
    NamedAlgorithm, RegistrationAlgorithm, RegistryError, StackShape,
};
use tempfile::TempDir;

#[derive(Args, Debug)]
struct Scale {
    /// Multiplier applied to every pixel.
    #[arg(long, default_value_t = 1.0)]
    factor: f32,
}

impl NamedAlgorithm for Scale {
    const NAME: &'static str = "scale";
    const ABOUT: &'static str = "Multiply every pixel by a constant.";
}

impl RegistrationAlgorithm for Scale {
    fn run(&self, stack: &mut ImageStack) -> Result<(), AlgorithmError> {
        let shape = stack.shape();
        for round in 0..shape.rounds {
            for channel in 0..shape.channels {
                let tile = stack
                    .tile_mut(round, channel)
                    .map_err(|err| AlgorithmError::failed(Self::NAME, err))?;
                tile.iter_mut().for_each(|value| *value *= self.factor);
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
struct Shadowing {
    /// Collides with the component's `-o/--output`.
    #[arg(short = 'o', long = "offset")]
    offset: Option<i32>,
}

impl NamedAlgorithm for Shadowing {
    const NAME: &'static str = "shadowing";
    const ABOUT: &'static str = "Declares a reserved short flag.";
}

impl RegistrationAlgorithm for Shadowing {
    fn run(&self, _stack: &mut ImageStack) -> Result<(), AlgorithmError> {
        Ok(())
    }
}

static SCALE: ClapAlgorithm<Scale> = ClapAlgorithm::new();
static SHADOWING: ClapAlgorithm<Shadowing> = ClapAlgorithm::new();

#[rstest]
fn registered_algorithm_transforms_a_persisted_stack() -> Result<(), Box<dyn std::error::Error>> {
    let registry =
        AlgorithmRegistry::from_descriptors([Arc::new(&SCALE) as Arc<dyn AlgorithmDescriptor>])?;
    let descriptor = registry.get("scale").expect("scale is registered");

    let dir = TempDir::new()?;
    ImageStack::from_tiles(StackShape::new(1, 2, 1, 2), vec![1.0, 2.0, 3.0, 4.0])?
        .write(dir.path())?;

    let matches = descriptor
        .declare_arguments(Command::new(descriptor.name()))
        .try_get_matches_from(["scale", "--factor", "2"])?;
    let algorithm = descriptor.from_parsed_arguments(&matches)?;

    let mut stack = ImageStack::read(dir.path())?;
    algorithm.run(&mut stack)?;
    stack.write(dir.path())?;

    assert_eq!(ImageStack::read(dir.path())?.values(), &[2.0, 4.0, 6.0, 8.0]);
    Ok(())
}

#[rstest]
fn reserved_short_flag_is_rejected_at_build_time() {
    let err = AlgorithmRegistry::from_descriptors([
        Arc::new(&SCALE) as Arc<dyn AlgorithmDescriptor>,
        Arc::new(&SHADOWING) as Arc<dyn AlgorithmDescriptor>,
    ])
    .expect_err("-o belongs to the component");
    assert_eq!(
        err,
        RegistryError::ReservedArgument {
            algorithm: "shadowing",
            argument: "o".to_owned(),
        }
    );
    assert_eq!(err.code().as_str(), "REGISTRY_RESERVED_ARGUMENT");
}
