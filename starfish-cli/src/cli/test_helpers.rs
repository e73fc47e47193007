//! Stores and fixtures shared across CLI tests.
//!
//! The stores wrap the Parquet store so tests can count how often each step
//! touched the filesystem, or force the persist step to fail.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::ArgMatches;
use starfish_core::{AlgorithmRegistry, ImageStack, STACK_FILE_NAME, StackError, StackShape};
use starfish_test_support::images::{gaussian_spots, roll};
use tempfile::TempDir;

use super::{ParquetStackStore, StackStore, build_cli};

pub(super) const SIZE: usize = 16;

/// Round offsets relative to round zero.
pub(super) const OFFSETS: [(isize, isize); 2] = [(0, 0), (3, -2)];

/// Counts load and persist calls, optionally failing every persist.
#[derive(Debug, Default)]
pub(super) struct CountingStore {
    loads: AtomicUsize,
    persists: AtomicUsize,
    fail_persist: bool,
}

impl CountingStore {
    pub(super) fn failing_persist() -> Self {
        Self {
            fail_persist: true,
            ..Self::default()
        }
    }

    pub(super) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(super) fn persists(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }
}

impl StackStore for CountingStore {
    fn load(&self, path: &Path) -> Result<ImageStack, StackError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        ParquetStackStore.load(path)
    }

    fn persist(&self, stack: &ImageStack, path: &Path) -> Result<(), StackError> {
        self.persists.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist {
            return Err(StackError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only target"),
            });
        }
        ParquetStackStore.persist(stack, path)
    }
}

/// Scratch input and output directories with a misaligned stack in `input`.
pub(super) struct Workspace {
    _root: TempDir,
    pub(super) input: PathBuf,
    pub(super) output: PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let root = match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => panic!("failed to create temp dir: {err}"),
        };
        let input = root.path().join("in");
        let output = root.path().join("out");
        std::fs::create_dir(&input).expect("create input dir");
        std::fs::create_dir(&output).expect("create output dir");
        misaligned_stack()
            .write(&input)
            .expect("write input stack");
        Self {
            _root: root,
            input,
            output,
        }
    }

    /// Input directory without a stack file.
    pub(super) fn empty() -> Self {
        let workspace = Self::new();
        std::fs::remove_file(workspace.input.join(STACK_FILE_NAME)).expect("remove input stack");
        workspace
    }

    pub(super) fn output_stack(&self) -> PathBuf {
        self.output.join(STACK_FILE_NAME)
    }

    /// Arguments for `starfish register -i <input> -o <output>` followed by
    /// `tail`.
    pub(super) fn register_args(&self, tail: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = ["starfish", "register", "--input"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        args.push(self.input.display().to_string());
        args.push("--output".to_owned());
        args.push(self.output.display().to_string());
        args.extend(tail.iter().map(|&arg| arg.to_owned()));
        args
    }
}

pub(super) fn misaligned_stack() -> ImageStack {
    let spots = gaussian_spots(SIZE, SIZE, &[(5.0, 6.0)], 1.0);
    let values = OFFSETS
        .iter()
        .flat_map(|&(dy, dx)| roll(&spots, SIZE, SIZE, dy, dx))
        .collect();
    ImageStack::from_tiles(StackShape::new(OFFSETS.len(), 1, SIZE, SIZE), values)
        .expect("valid stack")
}

pub(super) fn parse(
    registry: &AlgorithmRegistry,
    args: Vec<String>,
) -> clap::error::Result<ArgMatches> {
    build_cli(registry).try_get_matches_from(args)
}

/// Matches of the `register` subcommand.
pub(super) fn register_matches(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some(("register", scoped)) => scoped,
        other => panic!("expected the register subcommand, got {other:?}"),
    }
}
