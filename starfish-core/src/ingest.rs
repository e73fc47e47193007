//! Parquet encoding for [`ImageStack`].
//!
//! Each row holds one tile: `round: UInt32`, `channel: UInt32` and
//! `pixels: FixedSizeList<Float32, height * width>`. Tile geometry and the
//! stack extent travel as Arrow schema metadata.

use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use tempfile::NamedTempFile;

use crate::{
    error::StackError,
    stack::{ImageStack, STACK_FILE_NAME, StackShape},
};

pub(crate) const ROUND_COLUMN: &str = "round";
pub(crate) const CHANNEL_COLUMN: &str = "channel";
pub(crate) const PIXELS_COLUMN: &str = "pixels";

pub(crate) const ROUNDS_KEY: &str = "starfish.rounds";
pub(crate) const CHANNELS_KEY: &str = "starfish.channels";
pub(crate) const HEIGHT_KEY: &str = "starfish.height";
pub(crate) const WIDTH_KEY: &str = "starfish.width";

/// Maps a user-supplied location onto the Parquet file it designates.
pub(crate) fn resolve_stack_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(STACK_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

pub(crate) fn read_parquet(path: &Path) -> Result<ImageStack, StackError> {
    let file = File::open(path).map_err(|source| StackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = Arc::clone(builder.schema());
    let shape = shape_from_metadata(schema.metadata())?;
    let indices = ColumnIndices::resolve(&schema, shape.tile_len())?;
    let rows = builder.metadata().file_metadata().num_rows();
    if usize::try_from(rows).ok() != Some(shape.tile_count()) {
        return Err(StackError::RowCountMismatch {
            expected: shape.tile_count(),
            actual: rows,
        });
    }

    // One row per tile and no duplicates, so every tile is present.
    let mut stack = ImageStack::zeros(shape)?;
    let mut seen = vec![false; shape.tile_count()];
    let mut row_offset = 0_usize;
    for batch in builder.build()? {
        let batch = batch?;
        copy_batch(&batch, &indices, row_offset, &mut stack, &mut seen)?;
        row_offset += batch.num_rows();
    }
    Ok(stack)
}

pub(crate) fn write_parquet(stack: &ImageStack, path: &Path) -> Result<(), StackError> {
    let batch = encode_batch(stack)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |source| StackError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut staged = NamedTempFile::new_in(parent).map_err(io_error)?;
    {
        let mut writer = ArrowWriter::try_new(staged.as_file_mut(), batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
    }
    staged.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

pub(crate) fn stack_schema(shape: StackShape) -> Result<Schema, StackError> {
    let width = i32::try_from(shape.tile_len()).map_err(|_| StackError::CapacityOverflow)?;
    let metadata = HashMap::from([
        (ROUNDS_KEY.to_owned(), shape.rounds.to_string()),
        (CHANNELS_KEY.to_owned(), shape.channels.to_string()),
        (HEIGHT_KEY.to_owned(), shape.height.to_string()),
        (WIDTH_KEY.to_owned(), shape.width.to_string()),
    ]);
    Ok(Schema::new(vec![
        Field::new(ROUND_COLUMN, DataType::UInt32, false),
        Field::new(CHANNEL_COLUMN, DataType::UInt32, false),
        Field::new(
            PIXELS_COLUMN,
            DataType::FixedSizeList(pixel_item_field(), width),
            false,
        ),
    ])
    .with_metadata(metadata))
}

fn pixel_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, false))
}

fn encode_batch(stack: &ImageStack) -> Result<RecordBatch, StackError> {
    let shape = stack.shape();
    let schema = Arc::new(stack_schema(shape)?);
    let mut rounds = Vec::with_capacity(shape.tile_count());
    let mut channels = Vec::with_capacity(shape.tile_count());
    for round in 0..shape.rounds {
        for channel in 0..shape.channels {
            rounds.push(u32::try_from(round).map_err(|_| StackError::CapacityOverflow)?);
            channels.push(u32::try_from(channel).map_err(|_| StackError::CapacityOverflow)?);
        }
    }
    let tile_len = i32::try_from(shape.tile_len()).map_err(|_| StackError::CapacityOverflow)?;
    let pixels = FixedSizeListArray::try_new(
        pixel_item_field(),
        tile_len,
        Arc::new(Float32Array::from(stack.values().to_vec())) as ArrayRef,
        None,
    )?;
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(UInt32Array::from(rounds)) as ArrayRef,
            Arc::new(UInt32Array::from(channels)) as ArrayRef,
            Arc::new(pixels) as ArrayRef,
        ],
    )?;
    Ok(batch)
}

fn shape_from_metadata(metadata: &HashMap<String, String>) -> Result<StackShape, StackError> {
    let read = |key: &'static str| {
        metadata
            .get(key)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .ok_or(StackError::InvalidMetadata { key })
    };
    let shape = StackShape::new(
        read(ROUNDS_KEY)?,
        read(CHANNELS_KEY)?,
        read(HEIGHT_KEY)?,
        read(WIDTH_KEY)?,
    );
    shape.validate()?;
    Ok(shape)
}

struct ColumnIndices {
    round: usize,
    channel: usize,
    pixels: usize,
}

impl ColumnIndices {
    fn resolve(schema: &Schema, tile_len: usize) -> Result<Self, StackError> {
        let index_of = |column: &'static str| {
            schema
                .index_of(column)
                .map_err(|_| StackError::ColumnNotFound { column })
        };
        let indices = Self {
            round: index_of(ROUND_COLUMN)?,
            channel: index_of(CHANNEL_COLUMN)?,
            pixels: index_of(PIXELS_COLUMN)?,
        };
        for (index, column) in [(indices.round, ROUND_COLUMN), (indices.channel, CHANNEL_COLUMN)] {
            let actual = schema.field(index).data_type();
            if actual != &DataType::UInt32 {
                return Err(StackError::InvalidColumnType {
                    column,
                    actual: actual.clone(),
                });
            }
        }
        match schema.field(indices.pixels).data_type() {
            DataType::FixedSizeList(child, width)
                if child.data_type() == &DataType::Float32
                    && usize::try_from(*width).ok() == Some(tile_len) =>
            {
                Ok(indices)
            }
            other => Err(StackError::InvalidColumnType {
                column: PIXELS_COLUMN,
                actual: other.clone(),
            }),
        }
    }
}

fn copy_batch(
    batch: &RecordBatch,
    indices: &ColumnIndices,
    row_offset: usize,
    stack: &mut ImageStack,
    seen: &mut [bool],
) -> Result<(), StackError> {
    let rounds = downcast_u32(batch.column(indices.round), ROUND_COLUMN)?;
    let channels = downcast_u32(batch.column(indices.channel), CHANNEL_COLUMN)?;
    let pixels_column = batch.column(indices.pixels);
    let pixels = pixels_column
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| StackError::InvalidColumnType {
            column: PIXELS_COLUMN,
            actual: pixels_column.data_type().clone(),
        })?;

    let shape = stack.shape();
    for row in 0..batch.num_rows() {
        let absolute_row = row_offset + row;
        if rounds.is_null(row) || channels.is_null(row) || pixels.is_null(row) {
            return Err(StackError::NullValue { row: absolute_row });
        }
        let round = rounds.value(row) as usize;
        let channel = channels.value(row) as usize;
        let index = shape.tile_index(round, channel)?;
        if std::mem::replace(&mut seen[index], true) {
            return Err(StackError::DuplicateTile { round, channel });
        }

        let tile = pixels.value(row);
        let floats = tile.as_any().downcast_ref::<Float32Array>().ok_or_else(|| {
            StackError::InvalidColumnType {
                column: PIXELS_COLUMN,
                actual: tile.data_type().clone(),
            }
        })?;
        if floats.null_count() > 0 {
            return Err(StackError::NullValue { row: absolute_row });
        }
        stack
            .tile_mut(round, channel)?
            .copy_from_slice(floats.values());
    }
    Ok(())
}

fn downcast_u32<'a>(array: &'a ArrayRef, column: &'static str) -> Result<&'a UInt32Array, StackError> {
    array
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| StackError::InvalidColumnType {
            column,
            actual: array.data_type().clone(),
        })
}
