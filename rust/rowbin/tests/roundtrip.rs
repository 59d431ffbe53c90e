//! End-to-end streaming: rows -> codec -> compressed blocks -> pipe -> back.

use std::io::Write;
use std::thread;
use std::time::Duration;

use rowbin::format::{AggregateKind, Column, TypeTag};
use rowbin::values::{Bitmap, Value, ValueData};
use rowbin::{BlockReader, BlockWriter, CompressionMethod, PipeOptions, RowReader, RowWriter, pipe};

fn schema() -> Vec<Column> {
    vec![
        Column::new("id", TypeTag::UInt64),
        Column::new("name", TypeTag::String).nullable(),
        Column::decimal("price", 9, 3).unwrap(),
        Column::array("tags", Column::new("", TypeTag::UInt32)),
        Column::aggregate(
            "seen",
            AggregateKind::GroupBitmap,
            Column::new("", TypeTag::UInt32),
        ),
    ]
}

fn row(i: u64) -> Vec<Value> {
    vec![
        Value::of(i),
        if i % 3 == 0 {
            Value::null()
        } else {
            Value::of(format!("name-{i}"))
        },
        Value::of(ValueData::Decimal(format!("{i}.{:03}", i % 1000).parse().unwrap())),
        Value::of(vec![Value::of(i as u32), Value::of((i * 2) as u32)]),
        Value::of(ValueData::Bitmap(Bitmap::of_u32(&[i as u32, 1000 + i as u32]))),
    ]
}

#[test]
fn rows_survive_compressed_pipe_transfer() {
    const ROWS: u64 = 500;
    let columns = schema();
    let (pipe_writer, pipe_reader) = pipe(PipeOptions {
        segment_size: 256,
        queue_depth: 4,
        timeout: Some(Duration::from_secs(10)),
    })
    .unwrap();

    let producer_columns = columns.clone();
    let producer = thread::spawn(move || {
        let block_writer = BlockWriter::with_block_size(pipe_writer, CompressionMethod::Lz4, 1024)
            .unwrap();
        let mut rows = RowWriter::new(block_writer, &producer_columns).unwrap();
        for i in 0..ROWS {
            rows.write_row(&row(i)).unwrap();
        }
        let mut block_writer = rows.into_inner();
        Write::flush(&mut block_writer).unwrap();
        let mut pipe_writer = block_writer.finish().unwrap();
        pipe_writer.close().unwrap();
    });

    let mut reader = RowReader::new(BlockReader::new(pipe_reader), &columns).unwrap();
    let mut count = 0u64;
    while let Some(decoded) = reader.next_row().unwrap() {
        let expected = row(count);
        assert_eq!(decoded[0].as_u64().unwrap(), count);
        if count % 3 == 0 {
            assert!(decoded[1].is_null_or_empty());
        } else {
            assert_eq!(decoded[1].as_str().unwrap(), format!("name-{count}"));
        }
        assert_eq!(
            decoded[2].as_decimal(3).unwrap(),
            expected[2].as_decimal(3).unwrap()
        );
        assert_eq!(decoded[3], expected[3]);
        assert_eq!(
            decoded[4].as_bitmap().unwrap(),
            expected[4].as_bitmap().unwrap()
        );
        count += 1;
    }
    producer.join().unwrap();
    assert_eq!(count, ROWS);
}

#[test]
fn framed_stream_survives_a_file() {
    let columns = vec![
        Column::new("k", TypeTag::String),
        Column::new("v", TypeTag::Int64).nullable(),
    ];
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut rows = RowWriter::new(
        BlockWriter::with_block_size(file.reopen().unwrap(), CompressionMethod::Zstd, 512)
            .unwrap(),
        &columns,
    )
    .unwrap();
    for i in 0..200i64 {
        rows.write_row(&[
            Value::of(format!("key-{i}")),
            if i % 7 == 0 { Value::null() } else { Value::of(i) },
        ])
        .unwrap();
    }
    rows.into_inner().finish().unwrap();

    let source = std::io::BufReader::new(file.reopen().unwrap());
    let mut reader = RowReader::new(BlockReader::new(source), &columns).unwrap();
    let mut i = 0i64;
    while let Some(row) = reader.next_row().unwrap() {
        assert_eq!(row[0].as_str().unwrap(), format!("key-{i}"));
        assert_eq!(row[1].is_null_or_empty(), i % 7 == 0);
        i += 1;
    }
    assert_eq!(i, 200);
}

#[test]
fn corrupt_block_surfaces_before_any_row() {
    let columns = vec![Column::new("v", TypeTag::UInt32)];
    let mut rows = RowWriter::new(
        BlockWriter::new(Vec::new(), CompressionMethod::Lz4),
        &columns,
    )
    .unwrap();
    for i in 0..10u32 {
        rows.write_row(&[Value::of(i)]).unwrap();
    }
    let mut framed = rows.into_inner().finish().unwrap();
    let last = framed.len() - 1;
    framed[last] ^= 0x20;

    let mut reader = RowReader::new(BlockReader::new(&framed[..]), &columns).unwrap();
    assert!(reader.next_row().is_err());
}

#[test]
fn early_reader_drop_unblocks_producer() {
    let (pipe_writer, pipe_reader) = pipe(PipeOptions {
        segment_size: 16,
        queue_depth: 1,
        timeout: Some(Duration::from_secs(10)),
    })
    .unwrap();

    let producer = thread::spawn(move || {
        let mut writer = pipe_writer;
        let chunk = [0xABu8; 64];
        // Keep writing until the dead reader is noticed.
        loop {
            if writer.write_all(&chunk).is_err() {
                break;
            }
        }
    });

    // Consume a little, then walk away mid-stream.
    let mut reader = pipe_reader;
    let mut buf = [0u8; 32];
    std::io::Read::read(&mut reader, &mut buf).unwrap();
    drop(reader);

    // The producer must terminate on its own; join would hang otherwise.
    producer.join().unwrap();
}
