//! End-to-end reads from files, pipes and slow writers

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use tabstream::prelude::*;
use tabstream_test_helpers::fixtures::{TsvFixture, numbered_rows, pair_columns};
use tabstream_test_helpers::prelude::*;

mod file_input {
    use super::*;

    #[tokio::test]
    async fn reads_a_file_from_disk() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&TsvFixture::numbered(40).with_blank_every(9).into_bytes())?;
        file.flush()?;

        let stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .path(file.path())
                .max_capacity(8),
        )?;

        assert_eq!(stream.collect_records().await?, numbered_rows(40));
        Ok(())
    }

    #[tokio::test]
    async fn large_file_stays_within_capacity() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&TsvFixture::numbered(5_000).into_bytes())?;
        file.flush()?;

        let mut stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .path(file.path())
                .max_capacity(32),
        )?;

        let mut count = 0usize;
        while let Some(item) = stream.next().await {
            item?;
            count += 1;
        }

        let stats = stream.stats();
        assert_eq!(count, 5_000);
        assert!(stats.peak_buffered <= 32);
        assert!(stats.pauses >= 1);
        assert_eq!(stats.pauses, stats.resumes);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn large_file_on_worker_threads_stays_within_capacity() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&TsvFixture::numbered(5_000).into_bytes())?;
        file.flush()?;

        let mut stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .path(file.path())
                .config(
                    StreamConfig::default()
                        .max_capacity(32)
                        .wait_timeout(Duration::from_secs(5)),
                ),
        )?;

        let mut rows = Vec::with_capacity(5_000);
        while let Some(item) = stream.next().await {
            rows.push(item?);
        }

        let stats = stream.stats();
        assert_eq!(rows, numbered_rows(5_000));
        assert!(stats.peak_buffered <= 32);
        assert_eq!(stats.pauses, stats.resumes);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn capacity_of_one_on_worker_threads() -> TestResult {
        let input = TsvFixture::numbered(2_000).into_bytes();
        let mut stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .reader(std::io::Cursor::new(input))
                .config(
                    StreamConfig::default()
                        .max_capacity(1)
                        .wait_timeout(Duration::from_secs(5)),
                ),
        )?;

        let mut rows = Vec::with_capacity(2_000);
        while let Some(item) = stream.next().await {
            rows.push(item?);
        }

        assert_eq!(rows, numbered_rows(2_000));
        assert!(stream.stats().peak_buffered <= 1);
        Ok(())
    }

    #[tokio::test]
    async fn comma_separated_file_with_config_separator() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "ada,36,true\ngrace,,false\n")?;

        let columns = parse_columns("name:text,age:integer,admin:boolean")?;
        let stream = RecordStream::open(
            StreamOptions::new()
                .columns(columns)
                .path(&path)
                .config(StreamConfig::default().separator(',')),
        )?;

        let rows = stream.collect_records().await?;
        assert_eq!(
            rows,
            vec![
                row!["ada", 36, true],
                row!["grace", Value::Null, false],
            ]
        );
        Ok(())
    }
}

mod reader_input {
    use super::*;

    #[tokio::test]
    async fn slow_writer_is_read_as_it_arrives() -> TestResult {
        let (mut writer, reader) = tokio::io::duplex(64);

        let mut stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .reader(reader)
                .max_capacity(2),
        )?;

        let writer_task = tokio::spawn(async move {
            for i in 0..6 {
                writer.write_all(format!("k{i}\t{i}\n").as_bytes()).await?;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            writer.shutdown().await
        });

        assert_eq!(drain(&mut stream).await, numbered_rows(6));
        writer_task.await??;
        Ok(())
    }

    #[tokio::test]
    async fn line_split_across_writes_is_reassembled() -> TestResult {
        let (mut writer, reader) = tokio::io::duplex(16);
        let mut stream = RecordStream::open(
            StreamOptions::new().columns(pair_columns()).reader(reader),
        )?;

        let writer_task = tokio::spawn(async move {
            writer.write_all(b"spl").await?;
            tokio::time::sleep(Duration::from_millis(5)).await;
            writer.write_all(b"it\t4").await?;
            tokio::time::sleep(Duration::from_millis(5)).await;
            writer.write_all(b"2\n").await?;
            writer.shutdown().await
        });

        assert_eq!(must_next(&mut stream).await, row!["split", 42]);
        must_end(&mut stream).await;
        writer_task.await??;
        Ok(())
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_reading() -> TestResult {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut stream = RecordStream::open(
            StreamOptions::new().columns(pair_columns()).reader(reader),
        )?;

        writer.write_all(b"a\t1\n").await?;
        assert_eq!(must_next(&mut stream).await, row!["a", 1]);
        drop(stream);

        // The pump task is gone, so the read half is dropped and writes fail.
        let mut closed = false;
        for _ in 0..50 {
            if writer.write_all(b"b\t2\n").await.is_err() {
                closed = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(closed);
        Ok(())
    }
}

mod futures_adapter {
    use super::*;

    #[tokio::test]
    async fn into_stream_works_with_stream_combinators() -> TestResult {
        let stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .reader(std::io::Cursor::new(TsvFixture::numbered(20).into_bytes()))
                .max_capacity(4),
        )?;

        let evens: Vec<i64> = stream
            .into_stream()
            .filter_map(|item| async move { item.ok() })
            .filter_map(|row| async move { row.get(1).and_then(Value::as_i64) })
            .filter(|v| futures::future::ready(v % 2 == 0))
            .collect()
            .await;

        assert_eq!(evens, (0..20).step_by(2).collect::<Vec<i64>>());
        Ok(())
    }

    #[tokio::test]
    async fn stream_can_be_consumed_from_another_task() -> TestResult {
        let stream = RecordStream::open(
            StreamOptions::new()
                .columns(pair_columns())
                .reader(std::io::Cursor::new(TsvFixture::numbered(100).into_bytes()))
                .max_capacity(10),
        )?;

        let consumer = tokio::spawn(async move { stream.collect_records().await });
        assert_eq!(consumer.await??, numbered_rows(100));
        Ok(())
    }
}
