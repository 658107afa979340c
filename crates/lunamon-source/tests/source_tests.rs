use std::fs;

use lunamon_source::{
    read_to_end, ChunkSource, CommandConfig, ProcessSource, ReaderSource, SourceError,
};
use tempfile::TempDir;

// ============================================================
// Reader sources
// ============================================================

#[tokio::test]
async fn test_reader_source_respects_chunk_size() {
    let data: &[u8] = b"0123456789";
    let mut source = ReaderSource::new(data, "bytes").with_chunk_size(4);

    let mut chunks = Vec::new();
    while let Some(chunk) = source.next_chunk().await.unwrap() {
        assert!(chunk.len() <= 4);
        chunks.push(chunk);
    }

    assert_eq!(chunks.concat(), data.to_vec());
    // Termination is sticky
    assert!(source.next_chunk().await.unwrap().is_none());
}

#[tokio::test]
async fn test_reader_source_opens_capture_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.txt");
    fs::write(&path, "Time\tStatus Prot Type Serial Sender Destination Method Payload\n").unwrap();

    let mut source = ReaderSource::open(&path).await.unwrap();
    assert_eq!(source.describe(), path.display().to_string());

    let bytes = read_to_end(&mut source).await.unwrap();
    assert!(bytes.starts_with(b"Time\tStatus"));
}

#[tokio::test]
async fn test_reader_source_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ReaderSource::open(&dir.path().join("nope.txt"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::OpenFailed { .. }));
}

// ============================================================
// Process sources
// ============================================================

#[tokio::test]
async fn test_empty_command_is_rejected() {
    let err = ProcessSource::spawn(&CommandConfig::new(vec![])).err().unwrap();
    assert!(matches!(err, SourceError::EmptyCommand));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_source_streams_stdout() {
    let config = CommandConfig::new(vec![
        "sh".into(),
        "-c".into(),
        "printf 'hello '; echo oops >&2; printf 'world'".into(),
    ])
    .with_chunk_size(3);

    let mut source = ProcessSource::spawn(&config).unwrap();
    assert_eq!(source.describe(), "sh -c printf 'hello '; echo oops >&2; printf 'world'");

    let bytes = read_to_end(&mut source).await.unwrap();
    assert_eq!(bytes, b"hello world".to_vec());

    let status = source.exit_status().unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_source_reports_exit_code() {
    let config = CommandConfig::new(vec!["sh".into(), "-c".into(), "exit 3".into()]);
    let mut source = ProcessSource::spawn(&config).unwrap();

    assert!(source.next_chunk().await.unwrap().is_none());
    assert_eq!(source.exit_status().unwrap().code(), Some(3));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_source_applies_working_dir_and_env() {
    let dir = TempDir::new().unwrap();
    let config = CommandConfig::new(vec![
        "sh".into(),
        "-c".into(),
        "printf '%s %s' \"$(basename \"$(pwd -P)\")\" \"$LUNAMON_TARGET\"".into(),
    ])
    .with_working_dir(dir.path().to_path_buf())
    .with_env("LUNAMON_TARGET", "tv");

    let mut source = ProcessSource::spawn(&config).unwrap();
    let bytes = read_to_end(&mut source).await.unwrap();

    let expected = format!(
        "{} tv",
        dir.path().file_name().unwrap().to_string_lossy()
    );
    assert_eq!(String::from_utf8(bytes).unwrap(), expected);
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_source_drains_stderr_before_exit() {
    let config = CommandConfig::new(vec![
        "sh".into(),
        "-c".into(),
        "i=0; while [ $i -lt 500 ]; do echo \"noise $i\" >&2; i=$((i+1)); done; printf done".into(),
    ]);
    let mut source = ProcessSource::spawn(&config).unwrap();

    let bytes = read_to_end(&mut source).await.unwrap();
    assert_eq!(bytes, b"done".to_vec());
    assert!(source.exit_status().unwrap().success());
    assert!(source.next_chunk().await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_program_fails_to_spawn() {
    let config = CommandConfig::new(vec!["/definitely/not/a/monitor".into()]);
    let err = ProcessSource::spawn(&config).err().unwrap();
    assert!(matches!(err, SourceError::SpawnFailed(_)));
}
