//! Drives a chunk source through a monitor session and renders the result.

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use lunamon_logging::Console;
use lunamon_source::{read_to_end, ChunkSource};
use lunamon_trace::{FilterSpec, MonitorSession};
use tracing::info;

/// What `watch` prints besides the live record feed.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub filter: FilterSpec,
    /// Print the call tree when the stream ends
    pub show_calls: bool,
    /// Include replay commands in the call tree
    pub replay: bool,
}

/// Stream records to the console until the source ends or `shutdown` fires.
pub async fn watch<W, S>(
    source: &mut dyn ChunkSource,
    console: &mut Console<W>,
    options: &WatchOptions,
    shutdown: S,
) -> Result<MonitorSession>
where
    W: Write,
    S: Future<Output = ()>,
{
    let mut session = MonitorSession::new();
    info!(source = %source.describe(), "Monitor session started");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            chunk = source.next_chunk() => {
                let Some(bytes) = chunk.context("Monitor stream failed")? else {
                    break;
                };

                let was_ready = session.is_ready();
                let records = session.feed_bytes(&bytes);
                if !was_ready && session.is_ready() {
                    console.status("monitor ready")?;
                }

                for record in records.iter().filter(|r| options.filter.matches(r)) {
                    console.record(record)?;
                }
                console.flush()?;
            }
            _ = &mut shutdown => {
                info!("Interrupted, stopping monitor");
                break;
            }
        }
    }

    if !session.is_ready() {
        console.status("no trace header seen; monitor not ready")?;
    }

    if options.show_calls {
        console.calls(&session.calls(), options.replay)?;
    }

    info!(
        records = session.store().len(),
        discarded = session.assembler().discarded(),
        "Monitor session finished"
    );
    console.flush()?;

    Ok(session)
}

/// Read a whole capture and print its call tree.
pub async fn calls<W: Write>(
    source: &mut dyn ChunkSource,
    console: &mut Console<W>,
    replay: bool,
) -> Result<MonitorSession> {
    let bytes = read_to_end(source)
        .await
        .with_context(|| format!("Failed to read {}", source.describe()))?;

    let mut session = MonitorSession::new();
    session.feed_bytes(&bytes);

    if !session.is_ready() {
        console.status("no trace header seen; monitor not ready")?;
    }
    console.calls(&session.calls(), replay)?;
    console.flush()?;

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunamon_logging::LogFormat;
    use lunamon_source::ReaderSource;

    const CAPTURE: &str = "banner\n\
Time\tStatus Prot Type Serial Sender Destination Method Payload\n\
12.5 TX call 7 com.app (s1) com.service (s2) app1 /foo/bar «{\"a\":1}»\n\
12.6 RX call 7 com.app (s1) com.service (s2) app1 /foo/bar «{\"a\":1}»\n\
12.9 TX return 7 com.service (s2) com.app (s1) «{\"returnValue\":true}»\n";

    fn source(data: &'static str) -> ReaderSource<&'static [u8]> {
        ReaderSource::new(data.as_bytes(), "test").with_chunk_size(5)
    }

    #[tokio::test]
    async fn test_watch_prints_filtered_records() {
        let mut src = source(CAPTURE);
        let mut console = Console::new(LogFormat::Compact, Vec::new());
        let options = WatchOptions {
            filter: FilterSpec {
                include_inbound: false,
                ..Default::default()
            },
            show_calls: true,
            replay: false,
        };

        let session = watch(&mut src, &mut console, &options, std::future::pending())
            .await
            .unwrap();
        assert_eq!(session.store().len(), 3);

        let out = String::from_utf8(console.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].ends_with("monitor ready"));
        assert_eq!(lines[1], "12.500 TX call 7 com.app>com.service/foo/bar");
        assert_eq!(lines[2], "12.900 TX return 7 com.app>com.service");
        assert_eq!(lines[3], "7 com.app>com.service/foo/bar responses=1");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn test_watch_stops_on_shutdown() {
        let (_tx, rx) = tokio::io::duplex(64);
        let mut src = ReaderSource::new(rx, "idle");
        let mut console = Console::new(LogFormat::Compact, Vec::new());

        let session = watch(&mut src, &mut console, &WatchOptions::default(), async {})
            .await
            .unwrap();
        assert!(!session.is_ready());

        let out = String::from_utf8(console.into_inner()).unwrap();
        assert!(out.contains("monitor not ready"));
    }

    #[tokio::test]
    async fn test_calls_with_replay() {
        let mut src = source(CAPTURE);
        let mut console = Console::new(LogFormat::Compact, Vec::new());

        calls(&mut src, &mut console, true).await.unwrap();

        let out = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            out.trim_end(),
            r#"7 com.app>com.service/foo/bar responses=1 replay=luna-send -n 1 "luna://com.service/foo/bar" "{\"a\":1}""#
        );
    }
}
