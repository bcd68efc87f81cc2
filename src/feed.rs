//! Reading a stream of JSON-lines snapshots.
//!
//! Each non-blank line is one [`Snapshot`]. Malformed lines are logged and
//! skipped; only I/O failures end the stream with an error.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::SnapshotError;
use crate::snapshot::Snapshot;

/// Line counts collected while reading a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Snapshots parsed and forwarded
    pub accepted: usize,
    /// Malformed lines that were dropped
    pub skipped: usize,
}

/// Parse snapshots from `reader` and forward them on `tx` until EOF.
///
/// Stops early, without error, once the receiving side is dropped.
pub async fn read_snapshots<R>(
    reader: R,
    tx: mpsc::Sender<Snapshot>,
) -> Result<FeedStats, SnapshotError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await.map_err(SnapshotError::ReadFailed)? {
        line_no += 1;
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        match Snapshot::parse_line(raw, line_no) {
            Ok(snapshot) => {
                stats.accepted += 1;
                if tx.send(snapshot).await.is_err() {
                    debug!(line = line_no, "snapshot receiver closed; stopping feed");
                    break;
                }
            }
            Err(err) => {
                stats.skipped += 1;
                warn!(error = %err, "skipping malformed snapshot");
            }
        }
    }

    Ok(stats)
}
