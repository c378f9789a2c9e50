use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use othd_hashdb::{MatchVerdict, Mode, Registry};
use othd_probe::Probe;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Progress events emitted by [`check`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once, with the number of files.
/// 2. [`Checked`](Self::Checked), zero or more times, one per file, in
///    completion order (not input order).
/// 3. [`Complete`](Self::Complete), exactly once.
#[derive(Debug)]
pub enum CheckEvent {
    Started(usize),
    Checked { path: PathBuf, verdict: MatchVerdict },
    Complete,
}

/// Streams a [`CheckEvent`] for every file, evaluating up to `concurrency`
/// files at once against the shared `registry`.
///
/// Each file gets its own [`Probe`], allowed to compute only the digests the
/// registry can use. A file that cannot be probed or evaluated is surfaced
/// as an `Err` item without terminating the stream.
pub fn check<'a>(
    registry: &'a Registry,
    files: Vec<PathBuf>,
    mode: Mode,
    concurrency: usize,
) -> impl Stream<Item = Result<CheckEvent>> + 'a {
    stream!({
        yield Ok(CheckEvent::Started(files.len()));

        let mut queued: VecDeque<_> = files.into_iter().map(|path| check_file(registry, path, mode)).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(queued.drain(..concurrency.max(1).min(queued.len())));
        while let Some(result) = processing.next().await {
            yield result.map(|(path, verdict)| CheckEvent::Checked { path, verdict });
            if let Some(next) = queued.pop_front() {
                processing.push(next);
            }
        }

        yield Ok(CheckEvent::Complete);
    })
}

/// Evaluate a single file.
pub async fn check_file(registry: &Registry, path: PathBuf, mode: Mode) -> Result<(PathBuf, MatchVerdict)> {
    let probe = Probe::from_path(&path, registry.required_hashes())
        .await
        .or_raise(|| ErrorKind::Probe(path.clone()))?;
    let verdict = registry.evaluate(&probe, mode).await.or_raise(|| ErrorKind::Evaluate(path.clone()))?;
    tracing::debug!(path = %path.display(), found = verdict.found, "checked file");
    Ok((path, verdict))
}
