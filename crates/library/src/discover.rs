//! Finding candidate hash databases on attached storage.
//!
//! Hash databases are kept in a well-known directory (`HashDatabases` by
//! default) somewhere on each volume. Discovery walks every search root,
//! and yields every regular file with a candidate extension found anywhere
//! beneath a well-known directory. Symbolic links are not followed.
//!
//! Discovery never fails: directories that cannot be read are logged and
//! skipped, since one unreadable corner of a volume should not hide the
//! databases elsewhere on it.

use async_stream::stream;
use futures::Stream;
use othd_config::Config;
use std::fs::FileType;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};

/// Streams candidate database paths: first the explicitly configured
/// `databases` (unchecked), then every file found under a well-known
/// directory below each search root.
///
/// Within a directory, entries are visited in name order so that discovery
/// is deterministic.
pub fn discover(config: &Config) -> impl Stream<Item = PathBuf> + '_ {
    stream!({
        for path in &config.databases {
            yield path.clone();
        }
        for root in &config.search_roots {
            tracing::debug!(root = %root.display(), "searching for hash databases");
            let mut pending = vec![(root.clone(), is_well_known(root, &config.directory_name))];
            while let Some((dir, inside)) = pending.pop() {
                let entries = match read_sorted(&dir).await {
                    Ok(entries) => entries,
                    Err(error) => {
                        tracing::warn!(path = %dir.display(), %error, "skipping unreadable directory");
                        continue;
                    },
                };
                let mut subdirs = Vec::new();
                for (path, kind) in entries {
                    if kind.is_dir() {
                        let inside = inside || is_well_known(&path, &config.directory_name);
                        subdirs.push((path, inside));
                    } else if kind.is_file() && inside && config.is_candidate_extension(&path) {
                        tracing::trace!(path = %path.display(), "discovered candidate");
                        yield path;
                    }
                }
                // Depth-first, still in name order once popped.
                pending.extend(subdirs.into_iter().rev());
            }
        }
    })
}

fn is_well_known(path: &Path, directory_name: &str) -> bool {
    path.file_name().is_some_and(|name| name == directory_name)
}

async fn read_sorted(dir: &Path) -> IoResult<Vec<(PathBuf, FileType)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push((entry.path(), entry.file_type().await?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
