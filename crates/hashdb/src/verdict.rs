//! Folding per-database answers into one verdict per file.

use crate::error::Result;
use crate::registry::Registry;
use othd_probe::Probe;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

/// How much work [`Registry::evaluate`] should do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Stop at the first database that knows the file.
    #[default]
    FirstMatch,
    /// Query every live database and report all that know the file.
    AllMatches,
}
impl From<bool> for Mode {
    /// `true` when every matching database should be reported.
    fn from(report_all: bool) -> Self {
        if report_all { Self::AllMatches } else { Self::FirstMatch }
    }
}

/// Whether a file is known, and to which databases.
///
/// In [`Mode::FirstMatch`] `matched` holds at most one uuid; in
/// [`Mode::AllMatches`] it holds every matching database, sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchVerdict {
    pub found: bool,
    pub matched: Vec<Uuid>,
}

impl Registry {
    /// Evaluate `probe` against every live database.
    ///
    /// Results are OR-ed together, so the order databases are visited in only
    /// affects cost. Poisoned databases never contribute. The first query
    /// error aborts this file's evaluation; it is never read as "not found".
    #[instrument(level = "debug", skip_all, fields(size = probe.size()))]
    pub async fn evaluate(&self, probe: &Probe, mode: Mode) -> Result<MatchVerdict> {
        let mut verdict = MatchVerdict::default();
        for handle in self.handles() {
            if handle.query(probe).await? {
                verdict.found = true;
                verdict.matched.push(handle.uuid());
                if mode == Mode::FirstMatch {
                    break;
                }
            }
        }
        verdict.matched.sort_unstable();
        tracing::debug!(found = verdict.found, matched = verdict.matched.len(), "evaluated probe");
        Ok(verdict)
    }

    /// Is the file known to any live database?
    pub async fn contains(&self, probe: &Probe) -> Result<bool> {
        Ok(self.evaluate(probe, Mode::FirstMatch).await?.found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::error::ErrorKind;
    use crate::fixtures::Fixture;
    use crate::handle::Handle;
    use crate::registry::required_hashes;
    use othd_probe::{Algorithm, CountingSource};
    use rstest::rstest;
    use tempfile::TempDir;

    const SYSTEM_DLL: &[u8] = b"MZ... pretend this is a known system library";
    const DRIVER: &[u8] = b"MZ... and this one is a known driver";

    async fn registry(dir: &TempDir) -> Registry {
        let nsrl = Fixture::new("NSRL", Uuid::from_u128(1)).content(SYSTEM_DLL).content(DRIVER);
        let vendor = Fixture::new("Vendor", Uuid::from_u128(2)).columns([Column::Sha1]).content(DRIVER);
        let mut registry = Registry::new();
        registry.admit(nsrl.build(dir.path().join("nsrl.othd")).await).await.unwrap();
        registry.admit(vendor.build(dir.path().join("vendor.othd")).await).await.unwrap();
        registry
    }

    fn probe(registry: &Registry, content: &[u8]) -> (Probe, CountingSource) {
        let source = CountingSource::new(content.to_vec());
        (Probe::new(content.len() as u64, registry.required_hashes(), source.clone()), source)
    }

    #[tokio::test]
    async fn test_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let (probe, _) = probe(&registry, DRIVER);
        let verdict = registry.evaluate(&probe, Mode::FirstMatch).await.unwrap();
        assert!(verdict.found);
        assert_eq!(verdict.matched.len(), 1);
        registry.close().await;
    }

    #[tokio::test]
    async fn test_all_matches() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let (probe, source) = probe(&registry, DRIVER);
        let verdict = registry.evaluate(&probe, Mode::AllMatches).await.unwrap();
        assert_eq!(verdict, MatchVerdict { found: true, matched: vec![Uuid::from_u128(1), Uuid::from_u128(2)] });
        assert_eq!(source.count(Algorithm::Sha1), 1, "digests are shared between databases");
        registry.close().await;
    }

    #[tokio::test]
    async fn test_unknown_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let (probe, _) = probe(&registry, b"user document");
        let verdict = registry.evaluate(&probe, Mode::AllMatches).await.unwrap();
        assert_eq!(verdict, MatchVerdict::default());
        assert!(!registry.contains(&probe).await.unwrap());
        registry.close().await;
    }

    #[tokio::test]
    async fn test_empty_registry_never_hashes() {
        let registry = Registry::new();
        let (probe, source) = probe(&registry, SYSTEM_DLL);
        assert!(!registry.contains(&probe).await.unwrap());
        assert_eq!(source.total(), 0);
    }

    #[tokio::test]
    async fn test_query_error_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let source = CountingSource::failing(SYSTEM_DLL.to_vec());
        let probe = Probe::new(SYSTEM_DLL.len() as u64, registry.required_hashes(), source);
        let err = registry.evaluate(&probe, Mode::AllMatches).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::QueryExecution));
        registry.close().await;
    }

    /// Every ordering of `0..n`.
    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![vec![]];
        }
        let mut all = Vec::new();
        for shorter in permutations(n - 1) {
            for position in 0..=shorter.len() {
                let mut order = shorter.clone();
                order.insert(position, n - 1);
                all.push(order);
            }
        }
        all
    }

    #[tokio::test]
    async fn test_handle_order_never_changes_the_answer() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = [
            Fixture::new("Full", Uuid::from_u128(1)).content(DRIVER),
            Fixture::new("Sha1", Uuid::from_u128(2)).columns([Column::Sha1]).content(DRIVER),
            Fixture::new("Sizes", Uuid::from_u128(3)).columns([Column::Size]).content(SYSTEM_DLL),
            Fixture::new("SizeMd5", Uuid::from_u128(4)).columns([Column::Size, Column::Md5]).content(SYSTEM_DLL),
        ];
        let mut handles = Vec::new();
        for (i, fixture) in fixtures.into_iter().enumerate() {
            let path = fixture.build(dir.path().join(format!("{i}.othd"))).await;
            handles.push(Handle::open(&path, None).await.unwrap());
        }
        let required = required_hashes(&handles);

        let mut same_size_as_driver = DRIVER.to_vec();
        same_size_as_driver.reverse();
        let cases: [(&[u8], bool); 4] =
            [(DRIVER, true), (SYSTEM_DLL, true), (&b"user document"[..], false), (same_size_as_driver.as_slice(), false)];
        let orders = permutations(handles.len());
        assert_eq!(orders.len(), 24);
        for (content, expected) in cases {
            for order in &orders {
                let probe = Probe::from_bytes(content, required);
                let mut found = false;
                for &i in order {
                    found |= handles[i].query(&probe).await.unwrap();
                }
                assert_eq!(found, expected, "order {order:?}");
            }
        }
        for handle in &handles {
            handle.close().await;
        }
    }

    #[rstest]
    #[case::matching_database_visited_first(1, 9)]
    #[case::matching_database_visited_last(9, 1)]
    #[tokio::test]
    async fn test_first_match_regardless_of_position(#[case] matching: u128, #[case] other: u128) {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new();
        let knows = Fixture::new("Knows", Uuid::from_u128(matching)).content(DRIVER);
        let unaware = Fixture::new("Unaware", Uuid::from_u128(other)).content(SYSTEM_DLL);
        registry.admit(knows.build(dir.path().join("knows.othd")).await).await.unwrap();
        registry.admit(unaware.build(dir.path().join("unaware.othd")).await).await.unwrap();
        let first = registry.handles().next().unwrap().uuid();
        assert_eq!(first, Uuid::from_u128(matching.min(other)));

        for mode in [Mode::FirstMatch, Mode::AllMatches] {
            let probe = Probe::from_bytes(DRIVER, registry.required_hashes());
            let verdict = registry.evaluate(&probe, mode).await.unwrap();
            assert_eq!(verdict, MatchVerdict { found: true, matched: vec![Uuid::from_u128(matching)] });
        }
        registry.close().await;
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(Mode::from(true), Mode::AllMatches);
        assert_eq!(Mode::from(false), Mode::FirstMatch);
    }
}
