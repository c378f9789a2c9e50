//! Plain-text rendering of command output.

use othd_hashdb::{Description, MatchVerdict, Registry, SampleRow};
use othd_library::Loaded;
use std::fmt;
use std::path::Path;

/// Lowercase hex rendering of a blob.
pub struct Hex<'a>(pub &'a [u8]);
impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "NO" }
}

/// `describe` output: every description field, then the sample rows.
pub struct DescriptionReport<'a> {
    pub description: &'a Description,
    pub samples: &'a [SampleRow],
}
impl fmt::Display for DescriptionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.description;
        writeln!(f, "Path:           {}", d.path.display())?;
        writeln!(f, "Name:           {}", d.name)?;
        writeln!(f, "Description:    {}", d.description)?;
        writeln!(f, "UUID:           {}", d.uuid)?;
        writeln!(f, "Application ID: {:#010x} (valid: {})", d.application_id, yes_no(d.application_id_valid))?;
        writeln!(f, "DB version:     {} (supported: {})", d.db_version, yes_no(d.db_version_supported))?;
        writeln!(f, "Columns:        {}", d.columns.join(", "))?;
        for index in &d.indexes {
            writeln!(f, "Index:          {} ({})", index.name, index.columns.join(", "))?;
        }
        writeln!(f, "Ideal index:    {}", yes_no(d.has_ideal_index))?;
        writeln!(f, "Entries:        {}", d.entries)?;
        if self.samples.is_empty() {
            return Ok(());
        }
        writeln!(f, "\nMost recent entries:")?;
        for sample in self.samples {
            f.write_str(" ")?;
            if let Some(size) = sample.size {
                write!(f, " size={size}")?;
            }
            if let Some(sha1) = &sample.sha1 {
                write!(f, " sha1={}", Hex(sha1))?;
            }
            if let Some(md5) = &sample.md5 {
                write!(f, " md5={}", Hex(md5))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// `databases` output: live handles, conflicts, then excluded candidates.
pub struct RegistryReport<'a>(pub &'a Loaded);
impl fmt::Display for RegistryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = &self.0.registry;
        writeln!(f, "Loaded {} database(s), required hashes: [{}]", registry.len(), registry.required_hashes())?;
        for handle in registry.handles() {
            writeln!(f, "  {} {} [{}] {}", handle.uuid(), handle.name(), handle.columns(), handle.path().display())?;
            if !handle.description().is_empty() {
                writeln!(f, "      {}", handle.description())?;
            }
        }
        for conflict in registry.conflicts() {
            writeln!(f, "Conflict on uuid {}, excluded:", conflict.uuid)?;
            for member in &conflict.members {
                writeln!(f, "  {} {}", member.name, member.path.display())?;
            }
        }
        let excluded: Vec<_> = self.0.diagnostics.iter().filter(|e| e.path().is_some()).collect();
        if !excluded.is_empty() {
            writeln!(f, "Excluded {} candidate(s):", excluded.len())?;
            for err in excluded {
                writeln!(f, "  {}", **err)?;
            }
        }
        Ok(())
    }
}

/// One line per checked file: `known` or `unknown`, the path, then the
/// names of the matching databases.
pub fn verdict(registry: &Registry, path: &Path, verdict: &MatchVerdict) -> String {
    if !verdict.found {
        return format!("unknown\t{}", path.display());
    }
    let names: Vec<&str> = verdict
        .matched
        .iter()
        .map(|uuid| registry.get(uuid).map_or("?", |h| h.name()))
        .collect();
    format!("known\t{}\t{}", path.display(), names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case(&[], "")]
    #[case(&[0x00, 0x0f, 0xa0, 0xff], "000fa0ff")]
    fn test_hex(#[case] bytes: &[u8], #[case] expected: &str) {
        assert_eq!(Hex(bytes).to_string(), expected);
    }

    #[test]
    fn test_unknown_verdict() {
        let line = verdict(&Registry::new(), Path::new("/evidence/a.bin"), &MatchVerdict::default());
        assert_eq!(line, "unknown\t/evidence/a.bin");
    }

    #[test]
    fn test_verdict_for_unregistered_uuid() {
        let found = MatchVerdict { found: true, matched: vec![Uuid::from_u128(1)] };
        let line = verdict(&Registry::new(), Path::new("a"), &found);
        assert_eq!(line, "known\ta\t?");
    }

    #[test]
    fn test_description_lists_samples_in_hex() {
        let description = Description {
            path: "/db.othd".into(),
            application_id: 0x4F54_4844,
            application_id_valid: true,
            db_version: 1,
            db_version_supported: true,
            name: "N".into(),
            description: "D".into(),
            uuid: Uuid::from_u128(1),
            columns: vec!["size".into(), "md5".into()],
            indexes: vec![],
            has_ideal_index: false,
            entries: 1,
        };
        let samples = [SampleRow { size: Some(3), sha1: None, md5: Some(vec![0xab, 0x01]) }];
        let text = DescriptionReport { description: &description, samples: &samples }.to_string();
        assert!(text.contains("Application ID: 0x4f544844 (valid: yes)"));
        assert!(text.contains("Ideal index:    NO"));
        assert!(text.contains("\n  size=3 md5=ab01\n"));
    }

    #[test]
    fn test_empty_registry_report() {
        let loaded = Loaded { registry: Registry::new(), diagnostics: vec![] };
        assert_eq!(RegistryReport(&loaded).to_string(), "Loaded 0 database(s), required hashes: []\n");
    }
}
