//! The columns a `files` relation may index.

use derive_more::Display;
use othd_probe::{Algorithm, AlgorithmSet};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A usable column of the `files` relation.
///
/// Variants are declared in the optimal lookup order (size first, so that an
/// index led by size supports the cheap short-circuit), and [`Ord`] follows
/// that order.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    #[display("size")]
    Size,
    #[display("sha1")]
    Sha1,
    #[display("md5")]
    Md5,
}
impl Column {
    pub const ALL: [Column; 3] = [Column::Size, Column::Sha1, Column::Md5];

    /// Case-sensitive match against the SQL column name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "size" => Some(Self::Size),
            "sha1" => Some(Self::Sha1),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
        }
    }

    /// The digest algorithm backing this column, if it is a hash column.
    pub fn algorithm(&self) -> Option<Algorithm> {
        match self {
            Self::Size => None,
            Self::Sha1 => Some(Algorithm::Sha1),
            Self::Md5 => Some(Algorithm::Md5),
        }
    }
}

/// The subset of {size, sha1, md5} a database provides, iterated in
/// [`Column`] order.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSet(BTreeSet<Column>);
impl ColumnSet {
    pub fn contains(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Column> + '_ {
        self.0.iter().copied()
    }

    /// Digest algorithms this database can be matched on.
    pub fn algorithms(&self) -> AlgorithmSet {
        self.iter().filter_map(|c| c.algorithm()).collect()
    }
}
impl FromIterator<Column> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl<const N: usize> From<[Column; N]> for ColumnSet {
    fn from(value: [Column; N]) -> Self {
        value.into_iter().collect()
    }
}
impl fmt::Debug for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|c| c.name()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("size", Some(Column::Size))]
    #[case("sha1", Some(Column::Sha1))]
    #[case("md5", Some(Column::Md5))]
    #[case("SHA1", None)]
    #[case("sha256", None)]
    #[case("", None)]
    fn test_from_name(#[case] name: &str, #[case] expected: Option<Column>) {
        assert_eq!(Column::from_name(name), expected);
    }

    #[test]
    fn test_iteration_uses_lookup_order() {
        let set = ColumnSet::from([Column::Md5, Column::Size, Column::Sha1]);
        assert_eq!(set.iter().collect::<Vec<_>>(), Column::ALL.to_vec());
        assert_eq!(set.to_string(), "size, sha1, md5");
    }

    #[rstest]
    #[case(ColumnSet::from([Column::Size]), AlgorithmSet::empty())]
    #[case(ColumnSet::from([Column::Size, Column::Md5]), AlgorithmSet::from([Algorithm::Md5]))]
    #[case(ColumnSet::from([Column::Sha1, Column::Md5]), AlgorithmSet::all())]
    fn test_algorithms(#[case] columns: ColumnSet, #[case] expected: AlgorithmSet) {
        assert_eq!(columns.algorithms(), expected);
    }

    #[test]
    fn test_serializes_as_names() {
        let set = ColumnSet::from([Column::Sha1, Column::Size]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["size","sha1"]"#);
    }
}
