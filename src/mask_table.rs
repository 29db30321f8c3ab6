//! Tables of mask ids and the values to write where a mask id is found.
//!
//! A table is a comma separated text file, one `key,value` pair per row. Rows whose first field
//! starts with `#` are comments. Keys are compared to grid cells after truncating both toward
//! zero, so a key of `3` matches cells holding `3.0` through `3.999`.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{errors::HydroGridErr, grid::exact_f64};

/// A replacement value, resolved from the table text when the table is loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaskValue {
    /// Written as an integer literal in the table.
    Int(i64),
    /// Anything else numeric.
    Float(f64),
}

impl MaskValue {
    /// Parse a value, preferring the integer form.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Ok(val) = text.parse::<i64>() {
            Some(MaskValue::Int(val))
        } else {
            text.parse::<f64>().ok().map(MaskValue::Float)
        }
    }

    /// The value as a float, `None` for an integer no float holds exactly.
    pub fn to_f64(self) -> Option<f64> {
        match self {
            MaskValue::Int(val) => exact_f64(i128::from(val)),
            MaskValue::Float(val) => Some(val),
        }
    }
}

impl fmt::Display for MaskValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MaskValue::Int(val) => write!(f, "{}", val),
            MaskValue::Float(val) => write!(f, "{}", val),
        }
    }
}

/// Truncate a value toward zero for key comparison.
///
/// `None` for values with no integer part to compare, NaN, the infinities and anything outside
/// the `i64` range. Such cells never match a key.
pub fn truncate_key(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

    if !value.is_finite() {
        return None;
    }

    let truncated = value.trunc();
    if truncated >= -LIMIT && truncated < LIMIT {
        Some(truncated as i64)
    } else {
        None
    }
}

/// One row of a mask table.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskEntry {
    /// The key as written in the table.
    pub key_text: String,
    /// The key truncated toward zero.
    pub key: i64,
    /// What to write into matching cells.
    pub value: MaskValue,
}

/// Ordered mask table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaskTable {
    entries: Vec<MaskEntry>,
}

impl MaskTable {
    /// Create an empty table.
    pub fn new() -> Self {
        MaskTable::default()
    }

    /// Load a table from a file.
    pub fn load(path: &Path) -> Result<Self, HydroGridErr> {
        let file = File::open(path).map_err(|err| HydroGridErr::ResourceUnavailable {
            path: PathBuf::from(path),
            reason: err.to_string(),
        })?;

        let table = Self::from_reader(file)?;
        tracing::info!("Obtained {} mask values from {}", table.len(), path.display());

        Ok(table)
    }

    /// Parse a table from any reader.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, HydroGridErr> {
        let mut csv_rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let mut table = MaskTable::new();

        for record in csv_rdr.byte_records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line() as usize).unwrap_or(0);

            let first = match record.get(0) {
                Some(first) => first,
                None => continue,
            };

            // Comment rows are skipped undecoded, whatever their encoding.
            if first.starts_with(b"#") || (record.len() == 1 && first.is_empty()) {
                continue;
            }

            let invalid = || HydroGridErr::InvalidTableEntry {
                line,
                text: record
                    .iter()
                    .map(String::from_utf8_lossy)
                    .collect::<Vec<_>>()
                    .join(","),
            };

            let key_text = std::str::from_utf8(first).map_err(|_| invalid())?;
            let value_text = record
                .get(1)
                .ok_or_else(invalid)
                .and_then(|field| std::str::from_utf8(field).map_err(|_| invalid()))?;
            table.insert(key_text, value_text).map_err(|_| invalid())?;
        }

        for key in table.overlapping_keys() {
            tracing::warn!("several mask keys truncate to {}, the last one listed wins", key);
        }

        Ok(table)
    }

    /// Insert a pair. A key already present (same text) keeps its place and takes the new value.
    pub fn insert(&mut self, key_text: &str, value_text: &str) -> Result<(), HydroGridErr> {
        let invalid = || HydroGridErr::InvalidTableEntry {
            line: 0,
            text: format!("{},{}", key_text, value_text),
        };

        let key = key_text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(truncate_key)
            .ok_or_else(invalid)?;
        let value = MaskValue::parse(value_text).ok_or_else(invalid)?;

        if let Some(entry) = self.entries.iter_mut().find(|e| e.key_text == key_text) {
            entry.value = value;
        } else {
            self.entries.push(MaskEntry {
                key_text: key_text.to_owned(),
                key,
                value,
            });
        }

        Ok(())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    /// Map from truncated key to value. Built in table order so a later key overwrites an
    /// earlier one that truncates to the same integer.
    pub fn lookup(&self) -> HashMap<i64, MaskValue> {
        let mut lookup = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            lookup.insert(entry.key, entry.value);
        }
        lookup
    }

    // Truncated keys that more than one entry maps to.
    fn overlapping_keys(&self) -> Vec<i64> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.key).or_insert(0) += 1;
        }

        let mut keys: Vec<i64> = counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(key, _)| key)
            .collect();
        keys.sort_unstable();
        keys
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn test_comment_lines_skipped() {
        let table = MaskTable::from_reader("#5,99\n5,42\n".as_bytes()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup().get(&5), Some(&MaskValue::Int(42)));
    }

    #[test]
    fn test_comment_lines_in_other_encodings() {
        let table = MaskTable::from_reader(&b"# basin \xf0\xe7\xec\n5,42\n"[..]).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup().get(&5), Some(&MaskValue::Int(42)));

        match MaskTable::from_reader(&b"5,42\n6,\xf0\xe7\n"[..]) {
            Err(HydroGridErr::InvalidTableEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidTableEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_comments_and_blank_lines() {
        let text =
            "# mask id, new value\n#\n\n1,100\n# a comment, with, too, many fields\n2,200.5\n";
        let table = MaskTable::from_reader(text.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].value, MaskValue::Int(100));
        assert_eq!(table.entries()[1].value, MaskValue::Float(200.5));
    }

    #[test]
    fn test_invalid_rows() {
        match MaskTable::from_reader("1,100\n2\n".as_bytes()) {
            Err(HydroGridErr::InvalidTableEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidTableEntry, got {:?}", other),
        }

        assert!(MaskTable::from_reader("one,100\n".as_bytes()).is_err());
        assert!(MaskTable::from_reader("1,lots\n".as_bytes()).is_err());
        assert!(MaskTable::from_reader("nan,1\n".as_bytes()).is_err());
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let table = MaskTable::from_reader("3,1\n4,2\n3,5\n".as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].key_text, "3");
        assert_eq!(table.entries()[0].value, MaskValue::Int(5));
        assert_eq!(table.lookup().get(&3), Some(&MaskValue::Int(5)));
    }

    #[test]
    fn test_overlapping_truncated_keys_last_listed_wins() {
        let table = MaskTable::from_reader("3.5,1\n3,2\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup().get(&3), Some(&MaskValue::Int(2)));
        assert_eq!(table.overlapping_keys(), vec![3]);

        let table = MaskTable::from_reader("3,2\n3.5,1\n".as_bytes()).unwrap();
        assert_eq!(table.lookup().get(&3), Some(&MaskValue::Int(1)));
    }

    #[test]
    fn test_truncate_key() {
        assert_eq!(truncate_key(3.7), Some(3));
        assert_eq!(truncate_key(-3.7), Some(-3));
        assert_eq!(truncate_key(-0.5), Some(0));
        assert_eq!(truncate_key(std::f64::NAN), None);
        assert_eq!(truncate_key(std::f64::INFINITY), None);
        assert_eq!(truncate_key(1.0e30), None);
    }

    #[test]
    fn test_mask_value_parse() {
        assert_eq!(MaskValue::parse("42"), Some(MaskValue::Int(42)));
        assert_eq!(MaskValue::parse(" -7 "), Some(MaskValue::Int(-7)));
        assert_eq!(MaskValue::parse("0.25"), Some(MaskValue::Float(0.25)));
        assert_eq!(MaskValue::parse("1e3"), Some(MaskValue::Float(1000.0)));
        assert_eq!(MaskValue::parse("x"), None);
        assert_eq!(MaskValue::Int(3).to_f64(), Some(3.0));
        assert_eq!(MaskValue::Int(9_007_199_254_740_993).to_f64(), None);
        assert_eq!(MaskValue::Int(i64::MAX).to_f64(), None);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new("hydro-grid-mask-table").unwrap();
        let path = tmp.path().join("changes.csv");

        let mut file = File::create(&path).unwrap();
        writeln!(file, "# basin id, roughness").unwrap();
        writeln!(file, "1,0.3").unwrap();
        writeln!(file, "2,0.5").unwrap();
        drop(file);

        let table = MaskTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);

        let missing = MaskTable::load(&tmp.path().join("nope.csv"));
        assert!(matches!(
            missing,
            Err(HydroGridErr::ResourceUnavailable { .. })
        ));
    }
}
