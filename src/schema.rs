//! Normalisation of raw survey tables onto a canonical schema.
//!
//! Survey tables come with mixed-language headers, preamble lines, unit rows, footers and sentinel
//! tokens for suppressed values. This module reads such a table into a [`RawTable`], renames its
//! columns through an explicit [`ColumnMap`] and drops incomplete rows, yielding [`Record`]s whose
//! fields are looked up by canonical name.
use crate::errors::PipelineError;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Tokens used by the statistics offices for zero or suppressed values
const SUPPRESSED_VALUE_TOKENS: [&str; 2] = ["-", "."];

/// Words and punctuation stripped from region names.
///
/// Longer entries come first so that e.g. "Landkreis" is not left as "Land".
const REGION_NAME_DENYLIST: [&str; 10] = [
    "Landeshauptstadt",
    "Stat. Region,",
    "Kreisfreie",
    "Hansestadt",
    "Landkreis",
    "krsfr.",
    "Kreis",
    "Stadt",
    "freie",
    ",",
];

/// The character encoding of a table file
#[derive(Debug, Clone, Copy, PartialEq, Default, DeserializeLabeledStringEnum)]
pub enum Encoding {
    /// UTF-8
    #[string = "utf8"]
    Utf8,
    /// ISO-8859-1, as used by the German statistics offices
    #[default]
    #[string = "latin1"]
    Latin1,
}

impl Encoding {
    /// Decode the raw bytes of a file
    fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::Utf8 => {
                let text = String::from_utf8(bytes).context("File is not valid UTF-8")?;
                Ok(text.trim_start_matches('\u{feff}').to_string())
            }
            // Every byte of ISO-8859-1 is the code point of the same value
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

fn default_delimiter() -> char {
    ';'
}

/// Describes how a delimited table file is laid out
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableFormat {
    /// The field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Number of preamble lines before the header row
    #[serde(default)]
    pub skip_rows: usize,
    /// The character encoding of the file
    #[serde(default)]
    pub encoding: Encoding,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            skip_rows: 0,
            encoding: Encoding::default(),
        }
    }
}

impl TableFormat {
    /// A plain comma-separated UTF-8 file with the header on the first line
    pub fn plain_csv() -> Self {
        Self {
            delimiter: ',',
            skip_rows: 0,
            encoding: Encoding::Utf8,
        }
    }

    /// The delimiter as used by the CSV reader
    pub fn delimiter_byte(&self) -> Result<u8> {
        ensure!(
            self.delimiter.is_ascii(),
            "Delimiter must be an ASCII character, got '{}'",
            self.delimiter
        );

        Ok(u8::try_from(self.delimiter)?)
    }
}

/// A row of a [`RawTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// The line of the input file on which the row starts
    pub line: u64,
    /// The cells of the row. Empty cells are `None`.
    pub cells: Vec<Option<String>>,
}

/// A table exactly as found in the input file, apart from whitespace trimming
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column labels. Empty labels are replaced with `Unnamed: <position>`.
    pub headers: Vec<String>,
    /// The data rows
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Read a table from the specified file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the table file
    /// * `format` - How the file is laid out
    pub fn from_path(file_path: &Path, format: &TableFormat) -> Result<Self> {
        let bytes = fs::read(file_path)?;
        let text = format.encoding.decode(bytes)?;
        Self::from_text(&text, format)
    }

    /// Read a table from already-decoded text
    pub fn from_text(text: &str, format: &TableFormat) -> Result<Self> {
        let delimiter = format.delimiter_byte()?;

        // Preamble lines are dropped before the CSV reader sees them, as they rarely have the
        // same number of fields as the table
        let body: String = text.split_inclusive('\n').skip(format.skip_rows).collect();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut records = reader.records();
        let header_record = records.next().context("Table has no header row")??;
        let headers = header_record
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let label = label.trim();
                if label.is_empty() {
                    format!("Unnamed: {i}")
                } else {
                    label.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line) + format.skip_rows as u64;
            let cells = record
                .iter()
                .map(|cell| {
                    let cell = cell.trim();
                    (!cell.is_empty()).then(|| cell.to_string())
                })
                .collect();
            rows.push(RawRow { line, cells });
        }

        Ok(Self { headers, rows })
    }
}

/// Maps the raw column labels of a table onto canonical field names.
///
/// The map must account for every column of the table: each raw label is either renamed or
/// explicitly excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    table: String,
    renames: IndexMap<String, String>,
    excluded: HashSet<String>,
}

impl ColumnMap {
    /// Create an empty column map for the named table
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            renames: IndexMap::new(),
            excluded: HashSet::new(),
        }
    }

    /// Rename the column `raw` to `canonical`
    pub fn rename(mut self, raw: &str, canonical: &str) -> Self {
        self.renames.insert(raw.to_string(), canonical.to_string());
        self
    }

    /// Add several renames at once
    pub fn rename_all<I, S, T>(mut self, renames: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        self.renames
            .extend(renames.into_iter().map(|(raw, canonical)| (raw.into(), canonical.into())));
        self
    }

    /// Drop the column `raw` from the normalised table
    pub fn exclude(mut self, raw: &str) -> Self {
        self.excluded.insert(raw.to_string());
        self
    }

    /// The name of the table this map applies to
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Check the header row of a table against this map
    fn check_headers(&self, headers: &[String]) -> Result<(), PipelineError> {
        let unexpected: Vec<String> = headers
            .iter()
            .filter(|label| !self.renames.contains_key(*label) && !self.excluded.contains(*label))
            .cloned()
            .collect();
        let missing: Vec<String> = self
            .renames
            .iter()
            .filter(|(raw, _)| !headers.contains(raw))
            .map(|(_, canonical)| canonical.clone())
            .collect();

        if unexpected.is_empty() && missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::SchemaMismatch {
                table: self.table.clone(),
                unexpected,
                missing,
            })
        }
    }
}

/// A complete row of a normalised table, with fields keyed by canonical name
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The line of the input file on which the row starts
    pub line: u64,
    fields: IndexMap<String, String>,
}

impl Record {
    /// Get the raw text of a field
    pub fn get(&self, column: &str) -> Result<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .with_context(|| format!("No column named '{column}'"))
    }

    /// Iterate over the fields as (canonical name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The error for an unparseable value in the given column
    pub fn format_error(&self, column: &str, value: &str) -> PipelineError {
        PipelineError::FormatError {
            line: self.line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// Parse a field into a value of type `T`
    pub fn parse<T: FromStr>(&self, column: &str) -> Result<T> {
        let value = self.get(column)?;
        Ok(value
            .parse()
            .map_err(|_| self.format_error(column, value))?)
    }

    /// Parse a field holding an apartment count or energy figure, resolving sentinel tokens
    pub fn parse_count(&self, column: &str) -> Result<u64> {
        let value = self.get(column)?;
        Ok(parse_count(value).ok_or_else(|| self.format_error(column, value))?)
    }
}

/// Normalise a raw table onto the canonical schema described by `columns`.
///
/// Rows with an empty cell in any retained column (units rows, footnotes and the like) are dropped.
///
/// # Returns
///
/// The complete rows, or [`PipelineError::SchemaMismatch`] if the header row does not match.
pub fn normalise(raw: &RawTable, columns: &ColumnMap) -> Result<Vec<Record>> {
    columns.check_headers(&raw.headers)?;

    let retained: Vec<(usize, &str)> = raw
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, label)| columns.renames.get(label).map(|name| (i, name.as_str())))
        .collect();

    let mut records = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let fields: Option<IndexMap<String, String>> = retained
            .iter()
            .map(|(i, name)| {
                let value = row.cells.get(*i).cloned().flatten()?;
                Some((name.to_string(), value))
            })
            .collect();

        if let Some(fields) = fields {
            records.push(Record {
                line: row.line,
                fields,
            });
        }
    }

    let dropped = raw.rows.len() - records.len();
    if dropped > 0 {
        debug!(
            "Dropped {dropped} incomplete row(s) from {} table",
            columns.table
        );
    }

    Ok(records)
}

/// Parse a count, mapping suppressed-value sentinels to zero and unwrapping parenthesised
/// (statistically uncertain) values.
///
/// Returns `None` if the value is not a count.
pub fn parse_count(value: &str) -> Option<u64> {
    let value = value.trim();
    if SUPPRESSED_VALUE_TOKENS.contains(&value) {
        return Some(0);
    }

    let value = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value);
    value.trim().parse().ok()
}

/// Strip administrative qualifiers from a region name, leaving the bare place name
pub fn clean_region_name(name: &str) -> String {
    let mut name = name.to_string();
    for word in REGION_NAME_DENYLIST {
        name = name.replace(word, "");
    }

    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const SURVEY_TEXT: &str = "Survey of something
Published somewhere

;;;insgesamt;Kohle
;;;1000 MJ;1000 MJ
2011;01001;Flensburg, Kreisfreie Stadt;20;-
2011;01002;Kiel, Landeshauptstadt;30;(4)
Footnote: data are provisional
";

    fn survey_format() -> TableFormat {
        TableFormat {
            delimiter: ';',
            skip_rows: 3,
            encoding: Encoding::Utf8,
        }
    }

    fn survey_columns() -> ColumnMap {
        ColumnMap::new("survey")
            .rename("Unnamed: 0", "year")
            .rename("Unnamed: 1", "district_id")
            .rename("Unnamed: 2", "district")
            .rename("Kohle", "coal")
            .exclude("insgesamt")
    }

    #[test]
    fn test_raw_table_from_text() {
        let raw = RawTable::from_text(SURVEY_TEXT, &survey_format()).unwrap();
        assert_eq!(
            raw.headers,
            ["Unnamed: 0", "Unnamed: 1", "Unnamed: 2", "insgesamt", "Kohle"]
        );
        assert_eq!(raw.rows.len(), 4);
        assert_eq!(raw.rows[0].cells[0], None);
        assert_eq!(raw.rows[0].cells[3].as_deref(), Some("1000 MJ"));
        assert_eq!(raw.rows[1].line, 6);
        assert_eq!(raw.rows[3].cells.len(), 1);
    }

    #[test]
    fn test_raw_table_latin1() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("table.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            // "Plön" in ISO-8859-1
            file.write_all(b"region;count\nPl\xf6n;3\n").unwrap();
        }

        let raw = RawTable::from_path(&file_path, &TableFormat::default()).unwrap();
        assert_eq!(raw.rows[0].cells[0].as_deref(), Some("Plön"));
    }

    #[test]
    fn test_raw_table_bad_delimiter() {
        let format = TableFormat {
            delimiter: 'ö',
            ..TableFormat::default()
        };
        assert!(RawTable::from_text("a;b\n", &format).is_err());
    }

    #[test]
    fn test_normalise() {
        let raw = RawTable::from_text(SURVEY_TEXT, &survey_format()).unwrap();
        let records = normalise(&raw, &survey_columns()).unwrap();

        // Units row and footnote are dropped
        assert_eq!(records.len(), 2);
        let record = &records[1];
        assert_eq!(record.line, 7);
        assert_eq!(
            record.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            ["year", "district_id", "district", "coal"]
        );
        assert_eq!(record.get("district").unwrap(), "Kiel, Landeshauptstadt");
        assert_eq!(record.parse_count("coal").unwrap(), 4);
        assert_eq!(record.parse::<u32>("year").unwrap(), 2011);
        assert!(record.get("insgesamt").is_err());
    }

    #[test]
    fn test_normalise_unexpected_column() {
        let raw = RawTable::from_text(SURVEY_TEXT, &survey_format()).unwrap();
        let columns = ColumnMap::new("survey")
            .rename("Unnamed: 0", "year")
            .rename("Unnamed: 1", "district_id")
            .rename("Unnamed: 2", "district")
            .rename("Kohle", "coal");
        let err = normalise(&raw, &columns).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::SchemaMismatch {
                table: "survey".into(),
                unexpected: vec!["insgesamt".into()],
                missing: vec![],
            })
        );
    }

    #[test]
    fn test_normalise_missing_column() {
        let raw = RawTable::from_text(SURVEY_TEXT, &survey_format()).unwrap();
        let columns = survey_columns().rename("Heizöl", "oil");
        let err = normalise(&raw, &columns).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::SchemaMismatch {
                table: "survey".into(),
                unexpected: vec![],
                missing: vec!["oil".into()],
            })
        );
    }

    #[test]
    fn test_record_format_error() {
        let raw = RawTable::from_text(
            "a;b\n1;x\n",
            &TableFormat {
                encoding: Encoding::Utf8,
                ..TableFormat::default()
            },
        )
        .unwrap();
        let columns = ColumnMap::new("test").rename("a", "a").rename("b", "b");
        let records = normalise(&raw, &columns).unwrap();
        let err = records[0].parse_count("b").unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::FormatError {
                line: 2,
                column: "b".into(),
                value: "x".into()
            })
        );
    }

    #[rstest]
    #[case("17", Some(17))]
    #[case(" 17 ", Some(17))]
    #[case("-", Some(0))]
    #[case(".", Some(0))]
    #[case("(22)", Some(22))]
    #[case("( 9 )", Some(9))]
    #[case("(-)", None)]
    #[case("1.5", None)]
    #[case("x", None)]
    #[case("(12", None)]
    fn test_parse_count(#[case] value: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_count(value), expected);
    }

    #[rstest]
    #[case("Flensburg, Stadt", "Flensburg")]
    #[case("Flensburg, Kreisfreie Stadt", "Flensburg")]
    #[case("Kiel, Landeshauptstadt", "Kiel")]
    #[case("Lübeck, Hansestadt", "Lübeck")]
    #[case("Dithmarschen, Kreis", "Dithmarschen")]
    #[case("Herzogtum Lauenburg, Landkreis", "Herzogtum Lauenburg")]
    #[case("Neumünster, krsfr. Stadt", "Neumünster")]
    #[case("  Plön  ", "Plön")]
    fn test_clean_region_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(clean_region_name(name), expected);
    }
}
