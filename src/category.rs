//! Mapping of the survey's category labels onto canonical ordinal codes.
//!
//! The codes double as join keys: age codes index the specific heat consumption table, size codes
//! are the floor-area midpoints in m² and unit-count codes are thresholded to derive the building
//! type.
use strum::Display;

/// Construction-era brackets
const AGE_CODES: [(&str, u32); 10] = [
    ("Vor 1919", 0),
    ("1919 - 1948", 1),
    ("1949 - 1978", 2),
    ("1979 - 1986", 3),
    ("1987 - 1990", 4),
    ("1991 - 1995", 5),
    ("1996 - 2000", 6),
    ("2001 - 2004", 7),
    ("2005 - 2008", 8),
    ("2009 und später", 9),
];

/// Floor-area brackets, coded by their midpoint in m²
const SIZE_CODES: [(&str, u32); 18] = [
    ("Insgesamt", 0),
    ("Unter 30", 20),
    ("30 - 39", 30),
    ("40 - 49", 40),
    ("50 - 59", 50),
    ("60 - 69", 60),
    ("70 - 79", 70),
    ("80 - 89", 80),
    ("90 - 99", 90),
    ("100 - 109", 100),
    ("110 - 119", 110),
    ("120 - 129", 120),
    ("130 - 139", 130),
    ("140 - 149", 140),
    ("150 - 159", 150),
    ("160 - 169", 160),
    ("170 - 179", 170),
    ("180 und mehr", 200),
];

/// Brackets of dwellings per building
const UNIT_COUNT_CODES: [(&str, u32); 5] = [
    ("1 Wohnung", 1),
    ("2 Wohnungen", 2),
    ("3 - 6 Wohnungen", 4),
    ("7 - 12 Wohnungen", 7),
    ("13 und mehr Wohnungen", 13),
];

/// A categorical dimension of the apartment survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CategoryAxis {
    /// Construction era of the building
    Age,
    /// Floor area of the apartment
    Size,
    /// Number of dwellings in the building
    UnitCount,
}

impl CategoryAxis {
    fn codes(self) -> &'static [(&'static str, u32)] {
        match self {
            Self::Age => &AGE_CODES,
            Self::Size => &SIZE_CODES,
            Self::UnitCount => &UNIT_COUNT_CODES,
        }
    }

    /// Look up the canonical code for a label
    pub fn encode(self, label: &str) -> Option<u32> {
        self.codes()
            .iter()
            .find(|(l, _)| *l == label.trim())
            .map(|(_, code)| *code)
    }

    /// Look up the survey label for a canonical code
    pub fn decode(self, code: u32) -> Option<&'static str> {
        self.codes()
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(label, _)| *label)
    }

    /// Iterate over the (label, code) pairs of this axis
    pub fn iter(self) -> impl Iterator<Item = (&'static str, u32)> {
        self.codes().iter().copied()
    }
}

/// One position of a composite row key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyLabel {
    /// A canonical code
    Code(u32),
    /// A label which has not (yet) been mapped
    Text(String),
}

impl KeyLabel {
    /// Map this label onto a canonical code of the given axis.
    ///
    /// Labels which already look like codes are parsed. Anything else unknown to the axis is
    /// passed through unchanged.
    pub fn encode(self, axis: CategoryAxis) -> Self {
        match self {
            Self::Code(_) => self,
            Self::Text(label) => axis
                .encode(&label)
                .or_else(|| label.trim().parse().ok())
                .map_or(Self::Text(label), Self::Code),
        }
    }
}

impl std::fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(label) => write!(f, "{label}"),
        }
    }
}

/// A row key made of several [`KeyLabel`]s
pub type CompositeKey = Vec<KeyLabel>;

/// Replace the labels at position `level` of each row key with canonical codes of `axis`.
///
/// All other key positions and the row order are left untouched. Sorting by the new keys is up to
/// the caller.
pub fn map_level<V>(
    rows: Vec<(CompositeKey, V)>,
    level: usize,
    axis: CategoryAxis,
) -> Vec<(CompositeKey, V)> {
    rows.into_iter()
        .map(|(key, value)| {
            let key = key
                .into_iter()
                .enumerate()
                .map(|(i, label)| if i == level { label.encode(axis) } else { label })
                .collect();
            (key, value)
        })
        .collect()
}
