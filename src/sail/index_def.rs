//! Index definitions: comma-separated permutations of `s`, `p`, `o`, `c`

use super::traits::{SailError, SailResult};
use std::str::FromStr;

/// Index definition used when none is configured
pub const DEFAULT_INDEXES: &str = "spoc,posc";

/// One statement position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Predicate,
    Object,
    Context,
}

impl Position {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            's' => Some(Self::Subject),
            'p' => Some(Self::Predicate),
            'o' => Some(Self::Object),
            'c' => Some(Self::Context),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Subject => 's',
            Self::Predicate => 'p',
            Self::Object => 'o',
            Self::Context => 'c',
        }
    }

    /// Column holding this position in the statements table
    pub fn column(self) -> &'static str {
        match self {
            Self::Subject => "subj",
            Self::Predicate => "pred",
            Self::Object => "obj",
            Self::Context => "ctx",
        }
    }
}

/// A single index: an ordering of all four positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec([Position; 4]);

impl IndexSpec {
    /// The four-letter name, e.g. `posc`
    pub fn name(&self) -> String {
        self.0.iter().map(|p| p.letter()).collect()
    }

    /// Comma-separated column list in index order
    pub fn columns(&self) -> String {
        self.0
            .iter()
            .map(|p| p.column())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parse(raw: &str) -> SailResult<Self> {
        let letters: Vec<char> = raw.chars().collect();
        if letters.len() != 4 {
            return Err(SailError::InvalidIndexDefinition(format!(
                "'{}' must name exactly four positions",
                raw
            )));
        }

        let mut positions = [Position::Subject; 4];
        for (slot, letter) in letters.iter().enumerate() {
            let pos = Position::from_letter(*letter).ok_or_else(|| {
                SailError::InvalidIndexDefinition(format!(
                    "'{}' contains unknown position '{}'",
                    raw, letter
                ))
            })?;
            if positions[..slot].contains(&pos) {
                return Err(SailError::InvalidIndexDefinition(format!(
                    "'{}' repeats position '{}'",
                    raw, letter
                )));
            }
            positions[slot] = pos;
        }
        Ok(Self(positions))
    }
}

/// Parsed, de-duplicated list of indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    indexes: Vec<IndexSpec>,
}

impl IndexDefinition {
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// The definition in its canonical comma-separated form
    pub fn canonical(&self) -> String {
        self.indexes
            .iter()
            .map(|i| i.name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for IndexDefinition {
    /// The indexes named by [`DEFAULT_INDEXES`]
    fn default() -> Self {
        use Position::*;
        Self {
            indexes: vec![
                IndexSpec([Subject, Predicate, Object, Context]),
                IndexSpec([Predicate, Object, Subject, Context]),
            ],
        }
    }
}

impl FromStr for IndexDefinition {
    type Err = SailError;

    fn from_str(s: &str) -> SailResult<Self> {
        let mut indexes: Vec<IndexSpec> = Vec::new();
        for raw in s.split(',') {
            let raw = raw.trim().to_ascii_lowercase();
            if raw.is_empty() {
                continue;
            }
            let spec = IndexSpec::parse(&raw)?;
            if !indexes.contains(&spec) {
                indexes.push(spec);
            }
        }

        if indexes.is_empty() {
            return Err(SailError::InvalidIndexDefinition(
                "at least one index is required".to_string(),
            ));
        }
        Ok(Self { indexes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_definition() {
        let def = IndexDefinition::default();
        assert_eq!(def.indexes().len(), 2);
        assert_eq!(def.canonical(), "spoc,posc");
        assert_eq!(def.indexes()[1].columns(), "pred, obj, subj, ctx");
        assert_eq!(DEFAULT_INDEXES.parse::<IndexDefinition>().unwrap(), def);
    }

    #[test]
    fn trims_lowercases_and_deduplicates() {
        let def: IndexDefinition = " SPOC , posc,spoc ,".parse().unwrap();
        assert_eq!(def.canonical(), "spoc,posc");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "spo".parse::<IndexDefinition>(),
            Err(SailError::InvalidIndexDefinition(_))
        ));
    }

    #[test]
    fn rejects_unknown_letter() {
        assert!(matches!(
            "spox".parse::<IndexDefinition>(),
            Err(SailError::InvalidIndexDefinition(_))
        ));
    }

    #[test]
    fn rejects_repeated_position() {
        assert!(matches!(
            "sspo".parse::<IndexDefinition>(),
            Err(SailError::InvalidIndexDefinition(_))
        ));
    }

    #[test]
    fn rejects_empty_definition() {
        assert!(matches!(
            " , ".parse::<IndexDefinition>(),
            Err(SailError::InvalidIndexDefinition(_))
        ));
    }
}
