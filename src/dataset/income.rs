//! World Bank income group classification.

use serde::{Deserialize, Serialize};

/// Income group of a country, ordered from poorest to richest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeGroup {
    /// Low income.
    #[serde(rename = "Low income")]
    Low,
    /// Lower middle income.
    #[serde(rename = "Lower middle income")]
    LowerMiddle,
    /// Upper middle income.
    #[serde(rename = "Upper middle income")]
    UpperMiddle,
    /// High income.
    #[serde(rename = "High income")]
    High,
}

impl IncomeGroup {
    /// Get all income groups, poorest first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Low, Self::LowerMiddle, Self::UpperMiddle, Self::High]
    }

    /// Canonical label as it appears in the source data.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low income",
            Self::LowerMiddle => "Lower middle income",
            Self::UpperMiddle => "Upper middle income",
            Self::High => "High income",
        }
    }

    /// Parse from string (case-insensitive, tolerant of separators).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();
        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "low income" | "low" | "lic" => Some(Self::Low),
            "lower middle income" | "lower middle" | "lmc" => Some(Self::LowerMiddle),
            "upper middle income" | "upper middle" | "umc" => Some(Self::UpperMiddle),
            "high income" | "high" | "hic" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncomeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for IncomeGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| format!("Unknown income group: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_group_roundtrip() {
        for group in IncomeGroup::all() {
            let parsed: IncomeGroup = group.to_string().parse().unwrap();
            assert_eq!(*group, parsed);
        }
    }

    #[test]
    fn test_income_group_from_str_loose() {
        assert_eq!(IncomeGroup::from_str_loose("HIGH INCOME"), Some(IncomeGroup::High));
        assert_eq!(
            IncomeGroup::from_str_loose("lower_middle_income"),
            Some(IncomeGroup::LowerMiddle)
        );
        assert_eq!(
            IncomeGroup::from_str_loose("  Upper  middle income "),
            Some(IncomeGroup::UpperMiddle)
        );
        assert_eq!(IncomeGroup::from_str_loose("middle"), None);
    }

    #[test]
    fn test_income_group_ordering() {
        assert!(IncomeGroup::Low < IncomeGroup::LowerMiddle);
        assert!(IncomeGroup::UpperMiddle < IncomeGroup::High);
    }
}
