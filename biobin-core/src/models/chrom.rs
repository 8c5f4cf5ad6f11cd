use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A chromosome encoded as a small integer.
///
/// Autosomes keep their number; the sex chromosomes, the pseudo-autosomal
/// region and mitochondria follow as `X` = 23, `Y` = 24, `XY` = 25 and
/// `MT` = 26.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Chromosome(u8);

impl Chromosome {
    pub const X: Chromosome = Chromosome(23);
    pub const Y: Chromosome = Chromosome(24);
    pub const XY: Chromosome = Chromosome(25);
    pub const MT: Chromosome = Chromosome(26);

    const NAMES: [&'static str; 26] = [
        "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
        "17", "18", "19", "20", "21", "22", "X", "Y", "XY", "MT",
    ];

    pub fn new(code: u8) -> Option<Self> {
        (1..=26).contains(&code).then_some(Chromosome(code))
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES[(self.0 - 1) as usize]
    }
}

impl FromStr for Chromosome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let bare = upper.strip_prefix("CHR").unwrap_or(&upper);

        let code = match bare {
            "X" => 23,
            "Y" => 24,
            "XY" | "X|Y" => 25,
            "M" | "MT" => 26,
            other => match other.parse::<u8>() {
                Ok(n) if (1..=22).contains(&n) => n,
                _ => return Err(CoreError::InvalidChromosome(s.to_string())),
            },
        };

        Ok(Chromosome(code))
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("chr22", 22)]
    #[case("Chr7", 7)]
    #[case("x", 23)]
    #[case("chrY", 24)]
    #[case("X|Y", 25)]
    #[case("XY", 25)]
    #[case("chrM", 26)]
    #[case("MT", 26)]
    fn test_parse_chromosome(#[case] input: &str, #[case] code: u8) {
        let chrom: Chromosome = input.parse().unwrap();
        assert_eq!(chrom.code(), code);
    }

    #[rstest]
    #[case("0")]
    #[case("23")]
    #[case("chrUn")]
    #[case("")]
    fn test_parse_invalid_chromosome(#[case] input: &str) {
        assert_eq!(
            input.parse::<Chromosome>(),
            Err(CoreError::InvalidChromosome(input.to_string()))
        );
    }

    #[rstest]
    fn test_display_round_trips_names() {
        assert_eq!(Chromosome::X.to_string(), "X");
        assert_eq!(Chromosome::MT.to_string(), "MT");
        assert_eq!(Chromosome::new(9).unwrap().to_string(), "9");
        assert_eq!(Chromosome::new(27), None);
    }

    #[rstest]
    fn test_ordering_follows_code() {
        let mut chroms: Vec<Chromosome> = ["X", "2", "10", "1"]
            .iter()
            .map(|c| c.parse().unwrap())
            .collect();
        chroms.sort();
        let names: Vec<String> = chroms.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["1", "2", "10", "X"]);
    }
}
