use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap as HashMap;
use log::info;

use biobin_core::models::{Locus, Region};
use biobin_core::traits::{Information, SnpRole};

use crate::errors::{IoError, IoResult};
use crate::utils::get_dynamic_reader;

const ANY_REGION: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Annotation {
    weight: f32,
    role: SnpRole,
}

fn parse_role(role: &str) -> SnpRole {
    match role.to_ascii_lowercase().as_str() {
        "exon" | "exonic" => SnpRole::Exon,
        "intron" | "intronic" => SnpRole::Intron,
        "regulatory" => SnpRole::Regulatory,
        _ => SnpRole::Other,
    }
}

///
/// Custom SNP weights and roles read from a tab separated table.
///
/// Each line is `locus_id weight [region [role]]`. A region of `*` (or none)
/// applies to the locus in every region; a named region takes precedence
/// when the locus is looked up in that region.
///
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    entries: HashMap<(String, String), Annotation>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader<R: BufRead>(reader: R, label: &str) -> IoResult<Self> {
        let mut table = WeightTable::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(IoError::ParseError {
                    path: label.to_string(),
                    line: idx + 1,
                    reason: "expected a locus id and a weight".to_string(),
                });
            }
            let weight = fields[1].parse::<f32>().map_err(|_| IoError::ParseError {
                path: label.to_string(),
                line: idx + 1,
                reason: format!("invalid weight {}", fields[1]),
            })?;

            let region = fields.get(2).copied().unwrap_or(ANY_REGION);
            let role = fields.get(3).map(|r| parse_role(r)).unwrap_or_default();
            table.insert(fields[0], region, weight, role);
        }

        info!("Loaded {} SNP weights from {}", table.len(), label);
        Ok(table)
    }

    pub fn from_file(path: &Path) -> IoResult<Self> {
        Self::from_reader(get_dynamic_reader(path)?, &path.display().to_string())
    }

    pub fn insert(&mut self, locus_id: &str, region: &str, weight: f32, role: SnpRole) {
        self.entries.insert(
            (locus_id.to_string(), region.to_string()),
            Annotation { weight, role },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, locus: &Locus, region: Option<&Region>) -> Option<Annotation> {
        let specific = region.and_then(|r| {
            self.entries
                .get(&(locus.id.clone(), r.name().to_string()))
                .copied()
        });
        specific.or_else(|| {
            self.entries
                .get(&(locus.id.clone(), ANY_REGION.to_string()))
                .copied()
        })
    }
}

impl Information for WeightTable {
    fn snp_weight(&self, locus: &Locus, region: Option<&Region>) -> f32 {
        self.lookup(locus, region).map(|a| a.weight).unwrap_or(1.0)
    }

    fn snp_role(&self, locus: &Locus, region: Option<&Region>) -> SnpRole {
        self.lookup(locus, region).map(|a| a.role).unwrap_or_default()
    }
}
