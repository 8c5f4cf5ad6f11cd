use std::io::BufRead;
use std::path::Path;

use log::warn;

use biobin_population::PhenotypeTable;

use crate::errors::IoResult;
use crate::utils::get_dynamic_reader;

///
/// Parse a whitespace separated phenotype file.
///
/// Each line holds an individual id followed by one value per phenotype. The
/// first non-empty line may be a `#` header naming the phenotypes; without
/// one, several value columns are named `pheno_1`, `pheno_2`, ... and a single
/// column is left unnamed. Values that are not numbers are stored as NaN,
/// and lines with the wrong number of fields are skipped.
///
pub fn read_phenotypes<R: BufRead>(reader: R) -> IoResult<PhenotypeTable> {
    let mut names: Option<Vec<String>> = None;
    let mut rows: Vec<(String, Vec<f32>)> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if line.starts_with('#') {
            if names.is_none() {
                names = Some(fields[1..].iter().map(|s| s.to_string()).collect());
            }
            continue;
        }

        let names = names.get_or_insert_with(|| match fields.len() {
            0..=2 => vec![String::new()],
            n => {
                warn!("No header given for multiple phenotypes, assigning sequential names");
                (1..n).map(|i| format!("pheno_{}", i)).collect()
            }
        });

        if fields.len() != names.len() + 1 {
            warn!(
                "Improperly formatted phenotype file on line {}, ignoring",
                idx + 1
            );
            continue;
        }

        let values = fields[1..]
            .iter()
            .map(|v| v.parse::<f32>().unwrap_or(f32::NAN))
            .collect();
        rows.push((fields[0].to_string(), values));
    }

    let mut table = PhenotypeTable::new(names.unwrap_or_default());
    for (id, values) in rows {
        table.insert(&id, values);
    }
    Ok(table)
}

pub fn read_phenotype_file(path: &Path) -> IoResult<PhenotypeTable> {
    read_phenotypes(get_dynamic_reader(path)?)
}
