//! File-backed knowledge loaders.
//!
//! A region table is tab separated with one region per line:
//!
//! ```text
//! id  name  chrom  start  end  [eff_start  eff_end  [alias,alias,...]]
//! ```
//!
//! A group archive describes groups from a single source:
//!
//! ```text
//! <source> [description]
//! GROUP <name> [description]
//! <region alias> [<region alias> ...]
//! CHILD <name>
//! ```
//!
//! Archive groups are named `<source>:<name>`.
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use biobin_core::KnowledgeBase;
use biobin_core::models::{Chromosome, GroupId};
use biobin_core::traits::{GroupLoader, LoaderError, RegionLoader};

use crate::errors::{IoError, IoResult};
use crate::utils::get_dynamic_reader;

fn parse_error(path: &Path, line: usize, reason: impl Into<String>) -> IoError {
    IoError::ParseError {
        path: path.display().to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_coord(path: &Path, line: usize, value: &str) -> IoResult<u32> {
    value
        .parse::<u32>()
        .map_err(|_| parse_error(path, line, format!("invalid coordinate {}", value)))
}

/// Loads regions from a tab separated region table.
pub struct RegionFileLoader {
    path: PathBuf,
}

impl RegionFileLoader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        RegionFileLoader { path: path.into() }
    }

    pub fn read_regions<R: BufRead>(
        &self,
        reader: R,
        kb: &mut KnowledgeBase,
        filter_ids: &[String],
        filter_aliases: &[String],
    ) -> IoResult<usize> {
        let mut added = 0;
        let mut skipped_chrom = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(parse_error(
                    &self.path,
                    line_no,
                    format!("expected at least 5 fields, found {}", fields.len()),
                ));
            }

            let (ext_id, name) = (fields[0], fields[1]);
            let aliases: Vec<&str> = match fields.get(7) {
                Some(&".") | None => Vec::new(),
                Some(list) => list.split(',').filter(|a| !a.is_empty()).collect(),
            };

            let wanted = (filter_ids.is_empty() && filter_aliases.is_empty())
                || filter_ids.iter().any(|f| f == ext_id)
                || filter_aliases
                    .iter()
                    .any(|f| f == name || aliases.contains(&f.as_str()));
            if !wanted {
                continue;
            }

            let chrom = match fields[2].parse::<Chromosome>() {
                Ok(chrom) => chrom,
                Err(_) => {
                    debug!("Skipping region {} on chromosome {}", name, fields[2]);
                    skipped_chrom += 1;
                    continue;
                }
            };
            let start = parse_coord(&self.path, line_no, fields[3])?;
            let end = parse_coord(&self.path, line_no, fields[4])?;

            let id = kb.add_region(name, chrom, start, end)?;
            kb.add_alias(id, ext_id);
            if let (Some(eff_start), Some(eff_end)) = (fields.get(5), fields.get(6)) {
                if *eff_start != "." && *eff_end != "." {
                    let eff_start = parse_coord(&self.path, line_no, eff_start)?;
                    let eff_end = parse_coord(&self.path, line_no, eff_end)?;
                    kb.set_effective_bounds(id, eff_start, eff_end)?;
                }
            }
            for alias in aliases {
                kb.add_alias(id, alias);
            }
            added += 1;
        }

        if skipped_chrom > 0 {
            warn!(
                "Skipped {} regions on unrecognized chromosomes in {}",
                skipped_chrom,
                self.path.display()
            );
        }
        info!("Loaded {} regions from {}", added, self.path.display());
        Ok(added)
    }
}

impl RegionLoader for RegionFileLoader {
    fn load_regions(
        &mut self,
        kb: &mut KnowledgeBase,
        filter_ids: &[String],
        filter_aliases: &[String],
    ) -> Result<usize, LoaderError> {
        let reader = get_dynamic_reader(&self.path)?;
        Ok(self.read_regions(reader, kb, filter_ids, filter_aliases)?)
    }
}

/// Loads user defined groups from one or more group archives.
///
/// `filter_names` matches a group's archive name or its full
/// `<source>:<name>` name; `filter_ids` matches the archive source.
pub struct GroupArchiveLoader {
    paths: Vec<PathBuf>,
}

struct PendingGroup {
    id: Option<GroupId>,
    name: String,
}

impl GroupArchiveLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        GroupArchiveLoader { paths }
    }

    pub fn read_archive<R: BufRead>(
        path: &Path,
        reader: R,
        kb: &mut KnowledgeBase,
        filter_names: &[String],
        filter_ids: &[String],
    ) -> IoResult<usize> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(idx, line)| line.map(|l| (idx + 1, l)));

        let mut header = None;
        for line in lines.by_ref() {
            let (line_no, line) = line?;
            let line = line.trim().to_string();
            if !line.is_empty() {
                header = Some((line_no, line));
                break;
            }
        }
        let Some((_, header)) = header else {
            warn!("Group archive {} is empty", path.display());
            return Ok(0);
        };

        let (source, source_desc) = match header.split_once(char::is_whitespace) {
            Some((source, desc)) => (source.to_string(), desc.trim().to_string()),
            None => (header.clone(), String::new()),
        };
        if !filter_ids.is_empty() && !filter_ids.contains(&source) {
            debug!("Skipping group archive {}", source);
            return Ok(0);
        }
        let src = kb.add_source(&source);

        let mut current: Option<PendingGroup> = None;
        let mut children: Vec<(GroupId, usize, String)> = Vec::new();
        let mut declared: Vec<(String, GroupId)> = Vec::new();
        let mut missing_aliases: BTreeSet<String> = BTreeSet::new();
        let mut added = 0;

        for line in lines {
            let (line_no, line) = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (keyword, rest) = match line.split_once(char::is_whitespace) {
                Some((k, r)) => (k, r.trim()),
                None => (line, ""),
            };

            if keyword.eq_ignore_ascii_case("GROUP") {
                let (name, desc) = match rest.split_once(char::is_whitespace) {
                    Some((n, d)) => (n, d.trim()),
                    None => (rest, ""),
                };
                if name.is_empty() {
                    return Err(parse_error(path, line_no, "GROUP without a name"));
                }

                let full_name = format!("{}:{}", source, name);
                let wanted = filter_names.is_empty()
                    || filter_names.iter().any(|f| f == name || *f == full_name);
                let id = wanted.then(|| {
                    let desc = if desc.is_empty() { source_desc.as_str() } else { desc };
                    let id = kb.add_group(&full_name, desc, src);
                    declared.push((name.to_string(), id));
                    added += 1;
                    id
                });
                current = Some(PendingGroup {
                    id,
                    name: name.to_string(),
                });
                continue;
            }

            let Some(group) = current.as_ref() else {
                return Err(parse_error(path, line_no, "entry before the first GROUP"));
            };
            let Some(gid) = group.id else {
                continue;
            };

            if keyword.eq_ignore_ascii_case("CHILD") {
                if rest.is_empty() {
                    return Err(parse_error(path, line_no, "CHILD without a name"));
                }
                children.push((gid, line_no, rest.to_string()));
                continue;
            }

            for alias in line.split_whitespace() {
                let regions: Vec<_> = kb.regions_by_alias(alias).collect();
                if regions.is_empty() {
                    missing_aliases.insert(alias.to_string());
                }
                for rid in regions {
                    kb.add_association(gid, rid);
                }
            }
            debug!("Read members of group {}", group.name);
        }

        for (parent, line_no, child) in children {
            match declared.iter().find(|(name, _)| *name == child) {
                Some((_, cid)) => {
                    kb.add_relationship(parent, *cid);
                }
                None => debug!(
                    "{} line {}: child group {} not loaded",
                    path.display(),
                    line_no,
                    child
                ),
            }
        }

        if !missing_aliases.is_empty() {
            warn!(
                "{} region aliases in {} could not be found",
                missing_aliases.len(),
                path.display()
            );
            debug!("Missing aliases: {:?}", missing_aliases);
        }
        info!("Loaded {} groups from {}", added, path.display());
        Ok(added)
    }
}

impl GroupLoader for GroupArchiveLoader {
    fn load_groups(
        &mut self,
        kb: &mut KnowledgeBase,
        filter_names: &[String],
        filter_ids: &[String],
    ) -> Result<usize, LoaderError> {
        let mut added = 0;
        for path in &self.paths {
            let reader = get_dynamic_reader(path)?;
            added += Self::read_archive(path, reader, kb, filter_names, filter_ids)?;
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tempfile::NamedTempFile;

    const REGIONS: &str = "\
# id\tname\tchrom\tstart\tend
ENSG1\tGENE1\tchr1\t100\t200\t90\t210\tG1A,G1B
ENSG2\tGENE2\t1\t300\t400
ENSG3\tGENE3\tX\t500\t600\t.\t.\tG3A
ENSG4\tGENE4\tchrUn\t1\t10
";

    const ARCHIVE: &str = "\
MYDB my custom pathways

GROUP P1 first pathway
GENE1 G3A
NOPE
CHILD P2
GROUP P2
GENE2
GROUP P3
GENE1
";

    fn no_filter() -> Vec<String> {
        Vec::new()
    }

    #[fixture]
    fn kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        let loader = RegionFileLoader::new("regions.tsv");
        loader
            .read_regions(REGIONS.as_bytes(), &mut kb, &no_filter(), &no_filter())
            .unwrap();
        kb
    }

    #[rstest]
    fn test_read_regions(kb: KnowledgeBase) {
        assert_eq!(kb.num_regions(), 3);

        let g1 = kb.regions_by_alias("G1B").next().unwrap();
        let region = kb.region(g1).unwrap();
        assert_eq!(region.name(), "GENE1");
        assert_eq!(region.effective_bounds().start, 90);
        assert_eq!(kb.regions_by_alias("ENSG1").next(), Some(g1));

        let g3 = kb.regions_by_alias("GENE3").next().unwrap();
        assert_eq!(kb.region(g3).unwrap().chrom(), Chromosome::X);
        assert!(!kb.region(g3).unwrap().has_effective_bounds());
    }

    #[rstest]
    #[case(vec!["ENSG2"], vec![], vec!["GENE2"])]
    #[case(vec![], vec!["G1A"], vec!["GENE1"])]
    #[case(vec!["ENSG3"], vec!["GENE2"], vec!["GENE2", "GENE3"])]
    fn test_region_filters(
        #[case] ids: Vec<&str>,
        #[case] aliases: Vec<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let ids: Vec<String> = ids.into_iter().map(String::from).collect();
        let aliases: Vec<String> = aliases.into_iter().map(String::from).collect();

        let mut kb = KnowledgeBase::new();
        RegionFileLoader::new("regions.tsv")
            .read_regions(REGIONS.as_bytes(), &mut kb, &ids, &aliases)
            .unwrap();

        let mut names: Vec<&str> = kb.regions().map(|r| r.name()).collect();
        names.sort();
        assert_eq!(names, expected);
    }

    #[rstest]
    fn test_bad_coordinate() {
        let mut kb = KnowledgeBase::new();
        let result = RegionFileLoader::new("regions.tsv").read_regions(
            "E1\tGENE1\t1\tabc\t200\n".as_bytes(),
            &mut kb,
            &no_filter(),
            &no_filter(),
        );
        assert!(matches!(result, Err(IoError::ParseError { line: 1, .. })));
    }

    #[rstest]
    fn test_read_archive(mut kb: KnowledgeBase) {
        let added = GroupArchiveLoader::read_archive(
            Path::new("custom.txt"),
            ARCHIVE.as_bytes(),
            &mut kb,
            &no_filter(),
            &no_filter(),
        )
        .unwrap();
        assert_eq!(added, 3);

        let p1 = kb.group_by_name("MYDB:P1").unwrap();
        let p2 = kb.group_by_name("MYDB:P2").unwrap();
        let group = kb.group(p1).unwrap();
        assert_eq!(group.description(), "first pathway");
        assert_eq!(group.regions().len(), 2);
        assert!(group.children().contains(&p2));
        assert_eq!(kb.source_name(group.source()), Some("MYDB"));

        let p3 = kb.group(kb.group_by_name("MYDB:P3").unwrap()).unwrap();
        assert_eq!(p3.description(), "my custom pathways");
        assert_eq!(kb.descendant_regions(p1).len(), 3);
    }

    #[rstest]
    fn test_archive_filters(mut kb: KnowledgeBase) {
        let names = vec!["P1".to_string()];
        let added = GroupArchiveLoader::read_archive(
            Path::new("custom.txt"),
            ARCHIVE.as_bytes(),
            &mut kb,
            &names,
            &no_filter(),
        )
        .unwrap();
        assert_eq!(added, 1);
        let p1 = kb.group_by_name("MYDB:P1").unwrap();
        assert!(kb.group(p1).unwrap().children().is_empty());

        let sources = vec!["OTHER".to_string()];
        let added = GroupArchiveLoader::read_archive(
            Path::new("custom.txt"),
            ARCHIVE.as_bytes(),
            &mut kb,
            &no_filter(),
            &sources,
        )
        .unwrap();
        assert_eq!(added, 0);
    }

    #[rstest]
    fn test_members_before_group() {
        let mut kb = KnowledgeBase::new();
        let result = GroupArchiveLoader::read_archive(
            Path::new("custom.txt"),
            "SRC\nGENE1\n".as_bytes(),
            &mut kb,
            &no_filter(),
            &no_filter(),
        );
        assert!(matches!(result, Err(IoError::ParseError { line: 2, .. })));
    }

    #[rstest]
    fn test_loaders_from_files() {
        let mut regions = NamedTempFile::new().unwrap();
        regions.write_all(REGIONS.as_bytes()).unwrap();
        let mut archive = NamedTempFile::new().unwrap();
        archive.write_all(ARCHIVE.as_bytes()).unwrap();

        let mut kb = KnowledgeBase::new();
        let n = RegionFileLoader::new(regions.path())
            .load_regions(&mut kb, &no_filter(), &no_filter())
            .unwrap();
        assert_eq!(n, 3);

        let n = GroupArchiveLoader::new(vec![archive.path().to_path_buf()])
            .load_groups(&mut kb, &no_filter(), &no_filter())
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(kb.num_groups(), 3);
    }
}
