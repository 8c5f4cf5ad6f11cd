use pretty_assertions::assert_eq;
use rstest::rstest;

use biobin_bins::{BinContext, BinManager};
use biobin_core::config::BinSizePolicy;
use biobin_core::models::{Chromosome, GenotypeCall, GroupId, Locus, LocusId, LocusSet, RegionId};
use biobin_core::{BiobinConfig, KnowledgeBase};
use biobin_overlaprs::IntoRegionIndex;
use biobin_population::{GenotypeBits, PhenotypeStatus, PopulationManager};

const N_INDIVIDUALS: usize = 20;

struct Dataset {
    kb: KnowledgeBase,
    loci: LocusSet,
    pop: PopulationManager,
}

impl Dataset {
    fn new() -> Self {
        let ids: Vec<String> = (0..N_INDIVIDUALS).map(|i| format!("ind{}", i)).collect();
        let mut pop = PopulationManager::new();
        pop.load_individuals(&ids).unwrap();
        Dataset {
            kb: KnowledgeBase::new(),
            loci: LocusSet::new(),
            pop,
        }
    }

    fn region(&mut self, name: &str, start: u32, end: u32) -> RegionId {
        self.kb.add_region(name, chr1(), start, end).unwrap()
    }

    fn group(&mut self, name: &str, regions: &[RegionId]) -> GroupId {
        let src = self.kb.add_source("test");
        let gid = self.kb.add_group(name, "", src);
        for rid in regions {
            self.kb.add_association(gid, *rid);
        }
        gid
    }

    /// A locus with the given minor allele frequency, carried as a het by `carriers` individuals.
    fn locus(&mut self, pos: u32, maf: f32, carriers: usize) -> LocusId {
        let id = self.loci.push(Locus::new(chr1(), pos, ""));
        self.loci.add_allele(id, "A", 1.0 - maf);
        self.loci.add_allele(id, "G", maf);

        let mut bits = GenotypeBits::new(N_INDIVIDUALS);
        for i in 0..carriers {
            bits.set(i, GenotypeCall::Het);
        }
        self.pop.add_genotypes(id, bits).unwrap();
        id
    }

    fn build(&mut self, config: &BiobinConfig) -> BinManager {
        let index = (&self.kb).into_region_index();
        index.associate_loci(&mut self.kb, &self.loci);
        let status = PhenotypeStatus::all_controls("", N_INDIVIDUALS);

        let ctx = BinContext {
            kb: &self.kb,
            index: &index,
            loci: &self.loci,
            pop: &self.pop,
            status: &status,
        };
        let mut manager = BinManager::new(config).unwrap();
        manager.init_bins(&ctx);
        manager
    }

    /// (bin name, member positions) in bin order.
    fn summary(&self, manager: &BinManager) -> Vec<(String, Vec<u32>)> {
        manager
            .bins()
            .map(|b| {
                let mut positions: Vec<u32> = b.loci().map(|l| self.loci.get(l).pos).collect();
                positions.sort();
                (b.name().to_string(), positions)
            })
            .collect()
    }
}

fn chr1() -> Chromosome {
    Chromosome::new(1).unwrap()
}

fn config(threshold: u32, min_size: u32) -> BiobinConfig {
    let mut config = BiobinConfig::default();
    config.binning.bin_traverse_threshold = threshold;
    config.binning.min_bin_size = min_size;
    config
}

fn entry(name: &str, positions: &[u32]) -> (String, Vec<u32>) {
    (name.to_string(), positions.to_vec())
}

#[rstest]
fn test_end_to_end_scenario() {
    let mut data = Dataset::new();
    data.region("G1", 500, 2500);
    let g2 = data.region("G2", 1800, 3000);
    data.group("P1", &[g2]);

    let l1 = data.locus(1000, 0.02, 1);
    let l2 = data.locus(2000, 0.01, 1);
    let l3 = data.locus(5_000_000, 0.03, 1);

    let mut cfg = config(100, 1);
    cfg.binning.maf_cutoff = 0.05;
    cfg.binning.intergenic_bin_width = 50_000;
    let manager = data.build(&cfg);

    assert_eq!(
        data.summary(&manager),
        vec![
            entry("P1", &[2000]),
            entry("G1", &[1000, 2000]),
            entry("chr1:100", &[5_000_000]),
        ]
    );

    assert_eq!(manager.bins_of(l1).count(), 1);
    let l2_bins: Vec<&str> = manager.bins_of(l2).map(|b| b.name()).collect();
    assert_eq!(l2_bins, vec!["P1", "G1"]);
    assert_eq!(manager.intergenic_bin(chr1(), 100).unwrap().num_loci(), 1);
    assert!(manager.region_bin(g2).is_none());
    assert_eq!(manager.rare_loci().len(), 3);
    assert!(manager.bins_of(l3).all(|b| b.is_intergenic()));
}

#[rstest]
fn test_intergenic_windows_partition_loci() {
    let mut data = Dataset::new();
    let a = data.locus(10, 0.01, 1);
    let b = data.locus(49_999, 0.01, 1);
    let c = data.locus(50_000, 0.01, 1);

    let manager = data.build(&config(50, 1));

    assert_eq!(
        data.summary(&manager),
        vec![entry("chr1:0", &[10, 49_999]), entry("chr1:1", &[50_000])]
    );
    for locus in [a, b, c] {
        assert_eq!(manager.bins_of(locus).count(), 1);
    }
}

#[rstest]
fn test_locus_in_two_groups_counts_in_both() {
    let mut data = Dataset::new();
    let gene = data.region("GENE", 100, 200);
    data.group("PATH_A", &[gene]);
    data.group("PATH_B", &[gene]);
    let locus = data.locus(150, 0.01, 1);

    let manager = data.build(&config(50, 1));

    assert_eq!(
        data.summary(&manager),
        vec![entry("PATH_A", &[150]), entry("PATH_B", &[150])]
    );
    assert_eq!(manager.bins_of(locus).count(), 2);
}

#[rstest]
fn test_oversized_group_collapses_to_regions() {
    let mut data = Dataset::new();
    let g1 = data.region("G1", 100, 200);
    let g2 = data.region("G2", 300, 400);
    let g3 = data.region("G3", 500, 600);
    data.group("BIG", &[g1, g2, g3]);
    let small = data.region("G4", 1000, 1100);
    data.group("SMALL", &[small]);

    data.locus(150, 0.01, 3);
    data.locus(160, 0.01, 3);
    data.locus(350, 0.01, 3);
    data.locus(1050, 0.01, 1);

    // BIG has size 9, SMALL has size 1
    let manager = data.build(&config(5, 1));

    assert_eq!(
        data.summary(&manager),
        vec![
            entry("SMALL", &[1050]),
            entry("G1", &[150, 160]),
            entry("G2", &[350]),
        ]
    );
    assert!(manager.region_bin(g3).is_none());
}

#[rstest]
fn test_collapse_reaches_regions_of_child_groups() {
    let mut data = Dataset::new();
    let ra = data.region("RA", 100, 200);
    let rb = data.region("RB", 150, 170);
    let idle = data.region("IDLE", 900, 1000);
    let other = data.region("OTHER", 180, 300);
    let parent = data.group("PARENT", &[ra]);
    let child = data.group("CHILD", &[rb, idle]);
    data.group("ELSEWHERE", &[other]);
    data.kb.add_relationship(parent, child);

    data.locus(160, 0.01, 3);
    data.locus(190, 0.01, 3);

    // PARENT holds both loci (size 6), CHILD and ELSEWHERE one each (size 3)
    let manager = data.build(&config(5, 1));

    assert_eq!(
        data.summary(&manager),
        vec![
            entry("CHILD", &[160]),
            entry("ELSEWHERE", &[190]),
            entry("RA", &[160, 190]),
            entry("RB", &[160]),
        ]
    );
    assert!(manager.group_bin(parent).is_none());
    assert!(manager.region_bin(idle).is_none());
    assert!(manager.region_bin(other).is_none());
}

#[rstest]
fn test_collapse_terminates_on_group_cycle() {
    let mut data = Dataset::new();
    let r1 = data.region("R1", 100, 200);
    let r2 = data.region("R2", 300, 400);
    let a = data.group("A", &[r1]);
    let b = data.group("B", &[r2]);
    data.kb.add_relationship(a, b);
    data.kb.add_relationship(b, a);
    data.kb.add_relationship(a, a);

    data.locus(150, 0.01, 2);
    data.locus(170, 0.01, 2);
    data.locus(350, 0.01, 2);

    let manager = data.build(&config(1, 1));

    assert_eq!(
        data.summary(&manager),
        vec![entry("R1", &[150, 170]), entry("R2", &[350])]
    );
}

#[rstest]
#[case(3, vec![entry("KEEP", &[500, 510, 520])])]
#[case(2, vec![entry("DROP", &[100, 110]), entry("KEEP", &[500, 510, 520])])]
#[case(4, vec![])]
#[case(1, vec![entry("DROP", &[100, 110]), entry("KEEP", &[500, 510, 520])])]
fn test_prune_threshold(#[case] min_size: u32, #[case] expected: Vec<(String, Vec<u32>)>) {
    let mut data = Dataset::new();
    let r1 = data.region("R1", 50, 150);
    let r2 = data.region("R2", 450, 550);
    data.group("DROP", &[r1]);
    data.group("KEEP", &[r2]);

    data.locus(100, 0.01, 1);
    data.locus(110, 0.01, 1);
    data.locus(500, 0.01, 1);
    data.locus(510, 0.01, 1);
    data.locus(520, 0.01, 1);

    let manager = data.build(&config(50, min_size));
    assert_eq!(data.summary(&manager), expected);
}

#[rstest]
fn test_variant_size_policy_ignores_genotypes() {
    let mut data = Dataset::new();
    let r1 = data.region("R1", 50, 150);
    data.group("P", &[r1]);
    data.locus(100, 0.01, 0);
    data.locus(110, 0.01, 0);

    let mut cfg = config(50, 1);
    let manager = data.build(&cfg);
    assert!(manager.is_empty());

    cfg.binning.size_policy = BinSizePolicy::Variants;
    let manager = data.build(&cfg);
    assert_eq!(data.summary(&manager), vec![entry("P", &[100, 110])]);
}

fn build_in_order(positions: &[u32]) -> Vec<(String, Vec<u32>)> {
    let mut data = Dataset::new();
    data.region("G1", 100, 300);
    let g2 = data.region("G2", 250, 400);
    let g3 = data.region("G3", 900, 950);
    data.group("P1", &[g2, g3]);
    data.group("P2", &[g3]);

    for pos in positions {
        data.locus(*pos, 0.01, 1);
    }
    let manager = data.build(&config(2, 1));
    data.summary(&manager)
}

#[rstest]
fn test_bin_construction_is_deterministic() {
    let forward = build_in_order(&[120, 260, 280, 920, 80_000, 200_000]);
    let backward = build_in_order(&[200_000, 80_000, 920, 280, 260, 120]);

    assert_eq!(forward, backward);
    assert_eq!(
        forward,
        vec![
            entry("P2", &[920]),
            entry("G1", &[120, 260, 280]),
            entry("G2", &[260, 280]),
            entry("G3", &[920]),
            entry("chr1:1", &[80_000]),
            entry("chr1:4", &[200_000]),
        ]
    );
}
