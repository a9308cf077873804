//! 系統樹構築のベンチマーク
//!
//! 擬似乱数で生成した配列の集合から、UPGMAによる系統樹の構築速度を計測します。

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lexitree::phylo::{PhyloTree, Species};

/// 線形合同法で再現可能な塩基配列を生成する
fn random_species(num_species: usize, len: usize) -> Vec<Species> {
    const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..num_species)
        .map(|i| {
            let seq: String = (0..len)
                .map(|_| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    BASES[(state >> 62) as usize]
                })
                .collect();
            Species::new(format!("S{i:03}"), &seq)
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("UPGMA");
    group.sample_size(20);

    for num_species in [16, 64] {
        let species = random_species(num_species, 200);
        group.bench_function(BenchmarkId::new("Build", num_species), |b| {
            b.iter_with_setup(
                || species.clone(),
                |species| PhyloTree::new(black_box(species), 20).unwrap(),
            );
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
