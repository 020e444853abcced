//! Benchmarks a few everyday operations.
//!
//! ```text
//! cargo run --release --example vec_push -- --output_format=text
//! cargo run --release --example vec_push -- --output_file=results.txt
//! ```

use cyclebench::prelude::*;
use std::collections::HashMap;
use std::hint::black_box;

fn bm_vec_push(b: &mut Bencher) {
    let mut v = Vec::new();
    while b.advance() {
        v.push(black_box(10u32));
    }
}
register_bench!(bm_vec_push);

fn bm_vec_push_reserved(b: &mut Bencher) {
    let mut v = Vec::with_capacity(b.min_iterations() as usize + 1);
    while b.advance() {
        v.push(black_box(10u32));
    }
}
register_bench!(bm_vec_push_reserved);

fn bm_hashmap_insert(b: &mut Bencher) {
    let mut map = HashMap::new();
    let mut key = 0u64;
    b.iter(|| {
        key += 1;
        map.insert(key, key * 2)
    });
}
register_bench!(bm_hashmap_insert);

fn bm_sort_small(b: &mut Bencher) {
    b.iter_with_setup(
        || (0..64u32).rev().collect::<Vec<_>>(),
        |mut v| {
            v.sort_unstable();
            v
        },
    );
}
register_bench!(bm_sort_small, "bm_sort_64");

cyclebench::main!();
