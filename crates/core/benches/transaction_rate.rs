// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use labwired_core::catalog::{AddressMap, Register, SpiInstance, SpiReg};
use labwired_core::scenario;
use labwired_core::sequencer::{BenchSettings, Sequencer};
use labwired_core::sim::ReferenceDut;
use labwired_core::wishbone::WishboneMaster;

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
        .sample_size(30)
}

fn bench_transactions(c: &mut Criterion) {
    let map = AddressMap::default();
    let pr = map.resolve(Register::Spi(SpiInstance::Spi1, SpiReg::Prescaler));
    let master = WishboneMaster::default();

    let mut group = c.benchmark_group("wishbone");
    group.throughput(Throughput::Elements(2));
    group.bench_function("write_read", |b| {
        let mut dut = ReferenceDut::new();
        dut.release_reset();
        let mut value = 0u32;
        b.iter(|| {
            value = value.wrapping_add(1);
            master.write(&mut dut, pr, black_box(value)).ok();
            black_box(master.read(&mut dut, pr).ok());
        });
    });
    group.finish();
}

fn bench_reference_scenario(c: &mut Criterion) {
    let map = AddressMap::default();
    c.bench_function("reference_scenario", |b| {
        b.iter(|| {
            let mut dut = ReferenceDut::with_map(&map, 10);
            let seq = Sequencer::new("bench", BenchSettings::default(), scenario::reference(&map));
            black_box(seq.run(&mut dut).passed())
        });
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_transactions, bench_reference_scenario
}
criterion_main!(benches);
