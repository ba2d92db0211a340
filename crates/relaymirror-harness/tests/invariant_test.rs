//! Invariants under seeded traffic with non-default configurations.

use relaymirror_client::ClientConfig;
use relaymirror_core::{NicklistMode, ReconcilerConfig};
use relaymirror_harness::{Driver, InvariantRegistry, Scenario};

fn config(max_lines: usize, nicklist_mode: NicklistMode) -> ClientConfig {
    ClientConfig {
        reconciler: ReconcilerConfig {
            max_lines_per_buffer: Some(max_lines),
            nicklist_mode,
            ..ReconcilerConfig::default()
        },
        clear_on_disconnect: false,
        echo_all: true,
    }
}

#[test]
fn line_cap_holds_across_seeds() {
    let registry = InvariantRegistry::standard();
    for seed in 0..32 {
        let mut driver = Driver::new(config(3, NicklistMode::Replace));
        for op in Scenario::generate(seed, 200) {
            driver.apply(&op);
            if let Err(violations) = registry.check_all(&driver.snapshot()) {
                panic!("seed {seed}, after {op:?}: {violations:?}");
            }
        }
    }
}

#[test]
fn additive_nicklists_keep_structure() {
    let registry = InvariantRegistry::standard();
    for seed in 100..116 {
        let mut driver = Driver::new(config(50, NicklistMode::Additive));
        for op in Scenario::generate(seed, 150) {
            driver.apply(&op);
        }
        assert!(registry.check_all(&driver.snapshot()).is_ok(), "seed {seed}");
    }
}
