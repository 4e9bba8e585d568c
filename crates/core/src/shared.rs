//! Hot-swappable registry handle.
//!
//! A [`Registry`] is never mutated after it is built. When content changes, a brand new
//! registry is built off to the side and then published with a single atomic pointer swap, so
//! readers only ever see a complete registry, old or new.

use crate::config::CoreConfig;
use crate::error::RegistryResult;
use crate::registry::Registry;
use arc_swap::ArcSwap;
use std::sync::Arc;

#[derive(Debug)]
pub struct SharedRegistry {
    current: ArcSwap<Registry>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// The currently published registry. The snapshot stays valid after a swap.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Publish `registry`, replacing the current one.
    pub fn replace(&self, registry: Registry) {
        self.current.store(Arc::new(registry));
    }

    /// Rebuild from the configured corpus and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the load or build error, or [`crate::RegistryError::WarningsNotAllowed`] when
    /// the rebuilt registry fails the warning gate. The previously published registry stays in
    /// place.
    pub fn reload(&self, config: &CoreConfig) -> RegistryResult<Arc<Registry>> {
        let rebuilt = Registry::load(config)
            .and_then(|registry| registry.check_warning_gate(config).map(|()| registry));
        match rebuilt {
            Ok(registry) => {
                let registry = Arc::new(registry);
                self.current.store(Arc::clone(&registry));
                tracing::info!(records = registry.len(), "registry reloaded");
                Ok(registry)
            }
            Err(err) => {
                tracing::warn!(error = %err, "registry reload failed, keeping previous registry");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::source::IngestedRecord;
    use crate::test_support::condition;
    use tempfile::TempDir;

    fn registry(ids: &[&str]) -> Registry {
        let records = IngestedRecord::batch(ids.iter().map(|id| condition(id)), "thyroid");
        Registry::build(records).expect("build")
    }

    const RECORD: &str = "id: thyroid-storm\ntype: condition\nname: Thyroid storm\nlevels:\n  1:\n    level: 1\n    summary: Severe thyrotoxicosis.\n    explanation: A life threatening surge of thyroid hormone.\n    keyTerms:\n      - term: Thyroxine\n        definition: The main thyroid hormone.\ncreatedAt: 2026-02-05\nupdatedAt: 2026-02-05\nversion: 1\nstatus: published\n";

    #[test]
    fn snapshots_survive_replacement() {
        let shared = SharedRegistry::new(registry(&["thyroid-goiter"]));
        let before = shared.snapshot();

        shared.replace(registry(&["thyroid-goiter", "thyroid-storm"]));

        assert_eq!(before.len(), 1);
        assert_eq!(shared.snapshot().len(), 2);
    }

    #[test]
    fn reload_swaps_only_on_success() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("thyroid");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("storm.yaml"), RECORD).expect("write");
        let config = CoreConfig::new(temp.path().to_path_buf(), false).expect("config");

        let shared = SharedRegistry::new(registry(&["thyroid-goiter"]));
        let reloaded = shared.reload(&config).expect("reload");
        assert!(reloaded.get_by_id("thyroid-storm").is_ok());
        assert!(shared.snapshot().get_by_id("thyroid-goiter").is_err());

        std::fs::write(dir.join("storm-copy.yaml"), RECORD).expect("write duplicate");
        let err = shared.reload(&config).expect_err("duplicate id");
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
        assert!(shared.snapshot().get_by_id("thyroid-storm").is_ok());
    }

    #[test]
    fn reload_with_warnings_is_refused_when_gated() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("thyroid");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(
            dir.join("storm.yaml"),
            RECORD.replace("updatedAt: 2026-02-05", "updatedAt: 2026-01-05"),
        )
        .expect("write");

        let shared = SharedRegistry::new(registry(&["thyroid-goiter"]));
        let gated = CoreConfig::new(temp.path().to_path_buf(), true).expect("config");
        let err = shared.reload(&gated).expect_err("warnings are gated");
        assert!(matches!(err, RegistryError::WarningsNotAllowed { warnings: 1 }));
        assert!(shared.snapshot().get_by_id("thyroid-goiter").is_ok());

        let open = CoreConfig::new(temp.path().to_path_buf(), false).expect("config");
        let reloaded = shared.reload(&open).expect("warnings allowed");
        assert!(reloaded.get_by_id("thyroid-storm").is_ok());
    }

    #[test]
    fn shared_registry_is_shareable_across_threads() {
        let shared = Arc::new(SharedRegistry::new(registry(&["thyroid-goiter"])));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || shared.snapshot().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("reader thread"), 1);
        }
    }
}
