use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CcxXfer, DfXfer, DispatchError, SiliconGeneration, XferSource};
use crate::ccx::zen4::CcxXferZen4;
use crate::df::zen4::DfXferZen4;

#[derive(Clone, Default)]
struct GenerationTables {
    df: Option<Arc<dyn DfXfer>>,
    ccx: Option<Arc<dyn CcxXfer>>,
}

/// Operation tables keyed by silicon generation, with one active generation
///
/// Tables are registered up front; [`RevisionRegistry::install`] selects the
/// generation a boot pass runs against. Installing again swaps the active
/// tables; callers that already resolved a table keep their snapshot.
pub struct RevisionRegistry {
    tables: RwLock<HashMap<SiliconGeneration, GenerationTables>>,
    active: RwLock<Option<(SiliconGeneration, GenerationTables)>>,
}

impl RevisionRegistry {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
        }
    }

    /// Registry with every generation this crate ships tables for
    pub fn with_builtin_tables() -> Self {
        let registry = Self::new();
        registry.register(
            SiliconGeneration::Zen4,
            Some(Arc::new(DfXferZen4)),
            Some(Arc::new(CcxXferZen4)),
        );
        registry
    }

    /// Process-wide registry with the built-in tables, nothing installed
    pub fn global() -> &'static RevisionRegistry {
        static INSTANCE: Lazy<RevisionRegistry> = Lazy::new(RevisionRegistry::with_builtin_tables);
        &INSTANCE
    }

    /// Add or replace the tables of a generation
    ///
    /// Does not affect the active tables until the generation is installed again.
    pub fn register(
        &self,
        generation: SiliconGeneration,
        df: Option<Arc<dyn DfXfer>>,
        ccx: Option<Arc<dyn CcxXfer>>,
    ) {
        tracing::debug!(
            "Registering {} tables (df: {}, ccx: {})",
            generation,
            df.is_some(),
            ccx.is_some()
        );
        self.tables
            .write()
            .insert(generation, GenerationTables { df, ccx });
    }

    /// Select the active generation
    pub fn install(&self, generation: SiliconGeneration) {
        let tables = self
            .tables
            .read()
            .get(&generation)
            .cloned()
            .unwrap_or_default();

        let previous = self.active.write().replace((generation, tables));
        match previous {
            Some((old, _)) if old != generation => {
                tracing::info!("Switched silicon generation {} -> {}", old, generation)
            }
            Some(_) => tracing::debug!("Reinstalled {} tables", generation),
            None => tracing::info!("Installed {} tables", generation),
        }
    }

    pub fn installed(&self) -> Option<SiliconGeneration> {
        self.active.read().as_ref().map(|(generation, _)| *generation)
    }

    pub fn is_registered(&self, generation: SiliconGeneration) -> bool {
        self.tables.read().contains_key(&generation)
    }
}

impl Default for RevisionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl XferSource for RevisionRegistry {
    fn df_xfer(&self) -> Result<Arc<dyn DfXfer>, DispatchError> {
        let active = self.active.read();
        let (generation, tables) = active.as_ref().ok_or(DispatchError::NotInstalled)?;
        tables
            .df
            .as_ref()
            .map(Arc::clone)
            .ok_or(DispatchError::NoTable(*generation))
    }

    fn ccx_xfer(&self) -> Result<Arc<dyn CcxXfer>, DispatchError> {
        let active = self.active.read();
        let (generation, tables) = active.as_ref().ok_or(DispatchError::NotInstalled)?;
        tables
            .ccx
            .as_ref()
            .map(Arc::clone)
            .ok_or(DispatchError::NoTable(*generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TaggedDf(u32);

    impl DfXfer for TaggedDf {
        fn generation(&self) -> SiliconGeneration {
            SiliconGeneration::Zen4
        }

        fn number_of_dies_on_socket(&self, _socket: u32) -> crate::dispatch::OpResult<u32> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_resolution_before_install() {
        let registry = RevisionRegistry::with_builtin_tables();
        assert_eq!(
            registry.df_xfer().err(),
            Some(DispatchError::NotInstalled)
        );
        assert_eq!(
            registry.ccx_xfer().err(),
            Some(DispatchError::NotInstalled)
        );
    }

    #[test]
    fn test_generation_without_tables() {
        let registry = RevisionRegistry::with_builtin_tables();
        registry.install(SiliconGeneration::Zen5);

        assert_eq!(registry.installed(), Some(SiliconGeneration::Zen5));
        assert_eq!(
            registry.df_xfer().err(),
            Some(DispatchError::NoTable(SiliconGeneration::Zen5))
        );
    }

    #[test]
    fn test_builtin_zen4_tables() {
        let registry = RevisionRegistry::with_builtin_tables();
        registry.install(SiliconGeneration::Zen4);

        let df = registry.df_xfer().unwrap();
        let ccx = registry.ccx_xfer().unwrap();
        assert_eq!(df.generation(), SiliconGeneration::Zen4);
        assert_eq!(ccx.generation(), SiliconGeneration::Zen4);
    }

    #[test]
    fn test_reinstall_swaps_but_keeps_snapshots() {
        let registry = RevisionRegistry::new();
        registry.register(SiliconGeneration::Zen4, Some(Arc::new(TaggedDf(1))), None);
        registry.install(SiliconGeneration::Zen4);
        let before = registry.df_xfer().unwrap();

        registry.register(SiliconGeneration::Zen4, Some(Arc::new(TaggedDf(2))), None);
        // Registration alone does not change the active table
        assert_eq!(registry.df_xfer().unwrap().number_of_dies_on_socket(0), Ok(1));

        registry.install(SiliconGeneration::Zen4);
        assert_eq!(registry.df_xfer().unwrap().number_of_dies_on_socket(0), Ok(2));
        assert_eq!(before.number_of_dies_on_socket(0), Ok(1));
    }

    #[test]
    fn test_global_registry_is_singleton() {
        let a = RevisionRegistry::global();
        let b = RevisionRegistry::global();
        assert!(std::ptr::eq(a, b));
        assert!(a.is_registered(SiliconGeneration::Zen4));
        assert!(!a.is_registered(SiliconGeneration::Zen5));
    }
}
