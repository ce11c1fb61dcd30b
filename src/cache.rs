// cache.rs — LRU cache over whole sampled grids
//
// Grid sampling is the expensive entry point, and callers (terrain
// preview, chunk regeneration) tend to re-request identical windows.
// Results are keyed by a hash of the graph revision plus every request
// parameter, and stored behind `Arc` so a hit is a reference-count bump,
// not a buffer clone. Any graph mutation bumps the revision, so stale
// grids can never be served.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::error::Result;
use crate::graph::{ModuleGraph, ModuleId};
use crate::mapping::{self, MapResult2, MapResult3, MappingRanges, SeamlessMode};

pub struct MapCache {
    grids: Mutex<LruCache<u64, Arc<MapResult2>>>,
    volumes: Mutex<LruCache<u64, Arc<MapResult3>>>,
}

impl MapCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        MapCache {
            grids: Mutex::new(LruCache::new(cap)),
            volumes: Mutex::new(LruCache::new(cap)),
        }
    }

    /// `map_2d` with memoization; `z: None` takes the flat sampling path.
    #[allow(clippy::too_many_arguments)]
    pub fn map_2d(
        &self,
        graph: &ModuleGraph,
        module: ModuleId,
        width: usize,
        height: usize,
        mode: SeamlessMode,
        ranges: &MappingRanges,
        z: Option<f64>,
    ) -> Result<Arc<MapResult2>> {
        let key = hash_2d_request(graph, module, width, height, mode, ranges, z);
        if let Some(hit) = self.grids.lock().unwrap().get(&key) {
            log::trace!("grid cache hit ({width}x{height}, {mode:?})");
            return Ok(hit.clone());
        }

        let result = Arc::new(match z {
            Some(z) => mapping::map_2d(graph, module, width, height, mode, ranges, z)?,
            None => mapping::map_2d_flat(graph, module, width, height, mode, ranges)?,
        });
        self.grids.lock().unwrap().put(key, result.clone());
        Ok(result)
    }

    /// `map_3d` with memoization.
    #[allow(clippy::too_many_arguments)]
    pub fn map_3d(
        &self,
        graph: &ModuleGraph,
        module: ModuleId,
        width: usize,
        height: usize,
        depth: usize,
        mode: SeamlessMode,
        ranges: &MappingRanges,
    ) -> Result<Arc<MapResult3>> {
        let key = hash_3d_request(graph, module, width, height, depth, mode, ranges);
        if let Some(hit) = self.volumes.lock().unwrap().get(&key) {
            return Ok(hit.clone());
        }

        let result = Arc::new(mapping::map_3d(
            graph, module, width, height, depth, mode, ranges,
        )?);
        self.volumes.lock().unwrap().put(key, result.clone());
        Ok(result)
    }

    pub fn clear(&self) {
        self.grids.lock().unwrap().clear();
        self.volumes.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.grids.lock().unwrap().len() + self.volumes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Request hashing ─────────────────────────────────────────────────

fn hash_ranges(hasher: &mut DefaultHasher, r: &MappingRanges) {
    for v in [
        r.map_x0, r.map_x1, r.map_y0, r.map_y1, r.map_z0, r.map_z1, r.loop_x0, r.loop_x1,
        r.loop_y0, r.loop_y1, r.loop_z0, r.loop_z1,
    ] {
        v.to_bits().hash(hasher);
    }
}

#[allow(clippy::too_many_arguments)]
fn hash_2d_request(
    graph: &ModuleGraph,
    module: ModuleId,
    width: usize,
    height: usize,
    mode: SeamlessMode,
    ranges: &MappingRanges,
    z: Option<f64>,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    // Discriminant so 2D and 3D requests never collide.
    "map2d".hash(&mut hasher);
    graph.revision().hash(&mut hasher);
    module.hash(&mut hasher);
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    mode.hash(&mut hasher);
    hash_ranges(&mut hasher, ranges);
    match z {
        Some(z) => {
            true.hash(&mut hasher);
            z.to_bits().hash(&mut hasher);
        }
        None => false.hash(&mut hasher),
    }
    hasher.finish()
}

fn hash_3d_request(
    graph: &ModuleGraph,
    module: ModuleId,
    width: usize,
    height: usize,
    depth: usize,
    mode: SeamlessMode,
    ranges: &MappingRanges,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    "map3d".hash(&mut hasher);
    graph.revision().hash(&mut hasher);
    module.hash(&mut hasher);
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    depth.hash(&mut hasher);
    mode.hash(&mut hasher);
    hash_ranges(&mut hasher, ranges);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ModuleGraph;

    #[test]
    fn repeat_request_returns_same_allocation() {
        let mut g = ModuleGraph::new();
        let c = g.constant(1.5);
        let cache = MapCache::new(4);
        let ranges = MappingRanges::default();

        let a = cache
            .map_2d(&g, c, 8, 8, SeamlessMode::None, &ranges, None)
            .unwrap();
        let b = cache
            .map_2d(&g, c, 8, 8, SeamlessMode::None, &ranges, None)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn graph_mutation_invalidates() {
        let mut g = ModuleGraph::new();
        let c = g.constant(1.5);
        let cache = MapCache::new(4);
        let ranges = MappingRanges::default();

        let a = cache
            .map_2d(&g, c, 4, 4, SeamlessMode::None, &ranges, None)
            .unwrap();
        g.set_constant_value(c, 2.5).unwrap();
        let b = cache
            .map_2d(&g, c, 4, 4, SeamlessMode::None, &ranges, None)
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.values[0], 2.5);
    }

    #[test]
    fn different_parameters_miss() {
        let mut g = ModuleGraph::new();
        let c = g.constant(1.0);
        let cache = MapCache::new(8);
        let ranges = MappingRanges::default();

        let a = cache
            .map_2d(&g, c, 4, 4, SeamlessMode::None, &ranges, None)
            .unwrap();
        let b = cache
            .map_2d(&g, c, 8, 4, SeamlessMode::None, &ranges, None)
            .unwrap();
        let d = cache
            .map_2d(&g, c, 4, 4, SeamlessMode::X, &ranges, None)
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &d));
    }

    #[test]
    fn lru_evicts_oldest() {
        let mut g = ModuleGraph::new();
        let c = g.constant(1.0);
        let cache = MapCache::new(2);
        let ranges = MappingRanges::default();

        let a = cache
            .map_2d(&g, c, 2, 2, SeamlessMode::None, &ranges, None)
            .unwrap();
        cache
            .map_2d(&g, c, 3, 3, SeamlessMode::None, &ranges, None)
            .unwrap();
        cache
            .map_2d(&g, c, 4, 4, SeamlessMode::None, &ranges, None)
            .unwrap();
        // The 2x2 entry has been evicted; re-requesting rebuilds it.
        let again = cache
            .map_2d(&g, c, 2, 2, SeamlessMode::None, &ranges, None)
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &again));
        assert_eq!(a.values, again.values);
    }

    #[test]
    fn clear_empties_both_stores() {
        let mut g = ModuleGraph::new();
        let c = g.constant(1.0);
        let cache = MapCache::new(4);
        let ranges = MappingRanges::default();

        cache
            .map_2d(&g, c, 2, 2, SeamlessMode::None, &ranges, None)
            .unwrap();
        cache
            .map_3d(&g, c, 2, 2, 2, SeamlessMode::None, &ranges)
            .unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
