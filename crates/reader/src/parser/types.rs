//! Built-in table of unified-logging type labels for the Serial, Parallel,
//! CMS, G1, Shenandoah and ZGC collectors.

use std::collections::HashMap;
use once_cell::sync::Lazy;

use super::model::Concurrency::{Concurrent, StopTheWorld};
use super::model::GcPattern::{
    HeapMemoryPercentage, Memory, MemoryPause, MemoryPercentage, Pause, Region,
};
use super::model::{ExtendedType, GcType, LineError};
use super::traits::TypeClassifier;

// Stop-the-world collections
pub static PAUSE_YOUNG: GcType = GcType::new("Pause Young", StopTheWorld, MemoryPause);
pub static PAUSE_FULL: GcType = GcType::new("Pause Full", StopTheWorld, MemoryPause);
pub static PAUSE_INITIAL_MARK: GcType = GcType::new("Pause Initial Mark", StopTheWorld, MemoryPause);
pub static PAUSE_REMARK: GcType = GcType::new("Pause Remark", StopTheWorld, MemoryPause);
pub static PAUSE_MIXED: GcType = GcType::new("Pause Mixed", StopTheWorld, MemoryPause);
pub static PAUSE_CLEANUP: GcType = GcType::new("Pause Cleanup", StopTheWorld, MemoryPause);

// Concurrent cycles (CMS, G1)
pub static CONCURRENT_CYCLE: GcType = GcType::new("Concurrent Cycle", Concurrent, Pause);
pub static CONCURRENT_MARK_CYCLE: GcType = GcType::new("Concurrent Mark Cycle", Concurrent, Pause);
pub static CONCURRENT_UNDO_CYCLE: GcType = GcType::new("Concurrent Undo Cycle", Concurrent, Pause);
pub static CONCURRENT_MARK: GcType = GcType::new("Concurrent Mark", Concurrent, Pause);
pub static CONCURRENT_PRECLEAN: GcType = GcType::new("Concurrent Preclean", Concurrent, Pause);
pub static CONCURRENT_ABORTABLE_PRECLEAN: GcType =
    GcType::new("Concurrent Abortable Preclean", Concurrent, Pause);
pub static CONCURRENT_SWEEP: GcType = GcType::new("Concurrent Sweep", Concurrent, Pause);
pub static CONCURRENT_RESET: GcType = GcType::new("Concurrent Reset", Concurrent, Pause);
/// CMS old generation after a concurrent collection. Logged late, never merged.
pub static CMS_CONCURRENT_OLD: GcType = GcType::new("Old", Concurrent, Memory);

// Generations
pub static DEF_NEW: GcType = GcType::new("DefNew", StopTheWorld, Memory);
pub static TENURED: GcType = GcType::new("Tenured", StopTheWorld, Memory);
pub static PS_YOUNG_GEN: GcType = GcType::new("PSYoungGen", StopTheWorld, Memory);
pub static PAR_OLD_GEN: GcType = GcType::new("ParOldGen", StopTheWorld, Memory);
pub static PAR_NEW: GcType = GcType::new("ParNew", StopTheWorld, Memory);
pub static CMS: GcType = GcType::new("CMS", StopTheWorld, Memory);
pub static METASPACE: GcType = GcType::new("Metaspace", StopTheWorld, Memory);

// G1 region sets
pub static EDEN_REGIONS: GcType = GcType::new("Eden regions", StopTheWorld, Region);
pub static SURVIVOR_REGIONS: GcType = GcType::new("Survivor regions", StopTheWorld, Region);
pub static OLD_REGIONS: GcType = GcType::new("Old regions", StopTheWorld, Region);
pub static HUMONGOUS_REGIONS: GcType = GcType::new("Humongous regions", StopTheWorld, Region);
pub static ARCHIVE_REGIONS: GcType = GcType::new("Archive regions", StopTheWorld, Region);

// G1 young collection phases
pub static G1_PRE_EVACUATE: GcType = GcType::new("Pre Evacuate Collection Set", StopTheWorld, Pause);
pub static G1_EVACUATE: GcType = GcType::new("Evacuate Collection Set", StopTheWorld, Pause);
pub static G1_POST_EVACUATE: GcType = GcType::new("Post Evacuate Collection Set", StopTheWorld, Pause);
pub static G1_MERGE_HEAP_ROOTS: GcType = GcType::new("Merge Heap Roots", StopTheWorld, Pause);
pub static G1_PHASE_OTHER: GcType = GcType::new("Other", StopTheWorld, Pause);

// Full collection phases (Serial, G1)
pub static PHASE_MARK_LIVE: GcType = GcType::new("Phase 1: Mark live objects", StopTheWorld, Pause);
pub static PHASE_COMPUTE_ADDRESSES: GcType =
    GcType::new("Phase 2: Compute new object addresses", StopTheWorld, Pause);
pub static PHASE_PREPARE_COMPACTION: GcType =
    GcType::new("Phase 2: Prepare for compaction", StopTheWorld, Pause);
pub static PHASE_PREPARE_COMPACTION_SHORT: GcType =
    GcType::new("Phase 2: Prepare compaction", StopTheWorld, Pause);
pub static PHASE_ADJUST_POINTERS: GcType = GcType::new("Phase 3: Adjust pointers", StopTheWorld, Pause);
pub static PHASE_MOVE_OBJECTS: GcType = GcType::new("Phase 4: Move objects", StopTheWorld, Pause);
pub static PHASE_COMPACT_HEAP: GcType = GcType::new("Phase 4: Compact heap", StopTheWorld, Pause);

// Parallel full collection phases
pub static PARALLEL_MARKING: GcType = GcType::new("Marking Phase", StopTheWorld, Pause);
pub static PARALLEL_SUMMARY: GcType = GcType::new("Summary Phase", StopTheWorld, Pause);
pub static PARALLEL_ADJUST_ROOTS: GcType = GcType::new("Adjust Roots", StopTheWorld, Pause);
pub static PARALLEL_COMPACTION: GcType = GcType::new("Compaction Phase", StopTheWorld, Pause);
pub static PARALLEL_POST_COMPACT: GcType = GcType::new("Post Compact", StopTheWorld, Pause);

// Shenandoah
pub static SHEN_PAUSE_INIT_MARK: GcType = GcType::new("Pause Init Mark", StopTheWorld, Pause);
pub static SHEN_PAUSE_FINAL_MARK: GcType = GcType::new("Pause Final Mark", StopTheWorld, Pause);
pub static SHEN_PAUSE_INIT_UPDATE_REFS: GcType =
    GcType::new("Pause Init Update Refs", StopTheWorld, Pause);
pub static SHEN_PAUSE_FINAL_UPDATE_REFS: GcType =
    GcType::new("Pause Final Update Refs", StopTheWorld, Pause);
pub static SHEN_PAUSE_DEGENERATED: GcType =
    GcType::new("Pause Degenerated GC", StopTheWorld, MemoryPause);
pub static SHEN_CONCURRENT_MARKING: GcType = GcType::new("Concurrent marking", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_EVACUATION: GcType =
    GcType::new("Concurrent evacuation", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_UPDATE_REFS: GcType =
    GcType::new("Concurrent update references", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_RESET: GcType = GcType::new("Concurrent reset", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_CLEANUP: GcType = GcType::new("Concurrent cleanup", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_PRECLEANING: GcType =
    GcType::new("Concurrent precleaning", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_UNCOMMIT: GcType = GcType::new("Concurrent uncommit", Concurrent, MemoryPause);
pub static SHEN_CONCURRENT_RESET_BITMAPS: GcType =
    GcType::new("Concurrent reset bitmaps", Concurrent, MemoryPause);

// ZGC
pub static ZGC_GARBAGE_COLLECTION: GcType =
    GcType::new("Garbage Collection", StopTheWorld, MemoryPercentage);
pub static ZGC_PAUSE_MARK_START: GcType = GcType::new("Pause Mark Start", StopTheWorld, Pause);
pub static ZGC_PAUSE_MARK_END: GcType = GcType::new("Pause Mark End", StopTheWorld, Pause);
pub static ZGC_PAUSE_RELOCATE_START: GcType = GcType::new("Pause Relocate Start", StopTheWorld, Pause);
pub static ZGC_CONCURRENT_MARK_FREE: GcType = GcType::new("Concurrent Mark Free", Concurrent, Pause);
pub static ZGC_CONCURRENT_MARK_CONTINUE: GcType =
    GcType::new("Concurrent Mark Continue", Concurrent, Pause);
pub static ZGC_CONCURRENT_NONREF: GcType =
    GcType::new("Concurrent Process Non-Strong References", Concurrent, Pause);
pub static ZGC_CONCURRENT_RESET_RELOC_SET: GcType =
    GcType::new("Concurrent Reset Relocation Set", Concurrent, Pause);
pub static ZGC_CONCURRENT_SELECT_RELOC_SET: GcType =
    GcType::new("Concurrent Select Relocation Set", Concurrent, Pause);
pub static ZGC_CONCURRENT_PREPARE_RELOC_SET: GcType =
    GcType::new("Concurrent Prepare Relocation Set", Concurrent, Pause);
pub static ZGC_CONCURRENT_RELOCATE: GcType = GcType::new("Concurrent Relocate", Concurrent, Pause);
pub static ZGC_CONCURRENT_DESTROY_DETACHED_PAGES: GcType =
    GcType::new("Concurrent Destroy Detached Pages", Concurrent, Pause);
pub static ZGC_ALLOCATION_STALL: GcType = GcType::new("Allocation Stall", StopTheWorld, Pause);
pub static ZGC_RELOCATION_STALL: GcType = GcType::new("Relocation Stall", StopTheWorld, Pause);
/// `Capacity:` row of the ZGC heap table; only its first column is read.
pub static ZGC_HEAP_CAPACITY: GcType = GcType::new("Capacity", StopTheWorld, HeapMemoryPercentage);

// Safepoints
pub static APPLICATION_STOPPED_TIME: GcType =
    GcType::new("Total time for which application threads were stopped", StopTheWorld, Pause);

static BUILTIN: &[&GcType] = &[
    &PAUSE_YOUNG,
    &PAUSE_FULL,
    &PAUSE_INITIAL_MARK,
    &PAUSE_REMARK,
    &PAUSE_MIXED,
    &PAUSE_CLEANUP,
    &CONCURRENT_CYCLE,
    &CONCURRENT_MARK_CYCLE,
    &CONCURRENT_UNDO_CYCLE,
    &CONCURRENT_MARK,
    &CONCURRENT_PRECLEAN,
    &CONCURRENT_ABORTABLE_PRECLEAN,
    &CONCURRENT_SWEEP,
    &CONCURRENT_RESET,
    &CMS_CONCURRENT_OLD,
    &DEF_NEW,
    &TENURED,
    &PS_YOUNG_GEN,
    &PAR_OLD_GEN,
    &PAR_NEW,
    &CMS,
    &METASPACE,
    &EDEN_REGIONS,
    &SURVIVOR_REGIONS,
    &OLD_REGIONS,
    &HUMONGOUS_REGIONS,
    &ARCHIVE_REGIONS,
    &G1_PRE_EVACUATE,
    &G1_EVACUATE,
    &G1_POST_EVACUATE,
    &G1_MERGE_HEAP_ROOTS,
    &G1_PHASE_OTHER,
    &PHASE_MARK_LIVE,
    &PHASE_COMPUTE_ADDRESSES,
    &PHASE_PREPARE_COMPACTION,
    &PHASE_PREPARE_COMPACTION_SHORT,
    &PHASE_ADJUST_POINTERS,
    &PHASE_MOVE_OBJECTS,
    &PHASE_COMPACT_HEAP,
    &PARALLEL_MARKING,
    &PARALLEL_SUMMARY,
    &PARALLEL_ADJUST_ROOTS,
    &PARALLEL_COMPACTION,
    &PARALLEL_POST_COMPACT,
    &SHEN_PAUSE_INIT_MARK,
    &SHEN_PAUSE_FINAL_MARK,
    &SHEN_PAUSE_INIT_UPDATE_REFS,
    &SHEN_PAUSE_FINAL_UPDATE_REFS,
    &SHEN_PAUSE_DEGENERATED,
    &SHEN_CONCURRENT_MARKING,
    &SHEN_CONCURRENT_EVACUATION,
    &SHEN_CONCURRENT_UPDATE_REFS,
    &SHEN_CONCURRENT_RESET,
    &SHEN_CONCURRENT_CLEANUP,
    &SHEN_CONCURRENT_PRECLEANING,
    &SHEN_CONCURRENT_UNCOMMIT,
    &SHEN_CONCURRENT_RESET_BITMAPS,
    &ZGC_GARBAGE_COLLECTION,
    &ZGC_PAUSE_MARK_START,
    &ZGC_PAUSE_MARK_END,
    &ZGC_PAUSE_RELOCATE_START,
    &ZGC_CONCURRENT_MARK_FREE,
    &ZGC_CONCURRENT_MARK_CONTINUE,
    &ZGC_CONCURRENT_NONREF,
    &ZGC_CONCURRENT_RESET_RELOC_SET,
    &ZGC_CONCURRENT_SELECT_RELOC_SET,
    &ZGC_CONCURRENT_PREPARE_RELOC_SET,
    &ZGC_CONCURRENT_RELOCATE,
    &ZGC_CONCURRENT_DESTROY_DETACHED_PAGES,
    &ZGC_ALLOCATION_STALL,
    &ZGC_RELOCATION_STALL,
    &ZGC_HEAP_CAPACITY,
    &APPLICATION_STOPPED_TIME,
];

static BY_NAME: Lazy<HashMap<&'static str, &'static GcType>> =
    Lazy::new(|| BUILTIN.iter().map(|t| (t.name, *t)).collect());

/// Classifier backed by the built-in table.
///
/// A label resolves by exact name first. Failing that, the longest known
/// name that prefixes the label and is followed by a parenthesized
/// qualifier wins, so `Pause Young (Normal) (G1 Evacuation Pause)`
/// resolves to `Pause Young`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTypes;

impl BuiltinTypes {
    pub fn new() -> Self {
        Self
    }

    pub fn all() -> &'static [&'static GcType] {
        BUILTIN
    }

    fn lookup(label: &str) -> Option<&'static GcType> {
        if let Some(t) = BY_NAME.get(label) {
            return Some(*t);
        }
        BUILTIN
            .iter()
            .filter(|t| {
                label
                    .strip_prefix(t.name)
                    .map(|rest| rest.starts_with(" ("))
                    .unwrap_or(false)
            })
            .max_by_key(|t| t.name.len())
            .copied()
    }
}

/// Trim padding and a trailing `:` from a logged type label.
pub fn normalize_label(label: &str) -> &str {
    let label = label.trim();
    label.strip_suffix(':').map(str::trim_end).unwrap_or(label)
}

impl TypeClassifier for BuiltinTypes {
    fn classify(&self, label: &str) -> Result<ExtendedType, LineError> {
        let label = normalize_label(label);
        Self::lookup(label)
            .map(|gc_type| ExtendedType::new(label, gc_type))
            .ok_or_else(|| LineError::UnknownType(label.to_string()))
    }
}
