//! Coverage resolution: set arithmetic between catalog identifiers and
//! linked identifiers. Pure; no I/O.
use std::collections::BTreeSet;

use crate::types::{CaseId, CoverageResult, LinkageMapping};

/// Compute covered, uncovered and dangling identifiers.
///
/// Identifiers are compared as strings, so `"1"` never covers `"001"`.
/// The result owns a copy of `linkage` for drill-down.
pub fn resolve(catalog: &BTreeSet<CaseId>, linkage: &LinkageMapping) -> CoverageResult {
    let linked = linkage.keys();

    return CoverageResult {
        catalog_size: catalog.len(),
        covered: catalog.intersection(&linked).cloned().collect(),
        dangling: linked.difference(catalog).cloned().collect(),
        linkage: linkage.clone(),
        uncovered: catalog.difference(&linked).cloned().collect(),
    };
}
