//! Replace row descriptions with canonical names from the master index.

use serde::Serialize;

use crate::cache::MasterDataIndex;
use crate::models::WbsRow;

/// Counts from one mapping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    /// Rows whose description was replaced
    pub mapped: usize,
    /// Rows with an identifier the index does not know
    pub unmapped: usize,
    /// Rows without an identifier
    pub without_id: usize,
}

/// Overwrite each row's description when its trimmed identifier is indexed.
///
/// Misses keep their existing description.
pub fn map_descriptions(rows: &mut [WbsRow], index: &MasterDataIndex) -> MappingStats {
    let mut stats = MappingStats::default();
    for row in rows.iter_mut() {
        let name = match row.trimmed_id() {
            Some(id) => index.lookup(id),
            None => {
                stats.without_id += 1;
                continue;
            }
        };
        match name {
            Some(name) => {
                row.description = name.to_string();
                stats.mapped += 1;
            }
            None => stats.unmapped += 1,
        }
    }
    stats
}
