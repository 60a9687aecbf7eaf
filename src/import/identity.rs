use std::collections::BTreeMap;

use super::table_order::TableKind;

/// Original primary key → destination primary key for one table.
///
/// Keys are preserved 1:1 in this design, so the map degenerates to set
/// membership, but the mapping API stays so a remapping strategy can replace
/// it without touching callers.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    map: BTreeMap<i64, i64>,
}

impl IdentityMap {
    pub fn insert(&mut self, original: i64, destination: i64) {
        self.map.insert(original, destination);
    }

    pub fn resolve(&self, original: i64) -> Option<i64> {
        self.map.get(&original).copied()
    }

    pub fn contains(&self, original: i64) -> bool {
        self.map.contains_key(&original)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Optional substitute parent IDs for the 0 "no parent" sentinel, one per
/// parent table. All disabled by default; enabling one is an explicit
/// operator decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanFallbacks {
    pub breed: Option<i64>,
    pub customer: Option<i64>,
    pub animal: Option<i64>,
}

/// Outcome of resolving one declared parent reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Parent accepted earlier in the run; the id to store.
    Resolved(i64),
    /// The 0 sentinel was substituted with a configured fallback.
    Fallback { id: i64, note: String },
    /// Parent missing from the accepted set; the record must be skipped.
    Orphaned { reason: String },
}

/// Cross-table state: which original IDs each parent table accepted so far.
///
/// Read-only once handed to a dependent table's validator; the orchestrator
/// is the only writer.
#[derive(Debug, Default)]
pub struct AcceptedIds {
    tables: BTreeMap<TableKind, IdentityMap>,
}

impl AcceptedIds {
    pub fn table(&self, table: TableKind) -> Option<&IdentityMap> {
        self.tables.get(&table)
    }

    pub fn table_mut(&mut self, table: TableKind) -> &mut IdentityMap {
        self.tables.entry(table).or_default()
    }

    /// Resolve a child's declared parent id against the parent's accepted set.
    ///
    /// The 0 sentinel ("no parent") is orphaned unless the operator supplied
    /// a fallback id, and the fallback itself must have been accepted.
    pub fn check_parent(&self, parent: TableKind, id: i64, fallback: Option<i64>) -> ParentRef {
        if id == 0 {
            if let Some(fallback_id) = fallback {
                if self.contains(parent, fallback_id) {
                    return ParentRef::Fallback {
                        id: fallback_id,
                        note: format!(
                            "missing {} reference defaulted to {fallback_id}",
                            parent.label()
                        ),
                    };
                }
            }
            return ParentRef::Orphaned {
                reason: format!("Orphaned: {} {id} not found", parent.label()),
            };
        }
        match self.table(parent).and_then(|map| map.resolve(id)) {
            Some(destination) => ParentRef::Resolved(destination),
            None => ParentRef::Orphaned {
                reason: format!("Orphaned: {} {id} not found", parent.label()),
            },
        }
    }

    fn contains(&self, table: TableKind, id: i64) -> bool {
        self.table(table).is_some_and(|map| map.contains(id))
    }
}
