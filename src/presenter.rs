//! Reconciles the registry and ignore list against the rows a view shows.
//!
//! After every [`Presenter::tick`] the presented addresses are exactly the
//! registry's addresses minus the ignored ones. Rows are created, updated
//! and removed incrementally; a row's value is only pushed to the view when
//! it actually changed.

use std::collections::BTreeMap;
use std::mem;
use std::ops::Bound;

use crate::error::Result;
use crate::ignore_list::IgnoreList;
use crate::registry::{ParameterRegistry, ParameterValue};

/// A two-column (parameter, value) table the presenter drives.
pub trait TableView {
    /// Opaque handle for one displayed row.
    type Row;

    /// Insert a row at `index` among the currently displayed rows.
    fn insert_row(&mut self, index: usize, address: &str, value: &ParameterValue) -> Self::Row;

    fn update_row(&mut self, row: &Self::Row, value: &ParameterValue);

    fn remove_row(&mut self, row: Self::Row);
}

struct PresentedRow<R> {
    handle: R,
    value: ParameterValue,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

impl TickSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.removed == 0
    }
}

pub struct Presenter<V: TableView> {
    registry: ParameterRegistry,
    ignore_list: IgnoreList,
    view: V,
    rows: BTreeMap<String, PresentedRow<V::Row>>,
    seen_revision: Option<u64>,
    ignore_changed: bool,
}

impl<V: TableView> Presenter<V> {
    pub fn new(registry: ParameterRegistry, ignore_list: IgnoreList, view: V) -> Self {
        Self {
            registry,
            ignore_list,
            view,
            rows: BTreeMap::new(),
            seen_revision: None,
            ignore_changed: false,
        }
    }

    /// One diff tick. Safe to call at any rate; without pending changes it
    /// touches nothing.
    pub fn tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();
        if self.seen_revision == Some(self.registry.revision()) && !self.ignore_changed {
            return summary;
        }
        let snapshot = self.registry.snapshot();

        let stale: Vec<String> = self
            .rows
            .keys()
            .filter(|address| {
                !snapshot.values.contains_key(*address) || self.ignore_list.contains(address)
            })
            .cloned()
            .collect();
        for address in stale {
            if let Some(row) = self.rows.remove(&address) {
                self.view.remove_row(row.handle);
                summary.removed += 1;
            }
        }

        for (address, value) in &snapshot.values {
            if self.ignore_list.contains(address) {
                continue;
            }
            match self.rows.get_mut(address) {
                Some(row) => {
                    if row.value != *value {
                        self.view.update_row(&row.handle, value);
                        row.value = value.clone();
                        summary.updated += 1;
                    }
                }
                None => {
                    let index = self
                        .rows
                        .range::<str, _>((Bound::Unbounded, Bound::Excluded(address.as_str())))
                        .count();
                    let handle = self.view.insert_row(index, address, value);
                    self.rows.insert(
                        address.clone(),
                        PresentedRow {
                            handle,
                            value: value.clone(),
                        },
                    );
                    summary.inserted += 1;
                }
            }
        }

        self.seen_revision = Some(snapshot.revision);
        self.ignore_changed = false;
        if !summary.is_empty() {
            log::trace!(
                "tick: +{} ~{} -{}",
                summary.inserted,
                summary.updated,
                summary.removed
            );
        }
        summary
    }

    /// Empty the registry and every displayed row. The ignore list is kept.
    pub fn clear(&mut self) {
        self.registry.clear();
        for (_, row) in mem::take(&mut self.rows) {
            self.view.remove_row(row.handle);
        }
        self.seen_revision = None;
    }

    /// Hide `address`, removing its row right away. Values keep being
    /// recorded; they are just not shown. A save failure is returned after
    /// the in-memory list and the view have been updated.
    pub fn ignore(&mut self, address: &str) -> Result<()> {
        let saved = self.ignore_list.add(address);
        if let Some(row) = self.rows.remove(address) {
            self.view.remove_row(row.handle);
        }
        self.ignore_changed = true;
        saved.map(|_| ())
    }

    /// Show `address` again from the next tick on, if it is still recorded.
    pub fn unignore(&mut self, address: &str) -> Result<()> {
        let saved = self.ignore_list.remove(address);
        self.ignore_changed = true;
        saved.map(|_| ())
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore_list
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn presented_len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_presented(&self, address: &str) -> bool {
        self.rows.contains_key(address)
    }
}
