//! Ordered row storage shared by the terminal and window front ends.

use crate::presenter::TableView;
use crate::registry::ParameterValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: RowId,
    pub address: String,
    pub value: ParameterValue,
}

/// Rows in display order plus a dirty flag for redraw-on-change views.
#[derive(Debug, Default)]
pub struct RowTable {
    rows: Vec<TableRow>,
    next_id: u64,
    dirty: bool,
}

impl RowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, address: &str) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.address == address)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }
}

impl TableView for RowTable {
    type Row = RowId;

    fn insert_row(&mut self, index: usize, address: &str, value: &ParameterValue) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        let index = index.min(self.rows.len());
        self.rows.insert(
            index,
            TableRow {
                id,
                address: address.to_string(),
                value: value.clone(),
            },
        );
        self.dirty = true;
        id
    }

    fn update_row(&mut self, row: &RowId, value: &ParameterValue) {
        if let Some(pos) = self.position(*row) {
            self.rows[pos].value = value.clone();
            self.dirty = true;
        }
    }

    fn remove_row(&mut self, row: RowId) {
        if let Some(pos) = self.position(row) {
            self.rows.remove(pos);
            self.dirty = true;
        }
    }
}
