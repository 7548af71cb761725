use std::collections::BTreeSet;

use proptest::prelude::*;

use vrc_osc_debugger::io::RowTable;
use vrc_osc_debugger::{IgnoreList, ParameterRegistry, ParameterValue, Presenter, TableView};

/// Records every view operation so tests can check churn as well as state.
#[derive(Default)]
struct RecordingView {
    rows: Vec<(u32, String, ParameterValue)>,
    next_id: u32,
    ops: Vec<String>,
}

impl RecordingView {
    fn addresses(&self) -> Vec<&str> {
        self.rows.iter().map(|(_, address, _)| address.as_str()).collect()
    }

    fn value(&self, address: &str) -> Option<&ParameterValue> {
        self.rows
            .iter()
            .find(|(_, a, _)| a == address)
            .map(|(_, _, value)| value)
    }

    fn take_ops(&mut self) -> Vec<String> {
        std::mem::take(&mut self.ops)
    }
}

impl TableView for RecordingView {
    type Row = u32;

    fn insert_row(&mut self, index: usize, address: &str, value: &ParameterValue) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(index, (id, address.to_string(), value.clone()));
        self.ops.push(format!("insert {} {}", address, value));
        id
    }

    fn update_row(&mut self, row: &u32, value: &ParameterValue) {
        let entry = self
            .rows
            .iter_mut()
            .find(|(id, _, _)| id == row)
            .expect("update of unknown row");
        entry.2 = value.clone();
        self.ops.push(format!("update {} {}", entry.1, value));
    }

    fn remove_row(&mut self, row: u32) {
        let pos = self
            .rows
            .iter()
            .position(|(id, _, _)| *id == row)
            .expect("remove of unknown row");
        let (_, address, _) = self.rows.remove(pos);
        self.ops.push(format!("remove {}", address));
    }
}

const HUE: &str = "/avatar/parameters/Hue";

fn setup() -> (tempfile::TempDir, Presenter<RecordingView>) {
    let dir = tempfile::tempdir().unwrap();
    let ignore = IgnoreList::load(dir.path().join("ignored_params.txt"));
    let presenter = Presenter::new(ParameterRegistry::new(), ignore, RecordingView::default());
    (dir, presenter)
}

#[test]
fn value_update_reuses_the_row() {
    let (_dir, mut presenter) = setup();
    presenter.registry().record(HUE, ParameterValue::Float(0.5));
    presenter.tick();
    assert_eq!(presenter.view().addresses(), vec![HUE]);
    assert_eq!(presenter.view().value(HUE), Some(&ParameterValue::Float(0.5)));

    presenter.registry().record(HUE, ParameterValue::Float(0.9));
    presenter.tick();
    assert_eq!(presenter.view().addresses(), vec![HUE]);
    assert_eq!(presenter.view().value(HUE), Some(&ParameterValue::Float(0.9)));
    assert_eq!(
        presenter.view_mut().take_ops(),
        vec![format!("insert {} 0.5", HUE), format!("update {} 0.9", HUE)]
    );
}

#[test]
fn rows_are_sorted_and_existing_rows_keep_position() {
    let (_dir, mut presenter) = setup();
    presenter.registry().record("/c", ParameterValue::Int(3));
    presenter.registry().record("/a", ParameterValue::Int(1));
    presenter.tick();
    presenter.registry().record("/b", ParameterValue::Int(2));
    presenter.registry().record("/d", ParameterValue::Int(4));
    presenter.tick();
    assert_eq!(presenter.view().addresses(), vec!["/a", "/b", "/c", "/d"]);
}

#[test]
fn ignore_removes_row_immediately_and_keeps_it_hidden() {
    let (_dir, mut presenter) = setup();
    presenter.registry().record(HUE, ParameterValue::Float(0.5));
    presenter.tick();
    presenter.view_mut().take_ops();

    presenter.ignore(HUE).unwrap();
    assert!(presenter.view().addresses().is_empty());
    assert_eq!(presenter.view_mut().take_ops(), vec![format!("remove {}", HUE)]);

    // Values keep arriving for the ignored address.
    presenter.registry().record(HUE, ParameterValue::Float(0.7));
    presenter.tick();
    presenter.registry().record(HUE, ParameterValue::Float(0.8));
    presenter.tick();
    assert!(presenter.view_mut().take_ops().is_empty());
    assert_eq!(presenter.registry().get(HUE), Some(ParameterValue::Float(0.8)));

    presenter.unignore(HUE).unwrap();
    presenter.tick();
    assert_eq!(presenter.view().addresses(), vec![HUE]);
    assert_eq!(presenter.view().value(HUE), Some(&ParameterValue::Float(0.8)));
}

#[test]
fn unignore_of_unrecorded_address_shows_nothing() {
    let (_dir, mut presenter) = setup();
    presenter.ignore("/never/seen").unwrap();
    presenter.unignore("/never/seen").unwrap();
    presenter.tick();
    assert!(presenter.view().addresses().is_empty());
}

#[test]
fn clear_keeps_ignored_addresses_ignored() {
    let (dir, mut presenter) = setup();
    presenter.registry().record("/a", ParameterValue::Int(1));
    presenter.registry().record(HUE, ParameterValue::Float(0.5));
    presenter.tick();
    presenter.ignore(HUE).unwrap();

    presenter.clear();
    assert!(presenter.view().addresses().is_empty());
    assert!(presenter.registry().is_empty());
    assert!(presenter.ignore_list().contains(HUE));

    presenter.registry().record(HUE, ParameterValue::Float(0.1));
    presenter.registry().record("/a", ParameterValue::Int(2));
    presenter.tick();
    assert_eq!(presenter.view().addresses(), vec!["/a"]);

    let reloaded = IgnoreList::load(dir.path().join("ignored_params.txt"));
    assert!(reloaded.contains(HUE));
}

#[test]
fn ignore_list_loaded_at_startup_filters_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ignored_params.txt");
    std::fs::write(&path, "/avatar/parameters/Viseme\n\n").unwrap();

    let registry = ParameterRegistry::new();
    let mut presenter = Presenter::new(registry.clone(), IgnoreList::load(&path), RowTable::new());
    registry.record("/avatar/parameters/Viseme", ParameterValue::Int(3));
    registry.record(HUE, ParameterValue::Float(0.2));
    presenter.tick();

    let rows: Vec<_> = presenter
        .view()
        .rows()
        .iter()
        .map(|row| row.address.as_str())
        .collect();
    assert_eq!(rows, vec![HUE]);
}

#[test]
fn ignored_address_with_trailing_space_stays_ignored_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ignored_params.txt");
    let spaced = "/avatar/parameters/Hue ";

    let registry = ParameterRegistry::new();
    let mut presenter = Presenter::new(registry.clone(), IgnoreList::load(&path), RowTable::new());
    registry.record(spaced, ParameterValue::Int(1));
    presenter.tick();
    presenter.ignore(spaced).unwrap();
    drop(presenter);

    let registry = ParameterRegistry::new();
    let mut presenter = Presenter::new(registry.clone(), IgnoreList::load(&path), RowTable::new());
    registry.record(spaced, ParameterValue::Int(2));
    registry.record(HUE, ParameterValue::Int(3));
    presenter.tick();

    assert!(presenter.ignore_list().contains(spaced));
    assert!(!presenter.is_presented(spaced));
    assert!(presenter.is_presented(HUE));
}

#[test]
fn ignore_write_failure_is_reported_but_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("ignored_params.txt");
    let registry = ParameterRegistry::new();
    let mut presenter = Presenter::new(registry.clone(), IgnoreList::load(&path), RecordingView::default());
    registry.record(HUE, ParameterValue::Float(0.5));
    presenter.tick();

    assert!(presenter.ignore(HUE).is_err());
    assert!(presenter.view().addresses().is_empty());
    registry.record(HUE, ParameterValue::Float(0.6));
    presenter.tick();
    assert!(presenter.view().addresses().is_empty());
}

#[derive(Debug, Clone)]
enum Op {
    Record(u8, i64),
    RecordAbsent(u8),
    Ignore(u8),
    Unignore(u8),
    Clear,
    Tick,
}

fn address(n: u8) -> String {
    format!("/avatar/parameters/P{}", n % 8)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (any::<u8>(), -3i64..3).prop_map(|(a, v)| Op::Record(a, v)),
        1 => any::<u8>().prop_map(Op::RecordAbsent),
        2 => any::<u8>().prop_map(Op::Ignore),
        2 => any::<u8>().prop_map(Op::Unignore),
        1 => Just(Op::Clear),
        3 => Just(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn presented_rows_equal_registry_minus_ignored(ops in prop::collection::vec(op(), 0..60)) {
        let (_dir, mut presenter) = setup();
        for op in ops {
            match op {
                Op::Record(a, v) => presenter.registry().record(address(a), ParameterValue::Int(v)),
                Op::RecordAbsent(a) => presenter.registry().record(address(a), ParameterValue::Absent),
                Op::Ignore(a) => presenter.ignore(&address(a)).unwrap(),
                Op::Unignore(a) => presenter.unignore(&address(a)).unwrap(),
                Op::Clear => presenter.clear(),
                Op::Tick => { presenter.tick(); }
            }
        }
        presenter.tick();

        let snapshot = presenter.registry().snapshot();
        let expected: Vec<String> = snapshot
            .values
            .keys()
            .filter(|a| !presenter.ignore_list().contains(a))
            .cloned()
            .collect();
        let shown: Vec<String> = presenter.view().addresses().iter().map(|a| a.to_string()).collect();
        prop_assert_eq!(&shown, &expected);

        for a in &expected {
            prop_assert_eq!(presenter.view().value(a), snapshot.values.get(a));
        }

        // A second tick with nothing new changes nothing.
        presenter.view_mut().take_ops();
        prop_assert!(presenter.tick().is_empty());
        prop_assert!(presenter.view_mut().take_ops().is_empty());
    }

    #[test]
    fn ignore_list_round_trip(entries in prop::collection::vec("/[a-zA-Z0-9/_ ]{1,20}", 0..20)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignored_params.txt");
        let mut list = IgnoreList::load(&path);
        for entry in &entries {
            list.add(entry).unwrap();
        }
        let expected: BTreeSet<&str> = entries.iter().map(String::as_str).collect();
        let reloaded = IgnoreList::load(&path);
        prop_assert_eq!(reloaded.iter().collect::<BTreeSet<_>>(), expected);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        prop_assert_eq!(lines, sorted);
    }
}
