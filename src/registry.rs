//! Latest value per OSC parameter address.
//!
//! The registry is written by the OSC listener thread and read by whichever
//! thread owns the view. It is a cheap cloneable handle; every clone sees the
//! same map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rosc::OscType;

/// Scalar value of the first OSC argument, or `Absent` when the message had
/// no argument we can show.
#[derive(Debug, Clone, Default)]
pub enum ParameterValue {
    #[default]
    Absent,
    Int(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Text(String),
}

impl ParameterValue {
    pub fn from_osc(arg: Option<&OscType>) -> Self {
        match arg {
            Some(OscType::Int(v)) => Self::Int(i64::from(*v)),
            Some(OscType::Long(v)) => Self::Int(*v),
            Some(OscType::Float(v)) => Self::Float(*v),
            Some(OscType::Double(v)) => Self::Double(*v),
            Some(OscType::Bool(b)) => Self::Bool(*b),
            Some(OscType::String(s)) => Self::Text(s.clone()),
            Some(OscType::Char(c)) => Self::Text(c.to_string()),
            // blobs, arrays, nil, timetags, colors, midi
            Some(_) | None => Self::Absent,
        }
    }
}

// Floats compare by bit pattern so a NaN parameter does not look changed on every tick.
impl PartialEq for ParameterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("None"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Double(v) => write!(f, "{:?}", v),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    values: BTreeMap<String, ParameterValue>,
    revision: u64,
}

/// Copy of the registry taken under the lock.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub revision: u64,
    pub values: BTreeMap<String, ParameterValue>,
}

#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    state: Arc<Mutex<RegistryState>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    pub fn new() -> Self {
        // One slot: a pending wake-up already covers every later write.
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            wake_tx,
            wake_rx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upsert `address -> value` and wake the presenter.
    pub fn record(&self, address: impl Into<String>, value: ParameterValue) {
        {
            let mut state = self.lock();
            state.values.insert(address.into(), value);
            state.revision = state.revision.wrapping_add(1);
        }
        self.notify();
    }

    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.values.clear();
            state.revision = state.revision.wrapping_add(1);
        }
        self.notify();
    }

    fn notify(&self) {
        let _ = self.wake_tx.try_send(());
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.lock();
        RegistrySnapshot {
            revision: state.revision,
            values: state.values.clone(),
        }
    }

    pub fn get(&self, address: &str) -> Option<ParameterValue> {
        self.lock().values.get(address).cloned()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.lock().values.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Receiver that yields once after one or more writes. Use it in a
    /// `crossbeam_channel::select!` next to other event sources.
    pub fn changes(&self) -> &Receiver<()> {
        &self.wake_rx
    }

    /// Block until the registry changes or `timeout` elapses.
    /// Returns `true` if a change was signalled.
    pub fn wait_for_change(&self, timeout: Duration) -> bool {
        match self.wake_rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}
