pub mod config;
pub mod error;
pub mod general;
pub mod ignore_list;
pub mod io;
pub mod log_scanner;
pub mod presenter;
pub mod registry;
pub mod remote;

pub use config::DebuggerConfig;
pub use error::{DebuggerError, Result};
pub use ignore_list::IgnoreList;
pub use presenter::{Presenter, TableView, TickSummary};
pub use registry::{ParameterRegistry, ParameterValue};
