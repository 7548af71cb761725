pub mod check;
pub mod stdin_handler;
