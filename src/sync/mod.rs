//! External sync tool invocation.

pub mod command;
pub mod invoker;

pub use command::SyncCommand;
pub use invoker::{RsyncInvoker, SyncInvoker, SyncReport};
