pub mod connection;
pub mod dispatcher;

pub use connection::{ConnectionSettings, MessageSource};
pub use dispatcher::{Dispatcher, MessageEvent};
