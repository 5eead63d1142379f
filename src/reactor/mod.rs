pub(crate) mod core;

pub use self::core::{Config, Reactor, ReactorError, ReactorRef};
