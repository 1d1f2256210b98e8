mod backend;
#[cfg(test)]
pub(crate) mod memory;
mod rest;
mod sync;

pub(crate) use backend::{BackendError, ChatRow, PlayerRow, SystemClock};
pub(crate) use rest::RestBackend;
pub(crate) use sync::{NetCompletion, NetSync};
