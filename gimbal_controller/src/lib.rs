pub mod cli;
pub mod config;
pub mod controller;
pub mod keyboard;
pub mod logging;
pub mod sequencer;
pub mod session;
pub mod signals;

#[cfg(test)]
pub(crate) mod testing;
