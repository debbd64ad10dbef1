//! Implementation of devices attachable to the serial port.
//!
//! These are virtual sinks for the bytes sent by the running
//! software, used for testing ([`buffer`]) and for interactive
//! console output ([`stdout`]).

pub mod buffer;
pub mod stdout;
