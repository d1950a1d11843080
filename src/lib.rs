//! tsreplay - replay timestamped delimited records over TCP
//!
//! A record source is read pass by pass, filtered, forced into monotonic
//! timestamp order (dropping or repairing offenders), batched and written
//! to one TCP consumer at a target rate.

pub mod clean;
pub mod cli;
pub mod config;
pub mod filter;
pub mod observability;
pub mod ordering;
pub mod pacer;
pub mod replay;
pub mod server;
pub mod shutdown;
pub mod source;
pub mod timestamp;
