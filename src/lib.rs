//! Interface table poller for SNMPv2c agents.
//!
//! [`InterfacePoller`] probes a device, walks the IF-MIB interface table with
//! GETBULK, adds VLAN and PoE data where the device exposes them, and returns
//! one [`InterfaceRecord`] per interface.

pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod snmp;

pub use collector::{FetchEvent, FetchHandle, FetchState, InterfacePoller, InterfaceRecord, Target};
pub use config::AppConfig;
pub use error::{FetchError, SnmpError};
pub use formatter::{InterfaceReport, JsonFormatter};
