//! Hardware connectivity model.
//!
//! A [`ConnectivityGraph`] holds the physical qubits of a device, the
//! undirected coupling relation between them, and optional fidelity
//! annotations. It is pure data: built once, validated on construction,
//! and shared read-only by every search that runs against the device.

mod connectivity;
mod fidelity;

pub use connectivity::{ConnectivityGraph, DeviceSpec};
pub use fidelity::Fidelity;
