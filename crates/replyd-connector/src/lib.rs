// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Review platform connectors.
//!
//! The [`ConnectorRegistry`] maps a platform identifier to one
//! [`ConnectorAdapter`](replyd_core::ConnectorAdapter). The built-in
//! [`SimulatedConnector`] serves the `mock` platform.

pub mod registry;
pub mod simulated;

pub use registry::ConnectorRegistry;
pub use simulated::SimulatedConnector;
