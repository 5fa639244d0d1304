// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for replyd integration tests.
//!
//! # Components
//!
//! - [`MockConnector`] - scripted connector with recorded posts
//! - [`TestHarness`] - the full pipeline on a temp database

pub mod harness;
pub mod mock_connector;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_connector::{review, MockConnector, RecordedPost};
