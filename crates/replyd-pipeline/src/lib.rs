// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The replyd review pipeline.
//!
//! ```text
//! Synchronizer --upsert--> reviews <--select-- operator
//!                                                 |
//!                                  ReplyGenerator (template render)
//!                                                 |
//!                                     replies + PENDING jobs
//!                                                 |
//!                      Dispatcher --post_reply--> connector
//! ```
//!
//! [`scheduler::run_periodic`] drives the synchronizer and dispatcher on
//! their own intervals.

pub mod dispatch;
pub mod replies;
pub mod scheduler;
pub mod sync;
pub mod template;
pub mod timestamp;

pub use dispatch::{DispatchReport, DispatchSettings, Dispatcher};
pub use replies::ReplyGenerator;
pub use scheduler::{run_periodic, Schedule};
pub use sync::{SyncReport, SyncSettings, Synchronizer};
pub use template::{render, TemplateFields};
