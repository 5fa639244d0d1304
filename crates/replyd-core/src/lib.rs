// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the replyd review pipeline.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the storage, vault, connector, and pipeline crates. Platform
//! connectors and storage backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ReplydError;
pub use types::{AdapterType, HealthStatus, ReplyStatus, ReviewTab};

pub use traits::{ConnectorAdapter, CredentialCipher, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn reply_status_uses_screaming_case() {
        assert_eq!(ReplyStatus::Pending.to_string(), "PENDING");
        assert_eq!(ReplyStatus::Posted.to_string(), "POSTED");
        assert_eq!(ReplyStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn reply_status_parses_case_insensitively() {
        assert_eq!(ReplyStatus::from_str("failed").unwrap(), ReplyStatus::Failed);
        assert_eq!(ReplyStatus::from_str("POSTED").unwrap(), ReplyStatus::Posted);
        assert!(ReplyStatus::from_str("IN_FLIGHT").is_err());
    }

    #[test]
    fn reply_status_serde_matches_display() {
        let json = serde_json::to_string(&ReplyStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        let parsed: ReplyStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(parsed, ReplyStatus::Failed);
    }

    #[test]
    fn review_tab_follows_latest_reply() {
        assert_eq!(ReviewTab::from_latest_status(None), ReviewTab::Unregistered);
        assert_eq!(
            ReviewTab::from_latest_status(Some(ReplyStatus::Failed)),
            ReviewTab::Unregistered
        );
        assert_eq!(
            ReviewTab::from_latest_status(Some(ReplyStatus::Pending)),
            ReviewTab::Pending
        );
        assert_eq!(
            ReviewTab::from_latest_status(Some(ReplyStatus::Posted)),
            ReviewTab::Done
        );
    }

    #[test]
    fn review_tab_labels_round_trip() {
        for tab in [ReviewTab::Unregistered, ReviewTab::Pending, ReviewTab::Done] {
            let label = tab.to_string();
            assert_eq!(ReviewTab::from_str(&label).unwrap(), tab);
        }
        assert_eq!(ReviewTab::Pending.to_string(), "등록대기");
    }

    #[test]
    fn post_outcome_constructors() {
        let ok = types::PostOutcome::posted();
        assert!(ok.success);
        assert!(ok.reason.is_empty());

        let failed = types::PostOutcome::failed("rate limited");
        assert!(!failed.success);
        assert_eq!(failed.reason, "rate limited");
    }

    #[test]
    fn adapter_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_connector_adapter<T: ConnectorAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_cipher<T: CredentialCipher>() {}
    }

    #[test]
    fn error_messages_name_the_subject() {
        let err = ReplydError::connector("mock", "connection reset");
        assert_eq!(err.to_string(), "connector error (mock): connection reset");

        let err = ReplydError::MalformedReview {
            external_review_id: "r-1".into(),
            reason: "empty id".into(),
        };
        assert!(err.to_string().contains("r-1"));

        let err = ReplydError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
    }
}
