// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot operator commands.

use std::io::IsTerminal;

use replyd_config::model::ReplydConfig;
use replyd_connector::ConnectorRegistry;
use replyd_core::types::{NewAccount, ReviewFilter, ReviewTab};
use replyd_core::{HealthStatus, PluginAdapter, ReplyStatus, ReplydError, StorageAdapter};
use replyd_pipeline::timestamp;
use replyd_vault::mask_secret;

use crate::app::{App, Storage};

/// Environment variable holding the credential for `account add`.
const ACCOUNT_CREDENTIAL_ENV_VAR: &str = "REPLYD_ACCOUNT_CREDENTIAL";

pub async fn run_sync(config: &ReplydConfig, account_id: Option<i64>) -> Result<(), ReplydError> {
    let app = App::open(config).await?;
    let synchronizer = app.synchronizer(config)?;
    if let Some(account_id) = account_id {
        let written = synchronizer.sync_account(account_id).await?;
        println!("synced {written} reviews from account {account_id}");
        return Ok(());
    }
    let report = synchronizer.sync_all().await?;
    println!(
        "synced {} reviews from {} accounts ({} failed)",
        report.observed, report.accounts, report.failed_accounts
    );
    Ok(())
}

pub async fn run_dispatch(config: &ReplydConfig) -> Result<(), ReplydError> {
    let app = App::open(config).await?;
    let report = app.dispatcher(config).dispatch_pending().await?;
    println!(
        "claimed {}: {} posted, {} failed, {} skipped, {} lost",
        report.claimed, report.posted, report.failed, report.skipped, report.lost
    );
    Ok(())
}

pub async fn store_add(config: &ReplydConfig, name: &str) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    let store = storage.create_store(name).await?;
    println!("store {} created: {}", store.id, store.name);
    Ok(())
}

pub async fn store_list(config: &ReplydConfig) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    for store in storage.list_stores().await? {
        println!("{:>5}  {}  {}", store.id, store.name, store.created_at);
    }
    Ok(())
}

pub async fn account_add(
    config: &ReplydConfig,
    store_id: i64,
    platform: &str,
    login_name: &str,
) -> Result<(), ReplydError> {
    let credential = read_account_credential()?;
    let app = App::open(config).await?;
    let encrypted_credential = app.vault.encrypt(&credential)?;
    let account = app
        .storage
        .create_account(&NewAccount {
            store_id,
            platform: platform.to_string(),
            login_name: login_name.to_string(),
            encrypted_credential,
        })
        .await?;
    if app.connectors.get(platform).is_none() {
        eprintln!("warning: no connector enabled for platform `{platform}`");
    }
    println!("account {} created: {} on {}", account.id, account.login_name, account.platform);
    Ok(())
}

pub async fn account_list(config: &ReplydConfig) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    for account in storage.list_accounts().await? {
        println!(
            "{:>5}  store={}  {}  {}  {}",
            account.id,
            account.store_id,
            account.platform,
            account.login_name,
            mask_secret(&account.encrypted_credential)
        );
    }
    Ok(())
}

pub async fn template_add(config: &ReplydConfig, name: &str, body: &str) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    let template = storage.create_template(name, body).await?;
    println!("template {} created: {}", template.id, template.name);
    Ok(())
}

pub async fn template_list(config: &ReplydConfig) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    for template in storage.list_templates().await? {
        println!("{:>5}  {}  {}", template.id, template.name, template.body);
    }
    Ok(())
}

pub async fn template_delete(config: &ReplydConfig, id: i64) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    if !storage.delete_template(id).await? {
        return Err(ReplydError::TemplateNotFound(id));
    }
    println!("template {id} deleted");
    Ok(())
}

pub async fn reviews(
    config: &ReplydConfig,
    from: Option<&str>,
    to: Option<&str>,
    tab: Option<ReviewTab>,
) -> Result<(), ReplydError> {
    let tz = timestamp::offset_from_hours(config.sync.timezone_offset_hours)?;
    let filter = ReviewFilter {
        from: from.map(|raw| date_bound(raw, tz, false)).transpose()?,
        to: to.map(|raw| date_bound(raw, tz, true)).transpose()?,
        tab,
    };

    let storage = Storage::open(config).await?.storage;
    let listing = storage.list_reviews(&filter).await?;
    let counts = listing.counts;
    println!(
        "전체 {} | {} {} | {} {} | {} {}",
        counts.all,
        ReviewTab::Unregistered,
        counts.unregistered,
        ReviewTab::Pending,
        counts.pending,
        ReviewTab::Done,
        counts.done
    );
    for row in listing.items {
        let review = row.review;
        println!(
            "{:>5}  [{}]  {}  account={}  {}  {}  {}: {}",
            review.id,
            row.tab,
            review.reviewed_at,
            review.account_id,
            review.external_review_id,
            review.subject,
            review.customer_name,
            review.content
        );
    }
    Ok(())
}

pub async fn reply_bulk(
    config: &ReplydConfig,
    template_id: i64,
    review_ids: &[i64],
) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    let created = replyd_pipeline::ReplyGenerator::new(storage)
        .create_bulk(template_id, review_ids)
        .await?;
    println!("created {created} replies");
    Ok(())
}

pub async fn jobs_list(config: &ReplydConfig, status: Option<ReplyStatus>) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    for job in storage.list_jobs(status).await? {
        println!(
            "{:>5}  reply={}  {}  retries={}  {}  {}",
            job.id, job.reply_id, job.status, job.retry_count, job.updated_at, job.fail_reason
        );
    }
    Ok(())
}

pub async fn jobs_requeue(config: &ReplydConfig, id: i64) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    if storage.requeue_job(id).await? {
        println!("job {id} re-queued");
        Ok(())
    } else {
        Err(ReplydError::Internal(format!(
            "job {id} cannot be re-queued: missing, not FAILED, or its review has a newer reply"
        )))
    }
}

pub async fn health(config: &ReplydConfig) -> Result<(), ReplydError> {
    let storage = Storage::open(config).await?.storage;
    let mut healthy = report_health(storage.name(), storage.health_check().await?);

    let connectors = ConnectorRegistry::from_config(&config.connectors)?;
    for (platform, status) in connectors.health_check_all().await {
        healthy &= report_health(&format!("connector:{platform}"), status);
    }

    if healthy {
        Ok(())
    } else {
        Err(ReplydError::Internal("health check failed".to_string()))
    }
}

fn report_health(name: &str, status: HealthStatus) -> bool {
    match status {
        HealthStatus::Healthy => {
            println!("{name}: healthy");
            true
        }
        HealthStatus::Degraded(reason) => {
            println!("{name}: degraded ({reason})");
            true
        }
        HealthStatus::Unhealthy(reason) => {
            println!("{name}: unhealthy ({reason})");
            false
        }
    }
}

/// Turn an operator date into an inclusive RFC 3339 bound.
///
/// A bare date as an upper bound covers the whole day.
fn date_bound(raw: &str, tz: chrono::FixedOffset, upper: bool) -> Result<String, ReplydError> {
    let raw = raw.trim();
    let is_bare_date = raw.len() == 10 && !raw.contains(':');
    let candidate = if upper && is_bare_date {
        format!("{raw} 23:59:59")
    } else {
        raw.to_string()
    };
    timestamp::normalize_reviewed_at(&candidate, tz)
        .ok_or_else(|| ReplydError::Config(format!("invalid date `{raw}`")))
}

fn read_account_credential() -> Result<String, ReplydError> {
    if let Ok(value) = std::env::var(ACCOUNT_CREDENTIAL_ENV_VAR) {
        if !value.is_empty() {
            return Ok(value);
        }
    }
    if !std::io::stdin().is_terminal() {
        return Err(ReplydError::Config(format!(
            "no credential provided -- set {ACCOUNT_CREDENTIAL_ENV_VAR} or run interactively"
        )));
    }
    let value = rpassword::prompt_password("Account credential: ")
        .map_err(|e| ReplydError::Internal(format!("failed to read credential: {e}")))?;
    if value.is_empty() {
        return Err(ReplydError::Config("empty credential not allowed".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kst() -> chrono::FixedOffset {
        timestamp::offset_from_hours(9).unwrap()
    }

    #[test]
    fn bare_dates_cover_whole_days() {
        assert_eq!(date_bound("2026-03-02", kst(), false).unwrap(), "2026-03-01T15:00:00Z");
        assert_eq!(date_bound("2026-03-02", kst(), true).unwrap(), "2026-03-02T14:59:59Z");
    }

    #[test]
    fn explicit_times_are_kept() {
        assert_eq!(
            date_bound("2026-03-02T12:00:00Z", kst(), true).unwrap(),
            "2026-03-02T12:00:00Z"
        );
        assert!(date_bound("tomorrow", kst(), false).is_err());
    }

    #[test]
    fn health_report_flags_unhealthy() {
        assert!(report_health("sqlite", HealthStatus::Healthy));
        assert!(report_health("sqlite", HealthStatus::Degraded("slow".into())));
        assert!(!report_health("sqlite", HealthStatus::Unhealthy("down".into())));
    }
}
