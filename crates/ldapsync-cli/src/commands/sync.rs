//! Sync command - Reconcile Uyuni users and roles with the directory

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{debug, info};

use ldapsync_core::config::Config;
use ldapsync_core::domain::User;
use ldapsync_ldap::directory::{LdapDirectory, LdapSettings};
use ldapsync_sync::engine::{ReconciliationEngine, SyncPlan, SyncReport};
use ldapsync_uyuni::client::UyuniClient;
use ldapsync_uyuni::store::UyuniAccountStore;

use super::config::report_errors;
use super::Context;

/// Exit code when the run completed but some users could not be written
const PARTIAL_FAILURE: u8 = 2;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Compute and print the plan without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn execute(&self, context: &Context) -> Result<ExitCode> {
        let formatter = context.formatter();

        let config = Config::load(&context.config_path)?;
        let errors = config.validate();
        if !errors.is_empty() {
            report_errors(context, &errors);
            return Ok(ExitCode::FAILURE);
        }

        let directory = LdapDirectory::connect(&LdapSettings::from(&config.directory))
            .await
            .context("Failed to connect to the directory")?;
        let directory = Arc::new(directory);

        let mut client = match UyuniClient::new(&config.spacewalk) {
            Ok(client) => client,
            Err(e) => {
                directory.disconnect().await;
                return Err(e).context("Failed to build the Uyuni client");
            }
        };
        if let Err(e) = client
            .login(&config.spacewalk.user, &config.spacewalk.password)
            .await
        {
            directory.disconnect().await;
            return Err(e).context("Failed to log in to Uyuni");
        }
        let store = Arc::new(UyuniAccountStore::new(client));

        let engine = ReconciliationEngine::new(directory.clone(), store.clone(), &config);
        let result = self.run(&engine, context).await;

        store.client().logout().await;
        directory.disconnect().await;
        debug!("Sessions closed");

        let report = match result? {
            Some(report) => report,
            None => return Ok(ExitCode::SUCCESS),
        };

        if report.has_failures() {
            formatter.warn(&format!(
                "{} user(s) failed, {} error(s) recorded",
                report.failed.len(),
                report.errors.len()
            ));
            return Ok(ExitCode::from(PARTIAL_FAILURE));
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Plans, then applies unless this is a dry run
    async fn run(
        &self,
        engine: &ReconciliationEngine,
        context: &Context,
    ) -> Result<Option<SyncReport>> {
        let mut plan = engine.start().await?;

        if self.dry_run {
            info!("Dry run, nothing written");
            print_plan(context, &plan)?;
            return Ok(None);
        }

        let report = engine.apply(&mut plan).await;
        print_report(context, &report)?;
        Ok(Some(report))
    }
}

fn uids(users: &[User]) -> Vec<String> {
    users.iter().map(|user| user.uid().to_string()).collect()
}

/// Summary line of a plan, as shown before the per-user lists
fn plan_summary(plan: &SyncPlan) -> String {
    format!(
        "{} new, {} outdated, {} to delete, {} unchanged ({} staged)",
        plan.new_users.len(),
        plan.outdated_users.len(),
        plan.deleted_users.len(),
        plan.unchanged,
        plan.staged
    )
}

fn report_summary(report: &SyncReport) -> String {
    format!(
        "Added {} new users, updated {} existing users, removed {} users",
        report.added, report.updated, report.removed
    )
}

fn print_plan(context: &Context, plan: &SyncPlan) -> Result<()> {
    let formatter = context.formatter();

    if context.is_json() {
        let json = serde_json::to_value(plan).context("Failed to serialize plan")?;
        formatter.print_json(&json);
        return Ok(());
    }

    if plan.is_empty() {
        formatter.success("Nothing to do, Uyuni is in sync");
        return Ok(());
    }
    formatter.success(&format!("Dry run: {}", plan_summary(plan)));
    formatter.list("New", &uids(&plan.new_users));
    formatter.list("Outdated", &uids(&plan.outdated_users));
    formatter.list("Deleted", &uids(&plan.deleted_users));
    Ok(())
}

fn print_report(context: &Context, report: &SyncReport) -> Result<()> {
    let formatter = context.formatter();

    if context.is_json() {
        let json = serde_json::to_value(report).context("Failed to serialize report")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&report_summary(report));
    formatter.info(&format!("Duration: {} ms", report.duration_ms));
    let failed: Vec<String> = report
        .failed
        .iter()
        .map(|failure| format!("{}: {}", failure.uid, failure.reason))
        .collect();
    formatter.list("Failed", &failed);
    formatter.list("Errors", &report.errors);
    Ok(())
}
