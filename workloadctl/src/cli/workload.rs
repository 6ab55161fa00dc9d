use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, ValueEnum};
use prettytable::{row, Table};
use serde_json::Value;

use crate::cli::{Context, Handler};
use crate::core::client::ResponseBody;
use crate::core::get_display_table;
use crate::core::reconciler::Outcome;

/// Trait which defines how resources should be displayed
trait DisplayResource {
    /// Prints the resource in form of table
    fn into_table(&self) -> Table;
}

/// Format of the fetched workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Json,
    Table,
}

#[derive(Debug, Args)]
pub struct CreateWorkload {}

#[derive(Debug, Args)]
pub struct ReplaceWorkload {}

#[derive(Debug, Args)]
pub struct GetWorkload {
    /// How to print the workload.
    #[clap(short, long, value_enum, default_value_t = Output::Json)]
    pub output: Output,
}

#[derive(Debug, Args)]
pub struct DeleteWorkload {}

#[derive(Debug, Args)]
pub struct UpsertWorkload {}

fn announce(verb: &str, context: &Context) {
    println!(
        "{} workload {} in namespace {}...",
        verb, context.settings.workload.name, context.settings.credentials.namespace
    );
}

fn report(outcome: &Outcome) {
    println!("Action: {}", outcome.action);
}

#[async_trait]
impl Handler for CreateWorkload {
    async fn handler(&self, context: &Context) -> Result<()> {
        announce("Creating", context);
        let outcome = context
            .reconciler
            .create(&context.settings.workload)
            .await?;
        report(&outcome);
        Ok(())
    }
}

#[async_trait]
impl Handler for ReplaceWorkload {
    async fn handler(&self, context: &Context) -> Result<()> {
        announce("Replacing", context);
        let outcome = context
            .reconciler
            .replace(&context.settings.workload)
            .await?;
        report(&outcome);
        Ok(())
    }
}

#[async_trait]
impl Handler for GetWorkload {
    #[tracing::instrument(name = "GetWorkload::handler", skip(self, context))]
    async fn handler(&self, context: &Context) -> Result<()> {
        announce("Getting", context);
        let outcome = context
            .reconciler
            .get(&context.settings.workload.name)
            .await?;

        match (&outcome.body, self.output) {
            (ResponseBody::Empty { status }, _) => println!("Empty response (HTTP {})", status),
            (ResponseBody::Json(workload), Output::Json) => {
                println!("{}", serde_json::to_string_pretty(workload)?)
            }
            (ResponseBody::Json(workload), Output::Table) => {
                workload.into_table().printstd();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for DeleteWorkload {
    async fn handler(&self, context: &Context) -> Result<()> {
        announce("Deleting", context);
        let outcome = context
            .reconciler
            .delete(&context.settings.workload.name)
            .await?;
        report(&outcome);
        Ok(())
    }
}

#[async_trait]
impl Handler for UpsertWorkload {
    async fn handler(&self, context: &Context) -> Result<()> {
        announce("Upserting", context);
        let outcome = context
            .reconciler
            .upsert(&context.settings.workload)
            .await?;
        report(&outcome);
        Ok(())
    }
}

fn text(workload: &Value, pointer: &str) -> String {
    match workload.pointer(pointer) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => String::new(),
        Some(value) => value.to_string(),
    }
}

impl DisplayResource for Value {
    #[tracing::instrument(name = "DisplayResource::workload::into_table", skip(self))]
    fn into_table(&self) -> Table {
        let mut table = get_display_table();
        table.set_titles(row!["NAME", "NAMESPACE", "REPLICAS", "IMAGE", "SITES"]);

        let sites = self
            .pointer("/spec/service/deploy_options/deploy_ce_virtual_sites/virtual_site")
            .and_then(Value::as_array)
            .map(|sites| {
                sites
                    .iter()
                    .map(|site| text(site, "/name"))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        table.add_row(row![
            text(self, "/metadata/name"),
            text(self, "/metadata/namespace"),
            text(self, "/spec/service/num_replicas"),
            text(self, "/spec/service/containers/0/image/name"),
            sites
        ]);
        table
    }
}
