mod workload;

use crate::cli::workload::{
    CreateWorkload, DeleteWorkload, GetWorkload, ReplaceWorkload, UpsertWorkload,
};
use crate::core::client::Client;
use crate::core::config::Settings;
use crate::core::reconciler::Reconciler;
use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Everything a handler needs, built once before any request is sent.
pub struct Context {
    pub settings: Settings,
    pub reconciler: Reconciler<Client>,
}

/// `Handler` is a trait that should be implemented for each operation.
///
/// It defines the contract & the input / output of an operation execution.
#[async_trait]
pub trait Handler {
    /// Executes the operation handler.
    ///
    /// The workload to act on comes from the configuration held by `context`.
    async fn handler(&self, context: &Context) -> Result<()>;
}

/// The enumeration of our operations.
///
/// Each operation should be listed in this enumeration with the following format :
/// OperationName(OperationHandler)
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the workload
    Create(CreateWorkload),
    /// Replace the configuration of an existing workload
    Replace(ReplaceWorkload),
    /// Print the workload as stored by the control plane
    Get(GetWorkload),
    /// Delete the workload
    Delete(DeleteWorkload),
    /// Create the workload if it does not exist, replace it otherwise
    Upsert(UpsertWorkload),
}

#[derive(Parser, Debug)]
#[clap(version, author, about)]
pub struct CommandLineInterface {
    /// Configuration file, overridden by the environment.
    ///
    /// Defaults to $WORKLOADCTL_CONFIG, then ~/.workloadctl/config with any
    /// extension the config crate reads (config.toml, config.json, ...).
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The operation to apply
    #[clap(subcommand)]
    pub command: Command,
}

impl Command {
    /// Name of the operation, as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::Replace(_) => "replace",
            Command::Get(_) => "get",
            Command::Delete(_) => "delete",
            Command::Upsert(_) => "upsert",
        }
    }

    pub fn as_handler(&self) -> &dyn Handler {
        match self {
            Command::Create(handler) => handler,
            Command::Replace(handler) => handler,
            Command::Get(handler) => handler,
            Command::Delete(handler) => handler,
            Command::Upsert(handler) => handler,
        }
    }
}
