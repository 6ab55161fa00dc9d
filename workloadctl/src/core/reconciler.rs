use std::fmt;
use tracing::{debug, info, trace};

use crate::core::client::{Error, ResponseBody, WorkloadClient};
use crate::core::workload::{Workload, WorkloadDescriptor};

/// What has been done to the remote workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Replaced,
    Fetched,
    Deleted,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Action::Created => "created",
            Action::Replaced => "replaced",
            Action::Fetched => "fetched",
            Action::Deleted => "deleted",
        };
        f.write_str(action)
    }
}

/// `Outcome` of a successful operation, with the body the control plane answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub action: Action,
    pub body: ResponseBody,
}

/// Result of an existence probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ResponseBody),
    NotFound,
}

/// `Reconciler` brings the remote workload in line with a descriptor.
#[derive(Debug)]
pub struct Reconciler<C> {
    client: C,
}

impl<C: WorkloadClient> Reconciler<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn payload(&self, descriptor: &WorkloadDescriptor) -> Workload {
        Workload::build(self.client.namespace(), descriptor)
    }

    pub async fn create(&self, descriptor: &WorkloadDescriptor) -> Result<Outcome, Error> {
        let body = self
            .client
            .create_workload(&self.payload(descriptor))
            .await?;
        Ok(Outcome {
            action: Action::Created,
            body,
        })
    }

    pub async fn replace(&self, descriptor: &WorkloadDescriptor) -> Result<Outcome, Error> {
        let body = self
            .client
            .replace_workload(&self.payload(descriptor))
            .await?;
        Ok(Outcome {
            action: Action::Replaced,
            body,
        })
    }

    /// Fetch a workload. A missing workload is an error here, see [`Reconciler::probe`].
    pub async fn get(&self, name: &str) -> Result<Outcome, Error> {
        let body = self.client.get_workload(name).await?;
        Ok(Outcome {
            action: Action::Fetched,
            body,
        })
    }

    /// Check whether a workload exists. Only a 404 means it does not.
    pub async fn probe(&self, name: &str) -> Result<Lookup, Error> {
        match self.client.get_workload(name).await {
            Ok(body) => Ok(Lookup::Found(body)),
            Err(e) if e.is_not_found() => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<Outcome, Error> {
        let body = self.client.delete_workload(name).await?;
        Ok(Outcome {
            action: Action::Deleted,
            body,
        })
    }

    /// Create the workload if it does not exist, replace it otherwise.
    ///
    /// At most two requests are issued: the probe and the mutation.
    #[tracing::instrument(name = "Reconciler::upsert", skip(self, descriptor), fields(workload = %descriptor.name))]
    pub async fn upsert(&self, descriptor: &WorkloadDescriptor) -> Result<Outcome, Error> {
        match self.probe(&descriptor.name).await? {
            Lookup::NotFound => {
                info!("Workload does not exist yet, creating it");
                self.create(descriptor).await
            }
            Lookup::Found(current) => {
                debug!("Workload already exists, replacing it");
                trace!(?current);
                self.replace(descriptor).await
            }
        }
    }
}
