use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::workload::WorkloadDescriptor;

pub const API_URL: &str = "F5XC_API_URL";
pub const TENANT: &str = "F5XC_TENANT";
pub const NAMESPACE: &str = "F5XC_NAMESPACE";
pub const SITE_NAME: &str = "F5XC_SITE_NAME";
pub const WORKLOAD_NAME: &str = "F5XC_WORKLOAD_NAME";
pub const IMAGE_REF: &str = "IMAGE_REF";
pub const REGISTRY_NAME: &str = "F5XC_REGISTRY_NAME";
pub const WORKLOAD_PORT: &str = "F5XC_WORKLOAD_PORT";
pub const CERTIFICATE_FILE: &str = "TF_VAR_f5xc_api_p12_file";
pub const CERTIFICATE_PASSWORD: &str = "VES_P12_PASSWORD";
pub const SITE_NAMESPACE: &str = "F5XC_SITE_NAMESPACE";

/// Environment variable pointing to an alternative configuration file.
pub const CONFIG_FILE_VAR: &str = "WORKLOADCTL_CONFIG";

pub const DEFAULT_SITE_NAMESPACE: &str = "shared";

/// Configuration related errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("{name} must be a port number, got `{value}`")]
    InvalidPort { name: &'static str, value: String },
    #[error("Unable to load the configuration. Details : {0}")]
    Load(#[from] config::ConfigError),
}

/// `Credentials` hold everything needed to open an authenticated session
/// against the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL of the API, without trailing slash.
    ///
    /// e.g: https://tenant.console.ves.volterra.io/api
    pub api_url: String,
    pub tenant: String,
    /// Namespace every workload request is addressed to
    pub namespace: String,
    /// Path to the PKCS#12 bundle
    pub certificate: PathBuf,
    pub password: String,
}

/// `Settings` is the fully validated configuration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credentials: Credentials,
    pub workload: WorkloadDescriptor,
}

/// Raw view of the configuration sources. Keys are the lower-cased
/// variable names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    f5xc_api_url: Option<String>,
    f5xc_tenant: Option<String>,
    f5xc_namespace: Option<String>,
    f5xc_site_name: Option<String>,
    f5xc_workload_name: Option<String>,
    image_ref: Option<String>,
    f5xc_registry_name: Option<String>,
    f5xc_workload_port: Option<String>,
    tf_var_f5xc_api_p12_file: Option<String>,
    ves_p12_password: Option<String>,
    f5xc_site_namespace: Option<String>,
}

impl RawSettings {
    fn required(&self) -> [(&'static str, Option<&str>); 10] {
        [
            (API_URL, self.f5xc_api_url.as_deref()),
            (TENANT, self.f5xc_tenant.as_deref()),
            (NAMESPACE, self.f5xc_namespace.as_deref()),
            (SITE_NAME, self.f5xc_site_name.as_deref()),
            (WORKLOAD_NAME, self.f5xc_workload_name.as_deref()),
            (IMAGE_REF, self.image_ref.as_deref()),
            (REGISTRY_NAME, self.f5xc_registry_name.as_deref()),
            (WORKLOAD_PORT, self.f5xc_workload_port.as_deref()),
            (CERTIFICATE_FILE, self.tf_var_f5xc_api_p12_file.as_deref()),
            (CERTIFICATE_PASSWORD, self.ves_p12_password.as_deref()),
        ]
    }

    fn validate(self) -> Result<Settings, Error> {
        let missing: Vec<&'static str> = self
            .required()
            .iter()
            .filter(|(_, value)| value.map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::Missing(missing));
        }

        // Presence has been checked above
        let take = |value: Option<String>| value.unwrap_or_default();

        let raw_port = take(self.f5xc_workload_port);
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::InvalidPort {
                name: WORKLOAD_PORT,
                value: raw_port.clone(),
            })?;

        let site_namespace = self
            .f5xc_site_namespace
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                debug!("{} not set, using {}", SITE_NAMESPACE, DEFAULT_SITE_NAMESPACE);
                DEFAULT_SITE_NAMESPACE.to_string()
            });

        Ok(Settings {
            credentials: Credentials {
                api_url: take(self.f5xc_api_url).trim_end_matches('/').to_string(),
                tenant: take(self.f5xc_tenant),
                namespace: take(self.f5xc_namespace),
                certificate: PathBuf::from(take(self.tf_var_f5xc_api_p12_file)),
                password: take(self.ves_p12_password),
            },
            workload: WorkloadDescriptor {
                name: take(self.f5xc_workload_name),
                image: take(self.image_ref),
                site_name: take(self.f5xc_site_name),
                site_namespace,
                port,
                registry: take(self.f5xc_registry_name),
            },
        })
    }
}

impl Settings {
    /// Load the settings from the configuration file, if any, overridden by
    /// the process environment.
    ///
    /// An explicit `config_file` must exist; the default one is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self, Error> {
        let mut builder = Config::builder();
        match Self::config_file(config_file) {
            Some(file) => builder = builder.add_source(file),
            None => debug!("No home directory, using the environment only"),
        }
        Self::from_builder(builder.add_source(Environment::default()))
    }

    fn config_file(explicit: Option<&Path>) -> Option<File<FileSourceFile, FileFormat>> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_FILE_VAR).ok().map(PathBuf::from));
        if let Some(path) = explicit {
            debug!("Reading configuration file {}", path.display());
            return Some(File::from(path));
        }

        Self::default_config_file(&dirs::home_dir()?)
    }

    /// `~/.workloadctl/config`, with any extension the config crate reads.
    fn default_config_file(home: &Path) -> Option<File<FileSourceFile, FileFormat>> {
        let default = home.join(".workloadctl").join("config");
        Some(File::with_name(default.to_str()?).required(false))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, Error> {
        builder
            .build()?
            .try_deserialize::<RawSettings>()?
            .validate()
    }
}

impl Credentials {
    pub fn certificate_exists(&self) -> bool {
        self.certificate.is_file()
    }
}
