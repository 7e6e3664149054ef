use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InspectConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Where diagnostics go. Stdout is reserved for parse output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stderr,
    File { path: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Print the serialized line under each parsed event
    pub show_reconstructed: bool,
    /// Reconstruct with escaping instead of the verbatim serializer
    pub escape: bool,
    /// Print parse metrics after the run
    pub summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl InspectConfig {
    /// Load configuration: defaults, then config files, then environment.
    ///
    /// `explicit` must exist when given; the default locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&InspectConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        match explicit {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                for path in ["/etc/cef-inspect/config", "config/cef-inspect"] {
                    builder = builder.add_source(config::File::with_name(path).required(false));
                }
            }
        }

        // Nested keys use a double underscore: CEF_INSPECT_OUTPUT__FORMAT=json
        builder = builder.add_source(
            config::Environment::with_prefix("CEF_INSPECT")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("Invalid logging.level filter '{}'", self.logging.level))?;

        if let LogOutput::File { path } = &self.logging.output {
            if path.trim().is_empty() {
                anyhow::bail!("logging.output.file.path must not be empty");
            }
        }

        Ok(())
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "warn,inspect=info".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stderr,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                show_reconstructed: true,
                escape: false,
                summary: true,
            },
        }
    }
}
