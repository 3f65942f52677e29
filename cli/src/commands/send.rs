use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use conduit_client::{Client, MutationOptions};
use conduit_types::Method;
use serde_json::Value;
use std::path::PathBuf;

use super::Reported;
use crate::{config::OutputFormat, output};

#[derive(Args, Clone)]
pub struct SendCommand {
    /// HTTP method: POST, PUT, PATCH, DELETE or GET
    method: Method,

    /// Endpoint path relative to the server url
    endpoint: String,

    /// Request body as inline JSON
    #[arg(short, long, conflicts_with = "from_json")]
    data: Option<String>,

    /// Request body from a JSON file (use '-' for stdin)
    #[arg(long, value_name = "FILE")]
    from_json: Option<PathBuf>,
}

impl SendCommand {
    pub async fn execute(self, client: &Client, output_format: &OutputFormat) -> Result<()> {
        let variables = match (&self.data, &self.from_json) {
            (Some(data), _) => serde_json::from_str(data).context("Fail parse --data json")?,
            (None, Some(path)) => load_from_json(path)?,
            (None, None) => Value::Null,
        };

        let options = match output_format {
            OutputFormat::Table => {
                let label = format!("{} {}", self.method, self.endpoint);
                MutationOptions::new().on_success(move |_: &Value, _: &Value| {
                    println!("{} {}", label.green(), "succeeded".green());
                })
            }
            OutputFormat::Json => MutationOptions::new(),
        };

        let mutation = client.mutation::<Value, Value>(self.method, self.endpoint, options);
        match mutation.mutate(variables).await {
            Some(data) => output::print_value(&data, output_format),
            None => Err(Reported.into()),
        }
    }
}

fn load_from_json(path: &PathBuf) -> Result<Value> {
    let content = if path.to_str() == Some("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&content).context("Fail parse json")
}
