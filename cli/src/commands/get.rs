use anyhow::Result;
use clap::Args;
use conduit_client::{Client, LocalCache, QueryOptions};
use conduit_types::ApiRequest;
use serde_json::Value;

use super::{parse_param, Reported};
use crate::{config::OutputFormat, output};

#[derive(Args, Clone)]
pub struct GetCommand {
    /// Endpoint path relative to the server url, e.g. /media
    endpoint: String,

    /// Query parameter, repeatable
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Do not report failures, only set the exit code
    #[arg(long)]
    mute: bool,
}

impl GetCommand {
    pub async fn execute(self, client: &Client, output_format: &OutputFormat) -> Result<()> {
        let mut request = ApiRequest::get(self.endpoint);
        for (key, value) in self.params {
            request = request.with_param(key, value);
        }

        let cache = LocalCache::new();
        let mut query = client.query::<Value, _>(
            &cache,
            request,
            QueryOptions::new().mute_errors(self.mute),
        );

        let state = query.settled().await;
        match state.data {
            Some(data) if state.error.is_none() => output::print_value(&data, output_format),
            _ => Err(Reported.into()),
        }
    }
}
