mod cli;

use std::io;

use clap::Parser;
use cli::{Opts, OptsCmd};
use freeblog_client::api::{EntriesQuery, FilesQuery};
use freeblog_client::error::{FetchError, InitError, UploadFormError};
use freeblog_client::upload::{UploadForm, UploadOutcome, handle_upload_submit};
use freeblog_client::{Client, ResponseFormat};
use serde_json::json;
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "freeblog::cli";

type WhateverResult<T> = std::result::Result<T, snafu::Whatever>;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Initialization error: {source}"))]
    Init { source: InitError },
    #[snafu(transparent)]
    Fetch { source: FetchError },
    #[snafu(display("Upload form error: {source}"))]
    UploadForm { source: UploadFormError },
    #[snafu(display("Upload failed: {source}"))]
    Upload { source: FetchError },
    #[snafu(display("Please select a file"))]
    NoFilesSelected,
    #[snafu(display("Can't format output: {source}"))]
    Json { source: serde_json::Error },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let v = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&v).context(JsonSnafu)?);
    Ok(())
}

fn to_json(v: &impl serde::Serialize) -> CliResult<serde_json::Value> {
    serde_json::to_value(v).context(JsonSnafu)
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    let client = Client::builder()
        .base_url(opts.global.base_url)
        .maybe_user_agent(opts.global.user_agent)
        .maybe_cookies(opts.global.cookie)
        .session_schema(opts.global.session_schema)
        .build()
        .context(InitSnafu)?;

    debug!(target: LOG_TARGET, base_url = %client.base_url(), "Running command");

    Ok(match opts.cmd {
        OptsCmd::Session => to_json(&client.current_session())?,
        OptsCmd::Find { target, text } => {
            let format = if text {
                ResponseFormat::Text
            } else {
                ResponseFormat::Json
            };
            let found = client.find(&target, format).await?;
            if found.is_none() {
                info!(target: LOG_TARGET, %target, "Not found");
            }
            to_json(&found)?
        }
        OptsCmd::Submit {
            target,
            method,
            item,
        } => client
            .submit::<_, serde_json::Value>(&target, method.into(), &item)
            .await?,
        OptsCmd::Exec { target, item } => {
            client.exec(&target, &item).await?;
            serde_json::Value::Bool(true)
        }
        OptsCmd::Del { target } => {
            client.del(&target).await?;
            serde_json::Value::Bool(true)
        }
        OptsCmd::Upload { paths, fields } => {
            let mut form = UploadForm::new();
            for (name, value) in fields {
                form = form.field(name, value);
            }
            for path in paths {
                form = form.file_from_path(&path).await.context(UploadFormSnafu)?;
            }
            let count = form.files().len();

            match handle_upload_submit(&client, form).await {
                UploadOutcome::Uploaded => json!({ "uploaded": count }),
                UploadOutcome::NoFilesSelected => return NoFilesSelectedSnafu.fail(),
                UploadOutcome::Failed(err) => return Err(err).context(UploadSnafu),
            }
        }
        OptsCmd::Entry { id } => to_json(&client.find_entry(id).await?)?,
        OptsCmd::Entries {
            username,
            limit,
            offset,
        } => to_json(
            &client
                .find_entries(&EntriesQuery {
                    username,
                    limit,
                    offset,
                })
                .await?,
        )?,
        OptsCmd::Files {
            username,
            filename,
            limit,
            offset,
        } => to_json(
            &client
                .find_files(&FilesQuery {
                    username,
                    filename,
                    limit,
                    offset,
                })
                .await?,
        )?,
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
