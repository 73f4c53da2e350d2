use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use freeblog_client::{SessionSchema, SubmitMethod};

/// Command line client for a freeblog server
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Url of the freeblog server; targets are resolved against it
    #[arg(long, env = "FREEBLOG_BASE_URL", default_value = "http://localhost:8000/")]
    pub base_url: String,

    /// Initial cookies, in `Cookie` header format (`a=1; b=2`)
    #[arg(long, env = "FREEBLOG_COOKIE")]
    pub cookie: Option<String>,

    /// Cookie layout holding the session: useridtok, usernametok or separate
    #[arg(long, env = "FREEBLOG_SESSION_SCHEMA", default_value_t = SessionSchema::UseridTok)]
    pub session_schema: SessionSchema,

    #[arg(long, env = "FREEBLOG_USER_AGENT")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Show the session identity found in the cookies
    Session,

    /// GET a target; prints `null` if it does not exist
    Find {
        target: String,

        /// Print the raw body instead of parsing JSON
        #[arg(long)]
        text: bool,
    },

    /// Send a JSON item and print what the server saved
    Submit {
        target: String,

        #[arg(long, value_enum, default_value_t = SubmitMethodArg::Post)]
        method: SubmitMethodArg,

        /// The item, as JSON
        #[arg(long, value_parser = parse_json)]
        item: serde_json::Value,
    },

    /// POST a JSON item, ignoring the response
    Exec {
        target: String,

        /// The item, as JSON
        #[arg(long, value_parser = parse_json)]
        item: serde_json::Value,
    },

    /// DELETE a target
    Del { target: String },

    /// Upload files to the server
    Upload {
        paths: Vec<PathBuf>,

        /// Extra form field, `name=value`
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Show a single blog entry
    Entry { id: i64 },

    /// List blog entries, newest first
    Entries {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },

    /// List uploaded files
    Files {
        #[arg(long)]
        username: Option<String>,
        /// Substring of the file name
        #[arg(long)]
        filename: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SubmitMethodArg {
    Post,
    Put,
}

impl From<SubmitMethodArg> for SubmitMethod {
    fn from(value: SubmitMethodArg) -> Self {
        match value {
            SubmitMethodArg::Post => SubmitMethod::Create,
            SubmitMethodArg::Put => SubmitMethod::Replace,
        }
    }
}

fn parse_json(s: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(s)
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("Expected `name=value`, got `{s}`"))
}
