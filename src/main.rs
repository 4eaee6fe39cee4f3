//! cloud-sql-execute CLI Entry Point
//!
//! Parses arguments, merges them with the environment, runs the statement
//! and writes the rendered result to stdout. Logs go to stderr.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};

use cloud_sql_execute::{
    check_required, execute_query, logging, merge, ExecError, GcpCredentials, HttpTransport,
    OutputFormat, ProcessEnv, RawOptions, ResolvedOptions, SqlAdminClient,
};

const AFTER_HELP: &str = "\
Examples:
  # Auto-detect project with database authentication
  $ cloud-sql-execute -i my-instance -d my-db -u user --password pass \"SELECT 1\"

  # Specify project explicitly with verbose logging
  $ cloud-sql-execute -p my-project -i my-instance -d my-db -u user --password pass -v \"SELECT 1\"

  # Using IAM authentication (quiet mode, only show results)
  $ cloud-sql-execute -i my-instance -d my-db --auto-iam-authn \"SELECT 1\"

  # Using access token with verbose output
  $ cloud-sql-execute -i my-instance -d my-db --access-token TOKEN -v \"SELECT 1\"

  # Using environment variables (minimal command line)
  $ export CLOUD_SQL_INSTANCE=my-instance
  $ export CLOUD_SQL_DATABASE=my-db
  $ export CLOUD_SQL_AUTO_IAM_AUTHN=true
  $ cloud-sql-execute \"SELECT 1\"

Environment Variables:
  GOOGLE_CLOUD_PROJECT     - Google Cloud Project ID
  CLOUD_SQL_INSTANCE       - Cloud SQL Instance ID (required)
  CLOUD_SQL_DATABASE       - Database name
  CLOUD_SQL_USER           - Database username
  CLOUD_SQL_PASSWORD       - Database password
  CLOUD_SQL_ACCESS_TOKEN   - IAM access token
  CLOUD_SQL_SECRET_PATH    - Secret Manager path
  CLOUD_SQL_AUTO_IAM_AUTHN - IAM authentication (true/1)
  CLOUD_SQL_FORMAT         - Output format (json/text)
  CLOUD_SQL_LIMIT          - Row limit (positive number)
  CLOUD_SQL_VERBOSE        - Verbose logging (true/1)

  Command line arguments take precedence over environment variables.

Project ID Detection:
  If no project is specified with -p/--project or GOOGLE_CLOUD_PROJECT, the
  project configured for Application Default Credentials is used.

Logging:
  By default only errors (stderr) and query results (stdout) are shown.
  Use -v/--verbose or CLOUD_SQL_VERBOSE=true for detailed logging.

Authentication Methods:
  1. Database User: --user + --password
  2. Database User with Secret Manager: --user + --secret-path
  3. IAM Authentication: --auto-iam-authn
  4. IAM Access Token: --access-token

Run 'gcloud auth application-default login' to authenticate.";

/// Execute SQL queries on Google Cloud SQL instances
#[derive(Parser, Debug)]
#[command(name = "cloud-sql-execute")]
#[command(version, after_help = AFTER_HELP)]
struct Cli {
    /// SQL query to execute
    #[arg(value_parser = clap::builder::NonEmptyStringValueParser::new())]
    query: String,

    /// Google Cloud Project ID (auto-detected if not specified)
    #[arg(short, long)]
    project: Option<String>,

    /// Cloud SQL Instance ID
    #[arg(short, long)]
    instance: Option<String>,

    /// Database name
    #[arg(short, long)]
    database: Option<String>,

    /// Database user name
    #[arg(short, long)]
    user: Option<String>,

    /// Database password
    #[arg(long)]
    password: Option<String>,

    /// IAM access token for authentication
    #[arg(long, value_name = "TOKEN")]
    access_token: Option<String>,

    /// Secret Manager path for password (projects/{project}/secrets/{secret}/versions/{version})
    #[arg(long, value_name = "PATH")]
    secret_path: Option<String>,

    /// Use IAM authentication with API caller identity
    #[arg(long)]
    auto_iam_authn: bool,

    /// Output format [default: text]
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Maximum number of rows to return
    #[arg(short, long)]
    limit: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

impl Cli {
    fn into_parts(self) -> (String, RawOptions) {
        let raw = RawOptions {
            project: self.project,
            instance: self.instance,
            database: self.database,
            user: self.user,
            password: self.password,
            access_token: self.access_token,
            secret_path: self.secret_path,
            auto_iam_authn: self.auto_iam_authn,
            format: self.format,
            limit: self.limit,
            verbose: self.verbose,
        };
        (self.query, raw)
    }
}

async fn run(sql: &str, options: &ResolvedOptions) -> cloud_sql_execute::Result<()> {
    check_required(options)?;
    cloud_sql_execute::auth::validate(options)?;

    let credentials = GcpCredentials::discover().await;
    let admin = SqlAdminClient::new(credentials, HttpTransport::new());
    let rendered = execute_query(sql, options, &admin).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| ExecError::output(e.to_string()))?;

    for line in &rendered.diagnostics {
        info!("{line}");
    }

    Ok(())
}

/// Exit code for an argument parsing outcome: help and version succeed,
/// every usage error is a validation failure
fn parse_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().context("printing usage")?;
            return Ok(ExitCode::from(parse_exit_code(e.kind())));
        }
    };
    let (sql, raw) = cli.into_parts();
    let options = merge(raw, &ProcessEnv);

    logging::init_logging(options.verbose).context("logging setup")?;

    match run(&sql, &options).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            match &err {
                ExecError::Transport { .. } => {
                    error!(code = err.error_code(), "Execution failed: {err}");
                }
                _ => error!(code = err.error_code(), "{err}"),
            }
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}
