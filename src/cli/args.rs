//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::path::PathBuf;

use crate::secrets::Secret;
use crate::steps::{
    BuildStep, DbFolder, DlmDashboard, ProductVersion, PublishStep, ServerAuth, SyncStep,
    TemporaryDatabase, TestSource, TestStep, TransactionIsolationLevel,
};

/// sqlci - Build, test, sync and publish database packages.
#[derive(Debug, Parser)]
#[command(name = "sqlci")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Build workspace (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Path to config file (overrides sqlci.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Build number, used for default package versions
    #[arg(long, global = true, env = "BUILD_NUMBER", default_value_t = 1)]
    pub build_number: u64,

    /// Build variable passed to the runner (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", global = true, value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// File with the caller-resolved environment
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Interpreter executable (overrides PS_HOME)
    #[arg(long, global = true)]
    pub interpreter: Option<PathBuf>,

    /// Runner script to use instead of the bundled one
    #[arg(long, global = true)]
    pub runner: Option<PathBuf>,

    /// Pass parameters as one escaped command line through the shell
    #[arg(long, global = true)]
    pub command_line: bool,

    /// Print the command that would run without running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a database package from source control
    Build(BuildArgs),

    /// Run tSQLt tests against a temporary database
    Test(TestArgs),

    /// Deploy a package to a database
    Sync(SyncArgs),

    /// Publish a package to a NuGet feed
    Publish(PublishArgs),

    /// Run every configured step in order
    Run,

    /// Show the command lines of the configured steps
    Show(ShowArgs),
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_secret(s: &str) -> Result<Secret, Infallible> {
    Ok(Secret::new(s))
}

fn parse_product_version(s: &str) -> Result<ProductVersion, Infallible> {
    Ok(ProductVersion::parse(s))
}

/// Temporary SQL Server options shared by build and test.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TempServerArgs {
    /// SQL Server for the temporary database (LocalDB when omitted)
    #[arg(long)]
    pub temp_server: Option<String>,

    /// Name of the temporary database
    #[arg(long, requires = "temp_server")]
    pub temp_database: Option<String>,

    /// SQL Server login (Windows authentication when omitted)
    #[arg(long, requires = "temp_server")]
    pub temp_username: Option<String>,

    /// SQL Server password
    #[arg(long, env = "SQLCI_TEMP_PASSWORD", hide_env_values = true, value_parser = parse_secret)]
    pub temp_password: Option<Secret>,
}

impl TempServerArgs {
    fn to_temporary_database(&self, encrypt: bool, trust: bool) -> Option<TemporaryDatabase> {
        let server_name = self.temp_server.clone()?;
        Some(TemporaryDatabase {
            server_name,
            database_name: self.temp_database.clone(),
            auth: server_auth(self.temp_username.as_deref(), self.temp_password.as_ref()),
            encrypt_connection: encrypt,
            trust_server_certificate: trust,
        })
    }
}

fn server_auth(username: Option<&str>, password: Option<&Secret>) -> ServerAuth {
    match username {
        Some(username) if !username.is_empty() => ServerAuth::SqlServer {
            username: username.to_string(),
            password: password.cloned().unwrap_or_default(),
        },
        _ => ServerAuth::Windows,
    }
}

/// Arguments for the `build` command.
#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// NuGet package id
    #[arg(long)]
    pub package_id: String,

    /// Package version (defaults to 1.0.<build number>)
    #[arg(long)]
    pub package_version: Option<String>,

    /// Folder below the workspace holding the database scripts
    #[arg(long, conflicts_with = "project")]
    pub subfolder: Option<PathBuf>,

    /// SQL Change Automation project file
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// SQL Compare options
    #[arg(long, allow_hyphen_values = true)]
    pub options: Option<String>,

    /// Transaction isolation level
    #[arg(long, value_enum)]
    pub isolation_level: Option<TransactionIsolationLevel>,

    /// SQL Compare filter file
    #[arg(long)]
    pub filter: Option<String>,

    #[command(flatten)]
    pub temp: TempServerArgs,

    /// DLM Dashboard host to report the schema to
    #[arg(long, requires = "dlm_dashboard_port")]
    pub dlm_dashboard_host: Option<String>,

    /// DLM Dashboard port
    #[arg(long, requires = "dlm_dashboard_host")]
    pub dlm_dashboard_port: Option<String>,

    /// SQL Change Automation version ("latest" or a version)
    #[arg(long, default_value = "latest", value_parser = parse_product_version)]
    pub product_version: ProductVersion,
}

impl From<&BuildArgs> for BuildStep {
    fn from(args: &BuildArgs) -> Self {
        let source = match (&args.subfolder, &args.project) {
            (_, Some(project)) => DbFolder::Project(project.clone()),
            (Some(subfolder), None) => DbFolder::Subfolder(subfolder.clone()),
            (None, None) => DbFolder::VcsRoot,
        };

        let dlm_dashboard = match (&args.dlm_dashboard_host, &args.dlm_dashboard_port) {
            (Some(host), Some(port)) => Some(DlmDashboard {
                host: host.clone(),
                port: port.clone(),
            }),
            _ => None,
        };

        BuildStep {
            source,
            package_id: args.package_id.clone(),
            package_version: args.package_version.clone(),
            options: args.options.clone(),
            transaction_isolation_level: args.isolation_level,
            filter: args.filter.clone(),
            temp_server: args.temp.to_temporary_database(false, false),
            dlm_dashboard,
            product_version: args.product_version.clone(),
        }
    }
}

/// Arguments for the `test` command.
#[derive(Debug, Clone, clap::Args)]
pub struct TestArgs {
    /// Package id of a package built earlier
    #[arg(long, required_unless_present = "project")]
    pub package_id: Option<String>,

    /// Package version (defaults to 1.0.<build number>)
    #[arg(long)]
    pub package_version: Option<String>,

    /// Test a SQL Change Automation project instead of a package
    #[arg(long)]
    pub project: Option<PathBuf>,

    #[command(flatten)]
    pub temp: TempServerArgs,

    /// Encrypt the temporary database connection
    #[arg(long, requires = "temp_server")]
    pub encrypt_connection: bool,

    /// Trust the temporary server's certificate
    #[arg(long, requires = "temp_server")]
    pub trust_server_certificate: bool,

    /// Run only this test or test class
    #[arg(long)]
    pub run_only: Option<String>,

    /// SQL Data Generator project
    #[arg(long)]
    pub sql_data_generator: Option<String>,

    /// SQL Compare options
    #[arg(long, allow_hyphen_values = true)]
    pub options: Option<String>,

    /// SQL Data Compare options
    #[arg(long, allow_hyphen_values = true)]
    pub data_options: Option<String>,

    /// SQL Compare filter file
    #[arg(long)]
    pub filter: Option<String>,

    /// SQL Change Automation version ("latest" or a version)
    #[arg(long, default_value = "latest", value_parser = parse_product_version)]
    pub product_version: ProductVersion,
}

impl From<&TestArgs> for TestStep {
    fn from(args: &TestArgs) -> Self {
        TestStep {
            source: args
                .project
                .clone()
                .map_or(TestSource::Package, TestSource::Project),
            package_id: args.package_id.clone().unwrap_or_default(),
            package_version: args.package_version.clone(),
            temp_server: args
                .temp
                .to_temporary_database(args.encrypt_connection, args.trust_server_certificate),
            run_only: args.run_only.clone(),
            sql_data_generator: args.sql_data_generator.clone(),
            options: args.options.clone(),
            data_options: args.data_options.clone(),
            filter: args.filter.clone(),
            product_version: args.product_version.clone(),
        }
    }
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    /// Package id
    #[arg(long)]
    pub package_id: String,

    /// Package version (defaults to 1.0.<build number>)
    #[arg(long)]
    pub package_version: Option<String>,

    /// Target SQL Server
    #[arg(long)]
    pub server: String,

    /// Target database
    #[arg(long)]
    pub database: String,

    /// SQL Server login (Windows authentication when omitted)
    #[arg(long)]
    pub username: Option<String>,

    /// SQL Server password
    #[arg(long, env = "SQLCI_DATABASE_PASSWORD", hide_env_values = true, value_parser = parse_secret)]
    pub password: Option<Secret>,

    /// SQL Compare options
    #[arg(long, allow_hyphen_values = true)]
    pub options: Option<String>,

    /// SQL Compare filter file
    #[arg(long)]
    pub filter: Option<String>,

    /// Transaction isolation level
    #[arg(long, value_enum)]
    pub isolation_level: Option<TransactionIsolationLevel>,

    /// Also write the deployment script
    #[arg(long)]
    pub update_script: bool,
}

impl From<&SyncArgs> for SyncStep {
    fn from(args: &SyncArgs) -> Self {
        SyncStep {
            package_id: args.package_id.clone(),
            package_version: args.package_version.clone(),
            server_name: args.server.clone(),
            database_name: args.database.clone(),
            auth: server_auth(args.username.as_deref(), args.password.as_ref()),
            options: args.options.clone(),
            filter: args.filter.clone(),
            transaction_isolation_level: args.isolation_level,
            update_script: args.update_script,
        }
    }
}

/// Arguments for the `publish` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PublishArgs {
    /// Package id
    #[arg(long)]
    pub package_id: String,

    /// Package version (defaults to 1.0.<build number>)
    #[arg(long)]
    pub package_version: Option<String>,

    /// NuGet feed URL
    #[arg(long)]
    pub feed_url: String,

    /// NuGet feed API key
    #[arg(long, env = "SQLCI_NUGET_API_KEY", hide_env_values = true, value_parser = parse_secret)]
    pub api_key: Option<Secret>,

    /// SQL Change Automation version ("latest" or a version)
    #[arg(long, default_value = "latest", value_parser = parse_product_version)]
    pub product_version: ProductVersion,
}

impl From<&PublishArgs> for PublishStep {
    fn from(args: &PublishArgs) -> Self {
        PublishStep {
            package_id: args.package_id.clone(),
            package_version: args.package_version.clone(),
            feed_url: args.feed_url.clone(),
            api_key: args.api_key.clone(),
            product_version: args.product_version.clone(),
        }
    }
}

/// Arguments for the `show` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
