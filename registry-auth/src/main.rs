#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use clap::{Args, Parser, Subcommand};
use registry_auth::credentials::encode_basic;
use registry_auth::expiry::parse_expiry;
use registry_auth::{AuthConfig, Authenticator, Capability, RegistryTokens, TOKEN_USERNAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Issue and verify registry bearer tokens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a P-256 key pair
    Keygen {
        /// Also write private.key and public.key into this directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Issue a signed token
    Issue(IssueArgs),
    /// Check a token against a request using the configured public key
    Verify(VerifyArgs),
}

#[derive(Args)]
struct IssueArgs {
    /// Private key, or @FILE to read it from a file
    #[arg(long, env = "REGISTRY_AUTH_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    /// Grant pull only instead of pull and push
    #[arg(long)]
    read_only: bool,
    /// Lifetime such as 30s, 15m, 12h or 7d; omit for a token that never expires
    #[arg(long, default_value = "")]
    expiry: String,
    /// Comma-separated namespaces; omit to allow every namespace
    #[arg(long, value_delimiter = ',')]
    namespaces: Vec<String>,
    /// Opaque account reference stored in the token
    #[arg(long)]
    account_id: Option<String>,
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long, default_value = "GET")]
    method: String,
    /// Request path, e.g. /v2/team/manifests/latest
    #[arg(long)]
    path: String,
    #[arg(long)]
    token: String,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registry_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Keygen { out_dir } => keygen(out_dir),
        Command::Issue(args) => issue(args),
        Command::Verify(args) => verify(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn keygen(out_dir: Option<PathBuf>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let pair = RegistryTokens::create_key_pair()?;

    println!("Private key:\n{}\n", pair.private_key);
    println!("Public key:\n{}", pair.public_key);

    if let Some(dir) = out_dir {
        let (private_path, public_path) = pair.write_to_dir(&dir)?;
        tracing::info!(
            "wrote {} and {}",
            private_path.display(),
            public_path.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn issue(args: IssueArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let private_key = match args.private_key.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => args.private_key,
    };

    let capabilities = if args.read_only {
        BTreeSet::from([Capability::Pull])
    } else {
        BTreeSet::from([Capability::Pull, Capability::Push])
    };
    let namespaces: Vec<String> = args
        .namespaces
        .iter()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
        .collect();
    let expiry_minutes = parse_expiry(&args.expiry)?;

    let token = RegistryTokens::issue(
        &capabilities,
        &private_key,
        &namespaces,
        expiry_minutes,
        args.account_id.as_deref(),
    )?;

    tracing::info!(
        ?capabilities,
        ?namespaces,
        ?expiry_minutes,
        "issued registry token"
    );
    println!("Token:\n{token}\n");
    println!("Authorization header:\n{}", encode_basic(TOKEN_USERNAME, &token));
    Ok(ExitCode::SUCCESS)
}

fn verify(args: &VerifyArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AuthConfig::from_env()?;
    let tokens = RegistryTokens::from_config(&config)?;

    let request = Request::builder()
        .method(args.method.as_str())
        .uri(args.path.as_str())
        .header(AUTHORIZATION, encode_basic(TOKEN_USERNAME, &args.token))
        .body(())?;

    match tokens.check_credentials(&request).into_payload() {
        Some(payload) => {
            println!("verified");
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("denied");
            Ok(ExitCode::FAILURE)
        }
    }
}
