use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use did_jis_core::{Did, DidEngine, IdentityDocument, JisError};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[clap(name = "did-jis", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML configuration file (default: ./did-jis.toml if present).
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 64 character hex secret key; overrides the configuration file.
    #[clap(long, global = true, env = "DID_JIS_SECRET_KEY", hide_env_values = true)]
    pub secret: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh keypair and print its public identity.
    Keygen {
        /// Also print the secret key.
        #[clap(long)]
        show_secret: bool,
    },
    /// Print the public key of the configured secret.
    Pubkey,
    /// Build `did:jis:<id>` from an identifier.
    Create { id: String },
    /// Print the DID derived from the configured key.
    FromKey,
    /// Split a DID into method and identifier.
    Parse { did: String },
    /// Exit with status 1 unless the DID is a valid did:jis identifier.
    Validate { did: String },
    /// Build and sign a DID document.
    Document { did: String },
    /// Check the proof of a DID document read from a file or `-` for stdin.
    VerifyDocument { path: PathBuf },
    /// Sign a message with the configured key.
    Sign { message: String },
    /// Verify a hex signature with the configured key or `--public-key`.
    Verify {
        message: String,
        signature: String,
        /// Verify with this hex public key instead of the configured key.
        #[clap(long)]
        public_key: Option<String>,
    },
    /// Print the library version.
    Version,
}

/// How a successful run should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The command ran but its check did not pass (exit status 1).
    Rejected,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyInfo {
    did: Did,
    public_key: String,
    public_key_multibase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
}

#[derive(Serialize)]
struct ParsedOutput<'a> {
    method: &'a str,
    id: &'a str,
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{}", rendered)?;
    Ok(())
}

/// Engine from `--secret`, then the configured secret, then a fresh key.
fn engine_for(cli: &Cli, config: &CliConfig) -> Result<DidEngine> {
    let engine = match cli.secret.as_deref().or(config.secret_key_hex.as_deref()) {
        Some(secret) => DidEngine::from_secret(secret).context("Failed to restore secret key")?,
        None => {
            warn!("no secret key configured, using an ephemeral key");
            DidEngine::generate().context("Failed to generate keypair")?
        }
    };
    Ok(engine.with_policy(config.binding_policy))
}

fn read_document(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        io::read_to_string(io::stdin()).context("Failed to read document from stdin")
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document file: {:?}", path))
    }
}

fn describe(err: JisError, input: &str) -> anyhow::Error {
    anyhow::Error::new(err).context(format!("Rejected input '{}'", input))
}

pub fn run<W: Write>(cli: &Cli, config: &CliConfig, out: &mut W) -> Result<Outcome> {
    match &cli.command {
        Commands::Keygen { show_secret } => {
            let engine = DidEngine::generate().context("Failed to generate keypair")?;
            let info = KeyInfo {
                did: engine.create_did_from_key(),
                public_key: engine.public_key_hex(),
                public_key_multibase: engine.public_key_multibase(),
                secret_key: show_secret.then(|| engine.keypair().secret_key_hex()),
            };
            info!(did = %info.did, "generated keypair");
            write_json(out, &info, config.pretty)?;
        }
        Commands::Pubkey => {
            let engine = engine_for(cli, config)?;
            writeln!(out, "{}", engine.public_key_hex())?;
        }
        Commands::Create { id } => {
            let did = Did::new(id).map_err(|e| describe(e, id))?;
            writeln!(out, "{}", did)?;
        }
        Commands::FromKey => {
            let engine = engine_for(cli, config)?;
            writeln!(out, "{}", engine.create_did_from_key())?;
        }
        Commands::Parse { did } => {
            let parsed = DidEngine::parse_did(did).map_err(|e| describe(e, did))?;
            let view = ParsedOutput {
                method: &parsed.method,
                id: &parsed.id,
            };
            write_json(out, &view, config.pretty)?;
        }
        Commands::Validate { did } => {
            let valid = DidEngine::is_valid_did(did);
            writeln!(out, "{}", if valid { "valid" } else { "invalid" })?;
            if !valid {
                return Ok(Outcome::Rejected);
            }
        }
        Commands::Document { did } => {
            let engine = engine_for(cli, config)?;
            let doc = engine.create_document(did).map_err(|e| describe(e, did))?;
            let json = if config.pretty { doc.to_json_pretty()? } else { doc.to_json()? };
            writeln!(out, "{}", json)?;
        }
        Commands::VerifyDocument { path } => {
            let json = read_document(path)?;
            let doc = IdentityDocument::from_json(&json)
                .with_context(|| format!("Failed to parse DID document: {:?}", path))?;
            let valid = doc
                .verify()
                .with_context(|| format!("Failed to check proof of {}", doc.id))?;
            writeln!(out, "{}: {}", doc.id, if valid { "valid" } else { "invalid" })?;
            if !valid {
                return Ok(Outcome::Rejected);
            }
        }
        Commands::Sign { message } => {
            let engine = engine_for(cli, config)?;
            writeln!(out, "{}", engine.sign(message.as_bytes()))?;
        }
        Commands::Verify {
            message,
            signature,
            public_key,
        } => {
            let valid = match public_key {
                Some(pk) => DidEngine::verify_with_key(message.as_bytes(), signature, pk),
                None => engine_for(cli, config)?
                    .verify(message.as_bytes(), signature)
                    .map_err(|e| describe(e, signature))?,
            };
            writeln!(out, "{}", if valid { "valid" } else { "invalid" })?;
            if !valid {
                return Ok(Outcome::Rejected);
            }
        }
        Commands::Version => {
            writeln!(out, "{}", did_jis_core::VERSION)?;
        }
    }
    Ok(Outcome::Success)
}
