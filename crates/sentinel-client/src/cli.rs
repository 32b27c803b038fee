//! `sentinel-cli`: local signing and orchestrator commands

use clap::{Args, Parser, Subcommand, ValueEnum};
use sentinel_crypto::normalize_digest;
use sentinel_keyring::{load_signers, KeyInfo, KeyringError, MemoryKeyring, Signer};
use sentinel_log::LogFormat;
use sentinel_types::api::{CreateTransactionRequest, SignTransactionRequest};
use sentinel_types::{Config, ProposalId};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{ClientError, OrchestratorClient};

/// Signature collection client
#[derive(Parser, Debug)]
#[command(name = "sentinel-cli")]
#[command(about = "Sign digests and drive the sentinel orchestrator")]
#[command(version)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global_opts: GlobalOpts,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global CLI options
#[derive(Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Orchestrator API root, overrides `client.orchestrator_url`
    #[arg(long, global = true)]
    pub orchestrator: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect locally configured signer keys
    Keys(KeysCmd),

    /// Sign a digest with a local key, without contacting the orchestrator
    Sign(SignCmd),

    /// Create a transaction proposal
    Propose(ProposeCmd),

    /// Sign a proposal with local keys and submit the signatures
    Approve(ApproveCmd),

    /// Show a proposal's quorum status
    Status(TxIdArg),

    /// Execute a proposal once the quorum is met
    Execute(TxIdArg),

    /// Show the wallet's threshold and owners
    Info,
}

/// Keys command
#[derive(Parser, Debug)]
pub struct KeysCmd {
    #[command(subcommand)]
    pub action: KeysAction,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// List signers whose key variable is set
    List,
}

#[derive(Parser, Debug)]
pub struct SignCmd {
    /// Digest to sign; short or unprefixed hex is normalized
    #[arg(long)]
    pub digest: String,

    /// Signer name from the configuration
    #[arg(long)]
    pub signer: String,
}

#[derive(Parser, Debug)]
pub struct ProposeCmd {
    /// Destination address
    #[arg(long)]
    pub to: String,

    /// Amount in the smallest unit
    #[arg(long)]
    pub value: String,

    /// Call data as hex
    #[arg(long)]
    pub data: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ApproveCmd {
    /// Proposal id
    pub tx_id: ProposalId,

    /// Signers to use; all loaded signers when omitted
    #[arg(long = "signer")]
    pub signers: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct TxIdArg {
    /// Proposal id
    pub tx_id: ProposalId,
}

/// One signature produced by `sign` or `approve`
#[derive(Debug, Serialize)]
pub struct SignedDigest {
    pub signer: String,
    pub address: String,
    pub digest: String,
    pub signature: String,
}

/// Implementation block for GlobalOpts to resolve values from Config
impl GlobalOpts {
    /// Get the effective orchestrator URL (from CLI arg or config)
    pub fn orchestrator_url(&self, config: &Config) -> String {
        self.orchestrator
            .clone()
            .unwrap_or_else(|| config.client.orchestrator_url.clone())
    }
}

/// CLI command handler
pub struct CliHandler {
    /// Global options
    pub global_opts: GlobalOpts,
    /// Configuration
    pub config: Config,
}

impl CliHandler {
    pub fn new(global_opts: GlobalOpts, config: Config) -> Self {
        Self {
            global_opts,
            config,
        }
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: Commands) -> crate::Result<()> {
        match command {
            Commands::Keys(cmd) => self.handle_keys(cmd).await,
            Commands::Sign(cmd) => self.handle_sign(cmd).await,
            Commands::Propose(cmd) => self.handle_propose(cmd).await,
            Commands::Approve(cmd) => self.handle_approve(cmd).await,
            Commands::Status(cmd) => self.handle_status(cmd).await,
            Commands::Execute(cmd) => self.handle_execute(cmd).await,
            Commands::Info => self.handle_info().await,
        }
    }

    fn client(&self) -> crate::Result<OrchestratorClient> {
        let mut client_config = self.config.client.clone();
        client_config.orchestrator_url = self.global_opts.orchestrator_url(&self.config);
        OrchestratorClient::from_config(&client_config)
    }

    async fn keyring(&self) -> crate::Result<(Arc<MemoryKeyring>, Vec<KeyInfo>)> {
        let mut keyring = MemoryKeyring::new();
        let loaded = load_signers(&mut keyring, &self.config.signers, |name| {
            std::env::var(name).ok()
        })
        .await?;
        Ok((Arc::new(keyring), loaded))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> crate::Result<()> {
        match self.global_opts.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => println!("{}", text()),
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn handle_keys(&self, cmd: KeysCmd) -> crate::Result<()> {
        match cmd.action {
            KeysAction::List => {
                let (_, keys) = self.keyring().await?;
                if keys.is_empty() {
                    warn!("No signer keys found in the environment");
                }
                self.emit(&keys, || {
                    keys.iter()
                        .map(|k| format!("{:<12} {:<6} {}", k.name, k.role, k.address))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn handle_sign(&self, cmd: SignCmd) -> crate::Result<()> {
        let digest = normalize_digest(&cmd.digest)?;
        let (keyring, _) = self.keyring().await?;
        let signer = Signer::from_keyring(keyring, &cmd.signer).await?;
        let approval = signer.sign(&digest).await?;

        let signed = SignedDigest {
            signer: signer.name().to_string(),
            address: approval.signer.to_string(),
            digest: digest.to_hex(),
            signature: approval.signature.to_hex(),
        };
        self.emit(&signed, || {
            format!(
                "Signer:    {}\nAddress:   {}\nDigest:    {}\nSignature: {}",
                signed.signer, signed.address, signed.digest, signed.signature
            )
        })
    }

    #[tracing::instrument(skip(self))]
    async fn handle_propose(&self, cmd: ProposeCmd) -> crate::Result<()> {
        let client = self.client()?;
        let created = client
            .create_transaction(&CreateTransactionRequest {
                to: cmd.to,
                value: cmd.value,
                data: cmd.data,
            })
            .await?;
        info!(tx_id = %created.tx_id, "Proposal created");

        self.emit(&created, || {
            format!(
                "Proposal:  {}\nDigest:    {}\nRequired:  {}",
                created.tx_id, created.safe_tx_hash, created.required_signatures
            )
        })
    }

    #[tracing::instrument(skip(self))]
    async fn handle_approve(&self, cmd: ApproveCmd) -> crate::Result<()> {
        let client = self.client()?;
        let transaction = client.get_transaction(&cmd.tx_id).await?;
        let digest = transaction.safe_tx_hash;

        let (keyring, _) = self.keyring().await?;
        let signers = select_signers(keyring, &cmd.signers).await?;

        let mut results = Vec::new();
        for signer in &signers {
            let name = signer.name();
            let approval = signer.sign(&digest).await?;
            let request = SignTransactionRequest {
                signer_address: approval.signer.to_string(),
                signature: approval.signature.to_hex(),
            };

            // A rejected signer does not stop the remaining ones
            match client.sign_transaction(&cmd.tx_id, &request).await {
                Ok(receipt) => {
                    info!(
                        signer = %name,
                        collected = receipt.collected_count,
                        threshold = receipt.threshold,
                        state = %receipt.state,
                        "Signature accepted"
                    );
                    results.push(serde_json::json!({
                        "signer": name,
                        "accepted": true,
                        "collected_count": receipt.collected_count,
                        "threshold": receipt.threshold,
                        "state": receipt.state,
                    }));
                }
                Err(e) => {
                    warn!(signer = %name, error = %e, "Signature rejected");
                    results.push(serde_json::json!({
                        "signer": name,
                        "accepted": false,
                        "error": e.to_string(),
                    }));
                }
            }
        }

        self.emit(&results, || {
            results
                .iter()
                .map(|r| match r["accepted"].as_bool() {
                    Some(true) => format!(
                        "{:<12} accepted ({}/{}, {})",
                        r["signer"].as_str().unwrap_or_default(),
                        r["collected_count"],
                        r["threshold"],
                        r["state"].as_str().unwrap_or_default()
                    ),
                    _ => format!(
                        "{:<12} rejected: {}",
                        r["signer"].as_str().unwrap_or_default(),
                        r["error"].as_str().unwrap_or_default()
                    ),
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    #[tracing::instrument(skip(self))]
    async fn handle_status(&self, cmd: TxIdArg) -> crate::Result<()> {
        let status = self.client()?.transaction_status(&cmd.tx_id).await?;
        self.emit(&status, || {
            let mut lines = vec![
                format!("Proposal:  {}", status.tx_id),
                format!("State:     {}", status.status),
                format!(
                    "Collected: {}/{}",
                    status.signatures_collected, status.required_signatures
                ),
            ];
            for signer in &status.signers {
                let role = signer.role.map(|r| r.to_string()).unwrap_or_default();
                lines.push(format!("  {} {}", signer.address, role));
            }
            lines.join("\n")
        })
    }

    #[tracing::instrument(skip(self))]
    async fn handle_execute(&self, cmd: TxIdArg) -> crate::Result<()> {
        let report = self.client()?.execute_transaction(&cmd.tx_id).await?;
        if !report.execution_result.success {
            warn!(tx_id = %cmd.tx_id, "Execution sink reported a failure");
        }
        self.emit(&report, || {
            let result = &report.execution_result;
            format!(
                "Proposal:  {}\nState:     {}\nSuccess:   {}\nTx hash:   {}",
                report.proposal_id,
                report.state,
                result.success,
                result
                    .tx_hash
                    .as_deref()
                    .or(result.message.as_deref())
                    .unwrap_or("-")
            )
        })
    }

    #[tracing::instrument(skip(self))]
    async fn handle_info(&self) -> crate::Result<()> {
        let info = self.client()?.safe_info().await?;
        self.emit(&info, || {
            format!(
                "Threshold: {}/{}\nHumans:    {}\nAgents:    {}\nNext nonce: {}",
                info.threshold,
                info.total_signers,
                info.owners.humans.len(),
                info.owners.agents.len(),
                info.next_nonce
            )
        })
    }
}

/// Signers for `names`, or every key in the keyring when `names` is empty
async fn select_signers(
    keyring: Arc<MemoryKeyring>,
    names: &[String],
) -> crate::Result<Vec<Signer<MemoryKeyring>>> {
    let signers = if names.is_empty() {
        Signer::all(keyring).await?
    } else {
        let mut signers = Vec::with_capacity(names.len());
        for name in names {
            signers.push(Signer::from_keyring(Arc::clone(&keyring), name).await?);
        }
        signers
    };
    if signers.is_empty() {
        return Err(KeyringError::KeyNotFound("no signers loaded".to_string()).into());
    }
    Ok(signers)
}

/// Parse CLI arguments and execute commands
pub async fn run() -> crate::Result<()> {
    let cli = Cli::parse();

    let directive = cli.global_opts.verbose.then_some("debug");
    if let Err(e) = sentinel_log::init(LogFormat::Compact, directive) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = Config::load(cli.global_opts.config.as_deref())?;
    let handler = CliHandler::new(cli.global_opts, config);
    handler.execute(cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sign_command() {
        let cli = Cli::parse_from([
            "sentinel-cli",
            "--output",
            "json",
            "sign",
            "--digest",
            "0x1234",
            "--signer",
            "human-1",
        ]);
        assert_eq!(cli.global_opts.output, OutputFormat::Json);
        match cli.command {
            Commands::Sign(cmd) => {
                assert_eq!(cmd.digest, "0x1234");
                assert_eq!(cmd.signer, "human-1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_approve_with_multiple_signers() {
        let id = ProposalId::new();
        let id_str = id.to_string();
        let cli = Cli::parse_from([
            "sentinel-cli",
            "approve",
            id_str.as_str(),
            "--signer",
            "human-1",
            "--signer",
            "ai-cfo",
        ]);
        match cli.command {
            Commands::Approve(cmd) => {
                assert_eq!(cmd.tx_id, id);
                assert_eq!(cmd.signers, vec!["human-1", "ai-cfo"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_tx_id_rejected() {
        assert!(Cli::try_parse_from(["sentinel-cli", "status", "nope"]).is_err());
    }

    #[test]
    fn test_orchestrator_override() {
        let cli = Cli::parse_from([
            "sentinel-cli",
            "--orchestrator",
            "http://10.0.0.1:3001/api/v1",
            "info",
        ]);
        let config = Config::default();
        assert_eq!(
            cli.global_opts.orchestrator_url(&config),
            "http://10.0.0.1:3001/api/v1"
        );

        let cli = Cli::parse_from(["sentinel-cli", "info"]);
        assert_eq!(
            cli.global_opts.orchestrator_url(&config),
            config.client.orchestrator_url
        );
    }

    #[tokio::test]
    async fn test_sign_with_unknown_signer_fails() {
        let mut config = Config::default();
        config.signers.clear();
        let cli = Cli::parse_from(["sentinel-cli", "sign", "--digest", "0x00", "--signer", "x"]);
        let handler = CliHandler::new(cli.global_opts, config);
        let err = handler.execute(cli.command).await.unwrap_err();
        assert!(matches!(err, ClientError::Keyring(_)));
    }

    #[tokio::test]
    async fn test_sign_rejects_bad_digest() {
        let cli = Cli::parse_from(["sentinel-cli", "sign", "--digest", "0xzz", "--signer", "x"]);
        let handler = CliHandler::new(cli.global_opts, Config::default());
        let err = handler.execute(cli.command).await.unwrap_err();
        assert!(matches!(err, ClientError::Sentinel(_)));
    }

    #[tokio::test]
    async fn test_select_signers_signs_through_keyring() {
        use sentinel_crypto::PrivateKey;
        use sentinel_keyring::Keyring;
        use sentinel_types::{Digest, SignerRole};

        let mut keyring = MemoryKeyring::new();
        for (name, role) in [("human-1", SignerRole::Human), ("ai-cfo", SignerRole::Agent)] {
            let secret: String = PrivateKey::random()
                .to_bytes()
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect();
            keyring.import_private_key(name, role, &secret).await.unwrap();
        }
        let keyring = Arc::new(keyring);

        let all = select_signers(Arc::clone(&keyring), &[]).await.unwrap();
        assert_eq!(all.len(), 2);

        let chosen = select_signers(Arc::clone(&keyring), &["ai-cfo".to_string()])
            .await
            .unwrap();
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].role(), SignerRole::Agent);

        let digest = Digest::keccak(b"approve");
        let approval = chosen[0].sign(&digest).await.unwrap();
        assert_eq!(approval.signer, chosen[0].identity());
        assert!(approval.verify(&digest).is_ok());

        let missing = select_signers(Arc::clone(&keyring), &["ghost".to_string()]).await;
        assert!(matches!(
            missing,
            Err(ClientError::Keyring(KeyringError::KeyNotFound(_)))
        ));

        let empty = select_signers(Arc::new(MemoryKeyring::new()), &[]).await;
        assert!(matches!(empty, Err(ClientError::Keyring(_))));
    }
}
