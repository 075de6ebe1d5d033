//! Configuration of the `permit-relay` binary.
//!
//! Every setting is a command line flag with an environment variable
//! fallback. `.env` is loaded before parsing. Secrets accept `$VAR` /
//! `${VAR}` indirection.

use alloy_primitives::{Address, U256};
use clap::{Parser, ValueEnum};
use permit_relay_client::{PollConfig, RelayClient, RetryPolicy, TaskId};
use permit_relay_eip155::chain::config::EvmPrivateKey;
use permit_relay_eip155::contract::{SpenderCall, SwapConfig};
use permit_relay_eip155::permit::PermitAmount;
use permit_relay_types::config::{ApiKey, LiteralOrEnv, RpcConfig};
use permit_relay_types::timestamp::UnixTimestamp;
use permit_relay_types::util::{DecimalAmount, DecimalAmountError};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Which spender contract pays the relay, and in what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeeMode {
    /// Relay fee paid in the permitted token.
    Token,
    /// Relay fee paid in native currency, swapped from the permitted token.
    Native,
}

/// CLI arguments for the permit relay client.
#[derive(Parser, Debug)]
#[command(name = "permit-relay")]
#[command(about = "Gas-sponsored ERC-20 permit transfers through a relay network")]
struct CliArgs {
    /// RPC endpoint(s), comma separated
    #[arg(long, env = "RPC_URL", value_delimiter = ',')]
    rpc_url: Vec<Url>,
    /// Max requests per second to each RPC endpoint
    #[arg(long, env = "RPC_RATE_LIMIT")]
    rpc_rate_limit: Option<u32>,
    /// Signer private key, hex or `$VAR`
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<LiteralOrEnv<EvmPrivateKey>>,
    #[arg(long, env = "RELAY_API_URL", default_value = RelayClient::DEFAULT_BASE_URL)]
    relay_api_url: String,
    /// Relay sponsor API key, literal or `$VAR`
    #[arg(long, env = "RELAY_API_KEY", hide_env_values = true)]
    relay_api_key: Option<LiteralOrEnv<ApiKey>>,
    /// Spender contract the relay calls
    #[arg(long, env = "TARGET_ADDRESS")]
    target_address: Option<String>,
    /// ERC-2612 token to transfer
    #[arg(long, env = "TOKEN_ADDRESS")]
    token_address: Option<String>,
    /// Amount in whole tokens, e.g. `100.5`
    #[arg(long, env = "AMOUNT")]
    amount: Option<String>,
    #[arg(long, env = "PERMIT_DEADLINE_SECS", default_value_t = 3600)]
    permit_deadline_secs: u64,
    #[arg(long, env = "GAS_LIMIT", default_value_t = 300_000)]
    gas_limit: u64,
    /// Safety margin on the estimated relay fee, in basis points
    #[arg(long, env = "FEE_BUFFER_BPS", default_value_t = 2000)]
    fee_buffer_bps: u32,
    #[arg(
        long,
        env = "HIGH_PRIORITY",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    high_priority: bool,
    #[arg(long, env = "FEE_MODE", value_enum, default_value_t = FeeMode::Token)]
    fee_mode: FeeMode,
    /// Minimum native currency out of the fee swap, in wei (native fee mode)
    #[arg(long, env = "SWAP_MIN_OUT")]
    swap_min_out: Option<String>,
    #[arg(long, env = "SWAP_DEADLINE_SECS", default_value_t = 1800)]
    swap_deadline_secs: u64,
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 5000)]
    poll_interval_ms: u64,
    #[arg(long, env = "POLL_MAX_ATTEMPTS", default_value_t = 60)]
    poll_max_attempts: u32,
    /// Poll an existing task instead of submitting a new one
    #[arg(long, env = "TASK_ID")]
    task_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
    #[error("Invalid AMOUNT: {0}")]
    Amount(#[from] DecimalAmountError),
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(name))
}

fn parse<T>(value: &str, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        message: e.to_string(),
    })
}

/// How the spender contract pays the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePayment {
    Token,
    Native { min_out: U256, swap_deadline_secs: u64 },
}

/// Settings of a new transfer.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub rpc: Vec<RpcConfig>,
    pub private_key: EvmPrivateKey,
    pub token: Address,
    pub target: Address,
    pub amount: DecimalAmount,
    pub permit_deadline_secs: u64,
    pub gas_limit: u64,
    pub high_priority: bool,
    pub fee_buffer_bps: u32,
    pub fee: FeePayment,
}

impl SubmitConfig {
    /// Permit amount as requested on the command line.
    pub fn permit_amount(&self) -> PermitAmount {
        PermitAmount::Decimal(self.amount.clone())
    }

    pub fn permit_deadline(&self, now: UnixTimestamp) -> UnixTimestamp {
        now + self.permit_deadline_secs
    }

    /// Spender call with deadlines counted from `now`.
    pub fn spender_call(&self, now: UnixTimestamp) -> SpenderCall {
        match self.fee {
            FeePayment::Token => SpenderCall::TokenFee,
            FeePayment::Native {
                min_out,
                swap_deadline_secs,
            } => SpenderCall::NativeFee {
                swap: SwapConfig {
                    min_out,
                    deadline: now + swap_deadline_secs,
                },
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Submit(Box<SubmitConfig>),
    Resume(TaskId),
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub relay_api_url: String,
    pub relay_api_key: ApiKey,
    pub retry: RetryPolicy,
    pub poll: PollConfig,
    pub mode: Mode,
}

impl Config {
    /// Parses command line and environment.
    ///
    /// `--help` and `--version` print and exit here.
    pub fn load() -> Result<Self, ConfigError> {
        let args = match CliArgs::try_parse() {
            Ok(args) => args,
            Err(err) if !err.use_stderr() => err.exit(),
            Err(err) => return Err(err.into()),
        };
        Self::from_args(args)
    }

    fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let relay_api_key = required(args.relay_api_key.clone(), "RELAY_API_KEY")?.into_inner();
        if relay_api_key.is_empty() {
            return Err(ConfigError::Missing("RELAY_API_KEY"));
        }
        let retry = RetryPolicy::new(args.max_retries, Duration::from_millis(args.retry_delay_ms));
        let poll = PollConfig {
            interval: Duration::from_millis(args.poll_interval_ms),
            max_attempts: args.poll_max_attempts,
        };

        let resume = args
            .task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let mode = match resume {
            Some(task_id) => Mode::Resume(TaskId::new(task_id)),
            None => Mode::Submit(Box::new(Self::submit_config(&args)?)),
        };

        Ok(Self {
            relay_api_url: args.relay_api_url,
            relay_api_key,
            retry,
            poll,
            mode,
        })
    }

    fn submit_config(args: &CliArgs) -> Result<SubmitConfig, ConfigError> {
        if args.rpc_url.is_empty() {
            return Err(ConfigError::Missing("RPC_URL"));
        }
        let rpc = args
            .rpc_url
            .iter()
            .map(|url| RpcConfig::new(url.clone()).with_rate_limit(args.rpc_rate_limit))
            .collect();
        let private_key = *required(args.private_key.clone(), "PRIVATE_KEY")?.inner();
        let token = parse(required(args.token_address.as_deref(), "TOKEN_ADDRESS")?, "TOKEN_ADDRESS")?;
        let target = parse(
            required(args.target_address.as_deref(), "TARGET_ADDRESS")?,
            "TARGET_ADDRESS",
        )?;
        let amount = DecimalAmount::parse(required(args.amount.as_deref(), "AMOUNT")?)?;

        let fee = match args.fee_mode {
            FeeMode::Token => FeePayment::Token,
            FeeMode::Native => FeePayment::Native {
                min_out: parse(
                    required(args.swap_min_out.as_deref(), "SWAP_MIN_OUT")?,
                    "SWAP_MIN_OUT",
                )?,
                swap_deadline_secs: args.swap_deadline_secs,
            },
        };

        Ok(SubmitConfig {
            rpc,
            private_key,
            token,
            target,
            amount,
            permit_deadline_secs: args.permit_deadline_secs,
            gas_limit: args.gas_limit,
            high_priority: args.high_priority,
            fee_buffer_bps: args.fee_buffer_bps,
            fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TOKEN: &str = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";
    const TARGET: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn parse_args(args: &[&str]) -> Result<Config, ConfigError> {
        let args = CliArgs::try_parse_from(std::iter::once("permit-relay").chain(args.iter().copied()))?;
        Config::from_args(args)
    }

    fn submit_args() -> Vec<&'static str> {
        vec![
            "--rpc-url",
            "http://localhost:8545,http://localhost:8546",
            "--private-key",
            KEY,
            "--relay-api-key",
            "sponsor",
            "--token-address",
            TOKEN,
            "--target-address",
            TARGET,
            "--amount",
            "100.0",
        ]
    }

    #[test]
    fn test_submit_mode_defaults() {
        let config = parse_args(&submit_args()).unwrap();
        assert_eq!(config.relay_api_url, "https://api.gelato.digital");
        assert_eq!(config.retry, RetryPolicy::new(3, Duration::from_millis(2000)));
        assert_eq!(config.poll, PollConfig::default());
        let Mode::Submit(submit) = config.mode else {
            panic!("expected submit mode");
        };
        assert_eq!(submit.rpc.len(), 2);
        assert_eq!(submit.gas_limit, 300_000);
        assert_eq!(submit.fee_buffer_bps, 2000);
        assert_eq!(submit.permit_deadline_secs, 3600);
        assert!(!submit.high_priority);
        assert_eq!(submit.fee, FeePayment::Token);
        assert_eq!(submit.target.to_string(), TARGET);
        assert_eq!(submit.amount.to_base_units(6).unwrap(), U256::from(100_000_000u64));
    }

    #[test]
    fn test_task_id_selects_resume_mode() {
        let config = parse_args(&["--relay-api-key", "sponsor", "--task-id", "0xtask"]).unwrap();
        assert!(matches!(config.mode, Mode::Resume(ref id) if id.as_str() == "0xtask"));
    }

    #[test]
    fn test_api_key_is_required() {
        let result = parse_args(&["--task-id", "0xtask"]);
        assert!(matches!(result, Err(ConfigError::Missing("RELAY_API_KEY"))));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let mut args = submit_args();
        let amount = args.iter().position(|a| *a == "100.0").unwrap();
        args[amount] = "0";
        assert!(matches!(
            parse_args(&args),
            Err(ConfigError::Amount(DecimalAmountError::Zero))
        ));
    }

    #[test]
    fn test_native_mode_requires_swap_min_out() {
        let mut args = submit_args();
        args.extend(["--fee-mode", "native"]);
        assert!(matches!(
            parse_args(&args),
            Err(ConfigError::Missing("SWAP_MIN_OUT"))
        ));

        args.extend(["--swap-min-out", "1000000000000000"]);
        let Mode::Submit(submit) = parse_args(&args).unwrap().mode else {
            panic!("expected submit mode");
        };
        let now = UnixTimestamp::from_secs(1_900_000_000);
        match submit.spender_call(now) {
            SpenderCall::NativeFee { swap } => {
                assert_eq!(swap.min_out, U256::from(1_000_000_000_000_000u64));
                assert_eq!(swap.deadline, now + 1800);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_deadlines_share_one_clock_reading() {
        let mut args = submit_args();
        args.extend([
            "--fee-mode",
            "native",
            "--swap-min-out",
            "1",
            "--permit-deadline-secs",
            "600",
            "--swap-deadline-secs",
            "300",
        ]);
        let Mode::Submit(submit) = parse_args(&args).unwrap().mode else {
            panic!("expected submit mode");
        };
        assert_eq!(
            submit.fee,
            FeePayment::Native {
                min_out: U256::from(1u64),
                swap_deadline_secs: 300
            }
        );

        let now = UnixTimestamp::from_secs(1_900_000_000);
        let SpenderCall::NativeFee { swap } = submit.spender_call(now) else {
            panic!("expected native fee call");
        };
        assert_eq!(submit.permit_deadline(now).as_secs(), 1_900_000_600);
        assert_eq!(swap.deadline.as_secs(), 1_900_000_300);
    }

    #[test]
    fn test_malformed_address_names_the_setting() {
        let mut args = submit_args();
        let token = args.iter().position(|a| *a == TOKEN).unwrap();
        args[token] = "0x1234";
        assert!(matches!(
            parse_args(&args),
            Err(ConfigError::Invalid { name: "TOKEN_ADDRESS", .. })
        ));
    }

    #[test]
    fn test_high_priority_flag() {
        let mut args = submit_args();
        args.push("--high-priority");
        let Mode::Submit(submit) = parse_args(&args).unwrap().mode else {
            panic!("expected submit mode");
        };
        assert!(submit.high_priority);
    }
}
