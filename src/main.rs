// messenger - command line front end for a local registry
//
// State lives in a sled database under --data-dir. Each write command loads
// the registry snapshot, applies one signed call and saves it back.

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use messenger::call::{Call, CallBuilder, CallCodec, SignedCall};
use messenger::identity::{AccountId, Keypair};
use messenger::ledger::{Message, MessageIndex};
use messenger::registry::{CallOutcome, Registry, RegistryConfig};
use messenger::storage::MessengerStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "messenger", version, about = "Deposit-backed messages with escrow")]
struct Cli {
    /// Directory holding the local database
    #[arg(long, default_value = ".messenger")]
    data_dir: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and store a keypair under a label
    Keygen { label: String },
    /// Print the account of a stored keypair
    Whoami { label: String },
    /// List stored keypair labels
    Labels,
    /// Mint value into an account
    Fund { account: String, amount: u64 },
    /// Post a message with a deposit
    Post(PostArgs),
    /// Accept a message, taking its deposit
    Accept(ResolveArgs),
    /// Deny a message, returning its deposit to the sender
    Deny(ResolveArgs),
    /// Sign a call and print it as base64 without applying it
    Sign {
        #[command(subcommand)]
        call: SignCommand,
    },
    /// Apply a base64-encoded signed call
    Submit { encoded: String },
    /// List messages an account has sent
    Sent { account: String },
    /// List messages an account has received
    Received { account: String },
    /// Show an account's spendable balance
    Balance { account: String },
    /// Show the value held in escrow
    Escrow,
}

#[derive(Subcommand, Debug)]
enum SignCommand {
    Post(PostArgs),
    Accept(ResolveArgs),
    Deny(ResolveArgs),
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Label of the sending keypair
    #[arg(long)]
    from: String,
    /// Receiving account (acct:...)
    #[arg(long)]
    to: String,
    #[arg(long, default_value_t = 0)]
    deposit: u64,
    text: String,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Label of the receiving keypair
    #[arg(long = "as")]
    label: String,
    index: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let store = MessengerStore::open(&cli.data_dir)
        .with_context(|| format!("opening store at {}", cli.data_dir.display()))?;
    let snapshot = store
        .load_snapshot()
        .with_context(|| format!("loading snapshot from {}", cli.data_dir.display()))?;
    let registry = match snapshot {
        Some(snapshot) => Registry::from_snapshot(RegistryConfig::default(), snapshot)
            .with_context(|| format!("restoring registry from {}", cli.data_dir.display()))?,
        None => Registry::default(),
    };

    match cli.command {
        Command::Keygen { label } => {
            if store.load_keypair_with_label(&label)?.is_some() {
                bail!("label '{}' already exists", label);
            }
            let keypair = Keypair::generate();
            store.save_keypair_with_label(&keypair, &label)?;
            store.flush()?;
            println!("{}", AccountId::from_public_key(&keypair.public_key()));
        }
        Command::Whoami { label } => {
            let keypair = load_keypair(&store, &label)?;
            println!("{}", AccountId::from_public_key(&keypair.public_key()));
        }
        Command::Labels => {
            for label in store.list_labels()? {
                println!("{}", label);
            }
        }
        Command::Fund { account, amount } => {
            let account = AccountId::parse(&account)?;
            let balance = registry.fund(&account, amount)?;
            persist(&store, &registry)?;
            println!("{} balance {}", account, balance);
        }
        Command::Post(args) => {
            let signed = sign_post(&store, &registry, args)?;
            apply(&store, &registry, &signed)?;
        }
        Command::Accept(args) => {
            let signed = sign_resolve(&store, &registry, args, |index| Call::Accept { index })?;
            apply(&store, &registry, &signed)?;
        }
        Command::Deny(args) => {
            let signed = sign_resolve(&store, &registry, args, |index| Call::Deny { index })?;
            apply(&store, &registry, &signed)?;
        }
        Command::Sign { call } => {
            let signed = match call {
                SignCommand::Post(args) => sign_post(&store, &registry, args)?,
                SignCommand::Accept(args) => {
                    sign_resolve(&store, &registry, args, |index| Call::Accept { index })?
                }
                SignCommand::Deny(args) => {
                    sign_resolve(&store, &registry, args, |index| Call::Deny { index })?
                }
            };
            println!("{}", CallCodec::encode_base64(&signed)?);
        }
        Command::Submit { encoded } => {
            let signed = CallCodec::decode_base64(&encoded)?;
            apply(&store, &registry, &signed)?;
        }
        Command::Sent { account } => {
            let account = AccountId::parse(&account)?;
            print_messages(&registry.list_sent(&account));
        }
        Command::Received { account } => {
            let account = AccountId::parse(&account)?;
            print_messages(&registry.list_received(&account));
        }
        Command::Balance { account } => {
            let account = AccountId::parse(&account)?;
            println!("{}", registry.balance_of(&account));
        }
        Command::Escrow => {
            println!("{}", registry.escrow_balance());
        }
    }

    Ok(())
}

fn load_keypair(store: &MessengerStore, label: &str) -> anyhow::Result<Keypair> {
    store
        .load_keypair_with_label(label)
        .with_context(|| format!("loading keypair '{}'", label))?
        .ok_or_else(|| anyhow!("no keypair stored under '{}'", label))
}

fn sign_post(
    store: &MessengerStore,
    registry: &Registry,
    args: PostArgs,
) -> anyhow::Result<SignedCall> {
    let keypair = load_keypair(store, &args.from)?;
    let caller = AccountId::from_public_key(&keypair.public_key());
    let call = Call::Post {
        receiver: AccountId::parse(&args.to)?,
        text: args.text.into_bytes(),
        deposit: args.deposit,
    };
    Ok(CallBuilder::new()
        .caller(&keypair)
        .call(call)
        .nonce(registry.next_nonce(&caller))
        .build()?)
}

fn sign_resolve(
    store: &MessengerStore,
    registry: &Registry,
    args: ResolveArgs,
    make: impl FnOnce(MessageIndex) -> Call,
) -> anyhow::Result<SignedCall> {
    let keypair = load_keypair(store, &args.label)?;
    let caller = AccountId::from_public_key(&keypair.public_key());
    Ok(CallBuilder::new()
        .caller(&keypair)
        .call(make(MessageIndex::new(args.index)))
        .nonce(registry.next_nonce(&caller))
        .build()?)
}

fn apply(store: &MessengerStore, registry: &Registry, signed: &SignedCall) -> anyhow::Result<()> {
    let receipt = registry
        .execute(signed)
        .with_context(|| format!("applying {} call {}", signed.call().name(), signed.id()))?;
    persist(store, registry)?;

    match receipt.outcome {
        CallOutcome::Posted(index) => println!("posted {}", index.value()),
        CallOutcome::Resolved(index, outcome) => println!("{} {}", outcome, index.value()),
    }
    info!(id = %receipt.id, caller = %receipt.caller, "call applied");
    Ok(())
}

fn persist(store: &MessengerStore, registry: &Registry) -> anyhow::Result<()> {
    store
        .save_snapshot(&registry.snapshot())
        .context("saving registry snapshot")?;
    store.flush()?;
    Ok(())
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        let status = if message.is_pending() { "pending" } else { "resolved" };
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            message.index().value(),
            message.sender(),
            message.receiver(),
            message.deposit_in_wei(),
            status,
            message.text_lossy()
        );
    }
}
