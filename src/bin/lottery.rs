use alloy::primitives::{Address, U256};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lottery_client::{
    ActionError, AlloyConnector, Client, LotteryRecord,
    config::{ChainArgs, ClientConfig},
    display, shutdown,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Lottery client - browse, create, enter and close on-chain lotteries
#[derive(Parser, Debug)]
#[command(name = "lottery")]
#[command(about = "Lottery client", long_about = None)]
struct Cli {
    #[command(flatten)]
    chain_args: ChainArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the providers available to connect through
    Providers,

    /// Print every lottery and exit
    List {
        /// Only show lotteries still accepting players
        #[arg(long)]
        open: bool,
    },

    /// Print the lotteries and keep them up to date until interrupted
    Watch {
        /// Only show lotteries still accepting players
        #[arg(long)]
        open: bool,
    },

    /// Create a new lottery
    Create {
        /// Maximum number of players
        #[arg(long)]
        max_players: String,

        /// Entry fee in wei
        #[arg(long)]
        entry_fee: String,

        /// Account that sends the transaction and owns the lottery
        #[arg(long)]
        owner: Option<String>,
    },

    /// Enter a lottery, paying its entry fee
    Enter {
        /// Lottery address
        lottery: String,
    },

    /// Close a lottery and request the draw (owner only)
    Close {
        /// Lottery address
        lottery: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .with_default_directive("alloy_transport_ws=off".parse()?)
        .from_env_lossy()
        .add_directive("alloy=warn".parse()?)
        .add_directive("alloy_pubsub=error".parse()?)
        .add_directive("lottery_client=info".parse()?)
        .add_directive("lottery_contract_clients=info".parse()?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.chain_args)?;
    let directory = config.directory();

    if let Commands::Providers = cli.command {
        println!("{}", display::providers_table(&directory.snapshot(), directory.injected()));
        return Ok(());
    }

    let provider = config.select_provider(&directory)?;
    let mut client = Client::new(AlloyConnector::new(
        config.factory_address,
        config.max_ws_retries,
    ));
    client.choose_provider(&provider).await?;

    let result = run(&client, cli.command).await;
    client.change_provider();
    result
}

async fn run(client: &Client, command: Commands) -> Result<()> {
    let signer = client.session().map(|s| s.signer());

    match command {
        Commands::Providers => {}

        Commands::List { open } => {
            print_lotteries(client, open, signer);
        }

        Commands::Watch { open } => {
            let shutdown_token = shutdown::install();
            client.follow_factory().await?;
            let mut projection = client
                .session()
                .map(|s| s.projection())
                .context("not connected")?;

            loop {
                print_lotteries(client, open, signer);
                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    changed = projection.changed() => {
                        changed?;
                    }
                }
            }
            info!("Shutdown complete");
        }

        Commands::Create {
            max_players,
            entry_fee,
            owner,
        } => {
            let max_players: U256 = max_players.parse().context("invalid max players")?;
            let entry_fee: U256 = entry_fee.parse().context("invalid entry fee")?;
            let owner = owner
                .map(|o| o.parse::<Address>())
                .transpose()
                .context("invalid owner address")?;

            match client.create_lottery(max_players, entry_fee, owner).await? {
                Some(tx_hash) => {
                    println!("Lottery created!");
                    println!("Transaction hash: {:?}", tx_hash);
                }
                None => bail!("not connected"),
            }
        }

        Commands::Enter { lottery } => {
            let record = find_lottery(client, &lottery)?;
            match client.enter(&record).await? {
                Some(tx_hash) => {
                    println!("Entered lottery {}!", record.address);
                    println!("Transaction hash: {:?}", tx_hash);
                }
                None => bail!("not connected"),
            }
        }

        Commands::Close { lottery } => {
            let record = find_lottery(client, &lottery)?;
            match client.close(&record).await {
                Ok(Some(tx_hash)) => {
                    println!("Draw requested for lottery {}!", record.address);
                    println!("Transaction hash: {:?}", tx_hash);
                }
                Ok(None) => bail!("not connected"),
                Err(ActionError::NotOwner { owner, .. }) => {
                    error!(lottery = %record.address, owner = %owner, "Only the owner can close this lottery");
                    bail!("only {owner} can close lottery {}", record.address);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn print_lotteries(client: &Client, open_only: bool, signer: Option<Address>) {
    let records = if open_only {
        client.open_lotteries()
    } else {
        client.lotteries().to_vec()
    };
    println!("{}", display::lotteries_table(&records, signer));
}

fn find_lottery(client: &Client, lottery: &str) -> Result<LotteryRecord> {
    let address: Address = lottery.parse().context("invalid lottery address")?;
    client
        .lottery(address)
        .with_context(|| format!("lottery {address} is not listed by the factory"))
}
