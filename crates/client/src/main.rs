//! `takeoff` -- command-line client for the takeoff server.
//!
//! Submits extractions, waits for their notification over the server's
//! WebSocket, and pushes the resulting tables to the cloud catalogs.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                 |
//! |-------------------------------|----------|-------------------------|
//! | `TAKEOFF_SERVER_URL`          | no       | `http://localhost:3000` |
//! | `TAKEOFF_WS_URL`              | no       | derived from the server |
//! | `TAKEOFF_REQUEST_TIMEOUT_SECS`| no       | `60`                    |

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use takeoff_client::{
    AssetSession, ClientConfig, NotificationListener, ProxyClient, QtoSession,
};
use takeoff_core::correlator::Correlation;
use takeoff_core::job::JobNotification;
use takeoff_core::pricebook::{PriceBook, PriceUpdate};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "takeoff")]
#[command(about = "Model asset extraction and quantity take-off client")]
#[command(version)]
struct Cli {
    /// Server base URL (overrides TAKEOFF_SERVER_URL)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Notification WebSocket URL (overrides TAKEOFF_WS_URL)
    #[arg(long, global = true)]
    ws_url: Option<String>,

    /// Give up waiting for a job after this many seconds (default: wait
    /// until the job settles)
    #[arg(long, global = true)]
    wait_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract assets from a model and optionally upload them
    ExtractAssets {
        /// Storage URN of the model version
        #[arg(long)]
        target: String,
        /// Project to upload the assets into
        #[arg(long)]
        project: Option<String>,
        /// Upload the extracted assets (requires --project)
        #[arg(long, requires = "project")]
        upload: bool,
    },

    /// Run a quantity take-off and price it into a budget
    Takeoff {
        /// Storage URN of the model version
        #[arg(long)]
        target: String,
        /// Cost container to sync the budget with
        #[arg(long)]
        container: Option<String>,
        /// Replace the container's budget with the computed rows
        #[arg(long, requires = "container")]
        push: bool,
        /// Adopt the container's unit prices and reprice the rows
        #[arg(long, requires = "container")]
        pull: bool,
    },

    /// Inspect or edit the price book
    Pricebook {
        #[command(subcommand)]
        command: PriceBookCommands,
    },

    /// Manage design automation bundles and activities
    Da {
        #[command(subcommand)]
        command: DaCommands,
    },
}

#[derive(Subcommand)]
enum PriceBookCommands {
    /// Print all entries and the budget code length
    List,
    /// Drop the price book and reseed it
    Reset {
        #[arg(long)]
        code_length: u32,
    },
    /// Set the unit price of one element type
    Set {
        #[arg(long = "type")]
        element_type: String,
        #[arg(long)]
        price: f64,
        /// Unit for a type not yet in the book
        #[arg(long)]
        unit: Option<String>,
    },
}

#[derive(Subcommand)]
enum DaCommands {
    /// List available engines
    Engines,
    /// List defined activities
    Activities,
    /// List the bundle packages in the server's bundles folder
    Bundles,
    /// Publish <FILE_NAME>.zip as an app bundle, or as a new version of it
    CreateBundle {
        #[arg(long)]
        file_name: String,
        #[arg(long)]
        engine: String,
    },
    /// Define an activity running the <FILE_NAME> app bundle
    CreateActivity {
        #[arg(long)]
        file_name: String,
        #[arg(long)]
        engine: String,
    },
    /// Delete an activity and all its versions
    DeleteActivity {
        name: String,
    },
    /// Delete an app bundle and all its versions
    DeleteBundle {
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "takeoff_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if cli.server_url.is_some() || cli.ws_url.is_some() {
        config = ClientConfig::new(
            cli.server_url.unwrap_or(config.server_url),
            cli.ws_url,
            config.request_timeout,
        );
    }
    let wait = cli.wait_secs.map(Duration::from_secs);
    let client = ProxyClient::new(&config).context("Failed to build HTTP client")?;

    match cli.command {
        Commands::ExtractAssets {
            target,
            project,
            upload,
        } => extract_assets(&client, &config, wait, &target, project.as_deref(), upload).await,
        Commands::Takeoff {
            target,
            container,
            push,
            pull,
        } => takeoff(&client, &config, wait, &target, container.as_deref(), push, pull).await,
        Commands::Pricebook { command } => price_book(&client, command).await,
        Commands::Da { command } => design_automation(&client, command).await,
    }
}

// ---------------------------------------------------------------------------
// Notification wiring
// ---------------------------------------------------------------------------

struct Notifications {
    rx: mpsc::UnboundedReceiver<JobNotification>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Notifications {
    /// Subscribe and wait for the handshake, so a job submitted afterwards
    /// cannot complete unseen.
    async fn start(config: &ClientConfig) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (connected_tx, connected_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let listener = NotificationListener::new(config.ws_url.clone()).on_connected(connected_tx);
        let handle = tokio::spawn(listener.run(tx, cancel.clone()));
        let notifications = Self { rx, cancel, handle };

        match tokio::time::timeout(config.request_timeout, connected_rx).await {
            Ok(Ok(())) => Ok(notifications),
            Ok(Err(_)) => bail!("Notification listener stopped before connecting"),
            Err(_) => {
                notifications.stop().await;
                bail!("Could not connect to {} in time", config.ws_url)
            }
        }
    }

    /// Next notification, waiting at most `wait` when given.
    async fn next(&mut self, wait: Option<Duration>) -> anyhow::Result<JobNotification> {
        let received = match wait {
            Some(wait) => match tokio::time::timeout(wait, self.rx.recv()).await {
                Ok(received) => received,
                Err(_) => bail!("No job notification within {}s", wait.as_secs()),
            },
            None => self.rx.recv().await,
        };
        received.context("Notification listener stopped")
    }

    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn extract_assets(
    client: &ProxyClient,
    config: &ClientConfig,
    wait: Option<Duration>,
    target: &str,
    project: Option<&str>,
    upload: bool,
) -> anyhow::Result<()> {
    let mut notifications = Notifications::start(config).await?;
    let mut session = AssetSession::new();
    let job_id = session
        .extract(client, target, Box::new(|| tracing::debug!("Asset job settled")))
        .await?;
    println!("Submitted asset extraction {job_id}");

    let completed = loop {
        let event = notifications.next(wait).await?;
        match session.handle(&event) {
            Correlation::Completed => break true,
            Correlation::Updated(status) => {
                println!("Job {job_id}: {status}");
                if !session.is_waiting() {
                    break false;
                }
            }
            Correlation::Ignored => {}
        }
    };
    notifications.stop().await;

    if !completed {
        bail!("Asset extraction {job_id} did not complete");
    }

    println!("{}", serde_json::to_string_pretty(session.records())?);

    if upload {
        let project = project.context("--upload needs --project")?;
        let outcome = session.upload(client, project).await;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if !outcome.is_success() {
            bail!("Asset upload did not complete");
        }
    }
    Ok(())
}

async fn takeoff(
    client: &ProxyClient,
    config: &ClientConfig,
    wait: Option<Duration>,
    target: &str,
    container: Option<&str>,
    push: bool,
    pull: bool,
) -> anyhow::Result<()> {
    let mut notifications = Notifications::start(config).await?;
    let mut session = QtoSession::new();
    let job_id = session
        .extract(client, target, Box::new(|| tracing::debug!("Take-off job settled")))
        .await?;
    println!("Submitted quantity take-off {job_id}");

    let completed = loop {
        let event = notifications.next(wait).await?;
        match session.handle_and_price(&event, client).await? {
            Correlation::Completed => break true,
            Correlation::Updated(status) => {
                println!("Job {job_id}: {status}");
                if !session.is_waiting() {
                    break false;
                }
            }
            Correlation::Ignored => {}
        }
    };
    notifications.stop().await;

    if !completed {
        bail!("Quantity take-off {job_id} did not complete");
    }

    if let Some(container) = container {
        if pull {
            let outcome = session.pull(client, client, container).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        if push {
            session.push(client, container).await?;
            println!("Budget pushed to {container}");
        }
    }

    println!("{}", serde_json::to_string_pretty(session.rows())?);
    Ok(())
}

async fn price_book(client: &ProxyClient, command: PriceBookCommands) -> anyhow::Result<()> {
    let items = match command {
        PriceBookCommands::List => client.price_book_items().await?,
        PriceBookCommands::Reset { code_length } => client.reset_price_book(code_length).await?,
        PriceBookCommands::Set {
            element_type,
            price,
            unit,
        } => {
            client
                .set_price(&PriceUpdate {
                    element_type,
                    unit_price: price,
                    unit,
                })
                .await?
        }
    };

    let book = PriceBook::from_items(items)?;
    for entry in book.entries() {
        println!("{:<20} {:>12.2} {}", entry.element_type, entry.unit_price, entry.unit);
    }
    match book.budget_code_length() {
        Some(length) => println!("budget code length: {length}"),
        None => println!("budget code length: unset"),
    }
    Ok(())
}

async fn design_automation(client: &ProxyClient, command: DaCommands) -> anyhow::Result<()> {
    match command {
        DaCommands::Engines => {
            for engine in client.engines().await? {
                println!("{engine}");
            }
        }
        DaCommands::Activities => {
            for activity in client.activities().await? {
                println!("{activity}");
            }
        }
        DaCommands::Bundles => {
            for package in client.app_bundle_packages().await? {
                println!("{package}");
            }
        }
        DaCommands::CreateBundle { file_name, engine } => {
            let created = client.create_app_bundle(&file_name, &engine).await?;
            println!("{} (version {})", created.app_bundle, created.version);
        }
        DaCommands::CreateActivity { file_name, engine } => {
            let created = client.create_activity(&file_name, &engine).await?;
            println!("{} ({})", created.activity, created.status);
        }
        DaCommands::DeleteActivity { name } => {
            client.delete_activity(&name).await?;
            println!("Deleted activity {name}");
        }
        DaCommands::DeleteBundle { name } => {
            client.delete_app_bundle(&name).await?;
            println!("Deleted app bundle {name}");
        }
    }
    Ok(())
}
