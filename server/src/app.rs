//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::{AppConfig, ProviderBackend};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::SqliteService;
use crate::domain::aggregation::AggregationService;
use crate::domain::analytics::AnalyticsEngine;
use crate::domain::evals::EvaluatorRegistry;
use crate::domain::mirror::ObservabilityMirror;
use crate::domain::optimizer::CostOptimizer;
use crate::domain::pricing::PricingService;
use crate::domain::providers::{GenerationClient, OpenAiClient, SimulatedClient};
use crate::domain::registry::TraceRegistry;
use crate::domain::streaming::StreamingOrchestrator;
use crate::domain::traces::{LiveFeed, TraceService};

/// Model used by the LLM-as-judge evaluators
const JUDGE_MODEL: &str = "gpt-4o-mini";

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: Arc<SqliteService>,
    pub registry: Arc<TraceRegistry>,
    pub pricing: Arc<PricingService>,
    pub traces: Arc<TraceService>,
    pub orchestrator: Arc<StreamingOrchestrator>,
    pub analytics: Arc<AnalyticsEngine>,
    pub aggregation: Arc<AggregationService>,
    pub optimizer: Arc<CostOptimizer>,
    pub evals: Arc<EvaluatorRegistry>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System {
                command: system_cmd,
            }) => {
                return Self::handle_system_command(system_cmd);
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init().await?;

        let database = Arc::new(
            SqliteService::init(&storage)
                .await
                .context("Failed to initialize database")?,
        );

        let pricing =
            PricingService::init(&storage).context("Failed to initialize pricing service")?;

        let registry = Arc::new(TraceRegistry::default());
        let feed = Arc::new(LiveFeed::default());
        let traces = Arc::new(TraceService::new(
            database.pool().clone(),
            Arc::clone(&registry),
            feed,
        ));

        let client: Arc<dyn GenerationClient> = match config.provider.backend {
            ProviderBackend::OpenAi => Arc::new(
                OpenAiClient::new(&config.provider)
                    .map_err(|e| anyhow::anyhow!("Failed to build provider client: {}", e))?,
            ),
            ProviderBackend::Simulated => Arc::new(SimulatedClient::new()),
        };
        tracing::debug!(provider = %config.provider.backend, "Provider client initialized");

        let mirror = ObservabilityMirror::from_config(&config.mirror);
        if mirror.is_some() {
            tracing::debug!("Observability mirror enabled");
        }

        let orchestrator = Arc::new(StreamingOrchestrator::new(
            Arc::clone(&traces),
            Arc::clone(&client),
            Arc::clone(&pricing),
            mirror,
        ));

        let analytics = Arc::new(AnalyticsEngine::new(database.pool().clone()));
        let aggregation = Arc::new(AggregationService::new(database.pool().clone()));
        let optimizer = Arc::new(CostOptimizer::new(
            database.pool().clone(),
            config.heuristics.clone(),
        ));
        let evals = Arc::new(EvaluatorRegistry::with_defaults(client, JUDGE_MODEL));

        let shutdown = ShutdownService::new(Arc::clone(&database));

        Ok(Self {
            shutdown,
            config,
            storage,
            database,
            registry,
            pricing,
            traces,
            orchestrator,
            analytics,
            aggregation,
            optimizer,
            evals,
        })
    }

    fn handle_system_command(cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the local data directory:");
        println!("  {}", data_dir.display());
        println!();
        println!(
            "Make sure the server is not running. \
             Deleting data while the server is running will cause data corruption."
        );

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await;

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            &app.storage.data_dir().display().to_string(),
            app.config.aggregation.interval_minutes,
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        self.shutdown
            .register(
                self.database
                    .start_checkpoint_task(self.shutdown.subscribe()),
            )
            .await;

        self.shutdown
            .register(self.registry.start_sweep_task(self.shutdown.subscribe()))
            .await;

        if let Some(handle) = Arc::clone(&self.aggregation).start_task(
            self.config.aggregation.interval_minutes,
            self.shutdown.subscribe(),
        ) {
            self.shutdown.register(handle).await;
        }

        tracing::debug!("Background tasks started");
    }
}
