//! Recipe Stacker CLI: seed, browse, and combine markdown recipes.
//!
//! Commands: seed, list, show, combine, init-api, completions

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use stacker_core::{Recipe, StackConfig, StackError};
use stacker_index::RecipeStore;
use stacker_sync::{
    ApiKeyProvider, FileSecretStore, HttpMergeService, MemorySecretStore, SecretStore, SyncClient,
};
use stacker_vault::{AssetSeeder, BundleFs, BundledAsset, ContentCache, LocalFs, RecipeFs};

#[derive(Parser)]
#[command(name = "stacker")]
#[command(version)]
#[command(about = "Combine markdown recipes through a remote merge service")]
struct Cli {
    /// Data directory (recipes, database, secrets). Defaults to $STACKER_DATA_DIR or ./.stacker
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory of bundled recipe documents
    #[arg(long, global = true)]
    bundle: Option<PathBuf>,

    /// Read bundled documents in place; nothing is written to disk
    #[arg(long, global = true, requires = "bundle")]
    ephemeral: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Copy bundled recipes into the data directory (first run only)
    Seed,
    /// List all known recipes as JSON
    #[command(alias = "ls")]
    List,
    /// Print a recipe's body
    Show {
        /// Recipe id or file reference
        id: String,
    },
    /// Combine two recipes into a new stacked recipe
    Combine {
        /// Id of the first recipe
        first: String,
        /// Id of the second recipe
        second: String,
    },
    /// Store the configured API key in the secret store
    InitApi,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Components shared by every command for one invocation.
struct Session {
    config: StackConfig,
    fs: Arc<dyn RecipeFs>,
    store: Arc<RecipeStore>,
    secrets: Arc<dyn SecretStore>,
    assets: Vec<BundledAsset>,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = StackConfig::resolve(cli.data_dir.as_deref())?;
        let assets = match &cli.bundle {
            Some(dir) => BundledAsset::from_dir(dir)
                .with_context(|| format!("Failed to read bundle {}", dir.display()))?,
            None => Vec::new(),
        };

        let (fs, secrets): (Arc<dyn RecipeFs>, Arc<dyn SecretStore>) = if cli.ephemeral {
            (
                Arc::new(BundleFs::new(assets.clone())),
                Arc::new(MemorySecretStore::new()),
            )
        } else {
            (
                Arc::new(LocalFs::new(config.documents_dir())),
                Arc::new(FileSecretStore::new(config.secrets_path())),
            )
        };

        let content = Arc::new(ContentCache::new(fs.clone()));
        let store = if cli.ephemeral {
            RecipeStore::in_memory(content)?
        } else {
            RecipeStore::open(&config.database_path(), content)?
        };

        tracing::debug!(
            data_dir = %config.data_dir.display(),
            ephemeral = cli.ephemeral,
            "Opened recipe session"
        );
        Ok(Self {
            config,
            fs,
            store: Arc::new(store),
            secrets,
            assets,
        })
    }

    fn api_keys(&self) -> ApiKeyProvider {
        ApiKeyProvider::new(self.secrets.clone(), self.config.api_key.clone())
    }

    fn seed(&self) -> stacker_vault::SeedReport {
        AssetSeeder::new(self.fs.clone(), self.assets.clone()).ensure_seeded()
    }

    fn find(&self, id: &str) -> anyhow::Result<Recipe> {
        self.store.list_all()?;
        match self.store.get(id)? {
            Some(recipe) => Ok(recipe),
            None => Err(StackError::NotFound(format!("no recipe with id '{id}'")).into()),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_bundle(bundle: Option<&Path>) -> anyhow::Result<()> {
    if bundle.is_none() {
        bail!("--bundle <DIR> is required to seed recipes");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = &cli.command else {
        println!(
            "Recipe Stacker v{}: combine markdown recipes",
            env!("CARGO_PKG_VERSION")
        );
        println!("Run `stacker --help` for usage.");
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(*shell, &mut Cli::command(), "stacker", &mut std::io::stdout());
        return Ok(());
    }

    let session = Session::open(&cli)?;

    match command {
        Commands::Seed => {
            require_bundle(cli.bundle.as_deref())?;
            print_json(&session.seed())?;
        }
        Commands::List => {
            if cli.bundle.is_some() {
                session.seed();
            }
            print_json(&session.store.list_all()?)?;
        }
        Commands::Show { id } => {
            let reference = match session.store.get(id)? {
                Some(recipe) => recipe.file_reference,
                None => id.clone(),
            };
            println!("{}", session.store.content().load_recipe_body(&reference)?);
        }
        Commands::Combine { first, second } => {
            let first = session.find(first)?;
            let second = session.find(second)?;
            let merger = HttpMergeService::new(&session.config.sync_config())?;
            let client =
                SyncClient::new(session.store.clone(), session.api_keys(), Arc::new(merger));
            let recipe = client
                .combine(&first, &second)
                .await
                .context("Failed to combine recipes")?;
            print_json(&recipe)?;
        }
        Commands::InitApi => {
            session.api_keys().provision()?;
            println!("API key stored");
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
