mod commands;

use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use repobrowser::sort::SortKey;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repobrowser")]
#[command(about = "Browse third-party plugin repositories", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the repository catalog and print it
    #[command(short_flag = 'b', visible_alias = "refresh")]
    Browse {
        /// Sort key (remembered for next time)
        #[arg(long, short = 's', value_enum)]
        sort: Option<SortKey>,
        /// Sort in descending order
        #[arg(long, conflicts_with = "ascending")]
        descending: bool,
        /// Sort in ascending order
        #[arg(long)]
        ascending: bool,
        /// Only show repositories matching this text
        #[arg(long, short = 'q')]
        search: Option<String>,
        /// Ignore cached master lists
        #[arg(long)]
        refetch: bool,
    },
    /// Enable or disable a repository (adds it if unknown)
    #[command(short_flag = 't')]
    Toggle {
        /// Manifest URL of the repository
        #[arg(value_hint = ValueHint::Url)]
        url: String,
    },
    /// Add a repository as an enabled plugin source
    #[command(short_flag = 'a')]
    Add {
        /// Manifest URL of the repository
        #[arg(value_hint = ValueHint::Url)]
        url: String,
    },
    /// List the plugin sources known to the host
    #[command(short_flag = 'l', visible_alias = "list")]
    Repos,
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("repobrowser=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        None => {
            Cli::command().print_help()?;
            println!();
        }
        Some(Commands::Browse {
            sort,
            descending,
            ascending,
            search,
            refetch,
        }) => {
            let order = match (descending, ascending) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::browse(commands::BrowseArgs {
                sort,
                descending: order,
                search,
                refetch,
            })
            .await?
        }
        Some(Commands::Toggle { url }) => commands::toggle_repo(&url)?,
        Some(Commands::Add { url }) => commands::add_repo(&url)?,
        Some(Commands::Repos) => commands::list_repos()?,
        Some(Commands::Completions { shell }) => commands::generate_completions(shell),
    }

    Ok(())
}
