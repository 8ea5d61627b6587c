//! CLI command definitions, routing, and tracing setup.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use brandplanner_competitors::{Competitor, CompetitorSearch};
use brandplanner_core::{BrandPlan, OpenRouterClient, PlanGenerator, PlanProgress};
use brandplanner_dataset::load_cached;
use brandplanner_shared::{
    AppConfig, Generated, PlannerError, TacticMatch, init_config, load_config, load_config_from,
};

use crate::render;
use crate::wizard::{Questionnaire, SelectionFlags};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BrandPlanner: pharma brand plans from a strategy workbook.
#[derive(Parser)]
#[command(
    name = "brandplanner",
    version,
    about = "Build a pharma brand plan from a strategy workbook and generated copy.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.brandplanner/brandplanner.toml).
    #[arg(long, global = true, env = "BRANDPLANNER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format for plans and lists.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the questionnaire and generate a brand plan.
    Plan {
        #[command(flatten)]
        selection: SelectionFlags,

        /// Workbook path (overrides `[dataset].path`).
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Never prompt; steps not given by flags use their defaults.
        #[arg(short, long)]
        yes: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Print the choice lists from the workbook.
    Options {
        /// Show the strategic imperatives for this lifecycle stage.
        #[arg(long)]
        stage: Option<String>,

        /// Show the differentiators in this category.
        #[arg(long)]
        category: Option<String>,

        /// Workbook path (overrides `[dataset].path`).
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Search for competitors of a drug.
    Competitors {
        /// Drug name.
        drug: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Generate competitive insights for a drug.
    Insights {
        /// Drug name.
        drug: String,

        /// Skip the competitor search and prompt with the drug name only.
        #[arg(long)]
        no_scrape: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so rendered plans on stdout stay clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "brandplanner=warn",
        1 => "brandplanner=info",
        2 => "brandplanner=debug",
        _ => "brandplanner=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    dispatch(cli).await.map_err(|err| {
        let fatal = err
            .downcast_ref::<PlannerError>()
            .is_some_and(PlannerError::is_fatal);
        if fatal {
            err.suggestion("check the workbook path and settings with `brandplanner config show`")
        } else {
            err
        }
    })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // `config init` works even when the existing file does not parse
    if matches!(cli.command, Command::Config { action: ConfigAction::Init }) {
        return cmd_config_init();
    }
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan {
            selection,
            dataset,
            yes,
            format,
        } => cmd_plan(config, &selection, dataset, yes, format).await,
        Command::Options {
            stage,
            category,
            dataset,
        } => cmd_options(config, stage.as_deref(), category.as_deref(), dataset),
        Command::Competitors { drug, format } => cmd_competitors(&config, &drug, format).await,
        Command::Insights {
            drug,
            no_scrape,
            format,
        } => cmd_insights(&config, &drug, no_scrape, format).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn with_dataset(mut config: AppConfig, dataset: Option<PathBuf>) -> AppConfig {
    if let Some(path) = dataset {
        config.dataset.path = path;
    }
    config
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_plan(
    config: AppConfig,
    flags: &SelectionFlags,
    dataset: Option<PathBuf>,
    yes: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = with_dataset(config, dataset);
    let catalog = load_cached(&config.dataset)?;

    // Validate API key before asking anything
    let client = OpenRouterClient::from_config(&config.llm)?;

    let interactive = !yes && std::io::stdin().is_terminal();
    let questionnaire = if interactive {
        Questionnaire::interactive(&catalog)
    } else {
        Questionnaire::scripted(&catalog)
    };
    let mut flags = flags.clone();
    let selection = loop {
        match questionnaire.collect(&flags) {
            Ok(selection) => break selection,
            Err(err) if interactive && is_invalid_selection(&err) => {
                eprintln!("  Warning: {err}. Please choose again.");
                flags = SelectionFlags::default();
            }
            Err(err) => return Err(err),
        }
    };

    let matches = catalog.tactics_for_selection(&selection)?;
    info!(
        stage = %selection.stage,
        tactics = matches.len(),
        "generating brand plan"
    );

    let generator = PlanGenerator::from_config(client, &config);
    let progress = CliProgress::new();
    let plan = generator.build_plan(&selection, matches, &progress).await;

    print_plan(&plan, format)
}

fn is_invalid_selection(err: &color_eyre::eyre::Report) -> bool {
    matches!(
        err.downcast_ref::<PlannerError>(),
        Some(PlannerError::InvalidSelection { .. })
    )
}

fn print_plan(plan: &BrandPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => print!("{}", render::plan_markdown(plan)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan)?),
    }

    let unavailable = plan.unavailable_count();
    if unavailable > 0 {
        eprintln!("  {unavailable} generated field(s) were unavailable; see logs with -v for details.");
    }
    Ok(())
}

fn cmd_options(
    config: AppConfig,
    stage: Option<&str>,
    category: Option<&str>,
    dataset: Option<PathBuf>,
) -> Result<()> {
    let config = with_dataset(config, dataset);
    let catalog = load_cached(&config.dataset)?;

    if let Some(stage) = stage {
        let names: Vec<String> = catalog
            .imperatives_for_lifecycle(stage)?
            .into_iter()
            .map(|o| o.name)
            .collect();
        print!(
            "{}",
            render::option_list(&format!("Strategic imperatives for '{stage}'"), &names)?
        );
        return Ok(());
    }

    if let Some(category) = category {
        let values = catalog.differentiators_for(category)?;
        print!(
            "{}",
            render::option_list(&format!("Differentiators in '{category}'"), &values)?
        );
        return Ok(());
    }

    print!("{}", render::option_list("Lifecycle stages", &catalog.lifecycle_options())?);
    print!(
        "{}",
        render::option_list("Differentiator categories", &catalog.differentiator_categories())?
    );
    print!("{}", render::option_list("Brand tones", catalog.tones())?);
    print!("{}", render::option_list("Objectives", catalog.objectives())?);
    Ok(())
}

async fn cmd_competitors(config: &AppConfig, drug: &str, format: OutputFormat) -> Result<()> {
    let competitors = search_competitors(config, drug).await?;

    match format {
        OutputFormat::Markdown => print!("{}", render::competitors_markdown(drug, &competitors)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&competitors)?),
    }
    Ok(())
}

async fn cmd_insights(
    config: &AppConfig,
    drug: &str,
    no_scrape: bool,
    format: OutputFormat,
) -> Result<()> {
    if drug.trim().is_empty() {
        return Err(eyre!("please enter a drug name to generate competitive insights"));
    }
    let client = OpenRouterClient::from_config(&config.llm)?;

    let competitors = if no_scrape {
        Vec::new()
    } else {
        search_competitors(config, drug).await?
    };
    let names: Vec<String> = competitors.iter().map(|c| c.name.clone()).collect();

    let spinner = spinner("Generating competitive insights");
    let generator = PlanGenerator::from_config(client, config);
    let insights = generator.competitive_insights(drug, &names).await;
    spinner.finish_and_clear();

    match format {
        OutputFormat::Markdown => {
            print!("{}", render::insights_markdown(drug, &competitors, &insights)?)
        }
        OutputFormat::Json => {
            let body = serde_json::json!({
                "drug": drug.trim(),
                "competitors": competitors,
                "insights": insights,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    if let Generated::Unavailable { reason } = &insights {
        eprintln!("  Competitive insights: {reason}");
    }
    Ok(())
}

async fn search_competitors(config: &AppConfig, drug: &str) -> Result<Vec<Competitor>> {
    let search = CompetitorSearch::new(config.scraper.clone())?;
    let spinner = spinner(&format!("Searching {} for '{}'", config.scraper.target_site, drug.trim()));
    let result = search.find(drug).await;
    spinner.finish_and_clear();
    Ok(result?)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            spinner: spinner("Generating brand plan"),
        }
    }
}

impl PlanProgress for CliProgress {
    fn tactic_started(&self, tactic: &TacticMatch, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Generating [{current}/{total}] {}",
            tactic.tactic
        ));
    }

    fn aggregate_started(&self, name: &str) {
        self.spinner.set_message(format!("Generating {name}"));
    }

    fn done(&self, _plan: &BrandPlan) {
        self.spinner.finish_and_clear();
    }
}
