use clap::{Parser, Subcommand, ValueEnum};
use df_app::{AppConfig, AppError, CollectRequest, RunScript, ToolResponse, tool};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(about = "DeepFlame case tools - registry, case setup, dispatch and results", long_about = None)]
struct Cli {
    /// Agent root holding config.yaml/config.json
    #[arg(long, env = "DF_AGENT_ROOT", global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScriptArg {
    /// Full run (Allrun)
    Allrun,
    /// Scheduler submission (sub.sh)
    Submit,
    /// Set-fields only (set.sh)
    SetFields,
}

impl From<ScriptArg> for RunScript {
    fn from(arg: ScriptArg) -> Self {
        match arg {
            ScriptArg::Allrun => RunScript::Allrun,
            ScriptArg::Submit => RunScript::Submit,
            ScriptArg::SetFields => RunScript::SetFields,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the task registry with N cases of a type
    Init {
        /// Case type, e.g. 2D_HIT (aliases such as "hit" are accepted)
        case_type: String,
        /// Number of cases
        #[arg(allow_negative_numbers = true)]
        count: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Copy case templates into the runs directory
    Materialize {
        #[arg(long)]
        yes: bool,
    },
    /// Append a region to a case in the registry
    AddRegion {
        case_name: String,
        /// Region as JSON: {"type": "circle", "p1": [..], "p2": [..], "radius": r}
        region: String,
        /// Also sync the case's setFieldsDict
        #[arg(long)]
        inject: bool,
    },
    /// Sync a case's registry regions into its setFieldsDict
    Inject { case_name: String },
    /// Place preset ignition zones (2, 3 or 4 shapes)
    SetupZones {
        case_name: String,
        /// Shapes in slot order: circle, square or ring
        #[arg(required = true)]
        shapes: Vec<String>,
    },
    /// Execute a case's entry script
    Run {
        case_name: String,
        #[arg(long, value_enum, default_value = "allrun")]
        script: ScriptArg,
        /// Timeout in seconds (defaults to run_timeout_s)
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        yes: bool,
    },
    /// Execute every registered case
    RunAll {
        #[arg(long, value_enum, default_value = "allrun")]
        script: ScriptArg,
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long)]
        yes: bool,
    },
    /// List recorded dispatches of a case
    Runs { case_name: String },
    /// Show one recorded run with its logs (default: the latest)
    ShowRun {
        case_name: String,
        run_id: Option<String>,
    },
    /// Read scalar fields from a case's latest (or given) time directory
    Collect {
        case_name: String,
        /// Field names, e.g. T Cx Cy
        #[arg(required = true)]
        fields: Vec<String>,
        /// Time directory name
        #[arg(long)]
        time: Option<String>,
        /// Write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show the registry, or one case
    Show { case_name: Option<String> },
    /// Check that DeepFlame and OpenFOAM environments are loaded
    CheckEnv,
    /// Check a case directory for required files
    CheckCase {
        case_name: String,
        /// Initial fields expected under 0/
        #[arg(long, value_delimiter = ',', default_value = "T,U,p")]
        fields: Vec<String>,
    },
}

fn load_config(root: Option<PathBuf>) -> Result<AppConfig, ToolResponse> {
    match root {
        Some(root) => AppConfig::load(&root).map_err(|e| ToolResponse::from_error(&e)),
        None => tool::load_config(),
    }
}

fn confirm(yes: bool, action: &str) -> Result<(), ToolResponse> {
    if yes {
        Ok(())
    } else {
        Err(ToolResponse::from_error(&AppError::ConfirmationRequired {
            action: action.to_string(),
        }))
    }
}

fn execute(cli: Cli) -> Result<ToolResponse, ToolResponse> {
    if let Commands::CheckEnv = cli.command {
        return Ok(tool::check_solver_env());
    }
    let config = load_config(cli.root)?;
    tracing::debug!(
        root = %config.root.display(),
        registry = %config.registry_path.display(),
        "loaded configuration"
    );

    let response = match cli.command {
        Commands::Init {
            case_type,
            count,
            yes,
        } => {
            confirm(yes, "Creating the task registry")?;
            tool::initialize_registry(&config, &case_type, count)
        }
        Commands::Materialize { yes } => {
            confirm(yes, "Materializing case directories")?;
            tool::materialize_cases(&config)
        }
        Commands::AddRegion {
            case_name,
            region,
            inject,
        } => {
            let region: serde_json::Value = serde_json::from_str(&region)
                .map_err(|e| ToolResponse::from_error(&AppError::Json(e)))?;
            let added = tool::add_region(&config, &case_name, &region);
            if inject && added.is_success() {
                tool::inject_case_regions(&config, &case_name)
            } else {
                added
            }
        }
        Commands::Inject { case_name } => tool::inject_case_regions(&config, &case_name),
        Commands::SetupZones { case_name, shapes } => {
            tool::setup_ignition_zones(&config, &case_name, &shapes)
        }
        Commands::Run {
            case_name,
            script,
            timeout,
            yes,
        } => {
            confirm(yes, "Running a case")?;
            tool::run_case(
                &config,
                &case_name,
                script.into(),
                timeout.map(Duration::from_secs),
            )
        }
        Commands::RunAll {
            script,
            timeout,
            yes,
        } => {
            confirm(yes, "Running every case")?;
            tool::run_all(&config, script.into(), timeout.map(Duration::from_secs))
        }
        Commands::Runs { case_name } => tool::list_runs(&config, &case_name),
        Commands::ShowRun { case_name, run_id } => {
            tool::show_run(&config, &case_name, run_id.as_deref())
        }
        Commands::Collect {
            case_name,
            fields,
            time,
            csv,
        } => tool::collect_results(&config, &case_name, &CollectRequest { fields, time, csv }),
        Commands::Show { case_name } => match case_name {
            Some(name) => tool::show_case(&config, &name),
            None => tool::show_registry(&config),
        },
        Commands::CheckCase { case_name, fields } => {
            tool::check_case_completeness(&config, &case_name, &fields)
        }
        Commands::CheckEnv => tool::check_solver_env(),
    };
    Ok(response)
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the JSON envelope.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let response = execute(cli).unwrap_or_else(|e| e);

    let rendered = serde_json::to_string_pretty(&response.to_json())
        .unwrap_or_else(|e| format!("{{\"status\": \"error\", \"error_message\": \"{e}\"}}"));
    println!("{rendered}");

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
