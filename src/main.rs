use anyhow::Context;
use clap::Parser;
use picklist_provenance::adapters::{write_csv, write_json, OutputFormat, ProvenanceReport};
use picklist_provenance::config::cli::{GraphArgs, GraphLevel, ResolveArgs, ValidateArgs};
use picklist_provenance::core::TransferSource;
use picklist_provenance::utils::error::{ErrorSeverity, PickListError};
use picklist_provenance::utils::{logger, validation::Validate};
use picklist_provenance::{
    aggregate_by_source, build_plate_graph, build_well_graph, validate, CliConfig, Commands,
    CsvPickList, ProvenanceResolver, RunConfig,
};
use std::io::Write;

// validate 子命令發現問題時的退出碼
const EXIT_DIAGNOSTICS: i32 = 2;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting picklist-provenance");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = RunConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            if let Err(e) = config.validate() {
                tracing::error!("❌ Configuration validation failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
            config
        }
        None => RunConfig::default(),
    };

    let outcome = match &cli.command {
        Commands::Resolve(args) => run_resolve(args, &config),
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Graph(args) => run_graph(args),
    };

    match outcome {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

fn run_resolve(args: &ResolveArgs, config: &RunConfig) -> Result<i32, PickListError> {
    let table = CsvPickList::new(&args.picklist).load()?;
    let query = args.query()?;

    let mut options = config.resolver_options();
    if args.max_depth.is_some() {
        options.max_depth = args.max_depth;
    }

    if !build_well_graph(&table).is_acyclic() {
        tracing::warn!("⚠️ Pick list contains a transfer cycle; resolution may fail");
    }

    let contributions = ProvenanceResolver::new(&table)
        .with_options(options)
        .resolve(&query)?;
    tracing::info!(
        "✅ Resolved {} into {} contribution(s)",
        query,
        contributions.len()
    );

    let totals = args.aggregate.then(|| aggregate_by_source(&contributions));
    let format = args.format.unwrap_or(config.output.format);
    let output = args.output.as_ref().or(config.output.path.as_ref());

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        OutputFormat::Csv => match &totals {
            Some(totals) => write_csv(totals, &mut writer)?,
            None => write_csv(&contributions, &mut writer)?,
        },
        OutputFormat::Json => {
            let mut report = ProvenanceReport::new(&query, &contributions);
            if let Some(totals) = &totals {
                report = report.with_totals(totals);
            }
            write_json(&report, &mut writer)?;
        }
    }
    writer.flush()?;

    if let Some(path) = output {
        tracing::info!("📁 Output saved to: {}", path);
    }
    Ok(0)
}

fn run_validate(args: &ValidateArgs, config: &RunConfig) -> Result<i32, PickListError> {
    let table = CsvPickList::new(&args.picklist).load()?;
    let geometry = if args.no_geometry {
        None
    } else {
        config.geometry()
    };

    let diagnostics = validate(&table, geometry)?;
    if diagnostics.is_empty() {
        println!("✅ {} transfers, no problems found", table.len());
        return Ok(0);
    }

    for diagnostic in &diagnostics {
        println!("❌ {}", diagnostic);
    }
    tracing::warn!("Validation found {} problem(s)", diagnostics.len());
    Ok(EXIT_DIAGNOSTICS)
}

fn run_graph(args: &GraphArgs) -> Result<i32, PickListError> {
    let table = CsvPickList::new(&args.picklist).load()?;

    let (dot, acyclic) = match args.level {
        GraphLevel::Plate => {
            let graph = build_plate_graph(&table);
            (graph.to_dot(), graph.is_acyclic())
        }
        GraphLevel::Well => {
            let graph = build_well_graph(&table);
            (graph.to_dot(), graph.is_acyclic())
        }
    };

    print!("{}", dot);
    if !acyclic {
        eprintln!("⚠️ Transfer graph contains a cycle");
    }
    Ok(0)
}
