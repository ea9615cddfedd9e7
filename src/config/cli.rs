use crate::adapters::report::OutputFormat;
use crate::core::resolver::Query;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "picklist-provenance")]
#[command(about = "Trace liquid-handler pick lists back to their source wells")]
pub struct CliConfig {
    /// Path to a TOML run configuration (labware geometry, resolver limits, output)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Resolve the ultimate sources of a destination well or sample
    Resolve(ResolveArgs),
    /// Check plate-type consistency, labware registration and drop volumes
    Validate(ValidateArgs),
    /// Print the plate or well transfer graph in Graphviz format
    Graph(GraphArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    /// Pick-list CSV file
    #[arg(short, long)]
    pub picklist: String,

    /// Destination plate name (requires --well)
    #[arg(long)]
    pub plate: Option<String>,

    /// Destination well (requires --plate)
    #[arg(long)]
    pub well: Option<String>,

    /// Sample name to trace
    #[arg(long, conflicts_with = "destination_sample")]
    pub sample: Option<String>,

    /// Destination sample name to trace
    #[arg(long)]
    pub destination_sample: Option<String>,

    /// Output format, overrides the config file
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Maximum lineage depth, overrides the config file
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Also report contributions summed per ultimate source
    #[arg(long)]
    pub aggregate: bool,
}

impl ResolveArgs {
    pub fn query(&self) -> Result<Query> {
        match &self.destination_sample {
            Some(name) if self.plate.is_none() && self.well.is_none() => {
                Ok(Query::DestinationSample(name.clone()))
            }
            Some(name) => Query::from_parts(
                self.plate.as_deref(),
                self.well.as_deref(),
                Some(name.as_str()),
            ),
            None => Query::from_parts(
                self.plate.as_deref(),
                self.well.as_deref(),
                self.sample.as_deref(),
            ),
        }
    }
}

impl Validate for ResolveArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("picklist", &self.picklist)?;
        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }
        if let Some(max_depth) = self.max_depth {
            validation::validate_positive_number("max_depth", max_depth, 1)?;
        }
        self.query().map(|_| ())
    }
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Pick-list CSV file
    #[arg(short, long)]
    pub picklist: String,

    /// Skip labware registration and drop-volume checks
    #[arg(long)]
    pub no_geometry: bool,
}

impl Validate for ValidateArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("picklist", &self.picklist)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphLevel {
    Plate,
    Well,
}

#[derive(Debug, Clone, Args)]
pub struct GraphArgs {
    /// Pick-list CSV file
    #[arg(short, long)]
    pub picklist: String,

    #[arg(long, value_enum, default_value = "plate")]
    pub level: GraphLevel,
}

impl Validate for GraphArgs {
    fn validate(&self) -> Result<()> {
        validation::validate_path("picklist", &self.picklist)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
        }
        match &self.command {
            Commands::Resolve(args) => args.validate(),
            Commands::Validate(args) => args.validate(),
            Commands::Graph(args) => args.validate(),
        }
    }
}
