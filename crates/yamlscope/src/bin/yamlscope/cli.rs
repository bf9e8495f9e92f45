//! yamlscope cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; yamlscope ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every scope of the document with its local names
    Index(IndexCommand),

    /// Resolve an expression as seen from an element
    #[command(alias = "eval")]
    Resolve(ResolveCommand),

    /// Replace <+yamlExpression...> expressions in a template
    Render(RenderCommand),
}

#[derive(Parser, Debug)]
pub struct IndexCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Fqn of the element to resolve from, e.g. pipeline.stages.s1
    #[clap(long = "fqn")]
    pub fqn: String,

    /// Expression to resolve
    pub expression: String,
}

#[derive(Parser, Debug)]
pub struct RenderCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Fqn of the element to render for, e.g. pipeline.stages.s1
    #[clap(long = "fqn")]
    pub fqn: String,

    /// Template containing <+yamlExpression...> expressions
    pub template: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Read the document from a file instead of stdin
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,

    /// Top-level field holding the element to index
    #[clap(long = "root", default_value = yamlscope::expression::DEFAULT_ROOT_FIELD)]
    pub root: String,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
