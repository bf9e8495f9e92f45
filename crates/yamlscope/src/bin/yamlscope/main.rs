mod cli;

use yamlscope::expression::{ExpressionEngine, YamlExpressionEvaluator};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("YAMLSCOPE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Index(index_cli) => index(index_cli),
        cli::Command::Resolve(resolve_cli) => resolve(resolve_cli),
        cli::Command::Render(render_cli) => render(render_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn index(cli: cli::IndexCommand) -> anyhow::Result<()> {
    // the fqn is irrelevant for indexing
    let evaluator = load(&cli.input, "")?;
    output(&cli.output, evaluator.index()?)
}

pub fn resolve(cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let evaluator = load(&cli.input, &cli.fqn)?;

    let Some(value) = evaluator.evaluate(&cli.expression)? else {
        anyhow::bail!("{} does not resolve from {}", cli.expression, cli.fqn);
    };

    output(&cli.output, &value)
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let evaluator = load(&cli.input, &cli.fqn)?;
    println!("{}", evaluator.render(&cli.template)?);
    Ok(())
}

fn load(input: &cli::InputArgs, fqn: &str) -> anyhow::Result<YamlExpressionEvaluator> {
    let yaml = match &input.file {
        Some(file_path) => {
            tracing::info!(path=%file_path.display(), "loading file");
            std::fs::read_to_string(file_path)?
        }
        None => std::io::read_to_string(std::io::stdin())?,
    };

    Ok(YamlExpressionEvaluator::new(yaml, fqn).with_root_field(&input.root))
}

fn output<T: serde::Serialize>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
