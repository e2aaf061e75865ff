use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gotestsplit_splitter::{
    Casing, FormatterKind, LoaderKind, ResidualOutcome, SplitConfig, SplitReport, Splitter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gotestsplit")]
#[command(about = "Split a Go test file into one file per test function", long_about = None)]
#[command(version)]
struct Cli {
    /// Package pattern the file belongs to (e.g. ./..., ./pkg/foo)
    package: String,

    /// Go test file to split
    file: PathBuf,

    /// Prefix for generated file names: {base}_{name}_test.go
    #[arg(long)]
    output_base: Option<String>,

    /// Snake-case the derived names (--snake-case=false keeps them verbatim)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    snake_case: Option<bool>,

    /// Name prefix marking a test function
    #[arg(long)]
    test_prefix: Option<String>,

    /// How to load the enclosing package
    #[arg(long, value_enum)]
    loader: Option<LoaderArg>,

    /// Final layout pass: gofmt when installed, always gofmt, or built-in only
    #[arg(long, value_enum)]
    formatter: Option<FormatterArg>,

    /// TOML file with default settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LoaderArg {
    Auto,
    GoList,
    Dir,
}

impl From<LoaderArg> for LoaderKind {
    fn from(arg: LoaderArg) -> Self {
        match arg {
            LoaderArg::Auto => LoaderKind::Auto,
            LoaderArg::GoList => LoaderKind::GoList,
            LoaderArg::Dir => LoaderKind::Dir,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatterArg {
    Auto,
    Gofmt,
    Builtin,
}

impl From<FormatterArg> for FormatterKind {
    fn from(arg: FormatterArg) -> Self {
        match arg {
            FormatterArg::Auto => FormatterKind::Auto,
            FormatterArg::Gofmt => FormatterKind::Gofmt,
            FormatterArg::Builtin => FormatterKind::Builtin,
        }
    }
}

impl Cli {
    fn split_config(&self) -> Result<SplitConfig> {
        let mut config = match &self.config {
            Some(path) => SplitConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SplitConfig::default(),
        };

        if let Some(base) = &self.output_base {
            config.output_base.clone_from(base);
        }
        if let Some(snake) = self.snake_case {
            config.casing = Casing::from_snake_flag(snake);
        }
        if let Some(prefix) = &self.test_prefix {
            config.test_prefix.clone_from(prefix);
        }
        if let Some(loader) = self.loader {
            config.loader = loader.into();
        }
        if let Some(formatter) = self.formatter {
            config.formatter = formatter.into();
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(e) = run(&cli) {
        eprintln!("error running command: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.split_config()?;
    let splitter = Splitter::new(config)?;
    log::debug!("config: {:?}", splitter.config());
    let report = splitter.split(&cli.package, &cli.file)?;
    summarize(&report);
    Ok(())
}

fn summarize(report: &SplitReport) {
    log::debug!("package {}", report.package_id);
    match &report.residual {
        ResidualOutcome::Rewritten(path) => {
            log::info!(
                "split {} test(s) out of {}",
                report.written.len(),
                path.display()
            );
        }
        ResidualOutcome::Deleted(path) => {
            log::info!(
                "split {} test(s), removed {}",
                report.written.len(),
                path.display()
            );
        }
        ResidualOutcome::DeleteFailed { path, .. } => {
            log::warn!(
                "split {} test(s), {} still holds the originals",
                report.written.len(),
                path.display()
            );
        }
    }
}
