use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod chart;
mod error;
mod input;
mod models;
mod report;

use models::ReportConfig;

#[derive(Parser)]
#[command(name = "marks-report")]
#[command(about = "Aggregate student exam marks and render bar chart reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChartStyle {
    /// Stacked per-student totals only
    Stacked,
    /// Grouped per-subject threshold counts only
    Subjects,
    /// Both charts
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a randomly generated sample marks CSV
    Generate {
        #[arg(long, default_value = "student_marks.csv")]
        out: PathBuf,
        #[arg(long, default_value_t = 20)]
        students: usize,
        /// Fixed seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the aggregate summary for a marks table
    Summary {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render bar charts for a marks table
    Chart {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ChartStyle::All)]
        style: ChartStyle,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Render both charts and write the summary to a markdown file
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value = "marks-report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            out,
            students,
            seed,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let records = input::generate_students(students, config.subjects.len(), seed);
            input::write_csv(&out, &records, &config)?;
            println!("Wrote {} students to {}.", records.len(), out.display());
        }
        Commands::Summary { input, config } => {
            let config = load_config(config.as_deref())?;
            let students = load_students(&input, &config)?;
            let aggregates = aggregate::aggregate(&students, &config);
            print!("{}", report::build_summary(&students, &aggregates, &config));
        }
        Commands::Chart {
            input,
            config,
            style,
            out_dir,
        } => {
            let config = load_config(config.as_deref())?;
            let students = load_students(&input, &config)?;
            let aggregates = aggregate::aggregate(&students, &config);
            render_charts(style, &out_dir, &students, &aggregates, &config)?;
        }
        Commands::Report {
            input,
            config,
            out_dir,
            out,
        } => {
            let config = load_config(config.as_deref())?;
            let students = load_students(&input, &config)?;
            let aggregates = aggregate::aggregate(&students, &config);
            render_charts(ChartStyle::All, &out_dir, &students, &aggregates, &config)?;

            let summary = report::build_summary(&students, &aggregates, &config);
            std::fs::write(&out, &summary)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Summary written to {}.", out.display());
            print!("{summary}");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ReportConfig> {
    let config = match path {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ReportConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn load_students(
    input: &Path,
    config: &ReportConfig,
) -> anyhow::Result<Vec<models::StudentRecord>> {
    input::load_students(input, config)
        .with_context(|| format!("failed to load marks from {}", input.display()))
}

fn render_charts(
    style: ChartStyle,
    out_dir: &Path,
    students: &[models::StudentRecord],
    aggregates: &aggregate::Aggregates,
    config: &ReportConfig,
) -> anyhow::Result<()> {
    if matches!(style, ChartStyle::Stacked | ChartStyle::All) {
        let path = out_dir.join(chart::STACKED_CHART_FILE);
        chart::render_stacked_totals(&path, students, aggregates, config)?;
        println!("Stacked totals chart saved to {}.", path.display());
    }
    if matches!(style, ChartStyle::Subjects | ChartStyle::All) {
        let path = out_dir.join(chart::SUBJECT_CHART_FILE);
        chart::render_subject_thresholds(&path, aggregates, config)?;
        println!("Subject threshold chart saved to {}.", path.display());
    }
    Ok(())
}
