use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "syllabus",
    version,
    about = "Read-only queries over the exam-prep content catalog"
)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "SYLLABUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Rolling log directory; logs go to stderr when unset.
    #[arg(long, env = "SYLLABUS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long = "db", env = "SYLLABUS_DB_PATH", default_value = "syllabus.sqlite3")]
    pub db_path: PathBuf,

    #[arg(long, env = "SYLLABUS_BUSY_TIMEOUT_MS", default_value_t = 5_000)]
    pub busy_timeout_ms: u64,

    /// Longest a single read statement may run before it is interrupted.
    #[arg(long, env = "SYLLABUS_QUERY_TIMEOUT_MS", default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the content store schema.
    Init,
    /// Subjects with at least one published syllabus row.
    Subjects,
    Syllabus(SubjectArgs),
    Subtopics(SubjectArgs),
    MicroUnits(MicroUnitsArgs),
    Note(MicroUnitArgs),
    Mcqs(MicroUnitArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SubjectArgs {
    #[arg(long)]
    pub subject: String,
}

#[derive(Args, Debug, Clone)]
pub struct MicroUnitsArgs {
    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub subtopic: String,
}

#[derive(Args, Debug, Clone)]
pub struct MicroUnitArgs {
    #[arg(long = "id")]
    pub micro_unit_id: String,
}
