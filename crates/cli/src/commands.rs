use clap::{Args, Subcommand, ValueEnum};
use engine_runtime::execution::{runner::Selection, settings::WriteErrorPolicy};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate one family, or users then resumes
    Migrate {
        #[arg(value_enum, default_value_t = FamilyArg::All)]
        family: FamilyArg,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Show the stored checkpoint and identity map size of a family
    Progress {
        #[arg(value_enum, default_value_t = FamilyArg::All)]
        family: FamilyArg,

        #[arg(long, help = "Print the progress as JSON instead of a table")]
        json: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Check that the source and target databases are reachable
    TestConn {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    Users,
    Resumes,
    All,
}

impl From<FamilyArg> for Selection {
    fn from(family: FamilyArg) -> Self {
        match family {
            FamilyArg::Users => Selection::Users,
            FamilyArg::Resumes => Selection::Resumes,
            FamilyArg::All => Selection::All,
        }
    }
}

/// Flags that take precedence over the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    #[arg(long, help = "Load variables from this file instead of ./.env")]
    pub env_file: Option<PathBuf>,

    #[arg(long, help = "Legacy database URL [env: SOURCE_DATABASE_URL]")]
    pub source_url: Option<String>,

    #[arg(long, help = "New database URL [env: TARGET_DATABASE_URL]")]
    pub target_url: Option<String>,

    #[arg(long, help = "Rows per batch [env: BATCH_SIZE]")]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Rows per insert chunk [env: INSERT_CHUNK_SIZE]")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Checkpoint and identity map directory [env: MIGRATION_STATE_DIR]")]
    pub state_dir: Option<PathBuf>,

    #[arg(long, help = "skip or halt on a failed batch [env: ON_WRITE_ERROR]")]
    pub on_write_error: Option<WriteErrorPolicy>,
}
