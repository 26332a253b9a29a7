use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trs",
    about = "Translation store stack: inspect, edit and import layered translations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file listing the stores
    #[arg(short, long, global = true, default_value = "trs.toml")]
    pub config: PathBuf,

    /// Module whose visible stores form the stack
    #[arg(short, long, global = true, default_value = ".")]
    pub module: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the stores of the stack in precedence order
    Stores,
    /// List every visible translation
    List(ListArgs),
    /// Show every definition of a key across the stack
    Show(ShowArgs),
    /// Add a new translation
    Add(AddArgs),
    /// Set the text of an existing translation for one language
    Set(SetArgs),
    /// Rename a key
    Rename(RenameArgs),
    /// Remove translations
    Remove(RemoveArgs),
    /// Add a language to a store
    AddLanguage(AddLanguageArgs),
    /// Import translations from a CSV table
    Import(ImportArgs),
    /// Export the merged view as a CSV table
    Export(ExportArgs),
    /// Derive an unused key from free text
    GenerateKey(GenerateKeyArgs),
    /// Check a key against the stack
    ValidateKey(ValidateKeyArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Only entries of editable stores
    #[arg(long)]
    pub editable: bool,
    /// Language to show instead of the default one
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub key: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub key: String,
    /// Default text
    pub text: String,
    /// Further texts as LANGUAGE=TEXT
    #[arg(short = 't', long = "translation")]
    pub translations: Vec<String>,
    /// Target store identity (defaults to the first editable store)
    #[arg(short, long)]
    pub store: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    pub text: String,
    #[arg(short, long, default_value = "default")]
    pub language: String,
    #[arg(short, long)]
    pub store: Option<String>,
}

#[derive(Args)]
pub struct RenameArgs {
    pub old_key: String,
    pub new_key: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args)]
pub struct AddLanguageArgs {
    pub language: String,
    #[arg(short, long)]
    pub store: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// Store receiving new keys (overrides the configuration)
    #[arg(short, long)]
    pub store: Option<String>,
    /// Header of the key column (overrides the configuration)
    #[arg(long)]
    pub key_column: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file; standard output when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateKeyArgs {
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct ValidateKeyArgs {
    pub key: String,
    #[arg(short, long)]
    pub store: Option<String>,
    /// Accept the key if the store already defines it
    #[arg(long)]
    pub existing: bool,
}
