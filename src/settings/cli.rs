use super::Parser;

#[derive(Parser, Debug)]
pub struct Cli {
    /// Path to a settings file; defaults per build profile.
    #[arg(long)]
    pub settings: Option<String>,

    /// Override the log filter from the settings file.
    #[arg(long)]
    pub log_filter: Option<String>,
}
