use clap::ValueEnum;

/// How commands report their results on stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FormatOptions {
    /// JSON, for build scripts that consume the result
    #[value(name = "json")]
    Json,
    /// Human-readable colored terminal output
    #[default]
    #[value(name = "stdout")]
    Stdout,
}

impl FormatOptions {
    pub fn print(&self, stdout_msg: &str, json: &serde_json::Value) {
        match self {
            Self::Stdout => println!("{stdout_msg}"),
            Self::Json => println!("{json:#}"),
        }
    }
}
