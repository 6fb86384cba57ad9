use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Group-address export, 0.xml or .knxproj to import once and print as JSON.
    /// Without it, the HTTP service is started.
    pub input: Option<String>,

    /// Project password for encrypted .knxproj files
    #[arg(long)]
    pub password: Option<String>,

    /// Port to serve on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Pretty-print JSON output of a one-shot import
    #[arg(long)]
    pub pretty: bool,
}
