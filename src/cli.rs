use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Inspect PAML result reports", long_about = None)]
pub struct Args {
    /// Path to the report (e.g. mlc, or the baseml/yn00 output file)
    pub report: PathBuf,

    /// File name of the ancestral reconstruction stream next to the report
    #[arg(long = "rst", default_value = "rst")]
    pub reconstruction_file: String,

    /// Do not read the ancestral reconstruction stream
    #[arg(long)]
    pub no_rst: bool,

    /// Record sequence-count mismatches as warnings instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Print the trees in bracket notation instead of JSON
    #[arg(long)]
    pub trees: bool,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    pub compact: bool,
}
