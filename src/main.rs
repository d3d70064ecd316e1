mod cli;

use clap::Parser;
use pamlwick::model::PamlResult;
use pamlwick::paml::PamlParserBuilder;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: cli::Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = PamlParserBuilder::for_file(&args.report)?
        .with_reconstruction_file(args.reconstruction_file)
        .with_strict_sequence_count(!args.lenient);
    if args.no_rst {
        builder = builder.without_reconstruction();
    }
    let results: Vec<PamlResult> = builder.build()?.into_results()?;

    if args.trees {
        for (i, result) in results.iter().enumerate() {
            for tree in result.trees() {
                println!("[run {}] {}", i + 1, tree.to_newick());
            }
            for model in result.site_class_models() {
                for tree in &model.trees {
                    println!("[run {}, model {}] {}", i + 1, model.model_num, tree.to_newick());
                }
            }
        }
    } else if args.compact {
        println!("{}", serde_json::to_string(&results)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}
