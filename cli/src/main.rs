use clap::Parser;
use attest_cli::cmd::Args;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let code = args.exec().await.unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        1
    });
    std::process::exit(code);
}
