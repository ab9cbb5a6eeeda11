use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario file to load; the built-in demo scenario when omitted.
    #[arg(long)]
    file: Option<String>,

    /// Days of case history the demo scenario generates.
    #[arg(long, default_value_t = 60)]
    days: u32,

    #[arg(long, default_value = "redis://127.0.0.1:6379")]
    redis_url: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let scenario = match &args.file {
        Some(path) => ingest::load_scenario(path),
        None => ingest::demo_scenario(args.days),
    };

    ingest::seed(&args.redis_url, &scenario).await;
}
