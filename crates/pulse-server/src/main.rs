use clap::Parser;

use pulse_server::cli::{ServerArgs, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServerArgs::parse();
    run(args).await
}
