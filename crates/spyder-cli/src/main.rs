//! spyder - subdomain enumeration from the command line

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    spyder_cli::run().await
}
