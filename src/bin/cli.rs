use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    classroom::cli::run().await
}
