#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voxpopuli_lib::run().await
}
