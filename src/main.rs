#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doc_chat_lib::run().await
}
