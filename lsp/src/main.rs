#[tokio::main]
async fn main() {
    crls_lsp::server::run().await;
}
