#[tokio::main]
async fn main() {
    epiwatch::start_server().await;
}
