#[tokio::main]
async fn main() {
    if let Err(e) = capacity_backend::run().await {
        eprintln!("capacity service failed: {}", e);
        std::process::exit(1);
    }
}
