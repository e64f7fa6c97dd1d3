#[tokio::main]
async fn main() {
    if let Err(e) = tactical_terminal_lib::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
