#[tokio::main]
async fn main() {
    if let Err(e) = gbv_register_lib::run().await {
        eprintln!("gbv-register: {e}");
        std::process::exit(1);
    }
}
