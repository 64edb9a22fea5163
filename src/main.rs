use std::env;

#[tokio::main]
async fn main() {
    retire::logging::init_logging("info");

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = retire::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
            return;
        }
        Some("estimate") => {
            if let Err(e) = retire::api::run_cli(&raw_args[1..]) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            return;
        }
        _ => {}
    }

    eprintln!("Usage: retire serve [port] | retire estimate [--help]");
    std::process::exit(1);
}
