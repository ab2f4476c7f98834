use std::process;

fn main() {
    if let Err(e) = terrask::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
