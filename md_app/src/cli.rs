/// Parses the comma-separated symbol list from command-line arguments
pub fn get_symbols(default: &[&str]) -> Vec<String> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        args[1].split(',').map(|symbol| symbol.trim().to_uppercase()).filter(|symbol| !symbol.is_empty()).collect()
    } else {
        default.iter().map(|symbol| symbol.to_string()).collect()
    }
}

/// Parses the per-symbol update rate (updates per second) from command-line arguments
pub fn get_rate(default: u64) -> u64 {
    let args: Vec<String> = std::env::args().collect();
    args.get(2).and_then(|arg| arg.parse().ok()).unwrap_or(default)
}
