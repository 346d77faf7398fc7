//! Startup banner and URL display

use super::constants::APP_NAME;

/// Print the startup banner with URLs
pub fn print_banner(host: &str, port: u16, data_dir: &str, aggregation_minutes: u64) {
    // Use localhost for display when binding to all interfaces
    let display_host = if host == "0.0.0.0" || host == "::" {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 14;

    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1",
        "API:", display_host, port
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1/generate",
        "Generate:", display_host, port
    );
    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1/live/events",
        "Live feed:", display_host, port
    );

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    if aggregation_minutes > 0 {
        println!(
            "  \x1b[90m➜  {:<W$} rollups every {} min\x1b[0m",
            "Aggregation:", aggregation_minutes
        );
    } else {
        println!(
            "  \x1b[90m➜  {:<W$} disabled (manual trigger only)\x1b[0m",
            "Aggregation:"
        );
    }
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Data:", data_dir);

    println!();
}
