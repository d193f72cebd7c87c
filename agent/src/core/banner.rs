//! Startup banner
//!
//! Printed to stderr so it never mixes with console driver output on stdout.

use super::config::AppConfig;
use super::constants::APP_NAME;

/// Print the startup banner with the enabled drivers
pub fn print_banner(config: &AppConfig) {
    // Label width: "cloudwatch:" is 11 chars, pad to 13 for alignment
    const W: usize = 13;

    eprintln!();
    eprintln!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Server:", config.server_name
    );

    let drivers = config
        .cloudwatch
        .as_ref()
        .map(|cw| &cw.driver)
        .into_iter()
        .chain(config.console.as_ref().map(|c| &c.driver));
    for driver in drivers {
        eprintln!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {} \x1b[90m(every {}s)\x1b[0m",
            format!("{}:", driver.name),
            driver.namespace,
            driver.push_interval_secs
        );
    }
    eprintln!();
}
