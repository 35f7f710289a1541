//! Mounts pstore, archives each record under a dated directory, empties it.

use pstore_core::DrainConfig;

fn main() {
    let code = pstore_cli::run("pstore-clean", DrainConfig::per_entry());
    std::process::exit(code);
}
