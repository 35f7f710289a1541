//! Concatenates an externally mounted pstore, newest record first, into one file.

use pstore_core::DrainConfig;

fn main() {
    let code = pstore_cli::run("pstore-collect", DrainConfig::aggregate());
    std::process::exit(code);
}
