//! # signer
//!
//! Runs the SingleHash, MultiHash, Combine chain and prints the combined
//! signature.
//!
//! ## Usage
//! ```bash
//! signer                      # hashes the demo dataset 0 1 1 2 3 5 8
//! seq 1 20 | signer           # one item per input line
//! RUST_LOG=debug signer       # stage-level logging
//! ```

mod cli;

use signer_pipeline::Result;

fn main() -> Result<()> {
    cli::run()
}
