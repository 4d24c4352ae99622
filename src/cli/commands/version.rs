//! `shh version`: display the version.

/// Execute the `version` command.
pub fn execute() {
    println!("shh {}", env!("CARGO_PKG_VERSION"));
}
