//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.  Status lines go to stderr
//! so secret values on stdout can be piped cleanly.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::manifest::Manifest;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of users and the secrets each one holds.
pub fn print_users_table<'a>(manifest: &Manifest, users: impl IntoIterator<Item = &'a str>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["User", "Secrets"]);

    for user in users {
        let names: Vec<&str> = manifest
            .secrets_for(user)
            .map(|s| s.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let cell = if names.is_empty() {
            style("(none)").dim().to_string()
        } else {
            names.join("\n")
        };
        table.add_row(vec![user.to_string(), cell]);
    }

    println!("{table}");
}
