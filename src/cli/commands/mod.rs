//! One module per `shh` subcommand.  Each exposes an `execute` function
//! called from `main`.

pub mod add_user;
pub mod allow;
pub mod del;
pub mod deny;
pub mod edit;
pub mod gen_keys;
pub mod get;
pub mod init;
pub mod login;
pub mod rm_user;
pub mod rotate;
pub mod serve;
pub mod set;
pub mod show;
pub mod version;
