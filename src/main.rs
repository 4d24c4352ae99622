use clap::Parser;
use shh::cli::{commands, output, Cli, Commands};
use shh::errors::ErrorKind;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::GenKeys { ref username, port } => {
            commands::gen_keys::execute(&cli, username.as_deref(), port)
        }
        Commands::Get { ref name } => commands::get::execute(&cli, name),
        Commands::Set { ref name, ref value } => {
            commands::set::execute(&cli, name, value.as_deref())
        }
        Commands::Del { ref name } => commands::del::execute(&cli, name),
        Commands::Edit { ref name } => commands::edit::execute(&cli, name),
        Commands::Allow { ref user, ref name } => commands::allow::execute(&cli, user, name),
        Commands::Deny { ref user, ref name } => {
            commands::deny::execute(&cli, user, name.as_deref())
        }
        Commands::AddUser { ref user, ref pubkey } => {
            commands::add_user::execute(&cli, user.as_deref(), pubkey.as_deref())
        }
        Commands::RmUser { ref user } => commands::rm_user::execute(&cli, user),
        Commands::Rotate => commands::rotate::execute(&cli),
        Commands::Serve => commands::serve::execute(&cli),
        Commands::Login => commands::login::execute(&cli),
        Commands::Show { ref user } => commands::show::execute(&cli, user.as_deref()),
        Commands::Version => {
            commands::version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        output::error(&e.to_string());
        if e.kind() == ErrorKind::Usage {
            output::tip("Run `shh --help` for usage.");
        }
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `SHH_LOG` (default: warn).
fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("SHH_LOG")
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}
