use commands::command_argument_builder;
use mirra::handlers::{handle_get, handle_mirror, init_tracing};

mod commands;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    init_tracing(chosen_command.get_flag("verbose"));

    let code = match chosen_command.subcommand() {
        Some(("get", primary_command)) => handle_get(primary_command).await,
        Some(("mirror", primary_command)) => handle_mirror(primary_command).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    std::process::exit(code);
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
