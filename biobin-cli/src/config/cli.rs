use clap::{Command, arg};

pub const CONFIG_CMD: &str = "config";

pub fn create_config_cli() -> Command {
    Command::new(CONFIG_CMD)
        .about("Print the default configuration as TOML, or validate a configuration file")
        .arg(arg!(-c --check <config> "Configuration file to validate").required(false))
}
