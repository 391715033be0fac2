use clap::{Arg, ArgAction, Command};

fn file_arg() -> Arg {
    Arg::new("file")
        .help("Configuration file to load (may not exist yet)")
        .required(true)
        .index(1)
}

fn key_arg() -> Arg {
    Arg::new("key")
        .help("Dotted key path, e.g. 'db.host'")
        .required(true)
        .index(2)
}

pub fn build_cli() -> Command {
    Command::new("cliconf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit layered INI configuration files")
        .long_about("cliconf loads a configuration file together with every same-named file found in its parent directories, your home directory and any extra search paths. Reads see the merged result; writes only ever touch the file you named.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("home")
                .long("home")
                .help("Home directory to stop searching at (default: $HOME)")
                .global(true),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .short('p')
                .help("Additional directory or file to merge (repeatable)")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("no-bubble")
                .long("no-bubble")
                .help("Only read the named file, skip parent directories and search paths")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("get")
                .about("Print a value, or the scalars of a section")
                .arg(file_arg())
                .arg(key_arg())
        )
        .subcommand(
            Command::new("set")
                .about("Set a value in the named file")
                .arg(file_arg())
                .arg(key_arg())
                .arg(
                    Arg::new("value")
                        .help("Value to store; booleans and numbers are detected")
                        .required(true)
                        .allow_hyphen_values(true)
                        .index(3)
                )
        )
        .subcommand(
            Command::new("unset")
                .about("Remove a value from the named file (inherited values remain)")
                .arg(file_arg())
                .arg(key_arg())
        )
        .subcommand(
            Command::new("sections")
                .about("List section names")
                .arg(file_arg())
                .arg(
                    Arg::new("section")
                        .help("Dotted path of the section to list (default: top level)")
                        .index(2)
                )
        )
        .subcommand(
            Command::new("dump")
                .about("Print the merged configuration")
                .arg(file_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "cliconf");
    }

    #[test]
    fn test_cli_get_command() {
        let app = build_cli();
        let matches = app.try_get_matches_from(vec!["cliconf", "get", "app.conf", "db.host"]);
        assert!(matches.is_ok());

        let matches = matches.unwrap();
        let get_matches = matches.subcommand_matches("get").unwrap();
        assert_eq!(get_matches.get_one::<String>("file").unwrap(), "app.conf");
        assert_eq!(get_matches.get_one::<String>("key").unwrap(), "db.host");
    }

    #[test]
    fn test_cli_set_negative_value() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["cliconf", "set", "app.conf", "offset", "-5"])
            .unwrap();
        let set_matches = matches.subcommand_matches("set").unwrap();
        assert_eq!(set_matches.get_one::<String>("value").unwrap(), "-5");
    }

    #[test]
    fn test_cli_repeatable_paths() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec![
                "cliconf", "--path", "/etc/app", "-p", "/opt/app", "dump", "app.conf",
            ])
            .unwrap();
        let paths: Vec<&String> = matches.get_many::<String>("path").unwrap().collect();
        assert_eq!(paths, vec!["/etc/app", "/opt/app"]);
    }

    #[test]
    fn test_cli_dump_json_flag() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["cliconf", "dump", "app.conf", "--json"])
            .unwrap();
        let dump_matches = matches.subcommand_matches("dump").unwrap();
        assert!(dump_matches.get_flag("json"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let app = build_cli();
        assert!(app.try_get_matches_from(vec!["cliconf"]).is_err());
    }
}
