use std::path::PathBuf;

use clap::ArgMatches;
use tracing::{error, info};

use cliconf_core::config::LayeredConfig;
use cliconf_core::events;
use cliconf_core::{Collection, Item, Scalar, format};

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    match matches.subcommand() {
        Some(("get", sub_matches)) => handle_get_command(matches, sub_matches),
        Some(("set", sub_matches)) => handle_set_command(matches, sub_matches),
        Some(("unset", sub_matches)) => handle_unset_command(matches, sub_matches),
        Some(("sections", sub_matches)) => handle_sections_command(matches, sub_matches),
        Some(("dump", sub_matches)) => handle_dump_command(matches, sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

/// Build and load the configuration named by the subcommand's `file` argument.
fn load_config(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<LayeredConfig, Box<dyn std::error::Error>> {
    let file = sub_matches
        .get_one::<String>("file")
        .ok_or("File argument is required")?;

    let paths: Vec<PathBuf> = matches
        .get_many::<String>("path")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();

    let mut config = match matches.get_one::<String>("home") {
        Some(home) => LayeredConfig::with_home(paths, home),
        None => LayeredConfig::new(paths)?,
    };

    let bubble = !matches.get_flag("no-bubble");
    config.load(file, bubble)?;

    info!(
        event = "cli.config_loaded",
        file = file,
        bubble = bubble
    );

    Ok(config)
}

fn key_arg(sub_matches: &ArgMatches) -> Result<&String, Box<dyn std::error::Error>> {
    Ok(sub_matches
        .get_one::<String>("key")
        .ok_or("Key argument is required")?)
}

/// Split `db.host` into its section path and final key.
fn split_key(key: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().unwrap_or(key);
    (parts, last)
}

/// Walk existing sections from `root`.
fn walk_sections(root: &Collection, sections: &[&str]) -> Result<Collection, cliconf_core::ConfigError> {
    sections
        .iter()
        .try_fold(root.clone(), |current, name| current.section(name))
}

fn print_scalars(collection: &Collection) {
    for (key, value) in collection {
        println!("{} = {}", key, value);
    }
}

fn handle_get_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches, sub_matches)?;
    let key = key_arg(sub_matches)?;
    let (sections, last) = split_key(key);

    let parent = walk_sections(&config, &sections)?;
    match parent.get(last)? {
        Item::Scalar(value) => println!("{}", value),
        Item::Section(section) => print_scalars(&section),
    }

    Ok(())
}

fn handle_set_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches, sub_matches)?;
    let key = key_arg(sub_matches)?;
    let raw = sub_matches
        .get_one::<String>("value")
        .ok_or("Value argument is required")?;
    let (sections, last) = split_key(key);

    let parent = match sections.as_slice() {
        [] => config.root().clone(),
        [section] => config.add_section(section)?,
        _ => {
            return Err(format!(
                "Key '{}' is nested too deeply, expected <key> or <section>.<key>",
                key
            )
            .into());
        }
    };

    let value = Scalar::infer(raw);
    info!(
        event = "cli.set_started",
        key = key,
        value_type = value.type_name()
    );
    parent.set(last, value)?;

    if config.has_changed() {
        config.save()?;
        info!(event = "cli.set_completed", key = key);
        println!("Updated '{}' in {}", key, display_file(&config));
    } else {
        println!("'{}' already has that value", key);
    }

    Ok(())
}

fn handle_unset_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches, sub_matches)?;
    let key = key_arg(sub_matches)?;
    let (sections, last) = split_key(key);

    let parent = walk_sections(&config, &sections)?;
    if !parent.delete(last) {
        println!("No local value for '{}' in {}", key, display_file(&config));
        return Ok(());
    }

    config.save()?;
    info!(event = "cli.unset_completed", key = key);

    if parent.has(last) {
        println!("Removed '{}' (inherited value still applies)", key);
    } else {
        println!("Removed '{}'", key);
    }

    Ok(())
}

fn handle_sections_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches, sub_matches)?;

    let target = match sub_matches.get_one::<String>("section") {
        Some(path) => {
            let names: Vec<&str> = path.split('.').collect();
            walk_sections(&config, &names)?
        }
        None => config.root().clone(),
    };

    for name in target.section_names() {
        println!("{}", name);
    }

    Ok(())
}

fn handle_dump_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches, sub_matches)?;

    if sub_matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&config.to_json()?)?);
    } else {
        print!("{}", format::serialize(&config.to_node()));
    }

    Ok(())
}

fn display_file(config: &LayeredConfig) -> String {
    config
        .filepath()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}
