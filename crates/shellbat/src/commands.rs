use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use shellbat_core::config::{PropertyValue, SettingsDocument};
use shellbat_core::{
    AppContext, ConfigPaths, ExtensionIconResolver, FavoriteToggle, FileSystemProbe, HistoryEntry,
    InstanceSettings, Location, ShellEvent,
};
use tracing::{debug, info};

use crate::{Command, SettingsAction};

pub async fn run(paths: ConfigPaths, command: Command) -> anyhow::Result<()> {
    let mut context = AppContext::open(paths, Arc::new(ExtensionIconResolver));
    debug!("Using config directory {:?}", context.paths().config_dir);

    match command {
        Command::History => print_history(&context),
        Command::Visit { path, name } => {
            let mut location = location_for(&path);
            if let Some(name) = name {
                location.display_name = name.into();
            }
            if context.visit(&location).await {
                info!("Visited {}", location.key);
            } else {
                println!("Nothing recorded for {}", location.key);
            }
        }
        Command::Back { step } => print_move(context.go_back(step)),
        Command::Forward { step } => print_move(context.go_forward(step)),
        Command::Forget { root } => {
            if context.forget(&root) {
                println!("Removed entries under {}", root);
            } else {
                println!("No entries under {}", root);
            }
        }
        Command::Prune => {
            let before = context.history().len();
            context.prune(&FileSystemProbe);
            println!("Removed {} history entries", before - context.history().len());
        }
        Command::Clear => println!("Removed {} history entries", context.clear_history()),
        Command::Favorites => {
            for favorite in context.settings().favorites() {
                println!("{}\t{}", favorite.location_key, favorite.display_name);
            }
        }
        Command::Favorite { path } => {
            let location = location_for(&path);
            match context.toggle_favorite(&location).await {
                FavoriteToggle::Added => println!("Added {} to favorites", location.key),
                FavoriteToggle::Removed => println!("Removed {} from favorites", location.key),
            }
        }
        Command::Settings { instance: None, action } => {
            settings(context.settings().as_ref(), action)?;
            context
                .history()
                .set_max_entries(context.settings().maximum_history_entries());
        }
        Command::Settings {
            instance: Some(name),
            action,
        } => {
            let instance = InstanceSettings::open(context.paths(), &name)
                .with_context(|| format!("Invalid instance name: {}", name))?;
            settings(&instance, action)?;
            instance.flush().await?;
        }
        Command::Backup => {
            let created = context.backup_all();
            if created.is_empty() {
                println!("Nothing backed up");
            }
            for path in created {
                println!("{}", path.display());
            }
        }
        Command::Watch => watch(&mut context).await?,
    }

    context.shutdown().await.context("Failed to save settings")
}

fn location_for(path: &Path) -> Location {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Location::from_path(&path)
}

fn print_history(context: &AppContext) {
    let cursor = context.history().cursor();
    for (i, entry) in context.history().entries().iter().enumerate() {
        let marker = if Some(i) == cursor { '*' } else { ' ' };
        println!(
            "{} {}  {}\t{}",
            marker,
            entry.last_visited_time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            entry.location_key,
            entry.display_name
        );
    }
}

fn print_move(entry: Option<HistoryEntry>) {
    match entry {
        Some(entry) => println!("{}", entry.location_key),
        None => println!("Already at the end of the history"),
    }
}

fn settings(document: &dyn SettingsDocument, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::List => {
            for row in document.list() {
                print_property(&row);
            }
        }
        SettingsAction::Get { name } => {
            let value = document
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown setting: {}", name))?;
            println!("{}", value);
        }
        SettingsAction::Set { name, value } => {
            if document.set_from_str(&name, &value)? {
                info!("Set {} to {}", name, value);
            }
        }
    }
    Ok(())
}

fn print_property(row: &PropertyValue) {
    let origin = match (row.declared, row.is_default) {
        (None, _) => " (custom)",
        (Some(_), true) => " (default)",
        (Some(_), false) => "",
    };
    println!("{} = {}{}", row.name, row.value, origin);
}

async fn watch(context: &mut AppContext) -> anyhow::Result<()> {
    let events = context.event_receiver();
    context.watch_settings();
    println!("Watching {} (Ctrl-C to stop)", context.paths().global_settings.display());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ShellEvent::SettingsReloaded { changed }) => {
                    println!("Changed: {}", changed.join(", "));
                }
                Ok(other) => debug!("Event: {:?}", other),
                Err(_) => break,
            },
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }
    Ok(())
}
