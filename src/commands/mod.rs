use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::AppResult;
use crate::models::{Destination, StyleParameters};
use crate::modules::coordinator::{AppCoordinator, GenerateOutcome};
use crate::modules::navigation::NavigationOutcome;
use crate::modules::logger;
use crate::modules::storage::Persisted;
use crate::modules::validation::ImageFile;

const DEFAULT_HISTORY: usize = 10;

pub const HELP: &str = "\
status              show remaining quota
go <destination>    open dashboard|textGeneration|imageUpload|results|projectList
back                return to the previous screen
home                return to the dashboard
history [n]         list recent screens, most recent first
text <prompt>       generate text from a prompt
image <path>... [-- <description>]
                    generate from JPEG/PNG uploads
projects            list projects
project <name>      start a new project
upgrade <limit>     raise the daily allowance
dismiss             dismiss the upgrade prompt
clear-logs          empty the log files
quit                exit";

/// One line of driver input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Go(Destination),
    Back,
    Home,
    History(usize),
    Text(String),
    Image {
        paths: Vec<PathBuf>,
        description: String,
    },
    Projects,
    NewProject(String),
    Upgrade(u32),
    Dismiss,
    ClearLogs,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "status" => Ok(Command::Status),
            "go" => rest.parse().map(Command::Go),
            "back" => Ok(Command::Back),
            "home" => Ok(Command::Home),
            "history" if rest.is_empty() => Ok(Command::History(DEFAULT_HISTORY)),
            "history" => rest
                .parse()
                .map(Command::History)
                .map_err(|_| format!("Invalid history length: {}", rest)),
            "text" => Ok(Command::Text(rest.to_string())),
            "image" if rest.is_empty() => Err("image needs at least one file path".to_string()),
            "image" => {
                let (paths, description) = match rest.split_once("--") {
                    Some((paths, description)) => (paths, description.trim()),
                    None => (rest, ""),
                };
                let paths: Vec<PathBuf> = paths.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    return Err("image needs at least one file path".to_string());
                }
                Ok(Command::Image {
                    paths,
                    description: description.to_string(),
                })
            }
            "projects" => Ok(Command::Projects),
            "project" if rest.is_empty() => Err("project needs a name".to_string()),
            "project" => Ok(Command::NewProject(rest.to_string())),
            "upgrade" => rest
                .parse()
                .map(Command::Upgrade)
                .map_err(|_| format!("Invalid daily limit: {}", rest)),
            "dismiss" => Ok(Command::Dismiss),
            "clear-logs" => Ok(Command::ClearLogs),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err("Empty command".to_string()),
            other => Err(format!("Unknown command: {} (try help)", other)),
        }
    }
}

/// Run one command against the session and render its result
pub async fn execute(
    app: &mut AppCoordinator,
    command: Command,
    data_dir: &Path,
) -> AppResult<String> {
    tracing::debug!("Executing {:?}", command);
    let output = match command {
        Command::Status => app.announce_quota_status(),
        Command::Go(destination) => {
            let outcome = app.navigate(destination);
            let line = match outcome.value {
                NavigationOutcome::Pushed(d) => format!("Now on {}", d.title()),
                NavigationOutcome::Redirected { requested } => format!(
                    "Daily quota used up, {} needs an upgrade. Now on {}",
                    requested.title(),
                    Destination::UpgradeRequired.title()
                ),
            };
            with_save_note(&outcome, line)
        }
        Command::Back => {
            let popped = app.back();
            let line = match popped.value {
                Some(_) => format!("Back on {}", app.current().title()),
                None => format!("Already on {}", app.current().title()),
            };
            with_save_note(&popped, line)
        }
        Command::Home => {
            let reset = app.navigate_to_dashboard();
            with_save_note(&reset, format!("Now on {}", app.current().title()))
        }
        Command::History(limit) => app
            .history(limit)
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(" <- "),
        Command::Text(prompt) => {
            let outcome = app.generate_text(&prompt, StyleParameters::default()).await?;
            with_save_note(&outcome, render_generation(&outcome.value))
        }
        Command::Image { paths, description } => {
            let files = paths
                .iter()
                .map(|p| ImageFile::from_path(p))
                .collect::<AppResult<Vec<_>>>()?;
            let outcome = app
                .generate_images(files, &description, StyleParameters::default())
                .await?;
            with_save_note(&outcome, render_generation(&outcome.value))
        }
        Command::Projects => {
            if app.projects().is_empty() {
                "No projects yet".to_string()
            } else {
                app.projects()
                    .iter()
                    .map(|p| format!("{}  {}  {:?}  {} results", p.id, p.name, p.status, p.results.len()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::NewProject(name) => {
            let created = app.create_project(&name);
            with_save_note(&created, format!("Created project {} ({})", name, created.value))
        }
        Command::Upgrade(limit) => {
            let upgraded = app.upgrade(limit);
            with_save_note(&upgraded, app.announce_quota_status())
        }
        Command::Dismiss => {
            app.dismiss_quota_exceeded_alert();
            "Upgrade prompt dismissed".to_string()
        }
        Command::ClearLogs => {
            logger::clear_logs(data_dir)?;
            tracing::info!("Log files cleared");
            "Logs cleared".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => "Bye".to_string(),
    };
    Ok(output)
}

fn render_generation(outcome: &GenerateOutcome) -> String {
    match outcome {
        GenerateOutcome::Completed(result) => {
            let mut lines = vec![format!("Generated {} ({:?})", result.id, result.kind)];
            lines.extend(result.texts.iter().map(|t| format!("---\n{}", t)));
            if !result.images.is_empty() {
                lines.push(format!("{} image(s)", result.images.len()));
            }
            lines.join("\n")
        }
        GenerateOutcome::QuotaExceeded => {
            "Daily quota used up. Upgrade or wait for the reset.".to_string()
        }
    }
}

fn with_save_note<T>(persisted: &Persisted<T>, line: String) -> String {
    match &persisted.saved {
        Ok(()) => line,
        Err(e) => format!("{} (not saved: {})", line, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppConfig;
    use crate::modules::generator::MockGenerator;
    use crate::modules::storage::tests::BrokenStore;
    use crate::modules::storage::StateStorage;
    use crate::utils::SystemClock;
    use std::sync::Arc;

    fn app(limit: u32) -> AppCoordinator {
        let config = AppConfig {
            daily_generation_limit: limit,
            ..AppConfig::default()
        };
        AppCoordinator::new(
            config,
            StateStorage::in_memory(),
            Arc::new(SystemClock),
            Arc::new(MockGenerator::new()),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "go textGeneration".parse::<Command>().unwrap(),
            Command::Go(Destination::TextGeneration)
        );
        assert_eq!("history".parse::<Command>().unwrap(), Command::History(10));
        assert_eq!("history 3".parse::<Command>().unwrap(), Command::History(3));
        assert_eq!(
            "text  a poster for a jazz night ".parse::<Command>().unwrap(),
            Command::Text("a poster for a jazz night".to_string())
        );
        assert_eq!(
            "image a.jpg b.png".parse::<Command>().unwrap(),
            Command::Image {
                paths: vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")],
                description: String::new(),
            }
        );
        assert_eq!(
            "image a.jpg -- a moody skyline ".parse::<Command>().unwrap(),
            Command::Image {
                paths: vec![PathBuf::from("a.jpg")],
                description: "a moody skyline".to_string(),
            }
        );
        assert!("image -- only words".parse::<Command>().is_err());
        assert_eq!("clear-logs".parse::<Command>().unwrap(), Command::ClearLogs);
        assert!("go nowhere".parse::<Command>().is_err());
        assert!("upgrade lots".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_session_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(1);

        let out = execute(&mut app, Command::Text("a poster".to_string()), dir.path())
            .await
            .unwrap();
        assert!(out.starts_with("Generated"));
        assert!(!out.contains("not saved"));
        assert_eq!(app.current(), Destination::Results);

        let out = execute(&mut app, Command::Go(Destination::ImageUpload), dir.path())
            .await
            .unwrap();
        assert!(out.contains("needs an upgrade"));
        assert_eq!(app.current(), Destination::UpgradeRequired);

        let out = execute(&mut app, Command::History(2), dir.path()).await.unwrap();
        assert_eq!(out, "upgradeRequired <- results");

        let out = execute(&mut app, Command::Home, dir.path()).await.unwrap();
        assert_eq!(out, "Now on Dashboard");
        let out = execute(&mut app, Command::Back, dir.path()).await.unwrap();
        assert_eq!(out, "Already on Dashboard");
    }

    #[tokio::test]
    async fn test_image_command_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let mut app = app(5);
        let image = Command::Image {
            paths: vec![path],
            description: "Storefront at dusk".to_string(),
        };
        let out = execute(&mut app, image, dir.path()).await.unwrap();
        assert!(out.ends_with("1 image(s)"));
        assert_eq!(app.current_project().unwrap().results[0].prompt, "Storefront at dusk");

        let missing = Command::Image {
            paths: vec![dir.path().join("gone.png")],
            description: String::new(),
        };
        assert!(execute(&mut app, missing, dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_generation_reports_unsaved_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = AppCoordinator::new(
            AppConfig::default(),
            StateStorage::new(Arc::new(BrokenStore)),
            Arc::new(SystemClock),
            Arc::new(MockGenerator::new()),
        );
        let out = execute(&mut app, Command::Text("a poster".to_string()), dir.path())
            .await
            .unwrap();
        assert!(out.starts_with("Generated"));
        assert!(out.contains("(not saved: "));
    }

    #[tokio::test]
    async fn test_clear_logs_command() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = logger::get_log_dir(dir.path())
            .unwrap()
            .join("creative_studio.log.2025-10-08");
        std::fs::write(&log_file, "old entries").unwrap();

        let mut app = app(1);
        let out = execute(&mut app, Command::ClearLogs, dir.path()).await.unwrap();
        assert_eq!(out, "Logs cleared");
        assert_eq!(std::fs::read_to_string(&log_file).unwrap(), "");
    }
}
