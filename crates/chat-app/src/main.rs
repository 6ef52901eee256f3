mod command;
mod console;

use std::sync::Arc;

use salon_backend::{BackendError, ChatBackend, HttpBackend};
use salon_sync::{
    ClientConfig, ConfigError, ConfigStore, DirectorySession, RoomSession, RoomSurfaces,
};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use command::{Command, HELP, resolve_member};
use console::ConsoleView;

#[derive(Debug, Snafu)]
enum AppError {
    #[snafu(display("failed to start async runtime on `{stage}`: {source}"))]
    Runtime {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to connect to the chat server on `{stage}`: {source}"))]
    Backend {
        stage: &'static str,
        source: BackendError,
    },
    #[snafu(display("failed to read input on `{stage}`: {source}"))]
    ReadStdin {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write config on `{stage}`: {source}"))]
    WriteConfig {
        stage: &'static str,
        source: ConfigError,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = try_main() {
        tracing::error!(error = %error, "salon exited with an error");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), AppError> {
    let store = ConfigStore::load();

    if std::env::args().nth(1).as_deref() == Some("init-config") {
        store.persist().context(WriteConfigSnafu {
            stage: "persist-config",
        })?;
        println!("wrote {}", store.config_path().display());
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(RuntimeSnafu {
            stage: "build-runtime",
        })?;

    runtime.block_on(run(store.config()))
}

async fn run(config: Arc<ClientConfig>) -> Result<(), AppError> {
    let backend: Arc<dyn ChatBackend> =
        Arc::new(HttpBackend::new(&config.backend).context(BackendSnafu {
            stage: "build-backend",
        })?);
    let console = Arc::new(ConsoleView::default());

    match config.room_id {
        Some(room) => {
            let surfaces = RoomSurfaces {
                messages: console.clone(),
                typing: console.clone(),
                room_state: console.clone(),
                navigator: console.clone(),
            };
            let mut session = RoomSession::new(&config, room, backend, surfaces);
            tracing::info!(room_id = %room, base_url = %config.backend.base_url, "joining room");
            session.start();
            println!("{HELP}");

            let result = command_loop(&session, &console).await;
            session.shutdown().await;
            result
        }
        None => {
            let mut session = DirectorySession::new(&config, backend, console.clone());
            tracing::info!(base_url = %config.backend.base_url, "browsing rooms");
            session.start();

            let result = tokio::signal::ctrl_c().await.context(ReadStdinSnafu {
                stage: "wait-ctrl-c",
            });
            session.shutdown().await;
            result
        }
    }
}

async fn command_loop(session: &RoomSession, console: &ConsoleView) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = console.left_room() => return Ok(()),
            line = lines.next_line() => line.context(ReadStdinSnafu { stage: "read-line" })?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                println!("! {error}");
                continue;
            }
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Help => println!("{HELP}"),
            Command::Send(content) => {
                if let Err(error) = session.send(&content).await {
                    report(&error.to_string(), error.status());
                }
            }
            Command::Delete(message_id) => {
                if let Err(error) = session.delete(message_id).await {
                    report(&error.to_string(), error.status());
                }
            }
            Command::ChangeRole { target, action } => {
                let snapshot = session.room_state().snapshot();
                let user_id = match resolve_member(snapshot.as_deref(), &target) {
                    Ok(user_id) => user_id,
                    Err(error) => {
                        println!("! {error}");
                        continue;
                    }
                };
                match session.request_role_change(user_id, action).await {
                    Ok(()) => println!("{} requested for {target}", action.label()),
                    Err(error) => report(&error.to_string(), error.status()),
                }
            }
        }
    }
}

fn report(message: &str, status: Option<u16>) {
    match status {
        Some(status) => println!("! {message} (status {status})"),
        None => println!("! {message}"),
    }
}
