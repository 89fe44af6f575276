use std::path::PathBuf;

use iced::futures::channel::mpsc;
use iced::futures::{SinkExt, Stream};
use iced::widget::{button, column, container, progress_bar, row, text, text_input, Column, Row};
use iced::{Alignment, Element, Length, Size, Task, Theme};
use rfd::FileDialog;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod halo;
mod state;
mod workflow;

use config::Secrets;
use error::ItaloError;
use halo::Session;
use state::MatchSet;
use workflow::{CopyTool, SearchReport, TransferPlan, TransferReport};

/// Which directory a picker fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source,
    Target,
}

/// Workflow currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Workflow {
    Search,
    Transfer,
}

/// Updates streamed by a running transfer
#[derive(Debug, Clone)]
enum TransferEvent {
    Progress(f32),
    Finished(Result<TransferReport, ItaloError>),
}

/// Main application state
struct Italo {
    source_dir: String,
    target_dir: String,
    /// Status message to display to the user
    status: String,
    /// Progress indicator, 0 to 100
    progress: f32,
    /// Images found by the last search
    matches: MatchSet,
    running: Option<Workflow>,
    secrets_path: PathBuf,
    mover: CopyTool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    SourceChanged(String),
    TargetChanged(String),
    /// User clicked a "Browse" button
    Browse(Field),
    /// User clicked the "Search" button
    Search,
    SearchComplete(Result<SearchReport, ItaloError>),
    /// User clicked the "Transfer" button
    Transfer,
    TransferUpdate(TransferEvent),
}

impl Italo {
    fn new() -> (Self, Task<Message>) {
        let secrets_path = Secrets::locate();
        let mover = CopyTool::for_host();
        tracing::info!(secrets = %secrets_path.display(), ?mover, "Italo initialized");

        (
            Italo {
                source_dir: String::new(),
                target_dir: String::new(),
                status: "Ready. Select a source directory and search.".to_string(),
                progress: 0.0,
                matches: MatchSet::new(),
                running: None,
                secrets_path,
                mover,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state.
    ///
    /// Workflow results only change state here, one message at a time.
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SourceChanged(value) => {
                self.source_dir = value;
                Task::none()
            }
            Message::TargetChanged(value) => {
                self.target_dir = value;
                Task::none()
            }
            Message::Browse(field) => {
                let title = match field {
                    Field::Source => "Select Source Directory",
                    Field::Target => "Select Target Directory",
                };
                if let Some(folder) = FileDialog::new().set_title(title).pick_folder() {
                    let folder = folder.display().to_string();
                    match field {
                        Field::Source => self.source_dir = folder,
                        Field::Target => self.target_dir = folder,
                    }
                }
                Task::none()
            }
            Message::Search => {
                if self.running.is_some() {
                    return Task::none();
                }
                if self.source_dir.trim().is_empty() {
                    self.status = "Select a source directory first.".to_string();
                    return Task::none();
                }

                self.status = format!("Searching {}...", self.source_dir.trim());
                self.progress = 0.0;
                self.running = Some(Workflow::Search);

                Task::perform(
                    run_search(self.secrets_path.clone(), self.source_dir.clone()),
                    Message::SearchComplete,
                )
            }
            Message::SearchComplete(result) => {
                self.running = None;
                match result {
                    Ok(report) => {
                        tracing::debug!(
                            source_dir = %report.source_dir,
                            images = report.matches.len(),
                            "storing matches"
                        );
                        self.status = report.status();
                        self.progress = report.progress();
                        self.matches = report.matches;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "search failed");
                        self.status = err.to_string();
                        self.progress = 0.0;
                        self.matches = MatchSet::new();
                    }
                }
                Task::none()
            }
            Message::Transfer => {
                if self.running.is_some() {
                    return Task::none();
                }

                let plan = match TransferPlan::prepare(&self.matches, &self.target_dir) {
                    Ok(plan) => plan,
                    Err(err) => {
                        self.status = err.to_string();
                        self.progress = 0.0;
                        return Task::none();
                    }
                };

                self.status = format!(
                    "Transferring {} to {}...",
                    workflow::count_noun(plan.len(), "image", "images"),
                    plan.target_dir()
                );
                self.progress = 0.0;
                self.running = Some(Workflow::Transfer);

                Task::run(
                    run_transfer(self.secrets_path.clone(), self.mover, plan),
                    Message::TransferUpdate,
                )
            }
            Message::TransferUpdate(TransferEvent::Progress(value)) => {
                self.progress = value;
                Task::none()
            }
            Message::TransferUpdate(TransferEvent::Finished(result)) => {
                self.running = None;
                match result {
                    Ok(report) => {
                        for (id, location) in &report.relocated {
                            self.matches.relocate(id, location);
                        }
                        self.status = report.status();
                        self.progress = report.progress();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "transfer failed");
                        self.status = err.to_string();
                        self.progress = 0.0;
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let idle = self.running.is_none();

        let actions = row![
            button(if self.running == Some(Workflow::Search) {
                "Searching..."
            } else {
                "Search"
            })
            .on_press_maybe(idle.then_some(Message::Search))
            .padding(10),
            button(if self.running == Some(Workflow::Transfer) {
                "Transferring..."
            } else {
                "Transfer"
            })
            .on_press_maybe(idle.then_some(Message::Transfer))
            .padding(10),
        ]
        .spacing(20);

        let content: Column<Message> = column![
            directory_row("Source", &self.source_dir, Field::Source, idle),
            directory_row("Target", &self.target_dir, Field::Target, idle),
            text(&self.status).size(16),
            progress_bar(0.0..=100.0, self.progress),
            actions,
        ]
        .spacing(16)
        .padding(24)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Label, editable path and "Browse" button for one directory
fn directory_row<'a>(label: &'a str, value: &'a str, field: Field, idle: bool) -> Row<'a, Message> {
    let on_input = match field {
        Field::Source => Message::SourceChanged,
        Field::Target => Message::TargetChanged,
    };
    row![
        text(label).width(Length::Fixed(70.0)),
        text_input("Directory path", value)
            .on_input(on_input)
            .padding(8),
        button("Browse")
            .on_press_maybe(idle.then_some(Message::Browse(field)))
            .padding(8),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    iced::application("Italo", Italo::update, Italo::view)
        .theme(Italo::theme)
        .window_size(Size::new(760.0, 320.0))
        .centered()
        .run_with(Italo::new)
}

/// Open a session and search; the session is dropped when the search ends
async fn run_search(secrets_path: PathBuf, source_dir: String) -> Result<SearchReport, ItaloError> {
    let session = Session::connect(&secrets_path).await?;
    workflow::search::search(&session, &source_dir).await
}

/// Open a session and transfer, streaming progress back to the UI
fn run_transfer(
    secrets_path: PathBuf,
    mover: CopyTool,
    plan: TransferPlan,
) -> impl Stream<Item = TransferEvent> {
    iced::stream::channel(100, move |mut output: mpsc::Sender<TransferEvent>| async move {
        let result = match Session::connect(&secrets_path).await {
            Ok(session) => Ok(workflow::transfer::transfer(&session, &mover, &plan, |value| {
                // Progress ticks may be dropped when the channel is full; the
                // final report below is always delivered.
                let _ = output.try_send(TransferEvent::Progress(value));
            })
            .await),
            Err(err) => Err(err),
        };

        let _ = output.send(TransferEvent::Finished(result)).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::record;

    fn idle_app() -> Italo {
        Italo {
            source_dir: String::new(),
            target_dir: String::new(),
            status: "Ready.".to_string(),
            progress: 0.0,
            matches: MatchSet::new(),
            running: None,
            secrets_path: PathBuf::from("secrets.json"),
            mover: CopyTool::Cp,
        }
    }

    fn study_a() -> MatchSet {
        vec![
            record("1", "/data/studyA/slide1.svs", "StudyA"),
            record("2", "/data/studyA/slide2.svs", "StudyB"),
        ]
        .into_iter()
        .collect()
    }

    fn send(app: &mut Italo, message: Message) {
        let _ = app.update(message);
    }

    #[test]
    fn test_search_needs_source_dir() {
        let mut app = idle_app();
        send(&mut app, Message::Search);

        assert_eq!(app.status, "Select a source directory first.");
        assert_eq!(app.running, None);
    }

    #[test]
    fn test_running_search_blocks_transfer() {
        let mut app = idle_app();
        app.matches = study_a();
        app.target_dir = "//srv/share".to_string();
        send(&mut app, Message::SourceChanged("/data/studyA".to_string()));

        send(&mut app, Message::Search);
        assert_eq!(app.running, Some(Workflow::Search));
        assert_eq!(app.status, "Searching /data/studyA...");

        send(&mut app, Message::Transfer);
        assert_eq!(app.running, Some(Workflow::Search));
        assert_eq!(app.status, "Searching /data/studyA...");
    }

    #[test]
    fn test_running_transfer_blocks_search() {
        let mut app = idle_app();
        app.source_dir = "/data/studyA".to_string();
        app.running = Some(Workflow::Transfer);
        app.status = "Transferring 2 images to //srv/share...".to_string();

        send(&mut app, Message::Search);
        send(&mut app, Message::Transfer);
        assert_eq!(app.running, Some(Workflow::Transfer));
        assert_eq!(app.status, "Transferring 2 images to //srv/share...");
    }

    #[test]
    fn test_search_result_replaces_matches() {
        let mut app = idle_app();
        app.running = Some(Workflow::Search);
        let report = SearchReport {
            source_dir: "/data/studyA".to_string(),
            matches: study_a(),
        };

        send(&mut app, Message::SearchComplete(Ok(report)));
        assert_eq!(app.running, None);
        assert_eq!(app.matches.len(), 2);
        assert_eq!(app.progress, 100.0);
        assert_eq!(app.status, "FOUND: 2 images in 2 studies at [StudyA | StudyB].");
    }

    #[test]
    fn test_failed_search_clears_matches() {
        let mut app = idle_app();
        app.matches = study_a();
        app.running = Some(Workflow::Search);
        let err = ItaloError::Connection("connection refused".to_string());

        send(&mut app, Message::SearchComplete(Err(err.clone())));
        assert_eq!(app.running, None);
        assert!(app.matches.is_empty());
        assert_eq!(app.progress, 0.0);
        assert_eq!(app.status, err.to_string());
    }

    #[test]
    fn test_transfer_preconditions_start_nothing() {
        let mut app = idle_app();
        app.target_dir = "//srv/share".to_string();
        send(&mut app, Message::Transfer);
        assert_eq!(app.status, "No images to transfer. Search first.");
        assert_eq!(app.running, None);

        app.matches = study_a();
        app.target_dir = r"D:\local".to_string();
        send(&mut app, Message::Transfer);
        assert_eq!(app.status, "Target directory must be UNC-style.");
        assert_eq!(app.running, None);
        assert_eq!(app.matches.len(), 2);
    }

    #[test]
    fn test_finished_transfer_relocates_matches() {
        let mut app = idle_app();
        app.matches = study_a();
        app.running = Some(Workflow::Transfer);

        send(&mut app, Message::TransferUpdate(TransferEvent::Progress(50.0)));
        assert_eq!(app.progress, 50.0);

        let report = TransferReport {
            total: 2,
            transferred: 1,
            copied: 1,
            failed: 1,
            relocated: vec![("1".to_string(), "//srv/share/slide1.svs".to_string())],
            ..TransferReport::default()
        };
        send(&mut app, Message::TransferUpdate(TransferEvent::Finished(Ok(report))));

        assert_eq!(app.running, None);
        assert_eq!(app.progress, 100.0);
        assert_eq!(
            app.status,
            "TRANSFERRED: 1 image, COPIED: 1 image. FAILED: 1 image."
        );
        let locations: Vec<&str> = app
            .matches
            .records()
            .map(|record| record.location.as_str())
            .collect();
        assert_eq!(
            locations,
            vec!["//srv/share/slide1.svs", "/data/studyA/slide2.svs"]
        );
    }

    #[test]
    fn test_failed_transfer_keeps_matches() {
        let mut app = idle_app();
        app.matches = study_a();
        app.running = Some(Workflow::Transfer);
        let err = ItaloError::MissingSecrets(PathBuf::from("secrets.json"));

        send(&mut app, Message::TransferUpdate(TransferEvent::Finished(Err(err.clone()))));
        assert_eq!(app.running, None);
        assert_eq!(app.status, err.to_string());
        assert_eq!(app.matches, study_a());
    }
}
