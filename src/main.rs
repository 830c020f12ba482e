use clap::Parser;
use iced::widget::image::Handle;
use iced::widget::{button, container, row, scrollable, text, Column, Image};
use iced::{event, keyboard, window, Alignment, ContentFit, Element, Event, Length};
use iced::{Subscription, Task, Theme};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod intake;
mod search;
mod state;
mod ui;

use config::{CliArgs, Settings};
use error::SearchError;
use search::{HttpSimilarityService, SimilarityService};
use state::data::{ResultSet, SessionPhase};
use state::{SearchCompletion, SearchSession};
use ui::gallery::{self, MediaBase, ResultGallery, TileImage};

/// Edge length of a result thumbnail
const TILE_SIZE: f32 = 160.0;

/// Main application state
struct SimilarSearch<S = HttpSimilarityService> {
    /// Selection, search lifecycle and results
    session: SearchSession,
    /// Client for the remote similarity-search service
    service: S,
    /// HTTP client for downloading result thumbnails
    http: Client,
    /// Where result images are served from
    media: MediaBase,
    /// Thumbnails for the current results
    gallery: ResultGallery,
    /// Files are being dragged over the window
    hovering: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    FilesHovered,
    FilesHoveredLeft,
    /// Ctrl/Cmd+V outside any text input
    PasteRequested,
    /// User clicked "Choose Image"
    ChooseImage,
    /// User clicked "Find Similar Images"
    Search,
    /// Background search finished
    SearchComplete {
        generation: u64,
        outcome: Result<ResultSet, SearchError>,
    },
    /// Background thumbnail download finished
    ThumbnailLoaded {
        generation: u64,
        index: usize,
        outcome: Result<Vec<u8>, SearchError>,
    },
    /// User clicked "Clear"
    Clear,
}

/// The application as launched, talking to the real service
type App = SimilarSearch<HttpSimilarityService>;

impl App {
    /// Create a new instance of the application
    fn new(settings: Settings) -> (Self, Task<Message>) {
        let http = Client::new();
        let service = HttpSimilarityService::with_client(http.clone(), &settings.service_url);
        let app = SimilarSearch::with_service(service, http, MediaBase::new(&settings.media_base));

        (app, Task::none())
    }
}

impl<S: SimilarityService> SimilarSearch<S> {
    fn with_service(service: S, http: Client, media: MediaBase) -> Self {
        SimilarSearch {
            session: SearchSession::new(),
            service,
            http,
            media,
            gallery: ResultGallery::default(),
            hovering: false,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FileDropped(path) => {
                self.hovering = false;
                let files = intake::system::read_dropped_path(&path);
                if intake::accept_dropped_files(&mut self.session, files) {
                    self.gallery.clear();
                }
                Task::none()
            }
            Message::FilesHovered => {
                self.hovering = true;
                Task::none()
            }
            Message::FilesHoveredLeft => {
                self.hovering = false;
                Task::none()
            }
            Message::PasteRequested => {
                let items = intake::system::read_clipboard();
                if intake::accept_pasted_items(&mut self.session, items) {
                    self.gallery.clear();
                }
                Task::none()
            }
            Message::ChooseImage => {
                let Some(path) = intake::system::pick_image_file() else {
                    return Task::none();
                };

                match intake::system::read_path(&path) {
                    Ok(file) => {
                        intake::accept_picked_file(&mut self.session, file);
                        self.gallery.clear();
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "could not read picked file");
                    }
                }
                Task::none()
            }
            Message::Search => match self.session.begin_search() {
                Ok(ticket) => {
                    self.gallery.clear();
                    let generation = ticket.generation;
                    Task::perform(self.service.search(&ticket.image), move |outcome| {
                        Message::SearchComplete {
                            generation,
                            outcome,
                        }
                    })
                }
                Err(skipped) => {
                    debug!(reason = %skipped, "search not started");
                    Task::none()
                }
            },
            Message::SearchComplete {
                generation,
                outcome,
            } => match self.session.complete_search(generation, outcome) {
                SearchCompletion::Applied => {
                    let fetches =
                        self.gallery
                            .populate(generation, self.session.results(), &self.media);
                    let http = self.http.clone();

                    Task::batch(fetches.into_iter().map(|(index, url)| {
                        Task::perform(gallery::fetch_image(http.clone(), url), move |outcome| {
                            Message::ThumbnailLoaded {
                                generation,
                                index,
                                outcome,
                            }
                        })
                    }))
                }
                SearchCompletion::Failed(_) => {
                    self.gallery.clear();
                    Task::none()
                }
                SearchCompletion::Stale => Task::none(),
            },
            Message::ThumbnailLoaded {
                generation,
                index,
                outcome,
            } => {
                self.gallery.apply(generation, index, outcome);
                Task::none()
            }
            Message::Clear => {
                self.session.reset();
                self.gallery.clear();
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let zone_content: Element<'_, Message> = match self.session.preview() {
            Some(preview) => Image::<Handle>::new(preview.handle().clone())
                .height(Length::Fixed(192.0))
                .into(),
            None if self.hovering => text("Drop to select this image").size(16).into(),
            None => text("Paste an image, drag & drop, or choose a file")
                .size(16)
                .into(),
        };

        let drop_zone = container(zone_content)
            .padding(40)
            .center_x(Length::Fixed(384.0))
            .style(container::bordered_box);

        let mut content = Column::new()
            .push(text("Image Similarity Search").size(40))
            .push(drop_zone)
            .spacing(20)
            .padding(40)
            .align_x(Alignment::Center);

        let mut actions = row![button("Choose Image")
            .on_press(Message::ChooseImage)
            .padding(10)]
        .spacing(12);

        if let Some((label, on_press)) = self.search_button() {
            actions = actions
                .push(button(label).on_press_maybe(on_press).padding(10))
                .push(
                    button("Clear")
                        .on_press(Message::Clear)
                        .style(button::secondary)
                        .padding(10),
                );
        }
        content = content.push(actions);

        if let Some(err) = self.session.failure() {
            content = content.push(text(format!("Search failed: {err}")).size(14));
        }

        if self.session.phase() == SessionPhase::ResultsReady {
            content = content.push(self.results_view());
        }

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Label and press action of the search button, once an image is selected
    ///
    /// The button is disabled while any request is still on the wire,
    /// including one made for an image that has since been replaced.
    fn search_button(&self) -> Option<(&'static str, Option<Message>)> {
        self.session.selected()?;

        let state = if self.session.is_searching() {
            ("Searching...", None)
        } else if self.session.awaiting_stale_response() {
            ("Waiting for previous search...", None)
        } else {
            (
                "Find Similar Images",
                self.session.can_search().then_some(Message::Search),
            )
        };
        Some(state)
    }

    /// Grid of result thumbnails in result order
    fn results_view(&self) -> Element<'_, Message> {
        if self.gallery.tiles().is_empty() {
            return text("No similar images found").size(16).into();
        }

        let tiles: Vec<Element<'_, Message>> = self
            .gallery
            .tiles()
            .iter()
            .map(|tile| match &tile.image {
                TileImage::Loaded(handle) => Image::<Handle>::new(handle.clone())
                    .width(Length::Fixed(TILE_SIZE))
                    .height(Length::Fixed(TILE_SIZE))
                    .content_fit(ContentFit::Cover)
                    .into(),
                TileImage::Loading => placeholder("Loading..."),
                TileImage::Failed => placeholder("Unavailable"),
            })
            .collect();

        iced_aw::Wrap::with_elements(tiles)
            .spacing(16.0)
            .line_spacing(16.0)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(window_event)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn placeholder(label: &str) -> Element<'_, Message> {
    container(text(label).size(12))
        .center_x(Length::Fixed(TILE_SIZE))
        .center_y(Length::Fixed(TILE_SIZE))
        .style(container::bordered_box)
        .into()
}

/// Translate raw window events into intake messages
fn window_event(event: Event, status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FilesHovered),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FilesHoveredLeft),
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Character(c),
            modifiers,
            ..
        }) if status == event::Status::Ignored
            && modifiers.command()
            && c.as_str().eq_ignore_ascii_case("v") =>
        {
            Some(Message::PasteRequested)
        }
        _ => None,
    }
}

/// Search once with an image file and print the display URLs
///
/// Returns the process exit code.
fn search_once(path: &Path, settings: &Settings) -> i32 {
    let file = match intake::system::read_path(path) {
        Ok(file) => file,
        Err(err) => {
            error!(path = %path.display(), error = %err, "could not read image");
            eprintln!("similar-search: cannot read {}: {err}", path.display());
            return 1;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "could not start async runtime");
            return 1;
        }
    };

    let mut session = SearchSession::new();
    intake::accept_picked_file(&mut session, file);
    let service = HttpSimilarityService::new(&settings.service_url);
    let media = MediaBase::new(&settings.media_base);

    match runtime.block_on(session.run_search(&service)) {
        Ok(SearchCompletion::Applied) => {
            let urls = media.resolve_all(session.results());
            if urls.is_empty() {
                eprintln!("No similar images found");
            }
            for url in urls {
                println!("{url}");
            }
            0
        }
        Ok(SearchCompletion::Failed(err)) => {
            eprintln!("similar-search: search failed: {err}");
            1
        }
        Ok(SearchCompletion::Stale) | Err(_) => 1,
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CliArgs::parse();
    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "could not load settings");
            eprintln!("similar-search: {err}");
            std::process::exit(2);
        }
    };

    if let Some(path) = &cli.search {
        std::process::exit(search_once(path, &settings));
    }

    iced::application("Image Similarity Search", App::update, App::view)
        .subscription(App::subscription)
        .theme(App::theme)
        .centered()
        .run_with(move || App::new(settings))
}
