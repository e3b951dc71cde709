mod view;

use std::{future::Future, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};
use gamescope_core::{
    error::Result as CatalogResult, AppConfig, CatalogClient, FavoritesStore, FileStore,
    FilterOptions, Game, GameId, Page, PageRequest, Publisher, RequestGeneration, Screenshot,
    Ticket,
};

use crate::state::{
    DetailState, GamesState, HomeState, ListingHeader, ListingSource, ListingState, Load,
    PublishersState,
};

use self::view::Theme;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_QUERY_LEN: usize = 64;
const MAX_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Games,
    Detail,
    Listing,
    Publishers,
}

enum AppEvent {
    Input(Event),
    Tick,
    Loaded { ticket: Ticket, payload: Payload },
}

enum Payload {
    Home(CatalogResult<Page<Game>>),
    Games(CatalogResult<Page<Game>>),
    Detail(CatalogResult<(Game, Page<Screenshot>)>),
    ListingFirst(CatalogResult<(Option<ListingHeader>, Page<Game>)>),
    ListingMore(CatalogResult<Page<Game>>),
    Publishers(CatalogResult<Page<Publisher>>),
}

/// Which games-screen load is starting; each uses its own page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GamesLoad {
    Entry,
    Search,
    Reset,
}

/// One generation counter per screen so a newer load on a screen
/// supersedes the older one without touching the others.
#[derive(Default)]
struct Generations {
    home: RequestGeneration,
    games: RequestGeneration,
    detail: RequestGeneration,
    listing: RequestGeneration,
    publishers: RequestGeneration,
}

impl Generations {
    fn for_screen(&self, screen: Screen) -> &RequestGeneration {
        match screen {
            Screen::Home => &self.home,
            Screen::Games => &self.games,
            Screen::Detail => &self.detail,
            Screen::Listing => &self.listing,
            Screen::Publishers => &self.publishers,
        }
    }
}

/// High-level application state for the catalog browser.
pub struct GameScopeApp {
    client: CatalogClient,
    favorites: FavoritesStore<FileStore>,
    config: AppConfig,
    theme: Theme,
    screen: Screen,
    history: Vec<Screen>,
    home: HomeState,
    games: GamesState,
    detail: DetailState,
    listing: ListingState,
    publishers: PublishersState,
    generations: Generations,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    status: String,
    should_quit: bool,
}

impl GameScopeApp {
    pub fn new(
        client: CatalogClient,
        favorites: FavoritesStore<FileStore>,
        config: AppConfig,
    ) -> Self {
        let page_size = config.page_size;
        Self {
            client,
            favorites,
            config,
            theme: Theme::default(),
            screen: Screen::Home,
            history: Vec::new(),
            home: HomeState::default(),
            games: GamesState::default(),
            detail: DetailState::default(),
            listing: ListingState::new(page_size),
            publishers: PublishersState::new(page_size),
            generations: Generations::default(),
            event_tx: None,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.load_home();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind != KeyEventKind::Release {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::Loaded { ticket, payload }) => {
                if ticket.is_current() {
                    self.apply_payload(payload);
                } else {
                    debug!(generation = ticket.generation(), "discarding stale response");
                }
                true
            }
            None => false,
        }
    }

    fn spawn_load<F>(&mut self, ticket: Ticket, load: F)
    where
        F: Future<Output = Payload> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            self.status = "Internal error: event channel unavailable".to_string();
            return;
        };
        spawn(async move {
            let payload = load.await;
            let _ = sender.send(AppEvent::Loaded { ticket, payload }).await;
        });
    }

    fn load_home(&mut self) {
        let ticket = self.generations.home.begin();
        self.home.load = Load::Loading;
        let client = self.client.clone();
        let page = PageRequest::first(self.config.popular_count);
        self.spawn_load(ticket, async move {
            Payload::Home(client.popular_games(page).await)
        });
    }

    fn games_page_size(&self, kind: GamesLoad) -> u32 {
        match kind {
            GamesLoad::Entry => self.config.games_popular_count,
            GamesLoad::Search => self.config.search_page_size,
            GamesLoad::Reset => self.config.page_size,
        }
    }

    fn load_games(&mut self, kind: GamesLoad) {
        let ticket = self.generations.games.begin();
        self.games.load = Load::Loading;
        let client = self.client.clone();
        let page = PageRequest::first(self.games_page_size(kind));
        let term = self.games.term.clone();
        if term.is_empty() {
            self.status = "Loading popular games…".to_string();
        } else {
            info!(term = %term, "searching games");
            self.status = format!("Searching for \"{term}\"…");
        }
        self.spawn_load(ticket, async move {
            let result = if term.is_empty() {
                client.popular_games(page).await
            } else {
                client.search_games(&term, page).await
            };
            Payload::Games(result)
        });
    }

    fn open_detail(&mut self, id: GameId) {
        self.navigate(Screen::Detail);
        self.load_detail(id);
    }

    fn load_detail(&mut self, id: GameId) {
        let ticket = self.generations.detail.begin();
        self.detail.start(id);
        let client = self.client.clone();
        let count = self.config.screenshot_count;
        info!(id, "loading game detail");
        self.spawn_load(ticket, async move {
            let result = tokio::try_join!(client.game_detail(id), client.game_screenshots(id, count));
            Payload::Detail(result)
        });
    }

    fn open_listing(&mut self, source: ListingSource) {
        self.navigate(Screen::Listing);
        self.listing.start(source, self.config.page_size);
        self.load_listing_first();
    }

    fn load_listing_first(&mut self) {
        let Some(source) = self.listing.source.clone() else {
            return;
        };
        let ticket = self.generations.listing.begin();
        self.listing.load = Load::Loading;
        self.listing.loading_more = false;
        let client = self.client.clone();
        let page = PageRequest::first(self.config.page_size);
        info!(kind = source.kind(), title = %source.title(), "loading listing");
        self.spawn_load(ticket, async move {
            let result = match &source {
                ListingSource::Tag { slug } => {
                    client.games_by_tag(slug, page).await.map(|games| (None, games))
                }
                ListingSource::Genre { id, slug, .. } => {
                    tokio::try_join!(client.genre_detail(*id), client.games_by_genre(slug, page))
                        .map(|(genre, games)| (Some(ListingHeader::from(&genre)), games))
                }
                ListingSource::Publisher { id, .. } => tokio::try_join!(
                    client.publisher_detail(*id),
                    client.publisher_games(*id, page)
                )
                .map(|(publisher, games)| (Some(ListingHeader::from(&publisher)), games)),
            };
            Payload::ListingFirst(result)
        });
    }

    fn load_listing_more(&mut self) {
        if self.listing.load.is_loading() || self.listing.loading_more {
            return;
        }
        let (Some(source), Some(page)) = (
            self.listing.source.clone(),
            self.listing.listing.next_request(),
        ) else {
            self.status = "No more games to load".to_string();
            return;
        };
        let ticket = self.generations.listing.begin();
        self.listing.loading_more = true;
        self.status = format!("Loading page {}…", page.page());
        let client = self.client.clone();
        self.spawn_load(ticket, async move {
            let result = match &source {
                ListingSource::Tag { slug } => client.games_by_tag(slug, page).await,
                ListingSource::Genre { slug, .. } => client.games_by_genre(slug, page).await,
                ListingSource::Publisher { id, .. } => client.publisher_games(*id, page).await,
            };
            Payload::ListingMore(result)
        });
    }

    fn load_publishers(&mut self) {
        let ticket = self.generations.publishers.begin();
        self.publishers.load = Load::Loading;
        let client = self.client.clone();
        let page = self.publishers.request;
        let term = self.publishers.term.clone();
        self.spawn_load(ticket, async move {
            let term = Some(term.as_str()).filter(|term| !term.is_empty());
            Payload::Publishers(client.publishers(term, page).await)
        });
    }

    fn apply_payload(&mut self, payload: Payload) {
        match payload {
            Payload::Home(result) => match result {
                Ok(page) => {
                    info!(count = page.results.len(), "popular games loaded");
                    self.home.games = page.results;
                    self.home.load = Load::Idle;
                    self.home.cursor.clamp(self.home.games.len());
                    self.status = format!("Loaded {} popular games", self.home.games.len());
                }
                Err(err) => {
                    error!(%err, "popular games failed");
                    self.home.games.clear();
                    self.home.load = Load::Failed(err.to_string());
                }
            },
            Payload::Games(result) => match result {
                Ok(page) => {
                    self.games.games = page.results;
                    self.games.load = Load::Idle;
                    self.games.cursor.reset();
                    self.status = format!("Showing {} games", self.games.games.len());
                }
                Err(err) => {
                    error!(%err, "game listing failed");
                    self.games.games.clear();
                    self.games.load = Load::Failed(err.to_string());
                }
            },
            Payload::Detail(result) => match result {
                Ok((game, screenshots)) => {
                    self.status = format!("{} · {} screenshots", game.name, screenshots.results.len());
                    self.detail.apply(game, screenshots.results);
                }
                Err(err) => {
                    error!(%err, "game detail failed");
                    self.detail.load = Load::Failed(err.to_string());
                }
            },
            Payload::ListingFirst(result) => match result {
                Ok((header, page)) => {
                    self.listing.header = header;
                    self.listing.listing.reset_with(page);
                    self.listing.load = Load::Idle;
                    self.listing.cursor.reset();
                    self.status = format!("Loaded {} games", self.listing.listing.items().len());
                }
                Err(err) => {
                    error!(%err, "listing failed");
                    self.listing.load = Load::Failed(err.to_string());
                }
            },
            Payload::ListingMore(result) => {
                self.listing.loading_more = false;
                match result {
                    Ok(page) => {
                        self.listing.listing.append(page);
                        self.status = format!(
                            "Loaded {} of {} games",
                            self.listing.listing.items().len(),
                            self.listing.listing.total()
                        );
                    }
                    Err(err) => {
                        error!(%err, "loading more games failed");
                        self.listing.load = Load::Failed(err.to_string());
                    }
                }
            }
            Payload::Publishers(result) => match result {
                Ok(page) => {
                    self.publishers.items = page.results;
                    self.publishers.load = Load::Idle;
                    self.publishers.cursor.reset();
                    self.status = format!("Publishers page {}", self.publishers.request.page());
                }
                Err(err) => {
                    error!(%err, "publishers failed");
                    self.publishers.items.clear();
                    self.publishers.load = Load::Failed(err.to_string());
                }
            },
        }
    }

    fn navigate(&mut self, target: Screen) {
        if self.screen == target {
            return;
        }
        if self.history.last() != Some(&self.screen) {
            self.history.push(self.screen);
        }
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
        self.screen = target;
    }

    fn go_back(&mut self) {
        // Responses for the screen being left are no longer wanted.
        self.generations.for_screen(self.screen).invalidate();
        match self.screen {
            Screen::Detail => self.detail.load = Load::Idle,
            Screen::Listing => {
                self.listing.load = Load::Idle;
                self.listing.loading_more = false;
            }
            _ => {}
        }
        self.screen = self.history.pop().unwrap_or(Screen::Home);
    }

    fn switch_to(&mut self, target: Screen) {
        self.history.clear();
        self.screen = target;
        match target {
            Screen::Games if self.games.games.is_empty() && !self.games.load.is_loading() => {
                self.load_games(GamesLoad::Entry)
            }
            Screen::Publishers
                if self.publishers.items.is_empty() && !self.publishers.load.is_loading() =>
            {
                self.load_publishers()
            }
            _ => {}
        }
    }

    fn toggle_favorite(&mut self, game: Option<(GameId, String)>) {
        let Some((id, name)) = game else {
            return;
        };
        let ids = self.favorites.toggle_favorite(id);
        self.status = if ids.contains(&id) {
            format!("★ Added {name} to favorites ({} total)", ids.len())
        } else {
            format!("Removed {name} from favorites ({} total)", ids.len())
        };
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.games.prompt.active || self.publishers.prompt.active {
            self.handle_prompt_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.go_back();
                return;
            }
            KeyCode::Char('1') => return self.switch_to(Screen::Home),
            KeyCode::Char('2') => return self.switch_to(Screen::Games),
            KeyCode::Char('3') => return self.switch_to(Screen::Publishers),
            _ => {}
        }
        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Games => self.handle_games_key(key),
            Screen::Detail => self.handle_detail_key(key),
            Screen::Listing => self.handle_listing_key(key),
            Screen::Publishers => self.handle_publishers_key(key),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let on_games = self.games.prompt.active;
        let prompt = if on_games {
            &mut self.games.prompt
        } else {
            &mut self.publishers.prompt
        };
        match key.code {
            KeyCode::Esc => {
                prompt.close();
                self.status = "Search cancelled".to_string();
            }
            KeyCode::Backspace => {
                prompt.value.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                if prompt.value.chars().count() < MAX_QUERY_LEN {
                    prompt.value.push(ch);
                }
            }
            KeyCode::Enter => {
                let term = prompt.submit();
                if on_games && self.games.only_favorites {
                    self.status = if term.is_empty() {
                        "Showing all favorites".to_string()
                    } else {
                        format!("Filtering favorites by \"{term}\"")
                    };
                    self.games.filter = term;
                    self.games.cursor.reset();
                } else if on_games {
                    if term.is_empty() {
                        self.games.prompt.active = true;
                        self.status = "Type a game name to search".to_string();
                        return;
                    }
                    self.games.term = term;
                    self.load_games(GamesLoad::Search);
                } else {
                    self.publishers.term = term;
                    self.publishers.request = PageRequest::first(self.config.page_size);
                    self.load_publishers();
                }
            }
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        let len = self.home.games.len();
        match key.code {
            KeyCode::Char('r') => self.load_home(),
            KeyCode::Char('/') => {
                self.switch_to(Screen::Games);
                self.games.prompt.open(&self.games.term);
            }
            KeyCode::Char('f') => {
                let selected = self
                    .home
                    .games
                    .get(self.home.cursor.cursor)
                    .map(|game| (game.id, game.name.clone()));
                self.toggle_favorite(selected);
            }
            KeyCode::Enter => {
                if let Some(id) = self.home.games.get(self.home.cursor.cursor).map(|game| game.id) {
                    self.open_detail(id);
                }
            }
            code => move_list_cursor(&mut self.home.cursor, code, len),
        }
    }

    fn visible_games(&self) -> Vec<&Game> {
        if self.games.only_favorites {
            self.favorites
                .filter_favorites(&self.games.games, &self.games.filter, FilterOptions::default())
        } else {
            self.games.games.iter().collect()
        }
    }

    fn selected_game(&self) -> Option<(GameId, String)> {
        self.visible_games()
            .get(self.games.cursor.cursor)
            .map(|game| (game.id, game.name.clone()))
    }

    fn handle_games_key(&mut self, key: KeyEvent) {
        let len = self.visible_games().len();
        match key.code {
            KeyCode::Char('/') => {
                let initial = if self.games.only_favorites {
                    &self.games.filter
                } else {
                    &self.games.term
                };
                self.games.prompt.open(initial);
            }
            KeyCode::Char('r') => {
                self.games.term.clear();
                self.games.filter.clear();
                self.games.prompt.value.clear();
                self.load_games(GamesLoad::Reset);
            }
            KeyCode::Char('o') => {
                self.games.only_favorites = !self.games.only_favorites;
                self.games.cursor.reset();
                self.status = if self.games.only_favorites {
                    "Showing favorites only".to_string()
                } else {
                    "Showing all results".to_string()
                };
            }
            KeyCode::Char('f') => {
                let selected = self.selected_game();
                self.toggle_favorite(selected);
                let len = self.visible_games().len();
                self.games.cursor.clamp(len);
            }
            KeyCode::Enter => {
                if let Some((id, _)) = self.selected_game() {
                    self.open_detail(id);
                }
            }
            code => move_list_cursor(&mut self.games.cursor, code, len),
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let len = self.detail.links.len();
        match key.code {
            KeyCode::Char('r') => {
                if let Some(id) = self.detail.game_id {
                    self.load_detail(id);
                }
            }
            KeyCode::Char('f') => {
                let game = self
                    .detail
                    .game
                    .as_ref()
                    .map(|game| (game.id, game.name.clone()));
                self.toggle_favorite(game);
            }
            KeyCode::Enter => {
                if let Some(link) = self.detail.links.get(self.detail.cursor.cursor) {
                    let source = link.listing_source();
                    self.open_listing(source);
                }
            }
            code => move_list_cursor(&mut self.detail.cursor, code, len),
        }
    }

    fn handle_listing_key(&mut self, key: KeyEvent) {
        let len = self.listing.listing.items().len();
        match key.code {
            KeyCode::Char('m') => self.load_listing_more(),
            KeyCode::Char('r') => self.load_listing_first(),
            KeyCode::Char('f') => {
                let selected = self
                    .listing
                    .listing
                    .items()
                    .get(self.listing.cursor.cursor)
                    .map(|game| (game.id, game.name.clone()));
                self.toggle_favorite(selected);
            }
            KeyCode::Enter => {
                if let Some(id) = self
                    .listing
                    .listing
                    .items()
                    .get(self.listing.cursor.cursor)
                    .map(|game| game.id)
                {
                    self.open_detail(id);
                }
            }
            code => move_list_cursor(&mut self.listing.cursor, code, len),
        }
    }

    fn handle_publishers_key(&mut self, key: KeyEvent) {
        let len = self.publishers.items.len();
        match key.code {
            KeyCode::Char('/') => self.publishers.prompt.open(&self.publishers.term),
            KeyCode::Char('r') => {
                self.publishers.term.clear();
                self.publishers.prompt.value.clear();
                self.publishers.request = PageRequest::first(self.config.page_size);
                self.load_publishers();
            }
            KeyCode::Char('n') => {
                if self.publishers.load.is_loading() || !self.publishers.has_next() {
                    return;
                }
                self.publishers.request = self.publishers.request.next();
                self.load_publishers();
            }
            KeyCode::Char('p') => {
                if self.publishers.load.is_loading() {
                    return;
                }
                if let Some(previous) = self.publishers.request.previous() {
                    self.publishers.request = previous;
                    self.load_publishers();
                }
            }
            KeyCode::Enter => {
                if let Some(publisher) = self.publishers.items.get(self.publishers.cursor.cursor) {
                    let source = ListingSource::Publisher {
                        id: publisher.id,
                        name: publisher.name.clone(),
                    };
                    self.open_listing(source);
                }
            }
            code => move_list_cursor(&mut self.publishers.cursor, code, len),
        }
    }
}

fn move_list_cursor(cursor: &mut crate::state::ListCursor, code: KeyCode, len: usize) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => cursor.move_by(1, len),
        KeyCode::Char('k') | KeyCode::Up => cursor.move_by(-1, len),
        KeyCode::Char('g') | KeyCode::Home => cursor.move_to(0, len),
        KeyCode::Char('G') | KeyCode::End => cursor.move_to(len.saturating_sub(1), len),
        KeyCode::PageDown => cursor.page_down(len),
        KeyCode::PageUp => cursor.page_up(len),
        _ => {}
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn app() -> (GameScopeApp, TempDir) {
        let dir = tempdir().expect("tempdir");
        let config = AppConfig {
            api_key: Some("test-key".to_string()),
            page_size: 2,
            ..AppConfig::default()
        };
        let client = CatalogClient::from_config(&config).expect("client");
        let favorites = FavoritesStore::new(FileStore::new(dir.path()));
        (GameScopeApp::new(client, favorites, config), dir)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn games_page(names: &[&str]) -> Page<Game> {
        let results: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| json!({"id": idx + 1, "name": name}))
            .collect();
        serde_json::from_value(json!({"count": names.len(), "results": results}))
            .expect("valid page fixture")
    }

    #[test]
    fn back_navigation_unwinds_history() {
        let (mut app, _dir) = app();
        app.navigate(Screen::Detail);
        app.navigate(Screen::Listing);
        app.navigate(Screen::Detail);
        assert_eq!(app.screen, Screen::Detail);
        assert_eq!(app.history, vec![Screen::Home, Screen::Detail, Screen::Listing]);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Listing);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Detail);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Home);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn history_is_bounded() {
        let (mut app, _dir) = app();
        for _ in 0..40 {
            app.navigate(Screen::Detail);
            app.navigate(Screen::Listing);
        }
        assert_eq!(app.history.len(), MAX_HISTORY);
        assert_eq!(app.history.last(), Some(&Screen::Detail));
    }

    #[test]
    fn games_loads_use_their_own_page_sizes() {
        let (app, _dir) = app();
        assert_eq!(app.games_page_size(GamesLoad::Entry), 40);
        assert_eq!(app.games_page_size(GamesLoad::Search), 24);
        assert_eq!(app.games_page_size(GamesLoad::Reset), 2);
    }

    #[test]
    fn stale_responses_are_ignored() {
        let (mut app, _dir) = app();
        let stale = app.generations.home.begin();
        let current = app.generations.home.begin();

        app.process_app_event(Some(AppEvent::Loaded {
            ticket: stale,
            payload: Payload::Home(Ok(games_page(&["Old"]))),
        }));
        assert!(app.home.games.is_empty());

        app.process_app_event(Some(AppEvent::Loaded {
            ticket: current,
            payload: Payload::Home(Ok(games_page(&["Portal", "Celeste"]))),
        }));
        assert_eq!(app.home.games.len(), 2);
        assert_eq!(app.home.load, Load::Idle);
    }

    #[test]
    fn leaving_a_screen_discards_its_pending_load() {
        let (mut app, _dir) = app();
        app.navigate(Screen::Detail);
        let ticket = app.generations.detail.begin();
        app.handle_key(key(KeyCode::Esc));
        assert!(!ticket.is_current());
    }

    #[test]
    fn failed_load_surfaces_error_message() {
        let (mut app, _dir) = app();
        let ticket = app.generations.games.begin();
        app.process_app_event(Some(AppEvent::Loaded {
            ticket,
            payload: Payload::Games(Err(gamescope_core::CatalogError::Http { status: 500 })),
        }));
        assert_eq!(app.games.load.error(), Some("API error (500)"));
        assert!(app.games.games.is_empty());
    }

    #[test]
    fn empty_search_is_refused() {
        let (mut app, _dir) = app();
        app.screen = Screen::Games;
        app.handle_key(key(KeyCode::Char('/')));
        assert!(app.games.prompt.active);
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.games.prompt.active);
        assert!(app.games.term.is_empty());
    }

    #[test]
    fn favorites_filter_narrows_games_screen() {
        let (mut app, _dir) = app();
        app.screen = Screen::Games;
        app.games.games = games_page(&["Portal", "Celeste", "Portal 2"]).results;
        app.favorites.toggle_favorite(1);
        app.favorites.toggle_favorite(2);

        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.visible_games().len(), 2);

        app.handle_key(key(KeyCode::Char('/')));
        for ch in "port".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));
        let names: Vec<&str> = app.visible_games().iter().map(|game| game.name.as_str()).collect();
        assert_eq!(names, vec!["Portal"]);
    }

    #[test]
    fn toggling_from_home_persists_favorite() {
        let (mut app, _dir) = app();
        app.home.games = games_page(&["Hades"]).results;
        app.handle_key(key(KeyCode::Char('f')));
        assert!(app.favorites.is_favorite(1));
        assert!(app.status.contains("Added Hades"));
        app.handle_key(key(KeyCode::Char('f')));
        assert!(!app.favorites.is_favorite(1));
    }
}
