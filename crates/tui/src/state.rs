use std::ops::Range;

use gamescope_core::{
    models::PublisherRef, EntityRef, Game, GameId, Genre, Listing, PageRequest, Publisher,
    Screenshot,
};

/// Loading status of a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Load {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

impl Load {
    pub fn is_loading(&self) -> bool {
        matches!(self, Load::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Load::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Cursor and scroll offset of a vertical list.
#[derive(Debug, Clone)]
pub struct ListCursor {
    pub cursor: usize,
    pub offset: usize,
    pub height: usize,
}

impl Default for ListCursor {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            height: 1,
        }
    }
}

impl ListCursor {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(len);
    }

    pub fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len);
    }

    pub fn page_down(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            return;
        }
        self.move_by(self.height.min(len) as isize, len);
    }

    pub fn page_up(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            return;
        }
        self.move_by(-(self.height.min(len) as isize), len);
    }

    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    pub fn ensure_visible(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        let max_offset = len.saturating_sub(self.height);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        self.offset = self.offset.min(max_offset);
    }

    /// Indices currently on screen.
    pub fn visible(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(start + self.height).min(len)
    }
}

/// Line-editing buffer for search prompts.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub active: bool,
    pub value: String,
}

impl Prompt {
    pub fn open(&mut self, initial: &str) {
        self.active = true;
        self.value = initial.to_string();
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    /// Trimmed value, closing the prompt.
    pub fn submit(&mut self) -> String {
        self.active = false;
        self.value.trim().to_string()
    }
}

#[derive(Debug, Default)]
pub struct HomeState {
    pub games: Vec<Game>,
    pub load: Load,
    pub cursor: ListCursor,
}

#[derive(Debug, Default)]
pub struct GamesState {
    pub games: Vec<Game>,
    /// Last submitted search term; empty while showing popular games.
    pub term: String,
    pub prompt: Prompt,
    pub only_favorites: bool,
    /// Local query over favorites, matched against names, genres and tags.
    pub filter: String,
    pub load: Load,
    pub cursor: ListCursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailLink {
    Genre(EntityRef),
    Tag(EntityRef),
    Publisher(PublisherRef),
}

impl DetailLink {
    pub fn label(&self) -> String {
        match self {
            DetailLink::Genre(genre) => format!("Genre · {}", genre.name),
            DetailLink::Tag(tag) => format!("Tag · #{}", tag.slug),
            DetailLink::Publisher(publisher) => format!("Publisher · {}", publisher.name),
        }
    }

    pub fn listing_source(&self) -> ListingSource {
        match self {
            DetailLink::Genre(genre) => ListingSource::Genre {
                id: genre.id,
                slug: genre.slug.clone(),
                name: genre.name.clone(),
            },
            DetailLink::Tag(tag) => ListingSource::Tag {
                slug: tag.slug.clone(),
            },
            DetailLink::Publisher(publisher) => ListingSource::Publisher {
                id: publisher.id,
                name: publisher.name.clone(),
            },
        }
    }
}

/// Related listings reachable from a game detail, genres first.
pub fn detail_links(game: &Game) -> Vec<DetailLink> {
    game.genres
        .iter()
        .cloned()
        .map(DetailLink::Genre)
        .chain(game.publishers.iter().cloned().map(DetailLink::Publisher))
        .chain(game.tags.iter().cloned().map(DetailLink::Tag))
        .collect()
}

#[derive(Debug, Default)]
pub struct DetailState {
    pub game_id: Option<GameId>,
    pub game: Option<Game>,
    pub screenshots: Vec<Screenshot>,
    pub links: Vec<DetailLink>,
    pub load: Load,
    pub cursor: ListCursor,
}

impl DetailState {
    pub fn start(&mut self, id: GameId) {
        *self = Self {
            game_id: Some(id),
            load: Load::Loading,
            ..Self::default()
        };
    }

    pub fn apply(&mut self, game: Game, screenshots: Vec<Screenshot>) {
        self.links = detail_links(&game);
        self.game = Some(game);
        self.screenshots = screenshots;
        self.load = Load::Idle;
        self.cursor.reset();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    Tag { slug: String },
    Genre { id: u64, slug: String, name: String },
    Publisher { id: u64, name: String },
}

impl ListingSource {
    pub fn title(&self) -> String {
        match self {
            ListingSource::Tag { slug } => format!("#{slug}"),
            ListingSource::Genre { name, .. } | ListingSource::Publisher { name, .. } => {
                name.clone()
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ListingSource::Tag { .. } => "Tag",
            ListingSource::Genre { .. } => "Genre",
            ListingSource::Publisher { .. } => "Publisher",
        }
    }
}

/// Name and blurb shown above a genre or publisher listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingHeader {
    pub title: String,
    pub description: Option<String>,
    pub games_count: u64,
}

impl From<&Genre> for ListingHeader {
    fn from(genre: &Genre) -> Self {
        Self {
            title: genre.name.clone(),
            description: genre.plain_description(),
            games_count: genre.games_count,
        }
    }
}

impl From<&Publisher> for ListingHeader {
    fn from(publisher: &Publisher) -> Self {
        Self {
            title: publisher.name.clone(),
            description: publisher.plain_description(),
            games_count: publisher.games_count,
        }
    }
}

#[derive(Debug)]
pub struct ListingState {
    pub source: Option<ListingSource>,
    pub header: Option<ListingHeader>,
    pub listing: Listing<Game>,
    pub load: Load,
    pub loading_more: bool,
    pub cursor: ListCursor,
}

impl ListingState {
    pub fn new(page_size: u32) -> Self {
        Self {
            source: None,
            header: None,
            listing: Listing::new(page_size),
            load: Load::Idle,
            loading_more: false,
            cursor: ListCursor::default(),
        }
    }

    pub fn start(&mut self, source: ListingSource, page_size: u32) {
        *self = Self::new(page_size);
        self.source = Some(source);
        self.load = Load::Loading;
    }
}

#[derive(Debug)]
pub struct PublishersState {
    pub items: Vec<Publisher>,
    pub request: PageRequest,
    pub term: String,
    pub prompt: Prompt,
    pub load: Load,
    pub cursor: ListCursor,
}

impl PublishersState {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            request: PageRequest::first(page_size),
            term: String::new(),
            prompt: Prompt::default(),
            load: Load::Idle,
            cursor: ListCursor::default(),
        }
    }

    /// Uses the full-page heuristic; the publishers screen ignores the
    /// upstream continuation.
    pub fn has_next(&self) -> bool {
        self.request.likely_has_next(self.items.len())
    }
}
