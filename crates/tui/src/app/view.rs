use std::{cmp, collections::HashSet};

use gamescope_core::{models::MISSING, FilterOptions, Game, GameId, Publisher};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::state::{ListCursor, Load, Prompt};

use super::{GameScopeApp, Screen};

const DESCRIPTION_PREVIEW: usize = 600;

#[derive(Debug, Clone)]
pub(super) struct Theme {
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    primary_fg: Color,
    favorite: Color,
    warning: Color,
    danger: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            primary_fg: Color::White,
            favorite: Color::Yellow,
            warning: Color::Yellow,
            danger: Color::Red,
            on_accent: Color::Black,
        }
    }
}

impl GameScopeApp {
    pub(super) fn draw(&mut self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(frame.size());

        self.render_tabs(frame, layout[0]);
        let favorites = self.favorites.favorite_set();
        match self.screen {
            Screen::Home => self.draw_home(frame, layout[1], &favorites),
            Screen::Games => self.draw_games(frame, layout[1], &favorites),
            Screen::Detail => self.draw_detail(frame, layout[1], &favorites),
            Screen::Listing => self.draw_listing(frame, layout[1], &favorites),
            Screen::Publishers => self.draw_publishers(frame, layout[1]),
        }
        self.render_status(frame, layout[2]);

        if self.games.prompt.active {
            let title = if self.games.only_favorites {
                "Filter favorites"
            } else {
                "Search games"
            };
            render_prompt(&self.theme, frame, title, &self.games.prompt);
        } else if self.publishers.prompt.active {
            render_prompt(&self.theme, frame, "Search publishers", &self.publishers.prompt);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let active = match self.screen {
            Screen::Home => 0,
            Screen::Games => 1,
            Screen::Publishers => 2,
            Screen::Detail | Screen::Listing => usize::MAX,
        };
        let mut spans = vec![Span::styled(
            " GameScope ",
            Style::default()
                .fg(self.theme.on_accent)
                .bg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )];
        for (idx, label) in ["1 Home", "2 Games", "3 Publishers"].iter().enumerate() {
            let style = if idx == active {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(self.theme.muted)
            };
            spans.push(Span::raw("  "));
            spans.push(Span::styled(*label, style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_home(&mut self, frame: &mut Frame, area: Rect, favorites: &HashSet<GameId>) {
        if render_load_state(&self.theme, frame, area, &self.home.load, self.home.games.is_empty()) {
            return;
        }
        let games: Vec<&Game> = self.home.games.iter().collect();
        render_game_list(
            &self.theme,
            frame,
            area,
            "Popular games",
            &games,
            &mut self.home.cursor,
            favorites,
        );
    }

    fn draw_games(&mut self, frame: &mut Frame, area: Rect, favorites: &HashSet<GameId>) {
        let only_favorites = self.games.only_favorites;
        let games: Vec<&Game> = if only_favorites {
            self.favorites.filter_favorites(
                &self.games.games,
                &self.games.filter,
                FilterOptions::default(),
            )
        } else {
            self.games.games.iter().collect()
        };
        if render_load_state(&self.theme, frame, area, &self.games.load, games.is_empty()) {
            return;
        }
        let mut title = if self.games.term.is_empty() {
            "Games · popular".to_string()
        } else {
            format!("Games · \"{}\"", self.games.term)
        };
        if only_favorites {
            title.push_str(" · ★ only");
            if !self.games.filter.is_empty() {
                title.push_str(&format!(" · filter \"{}\"", self.games.filter));
            }
        }
        if games.is_empty() {
            let message = if only_favorites {
                "No favorites among these results"
            } else {
                "No games found"
            };
            let paragraph = Paragraph::new(Span::styled(message, Style::default().fg(self.theme.muted)))
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, area);
            return;
        }
        render_game_list(
            &self.theme,
            frame,
            area,
            &title,
            &games,
            &mut self.games.cursor,
            favorites,
        );
    }

    fn draw_detail(&mut self, frame: &mut Frame, area: Rect, favorites: &HashSet<GameId>) {
        if render_load_state(&self.theme, frame, area, &self.detail.load, self.detail.game.is_none()) {
            return;
        }
        let Some(game) = &self.detail.game else {
            return;
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let favorite = favorites.contains(&game.id);
        let mut title_spans = vec![Span::styled(
            game.name.clone(),
            Style::default()
                .fg(self.theme.primary_fg)
                .add_modifier(Modifier::BOLD),
        )];
        if favorite {
            title_spans.push(Span::styled(" ★", Style::default().fg(self.theme.favorite)));
        }
        let mut lines = vec![
            Line::from(title_spans),
            Line::from(format!("Released: {}", game.released_label())),
            Line::from(format!("Rating: {}", game.rating_label())),
            Line::from(format!(
                "Metacritic: {}",
                game.metacritic
                    .map(|score| score.to_string())
                    .unwrap_or_else(|| MISSING.to_string())
            )),
            Line::from(format!("Platforms: {}", game.platform_names())),
            Line::from(""),
        ];
        match game.plain_description() {
            Some(description) => lines.extend(description.lines().map(|line| Line::from(line.to_string()))),
            None => lines.push(Line::from(Span::styled(
                "No description available",
                Style::default().fg(self.theme.muted),
            ))),
        }
        let info = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Game Details"))
            .wrap(Wrap { trim: true });
        frame.render_widget(info, columns[0]);

        let labels: Vec<String> = self.detail.links.iter().map(|link| link.label()).collect();
        render_plain_list(
            &self.theme,
            frame,
            side[0],
            "Related (Enter opens)",
            &labels,
            &mut self.detail.cursor,
        );

        let shots: Vec<ListItem> = self
            .detail
            .screenshots
            .iter()
            .map(|shot| ListItem::new(Span::styled(shot.image.clone(), Style::default().fg(self.theme.accent_alt))))
            .collect();
        let shots_title = format!("Screenshots ({})", self.detail.screenshots.len());
        frame.render_widget(
            List::new(shots).block(Block::default().borders(Borders::ALL).title(shots_title)),
            side[1],
        );
    }

    fn draw_listing(&mut self, frame: &mut Frame, area: Rect, favorites: &HashSet<GameId>) {
        let empty = self.listing.listing.items().is_empty();
        if render_load_state(&self.theme, frame, area, &self.listing.load, empty) {
            return;
        }
        let header_height = if self.listing.header.is_some() { 6 } else { 0 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(header_height), Constraint::Min(3)])
            .split(area);

        if let Some(header) = &self.listing.header {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    header.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" · {} games", header.games_count),
                    Style::default().fg(self.theme.muted),
                ),
            ])];
            if let Some(description) = &header.description {
                let preview = truncate(description, DESCRIPTION_PREVIEW);
                lines.extend(preview.lines().map(|line| Line::from(line.to_string())));
            }
            let paragraph = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, layout[0]);
        }

        let source = self
            .listing
            .source
            .as_ref()
            .map(|source| format!("{} · {}", source.kind(), source.title()))
            .unwrap_or_else(|| "Listing".to_string());
        let more = if self.listing.loading_more {
            " · loading…"
        } else if self.listing.listing.has_more() {
            " · m for more"
        } else {
            ""
        };
        let title = format!(
            "{source} · {}/{}{more}",
            self.listing.listing.items().len(),
            self.listing.listing.total()
        );
        let games: Vec<&Game> = self.listing.listing.items().iter().collect();
        render_game_list(
            &self.theme,
            frame,
            layout[1],
            &title,
            &games,
            &mut self.listing.cursor,
            favorites,
        );
    }

    fn draw_publishers(&mut self, frame: &mut Frame, area: Rect) {
        if render_load_state(
            &self.theme,
            frame,
            area,
            &self.publishers.load,
            self.publishers.items.is_empty(),
        ) {
            return;
        }
        let mut title = format!("Publishers · page {}", self.publishers.request.page());
        if !self.publishers.term.is_empty() {
            title.push_str(&format!(" · \"{}\"", self.publishers.term));
        }
        if self.publishers.request.previous().is_some() {
            title.push_str(" · p prev");
        }
        if self.publishers.has_next() {
            title.push_str(" · n next");
        }
        let labels: Vec<String> = self.publishers.items.iter().map(publisher_label).collect();
        render_plain_list(
            &self.theme,
            frame,
            area,
            &title,
            &labels,
            &mut self.publishers.cursor,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let hints = match self.screen {
            Screen::Home => "Enter open · f favorite · / search · r reload · q quit",
            Screen::Games => "Enter open · / search or filter · f favorite · o favorites only · r reset · Esc back",
            Screen::Detail => "Enter open related · f favorite · r reload · Esc back",
            Screen::Listing => "Enter open · m more · f favorite · r reload · Esc back",
            Screen::Publishers => "Enter open · / search · n/p page · r reset · Esc back",
        };
        let primary = Span::styled(
            self.status.clone(),
            Style::default().fg(self.theme.primary_fg),
        );
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(hints, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Draws a loading or error panel. Returns true when it took over the area.
fn render_load_state(theme: &Theme, frame: &mut Frame, area: Rect, load: &Load, empty: bool) -> bool {
    if let Some(message) = load.error() {
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(theme.danger).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("r retry · Esc back", Style::default().fg(theme.muted))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.danger))
                .title("Error"),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return true;
    }
    if load.is_loading() && empty {
        let paragraph = Paragraph::new(Span::styled("Loading…", Style::default().fg(theme.warning)))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
        return true;
    }
    false
}

fn render_game_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    games: &[&Game],
    cursor: &mut ListCursor,
    favorites: &HashSet<GameId>,
) {
    let items: Vec<Line> = games
        .iter()
        .map(|game| {
            let star = if favorites.contains(&game.id) {
                Span::styled("★ ", Style::default().fg(theme.favorite))
            } else {
                Span::raw("  ")
            };
            Line::from(vec![
                star,
                Span::styled(
                    game.name.clone(),
                    Style::default()
                        .fg(theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" · {} · {}", game.released_label(), game.rating_label()),
                    Style::default().fg(theme.muted),
                ),
            ])
        })
        .collect();
    render_lines(theme, frame, area, title, items, cursor);
}

fn render_plain_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    labels: &[String],
    cursor: &mut ListCursor,
) {
    let items = labels
        .iter()
        .map(|label| Line::from(Span::raw(label.clone())))
        .collect();
    render_lines(theme, frame, area, title, items, cursor);
}

fn render_lines(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    lines: Vec<Line<'static>>,
    cursor: &mut ListCursor,
) {
    let len = lines.len();
    cursor.height = area.height.saturating_sub(2) as usize;
    cursor.clamp(len);
    cursor.ensure_visible(len);

    let range = cursor.visible(len);
    let offset = range.start;
    let mut list_state = ListState::default();
    if !range.is_empty() {
        list_state.select(Some(cursor.cursor.saturating_sub(offset).min(range.len() - 1)));
    }

    let items: Vec<ListItem> = lines
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(range.len())
        .map(|(idx, line)| {
            let marker = if idx == cursor.cursor {
                Span::styled(
                    "▶ ",
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw("  ")
            };
            let mut spans = vec![marker];
            spans.extend(line.spans);
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(Style::default().bg(theme.selection_bg));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_prompt(theme: &Theme, frame: &mut Frame, title: &str, prompt: &Prompt) {
    let frame_area = frame.size();
    let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
    let area = centered_rect(width, 5, frame_area);
    frame.render_widget(Clear, area);

    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent)),
        Span::raw(prompt.value.clone()),
    ]);
    let helper = Line::from(vec![
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" search  "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" cancel"),
    ]);
    let paragraph = Paragraph::new(vec![input_line, Line::from(""), helper])
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);

    let typed = prompt.value.chars().count() as u16;
    let cursor_x = (area.x + 3 + typed).min(area.x + area.width.saturating_sub(2));
    frame.set_cursor(cursor_x, area.y + 1);
}

fn publisher_label(publisher: &Publisher) -> String {
    format!("{} · {} games", publisher.name, publisher.games_count)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef ghij", 7), "abcdef…");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(50, 50, area), area);
    }
}
