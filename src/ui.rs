use crate::app::{App, LoadState};
use crate::controls::ControlId;
use crate::map::MapLayers;
use crate::rain::MatrixRain;
use crate::view::{self, Card, CardLine, ListContent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const ACCENT: Color = Color::Rgb(0, 255, 65);

/// Screen regions
pub struct Panes {
    pub map: Rect,
    pub list: Rect,
    pub status: Rect,
}

/// Split the screen into map, list and status bar
pub fn layout(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map and list
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[0]);

    Panes {
        map: columns[0],
        list: columns[1],
        status: rows[1],
    }
}

/// Area inside a pane's border
pub fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn pane_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if let Some(rain) = &app.rain {
        frame.render_widget(RainWidget { rain }, area);
    }

    let panes = layout(area);
    render_map(frame, app, panes.map);
    render_list(frame, app, panes.list);
    render_status_bar(frame, app, panes.status);
}

/// Backdrop; panels are drawn over it
struct RainWidget<'a> {
    rain: &'a MatrixRain,
}

impl Widget for RainWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (x, y, ch, intensity) in self.rain.glyphs() {
            if x >= area.width || y >= area.height {
                continue;
            }
            // Kept dim so the panels stay readable
            let green = 40 + (intensity as u16 * 120 / 255) as u8;
            buf[(area.x + x, area.y + y)]
                .set_char(ch)
                .set_fg(Color::Rgb(0, green, 0));
        }
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = pane_block(format!(" MAP {} ", app.map.zoom_level()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map.render(inner.width, inner.height);
    frame.render_widget(
        MapWidget {
            layers,
            selected: app.selected,
        },
        inner,
    );
}

/// Basemap, marker glyphs and the open popup
struct MapWidget<'a> {
    layers: MapLayers<'a>,
    selected: usize,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (cx, cy, ch) in self.layers.basemap.glyphs() {
            if cx >= area.width as usize || cy >= area.height as usize {
                continue;
            }
            buf[(area.x + cx as u16, area.y + cy as u16)]
                .set_char(ch)
                .set_fg(Color::DarkGray);
        }

        for marker in &self.layers.markers {
            if marker.x >= area.width || marker.y >= area.height {
                continue;
            }
            let (glyph, color) = if marker.open {
                ('◉', Color::Yellow)
            } else if marker.index == self.selected {
                ('●', Color::LightMagenta)
            } else {
                ('●', Color::Magenta)
            };
            buf[(area.x + marker.x, area.y + marker.y)]
                .set_char(glyph)
                .set_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        }

        if let Some((mx, my, popup)) = self.layers.popup {
            let mut lines = vec![Line::from(Span::styled(
                popup.title.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))];
            lines.extend(popup.lines.iter().map(|l| {
                Line::from(Span::styled(l.clone(), Style::default().fg(Color::Gray)))
            }));

            let text_width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
            let width = (text_width + 2).max(12).min(area.width);
            let height = (lines.len() as u16 + 2).min(area.height);

            // Above and to the right of the marker, kept inside the pane
            let x = (mx + 2).min(area.width.saturating_sub(width));
            let y = my.saturating_sub(height).min(area.height.saturating_sub(height));
            let rect = Rect::new(area.x + x, area.y + y, width, height);

            Clear.render(rect, buf);
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(ACCENT)),
                )
                .render(rect, buf);
        }
    }
}

fn card_lines(card: &Card, selected: bool, width: u16) -> Vec<Line<'static>> {
    let gutter = if selected {
        Span::styled("▌", Style::default().fg(ACCENT))
    } else {
        Span::raw(" ")
    };

    let mut lines: Vec<Line> = card
        .lines
        .iter()
        .map(|line| {
            let body = match line {
                CardLine::Type(kind) => Span::styled(
                    format!("[{}]", kind.to_uppercase()),
                    Style::default().fg(Color::Cyan),
                ),
                CardLine::Name(name) => Span::styled(
                    name.clone(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                CardLine::Address(address) => {
                    Span::styled(address.clone(), Style::default().fg(Color::Gray))
                }
                CardLine::Rating(rating) => {
                    Span::styled(format!("★ {rating}"), Style::default().fg(Color::Yellow))
                }
                CardLine::Website(url) => Span::styled(
                    format!("↗ {url}"),
                    Style::default()
                        .fg(Color::LightBlue)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                CardLine::Phone(phone) => {
                    Span::styled(format!("☎ {phone}"), Style::default().fg(Color::Gray))
                }
                CardLine::Access {
                    wheelchair,
                    open_now,
                } => {
                    let mut parts = Vec::new();
                    match wheelchair {
                        Some(true) => parts.push("accessible entrance"),
                        Some(false) => parts.push("no accessible entrance"),
                        None => {}
                    }
                    match open_now {
                        Some(true) => parts.push("open now"),
                        Some(false) => parts.push("closed"),
                        None => {}
                    }
                    Span::styled(parts.join(" · "), Style::default().fg(Color::DarkGray))
                }
            };
            Line::from(vec![gutter.clone(), body])
        })
        .collect();

    lines.push(Line::from(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// Paragraph scroll offset for the list. Saturates instead of wrapping; the
/// mouse hit test must use the same value.
pub fn list_offset(scroll: usize) -> u16 {
    u16::try_from(scroll).unwrap_or(u16::MAX)
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = pane_block(format!(" PLACES [{}] ", app.display.count));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let message = |text: &'static str, color: Color| {
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    };

    match &app.display.list {
        ListContent::Loading => {
            frame.render_widget(message(view::LOADING_MESSAGE, ACCENT), inner);
        }
        ListContent::Failed => {
            frame.render_widget(message(view::LOAD_ERROR_MESSAGE, Color::Red), inner);
        }
        ListContent::Empty => {
            frame.render_widget(message(view::NO_RESULTS_MESSAGE, Color::Gray), inner);
        }
        ListContent::Cards(cards) => {
            let lines: Vec<Line> = cards
                .iter()
                .flat_map(|card| card_lines(card, card.index == app.selected, inner.width))
                .collect();
            let scroll = list_offset(view::list_scroll(cards, app.selected, inner.height as usize));
            frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" [t]Category: ", dim),
        Span::styled(app.controls.label(ControlId::Category), Style::default().fg(Color::Cyan)),
        Span::styled(" [m]Rating: ", dim),
        Span::styled(app.controls.label(ControlId::MinRating), Style::default().fg(Color::Yellow)),
        Span::styled(" | Showing: ", dim),
        Span::styled(app.display.count.to_string(), Style::default().fg(ACCENT)),
        Span::styled(" | ", dim),
        Span::styled(app.map.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    let meta = &app.dataset.meta;
    match (&meta.last_updated, meta.total_places) {
        (Some(updated), Some(total)) => {
            spans.push(Span::styled(format!(" | {total} places, {updated}"), dim))
        }
        (Some(updated), None) => spans.push(Span::styled(format!(" | data {updated}"), dim)),
        (None, Some(total)) => spans.push(Span::styled(format!(" | {total} places"), dim)),
        (None, None) => {}
    }

    match (&app.status, &app.load_state) {
        (Some(status), _) => {
            spans.push(Span::styled(format!(" | {status}"), Style::default().fg(Color::White)))
        }
        (None, LoadState::Failed(_)) => {
            spans.push(Span::styled(" | load failed, R to retry", Style::default().fg(Color::Red)))
        }
        _ => spans.push(Span::styled(
            " | ↑↓ select, Enter focus, o website, hjkl pan, +/- zoom, q quit",
            dim,
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
