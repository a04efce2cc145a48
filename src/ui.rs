use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{BaseLayer, BasePalette, MapLayers, Overlay, ATTRIBUTION};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const PANEL_BG: Color = Color::Black;
const LEGEND_WIDTH: u16 = 30;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let inner = render_map(frame, app, chunks[0]);
    if app.map_renderer.legend.visible {
        render_legend(frame, app, inner);
    }
    if app.show_layer_control {
        render_layer_control(frame, app, inner);
    }
    render_popup(frame, app, inner);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let base = app.map_renderer.base_layer;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Earthquakes, past 7 days ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(inner.width as usize, inner.height as usize, &viewport);

    // Get mouse cursor position for marker
    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    let map_widget = MapWidget {
        layers,
        palette: base.palette(),
        cursor_pos,
    };
    frame.render_widget(map_widget, inner);
    inner
}

/// Braille map drawn layer by layer on the base palette
struct MapWidget {
    layers: MapLayers,
    palette: BasePalette,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific style
    fn render_layer(canvas: &BrailleCanvas, style: Style, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.cells() {
            if col >= area.width || row >= area.height {
                continue;
            }
            buf[(area.x + col, area.y + row)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.palette.background));

        // Back to front: basemap, plates, then bands from Minor up
        Self::render_layer(
            &self.layers.coastlines,
            Style::default().fg(self.palette.coastline),
            area,
            buf,
        );
        if let Some(color) = self.palette.borders {
            Self::render_layer(&self.layers.borders, Style::default().fg(color), area, buf);
        }

        let plate = self.layers.plate_style;
        let mut plate_style = Style::default().fg(plate.color);
        if plate.opacity < 1.0 {
            plate_style = plate_style.add_modifier(Modifier::DIM);
        }
        Self::render_layer(&self.layers.plates, plate_style, area, buf);

        for (band, canvas) in &self.layers.bands {
            let style = Style::default().fg(legible(band.style().fill, self.palette.background));
            Self::render_layer(canvas, style, area, buf);
        }

        // Render cursor marker
        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

/// Swap black for gray on dark backgrounds so Great markers stay visible
fn legible(fg: Color, bg: Color) -> Color {
    let dark = match bg {
        Color::Rgb(r, g, b) => (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000 < 96,
        Color::Black | Color::DarkGray | Color::Reset => true,
        _ => false,
    };
    if fg == Color::Black && dark {
        Color::Gray
    } else {
        fg
    }
}

/// Greedy word wrap into rows of at most `width` chars; long words are split
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();

    for mut word in text.split_whitespace() {
        // URLs are usually wider than the panel
        while word.chars().count() > width {
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            rows.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }

        let row_len = row.chars().count();
        if row_len > 0 && row_len + 1 + word.chars().count() > width {
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(word);
    }

    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Panel of `width`x`height` anchored to a corner of `area`, clipped to fit
fn corner_rect(area: Rect, width: u16, height: u16, right: bool, bottom: bool) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = if right { area.x + area.width - width } else { area.x };
    let y = if bottom { area.y + area.height - height } else { area.y };
    Rect::new(x, y, width, height)
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .style(Style::default().bg(PANEL_BG).fg(Color::White))
        .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let legend = &app.map_renderer.legend;
    let mut lines: Vec<Line> = legend
        .lines()
        .iter()
        .map(|(band, text)| {
            let swatch = legible(band.style().stroke, PANEL_BG);
            Line::from(vec![
                Span::styled("● ", Style::default().fg(swatch)),
                Span::raw(text.clone()),
            ])
        })
        .collect();

    if legend.is_empty() {
        lines.push(Line::styled("Loading…", Style::default().fg(Color::DarkGray)));
    }
    if legend.skipped() > 0 {
        lines.push(Line::styled(
            format!("Skipped: {}", legend.skipped()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let notice_style = Style::default().fg(Color::LightRed);
    for notice in &app.notices {
        // Pre-wrapped so the panel height counts every row
        for row in wrap_words(notice, LEGEND_WIDTH as usize - 2) {
            lines.push(Line::styled(row, notice_style));
        }
    }

    let height = lines.len() as u16 + 2;
    let rect = corner_rect(area, LEGEND_WIDTH, height, true, true);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel(" Legend ")), rect);
}

fn render_layer_control(frame: &mut Frame, app: &App, area: Rect) {
    let map = &app.map_renderer;
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line> = BaseLayer::ALL
        .iter()
        .map(|&base| {
            let mark = if base == map.base_layer { "(•) " } else { "( ) " };
            Line::from(format!("{mark}{}", base.label()))
        })
        .collect();
    lines.push(Line::styled("─────────────────", dim));

    for (i, overlay) in Overlay::all().enumerate() {
        let mark = if map.overlays.is_visible(overlay) { "[x] " } else { "[ ] " };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", i + 1), dim),
            Span::raw(format!("{mark}{}", map.overlays.name(overlay))),
        ]));
    }
    lines.push(Line::styled("b: base  1-7: toggle", dim));

    let rect = corner_rect(area, 24, lines.len() as u16 + 2, true, false);
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel(" Layers ")), rect);
}

fn render_popup(frame: &mut Frame, app: &App, area: Rect) {
    let (Some(popup), Some(event)) = (&app.popup, app.popup_event()) else {
        return;
    };

    let lines = vec![
        Line::styled(event.place.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::from(format!("Magnitude: {}", event.magnitude)),
        Line::from(format!("Date: {}", event.formatted_date())),
    ];

    let content_width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let width = (content_width + 4).min(area.width);
    let height = 5.min(area.height);

    // Sit above the clicked cell, flipped below when there is no room
    let (col, row) = popup.anchor;
    let x = col
        .saturating_sub(width / 2)
        .clamp(area.x, (area.x + area.width).saturating_sub(width));
    let y = if row >= area.y + height {
        row - height
    } else {
        (row + 1).min((area.y + area.height).saturating_sub(height))
    };

    let rect = Rect::new(x, y, width, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel("")), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let base = app.map_renderer.base_layer;
    let dim = Style::default().fg(Color::DarkGray);

    let status = Line::from(vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", dim),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(base.label(), Style::default().fg(Color::Green)),
        Span::styled(format!(" ({} tiles) | ", app.tile_urls().len()), dim),
        Span::styled(ATTRIBUTION, dim),
        Span::styled(
            " | hjkl:pan +/-:zoom 1-7:layers b:base o:layers g:legend r:reset q:quit",
            dim,
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_rect_clips_to_area() {
        let area = Rect::new(1, 1, 20, 10);
        assert_eq!(corner_rect(area, 8, 4, true, true), Rect::new(13, 7, 8, 4));
        assert_eq!(corner_rect(area, 8, 4, false, false), Rect::new(1, 1, 8, 4));
        assert_eq!(corner_rect(area, 40, 40, true, false), area);
    }

    use crate::config::MapConfig;
    use crate::error::MapError;
    use crate::feed::FeedUpdate;
    use crate::map::PLATE_STYLE;
    use crate::quake::MagnitudeBand;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn screen_rows(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("no tile access token", 10), vec!["no tile", "access", "token"]);
        assert_eq!(wrap_words("at https://a.b/cdefgh", 6), vec!["at", "https:", "//a.b/", "cdefgh"]);
        assert!(wrap_words("   ", 5).is_empty());
        for row in wrap_words("could not fetch https://earthquake.usgs.gov/x: HTTP 503", 28) {
            assert!(row.chars().count() <= 28, "{row}");
        }
    }

    #[test]
    fn test_legend_shows_every_notice() {
        let config = MapConfig {
            access_token: None,
            ..MapConfig::default()
        };
        let mut app = App::new(Arc::new(config), 120, 40);
        app.check_credential();
        app.apply_update(FeedUpdate::Events(Err(MapError::network(
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson",
            "error sending request",
        ))));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let rows = screen_rows(terminal.backend().buffer());

        for needle in ["no tile access token", "Earthquakes unavailable", "Great: 0", "all_week"] {
            assert!(rows.iter().any(|r| r.contains(needle)), "{needle} missing:\n{}", rows.join("\n"));
        }
    }

    #[test]
    fn test_great_markers_visible_on_satellite() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0);
        let layers = MapLayers {
            coastlines: BrailleCanvas::new(2, 1),
            borders: BrailleCanvas::new(2, 1),
            plates: BrailleCanvas::new(2, 1),
            plate_style: PLATE_STYLE,
            bands: vec![(MagnitudeBand::Great, canvas)],
        };
        let widget = MapWidget {
            layers,
            palette: BaseLayer::Satellite.palette(),
            cursor_pos: None,
        };
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert_eq!(buf[(0, 0)].fg, Color::Gray);
        assert_eq!(legible(Color::Black, BaseLayer::Light.palette().background), Color::Black);
        assert_eq!(legible(Color::Yellow, Color::Black), Color::Yellow);
    }

    #[test]
    fn test_layer_draws_only_set_cells() {
        let mut canvas = BrailleCanvas::new(4, 2);
        canvas.set_pixel(0, 0);
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        MapWidget::render_layer(&canvas, Style::default().fg(Color::Red), area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "⠁");
        assert_eq!(buf[(0, 0)].fg, Color::Red);
        assert_eq!(buf[(1, 0)].symbol(), " ");
    }
}
