pub mod components;
mod views;

use crate::app::{App, Mode};
use crate::store::Filter;
use crate::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Main draw function: maps the whole application state to a frame.
pub fn draw(frame: &mut Frame, app: &App) {
  let palette = app.theme().palette();

  // Theme background for the whole frame.
  frame.render_widget(
    Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
    frame.area(),
  );

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(3), // New-task input
      Constraint::Min(1),    // Task list
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  draw_input(frame, chunks[0], app, palette);

  let tasks = app.store().filtered(app.filter());
  let edit = app.edit().map(|s| (s.id.as_str(), &s.input));
  views::tasks::draw_task_list(
    frame,
    chunks[1],
    &tasks,
    app.selected(),
    edit,
    app.filter(),
    palette,
  );

  draw_status_bar(frame, chunks[2], app, palette);
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App, palette: Palette) {
  let active = matches!(app.mode(), Mode::Insert);
  let border = if active { palette.accent } else { palette.dim };

  let block = Block::default()
    .title(" Nueva tarea ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let paragraph = Paragraph::new(app.input().value().to_string())
    .block(block)
    .style(Style::default().fg(palette.fg));
  frame.render_widget(paragraph, area);

  if active {
    let x = area.x + 1 + app.input().cursor() as u16;
    frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
  }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App, palette: Palette) {
  let line = match app.mode() {
    Mode::Insert => Line::from(Span::styled(
      " Enter:añadir  Esc:volver",
      Style::default().fg(Color::Yellow),
    )),
    Mode::Edit => Line::from(Span::styled(
      " Enter:guardar  Esc:descartar",
      Style::default().fg(Color::Yellow),
    )),
    Mode::Normal => {
      let mut spans = Vec::new();
      for filter in [Filter::All, Filter::Active, Filter::Completed] {
        let style = if filter == app.filter() {
          Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
        } else {
          Style::default().fg(palette.dim)
        };
        spans.push(Span::styled(format!(" {} ", filter.label()), style));
      }
      spans.push(Span::styled(
        format!("· {} ", app.store().remaining_label()),
        Style::default().fg(palette.fg),
      ));
      spans.push(Span::styled(
        " a:añadir e:editar x:hecha d:borrar c:limpiar t:tema q:salir",
        Style::default().fg(palette.dim),
      ));
      if app.install_hint() {
        spans.push(Span::styled(
          "  I:instalar offline",
          Style::default().fg(Color::Yellow),
        ));
      }
      spans.push(Span::raw(format!("  {}", app.theme().glyph())));
      Line::from(spans)
    }
  };

  frame.render_widget(Paragraph::new(line), area);
}
