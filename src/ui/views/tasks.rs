use crate::store::{Filter, Task};
use crate::theme::Palette;
use crate::ui::components::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Draw the filtered task rows, or the placeholder line for an empty view.
pub fn draw_task_list(
  frame: &mut Frame,
  area: Rect,
  tasks: &[&Task],
  selected: usize,
  edit: Option<(&str, &TextInput)>,
  filter: Filter,
  palette: Palette,
) {
  let title = format!(" Tareas · {} ({}) ", filter.label(), tasks.len());

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(palette.accent));

  if tasks.is_empty() {
    let paragraph = Paragraph::new("No hay tareas en esta vista.")
      .block(block)
      .style(Style::default().fg(palette.dim));
    frame.render_widget(paragraph, area);
    return;
  }

  let width = area.width.saturating_sub(6) as usize;
  let items: Vec<ListItem> = tasks
    .iter()
    .map(|task| {
      let line = match edit {
        Some((id, input)) if id == task.id => edit_line(input, palette),
        _ => task_line(task, width, palette),
      };
      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected));

  frame.render_stateful_widget(list, area, &mut state);
}

fn task_line(task: &Task, width: usize, palette: Palette) -> Line<'static> {
  let (glyph, glyph_style) = if task.done {
    ("✔", Style::default().fg(palette.done))
  } else {
    ("·", Style::default().fg(palette.dim))
  };

  let text_style = if task.done {
    Style::default()
      .fg(palette.dim)
      .add_modifier(Modifier::CROSSED_OUT)
  } else {
    Style::default().fg(palette.fg)
  };

  Line::from(vec![
    Span::styled(format!("{glyph} "), glyph_style),
    Span::styled(truncate(&task.text, width), text_style),
  ])
}

/// Row in edit mode: the buffer with a reversed-video cursor cell.
fn edit_line(input: &TextInput, palette: Palette) -> Line<'static> {
  let chars: Vec<char> = input.value().chars().collect();
  let at = input.cursor();

  let before: String = chars[..at.min(chars.len())].iter().collect();
  let under: String = chars
    .get(at)
    .map(|c| c.to_string())
    .unwrap_or_else(|| " ".to_string());
  let after: String = if at < chars.len() {
    chars[at + 1..].iter().collect()
  } else {
    String::new()
  };

  Line::from(vec![
    Span::styled("✎ ", Style::default().fg(palette.accent)),
    Span::styled(before, Style::default().fg(palette.fg)),
    Span::styled(under, Style::default().add_modifier(Modifier::REVERSED)),
    Span::styled(after, Style::default().fg(palette.fg)),
  ])
}

fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
    format!("{head}…")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string_untouched() {
    assert_eq!(truncate("hola", 10), "hola");
  }

  #[test]
  fn test_truncate_long_string_gets_ellipsis() {
    assert_eq!(truncate("una tarea muy larga", 9), "una tare…");
  }
}
