use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// One `Label: value` row of a modal form. The active field is highlighted and
/// empty fields show their placeholder dimmed.
pub(crate) fn input_line(
    field_name: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Footer hint line built from `(key, action)` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, action)) in hints.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        if idx + 1 < hints.len() {
            spans.push(Span::raw(format!(" {action}   ")));
        } else {
            spans.push(Span::raw(format!(" {action}")));
        }
    }
    Line::from(spans)
}

/// Step an index by `offset`, clamped to `0..len`.
pub(crate) fn clamp_step(current: usize, offset: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let stepped = if offset.is_negative() {
        current.saturating_sub(offset.unsigned_abs())
    } else {
        current.saturating_add(offset.unsigned_abs())
    };
    stepped.min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_step_stays_in_bounds() {
        assert_eq!(clamp_step(0, -1, 3), 0);
        assert_eq!(clamp_step(1, 1, 3), 2);
        assert_eq!(clamp_step(2, 5, 3), 2);
        assert_eq!(clamp_step(4, -5, 10), 0);
        assert_eq!(clamp_step(0, 1, 0), 0);
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("root cause").context("outer context");
        assert_eq!(surface_error(&err), "root cause");
    }

    #[test]
    fn key_hints_render_every_pair() {
        let line = key_hints(&[("q", "Quit"), ("+", "Add")]);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "[q] Quit   [+] Add");
    }
}
