// UI rendering logic
use crate::{App, InputMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use reltrack_core::{format_release_date, NoticeLevel, Repository, RepositoryDetails};

const SEARCH_PLACEHOLDER: &str = "Search for a GitHub repo (e.g., facebook/react)";

pub fn render(frame: &mut Frame, app: &mut App) {
    let screen = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Add box
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(screen);

    render_search_input(frame, app, chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_repository_list(frame, app, content_chunks[0]);
    render_details(frame, app, content_chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Toasts go last so they sit on top of everything
    render_toasts(frame, app, screen);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let title = if app.tracker.is_adding {
        " Adding... "
    } else {
        " Add repository (/ to type, ENTER to add) "
    };

    let text = if app.tracker.search_term.is_empty() && !editing {
        Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.tracker.search_term.as_str(), input_style)
    };

    let input = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(input_style),
    );

    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position(input_cursor(area, &app.tracker.search_term));
    }
}

/// Cursor just past the typed text, pinned inside the box border
fn input_cursor(area: Rect, term: &str) -> (u16, u16) {
    let typed = u16::try_from(term.chars().count()).unwrap_or(u16::MAX);
    let x = area
        .x
        .saturating_add(1)
        .saturating_add(typed)
        .min(area.right().saturating_sub(2));

    (x, area.y.saturating_add(1))
}

fn render_repository_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let query = &app.tracker.repositories;

    // Nothing to show yet: a spinner line beats an empty box
    if query.loading && query.data.is_empty() {
        render_placeholder(frame, area, " Repositories ", "Loading repositories...", Color::Cyan);
        return;
    }

    if query.error.is_some() {
        render_placeholder(frame, area, " Repositories ", "Error fetching repositories", Color::Red);
        return;
    }

    if query.data.is_empty() {
        render_placeholder(
            frame,
            area,
            " Repositories ",
            "No repositories tracked yet. Press / to add one.",
            Color::Gray,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .tracker
        .repositories_newest_first()
        .map(|repo| repository_item(repo, app.tracker.is_selected(repo)))
        .collect();

    let title = if query.loading {
        format!(" Repositories ({}) - refreshing... ", query.data.len())
    } else {
        format!(" Repositories ({}) ", query.data.len())
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn repository_item(repo: &Repository, is_selected: bool) -> ListItem<'static> {
    let name_style = if is_selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let badge_style = if repo.latest_release.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let seen_marker = if repo.mark_seen_disabled() {
        Span::styled("[seen]", Style::default().fg(Color::Green))
    } else {
        Span::styled("[s: mark seen]", Style::default().fg(Color::Blue))
    };

    ListItem::new(Line::from(vec![
        Span::styled(if is_selected { "▌" } else { " " }, Style::default().fg(Color::Blue)),
        Span::styled(repo.name.clone(), name_style),
        Span::raw("  "),
        Span::styled(repo.release_badge(), badge_style),
        Span::raw("  "),
        seen_marker,
    ]))
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let details = &app.tracker.details;
    let block = Block::default().borders(Borders::ALL).title(" Details ");

    let lines = if details.loading {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading details...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ]
    } else if details.error.is_some() {
        vec![Line::from(Span::styled(
            "Error fetching repository details",
            Style::default().fg(Color::Red),
        ))]
    } else if let Some(repo) = &details.data {
        details_lines(repo)
    } else if let Some(name) = &app.tracker.selected_repo_name {
        vec![Line::from(Span::styled(
            format!("No details found for {}", name),
            Style::default().fg(Color::Gray),
        ))]
    } else {
        vec![Line::from(Span::styled(
            "Select a repository to view details",
            Style::default().fg(Color::Gray),
        ))]
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn details_lines(repo: &RepositoryDetails) -> Vec<Line<'static>> {
    let label = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(
            repo.name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Stars: ", label),
            Span::styled(repo.stars.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("Forks: ", label),
            Span::styled(repo.forks.to_string(), Style::default().fg(Color::Green)),
        ]),
    ];

    if let Some(release) = &repo.latest_release {
        lines.push(Line::from(vec![
            Span::styled("Latest Release: ", label),
            Span::raw(format!(
                "{} ({})",
                release.version,
                format_release_date(release.published_at.as_deref())
            )),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Release Notes:", label)));

        let notes = release.release_notes.as_deref().unwrap_or_default();
        lines.extend(notes.lines().map(release_note_line));
    }

    lines
}

// Light markdown styling, enough to make headings and bullets stand out
fn release_note_line(line: &str) -> Line<'static> {
    if let Some(heading) = line.strip_prefix("## ").or_else(|| line.strip_prefix("# ")) {
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else if line.starts_with("- ") || line.starts_with("* ") {
        Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Blue)))
    } else {
        Line::from(line.to_string())
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ])
    .block(Block::default().borders(Borders::ALL).title(title.to_string()))
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error_message {
        Span::styled(error.as_str(), Style::default().fg(Color::Red))
    } else {
        match app.input_mode {
            InputMode::Editing => Span::styled(
                "EDITING | type owner/repo | ENTER: add | ESC: back",
                Style::default().fg(Color::Yellow),
            ),
            InputMode::Normal => Span::raw(
                "j/k: navigate | ENTER: details | s: mark seen | r: refresh | /: add | o: open | q: quit",
            ),
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4).min(60);
    if width < 10 {
        return;
    }

    let x = area.x + (area.width - width) / 2;
    for (i, toast) in app.toasts.visible().iter().enumerate() {
        let y = area.y + 1 + (i as u16) * 3;
        if y + 3 > area.y + area.height {
            break;
        }

        let color = match toast.notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let toast_area = Rect {
            x,
            y,
            width,
            height: 3,
        };

        let paragraph = Paragraph::new(toast.notice.message.as_str())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );

        frame.render_widget(Clear, toast_area);
        frame.render_widget(paragraph, toast_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use reltrack_core::{Message, Release};
    use std::time::Instant;

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn repo(id: &str, name: &str, release: Option<Release>) -> Repository {
        Repository {
            id: id.into(),
            name: name.into(),
            latest_release: release,
        }
    }

    #[test]
    fn test_input_cursor_stays_inside_box() {
        let area = Rect::new(0, 0, 20, 3);

        assert_eq!(input_cursor(area, ""), (1, 1));
        assert_eq!(input_cursor(area, "abc"), (4, 1));
        assert_eq!(input_cursor(area, &"x".repeat(100)), (18, 1));
        assert_eq!(input_cursor(area, &"x".repeat(70_000)), (18, 1));
    }

    #[test]
    fn test_long_search_term_renders() {
        let mut app = App::default();
        app.enter_editing_mode();
        app.apply(Message::SearchChanged("y".repeat(70_000)), Instant::now());

        let screen = draw(&mut app);
        assert!(screen.contains("yyyy"));
    }

    #[test]
    fn test_empty_state() {
        let mut app = App::default();
        let screen = draw(&mut app);

        assert!(screen.contains("Select a repository to view details"));
        assert!(screen.contains("No repositories tracked yet"));
    }

    #[test]
    fn test_list_shows_badges() {
        let mut app = App::default();
        let release = Release {
            version: "1.82.0".into(),
            published_at: None,
            seen: true,
            release_notes: None,
        };
        app.apply(
            Message::ListLoaded(Ok(vec![
                repo("1", "rust-lang/rust", Some(release)),
                repo("2", "tokio-rs/tokio", None),
            ])),
            Instant::now(),
        );

        let screen = draw(&mut app);
        assert!(screen.contains("v1.82.0"));
        assert!(screen.contains("[seen]"));
        assert!(screen.contains("No releases"));
    }

    #[test]
    fn test_list_error_is_inline() {
        let mut app = App::default();
        app.apply(Message::ListLoaded(Err("connection refused".into())), Instant::now());

        let screen = draw(&mut app);
        assert!(screen.contains("Error fetching repositories"));
        assert!(screen.contains("Select a repository to view details"));
    }

    #[test]
    fn test_details_render_formatted_date() {
        let mut app = App::default();
        app.apply(Message::SelectRequested("rust-lang/rust".into()), Instant::now());
        app.apply(
            Message::DetailsLoaded {
                name: "rust-lang/rust".into(),
                result: Ok(Some(RepositoryDetails {
                    name: "rust-lang/rust".into(),
                    stars: 98000,
                    forks: 12700,
                    latest_release: Some(Release {
                        version: "1.82.0".into(),
                        published_at: Some("2024-03-05T00:00:00Z".into()),
                        seen: false,
                        release_notes: Some("## Language\n- stabilized things".into()),
                    }),
                })),
            },
            Instant::now(),
        );

        let screen = draw(&mut app);
        assert!(screen.contains("Stars: 98000"));
        assert!(screen.contains("1.82.0 (05/03/2024)"));
        assert!(screen.contains("stabilized things"));
    }

    #[test]
    fn test_toast_is_drawn() {
        let mut app = App::default();
        app.apply(Message::MarkSeenRequested("x".into()), Instant::now());

        let screen = draw(&mut app);
        assert!(screen.contains("Failed to mark release as seen. Please try again."));
    }
}
