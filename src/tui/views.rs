//! Page rendering

use super::app::{App, CredentialField, Page};
use crate::feedback::{FormState, NoticeKind};
use crate::types::{ForecastHorizon, Rating};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Render the whole frame: page content, status line, key hints
pub(crate) fn render(app: &App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    match app.page {
        Page::Home => render_home(app, frame, chunks[0]),
        Page::Login => render_credentials(app, frame, chunks[0], true),
        Page::Register => render_credentials(app, frame, chunks[0], false),
        Page::Upload => render_upload(app, frame, chunks[0]),
        Page::Dashboard => render_dashboard(app, frame, chunks[0]),
        Page::Forecasting => render_forecasting(app, frame, chunks[0]),
        Page::Settings => render_settings(app, frame, chunks[0]),
    }

    render_status(app, frame, chunks[1]);
    render_help(app, frame, chunks[2]);
}

fn notice_style(kind: NoticeKind) -> Style {
    match kind {
        NoticeKind::Success => Style::default().fg(Color::Green),
        NoticeKind::Warning => Style::default().fg(Color::Yellow),
        NoticeKind::Error => Style::default().fg(Color::Red),
    }
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(notice) => Line::from(Span::styled(notice.text.clone(), notice_style(notice.kind))),
        None => {
            let user = app.session.current_username().unwrap_or("not logged in");
            Line::from(vec![
                Span::styled(app.page.title(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" | "),
                Span::raw(format!("User: {}", user)),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help(app: &App, frame: &mut Frame, area: Rect) {
    let hint = match app.page {
        Page::Home => {
            if app.session.is_logged_in() {
                "u upload | d dashboard | f forecasting | s settings | o logout | q quit"
            } else {
                "l login | r register | q quit"
            }
        }
        Page::Login | Page::Register => "Tab switch field | Enter submit | Esc back",
        Page::Upload => "type path | Enter load | Esc back",
        Page::Dashboard | Page::Settings => "Esc back",
        Page::Forecasting => {
            if app.form.is_open() {
                "←/→ rating | type comments | Enter submit feedback | F5 re-run | Esc back"
            } else {
                "↑/↓ horizon | Tab product | Enter run forecast | Esc back"
            }
        }
    };
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_home(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome to SalesSight!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Gain insights from your sales data with interactive dashboards and forecasting tools."),
        Line::from(""),
    ];

    if let Some(username) = app.session.current_username() {
        lines.push(Line::from(Span::styled(
            format!("You're logged in as {}.", username),
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Please log in or register to access the dashboard.",
            Style::default().fg(Color::Cyan),
        )));
    }

    let block = Block::default().title("SalesSight").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool, masked: bool) -> Line<'a> {
    let shown = if masked {
        "*".repeat(value.len())
    } else {
        value.to_string()
    };
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{:<10}", label), style),
        Span::raw(shown),
        Span::raw(if focused { "_" } else { "" }),
    ])
}

fn render_credentials(app: &App, frame: &mut Frame, area: Rect, login: bool) {
    let title = if login { "Login" } else { "Register New Account" };
    let lines = vec![
        Line::from(""),
        input_line(
            "Username",
            &app.username_input,
            app.credential_focus == CredentialField::Username,
            false,
        ),
        input_line(
            "Password",
            &app.password_input,
            app.credential_focus == CredentialField::Password,
            true,
        ),
        Line::from(""),
        Line::from(Span::styled(
            if login {
                "Don't have an account yet? Press Esc and choose Register."
            } else {
                "Already registered? Press Esc and choose Login."
            },
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().title(title).borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_upload(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        input_line("CSV path", &app.path_input, true, false),
        Line::from(""),
        Line::from(Span::styled(
            "File requirements",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  - File format: CSV"),
        Line::from("  - Required columns: Date, Sales (Product optional)"),
        Line::from("  - Date format: YYYY-MM-DD or MM/DD/YYYY"),
        Line::from(""),
    ];

    match (&app.records, app.session.data_path()) {
        (Some(records), Some(path)) => {
            lines.push(Line::from(Span::styled(
                format!("{} - {} row(s) loaded", path.display(), records.len()),
                Style::default().fg(Color::Green),
            )));
        }
        _ => {
            lines.push(Line::from(Span::styled(
                "No files uploaded yet.",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let block = Block::default().title("Upload Sales Data").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_dashboard(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title("Dashboard").borders(Borders::ALL);

    let Some(summary) = &app.summary else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Please upload a sales CSV file first on the Upload page to view analytics.",
                Style::default().fg(Color::Yellow),
            ))
            .block(block)
            .wrap(Wrap { trim: true }),
            area,
        );
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total sales:   ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{:.2}", summary.total)),
        ]),
        Line::from(vec![
            Span::styled("Average sale:  ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{:.2}", summary.average)),
        ]),
        Line::from(vec![
            Span::styled("Latest sale:   ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{:.2}", summary.latest)),
        ]),
        Line::from(vec![
            Span::styled("Growth:        ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("{:+.2}%", summary.growth_pct),
                if summary.growth_pct >= 0.0 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                },
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Monthly totals",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    for (month, total) in &summary.monthly {
        lines.push(Line::from(format!("  {}  {:.2}", month, total)));
    }

    if !summary.top_products.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Top products",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (name, total) in &summary.top_products {
            lines.push(Line::from(format!("  {}  {:.2}", name, total)));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("Configure your SalesSight preferences in salessight.toml."),
        Line::from(""),
        Line::from(format!(
            "Forecast clamp band:     +/-{:.0}% of the last actual",
            app.settings.forecast.max_deviation * 100.0
        )),
        Line::from(format!(
            "Forecast smoothing:      {}-day moving average",
            app.settings.forecast.smoothing_window
        )),
    ];
    let block = Block::default().title("Settings").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_forecasting(app: &App, frame: &mut Frame, area: Rect) {
    // Reserve the bottom for the feedback form once an analysis has run
    let (main_area, form_area) = if app.form.state() != FormState::Idle {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(main_area);

    render_forecast_controls(app, frame, columns[0]);
    render_forecast_results(app, frame, columns[1]);

    if let Some(form_area) = form_area {
        render_feedback_form(app, frame, form_area);
    }
}

fn render_forecast_controls(app: &App, frame: &mut Frame, area: Rect) {
    let mut items: Vec<ListItem> = Vec::new();

    items.push(ListItem::new(Span::styled(
        "Forecast Period",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for horizon in ForecastHorizon::ALL {
        let marker = if horizon == app.horizon { ">" } else { " " };
        let style = if horizon == app.horizon {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        items.push(ListItem::new(Span::styled(
            format!("{} {}", marker, horizon.label()),
            style,
        )));
    }

    items.push(ListItem::new(""));
    items.push(ListItem::new(Span::styled(
        "Forecast Target",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let product = app
        .selected_product()
        .unwrap_or_else(|| "All Products".to_string());
    items.push(ListItem::new(format!("  {}", product)));

    let block = Block::default().title("Configure").borders(Borders::ALL);
    frame.render_widget(List::new(items).block(block), area);
}

fn render_forecast_results(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title("Sales Trend").borders(Borders::ALL);

    let Some(forecast) = &app.forecast else {
        frame.render_widget(
            Paragraph::new("Select options and press Enter to generate a forecast.")
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(5)])
        .split(area);

    // Day offsets from the first actual date form the x axis
    let origin = forecast
        .actual
        .first()
        .map(|(d, _)| *d)
        .unwrap_or_default();
    let actual_points: Vec<(f64, f64)> = forecast
        .actual
        .iter()
        .map(|(d, v)| ((*d - origin).num_days() as f64, *v))
        .collect();
    let projected_points: Vec<(f64, f64)> = forecast
        .projected
        .iter()
        .map(|(d, v)| ((*d - origin).num_days() as f64, *v))
        .collect();

    let x_max = projected_points
        .last()
        .or(actual_points.last())
        .map(|(x, _)| *x)
        .unwrap_or(1.0);
    let y_values = actual_points
        .iter()
        .chain(projected_points.iter())
        .map(|(_, y)| *y);
    let y_min = y_values.clone().fold(f64::INFINITY, f64::min).min(0.0);
    let y_max = y_values.fold(f64::NEG_INFINITY, f64::max).max(1.0) * 1.1;

    let datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&actual_points),
        Dataset::default()
            .name("Forecast")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&projected_points),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Day")
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(origin.format("%d %b").to_string()),
                    Span::raw(
                        forecast
                            .projected
                            .last()
                            .map(|(d, _)| d.format("%d %b").to_string())
                            .unwrap_or_default(),
                    ),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Sales")
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );
    frame.render_widget(chart, chunks[0]);

    let mut lines = vec![Line::from(vec![
        Span::styled("Trend: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(forecast.trend.to_string()),
    ])];
    for action in crate::analysis::recommendations(forecast.trend) {
        lines.push(Line::from(format!("  - {}", action)));
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title("Recommended Actions").borders(Borders::ALL)),
        chunks[1],
    );
}

fn render_feedback_form(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title("We'd love your feedback!")
        .borders(Borders::ALL);

    let mut lines = Vec::new();

    match app.form.state() {
        FormState::Submitted => {
            // The form is replaced by the confirmation for this analysis run
            if let Some(notice) = app.form.notice() {
                lines.push(Line::from(Span::styled(
                    notice.text.clone(),
                    notice_style(notice.kind),
                )));
            }
            lines.push(Line::from(Span::styled(
                "Run a new forecast to submit feedback again.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        _ => {
            lines.push(Line::from(
                "How would you rate the accuracy and usefulness of this forecast?",
            ));

            let mut rating_spans = Vec::new();
            for rating in Rating::ALL {
                let style = if rating == app.form.rating() {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default()
                };
                rating_spans.push(Span::styled(format!(" {} ", rating), style));
            }
            lines.push(Line::from(rating_spans));

            lines.push(Line::from(vec![
                Span::styled("Comments: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(app.form.comments().to_string()),
                Span::raw("_"),
            ]));

            if let Some(notice) = app.form.notice() {
                lines.push(Line::from(Span::styled(
                    notice.text.clone(),
                    notice_style(notice.kind),
                )));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}
