use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, FormField, GrabRecord, GrabReveal, format_yuan};
use crate::envelope::Envelope;
use crate::leaderboard::LeaderboardEntry;
use crate::mock::{ONLINE_PLAYERS, TODAY_POOL};
use crate::screen::{HomeAction, Screen};

const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];
const PROGRESS_WIDTH: usize = 12;

pub fn draw(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(7),
        ])
        .split(f.size());

    draw_header(f, chunks[0], app);
    match app.screen {
        Screen::Home => draw_home(f, chunks[1], app),
        Screen::Create => draw_create(f, chunks[1], app),
        Screen::Grab => draw_grab(f, chunks[1], app),
        Screen::Leaderboard => draw_leaderboard(f, chunks[1], app),
    }
    draw_footer(f, chunks[2], app);
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let line = Line::from(vec![
        Span::styled(
            app.screen.title(),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(app.screen.subtitle(), Style::default().fg(Color::Gray)),
    ]);
    let paragraph = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_home(f: &mut Frame<'_>, area: Rect, app: &App) {
    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    let stats = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(segments[0]);
    let active = app.envelopes.len().to_string();
    draw_stat(f, stats[0], ONLINE_PLAYERS, "在线玩家", Color::Cyan);
    draw_stat(f, stats[1], &active, "可抢红包", Color::LightMagenta);
    draw_stat(f, stats[2], TODAY_POOL, "今日总奖池", Color::Yellow);

    let menu = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(segments[1]);
    for (idx, action) in HomeAction::ALL.into_iter().enumerate() {
        draw_menu_card(f, menu[idx], idx + 1, action, app.home == action);
    }

    let block = pane_block("排行榜预览", false);
    let inner = block.inner(segments[2]);
    f.render_widget(block, segments[2]);
    let podium = app.leaderboard.podium();
    if podium.is_empty() {
        let placeholder = Paragraph::new("暂无排行数据。开始抢红包来登上排行榜吧！")
            .wrap(Wrap { trim: true });
        f.render_widget(placeholder, inner);
        return;
    }
    let lines: Vec<Line> = podium
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::raw(format!("{} ", entry.avatar)),
                Span::styled(
                    format!("{:<16}", entry.username),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format_yuan(entry.total_winnings),
                    Style::default().fg(Color::Yellow),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_stat(f: &mut Frame<'_>, area: Rect, value: &str, label: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let lines = vec![
        Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_menu_card(f: &mut Frame<'_>, area: Rect, hotkey: usize, action: HomeAction, selected: bool) {
    let block = pane_block(action.label(), selected);
    let label_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let lines = vec![
        Line::from(Span::styled(format!("[{hotkey}] {}", action.label()), label_style)),
        Line::from(Span::styled(
            action.description(),
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_create(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("红包配置", true);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let form = &app.form;
    draw_field(
        f,
        segments[0],
        "红包总金额 (¥)",
        &form.amount,
        "输入红包总金额",
        form.focus == FormField::Amount,
    );
    draw_field(
        f,
        segments[1],
        "红包个数",
        &form.count,
        "输入红包个数",
        form.focus == FormField::Count,
    );
    draw_field(
        f,
        segments[2],
        "红包祝福语",
        &form.message,
        "输入红包祝福语（可选）",
        form.focus == FormField::Message,
    );

    let preview = match (form.is_filled(), form.parse()) {
        (false, _) => Line::from(Span::styled(
            "填写金额和个数后预览",
            Style::default().fg(Color::DarkGray),
        )),
        (true, Ok(request)) => Line::from(vec![
            Span::styled("总金额 ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_yuan(request.total_amount),
                Style::default().fg(Color::LightMagenta),
            ),
            Span::raw("  |  "),
            Span::styled("平均每个 ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_yuan(request.total_amount.per_share(request.share_count)),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        (true, Err(err)) => Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )),
    };
    let preview = Paragraph::new(preview).block(
        Block::default()
            .title("预览")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(preview, segments[3]);

    if app.is_creating() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .ratio(app.pending_ratio())
            .gauge_style(Style::default().fg(Color::LightMagenta).bg(Color::Black))
            .label(format!("{} 创建中...", spinner_frame(app.spinner)));
        f.render_widget(gauge, segments[4]);
    } else {
        let ready = form.parse().is_ok();
        let style = if ready {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let submit = Paragraph::new(Span::styled("Enter 创建红包", style))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style),
            );
        f.render_widget(submit, segments[4]);
    }
}

fn draw_field(
    f: &mut Frame<'_>,
    area: Rect,
    title: &str,
    value: &str,
    placeholder: &str,
    focused: bool,
) {
    let content = if value.is_empty() && !focused {
        Line::from(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut spans = vec![Span::raw(value.to_string())];
        if focused {
            spans.push(Span::styled(
                "▏",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        Line::from(spans)
    };
    let paragraph = Paragraph::new(content).block(pane_block(title, focused));
    f.render_widget(paragraph, area);
}

fn draw_grab(f: &mut Frame<'_>, area: Rect, app: &App) {
    if let Some(reveal) = app.reveal() {
        draw_reveal(f, area, reveal);
        return;
    }

    let block = pane_block("可抢红包", true);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.envelopes.is_empty() {
        let lines = vec![
            Line::from(Span::styled(
                "暂无可抢红包",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from("等待其他玩家创建红包，或者自己创建一个吧！"),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, inner);
        return;
    }

    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(inner);

    let grabbing = app.grabbing();
    let items: Vec<ListItem> = app
        .envelopes
        .active()
        .iter()
        .map(|envelope| build_envelope_item(envelope, grabbing == Some(envelope.id()), app.spinner))
        .collect();
    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(app.grab.selected));
    f.render_stateful_widget(list, segments[0], &mut state);

    if let Some(envelope) = app.envelopes.active().get(app.grab.selected) {
        draw_envelope_detail(f, segments[1], envelope, app);
    }
}

fn build_envelope_item(envelope: &Envelope, grabbing: bool, spinner: usize) -> ListItem<'static> {
    let ratio = envelope.progress_ratio();
    let mut spans = vec![
        Span::styled(
            format!("红包 {:<5}", envelope.id().to_string()),
            Style::default().fg(Color::LightMagenta),
        ),
        Span::styled(
            format!("来自 {:<12}", envelope.creator()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("{:>10}", format_yuan(envelope.total_amount())),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(format!(
            "  剩余 {}/{}  ",
            envelope.remaining_shares(),
            envelope.share_count()
        )),
        Span::styled(progress_bar(ratio, PROGRESS_WIDTH), Style::default().fg(Color::Cyan)),
        Span::raw(format!(" {:>3.0}%", ratio * 100.0)),
    ];
    if grabbing {
        spans.push(Span::styled(
            format!("  {} 抢夺中...", spinner_frame(spinner)),
            Style::default().fg(Color::LightRed),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn draw_envelope_detail(f: &mut Frame<'_>, area: Rect, envelope: &Envelope, app: &App) {
    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let ratio = envelope.progress_ratio();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(format!("抢夺进度 · 红包 {}", envelope.id()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .ratio(ratio)
        .gauge_style(
            Style::default()
                .fg(Color::LightMagenta)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(format!("{:.0}%", ratio * 100.0));
    f.render_widget(gauge, segments[0]);

    let action = if app.grabbing() == Some(envelope.id()) {
        Span::styled(
            format!("{} 抢夺中...", spinner_frame(app.spinner)),
            Style::default().fg(Color::LightRed),
        )
    } else if app.pending().is_some() {
        Span::styled("请稍候", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            "Enter 立即抢夺",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    let lines = vec![
        Line::from(Span::styled(
            envelope.message().to_string(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::from(vec![
            Span::styled("平均每个 ", Style::default().fg(Color::Gray)),
            Span::raw(format_yuan(envelope.average_share())),
            Span::raw("  |  "),
            Span::styled(
                format!("发于 {}", envelope.created_local().format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  |  "),
            action,
        ]),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), segments[1]);
}

fn draw_reveal(f: &mut Frame<'_>, area: Rect, reveal: &GrabReveal) {
    let card = centered_rect(area, 50, 9);
    f.render_widget(Clear, card);
    let record = &reveal.record;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format_yuan(record.amount),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(reveal.line, Style::default().fg(Color::White))),
        Line::from(Span::styled(
            format!("回执 {}", record.receipt),
            Style::default().fg(Color::Gray),
        )),
    ];
    if record.emptied {
        lines.push(Line::from(Span::styled(
            format!("红包 {} 已被抢完", record.envelope_id),
            Style::default().fg(Color::LightMagenta),
        )));
    }
    lines.push(Line::from(Span::styled(
        "正在跳转到排行榜...",
        Style::default().fg(Color::DarkGray),
    )));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(pane_block("抢到红包", true));
    f.render_widget(paragraph, card);
}

fn draw_leaderboard(f: &mut Frame<'_>, area: Rect, app: &App) {
    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let podium_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(segments[0]);
    for (idx, entry) in app.leaderboard.podium().iter().enumerate() {
        draw_podium_card(f, podium_cols[idx], entry);
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(segments[1]);
    draw_ranking(f, columns[0], app);
    draw_history(f, columns[1], app);
}

fn draw_podium_card(f: &mut Frame<'_>, area: Rect, entry: &LeaderboardEntry) {
    let color = rank_color(entry.rank);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let lines = vec![
        Line::from(format!("{} {}", rank_badge(entry.rank), entry.avatar)),
        Line::from(Span::styled(
            entry.username.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format_yuan(entry.total_winnings),
            Style::default().fg(color),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_ranking(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("完整排行榜", true);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let entries = app.leaderboard.entries();
    if entries.is_empty() {
        let paragraph = Paragraph::new("暂无排行数据。开始抢红包来登上排行榜吧！")
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, inner);
        return;
    }

    let visible_height = inner.height as usize;
    let start = app.leaderboard_scroll.min(entries.len());
    let end = (start + visible_height).min(entries.len());
    let items: Vec<ListItem> = entries[start..end]
        .iter()
        .map(|entry| build_rank_item(entry, entry.username == app.config.player_name))
        .collect();
    f.render_widget(List::new(items), inner);
}

fn build_rank_item(entry: &LeaderboardEntry, is_player: bool) -> ListItem<'static> {
    let name_style = if is_player {
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let line = Line::from(vec![
        Span::styled(
            format!("{:<4}", rank_badge(entry.rank)),
            Style::default().fg(rank_color(entry.rank)),
        ),
        Span::raw(format!(" {} ", entry.avatar)),
        Span::styled(format!("{:<14}", entry.username), name_style),
        Span::styled(
            format!("{:>12}", format_yuan(entry.total_winnings)),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("  第 {} 名", entry.rank),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    ListItem::new(line)
}

fn draw_history(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("最近抢到", false);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.history.is_empty() {
        let paragraph = Paragraph::new("本局还没有抢到红包。").wrap(Wrap { trim: true });
        f.render_widget(paragraph, inner);
        return;
    }
    let items: Vec<ListItem> = app
        .history
        .iter()
        .take(inner.height as usize)
        .map(build_history_item)
        .collect();
    f.render_widget(List::new(items), inner);
}

fn build_history_item(record: &GrabRecord) -> ListItem<'static> {
    let timestamp = record.grabbed_local().format("%H:%M:%S");
    let line = Line::from(vec![
        Span::styled(timestamp.to_string(), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(
            record.envelope_id.to_string(),
            Style::default().fg(Color::LightMagenta),
        ),
        Span::raw("  "),
        Span::styled(
            format_yuan(record.amount),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(record.receipt.clone(), Style::default().fg(Color::DarkGray)),
    ]);
    ListItem::new(line)
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("操作 & 动态")
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let hints: &[&str] = match app.screen {
        Screen::Home => &[
            "←→ / Tab 选择  Enter 进入",
            "1 发红包  2 抢红包  3 排行榜",
            "Q 退出",
        ],
        Screen::Create => &[
            "Tab / ↑↓ 切换输入框  Backspace 删除",
            "Enter 提交  Esc 返回",
            "Ctrl+C 退出",
        ],
        Screen::Grab => &[
            "↑↓ 选择红包  Enter 抢",
            "Esc 返回（进行中的抢夺会取消）",
            "Q 退出",
        ],
        Screen::Leaderboard => &["↑↓ 滚动", "Esc 返回", "Q 退出"],
    };
    let mut hint_lines: Vec<Line> = hints.iter().map(|hint| Line::from(*hint)).collect();
    hint_lines.push(Line::from(Span::styled(
        format!(
            "玩家 {} {}  |  派奖 {}",
            app.config.player_avatar,
            app.config.player_name,
            app.envelopes.mode().label()
        ),
        Style::default().fg(Color::DarkGray),
    )));
    let instruction = Paragraph::new(hint_lines).wrap(Wrap { trim: true });
    f.render_widget(instruction, columns[0]);

    let mut message_lines: Vec<Line> = Vec::new();
    for msg in app.messages.iter() {
        message_lines.push(Line::from(Span::raw(msg.clone())));
    }
    if message_lines.is_empty() {
        message_lines.push(Line::from(Span::styled(
            "等待信号...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let feed = Paragraph::new(message_lines).wrap(Wrap { trim: true });
    f.render_widget(feed, columns[1]);
}

fn pane_block<'a>(title: &'a str, focused: bool) -> Block<'a> {
    let border_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Block::default()
        .title(Span::styled(title, Style::default().fg(Color::White)))
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat('█').take(filled));
    bar.extend(std::iter::repeat('░').take(width - filled));
    bar
}

fn spinner_frame(tick: usize) -> char {
    SPINNER[tick % SPINNER.len()]
}

fn rank_badge(rank: usize) -> String {
    match rank {
        1 => "👑".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("#{n}"),
    }
}

fn rank_color(rank: usize) -> Color {
    match rank {
        1 => Color::Yellow,
        2 => Color::Gray,
        3 => Color::LightRed,
        _ => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::config::Config;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(3.0, 4), "████");
    }

    #[test]
    fn rank_badges() {
        assert_eq!(rank_badge(1), "👑");
        assert_eq!(rank_badge(7), "#7");
    }

    #[test]
    fn renders_every_screen() {
        let mut app = App::new(Config {
            rng_seed: Some(1),
            ..Config::default()
        })
        .unwrap();
        for (screen, expected) in [
            (Screen::Home, "1,234"),
            (Screen::Create, "Enter"),
            (Screen::Grab, "#1"),
            (Screen::Leaderboard, "888.00"),
        ] {
            app.screen = screen;
            let text = render(&app);
            assert!(text.contains(expected), "{screen:?} missing {expected}");
        }
    }
}
