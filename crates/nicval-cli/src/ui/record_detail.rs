//! Record detail pane, right panel.

use nicval_core::{
  VoteEligibility,
  record::{ValidationRecord, ValidationStatus},
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, Screen};

/// Render the detail pane for the record under the cursor.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let record = app.cursor_record();
  let title = record.map_or(" Detail ".to_string(), |r| format!(" {} ", r.nic));

  let border = if app.screen == Screen::RecordDetail {
    Color::Gray
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(record) = record else {
    f.render_widget(
      Paragraph::new("No records yet.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  f.render_widget(
    Paragraph::new(lines(record)).wrap(Wrap { trim: false }),
    inner,
  );
}

fn field(label: &str, value: String) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{label:<16}"),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::raw(value),
  ])
}

fn lines(record: &ValidationRecord) -> Vec<Line<'static>> {
  let mut out = Vec::new();

  match &record.status {
    ValidationStatus::Valid => out.push(field("Status", "valid".into())),
    ValidationStatus::Invalid { reason } => {
      out.push(field("Status", "invalid".into()));
      out.push(field("Reason", reason.clone()));
    }
  }
  out.push(field("Source", record.kind.to_string()));

  if let Some(identity) = &record.identity {
    out.push(Line::from(""));
    out.push(field("Format", identity.format.to_string()));
    out.push(field("Birth date", identity.birth_date_display()));
    out.push(field("Age", format!("{} (on {})", identity.age, identity.as_of)));
    out.push(field("Gender", identity.gender.to_string()));
    out.push(field("Serial", identity.serial_number.clone()));
    out.push(field("Check digit", identity.check_digit.to_string()));
    if identity.calendar_overflow {
      out.push(Line::from(Span::styled(
        format!("day-of-year overflows; rolled to {}", identity.birth_date),
        Style::default().fg(Color::Yellow),
      )));
    }
  }

  let voting = match record.vote_eligibility {
    Some(VoteEligibility::Eligible) => "eligible",
    Some(VoteEligibility::NotApplicable) => "not applicable",
    None => "unknown",
  };
  out.push(field("Voting", voting.into()));

  if let Some(location) = &record.location {
    out.push(Line::from(""));
    let place: Vec<&str> = [&location.city, &location.region, &location.country]
      .into_iter()
      .filter_map(|p| p.as_deref())
      .collect();
    out.push(field("Location", place.join(", ")));
    if let Some(ip) = &location.ip {
      out.push(field("IP", ip.clone()));
    }
  }

  out.push(Line::from(""));
  out.push(field(
    "First seen",
    record.first_seen.format("%Y-%m-%d %H:%M").to_string(),
  ));
  out.push(field(
    "Last seen",
    record.last_seen.format("%Y-%m-%d %H:%M").to_string(),
  ));
  out.push(field("Duplicates", record.duplicate_count.to_string()));

  out
}
