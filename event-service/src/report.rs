use rsvp_shared::models::{Attendance, Event, ResponseStatus};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use serde::Serialize;

const LAST_COL: u16 = 6;
const GUEST_HEADERS: [&str; 4] = ["Guest name", "Email", "Phone", "Status"];

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendance {
    pub id: String,
    pub name: String,
    pub date: String,
    pub venue: String,
    pub attendance: Attendance,
    pub confirmation_rate: f64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub events: Vec<EventAttendance>,
    pub overall: Attendance,
    pub confirmation_rate: f64,
}

pub fn summarize(events: &[Event]) -> ReportSummary {
    let mut overall = Attendance::default();
    let events = events
        .iter()
        .map(|event| {
            let attendance = event.attendance();
            overall.merge(attendance);
            EventAttendance {
                id: event.id.clone(),
                name: event.name.clone(),
                date: event.date.clone(),
                venue: event.venue.clone(),
                attendance,
                confirmation_rate: round_rate(attendance.confirmation_rate()),
            }
        })
        .collect();

    ReportSummary {
        events,
        confirmation_rate: round_rate(overall.confirmation_rate()),
        overall,
    }
}

fn round_rate(rate: f64) -> f64 {
    (rate * 10.0).round() / 10.0
}

/// Renders every event and its guest list into a single-sheet workbook.
pub fn build_workbook(events: &[Event]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let title = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_font_color(Color::RGB(0x007BFF))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let event_line = Format::new()
        .set_bold()
        .set_font_size(11)
        .set_background_color(Color::RGB(0xE3F2FD))
        .set_border(FormatBorder::Thin);
    let event_fill = Format::new().set_background_color(Color::RGB(0xE3F2FD));
    let subheader = Format::new()
        .set_bold()
        .set_font_size(10)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin);
    let cell = Format::new().set_border(FormatBorder::Thin);
    let confirmed = Format::new()
        .set_font_color(Color::RGB(0x008000))
        .set_border(FormatBorder::Thin);
    let declined = Format::new()
        .set_font_color(Color::RGB(0xFF0000))
        .set_border(FormatBorder::Thin);
    let empty_list = Format::new().set_italic().set_border(FormatBorder::Thin);

    let sheet = workbook.add_worksheet();
    sheet.set_name("Event Report")?;
    sheet.merge_range(0, 0, 0, LAST_COL, "RSVP Event Report", &title)?;

    let mut row: u32 = 2;
    for event in events {
        for col in 0..=LAST_COL {
            sheet.write_blank(row, col, &event_fill)?;
        }
        sheet.write_string_with_format(row, 0, format!("Event: {}", event.name), &event_line)?;
        sheet.write_string_with_format(row, 1, format!("Date: {}", event.date), &event_line)?;
        sheet.write_string_with_format(row, 2, format!("Venue: {}", event.venue), &event_line)?;
        row += 1;

        for (offset, header) in GUEST_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(row, 3 + offset as u16, *header, &subheader)?;
        }
        row += 1;

        if event.guests.is_empty() {
            sheet.write_string_with_format(row, 3, "No guests registered", &empty_list)?;
            row += 1;
        }

        for guest in &event.guests {
            sheet.write_string_with_format(row, 3, &guest.name, &cell)?;
            sheet.write_string_with_format(row, 4, &guest.email, &cell)?;
            sheet.write_string_with_format(row, 5, guest.phone.as_deref().unwrap_or(""), &cell)?;
            let status_format = match guest.status {
                ResponseStatus::Confirmed => &confirmed,
                ResponseStatus::Declined => &declined,
                ResponseStatus::Pending => &cell,
            };
            sheet.write_string_with_format(row, 6, guest.status.to_string(), status_format)?;
            row += 1;
        }

        // Blank line between events.
        row += 1;
    }

    sheet.autofit();
    workbook.save_to_buffer()
}
