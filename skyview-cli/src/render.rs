//! Plain-text output for the terminal.

use std::sync::atomic::{AtomicBool, Ordering};

use skyview_core::{
    Notice, NoticeKind, RenderSink, Theme, WeatherView,
    presentation::{CurrentView, DayView},
};

#[derive(Debug, Default)]
pub struct TerminalSink {
    light: AtomicBool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn header_glyph(&self) -> &'static str {
        if self.light.load(Ordering::Relaxed) {
            "☀️"
        } else {
            "🌙"
        }
    }
}

impl RenderSink for TerminalSink {
    fn render(&self, view: &WeatherView) {
        println!("{}", format_current(self.header_glyph(), &view.current));

        if view.days.is_empty() {
            return;
        }
        println!();
        for day in &view.days {
            println!("{}", format_day(day));
        }
    }

    fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!("{}", notice.message),
            NoticeKind::Error => eprintln!("Error: {}", notice.message),
        }
    }

    fn set_busy(&self, busy: bool) {
        tracing::debug!(busy, "busy state changed");
    }

    fn location_status(&self, status: Option<&str>) {
        if let Some(text) = status {
            eprintln!("{text}");
        }
    }

    fn apply_theme(&self, theme: Theme) {
        self.light.store(theme == Theme::Light, Ordering::Relaxed);
    }
}

fn format_current(header: &str, current: &CurrentView) -> String {
    format!(
        "{header} {}\n{} {}  {}\n{} · {}",
        current.place,
        current.icon.glyph(),
        current.temperature,
        current.condition,
        current.humidity,
        current.wind,
    )
}

fn format_day(day: &DayView) -> String {
    format!("{:<4}{}  {:<12}{}", day.label, day.icon.glyph(), day.range, day.condition)
}
