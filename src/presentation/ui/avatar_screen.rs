//! Avatar screen: the avatar, a progress gauge and a status line.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, StatefulWidget, Widget},
};
use ratatui_image::StatefulImage;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::domain::entities::AvatarStatus;
use crate::presentation::widgets::AvatarView;

const HELP_TEXT: &str = "n/→ next  p/← previous  x clear cache  q quit";

/// State rendered by [`AvatarScreen`].
#[derive(Default)]
pub struct AvatarScreenState {
    protocol: Option<StatefulProtocol>,
    rendered_revision: Option<u64>,
    /// Status of the last request.
    pub status: AvatarStatus,
    /// URL of the avatar on screen or being fetched.
    pub current_url: Option<String>,
    /// One-based position in the URL list and the list length.
    pub position: Option<(usize, usize)>,
    /// Cache summary line.
    pub cache_summary: String,
}

impl AvatarScreenState {
    /// Creates an idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-encodes the avatar frame if the view changed since the last call.
    pub fn sync_view(&mut self, view: &AvatarView, picker: &Picker) {
        if self.rendered_revision == Some(view.revision()) {
            return;
        }
        let frame = image::DynamicImage::ImageRgba8(view.compose());
        self.protocol = Some(picker.new_resize_protocol(frame));
        self.rendered_revision = Some(view.revision());
    }

    fn progress(&self) -> f64 {
        match self.status {
            AvatarStatus::Downloading { progress } => f64::from(progress).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    fn status_style(&self) -> Style {
        let color = match self.status {
            AvatarStatus::Idle => Color::Gray,
            AvatarStatus::Downloading { .. } => Color::Cyan,
            AvatarStatus::Ready => Color::Green,
            AvatarStatus::Failed(_) => Color::Red,
        };
        Style::default().fg(color)
    }
}

impl std::fmt::Debug for AvatarScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarScreenState")
            .field("has_protocol", &self.protocol.is_some())
            .field("rendered_revision", &self.rendered_revision)
            .field("status", &self.status)
            .field("current_url", &self.current_url)
            .finish_non_exhaustive()
    }
}

/// Avatar screen widget.
#[derive(Debug, Default)]
pub struct AvatarScreen;

impl AvatarScreen {
    /// Creates the widget.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatefulWidget for AvatarScreen {
    type State = AvatarScreenState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [avatar_area, gauge_area, status_area, cache_area, help_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let title = match state.position {
            Some((index, total)) => format!(" Avatar {index}/{total} "),
            None => " Avatar ".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(avatar_area);
        block.render(avatar_area, buf);

        if let Some(protocol) = state.protocol.as_mut() {
            StatefulWidget::render(StatefulImage::default(), inner, buf, protocol);
        }

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(state.progress())
            .render(gauge_area, buf);

        let url = state.current_url.as_deref().unwrap_or("-");
        Paragraph::new(Line::from(vec![
            Span::styled(
                state.status.to_string(),
                state.status_style().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::raw(url.to_string()),
        ]))
        .render(status_area, buf);

        Paragraph::new(state.cache_summary.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .render(cache_area, buf);

        Paragraph::new(HELP_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .render(help_area, buf);
    }
}
