// View modules for the Taildrop window
// Each module adds view functions to TaildropApp

pub mod notice;
pub mod receive;
pub mod send;

use cosmic::{
    iced::{
        widget::{column, row},
        Alignment, Length,
    },
    theme,
    widget::{self, icon},
    Element,
};

use crate::app::{Message, TaildropApp};

impl TaildropApp {
    /// Whole window: send section, receive section, status line
    pub fn main_view(&self) -> Element<'_, Message> {
        let spacing = theme::active().cosmic().spacing;

        let header = row![
            icon::from_name("document-send-symbolic").size(24),
            widget::text::title3("Taildrop"),
        ]
        .spacing(spacing.space_xs)
        .align_y(Alignment::Center);

        column![
            header,
            self.send_view(),
            widget::divider::horizontal::default(),
            self.receive_view(),
            widget::divider::horizontal::default(),
            self.status_view(),
        ]
        .spacing(spacing.space_m)
        .padding(spacing.space_l)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn status_view(&self) -> Element<'_, Message> {
        let spacing = theme::active().cosmic().spacing;
        let orchestrator = self.orchestrator();

        let mut status = column![widget::text::body(orchestrator.status())]
            .spacing(spacing.space_xxs)
            .width(Length::Fill);

        if !orchestrator.is_idle() {
            status = status
                .push(widget::progress_bar(0.0..=100.0, self.progress()).width(Length::Fill));
        }

        status.into()
    }
}
