use cosmic::{
    iced::{
        widget::{column, row},
        Alignment, Length,
    },
    theme,
    widget::{self, button, text, text_input},
    Element,
};

use crate::app::{Message, TaildropApp};

impl TaildropApp {
    pub fn receive_view(&self) -> Element<'_, Message> {
        let spacing = theme::active().cosmic().spacing;
        let orchestrator = self.orchestrator();
        let enabled = orchestrator.affordances_enabled();

        let mut directory = text_input("Save directory", orchestrator.receive_dir())
            .width(Length::Fill);
        if enabled {
            directory = directory.on_input(Message::ReceiveDirChanged);
        }

        column![
            text::heading("Receive Files"),
            row![
                text::body("Save to:"),
                directory,
                button::standard("Browse")
                    .on_press_maybe(enabled.then_some(Message::BrowseDirectory)),
            ]
            .spacing(spacing.space_xs)
            .align_y(Alignment::Center),
            row![
                text::caption("Collects files other devices have sent to this one"),
                widget::horizontal_space(),
                button::suggested("Receive Files")
                    .on_press_maybe(enabled.then_some(Message::ReceiveFiles)),
            ]
            .spacing(spacing.space_xs)
            .align_y(Alignment::Center),
        ]
        .spacing(spacing.space_s)
        .into()
    }
}
