use cosmic::{
    iced::{
        alignment::Horizontal,
        widget::{column, row, scrollable},
        Alignment, Length,
    },
    theme,
    widget::{self, button, container, icon, text},
    Element,
};

use crate::app::{Message, TaildropApp};

impl TaildropApp {
    pub fn send_view(&self) -> Element<'_, Message> {
        let spacing = theme::active().cosmic().spacing;
        let enabled = self.orchestrator().affordances_enabled();

        let file_buttons = row![
            button::standard("Select Files").on_press_maybe(enabled.then_some(Message::PickFiles)),
            button::standard("Clear").on_press_maybe(
                (enabled && !self.orchestrator().pending().is_empty())
                    .then_some(Message::ClearFiles)
            ),
        ]
        .spacing(spacing.space_xs);

        let destination = row![
            text::body("Send to:"),
            self.destination_picker(),
            widget::horizontal_space(),
            button::icon(icon::from_name("view-refresh-symbolic"))
                .on_press_maybe(enabled.then_some(Message::RefreshDevices)),
        ]
        .spacing(spacing.space_xs)
        .align_y(Alignment::Center);

        let can_send = enabled
            && !self.orchestrator().pending().is_empty()
            && self.orchestrator().destination().is_some();

        column![
            text::heading("Send Files"),
            self.drop_area(),
            file_buttons,
            destination,
            row![
                widget::horizontal_space(),
                button::suggested("Send Files")
                    .on_press_maybe(can_send.then_some(Message::SendFiles)),
            ],
        ]
        .spacing(spacing.space_s)
        .into()
    }

    /// Pending files, doubling as the drop target hint
    fn drop_area(&self) -> Element<'_, Message> {
        let spacing = theme::active().cosmic().spacing;
        let pending = self.orchestrator().pending();

        let content: Element<'_, Message> = if pending.is_empty() {
            column![
                icon::from_name("folder-download-symbolic").size(48),
                text::body("Drag and drop files here"),
                text::caption("or use Select Files"),
            ]
            .spacing(spacing.space_xxs)
            .align_x(Horizontal::Center)
            .width(Length::Fill)
            .into()
        } else {
            let files = pending.iter().fold(
                column![].spacing(spacing.space_xxxs),
                |files, path| files.push(text::body(path.display().to_string())),
            );

            column![
                text::caption(format!("{} file(s) ready to send", pending.len())),
                scrollable(files).height(Length::Fixed(140.0)),
            ]
            .spacing(spacing.space_xxs)
            .width(Length::Fill)
            .into()
        };

        let class = if self.drop_hover() {
            theme::Container::Primary
        } else {
            theme::Container::Card
        };

        container(content)
            .class(class)
            .padding(spacing.space_s)
            .width(Length::Fill)
            .into()
    }

    fn destination_picker(&self) -> Element<'_, Message> {
        let labels = self.peer_labels();

        if labels.is_empty() {
            return text::body("No devices online").into();
        }

        if !self.orchestrator().affordances_enabled() {
            let current = self
                .orchestrator()
                .selected_index()
                .and_then(|index| labels.get(index))
                .map(String::as_str)
                .unwrap_or_default();
            return text::body(current).into();
        }

        widget::dropdown(
            labels,
            self.orchestrator().selected_index(),
            Message::DestinationSelected,
        )
        .into()
    }
}
