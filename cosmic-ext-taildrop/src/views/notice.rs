use cosmic::{
    iced::{
        widget::{column, row},
        Alignment, Length,
    },
    theme,
    widget::{self, button, container, icon, text},
    Element,
};

use crate::app::{Message, Notice, NoticeLevel, TaildropApp};

fn icon_name(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "dialog-information-symbolic",
        NoticeLevel::Warning => "dialog-warning-symbolic",
        NoticeLevel::Error => "dialog-error-symbolic",
    }
}

impl TaildropApp {
    /// Modal notice; the only way out is OK
    pub fn notice_view<'a>(&self, notice: &'a Notice) -> Element<'a, Message> {
        let spacing = theme::active().cosmic().spacing;

        let content = column![
            row![
                icon::from_name(icon_name(notice.level)).size(32),
                text::title3(notice.title.as_str()).width(Length::Fill),
            ]
            .spacing(spacing.space_s)
            .align_y(Alignment::Center),
            widget::divider::horizontal::default(),
            text::body(notice.body.as_str()),
            row![
                widget::horizontal_space(),
                button::suggested("OK").on_press(Message::DismissNotice),
            ],
        ]
        .spacing(spacing.space_s)
        .width(Length::Fixed(420.0));

        container(content)
            .class(theme::Container::Card)
            .padding(spacing.space_m)
            .into()
    }
}
