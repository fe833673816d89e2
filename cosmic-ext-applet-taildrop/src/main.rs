//! COSMIC Taildrop panel applet
//!
//! Background presence for the Taildrop window: the window hides instead of
//! closing, and this applet brings it back or quits it over D-Bus.

mod dbus_client;

use cosmic::iced::widget::{column, container, row, text};
use cosmic::{
    app::{Core, Task},
    iced::{window, Length, Padding, Rectangle},
    iced_runtime::core::layout::Limits,
    surface::action::{app_popup, destroy_popup},
    widget::{button, divider},
    Element,
};

fn main() -> cosmic::iced::Result {
    tracing_subscriber::fmt::init();
    cosmic::applet::run::<TaildropApplet>(())
}

struct TaildropApplet {
    core: Core,
    popup: Option<window::Id>,
    /// Last known state of the window service
    running: bool,
}

#[derive(Debug, Clone)]
enum Message {
    PopupClosed(window::Id),
    ShowWindow,
    Quit,
    RefreshStatus,
    StatusChecked(bool),
    ActionFinished(Result<(), String>),
    Surface(cosmic::surface::Action),
}

impl cosmic::Application for TaildropApplet {
    type Message = Message;
    type Executor = cosmic::SingleThreadExecutor;
    type Flags = ();
    const APP_ID: &'static str = "org.cosmicde.TaildropApplet";

    fn init(core: Core, _flags: Self::Flags) -> (Self, Task<Message>) {
        (
            Self {
                core,
                popup: None,
                running: false,
            },
            check_status(),
        )
    }

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn update(&mut self, message: Self::Message) -> Task<Self::Message> {
        match message {
            Message::PopupClosed(id) => {
                if self.popup == Some(id) {
                    self.popup = None;
                }
            }
            Message::ShowWindow => {
                tracing::info!("Showing Taildrop window");
                return Task::batch([
                    self.close_popup(),
                    Task::perform(dbus_client::show_window(), |result| {
                        cosmic::Action::App(Message::ActionFinished(
                            result.map_err(|e| format!("{:#}", e)),
                        ))
                    }),
                ]);
            }
            Message::Quit => {
                tracing::info!("Quitting Taildrop");
                return Task::batch([
                    self.close_popup(),
                    Task::perform(dbus_client::quit_window(), |result| {
                        cosmic::Action::App(Message::ActionFinished(
                            result.map_err(|e| format!("{:#}", e)),
                        ))
                    }),
                ]);
            }
            Message::RefreshStatus => return check_status(),
            Message::StatusChecked(running) => {
                self.running = running;
            }
            Message::ActionFinished(result) => {
                if let Err(e) = result {
                    tracing::error!("{}", e);
                }
                return check_status();
            }
            Message::Surface(action) => {
                return cosmic::task::message(cosmic::Action::Cosmic(
                    cosmic::app::Action::Surface(action),
                ));
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<Self::Message> {
        let have_popup = self.popup;
        let btn = self.core.applet.icon_button("document-send-symbolic");

        let btn = match self.core.main_window_id() {
            Some(parent) => btn.on_press_with_rectangle(move |offset, bounds| {
                if let Some(id) = have_popup {
                    Message::Surface(destroy_popup(id))
                } else {
                    Message::Surface(app_popup::<TaildropApplet>(
                        move |state: &mut TaildropApplet| {
                            let new_id = window::Id::unique();
                            state.popup = Some(new_id);

                            let mut popup_settings = state
                                .core
                                .applet
                                .get_popup_settings(parent, new_id, None, None, None);

                            popup_settings.positioner.size_limits = Limits::NONE
                                .min_width(240.0)
                                .max_width(320.0)
                                .min_height(120.0)
                                .max_height(240.0);

                            popup_settings.positioner.anchor_rect = Rectangle {
                                x: (bounds.x - offset.x) as i32,
                                y: (bounds.y - offset.y) as i32,
                                width: bounds.width as i32,
                                height: bounds.height as i32,
                            };

                            popup_settings
                        },
                        Some(Box::new(|state: &TaildropApplet| {
                            let content = state.popup_view();
                            Element::from(state.core.applet.popup_container(content))
                                .map(cosmic::Action::App)
                        })),
                    ))
                }
            }),
            None => btn,
        };

        Element::from(self.core.applet.applet_tooltip::<Message>(
            btn,
            "Taildrop",
            self.popup.is_some(),
            |a| Message::Surface(a),
            None,
        ))
    }

    fn view_window(&self, _id: window::Id) -> Element<Self::Message> {
        text("Taildrop").into()
    }

    fn on_close_requested(&self, id: window::Id) -> Option<Message> {
        Some(Message::PopupClosed(id))
    }

    fn style(&self) -> Option<cosmic::iced_runtime::Appearance> {
        Some(cosmic::applet::style())
    }
}

impl TaildropApplet {
    fn popup_view(&self) -> Element<'_, Message> {
        let status = if self.running {
            "Running in the background"
        } else {
            "Not running"
        };

        let quit = if self.running {
            button::text("Quit").on_press(Message::Quit)
        } else {
            button::text("Quit")
        };

        let content = column![
            row![
                column![text("Taildrop").size(16), text(status).size(11)]
                    .spacing(2)
                    .width(Length::Fill),
                button::text("Refresh").on_press(Message::RefreshStatus),
            ]
            .spacing(8)
            .align_y(cosmic::iced::Alignment::Center),
            divider::horizontal::default(),
            row![
                button::suggested("Show window")
                    .on_press(Message::ShowWindow)
                    .width(Length::Fill),
                quit.width(Length::Fill),
            ]
            .spacing(8),
        ]
        .spacing(8);

        container(content)
            .padding(Padding {
                top: 8.0,
                bottom: 8.0,
                left: 12.0,
                right: 12.0,
            })
            .width(Length::Fill)
            .into()
    }

    fn close_popup(&mut self) -> Task<Message> {
        match self.popup.take() {
            Some(id) => cosmic::task::message(cosmic::Action::Cosmic(
                cosmic::app::Action::Surface(destroy_popup(id)),
            )),
            None => Task::none(),
        }
    }
}

fn check_status() -> Task<Message> {
    Task::perform(dbus_client::is_running(), |running| {
        cosmic::Action::App(Message::StatusChecked(running))
    })
}
