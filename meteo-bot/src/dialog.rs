//! Dialog controller: parses inbound text, applies the dialog transition table
//! and runs the weather handlers.
//!
//! Every upstream failure is turned into a chat reply here; only transport
//! errors escape [`DialogController::handle`].

use std::sync::Arc;

use meteo_core::{Coordinate, DayWindow, Geocode, Geocoder, WeatherProvider};
use tracing::{debug, info, instrument, warn};

use crate::{
    chart::ChartStudio,
    error::Result,
    messages,
    session::{Action, Button, Command, Input, SessionStore},
    transport::{ChatTransport, Inbound, KeyboardAction, TextReply},
};

/// Parses a message into a command, a keyboard button or free text.
pub fn parse_input(text: &str) -> Input {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('/') {
        let (word, arg) = match rest.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, Some(arg.trim())),
            None => (rest, None),
        };
        // `/temp@my_bot` in group chats
        let name = word.split('@').next().unwrap_or(word).to_lowercase();
        let arg = arg.filter(|a| !a.is_empty()).map(str::to_string);

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "temp" => Command::Info,
            "forcast" => Command::Forecast,
            "grafico" => Command::Chart(DayWindow::Today),
            "domani" => Command::Chart(DayWindow::Tomorrow),
            "annulla" => Command::Cancel,
            _ => return Input::UnknownCommand(text.to_string()),
        };
        return Input::Command { command, arg };
    }

    let button = match text {
        messages::BUTTON_CHART => Button::Chart(DayWindow::Today),
        messages::BUTTON_SET_CITY => Button::SetCity,
        messages::BUTTON_INFO => Button::Info,
        messages::BUTTON_FORECAST => Button::Forecast,
        messages::BUTTON_CHART_TOMORROW => Button::Chart(DayWindow::Tomorrow),
        messages::BUTTON_CLOSE => Button::Close,
        _ => return Input::Text(text.to_string()),
    };
    Input::Button(button)
}

/// Per-handler reply when no city is known.
fn no_city_text(action: &Action) -> &'static str {
    match action {
        Action::Info(_) => messages::NO_CITY_INFO,
        Action::Forecast(_) => messages::NO_CITY_FORECAST,
        _ => messages::NO_CITY_CHART,
    }
}

/// Owns the session store and the upstream clients; shared across chats.
pub struct DialogController {
    sessions: SessionStore,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    charts: ChartStudio,
}

impl DialogController {
    pub fn new(
        sessions: SessionStore,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
        charts: ChartStudio,
    ) -> Self {
        Self { sessions, geocoder, weather, charts }
    }

    #[cfg(test)]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one inbound message to completion.
    #[instrument(skip_all, fields(user_id = inbound.user_id, chat_id = inbound.chat_id))]
    pub async fn handle(&self, transport: &dyn ChatTransport, inbound: &Inbound) -> Result<()> {
        let input = parse_input(&inbound.text);
        let state = self.sessions.get(inbound.user_id).await.state;
        let (next, action) = state.transition(input);

        if next != state {
            debug!(from = ?state, to = ?next, "Dialog state changed");
            self.sessions.set_state(inbound.user_id, next).await;
        }

        self.run(transport, inbound, action).await
    }

    async fn run(
        &self,
        transport: &dyn ChatTransport,
        inbound: &Inbound,
        action: Action,
    ) -> Result<()> {
        let chat = inbound.chat_id;

        match action {
            Action::Greet => {
                let reply =
                    TextReply::plain(messages::GREETING).with_keyboard(KeyboardAction::Show);
                transport.send_text(chat, reply).await
            }
            Action::Help => transport.send_text(chat, TextReply::plain(messages::HELP)).await,
            Action::CloseKeyboard => {
                let reply = TextReply::plain(messages::KEYBOARD_CLOSED)
                    .with_keyboard(KeyboardAction::Remove);
                transport.send_text(chat, reply).await
            }
            Action::PromptCity => {
                transport.send_text(chat, TextReply::plain(messages::ASK_CITY)).await
            }
            Action::RepromptCity => {
                transport.send_text(chat, TextReply::plain(messages::ASK_CITY_AGAIN)).await
            }
            Action::SaveCity(city) => {
                self.sessions.set_city(inbound.user_id, &city).await;
                let users = self.sessions.user_count().await;
                info!(city = %city, users, "City saved");
                let reply = TextReply::markdown(messages::city_saved(&city))
                    .with_keyboard(KeyboardAction::Show);
                transport.send_text(chat, reply).await
            }
            Action::Cancelled => {
                transport.send_text(chat, TextReply::plain(messages::CANCELLED)).await
            }
            Action::NothingToCancel => {
                transport.send_text(chat, TextReply::plain(messages::NOTHING_TO_CANCEL)).await
            }
            Action::UnknownCommand => {
                transport.send_text(chat, TextReply::plain(messages::UNKNOWN_COMMAND)).await
            }
            Action::Ignore => {
                debug!(text = %inbound.text, "Ignoring free text");
                Ok(())
            }
            Action::Info(ref arg) | Action::Forecast(ref arg) | Action::Chart(_, ref arg) => {
                let Some(city) = self.effective_city(inbound.user_id, arg.as_deref()).await else {
                    let text = no_city_text(&action);
                    return transport.send_text(chat, TextReply::plain(text)).await;
                };
                let Some(coord) = self.locate(transport, chat, &city).await? else {
                    return Ok(());
                };

                match action {
                    Action::Info(_) => self.send_info(transport, chat, &city, coord).await,
                    Action::Forecast(_) => self.send_forecast(transport, chat, &city, coord).await,
                    Action::Chart(window, _) => {
                        self.send_chart(transport, chat, &city, coord, window).await
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    /// Explicit argument first, then the stored city.
    async fn effective_city(&self, user_id: u64, arg: Option<&str>) -> Option<String> {
        match arg.map(str::trim).filter(|a| !a.is_empty()) {
            Some(city) => Some(city.to_string()),
            None => self.sessions.city(user_id).await,
        }
    }

    /// Resolves `city`, replying to the chat when that fails.
    async fn locate(
        &self,
        transport: &dyn ChatTransport,
        chat: i64,
        city: &str,
    ) -> Result<Option<Coordinate>> {
        match self.geocoder.resolve(city).await {
            Geocode::Resolved(coord) => Ok(Some(coord)),
            Geocode::NotFound => {
                info!(city, "City not found");
                let reply = TextReply::markdown(messages::city_not_found(city));
                transport.send_text(chat, reply).await?;
                Ok(None)
            }
            Geocode::ServiceError(reason) => {
                warn!(city, reason = %reason, "Geocoder unavailable");
                transport.send_text(chat, TextReply::plain(messages::GEOCODER_UNAVAILABLE)).await?;
                Ok(None)
            }
        }
    }

    async fn send_info(
        &self,
        transport: &dyn ChatTransport,
        chat: i64,
        city: &str,
        coord: Coordinate,
    ) -> Result<()> {
        let reply = match self.weather.current_weather(coord).await {
            Ok(snapshot) => TextReply::markdown(messages::current_weather(city, &snapshot)),
            Err(e) => {
                warn!(city, error = %e, "Current weather unavailable");
                TextReply::plain(messages::WEATHER_UNAVAILABLE)
            }
        };
        transport.send_text(chat, reply).await
    }

    async fn send_forecast(
        &self,
        transport: &dyn ChatTransport,
        chat: i64,
        city: &str,
        coord: Coordinate,
    ) -> Result<()> {
        let reply = match self.weather.daily_forecast(coord).await {
            Ok(day) => TextReply::markdown(messages::forecast(city, &day)),
            Err(e) => {
                warn!(city, error = %e, "Forecast unavailable");
                TextReply::plain(messages::WEATHER_UNAVAILABLE)
            }
        };
        transport.send_text(chat, reply).await
    }

    async fn send_chart(
        &self,
        transport: &dyn ChatTransport,
        chat: i64,
        city: &str,
        coord: Coordinate,
        window: DayWindow,
    ) -> Result<()> {
        let series = match self.weather.hourly_series(coord, window).await {
            Ok(series) => series,
            Err(e) => {
                warn!(city, error = %e, "Hourly series unavailable");
                let reply = TextReply::plain(messages::WEATHER_UNAVAILABLE);
                return transport.send_text(chat, reply).await;
            }
        };

        let chart = match self.charts.render(city, series).await {
            Ok(chart) => chart,
            Err(e) => {
                warn!(city, error = %e, "Chart rendering failed");
                return transport.send_text(chat, TextReply::plain(messages::CHART_FAILED)).await;
            }
        };

        let caption = messages::chart_caption(city, window);
        // `chart` is dropped after sending, whatever the outcome, deleting the file
        transport.send_photo(chat, chart.path(), &caption).await
    }
}
