//! Reply texts and their formatting. Replies use Telegram's legacy Markdown.

use meteo_core::{DayWindow, ForecastDay, WeatherSnapshot};

pub const BUTTON_CHART: &str = "📊 Mostra grafico";
pub const BUTTON_SET_CITY: &str = "📍 Imposta città";
pub const BUTTON_INFO: &str = "ℹ️ Info";
pub const BUTTON_FORECAST: &str = "Forcast";
pub const BUTTON_CHART_TOMORROW: &str = "Grafico PGD";
pub const BUTTON_CLOSE: &str = "❌ Chiudi";

/// Rows of the reply keyboard.
pub const KEYBOARD: &[&[&str]] = &[
    &[BUTTON_CHART, BUTTON_SET_CITY],
    &[BUTTON_INFO, BUTTON_FORECAST, BUTTON_CHART_TOMORROW, BUTTON_CLOSE],
];

pub const GREETING: &str = "Ciao! Sono il bot meteo. Scegli un'opzione:";
pub const ASK_CITY: &str = "📍 Inviami il nome della città da salvare.";
pub const ASK_CITY_AGAIN: &str = "📍 Il nome della città non può essere vuoto. Riprova, oppure /annulla.";
pub const CANCELLED: &str = "❌ Operazione annullata.";
pub const NOTHING_TO_CANCEL: &str = "Nessuna operazione da annullare.";
pub const KEYBOARD_CLOSED: &str = "Tastiera rimossa. Scrivi /start per riattivarla.";
pub const UNKNOWN_COMMAND: &str = "Comando non riconosciuto. Scrivi /help per l'elenco dei comandi.";

pub const NO_CITY_INFO: &str =
    "❗ Usa il comando così: /temp NomeCittà oppure imposta una città con 📍 Imposta città.";
pub const NO_CITY_FORECAST: &str =
    "❗ Usa il comando così: /forcast NomeCittà oppure imposta una città con 📍 Imposta città.";
pub const NO_CITY_CHART: &str = "❗ Prima imposta una città cliccando su 📍 Imposta città.";

pub const GEOCODER_UNAVAILABLE: &str =
    "⚠️ Servizio di geolocalizzazione non disponibile, riprova più tardi.";
pub const WEATHER_UNAVAILABLE: &str = "⚠️ Nessun dato meteo disponibile, riprova più tardi.";
pub const CHART_FAILED: &str = "⚠️ Errore nella creazione del grafico.";

pub const HELP: &str = "Comandi disponibili:\n\
    /start - mostra la tastiera\n\
    /temp [città] - meteo attuale\n\
    /forcast [città] - previsioni di oggi\n\
    /grafico [città] - grafico delle temperature di oggi\n\
    /domani [città] - grafico delle temperature di domani\n\
    /annulla - annulla l'impostazione della città";

/// Title-cases like Python's `str.title`: every run of letters starts upper-case,
/// the rest is lower-cased. `l'aquila` becomes `L'Aquila`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Escapes the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn display_city(city: &str) -> String {
    escape_markdown(&title_case(city))
}

/// Bold city name. Legacy Markdown has no escapes inside an entity, so marker
/// characters are closed out of the bold run and escaped between runs.
fn bold_city(city: &str) -> String {
    let mut out = String::new();
    let mut run = String::new();
    for c in title_case(city).chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            if !run.is_empty() {
                out.push_str(&format!("*{run}*"));
                run.clear();
            }
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        out.push_str(&format!("*{run}*"));
    }
    out
}

pub fn city_saved(city: &str) -> String {
    format!("✅ Città impostata: {}", bold_city(city))
}

pub fn city_not_found(city: &str) -> String {
    format!("❌ Città non trovata: {}", display_city(city))
}

pub fn current_weather(city: &str, snapshot: &WeatherSnapshot) -> String {
    format!(
        "📍 Meteo per {}\n\
         🌡 Temperatura: {:.1}°C\n\
         💨 Vento: {:.1} km/h\n\
         🕒 Orario: {}",
        bold_city(city),
        snapshot.temperature_c,
        snapshot.windspeed_kmh,
        snapshot.observed_at.format("%H:%M"),
    )
}

pub fn forecast(city: &str, day: &ForecastDay) -> String {
    format!(
        "📅 Meteo per {} il {}:\n\
         🔺 Max: {:.1}°C\n\
         🔻 Min: {:.1}°C\n\
         🌧 Pioggia: {:.1} mm\n\
         💨 Vento max: {:.1} km/h",
        bold_city(city),
        day.date.format("%d-%m-%Y"),
        day.temp_max_c,
        day.temp_min_c,
        day.precipitation_mm,
        day.wind_max_kmh,
    )
}

/// Photo captions are sent as plain text.
pub fn chart_caption(city: &str, window: DayWindow) -> String {
    let span = match window {
        DayWindow::Today => "ultime 24h",
        DayWindow::Tomorrow => "prossime 24h",
    };
    format!("📊 Temperatura a {} ({span})", title_case(city))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn title_case_matches_python_semantics() {
        assert_eq!(title_case("milano"), "Milano");
        assert_eq!(title_case("MILANO"), "Milano");
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("l'aquila"), "L'Aquila");
        assert_eq!(title_case("reggio nell'emilia"), "Reggio Nell'Emilia");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn escape_markdown_marks_entities() {
        assert_eq!(escape_markdown("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown("Roma"), "Roma");
    }

    #[test]
    fn bold_city_keeps_escapes_outside_the_entity() {
        assert_eq!(bold_city("roma"), "*Roma*");
        assert_eq!(bold_city("a_b"), "*A*\\_*B*");
        assert_eq!(bold_city("x*"), "*X*\\*");
        assert_eq!(bold_city("_"), "\\_");
        assert_eq!(city_saved("new_york"), "✅ Città impostata: *New*\\_*York*");
    }

    #[test]
    fn current_weather_text_contains_values() {
        let snapshot = WeatherSnapshot {
            temperature_c: 22.0,
            windspeed_kmh: 10.0,
            observed_at: NaiveDate::from_ymd_opt(2026, 10, 16)
                .unwrap()
                .and_hms_opt(14, 5, 0)
                .unwrap(),
        };

        let text = current_weather("roma", &snapshot);

        assert!(text.contains("*Roma*"));
        assert!(text.contains("22.0°C"));
        assert!(text.contains("10.0 km/h"));
        assert!(text.contains("14:05"));
    }

    #[test]
    fn forecast_text_uses_day_first_date() {
        let day = ForecastDay {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            temp_max_c: 24.1,
            temp_min_c: 13.0,
            precipitation_mm: 0.0,
            wind_max_kmh: 18.3,
        };

        let text = forecast("Roma", &day);

        assert!(text.contains("il 16-10-2026"));
        assert!(text.contains("Max: 24.1°C"));
        assert!(text.contains("Min: 13.0°C"));
        assert!(text.contains("Pioggia: 0.0 mm"));
    }

    #[test]
    fn keyboard_has_six_buttons() {
        let buttons: Vec<&str> = KEYBOARD.iter().flat_map(|row| row.iter().copied()).collect();
        assert_eq!(buttons.len(), 6);
        assert!(buttons.contains(&BUTTON_SET_CITY));
    }

    #[test]
    fn captions_name_the_city() {
        assert_eq!(chart_caption("roma", DayWindow::Today), "📊 Temperatura a Roma (ultime 24h)");
        assert!(chart_caption("roma", DayWindow::Tomorrow).contains("prossime 24h"));
    }
}
