use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions at a coordinate, timestamped in the location's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub windspeed_kmh: f64,
    pub observed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub precipitation_mm: f64,
    pub wind_max_kmh: f64,
}

/// Which calendar day an hourly series should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayWindow {
    Today,
    Tomorrow,
}

impl DayWindow {
    /// The calendar date this window selects, given the location's current date.
    pub fn date_from(self, today: NaiveDate) -> NaiveDate {
        match self {
            DayWindow::Today => today,
            DayWindow::Tomorrow => today.checked_add_days(Days::new(1)).unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
}

/// Hourly temperatures of a single calendar day, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub date: NaiveDate,
    pub points: Vec<HourlyPoint>,
}

impl HourlySeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tomorrow_is_the_next_calendar_day() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();

        assert_eq!(DayWindow::Today.date_from(today), today);
        assert_eq!(
            DayWindow::Tomorrow.date_from(today),
            NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
        );
    }
}
