use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use meteo_core::{
    Config, DayWindow, Geocoder, WeatherProvider,
    provider::{geocoder_from_config, http_client, provider_from_config},
};
use tracing::info;

use crate::{
    chart::{ChartRenderer, ChartStudio, PlottersRenderer, chart_file_name, chart_title},
    dialog::DialogController,
    logger, messages,
    session::SessionStore,
    telegram,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo-bot", version, about = "Telegram weather bot")]
pub struct Cli {
    /// Read configuration from this TOML file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the Telegram bot (the default).
    Run {
        /// Also append log lines to this file.
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print the weather reply for a city.
    Show {
        /// City name.
        city: String,

        /// Today's forecast instead of current conditions.
        #[arg(long)]
        forecast: bool,
    },

    /// Render the hourly temperature chart for a city and keep the file.
    Chart {
        /// City name.
        city: String,

        /// Chart tomorrow instead of today.
        #[arg(long)]
        tomorrow: bool,

        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Write a default config file if none exists and print its path.
    Configure,
}

/// Clients built from config, shared by every command.
struct Services {
    config: Config,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
}

impl Services {
    fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = http_client(&config)?;
        let geocoder = Arc::from(geocoder_from_config(&config, http.clone()));
        let weather = Arc::from(provider_from_config(&config, http));
        Ok(Self { config, geocoder, weather })
    }

    async fn locate(&self, city: &str) -> anyhow::Result<meteo_core::Coordinate> {
        Ok(self.geocoder.resolve(city).await.into_result(city)?)
    }
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::from_toml_file(path),
            None => Config::load(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let _ = dotenvy::dotenv();
        let config = self.load_config()?;

        match self.command.unwrap_or(Command::Run { log_file: None }) {
            Command::Run { log_file } => {
                logger::init_tracing(log_file.as_deref())?;
                run_bot(Services::from_config(config)?).await
            }
            Command::Show { city, forecast } => {
                let services = Services::from_config(config)?;
                let coord = services.locate(&city).await?;
                let text = if forecast {
                    messages::forecast(&city, &services.weather.daily_forecast(coord).await?)
                } else {
                    let snapshot = services.weather.current_weather(coord).await?;
                    messages::current_weather(&city, &snapshot)
                };
                println!("{text}");
                Ok(())
            }
            Command::Chart { city, tomorrow, out } => {
                let services = Services::from_config(config)?;
                let coord = services.locate(&city).await?;
                let window = if tomorrow { DayWindow::Tomorrow } else { DayWindow::Today };
                let series = services.weather.hourly_series(coord, window).await?;

                let renderer = PlottersRenderer::new(services.config.chart.font_path.as_deref());
                std::fs::create_dir_all(&out).with_context(|| {
                    format!("Failed to create output directory: {}", out.display())
                })?;
                let path = out.join(chart_file_name(&city, &series));
                renderer.render(&series, &chart_title(&series), &path)?;

                println!("{}", path.display());
                Ok(())
            }
            Command::Configure => {
                let path = Config::config_file_path()?;
                if path.exists() {
                    println!("Config already exists: {}", path.display());
                } else {
                    config.save()?;
                    println!("Wrote default config: {}", path.display());
                }
                Ok(())
            }
        }
    }
}

async fn run_bot(services: Services) -> anyhow::Result<()> {
    let token = Config::telegram_token()?;
    let renderer = PlottersRenderer::new(services.config.chart.font_path.as_deref());
    let chart_dir = services.config.chart.dir_or_temp();
    info!(
        chart_dir = %chart_dir.display(),
        chart_labels = renderer.has_labels(),
        "Meteo bot starting"
    );

    let controller = DialogController::new(
        SessionStore::new(),
        services.geocoder,
        services.weather,
        ChartStudio::new(Arc::new(renderer), chart_dir),
    );

    telegram::run(teloxide::Bot::new(token), Arc::new(controller)).await
}
