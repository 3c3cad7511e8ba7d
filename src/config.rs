// src/config.rs
use log::warn;
use std::env;
use std::path::PathBuf;

/// Runtime configuration, collected once at startup.
///
/// Everything that used to be a hardcoded literal in the service (JWT
/// secret, vendor endpoints, mail credentials) comes from the environment
/// so a deployment change never needs a code edit.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    /// Public base URL used when building download links for stored files.
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub otp_api_url: String,
    pub otp_api_key: String,
    pub assumptions: SolarAssumptions,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port_str = env::var("PORT").unwrap_or_else(|_| {
            warn!("$PORT not set, defaulting to 8000");
            "8000".to_string()
        });
        let port: u16 = port_str.parse().unwrap_or_else(|_| {
            warn!("$PORT is not a number ({}), defaulting to 8000", port_str);
            8000
        });

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("$JWT_SECRET not set, using a development-only secret");
            "development-secret".to_string()
        });

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        AppConfig {
            port,
            jwt_secret,
            base_url,
            upload_dir,
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or_default(),
            otp_api_url: env::var("OTP_API_URL")
                .unwrap_or_else(|_| "https://api.phone.email".to_string()),
            otp_api_key: env::var("OTP_API_KEY").unwrap_or_default(),
            assumptions: SolarAssumptions::default(),
        }
    }
}

/// Market and engineering assumptions behind the quote formula.
///
/// These are the only tunables in the sizing arithmetic; regional or
/// tariff changes are a matter of constructing a different set rather
/// than editing the formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarAssumptions {
    /// Average peak-sun-hours per day at the installation site.
    pub peak_sun_hours: f64,
    /// Overall system efficiency (inverter, wiring, soiling losses).
    pub system_efficiency: f64,
    /// Nameplate wattage of a single panel.
    pub panel_wattage: f64,
    /// Roof footprint of a single panel, in square metres.
    pub panel_area_sq_m: f64,
    /// Installed cost per watt, in rupees.
    pub cost_per_watt: f64,
    /// Grid tariff per kWh, in rupees.
    pub tariff_per_unit: f64,
    /// Share of the electricity bill displaced by the array.
    pub bill_offset_share: f64,
    /// Grid carbon intensity displaced per kWh, in kg CO2.
    pub carbon_offset_per_kwh: f64,
}

impl Default for SolarAssumptions {
    /// Indian residential rooftop defaults.
    fn default() -> Self {
        SolarAssumptions {
            peak_sun_hours: 5.5,
            system_efficiency: 0.75,
            panel_wattage: 400.0,
            panel_area_sq_m: 1.6,
            cost_per_watt: 40.0,
            tariff_per_unit: 8.0,
            bill_offset_share: 0.3,
            carbon_offset_per_kwh: 0.7,
        }
    }
}
