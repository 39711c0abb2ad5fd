//! Canned pages and configurations.

use webgetter_config::{FlatParams, ModuleConfig, TriggerConfig};

/// A current-conditions page with a week forecast table.
pub const WEATHER_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Weather</title></head>
<body>
  <div id="now"><span class="temp">72F</span> <span class="sky">Sunny</span></div>
  <table id="week">
    <tr><td class="day">Mon</td><td class="high">70</td></tr>
    <tr><td class="day">Tue</td><td class="high">65</td></tr>
    <tr><td class="day">Wed</td><td class="high">68</td></tr>
  </table>
  <ul id="alerts"><li>Wind</li><li>Rain</li></ul>
  <pre id="bulletin">Morning: fog
Afternoon: sun</pre>
</body>
</html>"#;

/// The `weather` trigger: `weather <city>` answers `"<temp> degrees"`.
#[must_use]
pub fn weather_trigger(base_url: &str) -> TriggerConfig {
    TriggerConfig::new(
        1,
        "weather",
        format!("{base_url}?c=$(0)"),
        "$(vars.1) degrees",
    )
    .with_var("//span[@class='temp']")
}

/// The `forecast` trigger: one line per table row.
#[must_use]
pub fn forecast_trigger(base_url: &str) -> TriggerConfig {
    TriggerConfig::new(2, "forecast", base_url, "$(vars.1): $(vars.2)")
        .with_var("//td[@class='day']")
        .with_var("//td[@class='high']")
}

/// A configuration with [`weather_trigger`] only, on a placeholder host.
#[must_use]
pub fn weather_config() -> ModuleConfig {
    ModuleConfig {
        triggers: vec![weather_trigger("http://weather.test/")],
        ..ModuleConfig::default()
    }
}

/// Dotted-key parameters for the same trigger as [`weather_config`].
#[must_use]
pub fn weather_params() -> FlatParams {
    FlatParams::new()
        .with("1.trigger", "weather")
        .with("1.url", "http://weather.test/?c=$(0)")
        .with("1.format", "$(vars.1) degrees")
        .with("1.vars.1", "//span[@class='temp']")
}

/// The same configuration as TOML.
pub const WEATHER_TOML: &str = r#"
[webgetter]
timeout = 10

[webgetter.1]
trigger = "weather"
url = "http://weather.test/?c=$(0)"
format = "$(vars.1) degrees"
vars = ["//span[@class='temp']"]
"#;

/// Install a `tracing` subscriber writing to the test output. Safe to call
/// from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
