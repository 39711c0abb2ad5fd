//! Dotted keys to typed schema.
//!
//! Trigger blocks are numbered from 1 and scanned while `<index>.trigger`
//! exists. Within a block, `get`/`post` pairs are scanned while both `.name`
//! and `.value` exist, and `vars` until the first gap.

use tracing::debug;
use webgetter_core::ParamSource;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    DEFAULT_CONN_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, ModuleConfig, ParamTemplate, TriggerConfig,
    UserAgent,
};
use crate::validate;

impl ModuleConfig {
    /// Parse and validate the module configuration from a parameter source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] when a declared trigger lacks its
    /// `url` or `format`, and any error raised by
    /// [`validate::validate`].
    pub fn from_params(params: &dyn ParamSource) -> ConfigResult<Self> {
        let timeout_secs = parse_seconds(params, "timeout", DEFAULT_TIMEOUT_SECS)?;
        let conn_timeout_secs = parse_seconds(params, "conn_timeout", DEFAULT_CONN_TIMEOUT_SECS)?;

        let mut triggers = Vec::new();
        let mut index: usize = 1;
        while params.has_param(&format!("{index}.trigger")) {
            triggers.push(parse_trigger(params, index)?);
            index = index.saturating_add(1);
        }
        debug!(count = triggers.len(), "parsed trigger configuration");

        let config = Self {
            timeout_secs,
            conn_timeout_secs,
            triggers,
        };
        validate::validate(&config)?;
        Ok(config)
    }
}

fn parse_seconds(params: &dyn ParamSource, key: &str, default: u64) -> ConfigResult<u64> {
    let raw = params.parse_int(key, Some(i64::try_from(default).unwrap_or(i64::MAX)))?;
    u64::try_from(raw).map_err(|_| ConfigError::ValidationError {
        field: key.to_owned(),
        message: format!("{raw} is negative"),
    })
}

fn optional(params: &dyn ParamSource, key: &str) -> ConfigResult<Option<String>> {
    if params.has_param(key) {
        Ok(Some(params.parse_string(key, None)?))
    } else {
        Ok(None)
    }
}

fn parse_pairs(
    params: &dyn ParamSource,
    index: usize,
    kind: &str,
) -> ConfigResult<Vec<ParamTemplate>> {
    let mut pairs = Vec::new();
    let mut i: usize = 1;
    loop {
        let name_key = format!("{index}.{kind}.{i}.name");
        let value_key = format!("{index}.{kind}.{i}.value");
        if !(params.has_param(&name_key) && params.has_param(&value_key)) {
            break;
        }
        pairs.push(ParamTemplate {
            name: params.parse_string(&name_key, None)?,
            value: params.parse_string(&value_key, None)?,
        });
        i = i.saturating_add(1);
    }
    Ok(pairs)
}

fn parse_vars(params: &dyn ParamSource, index: usize) -> ConfigResult<Vec<String>> {
    let mut vars = Vec::new();
    let mut i: usize = 1;
    while let Some(expr) = optional(params, &format!("{index}.vars.{i}"))? {
        vars.push(expr);
        i = i.saturating_add(1);
    }
    Ok(vars)
}

fn parse_pre(params: &dyn ParamSource, index: usize) -> ConfigResult<bool> {
    let key = format!("{index}.pre");
    match optional(params, &key)? {
        None => Ok(false),
        // A bare `pre` key enables the flag.
        Some(raw) if raw.trim().is_empty() => Ok(true),
        Some(_) => Ok(params.parse_bool(&key, None)?),
    }
}

fn parse_trigger(params: &dyn ParamSource, index: usize) -> ConfigResult<TriggerConfig> {
    let url = optional(params, &format!("{index}.url"))?
        .ok_or(ConfigError::MissingKey { index, key: "url" })?;
    let format = optional(params, &format!("{index}.format"))?
        .ok_or(ConfigError::MissingKey {
            index,
            key: "format",
        })?;
    let trigger = params
        .parse_string(&format!("{index}.trigger"), None)?
        .trim()
        .to_owned();

    Ok(TriggerConfig {
        index,
        trigger,
        url,
        get_params: parse_pairs(params, index, "get")?,
        post_params: parse_pairs(params, index, "post")?,
        vars: parse_vars(params, index)?,
        format,
        encoding: optional(params, &format!("{index}.encoding"))?,
        pre: parse_pre(params, index)?,
        user_agent: UserAgent::from_configured(optional(
            params,
            &format!("{index}.user-agent"),
        )?),
        help: optional(params, &format!("{index}.help"))?,
    })
}
