// src/config/validate.rs

use regex::Regex;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::{Result, SessionDagError};
use crate::types::NAMESPACE_SEPARATOR;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = SessionDagError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        Ok(PlanFile::new_unchecked(
            raw.session,
            raw.checkpoint,
            raw.selection,
            raw.provider,
        ))
    }
}

/// Structural checks only. Dependency problems between units are not
/// config errors; they show up in the solver's problem report.
fn validate_raw_plan(cfg: &RawPlanFile) -> Result<()> {
    validate_checkpoint(cfg)?;
    validate_selection(cfg)?;
    validate_providers(cfg)?;
    Ok(())
}

fn validate_checkpoint(cfg: &RawPlanFile) -> Result<()> {
    let cp = &cfg.checkpoint;

    if cp.max_attempts == 0 {
        return Err(SessionDagError::ConfigError(
            "[checkpoint].max_attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    if !cp.factor.is_finite() || cp.factor < 1.0 {
        return Err(SessionDagError::ConfigError(format!(
            "[checkpoint].factor must be a finite number >= 1.0 (got {})",
            cp.factor
        )));
    }

    if cp.first_delay_ms > cp.max_delay_ms {
        return Err(SessionDagError::ConfigError(format!(
            "[checkpoint].first_delay_ms ({}) must not exceed max_delay_ms ({})",
            cp.first_delay_ms, cp.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_selection(cfg: &RawPlanFile) -> Result<()> {
    let sel = &cfg.selection;
    for (field, patterns) in [("include", &sel.include), ("exclude", &sel.exclude)] {
        for pattern in patterns {
            if let Err(err) = Regex::new(pattern) {
                return Err(SessionDagError::ConfigError(format!(
                    "[selection].{field} pattern {pattern:?} is not a valid regex: {err}"
                )));
            }
        }
    }

    for id in &sel.mandatory {
        if id.trim().is_empty() {
            return Err(SessionDagError::ConfigError(
                "[selection].mandatory must not contain empty ids".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_providers(cfg: &RawPlanFile) -> Result<()> {
    for (n, provider) in cfg.provider.iter().enumerate() {
        let namespace = provider.namespace.trim();
        if namespace.is_empty() {
            return Err(SessionDagError::ConfigError(format!(
                "[[provider]] #{} has an empty namespace",
                n + 1
            )));
        }
        if namespace.contains(NAMESPACE_SEPARATOR) {
            return Err(SessionDagError::ConfigError(format!(
                "provider namespace '{}' must not contain '{}'",
                namespace, NAMESPACE_SEPARATOR
            )));
        }
    }
    Ok(())
}
