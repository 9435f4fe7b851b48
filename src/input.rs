//! Settings form boundary: turns raw field text into a settings patch. Durations are typed
//! in whole minutes and stored in seconds.

use crate::models::PomodoroSettingsPatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    WorkMinutes,
    BreakMinutes,
    LongBreakMinutes,
    LongBreakInterval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    NotANumber { field: SettingField, raw: String },
    NotPositive { field: SettingField, value: i64 },
    OutOfRange { field: SettingField, value: i64 },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NotANumber { field, raw } => {
                write!(f, "{field:?} expects a whole number, got {raw:?}")
            }
            InputError::NotPositive { field, value } => {
                write!(f, "{field:?} must be positive, got {value}")
            }
            InputError::OutOfRange { field, value } => {
                write!(f, "{field:?} is too large: {value}")
            }
        }
    }
}

impl std::error::Error for InputError {}

pub fn parse_setting(field: SettingField, raw: &str) -> Result<PomodoroSettingsPatch, InputError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed.parse().map_err(|_| InputError::NotANumber {
        field,
        raw: raw.to_string(),
    })?;
    if value <= 0 {
        return Err(InputError::NotPositive { field, value });
    }
    let minutes = |value: i64| {
        value
            .checked_mul(60)
            .ok_or(InputError::OutOfRange { field, value })
    };

    let mut patch = PomodoroSettingsPatch::default();
    match field {
        SettingField::WorkMinutes => patch.work_duration = Some(minutes(value)?),
        SettingField::BreakMinutes => patch.break_duration = Some(minutes(value)?),
        SettingField::LongBreakMinutes => patch.long_break_duration = Some(minutes(value)?),
        SettingField::LongBreakInterval => patch.long_break_interval = Some(value),
    }
    Ok(patch)
}
