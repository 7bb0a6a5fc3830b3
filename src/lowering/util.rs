use crate::domain::pipeline_config::JoinOrientation;
use crate::error::{Result, ServiceError};

pub fn parse_orientation(raw: &str) -> Result<JoinOrientation> {
    match raw.to_ascii_lowercase().as_str() {
        "left" => Ok(JoinOrientation::Left),
        "right" => Ok(JoinOrientation::Right),
        other => Err(ServiceError::unprocessable(format!(
            "join orientation must be 'left' or 'right', got '{other}'"
        ))),
    }
}

/// Parses a simple duration string like `"1h"`, `"24h"`, `"90s"`, `"15m"`
/// into seconds. No external duration-parsing crate is needed for this
/// small, fixed grammar.
pub fn parse_duration_seconds(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len()));
    let value: u64 = digits
        .parse()
        .map_err(|_| ServiceError::unprocessable(format!("invalid duration '{raw}'")))?;
    let multiplier: u64 = match unit {
        "s" | "" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => {
            return Err(ServiceError::unprocessable(format!(
                "unsupported duration unit '{other}' in '{raw}'"
            )))
        }
    };
    Ok(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_minutes_seconds_and_days() {
        assert_eq!(parse_duration_seconds("1h").unwrap(), 3600);
        assert_eq!(parse_duration_seconds("24h").unwrap(), 86_400);
        assert_eq!(parse_duration_seconds("90s").unwrap(), 90);
        assert_eq!(parse_duration_seconds("15m").unwrap(), 900);
        assert_eq!(parse_duration_seconds("2d").unwrap(), 172_800);
    }

    #[test]
    fn rejects_unknown_units() {
        assert!(parse_duration_seconds("1x").is_err());
    }

    #[test]
    fn orientation_is_case_insensitive() {
        assert_eq!(parse_orientation("LEFT").unwrap(), JoinOrientation::Left);
        assert_eq!(parse_orientation("Right").unwrap(), JoinOrientation::Right);
        assert!(parse_orientation("up").is_err());
    }
}
