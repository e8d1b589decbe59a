// Energy monitor reply parsing.
//
// The hub answers `@?` with content such as `?W=120,3400,560,780`: a
// three-character tag followed by current, max, today and yesterday.

use chrono::Utc;

use crate::error::CoreError;
use crate::model::EnergyReading;

const TAG_LEN: usize = 3;

/// Parse the content of an energy reply (sequence code already removed).
pub fn parse_energy_reply(content: &str) -> Result<EnergyReading, CoreError> {
    let malformed = || CoreError::MalformedReply {
        content: content.to_owned(),
    };

    let values = content.get(TAG_LEN..).ok_or_else(malformed)?;
    let mut fields = values.split(',').map(leading_int);

    let mut next = || fields.next().flatten().ok_or_else(malformed);
    let current = next()?;
    let max = next()?;
    let today = next()?;
    let yesterday = next()?;

    Ok(EnergyReading {
        current,
        max,
        today,
        yesterday,
        read_at: Utc::now(),
    })
}

/// Integer prefix of a field, ignoring surrounding whitespace and any
/// trailing unit text the hub firmware appends.
fn leading_int(field: &str) -> Option<i64> {
    let field = field.trim();
    let digits_end = field
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(field.len(), |(i, _)| i);
    field[..digits_end].parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_values_after_tag() {
        let reading = parse_energy_reply("#W=10,20,30,40").unwrap();
        assert_eq!(
            (reading.current, reading.max, reading.today, reading.yesterday),
            (10, 20, 30, 40)
        );
    }

    #[test]
    fn tolerates_trailing_units() {
        let reading = parse_energy_reply("?W=120,3400,560,780W").unwrap();
        assert_eq!(reading.yesterday, 780);
    }

    #[test]
    fn short_or_garbled_content_is_malformed() {
        assert!(matches!(
            parse_energy_reply("OK"),
            Err(CoreError::MalformedReply { .. })
        ));
        assert!(matches!(
            parse_energy_reply("?W=1,2,3"),
            Err(CoreError::MalformedReply { .. })
        ));
        assert!(matches!(
            parse_energy_reply("?W=a,b,c,d"),
            Err(CoreError::MalformedReply { .. })
        ));
    }
}
