use crate::error::Error;

use super::models::CountRule;

/// Fields per entry of a `MEASure:RESults?` reply.
pub const FIELDS_PER_RECORD: usize = 7;

/// One row of the measurement statistics window.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub label: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: u64,
}

/// Splits a flat `label,current,min,max,mean,stddev,count,...` reply into
/// records. An empty reply holds no records.
pub fn parse_statistics(reply: &str, count_rule: CountRule) -> Result<Vec<StatRecord>, Error> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Ok(Vec::new());
    }
    let fields: Vec<&str> = reply.split(',').collect();
    parse_fields(&fields, count_rule)
}

pub fn parse_fields<S: AsRef<str>>(
    fields: &[S],
    count_rule: CountRule,
) -> Result<Vec<StatRecord>, Error> {
    if fields.len() % FIELDS_PER_RECORD != 0 {
        return Err(Error::MalformedReply(format!(
            "{} statistics fields is not a multiple of {}",
            fields.len(),
            FIELDS_PER_RECORD
        )));
    }
    fields
        .chunks(FIELDS_PER_RECORD)
        .map(|row| parse_record(row, count_rule))
        .collect()
}

fn number(label: &str, field: &str) -> Result<f64, Error> {
    field.trim().parse::<f64>().map_err(|_| {
        Error::MalformedReply(format!("'{}' is not a number in statistics of {}", field, label))
    })
}

fn parse_record<S: AsRef<str>>(row: &[S], count_rule: CountRule) -> Result<StatRecord, Error> {
    let label = row[0].as_ref().trim().trim_matches('"');
    let count = row[6].as_ref();
    Ok(StatRecord {
        label: label.to_string(),
        current: number(label, row[1].as_ref())?,
        min: number(label, row[2].as_ref())?,
        max: number(label, row[3].as_ref())?,
        mean: number(label, row[4].as_ref())?,
        std_dev: number(label, row[5].as_ref())?,
        count: count_rule.parse(count).ok_or_else(|| {
            Error::MalformedReply(format!("'{}' is not a count in statistics of {}", count, label))
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_record() {
        let fields = ["Vavg", "1.0", "0.5", "1.5", "1.0", "0.01", "100"];
        let stats = parse_fields(&fields, CountRule::Integer).unwrap();
        assert_eq!(
            stats,
            vec![StatRecord {
                label: "Vavg".to_string(),
                current: 1.0,
                min: 0.5,
                max: 1.5,
                mean: 1.0,
                std_dev: 0.01,
                count: 100,
            }]
        );
    }

    #[test]
    fn records_keep_reply_order() {
        let reply = "Frequency(1),1.0E+03,9.9E+02,1.1E+03,1.0E+03,1.2E+00,42,\
                     Pk-Pk(1),2.0E+00,1.9E+00,2.1E+00,2.0E+00,1.0E-02,42\n";
        let stats = parse_statistics(reply, CountRule::Integer).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "Frequency(1)");
        assert_eq!(stats[0].current, 1.0e3);
        assert_eq!(stats[1].label, "Pk-Pk(1)");
        assert_eq!(stats[1].std_dev, 1.0e-2);
    }

    #[test]
    fn float_count_only_for_float_rule() {
        let reply = "Vpp,1,1,1,1,0,1.00E+02";
        assert_eq!(parse_statistics(reply, CountRule::Float).unwrap()[0].count, 100);
        assert!(matches!(
            parse_statistics(reply, CountRule::Integer),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn malformed_replies() {
        assert!(parse_statistics("", CountRule::Integer).unwrap().is_empty());
        assert!(matches!(
            parse_statistics("Vavg,1.0,0.5", CountRule::Integer),
            Err(Error::MalformedReply(_))
        ));
        assert!(matches!(
            parse_statistics("Vavg,one,0.5,1.5,1.0,0.01,100", CountRule::Integer),
            Err(Error::MalformedReply(_))
        ));
    }
}
