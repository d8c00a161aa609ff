//! Strike event utilities.

use balltrace_models::StrikeEvent;
use tracing::debug;

/// Collapse strikes closer than `min_interval` seconds into one.
///
/// Strikes are grouped in time order; a group starts at its earliest
/// strike and absorbs every later strike within `min_interval` of that
/// start. Each group is represented by its maximum-confidence strike
/// (earliest wins ties). The result is sorted by timestamp.
pub fn dedup_strikes(strikes: &[StrikeEvent], min_interval: f64) -> Vec<StrikeEvent> {
    let mut sorted: Vec<&StrikeEvent> = strikes
        .iter()
        .filter(|s| s.timestamp.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut result: Vec<StrikeEvent> = Vec::new();
    let mut group_start = f64::NEG_INFINITY;
    let mut best: Option<&StrikeEvent> = None;

    for strike in sorted {
        if strike.timestamp - group_start > min_interval {
            if let Some(b) = best.take() {
                result.push(b.clone());
            }
            group_start = strike.timestamp;
            best = Some(strike);
        } else if best.map_or(true, |b| strike.confidence > b.confidence) {
            best = Some(strike);
        }
    }
    if let Some(b) = best {
        result.push(b.clone());
    }

    result.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    debug!(
        input = strikes.len(),
        output = result.len(),
        min_interval,
        "Deduplicated strikes"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strikes(pairs: &[(f64, f64)]) -> Vec<StrikeEvent> {
        pairs.iter().map(|&(t, c)| StrikeEvent::at(t, c)).collect()
    }

    #[test]
    fn test_dedup_keeps_max_confidence_per_group() {
        let input = strikes(&[
            (5.0, 0.5),
            (8.0, 0.85),
            (10.0, 0.7),
            (30.0, 0.6),
            (35.0, 0.95),
            (60.0, 0.75),
        ]);

        let out = dedup_strikes(&input, 15.0);

        let pairs: Vec<(f64, f64)> = out.iter().map(|s| (s.timestamp, s.confidence)).collect();
        assert_eq!(pairs, vec![(8.0, 0.85), (35.0, 0.95), (60.0, 0.75)]);
    }

    #[test]
    fn test_dedup_sorts_unordered_input() {
        let input = strikes(&[(40.0, 0.9), (2.0, 0.4), (3.0, 0.6)]);
        let out = dedup_strikes(&input, 5.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, 3.0);
        assert_eq!(out[1].timestamp, 40.0);
    }

    #[test]
    fn test_dedup_output_properties() {
        let input = strikes(&[
            (0.0, 0.3),
            (1.0, 0.9),
            (2.5, 0.2),
            (9.0, 0.8),
            (9.5, 0.8),
            (30.0, 0.1),
        ]);
        let out = dedup_strikes(&input, 4.0);

        assert!(out.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(out[0].confidence, 0.9);
        // Ties keep the earliest strike
        assert_eq!(out[1].timestamp, 9.0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_strikes(&[], 10.0).is_empty());
    }
}
