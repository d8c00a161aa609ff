use balltrace_models::OriginMethod;

use super::OriginConfig;

/// One method's proposal for the ball position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginCandidate {
    pub x: f64,
    pub y: f64,
    pub method: OriginMethod,
    /// Method-internal quality score
    pub score: f64,
}

/// Combine candidates into `(x, y, method, confidence)`.
///
/// The highest-priority pair within the agreement radius is averaged and
/// tagged [`OriginMethod::Consensus`]; otherwise the highest-priority
/// candidate is returned with its method's base confidence.
pub fn resolve_candidates(
    candidates: &[OriginCandidate],
    config: &OriginConfig,
) -> Option<(f64, f64, OriginMethod, f64)> {
    let mut ordered: Vec<&OriginCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        b.method
            .priority()
            .cmp(&a.method.priority())
            .then(b.score.total_cmp(&a.score))
    });

    for (i, a) in ordered.iter().enumerate() {
        for b in &ordered[i + 1..] {
            let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
            if distance <= config.agreement_radius_px && a.method != b.method {
                let confidence = (config.base_confidence(a.method) + config.agreement_boost)
                    .min(config.max_confidence);
                return Some((
                    (a.x + b.x) / 2.0,
                    (a.y + b.y) / 2.0,
                    OriginMethod::Consensus,
                    confidence,
                ));
            }
        }
    }

    ordered
        .first()
        .map(|c| (c.x, c.y, c.method, config.base_confidence(c.method)))
}
