//! Embedded prompts
//!
//! These are compiled into the binary from the files under `prompts/`.

use tracing::debug;

/// Strategy consultant prompt
pub const STRATEGY: &str = include_str!("../../prompts/strategy.pmt");

/// System prompt sent alongside every strategy request
pub const SYSTEM: &str = "You are a highly experienced Business Strategy Consultant.";

/// Canned plan served when no provider can answer
pub const FALLBACK_PLAN: &str = include_str!("../../prompts/fallback.md");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "strategy" => {
            debug!("get_embedded: matched strategy");
            Some(STRATEGY)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_strategy() {
        let strategy = get_embedded("strategy").unwrap();
        assert!(strategy.contains("Business Strategy Consultant"));
        assert!(strategy.contains("{{problem}}"));
        assert!(strategy.contains("{{context}}"));
        assert!(strategy.contains("3 different strategic approaches"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }

    #[test]
    fn test_fallback_plan_shape() {
        assert!(FALLBACK_PLAN.starts_with("# Strategic Approaches for Your Business Problem"));
        assert_eq!(FALLBACK_PLAN.matches("\n## Strategy ").count(), 3);
        assert!(FALLBACK_PLAN.contains("## Additional Optimization Recommendations"));
    }
}
