//! Strategy request types

use std::fmt;

use clap::ValueEnum;
use thiserror::Error;
use tracing::debug;

/// Rejected request input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("business problem must not be empty")]
    EmptyProblem,
}

/// A business problem plus optional free-form context
///
/// Immutable once built; the problem is guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyRequest {
    problem: String,
    context: String,
}

impl StrategyRequest {
    pub fn new(problem: impl Into<String>, context: impl Into<String>) -> Result<Self, RequestError> {
        let problem = problem.into();
        debug!(problem_len = problem.len(), "StrategyRequest::new: called");
        if problem.trim().is_empty() {
            debug!("StrategyRequest::new: empty problem");
            return Err(RequestError::EmptyProblem);
        }
        Ok(Self {
            problem,
            context: context.into(),
        })
    }

    /// Request whose context describes the business profile
    pub fn with_profile(problem: impl Into<String>, profile: BusinessProfile) -> Result<Self, RequestError> {
        debug!(?profile, "StrategyRequest::with_profile: called");
        Self::new(problem, profile.to_context())
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Industry and company size of the business asking for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessProfile {
    pub industry: Industry,
    pub company_size: CompanySize,
}

impl BusinessProfile {
    pub fn new(industry: Industry, company_size: CompanySize) -> Self {
        Self { industry, company_size }
    }

    /// Context text in the `Industry: ...\nCompany Size: ...` form
    pub fn to_context(&self) -> String {
        format!("Industry: {}\nCompany Size: {}", self.industry, self.company_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Industry {
    #[default]
    Technology,
    Retail,
    Healthcare,
    Finance,
    Manufacturing,
    Education,
    Other,
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Industry::Technology => "Technology",
            Industry::Retail => "Retail",
            Industry::Healthcare => "Healthcare",
            Industry::Finance => "Finance",
            Industry::Manufacturing => "Manufacturing",
            Industry::Education => "Education",
            Industry::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompanySize {
    #[default]
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompanySize::Startup => "Startup (1-10 employees)",
            CompanySize::Small => "Small (11-50 employees)",
            CompanySize::Medium => "Medium (51-200 employees)",
            CompanySize::Large => "Large (201-1000 employees)",
            CompanySize::Enterprise => "Enterprise (1000+ employees)",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_problem_rejected() {
        assert_eq!(StrategyRequest::new("  \n", ""), Err(RequestError::EmptyProblem));
        assert_eq!(StrategyRequest::new("", "Industry: Retail"), Err(RequestError::EmptyProblem));
    }

    #[test]
    fn test_context_optional() {
        let request = StrategyRequest::new("Churn is rising", "").unwrap();
        assert_eq!(request.problem(), "Churn is rising");
        assert_eq!(request.context(), "");
    }

    #[test]
    fn test_profile_context() {
        let request = StrategyRequest::with_profile(
            "Our e-commerce company is struggling with high customer acquisition costs",
            BusinessProfile::new(Industry::Retail, CompanySize::Small),
        )
        .unwrap();

        assert_eq!(request.context(), "Industry: Retail\nCompany Size: Small (11-50 employees)");
    }

    #[test]
    fn test_company_size_labels() {
        assert_eq!(CompanySize::Enterprise.to_string(), "Enterprise (1000+ employees)");
        assert_eq!(CompanySize::Medium.to_string(), "Medium (51-200 employees)");
        assert_eq!(Industry::Manufacturing.to_string(), "Manufacturing");
    }
}
